use frontier_core::FrontierOutput;
use std::io::{self, Write};

/// Write one `risk return` line per frontier point.
pub fn write_text<W: Write>(w: &mut W, result: &FrontierOutput) -> io::Result<()> {
    w.write_all(render_text(result).as_bytes())
}

/// `f64` Display is the shortest string that parses back to the same value.
pub fn render_text(result: &FrontierOutput) -> String {
    result
        .frontier
        .iter()
        .map(|p| format!("{} {}\n", p.risk, p.expected_return))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use frontier_core::{compute_frontier, FrontierRequest};

    #[test]
    fn test_text_lines_round_trip() {
        let req = FrontierRequest::parse_text("2 0.1 0.2 0.04 0 0 0.09 3 0.1 0.15 0.2").unwrap();
        let out = compute_frontier(&req).unwrap().result;
        let text = render_text(&out);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        for (line, point) in lines.iter().zip(&out.frontier) {
            let parts: Vec<f64> = line
                .split_whitespace()
                .map(|t| t.parse().unwrap())
                .collect();
            assert_eq!(parts, vec![point.risk, point.expected_return]);
        }
        assert!((out.frontier[0].risk - 0.2).abs() < 1e-12);
    }
}
