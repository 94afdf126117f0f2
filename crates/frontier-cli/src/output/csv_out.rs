use frontier_core::FrontierOutput;
use std::error::Error;
use std::io::Write;

use super::asset_names;

/// Write the frontier as CSV.
pub fn write_csv<W: Write>(w: &mut W, result: &FrontierOutput) -> Result<(), Box<dyn Error>> {
    w.write_all(render_csv(result)?.as_bytes())?;
    Ok(())
}

/// Header `risk,return` plus one `w_<asset>` column per asset when weights
/// were requested.
pub fn render_csv(result: &FrontierOutput) -> Result<String, Box<dyn Error>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    let with_weights = result.frontier.iter().any(|p| p.weights.is_some());

    let mut header = vec!["risk".to_string(), "return".to_string()];
    if with_weights {
        header.extend(asset_names(result).iter().map(|n| format!("w_{}", n)));
    }
    wtr.write_record(&header)?;

    for point in &result.frontier {
        let mut row = vec![point.risk.to_string(), point.expected_return.to_string()];
        if let Some(ref weights) = point.weights {
            row.extend(weights.iter().map(|w| w.to_string()));
        }
        wtr.write_record(&row)?;
    }

    let bytes = wtr.into_inner().map_err(|e| e.to_string())?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use frontier_core::{compute_frontier, FrontierRequest};

    #[test]
    fn test_csv_with_weights() {
        let mut req = FrontierRequest::parse_text("2 0.1 0.2 0.04 0 0 0.09 2").unwrap();
        req.include_weights = true;
        let out = compute_frontier(&req).unwrap().result;
        let csv = render_csv(&out).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "risk,return,w_asset_1,w_asset_2");
        assert_eq!(lines.len(), 3);
        let fields: Vec<f64> = lines[1].split(',').map(|f| f.parse().unwrap()).collect();
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[0], out.frontier[0].risk);
        assert_eq!(fields[1], 0.1);
    }

    #[test]
    fn test_csv_without_weights() {
        let req = FrontierRequest::parse_text("2 0.1 0.2 0.04 0 0 0.09 1").unwrap();
        let out = compute_frontier(&req).unwrap().result;
        let csv = render_csv(&out).unwrap();
        let expected = format!("risk,return\n{},0.1\n", out.frontier[0].risk);
        assert_eq!(csv, expected);
    }
}
