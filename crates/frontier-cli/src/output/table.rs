use frontier_core::FrontierOutput;
use std::io::{self, Write};
use tabled::{builder::Builder, Table};

use super::asset_names;

/// Format output as tables using the tabled crate.
pub fn write_table<W: Write>(w: &mut W, result: &FrontierOutput) -> io::Result<()> {
    writeln!(w, "{}", render_frontier(result))?;

    let mv = &result.min_variance_portfolio;
    writeln!(w, "\nMinimum variance portfolio")?;
    let mut builder = Builder::default();
    builder.push_record(["Asset", "Weight", "Risk contribution", "Return contribution"]);
    for w in &mv.weights {
        builder.push_record([
            w.name.clone(),
            format_value(w.weight),
            format_value(w.contribution_to_risk),
            format_value(w.contribution_to_return),
        ]);
    }
    builder.push_record([
        "Total".to_string(),
        String::new(),
        format_value(mv.risk),
        format_value(mv.expected_return),
    ]);
    writeln!(w, "{}", Table::from(builder))?;

    if let Some(ref assets) = result.single_assets {
        writeln!(w, "\nSingle assets")?;
        let mut builder = Builder::default();
        builder.push_record(["Asset", "Risk", "Return"]);
        for a in assets {
            builder.push_record([
                a.name.clone(),
                format_value(a.risk),
                format_value(a.expected_return),
            ]);
        }
        writeln!(w, "{}", Table::from(builder))?;
    }
    Ok(())
}

/// The frontier as a `#, Risk, Return[, weights...]` table.
pub fn render_frontier(result: &FrontierOutput) -> String {
    if result.frontier.is_empty() {
        return "(empty frontier)".to_string();
    }

    let with_weights = result.frontier.iter().any(|p| p.weights.is_some());
    let mut header = vec!["#".to_string(), "Risk".to_string(), "Return".to_string()];
    if with_weights {
        header.extend(asset_names(result));
    }

    let mut builder = Builder::default();
    builder.push_record(header);
    for (i, p) in result.frontier.iter().enumerate() {
        let mut row = vec![i.to_string(), format_value(p.risk), format_value(p.expected_return)];
        if let Some(ref weights) = p.weights {
            row.extend(weights.iter().map(|w| format_value(*w)));
        }
        builder.push_record(row);
    }
    Table::from(builder).to_string()
}

fn format_value(v: f64) -> String {
    format!("{:.6}", v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use frontier_core::{compute_frontier, FrontierRequest};

    #[test]
    fn test_table_lists_every_point() {
        let mut req = FrontierRequest::parse_text("2 0.1 0.2 0.04 0 0 0.09 3").unwrap();
        req.include_weights = true;
        let out = compute_frontier(&req).unwrap().result;
        let table = render_frontier(&out);
        assert!(table.contains("asset_2"), "{}", table);
        assert!(table.contains("0.180278"), "{}", table);
    }

    #[test]
    fn test_empty_frontier() {
        let req = FrontierRequest::parse_text("2 0.1 0.2 0.04 0 0 0.09 0").unwrap();
        let out = compute_frontier(&req).unwrap().result;
        assert_eq!(render_frontier(&out), "(empty frontier)");
    }
}
