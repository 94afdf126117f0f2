pub mod csv_out;
pub mod json;
pub mod table;
pub mod text;

use colored::Colorize;
use frontier_core::{ComputationOutput, FrontierOutput};
use std::error::Error;
use std::io::Write;

use crate::OutputFormat;

/// Dispatch output to the appropriate formatter and flush it.
///
/// The envelope carries its own warnings; every other format reports them
/// on stderr so stdout stays parseable. Any write failure is returned so
/// a truncated response is never reported as success.
pub fn format_output<W: Write>(
    w: &mut W,
    format: &OutputFormat,
    out: &ComputationOutput<FrontierOutput>,
) -> Result<(), Box<dyn Error>> {
    if *format != OutputFormat::Envelope {
        for warning in &out.warnings {
            eprintln!("{}: {}", "warning".yellow().bold(), warning);
        }
    }
    match format {
        OutputFormat::Json => json::write_json(w, &out.result)?,
        OutputFormat::Envelope => json::write_json(w, out)?,
        OutputFormat::Table => table::write_table(w, &out.result)?,
        OutputFormat::Csv => csv_out::write_csv(w, &out.result)?,
        OutputFormat::Text => text::write_text(w, &out.result)?,
    }
    w.flush()?;
    Ok(())
}

/// Asset names in column order, taken from the min-variance weights.
pub(crate) fn asset_names(result: &FrontierOutput) -> Vec<String> {
    result
        .min_variance_portfolio
        .weights
        .iter()
        .map(|w| w.name.clone())
        .collect()
}
