use serde::Serialize;
use std::error::Error;
use std::io::Write;

/// Pretty-print JSON followed by a newline.
pub fn write_json<W: Write, T: Serialize>(w: &mut W, value: &T) -> Result<(), Box<dyn Error>> {
    serde_json::to_writer_pretty(&mut *w, value)?;
    writeln!(w)?;
    Ok(())
}
