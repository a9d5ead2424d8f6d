use std::path::Path;

use anyhow::Result;

use crate::io::{read_document, write_document};

/// Write `input` to `output` in normalized coordinates.
pub fn normalize(input: &Path, output: &Path) -> Result<()> {
    let mut document = read_document(input)?;
    document.normalize();
    write_document(&mut document, output)?;
    println!("Normalized {} -> {}", input.display(), output.display());
    Ok(())
}

pub fn roundtrip(input: &Path, output: &Path) -> Result<()> {
    let mut document = read_document(input)?;
    write_document(&mut document, output)?;
    println!("Wrote {} -> {}", input.display(), output.display());
    Ok(())
}
