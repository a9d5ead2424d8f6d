//! Shared designspace I/O utilities.

use std::{
    fs::create_dir_all,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use glob::glob;
use log::debug;
use mutatio_designspace::{AxisValue, Document, Location};

const DESIGNSPACE_PATTERN: &str = "*.designspace";

/// Find designspace files in a directory, sorted by path.
pub fn glob_designspaces(dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = dir.join(DESIGNSPACE_PATTERN);
    let pattern_str = pattern.to_str().context("Invalid pattern path")?;
    let mut paths: Vec<PathBuf> = glob(pattern_str)
        .with_context(|| format!("Failed to glob pattern: {pattern_str}"))?
        .filter_map(Result::ok)
        .collect();
    paths.sort();
    debug!("found {} designspace files in {}", paths.len(), dir.display());
    Ok(paths)
}

/// Expand directory arguments into the designspace files they contain.
pub fn expand_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let found = glob_designspaces(input)?;
            if found.is_empty() {
                bail!("No designspace files in {}", input.display());
            }
            paths.extend(found);
        } else {
            paths.push(input.clone());
        }
    }
    Ok(paths)
}

pub fn read_document(path: &Path) -> Result<Document> {
    Document::read(path).with_context(|| format!("Failed to read designspace: {}", path.display()))
}

/// Write a document, creating the parent directory if needed.
pub fn write_document(document: &mut Document, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        create_dir_all(parent).with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    document.write(path).with_context(|| format!("Failed to write designspace: {}", path.display()))
}

/// Parse `name=value` or `name=x,y` into an axis coordinate.
pub fn parse_axis_value(raw: &str) -> Result<(String, AxisValue), String> {
    let (name, value) = raw.split_once('=').ok_or_else(|| format!("expected AXIS=VALUE, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing axis name in '{raw}'"));
    }
    let number = |text: &str| {
        text.trim().parse::<f64>().map_err(|_| format!("invalid number '{}' for axis '{name}'", text.trim()))
    };
    let value = match value.split_once(',') {
        Some((x, y)) => AxisValue::Anisotropic(number(x)?, number(y)?),
        None => AxisValue::Scalar(number(value)?),
    };
    Ok((name.to_string(), value))
}

pub fn location_from(pairs: impl IntoIterator<Item = (String, AxisValue)>) -> Location {
    let mut location = Location::new();
    for (name, value) in pairs {
        location.insert(name, value);
    }
    location
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scalar_and_anisotropic_values() {
        assert_eq!(parse_axis_value("weight=650").unwrap(), ("weight".to_string(), AxisValue::Scalar(650.0)));
        assert_eq!(
            parse_axis_value("width = 50, 75.5").unwrap(),
            ("width".to_string(), AxisValue::Anisotropic(50.0, 75.5))
        );
    }

    #[test]
    fn rejects_malformed_values() {
        assert!(parse_axis_value("weight").is_err());
        assert!(parse_axis_value("=400").is_err());
        assert!(parse_axis_value("weight=heavy").is_err());
        assert!(parse_axis_value("width=50,").is_err());
    }

    #[test]
    fn later_values_replace_earlier_ones() {
        let location = location_from([
            ("weight".to_string(), AxisValue::Scalar(400.0)),
            ("weight".to_string(), AxisValue::Scalar(700.0)),
        ]);
        assert_eq!(location.value("weight"), Some(700.0));
        assert_eq!(location.len(), 1);
    }
}
