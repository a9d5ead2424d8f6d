//! Queries evaluated at a single location.

use std::path::Path;

use anyhow::{Context, Result, bail};
use mutatio_designspace::{AxisValue, Document, Location};
use mutatio_varmodel::{ModelOptions, VariationModel};

use crate::io::{location_from, read_document};

fn query_location(document: &Document, input: &Path, at: Vec<(String, AxisValue)>) -> Result<Location> {
    let location = location_from(at);
    if let Some(name) = location.axis_names().find(|name| document.axes.get(name).is_none()) {
        bail!("Unknown axis '{name}' in {}", input.display());
    }
    Ok(location)
}

pub fn rules(input: &Path, at: Vec<(String, AxisValue)>, glyphs: &[String]) -> Result<()> {
    let document = read_document(input)?;
    let location = query_location(&document, input, at)?;
    for (old, new) in substitutions(&document, &location, glyphs) {
        if old == new {
            println!("{old}");
        } else {
            println!("{old} -> {new}");
        }
    }
    Ok(())
}

/// Pairs every glyph name with its rule-processed name.
pub fn substitutions(document: &Document, location: &Location, glyphs: &[String]) -> Vec<(String, String)> {
    glyphs.iter().cloned().zip(document.process_rules(location, glyphs)).collect()
}

pub fn factors(input: &Path, at: Vec<(String, AxisValue)>, options: ModelOptions) -> Result<()> {
    let document = read_document(input)?;
    let location = query_location(&document, input, at)?;
    let weights = source_factors(&document, &location, options)
        .with_context(|| format!("Failed to build a model for {}", input.display()))?;
    for (name, weight) in weights {
        println!("{name}\t{weight:.6}");
    }
    Ok(())
}

/// The weight of every source at `location`, keyed by source name.
///
/// The model is biased at the document's default location, so a source must
/// sit there.
pub fn source_factors(
    document: &Document,
    location: &Location,
    options: ModelOptions,
) -> mutatio_varmodel::Result<Vec<(String, f64)>> {
    let bias = document.default_location();
    let items = document.sources.iter().map(|source| (source.location.clone(), source.name.clone()));
    let model = VariationModel::build(items, &document.axes, Some(&bias), options)?;
    let weights = model.get_factors(location);
    Ok(model.masters().iter().cloned().zip(weights).collect())
}
