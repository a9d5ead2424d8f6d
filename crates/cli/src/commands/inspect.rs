//! Human-readable summaries of designspace documents.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use mutatio_designspace::{Axis, DefaultReason, DefaultSource, Document, Instance, Rule, Source, format_number};

use crate::{
    io::{expand_inputs, read_document},
    parallel::report_parallel,
};

pub fn inspect(paths: &[PathBuf]) -> Result<()> {
    let paths = expand_inputs(paths)?;
    report_parallel(&paths, |path| Ok(describe(&read_document(path)?, path))).ok_or_bail("inspect")
}

/// Print the default source of every document. Fails if any document has none
/// or several candidates.
pub fn default_source(paths: &[PathBuf]) -> Result<()> {
    let paths = expand_inputs(paths)?;
    report_parallel(&paths, |path| {
        let document = read_document(path)?;
        let verdict = default_verdict(&document);
        match document.find_default() {
            DefaultSource::Found { .. } => Ok(format!("{}: {verdict}", path.display())),
            _ => bail!("{verdict}"),
        }
    })
    .ok_or_bail("default source")
}

pub fn default_verdict(document: &Document) -> String {
    match document.find_default() {
        DefaultSource::Found { index, reason } => {
            let name = &document.sources[index].name;
            match reason {
                DefaultReason::Location => format!("{name} (at the default location)"),
                DefaultReason::CopyInfo => format!("{name} (copy-info source, nothing at the default location)"),
            }
        }
        DefaultSource::Ambiguous { candidates } => {
            let names: Vec<&str> = candidates.iter().map(|&index| document.sources[index].name.as_str()).collect();
            format!("ambiguous between {}", names.join(", "))
        }
        DefaultSource::Missing => "no default source".to_string(),
    }
}

pub fn describe(document: &Document, path: &Path) -> String {
    let mut lines = vec![format!("{} (format {})", path.display(), document.format_version)];

    lines.push("axes:".to_string());
    lines.extend(document.axes.iter().map(describe_axis));

    lines.push("sources:".to_string());
    section(&mut lines, document.sources.iter().map(describe_source));

    lines.push("instances:".to_string());
    section(&mut lines, document.instances.iter().map(describe_instance));

    lines.push("rules:".to_string());
    section(&mut lines, document.rules.iter().map(describe_rule));

    lines.push(format!("default: {}", default_verdict(document)));
    lines.join("\n")
}

fn section(lines: &mut Vec<String>, entries: impl Iterator<Item = String>) {
    let start = lines.len();
    lines.extend(entries);
    if lines.len() == start {
        lines.push("  (none)".to_string());
    }
}

fn describe_axis(axis: &Axis) -> String {
    let mut line = format!(
        "  {} [{}] {} / {} / {}",
        axis.name,
        axis.tag,
        format_number(axis.minimum),
        format_number(axis.default),
        format_number(axis.maximum)
    );
    if !axis.map.is_empty() {
        line.push_str(&format!(", {}", plural(axis.map.len(), "map point")));
    }
    if axis.hidden {
        line.push_str(", hidden");
    }
    line
}

fn describe_source(source: &Source) -> String {
    let mut line = format!("  {} {}", source.name, source.location);
    if let Some(file) = source.filename.clone().or_else(|| source.path.as_ref().map(|p| p.display().to_string())) {
        line.push_str(&format!(" {file}"));
    }
    if let Some(layer) = &source.layer_name {
        line.push_str(&format!(", layer {layer}"));
    }
    if source.copy_info {
        line.push_str(", copies info");
    }
    if !source.muted_glyph_names.is_empty() {
        line.push_str(&format!(", {}", plural(source.muted_glyph_names.len(), "muted glyph")));
    }
    line
}

fn describe_instance(instance: &Instance) -> String {
    let location = instance.location.as_ref().map_or_else(|| "(no location)".to_string(), ToString::to_string);
    let mut line = format!("  {} {location}", instance.label());
    if let Some(file) = &instance.filename {
        line.push_str(&format!(" {file}"));
    }
    if !instance.glyphs.is_empty() {
        line.push_str(&format!(", {}", plural(instance.glyphs.len(), "glyph override")));
    }
    line
}

fn describe_rule(rule: &Rule) -> String {
    format!(
        "  {}: {}, {}",
        rule.display_name(),
        plural(rule.condition_sets.len(), "condition set"),
        plural(rule.subs.len(), "substitution")
    )
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 { format!("1 {noun}") } else { format!("{count} {noun}s") }
}
