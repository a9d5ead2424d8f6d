//! Reading designspace XML.

use std::{
    fs,
    path::{Path, PathBuf},
};

use indexmap::IndexMap;
use log::{debug, info, warn};
use roxmltree::Node;

use crate::{
    axis::{Axis, AxisModel, parse_tag},
    config::{LEGACY_FORMAT_VERSION, SUPPORTED_MAJOR_VERSION, TEMP_MASTER_PREFIX},
    document::{Document, GlyphMaster, GlyphOverride, Instance, Source},
    error::{Error, Result},
    location::{AxisValue, Location},
    paths::resolve,
    rules::{Condition, ConditionSet, Rule},
};

const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Options controlling how strictly a document is read.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOptions {
    /// Reject sources and instances whose locations name undeclared axes
    /// instead of dropping those coordinates.
    pub strict_axis_names: bool,
}

impl ReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strict_axis_names(mut self, strict: bool) -> Self {
        self.strict_axis_names = strict;
        self
    }
}

/// A document together with the elements that were skipped while reading it.
#[derive(Debug)]
pub struct ReadReport {
    pub document: Document,
    pub skipped: Vec<Error>,
}

impl Document {
    /// Reads a document, logging and discarding malformed elements.
    pub fn read(path: impl AsRef<Path>) -> Result<Document> {
        Ok(Self::read_with_options(path, ReadOptions::default())?.document)
    }

    pub fn read_with_options(path: impl AsRef<Path>, options: ReadOptions) -> Result<ReadReport> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let report = Self::from_xml_str(&text, Some(path), options)?;
        info!(
            "read {}: {} axes, {} sources, {} instances",
            path.display(),
            report.document.axes.len(),
            report.document.sources.len(),
            report.document.instances.len()
        );
        Ok(report)
    }

    /// Parses XML text. Relative filenames resolve against the directory of
    /// `path` when one is given.
    pub fn from_xml_str(text: &str, path: Option<&Path>, options: ReadOptions) -> Result<ReadReport> {
        let xml = roxmltree::Document::parse(text)?;
        let root = xml.root_element();
        if !root.has_tag_name("designspace") {
            return Err(Error::NotADesignspace(root.tag_name().name().to_string()));
        }
        let base_dir = path.map(|p| p.parent().map(Path::to_path_buf).unwrap_or_default());
        let mut reader = Reader { text, base_dir, options, axes: AxisModel::new(), skipped: Vec::new() };

        let format_version = root.attribute("format").unwrap_or(LEGACY_FORMAT_VERSION).to_string();
        if major_version(&format_version).is_some_and(|major| major > SUPPORTED_MAJOR_VERSION) {
            warn!("document format {format_version} is newer than supported, reading what is understood");
        }

        reader.read_axes(root)?;
        if reader.axes.is_empty() && root.descendants().any(|n| n.has_tag_name("location")) {
            return Err(Error::NoAxes);
        }
        let rules = reader.read_rules(root);
        let sources = reader.read_sources(root);
        let instances = reader.read_instances(root);
        let lib = match child(root, "lib") {
            Some(lib) => reader.read_lib(lib)?,
            None => plist::Dictionary::new(),
        };

        let document = Document {
            path: path.map(Path::to_path_buf),
            format_version,
            axes: reader.axes,
            sources,
            instances,
            rules,
            lib,
        };
        Ok(ReadReport { document, skipped: reader.skipped })
    }
}

pub(crate) fn major_version(version: &str) -> Option<u32> {
    version.split('.').next()?.trim().parse().ok()
}

fn children<'a, 'input>(node: Node<'a, 'input>, name: &'static str) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(move |n| n.has_tag_name(name))
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &'static str) -> Option<Node<'a, 'input>> {
    children(node, name).next()
}

fn grandchildren<'a, 'input>(
    node: Node<'a, 'input>,
    outer: &'static str,
    inner: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    children(node, outer).flat_map(move |n| children(n, inner))
}

fn flag(node: Node<'_, '_>, attribute: &str) -> bool {
    node.attribute(attribute) == Some("1")
}

fn string_attr(node: Node<'_, '_>, attribute: &str) -> Option<String> {
    node.attribute(attribute).map(str::to_string)
}

fn number(node: Node<'_, '_>, element: &'static str, attribute: &'static str) -> Result<Option<f64>> {
    node.attribute(attribute)
        .map(|raw| {
            raw.trim().parse::<f64>().map_err(|_| Error::InvalidNumber {
                element,
                attribute,
                value: raw.to_string(),
            })
        })
        .transpose()
}

fn required_number(node: Node<'_, '_>, element: &'static str, attribute: &'static str) -> Result<f64> {
    number(node, element, attribute)?.ok_or(Error::MissingAttribute { element, attribute })
}

fn required_str<'a>(node: Node<'a, '_>, element: &'static str, attribute: &'static str) -> Result<&'a str> {
    node.attribute(attribute).ok_or(Error::MissingAttribute { element, attribute })
}

fn lang(node: Node<'_, '_>) -> Option<String> {
    node.attribute((XML_NS, "lang")).map(str::to_string)
}

/// Parses space-separated hexadecimal code points, with or without `0x`.
pub(crate) fn parse_unicodes(raw: &str) -> Option<Vec<u32>> {
    raw.split_whitespace()
        .map(|token| {
            let digits = token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")).unwrap_or(token);
            u32::from_str_radix(digits, 16).ok()
        })
        .collect()
}

struct Reader<'t> {
    text: &'t str,
    base_dir: Option<PathBuf>,
    options: ReadOptions,
    axes: AxisModel,
    skipped: Vec<Error>,
}

impl Reader<'_> {
    fn skip(&mut self, what: &str, error: Error) {
        warn!("skipping {what}: {error}");
        self.skipped.push(error);
    }

    fn resolve_path(&self, filename: &str) -> PathBuf {
        match &self.base_dir {
            Some(dir) => resolve(dir, filename),
            None => PathBuf::from(filename),
        }
    }

    fn read_axes(&mut self, root: Node<'_, '_>) -> Result<()> {
        for node in grandchildren(root, "axes", "axis") {
            let axis = read_axis(node)?;
            debug!("axis '{}' ({}) {}..{}..{}", axis.name, axis.tag, axis.minimum, axis.default, axis.maximum);
            self.axes.push(axis)?;
        }
        Ok(())
    }

    fn read_location(&self, parent: Node<'_, '_>, context: &str) -> Result<Option<Location>> {
        let Some(node) = child(parent, "location") else {
            return Ok(None);
        };
        let mut location = Location::new();
        for dimension in children(node, "dimension") {
            let Some(name) = dimension.attribute("name") else {
                warn!("{context}: dimension without a name, ignoring it");
                continue;
            };
            let x = match number(dimension, "dimension", "xvalue") {
                Ok(Some(x)) => x,
                Ok(None) | Err(_) => {
                    warn!("{context}: dimension '{name}' has no usable xvalue, ignoring it");
                    continue;
                }
            };
            let value = match number(dimension, "dimension", "yvalue") {
                Ok(Some(y)) => AxisValue::Anisotropic(x, y),
                _ => AxisValue::Scalar(x),
            };
            location.insert(name, value);
        }
        self.axes.validate_location(&mut location, self.options.strict_axis_names, context)?;
        Ok(Some(location))
    }

    fn read_rules(&mut self, root: Node<'_, '_>) -> Vec<Rule> {
        let mut rules = Vec::new();
        for (index, node) in grandchildren(root, "rules", "rule").enumerate() {
            let label = node.attribute("name").map_or_else(|| format!("#{index}"), str::to_string);
            match self.read_rule(node, &label) {
                Ok(rule) => rules.push(rule),
                Err(e) => self.skip(&format!("rule '{label}'"), e),
            }
        }
        rules
    }

    fn read_rule(&mut self, node: Node<'_, '_>, label: &str) -> Result<Rule> {
        let mut rule = Rule { name: string_attr(node, "name"), ..Default::default() };

        let stray = self.read_conditions(node, label)?;
        if !stray.is_empty() {
            warn!("rule '{label}' has conditions outside a conditionset, wrapping them in a new one");
            rule.condition_sets.push(stray);
        }
        for set in children(node, "conditionset") {
            let conditions = self.read_conditions(set, label)?;
            if conditions.is_empty() {
                warn!("rule '{label}' has a conditionset without bounded conditions, dropping it");
                continue;
            }
            rule.condition_sets.push(conditions);
        }
        for sub in children(node, "sub") {
            match (sub.attribute("name"), sub.attribute("with")) {
                (Some(from), Some(to)) => rule.subs.push((from.to_string(), to.to_string())),
                _ => return Err(Error::InvalidSub(label.to_string())),
            }
        }
        Ok(rule)
    }

    fn read_conditions(&mut self, parent: Node<'_, '_>, label: &str) -> Result<ConditionSet> {
        let mut conditions = Vec::new();
        for node in children(parent, "condition") {
            let name = required_str(node, "condition", "name")?;
            let condition = Condition::new(
                name,
                number(node, "condition", "minimum")?,
                number(node, "condition", "maximum")?,
            );
            if condition.is_bounded() {
                conditions.push(condition);
            } else {
                let error = Error::UnboundedCondition { rule: label.to_string(), axis: name.to_string() };
                self.skip("condition", error);
            }
        }
        Ok(conditions)
    }

    fn read_sources(&mut self, root: Node<'_, '_>) -> Vec<Source> {
        let mut sources = Vec::new();
        for (index, node) in grandchildren(root, "sources", "source").enumerate() {
            match self.read_source(node, index) {
                Ok(source) => sources.push(source),
                Err(e) => self.skip(&format!("source #{index}"), e),
            }
        }
        sources
    }

    fn read_source(&self, node: Node<'_, '_>, index: usize) -> Result<Source> {
        let name = string_attr(node, "name").unwrap_or_else(|| format!("{TEMP_MASTER_PREFIX}.{index}"));
        let filename = string_attr(node, "filename");
        let mut source = Source {
            path: filename.as_deref().map(|f| self.resolve_path(f)),
            filename,
            family_name: string_attr(node, "familyname"),
            style_name: string_attr(node, "stylename"),
            layer_name: string_attr(node, "layer"),
            location: self.read_location(node, &format!("source '{name}'"))?.unwrap_or_default(),
            name,
            ..Default::default()
        };

        source.copy_lib = children(node, "lib").any(|n| flag(n, "copy"));
        source.copy_groups = children(node, "groups").any(|n| flag(n, "copy"));
        source.copy_features = children(node, "features").any(|n| flag(n, "copy"));
        for info in children(node, "info") {
            source.copy_info |= flag(info, "copy");
            source.mute_info |= flag(info, "mute");
        }
        source.mute_kerning = children(node, "kerning").any(|n| flag(n, "mute"));
        for glyph in children(node, "glyph") {
            if let Some(glyph_name) = glyph.attribute("name")
                && flag(glyph, "mute")
            {
                source.muted_glyph_names.insert(glyph_name.to_string());
            }
        }
        debug!("source '{}' at {}", source.name, source.location);
        Ok(source)
    }

    fn read_instances(&mut self, root: Node<'_, '_>) -> Vec<Instance> {
        let mut instances = Vec::new();
        for (index, node) in grandchildren(root, "instances", "instance").enumerate() {
            match self.read_instance(node) {
                Ok(instance) => instances.push(instance),
                Err(e) => self.skip(&format!("instance #{index}"), e),
            }
        }
        instances
    }

    fn read_instance(&mut self, node: Node<'_, '_>) -> Result<Instance> {
        let filename = string_attr(node, "filename");
        let mut instance = Instance {
            name: string_attr(node, "name"),
            path: filename.as_deref().map(|f| self.resolve_path(f)),
            filename,
            family_name: string_attr(node, "familyname"),
            style_name: string_attr(node, "stylename"),
            postscript_font_name: string_attr(node, "postscriptfontname"),
            style_map_family_name: string_attr(node, "stylemapfamilyname"),
            style_map_style_name: string_attr(node, "stylemapstylename"),
            localised_family_name: localised(node, "familyname"),
            localised_style_name: localised(node, "stylename"),
            localised_style_map_family_name: localised(node, "stylemapfamilyname"),
            localised_style_map_style_name: localised(node, "stylemapstylename"),
            ..Default::default()
        };
        let context = format!("instance '{}'", instance.label());
        instance.location = self.read_location(node, &context)?;

        for glyph in grandchildren(node, "glyphs", "glyph") {
            match self.read_glyph(glyph, &context) {
                Ok((name, overrides)) => {
                    instance.glyphs.insert(name, overrides);
                }
                Err(e) => self.skip(&format!("glyph in {context}"), e),
            }
        }
        // Both flags default to on; the elements only confirm it.
        instance.kerning |= child(node, "kerning").is_some();
        instance.info |= child(node, "info").is_some();
        if let Some(lib) = child(node, "lib") {
            instance.lib = self.read_lib(lib)?;
        }
        Ok(instance)
    }

    fn read_glyph(&self, node: Node<'_, '_>, context: &str) -> Result<(String, GlyphOverride)> {
        let name = node.attribute("name").ok_or(Error::MissingGlyphName)?.to_string();
        let unicodes = match node.attribute("unicode") {
            Some(raw) => Some(parse_unicodes(raw).ok_or_else(|| Error::InvalidUnicode {
                glyph: name.clone(),
                value: raw.to_string(),
            })?),
            None => None,
        };
        let glyph_context = format!("glyph '{name}' in {context}");
        let mut masters: Option<Vec<GlyphMaster>> = None;
        for master in grandchildren(node, "masters", "master") {
            masters.get_or_insert_with(Vec::new).push(GlyphMaster {
                source: string_attr(master, "source"),
                glyph_name: Some(string_attr(master, "glyphname").unwrap_or_else(|| name.clone())),
                location: self.read_location(master, &glyph_context)?,
            });
        }
        let overrides = GlyphOverride {
            mute: flag(node, "mute"),
            unicodes,
            note: child(node, "note").and_then(|n| n.text()).map(|t| t.trim().to_string()),
            instance_location: self.read_location(node, &glyph_context)?,
            masters,
        };
        Ok((name, overrides))
    }

    /// Reads the plist dictionary inside a `<lib>` element.
    fn read_lib(&self, node: Node<'_, '_>) -> Result<plist::Dictionary> {
        let Some(dict) = node.children().find(|n| n.is_element()) else {
            return Ok(plist::Dictionary::new());
        };
        let snippet = format!("<plist version=\"1.0\">{}</plist>", &self.text[dict.range()]);
        let value = plist::Value::from_reader_xml(snippet.as_bytes())?;
        Ok(value.into_dictionary().unwrap_or_default())
    }
}

fn read_axis(node: Node<'_, '_>) -> Result<Axis> {
    let name = required_str(node, "axis", "name")?;
    let tag = parse_tag(required_str(node, "axis", "tag")?)?;
    let mut axis = Axis::new(
        name,
        tag,
        required_number(node, "axis", "minimum")?,
        required_number(node, "axis", "default")?,
        required_number(node, "axis", "maximum")?,
    );
    axis.hidden = flag(node, "hidden");
    for map in children(node, "map") {
        axis.map.push((required_number(map, "map", "input")?, required_number(map, "map", "output")?));
    }
    for label in children(node, "labelname") {
        if let (Some(language), Some(text)) = (lang(label), label.text()) {
            axis.label_names.insert(language, text.to_string());
        }
    }
    Ok(axis)
}

fn localised(node: Node<'_, '_>, name: &'static str) -> IndexMap<String, String> {
    children(node, name)
        .filter_map(|n| Some((lang(n)?, n.text()?.to_string())))
        .collect()
}
