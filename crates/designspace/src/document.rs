//! The designspace document and its descriptors.

use std::path::{Path, PathBuf};

use indexmap::{IndexMap, IndexSet};
use log::{debug, info};

use crate::{
    axis::{Axis, AxisModel},
    config::{FORMAT_VERSION, LOCATION_EPSILON, TEMP_MASTER_PREFIX},
    error::Result,
    location::Location,
    paths::{posix_string, relative_path},
    rules::{Rule, process_rules},
};

/// A master: an artifact placed at a location.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Source {
    /// Unique key of the source within the document.
    pub name: String,
    /// Path as written in the document, relative to it.
    pub filename: Option<String>,
    /// Resolved path.
    pub path: Option<PathBuf>,
    pub family_name: Option<String>,
    pub style_name: Option<String>,
    /// Where the master sits, in design coordinates.
    pub location: Location,
    /// Layer to read glyphs from instead of the default layer.
    pub layer_name: Option<String>,
    /// Font info is copied from this source into every instance.
    pub copy_info: bool,
    /// The lib is copied from this source into every instance.
    pub copy_lib: bool,
    /// Groups are copied from this source into every instance.
    pub copy_groups: bool,
    /// Feature code is copied from this source into every instance.
    pub copy_features: bool,
    /// Leave this source's kerning out of the kerning model.
    pub mute_kerning: bool,
    /// Leave this source's font info out of the info model.
    pub mute_info: bool,
    /// Glyphs left out of their glyph models.
    pub muted_glyph_names: IndexSet<String>,
}

impl Source {
    pub fn new(name: impl Into<String>, location: Location) -> Self {
        Self { name: name.into(), location, ..Default::default() }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_family_name(mut self, name: impl Into<String>) -> Self {
        self.family_name = Some(name.into());
        self
    }

    pub fn with_style_name(mut self, name: impl Into<String>) -> Self {
        self.style_name = Some(name.into());
        self
    }

    pub fn with_layer(mut self, layer: impl Into<String>) -> Self {
        self.layer_name = Some(layer.into());
        self
    }

    pub fn is_glyph_muted(&self, glyph: &str) -> bool {
        self.muted_glyph_names.contains(glyph)
    }

    /// Whether the name was assigned on read and should not be persisted.
    pub fn has_temporary_name(&self) -> bool {
        self.name.starts_with(TEMP_MASTER_PREFIX)
    }
}

/// An alternative master for a single glyph of an instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlyphMaster {
    /// Source name to take the glyph from.
    pub source: Option<String>,
    /// Glyph to take; defaults to the overridden glyph.
    pub glyph_name: Option<String>,
    pub location: Option<Location>,
}

/// Per-glyph overrides inside an instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlyphOverride {
    /// The glyph is not generated.
    pub mute: bool,
    /// Code points replacing the ones of the neutral source.
    pub unicodes: Option<Vec<u32>>,
    pub note: Option<String>,
    /// Location to use for this glyph instead of the instance location.
    pub instance_location: Option<Location>,
    pub masters: Option<Vec<GlyphMaster>>,
}

impl GlyphOverride {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// An output to generate at a location.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    pub name: Option<String>,
    /// Output path as written in the document, relative to it.
    pub filename: Option<String>,
    /// Resolved output path. Instances without one are not generated.
    pub path: Option<PathBuf>,
    pub family_name: Option<String>,
    pub style_name: Option<String>,
    pub postscript_font_name: Option<String>,
    pub style_map_family_name: Option<String>,
    pub style_map_style_name: Option<String>,
    /// Family names keyed by language code.
    pub localised_family_name: IndexMap<String, String>,
    /// Style names keyed by language code.
    pub localised_style_name: IndexMap<String, String>,
    /// Style-map family names keyed by language code.
    pub localised_style_map_family_name: IndexMap<String, String>,
    /// Style-map style names keyed by language code.
    pub localised_style_map_style_name: IndexMap<String, String>,
    /// Where to interpolate, in design coordinates.
    pub location: Option<Location>,
    /// Per-glyph overrides keyed by glyph name.
    pub glyphs: IndexMap<String, GlyphOverride>,
    /// Whether kerning is generated.
    pub kerning: bool,
    /// Whether font info is generated.
    pub info: bool,
    /// Arbitrary data stored with the instance.
    pub lib: plist::Dictionary,
}

impl Default for Instance {
    fn default() -> Self {
        Self {
            name: None,
            filename: None,
            path: None,
            family_name: None,
            style_name: None,
            postscript_font_name: None,
            style_map_family_name: None,
            style_map_style_name: None,
            localised_family_name: IndexMap::new(),
            localised_style_name: IndexMap::new(),
            localised_style_map_family_name: IndexMap::new(),
            localised_style_map_style_name: IndexMap::new(),
            location: None,
            glyphs: IndexMap::new(),
            kerning: true,
            info: true,
            lib: plist::Dictionary::new(),
        }
    }
}

impl Instance {
    pub fn new(location: Location) -> Self {
        Self { location: Some(location), ..Default::default() }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_family_name(mut self, name: impl Into<String>) -> Self {
        self.family_name = Some(name.into());
        self
    }

    pub fn with_style_name(mut self, name: impl Into<String>) -> Self {
        self.style_name = Some(name.into());
        self
    }

    pub fn with_glyph(mut self, glyph: impl Into<String>, overrides: GlyphOverride) -> Self {
        self.glyphs.insert(glyph.into(), overrides);
        self
    }

    /// A readable identifier for messages.
    pub fn label(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        match (&self.family_name, &self.style_name) {
            (Some(family), Some(style)) => format!("{family} {style}"),
            _ => self
                .filename
                .clone()
                .or_else(|| self.path.as_ref().map(|p| p.display().to_string()))
                .unwrap_or_else(|| "<unnamed instance>".to_string()),
        }
    }
}

/// Why a source was picked as the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultReason {
    /// It sits at the default location.
    Location,
    /// No source sits at the default location, but it carries the copy-info flag.
    CopyInfo,
}

/// The outcome of [`Document::find_default`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultSource {
    Found { index: usize, reason: DefaultReason },
    /// Several sources qualify equally.
    Ambiguous { candidates: Vec<usize> },
    Missing,
}

impl DefaultSource {
    pub fn index(&self) -> Option<usize> {
        match self {
            DefaultSource::Found { index, .. } => Some(*index),
            _ => None,
        }
    }
}

/// A complete designspace.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Where the document was read from or last written to.
    pub path: Option<PathBuf>,
    /// The `format` attribute of the root element.
    pub format_version: String,
    pub axes: AxisModel,
    /// Masters, in document order.
    pub sources: Vec<Source>,
    pub instances: Vec<Instance>,
    /// Substitution rules, applied in order.
    pub rules: Vec<Rule>,
    /// Arbitrary data stored with the document.
    pub lib: plist::Dictionary,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            path: None,
            format_version: FORMAT_VERSION.to_string(),
            axes: AxisModel::new(),
            sources: Vec::new(),
            instances: Vec::new(),
            rules: Vec::new(),
            lib: plist::Dictionary::new(),
        }
    }
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_axis(&mut self, axis: Axis) -> Result<()> {
        self.axes.push(axis)
    }

    /// Adds a source, dropping location entries for undeclared axes.
    pub fn add_source(&mut self, mut source: Source) -> Result<()> {
        let context = format!("source '{}'", source.name);
        self.axes.validate_location(&mut source.location, false, &context)?;
        self.sources.push(source);
        Ok(())
    }

    /// Adds an instance, dropping location entries for undeclared axes.
    pub fn add_instance(&mut self, mut instance: Instance) -> Result<()> {
        let context = format!("instance '{}'", instance.label());
        if let Some(location) = instance.location.as_mut() {
            self.axes.validate_location(location, false, &context)?;
        }
        self.instances.push(instance);
        Ok(())
    }

    pub fn add_rule(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    pub fn source(&self, name: &str) -> Option<&Source> {
        self.sources.iter().find(|source| source.name == name)
    }

    /// Every axis at its default.
    pub fn default_location(&self) -> Location {
        self.axes.default_location()
    }

    /// Locates the default source.
    ///
    /// A source at the default location wins. Without one, a single source
    /// flagged with copy-info is used.
    pub fn find_default(&self) -> DefaultSource {
        let defaults = self.default_location();
        let at_default: Vec<usize> = self
            .sources
            .iter()
            .enumerate()
            .filter(|(_, source)| source.location.approx_eq(&defaults, &defaults, LOCATION_EPSILON))
            .map(|(index, _)| index)
            .collect();
        match at_default.as_slice() {
            [index] => return DefaultSource::Found { index: *index, reason: DefaultReason::Location },
            [] => {}
            _ => return DefaultSource::Ambiguous { candidates: at_default },
        }

        let donors: Vec<usize> = self
            .sources
            .iter()
            .enumerate()
            .filter(|(_, source)| source.copy_info)
            .map(|(index, _)| index)
            .collect();
        match donors.as_slice() {
            [] => DefaultSource::Missing,
            [index] => DefaultSource::Found { index: *index, reason: DefaultReason::CopyInfo },
            _ => DefaultSource::Ambiguous { candidates: donors },
        }
    }

    pub fn default_source(&self) -> Option<&Source> {
        self.find_default().index().map(|index| &self.sources[index])
    }

    /// Normalizes a location against the document axes. Absent axes stay absent.
    pub fn normalize_location(&self, location: &Location) -> Location {
        self.axes.normalize(location)
    }

    /// Applies the document rules at `location`, treating absent axes as
    /// their defaults.
    pub fn process_rules<S: AsRef<str>>(&self, location: &Location, names: &[S]) -> Vec<String> {
        let location = location.merged_over(&self.default_location());
        process_rules(&self.rules, &location, names)
    }

    /// Rewrites the whole document into normalized coordinates.
    ///
    /// Source, instance and glyph locations, axis map outputs, axis bounds and
    /// rule conditions are rescaled against the current axis bounds. Map inputs
    /// stay in design coordinates. Anisotropic values keep both components.
    /// This is destructive and should be applied once.
    pub fn normalize(&mut self) {
        let axes = self.axes.clone();
        let normalize = |location: &Location| axes.normalize_components(location);

        for source in &mut self.sources {
            source.location = normalize(&source.location);
        }
        for instance in &mut self.instances {
            if let Some(location) = &instance.location {
                instance.location = Some(normalize(location));
            }
            for glyph in instance.glyphs.values_mut() {
                if let Some(location) = &glyph.instance_location {
                    glyph.instance_location = Some(normalize(location));
                }
                for master in glyph.masters.iter_mut().flatten() {
                    if let Some(location) = &master.location {
                        master.location = Some(normalize(location));
                    }
                }
            }
        }
        for rule in &mut self.rules {
            for condition in rule.condition_sets.iter_mut().flatten() {
                let Some(axis) = axes.get(&condition.name) else { continue };
                condition.minimum = condition.minimum.map(|v| axis.normalize_value(v));
                condition.maximum = condition.maximum.map(|v| axis.normalize_value(v));
            }
        }
        for axis in self.axes.axes_mut() {
            let original = axis.clone();
            for (_, output) in axis.map.iter_mut() {
                *output = original.normalize_value(*output);
            }
            axis.minimum = original.normalize_value(original.minimum);
            axis.default = original.normalize_value(original.default);
            axis.maximum = original.normalize_value(original.maximum);
        }
        debug!("normalized document with {} axes", self.axes.len());
    }

    /// Recomputes every `filename` from its resolved path, relative to the
    /// directory of `document_path`.
    pub fn update_paths(&mut self, document_path: &Path) {
        let base = document_path.parent().unwrap_or(Path::new(""));
        let relative = |path: &Path| posix_string(&relative_path(path, base));
        for source in &mut self.sources {
            if let Some(path) = &source.path {
                source.filename = Some(relative(path));
            }
        }
        for instance in &mut self.instances {
            if let Some(path) = &instance.path {
                instance.filename = Some(relative(path));
            }
        }
    }

    /// Writes the document to `path`, updating the stored path and the
    /// relative filenames of sources and instances.
    pub fn write(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        crate::writer::check_overwrite(path)?;
        self.path = Some(path.to_path_buf());
        self.update_paths(path);
        let xml = self.to_xml_string()?;
        std::fs::write(path, xml).map_err(|e| crate::Error::io(path, e))?;
        info!("wrote {}", path.display());
        Ok(())
    }

    /// Serializes without touching the filesystem.
    pub fn to_xml_string(&self) -> Result<String> {
        crate::writer::write_document(self)
    }
}
