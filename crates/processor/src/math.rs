//! In-memory reference implementations of the artifact traits.
//!
//! These back the tests and demos. They cover what interpolation needs and
//! nothing of any on-disk font format.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use indexmap::IndexMap;
use kurbo::{Point, Vec2};
use mutatio_varmodel::Interpolable;

use crate::{
    artifact::{ArtifactLoader, GlyphGeometry, InstanceWriter, SourceArtifact},
    error::{LoadError, WriteError},
    instance::BuiltInstance,
    rename::Rename,
};

/// Font info: numeric fields interpolate, text fields are copied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InfoValues {
    pub values: IndexMap<String, f64>,
    pub text: IndexMap<String, String>,
}

impl InfoValues {
    pub fn with_value(mut self, key: impl Into<String>, value: f64) -> Self {
        self.values.insert(key.into(), value);
        self
    }

    pub fn with_text(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.text.insert(key.into(), value.into());
        self
    }
}

/// Only fields present on both sides survive an addition.
impl Interpolable for InfoValues {
    fn scale(&self, factor: f64) -> Self {
        let values = self.values.iter().map(|(k, v)| (k.clone(), v * factor)).collect();
        Self { values, text: self.text.clone() }
    }

    fn add(&self, other: &Self) -> Self {
        let values = self
            .values
            .iter()
            .filter_map(|(k, v)| other.values.get(k).map(|o| (k.clone(), v + o)))
            .collect();
        Self { values, text: self.text.clone() }
    }
}

/// Pair kerning. Pairs missing on one side count as zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KerningTable(pub IndexMap<(String, String), f64>);

impl KerningTable {
    pub fn with_pair(mut self, first: impl Into<String>, second: impl Into<String>, value: f64) -> Self {
        self.0.insert((first.into(), second.into()), value);
        self
    }

    pub fn get(&self, first: &str, second: &str) -> Option<f64> {
        self.0.get(&(first.to_string(), second.to_string())).copied()
    }
}

impl Interpolable for KerningTable {
    fn scale(&self, factor: f64) -> Self {
        Self(self.0.iter().map(|(pair, v)| (pair.clone(), v * factor)).collect())
    }

    fn add(&self, other: &Self) -> Self {
        let mut sum = self.0.clone();
        for (pair, value) in &other.0 {
            *sum.entry(pair.clone()).or_insert(0.0) += value;
        }
        Self(sum)
    }
}

impl Rename for KerningTable {
    fn contains(&self, name: &str) -> bool {
        self.0.keys().any(|(first, second)| first == name || second == name)
    }

    fn rename(&mut self, old: &str, new: &str) {
        let swap = |name: &String| if name == old { new.to_string() } else { name.clone() };
        self.0 = self.0.iter().map(|((first, second), v)| ((swap(first), swap(second)), *v)).collect();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub base: String,
    pub offset: Vec2,
}

impl Component {
    pub fn new(base: impl Into<String>, offset: Vec2) -> Self {
        Self { base: base.into(), offset }
    }
}

/// Outline geometry with an advance width. Masters are assumed to be point
/// compatible; surplus points on either side are dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlyphOutline {
    pub width: f64,
    pub contours: Vec<Vec<Point>>,
    pub components: Vec<Component>,
}

impl GlyphOutline {
    pub fn new(width: f64) -> Self {
        Self { width, ..Default::default() }
    }

    pub fn with_contour(mut self, points: impl IntoIterator<Item = (f64, f64)>) -> Self {
        self.contours.push(points.into_iter().map(Point::from).collect());
        self
    }

    pub fn with_component(mut self, base: impl Into<String>, offset: (f64, f64)) -> Self {
        self.components.push(Component::new(base, Vec2::from(offset)));
        self
    }

    fn zip_with(&self, other: &Self, f: impl Fn(Point, Point) -> Point, width: f64) -> Self {
        let contours = self
            .contours
            .iter()
            .zip(&other.contours)
            .map(|(a, b)| a.iter().zip(b).map(|(p, q)| f(*p, *q)).collect())
            .collect();
        let components = self
            .components
            .iter()
            .zip(&other.components)
            .map(|(a, b)| Component::new(a.base.clone(), f(a.offset.to_point(), b.offset.to_point()).to_vec2()))
            .collect();
        Self { width, contours, components }
    }
}

impl Interpolable for GlyphOutline {
    fn scale(&self, factor: f64) -> Self {
        Self {
            width: self.width * factor,
            contours: self
                .contours
                .iter()
                .map(|c| c.iter().map(|p| Interpolable::scale(p, factor)).collect())
                .collect(),
            components: self
                .components
                .iter()
                .map(|c| Component::new(c.base.clone(), c.offset * factor))
                .collect(),
        }
    }

    fn add(&self, other: &Self) -> Self {
        self.zip_with(other, |p, q| Interpolable::add(&p, &q), self.width + other.width)
    }

    fn combine_anisotropic(x: &Self, y: &Self) -> Self {
        x.zip_with(y, |p, q| Point::combine_anisotropic(&p, &q), x.width)
    }
}

impl GlyphGeometry for GlyphOutline {
    fn round(&self) -> Self {
        Self {
            width: self.width.round(),
            contours: self.contours.iter().map(|c| c.iter().map(|p| p.round()).collect()).collect(),
            components: self
                .components
                .iter()
                .map(|c| Component::new(c.base.clone(), c.offset.round()))
                .collect(),
        }
    }

    fn rename_reference(&mut self, old: &str, new: &str) {
        for component in self.components.iter_mut().filter(|c| c.base == old) {
            component.base = new.to_string();
        }
    }
}

/// Nesting deeper than this is treated as a component cycle.
const MAX_COMPONENT_DEPTH: usize = 32;

/// A master held entirely in memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryArtifact {
    pub glyphs: IndexMap<String, GlyphOutline>,
    pub layers: IndexMap<String, IndexMap<String, GlyphOutline>>,
    pub unicodes: IndexMap<String, Vec<u32>>,
    pub info: InfoValues,
    pub kerning: KerningTable,
    pub groups: IndexMap<String, Vec<String>>,
    pub features: Option<String>,
    pub lib: plist::Dictionary,
}

impl MemoryArtifact {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_glyph(mut self, name: impl Into<String>, glyph: GlyphOutline) -> Self {
        self.glyphs.insert(name.into(), glyph);
        self
    }

    pub fn with_layer_glyph(mut self, layer: impl Into<String>, name: impl Into<String>, glyph: GlyphOutline) -> Self {
        self.layers.entry(layer.into()).or_default().insert(name.into(), glyph);
        self
    }

    pub fn with_unicodes(mut self, name: impl Into<String>, unicodes: impl IntoIterator<Item = u32>) -> Self {
        self.unicodes.insert(name.into(), unicodes.into_iter().collect());
        self
    }

    pub fn with_info(mut self, info: InfoValues) -> Self {
        self.info = info;
        self
    }

    pub fn with_kerning(mut self, kerning: KerningTable) -> Self {
        self.kerning = kerning;
        self
    }

    fn layer(&self, layer: Option<&str>) -> &IndexMap<String, GlyphOutline> {
        layer.and_then(|name| self.layers.get(name)).unwrap_or(&self.glyphs)
    }

    fn decomposed(&self, layer: &IndexMap<String, GlyphOutline>, glyph: &GlyphOutline, depth: usize) -> GlyphOutline {
        let mut out = GlyphOutline { width: glyph.width, contours: glyph.contours.clone(), components: Vec::new() };
        for component in &glyph.components {
            match layer.get(&component.base) {
                Some(base) if depth < MAX_COMPONENT_DEPTH => {
                    let flat = self.decomposed(layer, base, depth + 1);
                    out.contours.extend(
                        flat.contours.into_iter().map(|c| c.into_iter().map(|p| p + component.offset).collect()),
                    );
                    out.components.extend(
                        flat.components.into_iter().map(|c| Component::new(c.base, c.offset + component.offset)),
                    );
                }
                _ => out.components.push(component.clone()),
            }
        }
        out
    }
}

impl SourceArtifact for MemoryArtifact {
    type Info = InfoValues;
    type Kerning = KerningTable;
    type Glyph = GlyphOutline;

    fn glyph_names(&self) -> Vec<String> {
        self.glyphs.keys().cloned().collect()
    }

    fn has_layer(&self, layer: &str) -> bool {
        self.layers.contains_key(layer)
    }

    fn info(&self) -> InfoValues {
        self.info.clone()
    }

    fn kerning(&self) -> KerningTable {
        self.kerning.clone()
    }

    fn glyph(&self, layer: Option<&str>, name: &str, decompose: bool) -> Option<GlyphOutline> {
        let layer = self.layer(layer);
        let glyph = layer.get(name)?;
        Some(if decompose { self.decomposed(layer, glyph, 0) } else { glyph.clone() })
    }

    fn unicodes(&self, name: &str) -> Vec<u32> {
        self.unicodes.get(name).cloned().unwrap_or_default()
    }

    fn copy_info_into(&self, target: &mut InfoValues) {
        target.text.extend(self.info.text.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    fn lib(&self) -> plist::Dictionary {
        self.lib.clone()
    }

    fn groups(&self) -> IndexMap<String, Vec<String>> {
        self.groups.clone()
    }

    fn features(&self) -> Option<String> {
        self.features.clone()
    }
}

/// Serves [`MemoryArtifact`]s by path.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    artifacts: HashMap<PathBuf, MemoryArtifact>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: impl Into<PathBuf>, artifact: MemoryArtifact) -> Self {
        self.artifacts.insert(path.into(), artifact);
        self
    }
}

impl ArtifactLoader for MemoryLoader {
    type Artifact = MemoryArtifact;

    fn load(&self, path: &Path) -> Result<MemoryArtifact, LoadError> {
        self.artifacts.get(path).cloned().ok_or_else(|| LoadError::NotFound(path.to_path_buf()))
    }
}

pub type MemoryInstance = BuiltInstance<InfoValues, KerningTable, GlyphOutline>;

/// Collects written instances instead of persisting them.
#[derive(Debug, Default)]
pub struct MemoryWriter {
    format_version: u32,
    existing: HashMap<PathBuf, u32>,
    written: Mutex<IndexMap<PathBuf, MemoryInstance>>,
}

impl MemoryWriter {
    pub fn new(format_version: u32) -> Self {
        Self { format_version, ..Default::default() }
    }

    /// Pretends an output of `format_version` already exists at `path`.
    pub fn with_existing(mut self, path: impl Into<PathBuf>, format_version: u32) -> Self {
        self.existing.insert(path.into(), format_version);
        self
    }

    pub fn written(&self) -> IndexMap<PathBuf, MemoryInstance> {
        self.written.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl InstanceWriter<MemoryArtifact> for MemoryWriter {
    fn format_version(&self) -> u32 {
        self.format_version
    }

    fn existing_format_version(&self, path: &Path) -> Option<u32> {
        self.existing.get(path).copied()
    }

    fn write(&self, instance: &MemoryInstance, path: &Path) -> Result<(), WriteError> {
        self.written.lock().unwrap_or_else(PoisonError::into_inner).insert(path.to_path_buf(), instance.clone());
        Ok(())
    }
}
