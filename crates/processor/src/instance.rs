//! The output of building one instance.

use indexmap::IndexMap;
use mutatio_designspace::{Instance, Location};

use crate::{artifact::GlyphGeometry, rename::Rename};

#[derive(Debug, Clone, PartialEq)]
pub struct BuiltGlyph<G> {
    /// `None` for a muted glyph.
    pub geometry: Option<G>,
    pub note: Option<String>,
}

impl<G> BuiltGlyph<G> {
    pub fn muted(note: Option<String>) -> Self {
        Self { geometry: None, note }
    }

    pub fn is_muted(&self) -> bool {
        self.geometry.is_none()
    }
}

/// Naming fields carried over from the instance description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstanceNames {
    pub family_name: Option<String>,
    pub style_name: Option<String>,
    pub postscript_font_name: Option<String>,
    pub style_map_family_name: Option<String>,
    pub style_map_style_name: Option<String>,
    pub localised_family_name: IndexMap<String, String>,
    pub localised_style_name: IndexMap<String, String>,
    pub localised_style_map_family_name: IndexMap<String, String>,
    pub localised_style_map_style_name: IndexMap<String, String>,
}

impl From<&Instance> for InstanceNames {
    fn from(instance: &Instance) -> Self {
        Self {
            family_name: instance.family_name.clone(),
            style_name: instance.style_name.clone(),
            postscript_font_name: instance.postscript_font_name.clone(),
            style_map_family_name: instance.style_map_family_name.clone(),
            style_map_style_name: instance.style_map_style_name.clone(),
            localised_family_name: instance.localised_family_name.clone(),
            localised_style_name: instance.localised_style_name.clone(),
            localised_style_map_family_name: instance.localised_style_map_family_name.clone(),
            localised_style_map_style_name: instance.localised_style_map_style_name.clone(),
        }
    }
}

/// Names of the sources whose data was copied verbatim into the instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyDonors {
    pub info: Option<String>,
    pub lib: Option<String>,
    pub groups: Option<String>,
    pub features: Option<String>,
}

/// An interpolated instance, ready for an [`InstanceWriter`](crate::InstanceWriter).
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltInstance<I, K, G> {
    pub names: InstanceNames,
    /// The location the instance was built at.
    pub location: Location,
    pub info: Option<I>,
    pub kerning: Option<K>,
    pub glyphs: IndexMap<String, BuiltGlyph<G>>,
    /// Code points per glyph name. These stay with the name when glyphs are
    /// swapped.
    pub unicodes: IndexMap<String, Vec<u32>>,
    pub glyph_order: Vec<String>,
    pub groups: IndexMap<String, Vec<String>>,
    pub features: Option<String>,
    pub lib: plist::Dictionary,
    pub donors: CopyDonors,
}

impl<I, K, G> BuiltInstance<I, K, G> {
    pub fn new(names: InstanceNames, location: Location) -> Self {
        Self {
            names,
            location,
            info: None,
            kerning: None,
            glyphs: IndexMap::new(),
            unicodes: IndexMap::new(),
            glyph_order: Vec::new(),
            groups: IndexMap::new(),
            features: None,
            lib: plist::Dictionary::new(),
            donors: CopyDonors::default(),
        }
    }

    pub fn glyph(&self, name: &str) -> Option<&G> {
        self.glyphs.get(name).and_then(|glyph| glyph.geometry.as_ref())
    }
}

impl<I, K: Rename, G: GlyphGeometry> Rename for BuiltInstance<I, K, G> {
    fn contains(&self, name: &str) -> bool {
        self.glyphs.contains_key(name)
    }

    fn rename(&mut self, old: &str, new: &str) {
        if let Some((index, _, glyph)) = self.glyphs.shift_remove_full(old) {
            self.glyphs.shift_insert(index, new.to_string(), glyph);
        }
        for glyph in self.glyphs.values_mut() {
            if let Some(geometry) = glyph.geometry.as_mut() {
                geometry.rename_reference(old, new);
            }
        }
        if let Some(kerning) = self.kerning.as_mut() {
            kerning.rename(old, new);
        }
        for name in self.glyph_order.iter_mut().chain(self.groups.values_mut().flatten()) {
            if name == old {
                *name = new.to_string();
            }
        }
    }
}
