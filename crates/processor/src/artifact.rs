//! The seams between the processor and a concrete font object model.

use std::path::Path;

use indexmap::IndexMap;
use mutatio_varmodel::Interpolable;

use crate::{
    error::{LoadError, WriteError},
    instance::BuiltInstance,
    rename::Rename,
};

/// Glyph-level operations beyond interpolation.
pub trait GlyphGeometry {
    /// Rounds coordinates and advance to integers.
    fn round(&self) -> Self;

    /// Points references to component `old` at `new`.
    fn rename_reference(&mut self, old: &str, new: &str);
}

/// One loaded master.
pub trait SourceArtifact: Send + Sync {
    type Info: Interpolable + Send + Sync;
    type Kerning: Interpolable + Rename + Send + Sync;
    type Glyph: Interpolable + GlyphGeometry + Send + Sync;

    /// Glyph names of the default layer, in glyph order.
    fn glyph_names(&self) -> Vec<String>;

    fn has_layer(&self, layer: &str) -> bool;

    fn info(&self) -> Self::Info;

    fn kerning(&self) -> Self::Kerning;

    /// The glyph `name` from `layer`, or the default layer for `None`. With
    /// `decompose`, component references are replaced by their outlines.
    fn glyph(&self, layer: Option<&str>, name: &str, decompose: bool) -> Option<Self::Glyph>;

    fn unicodes(&self, name: &str) -> Vec<u32>;

    /// Copies the fields that are not interpolated (copyright, vendor, ...)
    /// from this source's info into `target`.
    fn copy_info_into(&self, _target: &mut Self::Info) {}

    fn lib(&self) -> plist::Dictionary {
        plist::Dictionary::new()
    }

    fn groups(&self) -> IndexMap<String, Vec<String>> {
        IndexMap::new()
    }

    fn features(&self) -> Option<String> {
        None
    }
}

/// Opens source artifacts by path.
pub trait ArtifactLoader {
    type Artifact: SourceArtifact;

    fn load(&self, path: &Path) -> Result<Self::Artifact, LoadError>;
}

/// Persists built instances.
pub trait InstanceWriter<A: SourceArtifact> {
    /// The format version this writer produces.
    fn format_version(&self) -> u32;

    /// The format version of an existing output at `path`, if there is one.
    fn existing_format_version(&self, path: &Path) -> Option<u32>;

    fn write(&self, instance: &BuiltInstance<A::Info, A::Kerning, A::Glyph>, path: &Path) -> Result<(), WriteError>;
}
