//! # Instance processor
//!
//! Loads the sources of a designspace through an [`ArtifactLoader`], builds
//! variation models over their info, kerning and glyphs, and produces
//! interpolated instances. Substitution rules are applied to each instance
//! by swapping glyph names.
//!
//! The font object model stays behind the [`SourceArtifact`] trait; the
//! [`math`] module has in-memory implementations.

pub mod artifact;
pub mod config;
mod error;
mod instance;
pub mod math;
mod problem;
mod processor;
pub mod rename;

pub use artifact::{ArtifactLoader, GlyphGeometry, InstanceWriter, SourceArtifact};
pub use error::{LoadError, Result, SwapError, WriteError};
pub use instance::{BuiltGlyph, BuiltInstance, CopyDonors, InstanceNames};
pub use problem::{Problem, ProblemKind};
pub use processor::{GenerateReport, InstanceOf, Processor, ProcessorOptions};
pub use rename::{Rename, scratch_name, swap_names};
