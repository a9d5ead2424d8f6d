//! # Designspace
//!
//! The document model of a design space: axes, sources (masters), instances
//! and conditional substitution rules, with XML persistence.
//!
//! ## Example
//!
//! ```no_run
//! use mutatio_designspace::{Document, Location};
//!
//! let doc = Document::read("Family.designspace").unwrap();
//! let location = Location::new().with("weight", 650.0);
//! let normalized = doc.normalize_location(&location);
//! let names = doc.process_rules(&location, &["dollar", "a"]);
//! println!("{normalized} {names:?}");
//! ```

pub mod axis;
pub mod config;
mod document;
mod error;
mod location;
pub mod paths;
mod reader;
pub mod rules;
mod writer;

pub use axis::{Axis, AxisModel};
pub use document::{
    DefaultReason, DefaultSource, Document, GlyphMaster, GlyphOverride, Instance, Source,
};
pub use error::{Error, ErrorKind, Result};
pub use font_types::Tag;
pub use location::{AxisValue, Location};
pub use reader::{ReadOptions, ReadReport};
pub use rules::{Condition, ConditionSet, Rule};
pub use writer::format_number;
