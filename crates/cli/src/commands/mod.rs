//! CLI command implementations.

mod convert;
mod inspect;
mod query;

pub use convert::{normalize, roundtrip};
pub use inspect::{default_source, default_verdict, describe, inspect};
pub use query::{factors, rules, source_factors, substitutions};
