//! Document-level constants.

/// Format version written into the `format` attribute of new documents.
pub const FORMAT_VERSION: &str = "4.0";

/// Format version assumed when a document carries no `format` attribute.
pub const LEGACY_FORMAT_VERSION: &str = "3.0";

/// Highest major format version this crate understands.
pub const SUPPORTED_MAJOR_VERSION: u32 = 4;

/// Language whose localised names live in plain attributes instead of child elements.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Prefix given to sources read without a name. Sources named this way are
/// written back without a `name` attribute.
pub const TEMP_MASTER_PREFIX: &str = "temp_master";

/// Comparison tolerance for locations.
pub const LOCATION_EPSILON: f64 = 1e-9;
