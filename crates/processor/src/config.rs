//! Processor constants.

/// Appended to a glyph name to park it during a swap.
pub const SWAP_SUFFIX: &str = "_______________swap";

/// Cache identifier of the font info model.
pub const INFO_KEY: &str = "info";

/// Cache identifier of the kerning model.
pub const KERNING_KEY: &str = "kerning";
