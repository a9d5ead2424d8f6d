use std::{fmt, io, path::PathBuf, result};

use thiserror::Error;

pub type Result<T> = result::Result<T, Error>;

/// Broad class of a designspace failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The document content is malformed or inconsistent.
    Structural,
    /// Reading from or writing to disk failed.
    Persistence,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to access {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("malformed XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("failed to produce XML: {0}")]
    XmlWrite(String),

    #[error("root element is <{0}>, expected <designspace>")]
    NotADesignspace(String),

    #[error("<{element}> is missing the '{attribute}' attribute")]
    MissingAttribute { element: &'static str, attribute: &'static str },

    #[error("<{element}> attribute '{attribute}' is not a number: {value:?}")]
    InvalidNumber { element: &'static str, attribute: &'static str, value: String },

    #[error("invalid axis tag {0:?}")]
    InvalidTag(String),

    #[error("axis '{name}' is invalid: {reason}")]
    InvalidAxis { name: String, reason: String },

    #[error("axis '{0}' is declared more than once")]
    DuplicateAxis(String),

    #[error("location found but no axes are defined")]
    NoAxes,

    #[error("{context} references undeclared axis '{axis}'")]
    UndeclaredAxis { axis: String, context: String },

    #[error("condition on axis '{axis}' in rule '{rule}' has neither minimum nor maximum")]
    UnboundedCondition { rule: String, axis: String },

    #[error("rule '{0}' has a substitution without 'name' or 'with'")]
    InvalidSub(String),

    #[error("glyph '{glyph}' has an invalid unicode value {value:?}")]
    InvalidUnicode { glyph: String, value: String },

    #[error("glyph element without a name")]
    MissingGlyphName,

    #[error("invalid lib data: {0}")]
    Lib(#[from] plist::Error),

    #[error("refusing to overwrite {path}: it declares format {found}, newer than {supported}")]
    NewerFormat { path: PathBuf, found: String, supported: String },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io { .. } | Error::XmlWrite(_) | Error::NewerFormat { .. } => ErrorKind::Persistence,
            _ => ErrorKind::Structural,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io { path: path.into(), source }
    }

    pub(crate) fn xml_write(source: impl fmt::Display) -> Self {
        Error::XmlWrite(source.to_string())
    }
}
