use std::{io, path::PathBuf, result};

use thiserror::Error;

/// Failure to load a source artifact.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("source not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid source {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },
}

/// Failure to persist a built instance.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write {path}: {reason}")]
    Unsupported { path: PathBuf, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SwapError {
    #[error("cannot swap, '{0}' is missing")]
    Missing(String),

    #[error("scratch name '{0}' is already in use")]
    ScratchInUse(String),
}

pub type Result<T> = result::Result<T, LoadError>;
