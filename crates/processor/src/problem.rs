//! Non-fatal problems collected while building instances.

use std::fmt;

use mutatio_designspace::ErrorKind;
use mutatio_varmodel::ModelError;

use crate::error::{LoadError, SwapError, WriteError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProblemKind {
    /// Malformed or inconsistent document data.
    Structural,
    /// A source, glyph or layer could not be found or loaded.
    Resolution,
    /// A variation model could not be built.
    Model,
    /// An output could not be written.
    Persistence,
}

impl From<ErrorKind> for ProblemKind {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Structural => ProblemKind::Structural,
            ErrorKind::Persistence => ProblemKind::Persistence,
        }
    }
}

impl fmt::Display for ProblemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProblemKind::Structural => "structural",
            ProblemKind::Resolution => "resolution",
            ProblemKind::Model => "model",
            ProblemKind::Persistence => "persistence",
        };
        f.write_str(name)
    }
}

/// A problem and what it concerns: a source, an instance, a glyph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    pub kind: ProblemKind,
    pub subject: String,
    pub message: String,
}

impl Problem {
    pub fn new(kind: ProblemKind, subject: impl Into<String>, message: impl fmt::Display) -> Self {
        Self { kind, subject: subject.into(), message: message.to_string() }
    }

    pub fn structural(subject: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::new(ProblemKind::Structural, subject, message)
    }

    pub fn resolution(subject: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::new(ProblemKind::Resolution, subject, message)
    }

    pub fn persistence(subject: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::new(ProblemKind::Persistence, subject, message)
    }

    pub fn from_model(subject: impl Into<String>, error: &ModelError) -> Self {
        Self::new(ProblemKind::Model, subject, error)
    }

    pub fn from_load(subject: impl Into<String>, error: &LoadError) -> Self {
        Self::resolution(subject, error)
    }

    pub fn from_write(subject: impl Into<String>, error: &WriteError) -> Self {
        Self::persistence(subject, error)
    }

    pub fn from_swap(subject: impl Into<String>, error: &SwapError) -> Self {
        Self::resolution(subject, error)
    }

    pub fn from_document(subject: impl Into<String>, error: &mutatio_designspace::Error) -> Self {
        Self::new(error.kind().into(), subject, error)
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.subject, self.message)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn display() {
        let problem = Problem::from_load("Light", &LoadError::NotFound(PathBuf::from("Light.ufo")));
        assert_eq!(problem.kind, ProblemKind::Resolution);
        assert_eq!(problem.to_string(), "[resolution] Light: source not found: Light.ufo");
    }

    #[test]
    fn document_errors_keep_their_kind() {
        let error = mutatio_designspace::Error::NoAxes;
        assert_eq!(Problem::from_document("doc", &error).kind, ProblemKind::Structural);
    }
}
