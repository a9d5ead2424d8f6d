use std::result;

use thiserror::Error;

pub type Result<T> = result::Result<T, ModelError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("no masters to build a model from")]
    NoMasters,

    #[error("masters {first} and {second} share the same location")]
    DuplicateLocation { first: usize, second: usize },

    #[error("no master at the reference location {0}")]
    NoNeutral(String),

    #[error("master {0} has an anisotropic location")]
    AnisotropicMaster(usize),

    #[error("{context} references axis '{axis}', which the model does not have")]
    UnknownAxis { axis: String, context: String },
}
