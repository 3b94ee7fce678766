//! Errors raised while assembling a declarative model.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("duplicate {kind} name '{name}' in model '{model}'")]
    DuplicateName { model: String, kind: &'static str, name: String },
    #[error("collection '{0}' mixes parameters and relationships")]
    MixedCollection(String),
    #[error("collection '{0}' mixes time-series and non-time-series parameters")]
    MixedTimeSeries(String),
    #[error("collection '{0}' has no members")]
    EmptyCollection(String),
    #[error("array collection '{0}' needs at least one dimension")]
    EmptyShape(String),
    #[error("collection '{name}' has {actual} members but shape {shape:?} requires {expected}")]
    ShapeMismatch { name: String, shape: Vec<usize>, expected: usize, actual: usize },
    #[error("collection '{name}' repeats key '{key}'")]
    DuplicateKey { name: String, key: String },
    #[error("collection '{name}' mixes keys of arity {expected} and {actual}")]
    KeyArity { name: String, expected: usize, actual: usize },
}
