//! Defines the error types for the type system module.
use crate::graph::ParameterId;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorType {
    /// A required input has no value.
    Missing,
    /// A value is keyed by an id the model does not declare.
    Unknown,
    /// The value variant does not fit the parameter kind.
    KindMismatch,
    /// Out of bounds, or not one of the declared categories.
    OutOfDomain,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub parameter: ParameterId,
    pub error_type: ValidationErrorType,
    pub message: String,
}

impl ValidationError {
    pub fn new(parameter: &ParameterId, error_type: ValidationErrorType, message: impl Into<String>) -> Self {
        Self { parameter: parameter.clone(), error_type, message: message.into() }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.parameter, self.message)
    }
}

impl std::error::Error for ValidationError {}
