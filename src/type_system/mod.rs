//! Checks value assignments against the parameter declarations of a model.
//!
//! The `TypeChecker` runs before evaluation on the inputs, or afterwards on a
//! result set, and reports every problem it finds rather than only the first.

pub use self::checker::TypeChecker;
pub use self::error::{ValidationError, ValidationErrorType};

mod checker;
mod error;
mod rules {
    pub mod domain;
    pub mod kinds;
}
