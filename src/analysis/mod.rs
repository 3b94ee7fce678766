//! Structural queries over a compiled execution model.
pub mod topology;
