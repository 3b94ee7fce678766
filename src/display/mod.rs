//! Human-readable renderings of evaluation results.
pub mod trace;
