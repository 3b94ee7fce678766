//! Compilation of a declarative model into an `ExecutionModel`.
pub mod builder;
pub mod error;
pub mod resolver;

pub use builder::{build_exec_model, build_with};
pub use error::{BuildError, ResolveError};
pub use resolver::{resolve, resolve_input, TimeContext};

use serde::{Deserialize, Serialize};

/// Configuration of one compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// Number of discrete time steps; time-series parameters get one id per step.
    pub n_time_steps: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self { n_time_steps: 1 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_deserialize_with_default() {
        let opts: BuildOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(opts, BuildOptions { n_time_steps: 1 });
        let opts: BuildOptions = serde_json::from_str(r#"{"n_time_steps": 12}"#).unwrap();
        assert_eq!(opts.n_time_steps, 12);
    }
}
