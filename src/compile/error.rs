//! Errors raised while lowering a declarative model into an `ExecutionModel`.

use crate::graph::GraphError;
use crate::model::ExecInfo;
use thiserror::Error;

/// Failure to turn one reference into concrete ids.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("reference {reference} is not allowed in a {context} relationship")]
    QualifierContext { reference: String, context: &'static str },
    #[error("time-series reference {0} in a once-per-run relationship must be `initial` or `all_time_steps`")]
    MissingAggregate(String),
    #[error("reference {reference} at step {time_step} falls outside 0..{n_time_steps}")]
    StepOutOfRange { reference: String, time_step: usize, n_time_steps: usize },
    #[error("unknown parameter '{0}'")]
    UnknownParameter(String),
    #[error("unknown collection '{0}'")]
    UnknownCollection(String),
    #[error("'{name}' is a {found}, referenced as a {expected}")]
    KindMismatch { name: String, expected: &'static str, found: &'static str },
    #[error("collection '{0}' holds relationships, not parameters")]
    NotParameterCollection(String),
    #[error("key filter on '{name}' has {actual} positions, keys have {expected}")]
    KeyArity { name: String, expected: usize, actual: usize },
    #[error("no element of {0} matches the key filter")]
    MissingKey(String),
    #[error("array collection '{0}' cannot be filtered")]
    ArrayFilterUnsupported(String),
    #[error("exec info {0} is not available in a once-per-run relationship")]
    ExecInfoContext(ExecInfo),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    #[error("n_time_steps must be at least 1, got {0}")]
    InvalidTimeSteps(usize),
    #[error("in relationship {relationship}, failed to resolve {reference}: {source}")]
    Resolve {
        relationship: String,
        reference: String,
        #[source]
        source: ResolveError,
    },
    #[error("relationship {relationship} reads `previous` and writes `next`; only one direction is allowed")]
    MixedTemporalDirection { relationship: String },
    #[error("relationship {relationship} runs at each time step but {reference} points against the step order")]
    ReversedTemporalDirection { relationship: String, reference: String },
    #[error("sub-model {relationship}: {inner} addresses {inner_len} ids but {outer} addresses {outer_len}")]
    PortArityMismatch {
        relationship: String,
        inner: String,
        outer: String,
        inner_len: usize,
        outer_len: usize,
    },
    #[error(transparent)]
    Graph(#[from] GraphError),
}
