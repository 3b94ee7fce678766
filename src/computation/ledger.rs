//! ledger.rs
//! Per-evaluation storage of resolved parameter values.

use super::value::Value;
use crate::graph::{ParameterId, RelationshipId};
use std::collections::BTreeMap;

pub use self::error::EvalError;
mod error {
    use super::*;
    use crate::computation::ValueError;
    use thiserror::Error;

    #[derive(Error, Debug, Clone, PartialEq)]
    pub enum EvalError {
        #[error("parameter {parameter} has no input value and no producer")]
        MissingInput { parameter: ParameterId },
        #[error("missing producer for {parameter}: port source {source_id} has no value")]
        MissingProducer { parameter: ParameterId, source_id: ParameterId },
        #[error("relationship {relationship} reads {parameter} before it has a value")]
        MissingValue { relationship: RelationshipId, parameter: ParameterId },
        #[error("relationship {relationship} failed: {source}")]
        Function {
            relationship: RelationshipId,
            #[source]
            source: ValueError,
        },
        #[error("relationship {relationship} returned {actual} values for {expected} outputs")]
        OutputCount { relationship: RelationshipId, expected: usize, actual: usize },
        #[error("output {output} of relationship {relationship} does not fit its connector: {message}")]
        OutputShape { relationship: RelationshipId, output: usize, message: String },
        #[error("relationship {0} requests the current time step but runs once per run")]
        NoTimeStep(RelationshipId),
        #[error("relationship {0} is not part of the execution model")]
        UnknownRelationship(RelationshipId),
        #[error("parameter {0} is assigned twice")]
        AlreadyAssigned(ParameterId),
    }
}

#[derive(Debug, Clone, Default)]
pub struct Ledger {
    values: BTreeMap<ParameterId, Value>,
}

impl Ledger {
    pub fn new() -> Self { Self::default() }

    pub fn get(&self, id: &ParameterId) -> Option<&Value> {
        self.values.get(id)
    }

    pub fn contains(&self, id: &ParameterId) -> bool {
        self.values.contains_key(id)
    }

    /// Each id is written at most once per evaluation.
    pub fn insert(&mut self, id: ParameterId, value: Value) -> Result<(), EvalError> {
        if self.values.contains_key(&id) {
            return Err(EvalError::AlreadyAssigned(id));
        }
        self.values.insert(id, value);
        Ok(())
    }

    pub fn len(&self) -> usize { self.values.len() }

    pub fn is_empty(&self) -> bool { self.values.is_empty() }

    pub fn into_values(self) -> BTreeMap<ParameterId, Value> {
        self.values
    }
}
