//! Connectors bind one relationship argument or return slot to concrete parameter ids.

use super::node::ParameterId;
use crate::model::{ExecInfo, FunctionRelationship, MappingKey};
use smallvec::SmallVec;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Connector {
    Scalar(ParameterId),
    Mapping(BTreeMap<MappingKey, ParameterId>),
    /// One mapping per time step, in step order.
    MappingList(Vec<BTreeMap<MappingKey, ParameterId>>),
    /// Row-major ids over `shape`.
    Array { shape: Vec<usize>, ids: Vec<ParameterId> },
}

impl Connector {
    /// Every addressed id, in connector order.
    pub fn parameter_ids(&self) -> Vec<&ParameterId> {
        match self {
            Connector::Scalar(id) => vec![id],
            Connector::Mapping(m) => m.values().collect(),
            Connector::MappingList(steps) => steps.iter().flat_map(BTreeMap::values).collect(),
            Connector::Array { ids, .. } => ids.iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Connector::Scalar(_) => 1,
            Connector::Mapping(m) => m.len(),
            Connector::MappingList(steps) => steps.iter().map(BTreeMap::len).sum(),
            Connector::Array { ids, .. } => ids.len(),
        }
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

/// What a relationship argument is bound to after compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSlot {
    Connector(Connector),
    /// Supplied by the engine at evaluation time.
    ExecInfo(ExecInfo),
}

/// A compiled relationship instance: the function plus its bound slots.
#[derive(Debug, Clone)]
pub struct RelationshipInfo {
    pub relationship: FunctionRelationship,
    pub inputs: Vec<(String, InputSlot)>,
    pub outputs: SmallVec<[Connector; 2]>,
}

impl RelationshipInfo {
    pub fn input_parameter_ids(&self) -> impl Iterator<Item = &ParameterId> {
        self.inputs.iter().flat_map(|(_, slot)| match slot {
            InputSlot::Connector(c) => c.parameter_ids(),
            InputSlot::ExecInfo(_) => Vec::new(),
        })
    }

    pub fn output_parameter_ids(&self) -> impl Iterator<Item = &ParameterId> {
        self.outputs.iter().flat_map(Connector::parameter_ids)
    }
}
