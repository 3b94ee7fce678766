//! Defines the structural identities of compiled nodes.
//!
//! Every parameter and relationship instance in an `ExecutionModel` is named by
//! value: the chain of sub-model relationships it was declared under, its own
//! name and, for time-series nodes, the time step. Two ids are the same node if
//! and only if they compare equal.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The sequence of sub-model relationship names traversed from the root model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModelPath(Vec<String>);

impl ModelPath {
    pub fn root() -> Self { Self::default() }

    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    pub fn segments(&self) -> &[String] { &self.0 }

    pub fn is_root(&self) -> bool { self.0.is_empty() }

    /// Prefixes `name` with the path, dot-separated.
    fn qualify(&self, name: &str) -> String {
        if self.is_root() {
            name.to_string()
        } else {
            format!("{}.{}", self, name)
        }
    }
}

impl<S: Into<String>> FromIterator<S> for ModelPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for ModelPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

/// Splits a dotted path string, ignoring dots inside collection keys (`m[1.5]`).
fn split_dotted(s: &str) -> Option<(ModelPath, String)> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for c in s.chars() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.checked_sub(1)?,
            '.' if depth == 0 => {
                segments.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    if depth != 0 || current.is_empty() || segments.iter().any(String::is_empty) {
        return None;
    }
    Some((ModelPath(segments), current))
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ParameterId {
    Static { path: ModelPath, name: String },
    TimeSeries { path: ModelPath, name: String, time_step: usize },
}

impl ParameterId {
    pub fn new_static(path: ModelPath, name: impl Into<String>) -> Self {
        ParameterId::Static { path, name: name.into() }
    }

    pub fn new_time_series(path: ModelPath, name: impl Into<String>, time_step: usize) -> Self {
        ParameterId::TimeSeries { path, name: name.into(), time_step }
    }

    pub fn path(&self) -> &ModelPath {
        match self {
            ParameterId::Static { path, .. } | ParameterId::TimeSeries { path, .. } => path,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ParameterId::Static { name, .. } | ParameterId::TimeSeries { name, .. } => name,
        }
    }

    pub fn time_step(&self) -> Option<usize> {
        match self {
            ParameterId::Static { .. } => None,
            ParameterId::TimeSeries { time_step, .. } => Some(*time_step),
        }
    }

    /// `"<seg>.<seg>.<name>"`, or just the name at the root. The step is not included.
    pub fn path_str(&self) -> String {
        self.path().qualify(self.name())
    }

    pub fn parse_static(s: &str) -> Option<Self> {
        let (path, name) = split_dotted(s)?;
        Some(ParameterId::Static { path, name })
    }

    pub fn parse_time_series(s: &str, time_step: usize) -> Option<Self> {
        let (path, name) = split_dotted(s)?;
        Some(ParameterId::TimeSeries { path, name, time_step })
    }
}

impl fmt::Display for ParameterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.time_step() {
            Some(step) => write!(f, "{}@{}", self.path_str(), step),
            None => write!(f, "{}", self.path_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RelationshipId {
    Static { path: ModelPath, name: String },
    TimeSeries { path: ModelPath, name: String, time_step: usize },
}

impl RelationshipId {
    pub fn new_static(path: ModelPath, name: impl Into<String>) -> Self {
        RelationshipId::Static { path, name: name.into() }
    }

    pub fn new_time_series(path: ModelPath, name: impl Into<String>, time_step: usize) -> Self {
        RelationshipId::TimeSeries { path, name: name.into(), time_step }
    }

    pub fn path(&self) -> &ModelPath {
        match self {
            RelationshipId::Static { path, .. } | RelationshipId::TimeSeries { path, .. } => path,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            RelationshipId::Static { name, .. } | RelationshipId::TimeSeries { name, .. } => name,
        }
    }

    pub fn time_step(&self) -> Option<usize> {
        match self {
            RelationshipId::Static { .. } => None,
            RelationshipId::TimeSeries { time_step, .. } => Some(*time_step),
        }
    }

    pub fn path_str(&self) -> String {
        self.path().qualify(self.name())
    }
}

impl fmt::Display for RelationshipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.time_step() {
            Some(step) => write!(f, "{}@{}", self.path_str(), step),
            None => write!(f, "{}", self.path_str()),
        }
    }
}

/// A vertex of the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeId {
    Parameter(ParameterId),
    Relationship(RelationshipId),
}

impl NodeId {
    pub fn as_parameter(&self) -> Option<&ParameterId> {
        match self {
            NodeId::Parameter(id) => Some(id),
            NodeId::Relationship(_) => None,
        }
    }

    pub fn as_relationship(&self) -> Option<&RelationshipId> {
        match self {
            NodeId::Relationship(id) => Some(id),
            NodeId::Parameter(_) => None,
        }
    }
}

impl From<ParameterId> for NodeId {
    fn from(id: ParameterId) -> Self { NodeId::Parameter(id) }
}

impl From<RelationshipId> for NodeId {
    fn from(id: RelationshipId) -> Self { NodeId::Relationship(id) }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Parameter(id) => write!(f, "{}", id),
            NodeId::Relationship(id) => write!(f, "{}()", id),
        }
    }
}
