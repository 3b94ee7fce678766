//! Symbolic references to parameters and collections, with temporal qualifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which time step(s) of the target a reference addresses.
///
/// Being a single enum, a reference carries at most one qualifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Qualifier {
    #[default]
    Normal,
    /// `t - 1`, inside a per-time-step relationship.
    Previous,
    /// `t + 1`, inside a per-time-step relationship.
    Next,
    /// `t = 0`, from a once-per-run relationship.
    Initial,
    /// The whole sequence `0..N`, from a once-per-run relationship.
    AllTimeSteps,
}

impl Qualifier {
    pub fn is_normal(&self) -> bool {
        matches!(self, Qualifier::Normal)
    }
}

/// One position of a tuple key filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyPart {
    Is(String),
    Any,
}

impl KeyPart {
    pub fn is(part: impl Into<String>) -> Self {
        KeyPart::Is(part.into())
    }
}

/// Projects a mapping onto one element or a sub-mapping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyFilter {
    /// Selects the element under a single-string key.
    Exact(String),
    /// Matches tuple keys position by position; `Any` positions survive as the new key.
    Pattern(Vec<KeyPart>),
}

impl KeyFilter {
    pub fn exact(key: impl Into<String>) -> Self {
        KeyFilter::Exact(key.into())
    }

    pub fn pattern(parts: impl IntoIterator<Item = KeyPart>) -> Self {
        KeyFilter::Pattern(parts.into_iter().collect())
    }
}

/// The kind of declaration a reference points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RefTarget {
    Parameter,
    Mapping { key: Option<KeyFilter> },
    Array { index: Option<Vec<usize>> },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    pub name: String,
    pub target: RefTarget,
    #[serde(default)]
    pub qualifier: Qualifier,
}

impl Reference {
    pub fn parameter(name: impl Into<String>) -> Self {
        Self { name: name.into(), target: RefTarget::Parameter, qualifier: Qualifier::Normal }
    }

    pub fn mapping(name: impl Into<String>) -> Self {
        Self { name: name.into(), target: RefTarget::Mapping { key: None }, qualifier: Qualifier::Normal }
    }

    pub fn mapping_key(name: impl Into<String>, key: KeyFilter) -> Self {
        Self { name: name.into(), target: RefTarget::Mapping { key: Some(key) }, qualifier: Qualifier::Normal }
    }

    pub fn array(name: impl Into<String>) -> Self {
        Self { name: name.into(), target: RefTarget::Array { index: None }, qualifier: Qualifier::Normal }
    }

    pub fn array_index(name: impl Into<String>, index: Vec<usize>) -> Self {
        Self { name: name.into(), target: RefTarget::Array { index: Some(index) }, qualifier: Qualifier::Normal }
    }

    pub fn with_qualifier(mut self, qualifier: Qualifier) -> Self {
        self.qualifier = qualifier;
        self
    }

    pub fn previous(self) -> Self { self.with_qualifier(Qualifier::Previous) }

    pub fn next(self) -> Self { self.with_qualifier(Qualifier::Next) }

    pub fn initial(self) -> Self { self.with_qualifier(Qualifier::Initial) }

    pub fn all_time_steps(self) -> Self { self.with_qualifier(Qualifier::AllTimeSteps) }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        match &self.target {
            RefTarget::Parameter | RefTarget::Mapping { key: None } | RefTarget::Array { index: None } => {}
            RefTarget::Mapping { key: Some(KeyFilter::Exact(k)) } => write!(f, "[{:?}]", k)?,
            RefTarget::Mapping { key: Some(KeyFilter::Pattern(parts)) } => {
                let parts: Vec<String> = parts
                    .iter()
                    .map(|p| match p {
                        KeyPart::Is(s) => format!("{:?}", s),
                        KeyPart::Any => "*".to_string(),
                    })
                    .collect();
                write!(f, "[{}]", parts.join(", "))?;
            }
            RefTarget::Array { index: Some(idx) } => write!(f, "{:?}", idx)?,
        }
        match self.qualifier {
            Qualifier::Normal => Ok(()),
            Qualifier::Previous => write!(f, "<previous>"),
            Qualifier::Next => write!(f, "<next>"),
            Qualifier::Initial => write!(f, "<initial>"),
            Qualifier::AllTimeSteps => write!(f, "<all_time_steps>"),
        }
    }
}

/// Execution facts a relationship may request instead of a parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecInfo {
    /// The total step count `N`.
    NTimeSteps,
    /// The step of the current relationship instance.
    Time,
}

/// A declared relationship argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FunctionInput {
    Reference(Reference),
    ExecInfo(ExecInfo),
}

impl fmt::Display for ExecInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecInfo::NTimeSteps => write!(f, "<n_time_steps>"),
            ExecInfo::Time => write!(f, "<time>"),
        }
    }
}

impl fmt::Display for FunctionInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionInput::Reference(r) => write!(f, "{}", r),
            FunctionInput::ExecInfo(e) => write!(f, "{}", e),
        }
    }
}

impl From<Reference> for FunctionInput {
    fn from(r: Reference) -> Self { FunctionInput::Reference(r) }
}

impl From<ExecInfo> for FunctionInput {
    fn from(e: ExecInfo) -> Self { FunctionInput::ExecInfo(e) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualifier_replaces_previous_one() {
        let r = Reference::parameter("x").previous().initial();
        assert_eq!(r.qualifier, Qualifier::Initial);
    }

    #[test]
    fn test_display() {
        assert_eq!(Reference::parameter("loc").previous().to_string(), "loc<previous>");
        let r = Reference::mapping_key("m", KeyFilter::pattern([KeyPart::is("a"), KeyPart::Any]));
        assert_eq!(r.to_string(), "m[\"a\", *]");
    }
}
