//! Defines `Parameter`, a named and typed value slot of a declarative model.

use super::reference::Reference;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The value domain of a parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterKind {
    Boolean,
    Real {
        unit: Option<String>,
        lower_bound: Option<f64>,
        upper_bound: Option<f64>,
    },
    /// A fixed, ordered set of allowed tags.
    Categorical { categories: Vec<String> },
    /// An opaque record type defined outside the model.
    Structured { type_name: String },
}

impl ParameterKind {
    pub fn type_name(&self) -> &str {
        match self {
            ParameterKind::Boolean => "boolean",
            ParameterKind::Real { .. } => "real",
            ParameterKind::Categorical { .. } => "categorical",
            ParameterKind::Structured { type_name } => type_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Empty for collection members until the collection names them.
    pub name: String,
    pub kind: ParameterKind,
    /// A time-series parameter holds one value per time step.
    #[serde(default)]
    pub is_time_series: bool,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, kind: ParameterKind) -> Self {
        Self { name: name.into(), kind, is_time_series: false, metadata: BTreeMap::new() }
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::Boolean)
    }

    pub fn real(name: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::Real { unit: None, lower_bound: None, upper_bound: None })
    }

    pub fn categorical<I, S>(name: impl Into<String>, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let categories = categories.into_iter().map(Into::into).collect();
        Self::new(name, ParameterKind::Categorical { categories })
    }

    pub fn structured(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::Structured { type_name: type_name.into() })
    }

    pub fn time_series(mut self) -> Self {
        self.is_time_series = true;
        self
    }

    /// Sets the unit of a real parameter. No effect on other kinds.
    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        if let ParameterKind::Real { unit: slot, .. } = &mut self.kind {
            *slot = Some(unit.into());
        }
        self
    }

    /// Sets the bounds of a real parameter. No effect on other kinds.
    pub fn bounds(mut self, lower: f64, upper: f64) -> Self {
        if let ParameterKind::Real { lower_bound, upper_bound, .. } = &mut self.kind {
            *lower_bound = Some(lower);
            *upper_bound = Some(upper);
        }
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn reference(&self) -> Reference {
        Reference::parameter(self.name.clone())
    }
}
