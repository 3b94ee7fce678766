//! Relationships: pure computation steps, either a function or an embedded sub-model.

use super::declarative::DeclarativeModel;
use super::reference::{FunctionInput, Qualifier, Reference};
use crate::computation::{Arguments, Value, ValueError};
use std::fmt;
use std::sync::Arc;

/// The callable behind a function relationship.
///
/// Returns one value per declared output, in declaration order.
pub type RelationshipFn = Arc<dyn Fn(&Arguments) -> Result<Vec<Value>, ValueError> + Send + Sync>;

#[derive(Clone)]
pub struct FunctionRelationship {
    pub name: String,
    /// Argument name -> source, in declaration order.
    pub inputs: Vec<(String, FunctionInput)>,
    pub outputs: Vec<Reference>,
    /// Human-readable copy of the function body.
    pub body: String,
    pub at_each_time_step: bool,
    function: RelationshipFn,
}

impl FunctionRelationship {
    pub fn new<F>(name: impl Into<String>, function: F) -> Self
    where
        F: Fn(&Arguments) -> Result<Vec<Value>, ValueError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            body: String::new(),
            at_each_time_step: false,
            function: Arc::new(function),
        }
    }

    pub fn input(mut self, arg: impl Into<String>, source: impl Into<FunctionInput>) -> Self {
        self.inputs.push((arg.into(), source.into()));
        self
    }

    pub fn output(mut self, reference: Reference) -> Self {
        self.outputs.push(reference);
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn at_each_time_step(mut self) -> Self {
        self.at_each_time_step = true;
        self
    }

    fn input_refs(&self) -> impl Iterator<Item = &Reference> {
        self.inputs.iter().filter_map(|(_, input)| match input {
            FunctionInput::Reference(r) => Some(r),
            FunctionInput::ExecInfo(_) => None,
        })
    }

    /// Any input reads the previous time step.
    pub fn includes_past(&self) -> bool {
        self.input_refs().any(|r| r.qualifier == Qualifier::Previous)
    }

    /// Any output writes the next time step.
    pub fn includes_future(&self) -> bool {
        self.outputs.iter().any(|r| r.qualifier == Qualifier::Next)
    }

    /// Inputs reading `next` and outputs writing `previous`.
    pub fn reversed_references(&self) -> Vec<&Reference> {
        self.input_refs()
            .filter(|r| r.qualifier == Qualifier::Next)
            .chain(self.outputs.iter().filter(|r| r.qualifier == Qualifier::Previous))
            .collect()
    }

    pub fn call(&self, args: &Arguments) -> Result<Vec<Value>, ValueError> {
        (self.function)(args)
    }
}

impl fmt::Debug for FunctionRelationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRelationship")
            .field("name", &self.name)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .field("at_each_time_step", &self.at_each_time_step)
            .finish_non_exhaustive()
    }
}

/// Embeds another declarative model.
///
/// Both boundary maps go from a reference inside the sub-model to a reference in
/// the enclosing model.
#[derive(Debug, Clone)]
pub struct SubModelRelationship {
    pub name: String,
    pub model: Arc<DeclarativeModel>,
    pub inputs: Vec<(Reference, Reference)>,
    pub outputs: Vec<(Reference, Reference)>,
    pub at_each_time_step: bool,
}

impl SubModelRelationship {
    pub fn new(name: impl Into<String>, model: impl Into<Arc<DeclarativeModel>>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            at_each_time_step: false,
        }
    }

    pub fn input(mut self, inner: Reference, outer: Reference) -> Self {
        self.inputs.push((inner, outer));
        self
    }

    pub fn output(mut self, inner: Reference, outer: Reference) -> Self {
        self.outputs.push((inner, outer));
        self
    }

    pub fn at_each_time_step(mut self) -> Self {
        self.at_each_time_step = true;
        self
    }

    pub fn includes_past(&self) -> bool {
        self.inputs.iter().any(|(_, outer)| outer.qualifier == Qualifier::Previous)
    }

    pub fn includes_future(&self) -> bool {
        self.outputs.iter().any(|(_, outer)| outer.qualifier == Qualifier::Next)
    }

    /// Outer references of input ports reading `next` and output ports writing `previous`.
    pub fn reversed_references(&self) -> Vec<&Reference> {
        self.inputs
            .iter()
            .map(|(_, outer)| outer)
            .filter(|r| r.qualifier == Qualifier::Next)
            .chain(self.outputs.iter().map(|(_, outer)| outer).filter(|r| r.qualifier == Qualifier::Previous))
            .collect()
    }
}

#[derive(Debug, Clone)]
pub enum Relationship {
    Function(FunctionRelationship),
    SubModel(SubModelRelationship),
}

impl Relationship {
    pub fn name(&self) -> &str {
        match self {
            Relationship::Function(r) => &r.name,
            Relationship::SubModel(r) => &r.name,
        }
    }

    pub(crate) fn set_name(&mut self, name: String) {
        match self {
            Relationship::Function(r) => r.name = name,
            Relationship::SubModel(r) => r.name = name,
        }
    }

    pub fn at_each_time_step(&self) -> bool {
        match self {
            Relationship::Function(r) => r.at_each_time_step,
            Relationship::SubModel(r) => r.at_each_time_step,
        }
    }

    pub fn includes_past(&self) -> bool {
        match self {
            Relationship::Function(r) => r.includes_past(),
            Relationship::SubModel(r) => r.includes_past(),
        }
    }

    pub fn includes_future(&self) -> bool {
        match self {
            Relationship::Function(r) => r.includes_future(),
            Relationship::SubModel(r) => r.includes_future(),
        }
    }

    pub fn reversed_references(&self) -> Vec<&Reference> {
        match self {
            Relationship::Function(r) => r.reversed_references(),
            Relationship::SubModel(r) => r.reversed_references(),
        }
    }
}

impl From<FunctionRelationship> for Relationship {
    fn from(r: FunctionRelationship) -> Self { Relationship::Function(r) }
}

impl From<SubModelRelationship> for Relationship {
    fn from(r: SubModelRelationship) -> Self { Relationship::SubModel(r) }
}
