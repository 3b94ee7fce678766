//! Declarative parameter/relationship models, compiled into a time-expanded
//! execution graph and evaluated against input assignments.
//!
//! The pipeline is `model` (what the author declares) -> `compile` (reference
//! resolution and graph construction) -> `computation` (evaluation).

pub mod analysis;
pub mod compile;
pub mod computation;
pub mod display;
pub mod graph;
pub mod model;
pub mod type_system;

#[cfg(test)]
pub(crate) mod testing;

pub use compile::{build_exec_model, build_with, BuildError, BuildOptions, ResolveError};
pub use computation::{execute, execute_scenarios, Arguments, Assignment, EvalError, Value, ValueError};
pub use graph::{ExecutionModel, ModelPath, NodeId, ParameterId, RelationshipId};
pub use model::{DeclarativeModel, Parameter, Reference};
