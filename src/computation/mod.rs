//! Evaluates a compiled execution model against input assignments.
pub mod engine;
pub mod ledger;
pub mod value;

pub use engine::{execute, execute_scenarios, Assignment, ComputationEngine};
pub use ledger::{EvalError, Ledger};
pub use value::{Arguments, Value, ValueError};
