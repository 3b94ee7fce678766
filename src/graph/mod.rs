//! The compiled, time-expanded execution graph and the identities of its nodes.
pub mod connector;
pub mod dag;
pub mod edge;
pub mod node;

pub use connector::{Connector, InputSlot, RelationshipInfo};
pub use dag::{ExecutionGraphBuilder, ExecutionModel, GraphError};
pub use edge::Edge;
pub use node::{ModelPath, NodeId, ParameterId, RelationshipId};
