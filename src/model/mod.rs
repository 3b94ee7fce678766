//! The declarative model: what the author describes before compilation.
pub mod collection;
pub mod declarative;
pub mod error;
pub mod parameter;
pub mod reference;
pub mod relationship;

pub use collection::{Collection, CollectionLayout, MappingKey, Member, Members};
pub use declarative::{DeclarativeModel, ModelBuilder};
pub use error::ModelError;
pub use parameter::{Parameter, ParameterKind};
pub use reference::{ExecInfo, FunctionInput, KeyFilter, KeyPart, Qualifier, RefTarget, Reference};
pub use relationship::{FunctionRelationship, Relationship, RelationshipFn, SubModelRelationship};
