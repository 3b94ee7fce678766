//! Defines the `Edge` type, representing a dependency between two nodes.

/// Describes the semantic type of a dependency in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    /// A parameter feeds a relationship argument.
    Input,
    /// A relationship produces a parameter.
    Output,
    /// A sub-model boundary: the source value is copied to the destination.
    /// Inputs go outer -> inner, outputs inner -> outer.
    Port,
}
