//! dag.rs
//! The compiled execution graph and its topological order.
//!
//! `ExecutionGraphBuilder` collects parameters, relationship instances and port
//! edges, enforcing the single-producer rule as they arrive. `finish` checks
//! that every edge endpoint is declared, builds the petgraph dependency graph and
//! orders it with Kahn's algorithm.

use super::connector::RelationshipInfo;
use super::edge::Edge;
use super::node::{NodeId, ParameterId, RelationshipId};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

pub use error::GraphError;

#[derive(Debug, Clone)]
pub struct ExecutionModel {
    n_time_steps: usize,
    parameter_ids: BTreeSet<ParameterId>,
    relationships: BTreeMap<RelationshipId, RelationshipInfo>,
    input_parameter_id_to_relationship_ids: BTreeMap<ParameterId, BTreeSet<RelationshipId>>,
    relationship_id_to_output_parameter_ids: BTreeMap<RelationshipId, BTreeSet<ParameterId>>,
    relationship_id_to_input_parameter_ids: BTreeMap<RelationshipId, BTreeSet<ParameterId>>,
    producer_of: BTreeMap<ParameterId, RelationshipId>,
    port_mapping: BTreeMap<ParameterId, BTreeSet<ParameterId>>,
    port_mapping_inverse: BTreeMap<ParameterId, ParameterId>,
    input_parameter_ids: BTreeSet<ParameterId>,
    order: Vec<NodeId>,
    graph: DiGraph<NodeId, Edge>,
    index: BTreeMap<NodeId, NodeIndex>,
}

impl ExecutionModel {
    pub fn n_time_steps(&self) -> usize { self.n_time_steps }

    pub fn parameter_ids(&self) -> &BTreeSet<ParameterId> { &self.parameter_ids }

    pub fn relationships(&self) -> &BTreeMap<RelationshipId, RelationshipInfo> { &self.relationships }

    pub fn relationship(&self, id: &RelationshipId) -> Option<&RelationshipInfo> {
        self.relationships.get(id)
    }

    pub fn input_parameter_id_to_relationship_ids(&self) -> &BTreeMap<ParameterId, BTreeSet<RelationshipId>> {
        &self.input_parameter_id_to_relationship_ids
    }

    pub fn relationship_id_to_output_parameter_ids(&self) -> &BTreeMap<RelationshipId, BTreeSet<ParameterId>> {
        &self.relationship_id_to_output_parameter_ids
    }

    pub fn relationship_id_to_input_parameter_ids(&self) -> &BTreeMap<RelationshipId, BTreeSet<ParameterId>> {
        &self.relationship_id_to_input_parameter_ids
    }

    /// The relationship instance that outputs `id`, if any.
    pub fn producer_of(&self, id: &ParameterId) -> Option<&RelationshipId> {
        self.producer_of.get(id)
    }

    /// Port source -> destinations.
    pub fn port_mapping(&self) -> &BTreeMap<ParameterId, BTreeSet<ParameterId>> { &self.port_mapping }

    /// Port destination -> its unique source.
    pub fn port_mapping_inverse(&self) -> &BTreeMap<ParameterId, ParameterId> { &self.port_mapping_inverse }

    /// Ids with neither a producing relationship nor a port source; evaluation must supply them.
    pub fn input_parameter_ids(&self) -> &BTreeSet<ParameterId> { &self.input_parameter_ids }

    /// Evaluation order: every edge points forward.
    pub fn order(&self) -> &[NodeId] { &self.order }

    pub fn contains(&self, node: &NodeId) -> bool { self.index.contains_key(node) }

    /// Direct predecessors of `node`, sorted.
    pub fn dependencies(&self, node: &NodeId) -> Vec<NodeId> {
        self.neighbors(node, Direction::Incoming)
    }

    /// Direct successors of `node`, sorted.
    pub fn dependents(&self, node: &NodeId) -> Vec<NodeId> {
        self.neighbors(node, Direction::Outgoing)
    }

    fn neighbors(&self, node: &NodeId, dir: Direction) -> Vec<NodeId> {
        let Some(&ix) = self.index.get(node) else { return Vec::new() };
        let found: BTreeSet<NodeId> = self
            .graph
            .neighbors_directed(ix, dir)
            .map(|n| self.graph[n].clone())
            .collect();
        found.into_iter().collect()
    }

    /// Every dependency edge as `(from, to, kind)`.
    pub fn edges(&self) -> impl Iterator<Item = (&NodeId, &NodeId, Edge)> {
        self.graph
            .edge_references()
            .map(|e| (&self.graph[e.source()], &self.graph[e.target()], *e.weight()))
    }
}

/// Accumulates the pieces of an `ExecutionModel`.
#[derive(Debug, Default)]
pub struct ExecutionGraphBuilder {
    n_time_steps: usize,
    parameter_ids: BTreeSet<ParameterId>,
    relationships: BTreeMap<RelationshipId, RelationshipInfo>,
    producer_of: BTreeMap<ParameterId, RelationshipId>,
    port_mapping_inverse: BTreeMap<ParameterId, ParameterId>,
}

impl ExecutionGraphBuilder {
    pub fn new(n_time_steps: usize) -> Self {
        Self { n_time_steps, ..Default::default() }
    }

    pub fn add_parameter(&mut self, id: ParameterId) {
        self.parameter_ids.insert(id);
    }

    pub fn add_relationship(&mut self, id: RelationshipId, info: RelationshipInfo) -> Result<(), GraphError> {
        if self.relationships.contains_key(&id) {
            return Err(GraphError::DuplicateRelationship(id));
        }
        let mut seen = BTreeSet::new();
        for output in info.output_parameter_ids() {
            let existing = if seen.insert(output) {
                self.producer_description(output)
            } else {
                Some(id.to_string())
            };
            if let Some(existing) = existing {
                return Err(GraphError::ProducerConflict {
                    parameter: output.clone(),
                    existing,
                    incoming: id.to_string(),
                });
            }
        }
        for output in info.output_parameter_ids() {
            self.producer_of.insert(output.clone(), id.clone());
        }
        self.relationships.insert(id, info);
        Ok(())
    }

    /// Records that `destination` takes its value from `source`.
    pub fn add_port(&mut self, source: ParameterId, destination: ParameterId) -> Result<(), GraphError> {
        if self.port_mapping_inverse.get(&destination) == Some(&source) {
            return Ok(());
        }
        if let Some(existing) = self.producer_description(&destination) {
            return Err(GraphError::ProducerConflict {
                parameter: destination,
                existing,
                incoming: format!("port from {}", source),
            });
        }
        self.port_mapping_inverse.insert(destination, source);
        Ok(())
    }

    fn producer_description(&self, id: &ParameterId) -> Option<String> {
        if let Some(rel) = self.producer_of.get(id) {
            return Some(rel.to_string());
        }
        self.port_mapping_inverse.get(id).map(|src| format!("port from {}", src))
    }

    pub fn finish(self) -> Result<ExecutionModel, GraphError> {
        let Self { n_time_steps, parameter_ids, relationships, producer_of, port_mapping_inverse } = self;

        let mut input_parameter_id_to_relationship_ids: BTreeMap<ParameterId, BTreeSet<RelationshipId>> = BTreeMap::new();
        let mut relationship_id_to_input_parameter_ids = BTreeMap::new();
        let mut relationship_id_to_output_parameter_ids = BTreeMap::new();

        let require = |id: &ParameterId, user: &dyn std::fmt::Display| -> Result<(), GraphError> {
            if parameter_ids.contains(id) {
                Ok(())
            } else {
                Err(GraphError::UnknownParameter { parameter: id.clone(), referenced_by: user.to_string() })
            }
        };

        for (rel_id, info) in &relationships {
            let mut inputs = BTreeSet::new();
            for input in info.input_parameter_ids() {
                require(input, rel_id)?;
                inputs.insert(input.clone());
                input_parameter_id_to_relationship_ids
                    .entry(input.clone())
                    .or_default()
                    .insert(rel_id.clone());
            }
            let mut outputs = BTreeSet::new();
            for output in info.output_parameter_ids() {
                require(output, rel_id)?;
                outputs.insert(output.clone());
            }
            relationship_id_to_input_parameter_ids.insert(rel_id.clone(), inputs);
            relationship_id_to_output_parameter_ids.insert(rel_id.clone(), outputs);
        }

        let mut port_mapping: BTreeMap<ParameterId, BTreeSet<ParameterId>> = BTreeMap::new();
        for (dst, src) in &port_mapping_inverse {
            require(src, &format!("port to {}", dst))?;
            require(dst, &format!("port from {}", src))?;
            port_mapping.entry(src.clone()).or_default().insert(dst.clone());
        }

        let input_parameter_ids = parameter_ids
            .iter()
            .filter(|id| !producer_of.contains_key(*id) && !port_mapping_inverse.contains_key(*id))
            .cloned()
            .collect();

        // Node indices follow sorted NodeId order.
        let mut graph = DiGraph::new();
        let mut index = BTreeMap::new();
        let nodes = parameter_ids
            .iter()
            .cloned()
            .map(NodeId::Parameter)
            .chain(relationships.keys().cloned().map(NodeId::Relationship));
        for node in nodes {
            let ix = graph.add_node(node.clone());
            index.insert(node, ix);
        }
        let ix_of = |node: NodeId| index[&node];
        for (rel_id, inputs) in &relationship_id_to_input_parameter_ids {
            let r = ix_of(NodeId::Relationship(rel_id.clone()));
            for input in inputs {
                graph.add_edge(ix_of(NodeId::Parameter(input.clone())), r, Edge::Input);
            }
        }
        for (rel_id, outputs) in &relationship_id_to_output_parameter_ids {
            let r = ix_of(NodeId::Relationship(rel_id.clone()));
            for output in outputs {
                graph.add_edge(r, ix_of(NodeId::Parameter(output.clone())), Edge::Output);
            }
        }
        for (dst, src) in &port_mapping_inverse {
            graph.add_edge(
                ix_of(NodeId::Parameter(src.clone())),
                ix_of(NodeId::Parameter(dst.clone())),
                Edge::Port,
            );
        }

        let order = topological_order(&graph)?;

        Ok(ExecutionModel {
            n_time_steps,
            parameter_ids,
            relationships,
            input_parameter_id_to_relationship_ids,
            relationship_id_to_output_parameter_ids,
            relationship_id_to_input_parameter_ids,
            producer_of,
            port_mapping,
            port_mapping_inverse,
            input_parameter_ids,
            order,
            graph,
            index,
        })
    }
}

/// Kahn's algorithm, seeded in node-index order.
fn topological_order(graph: &DiGraph<NodeId, Edge>) -> Result<Vec<NodeId>, GraphError> {
    let count = graph.node_count();
    let mut in_degree = vec![0usize; count];
    let mut queue = VecDeque::with_capacity(count);
    let mut order = Vec::with_capacity(count);

    for ix in graph.node_indices() {
        in_degree[ix.index()] = graph.edges_directed(ix, Direction::Incoming).count();
        if in_degree[ix.index()] == 0 {
            queue.push_back(ix);
        }
    }

    while let Some(ix) = queue.pop_front() {
        order.push(graph[ix].clone());
        for edge in graph.edges_directed(ix, Direction::Outgoing) {
            let child = edge.target();
            in_degree[child.index()] -= 1;
            if in_degree[child.index()] == 0 {
                queue.push_back(child);
            }
        }
    }

    if order.len() != count {
        let nodes = graph
            .node_indices()
            .filter(|ix| in_degree[ix.index()] > 0)
            .map(|ix| graph[ix].clone())
            .collect();
        return Err(GraphError::Cycle { nodes });
    }

    Ok(order)
}

mod error {
    use super::{NodeId, ParameterId, RelationshipId};
    use thiserror::Error;

    #[derive(Error, Debug, Clone, PartialEq)]
    pub enum GraphError {
        #[error("cycle detected; {} nodes could not be ordered: {}", .nodes.len(), join(.nodes))]
        Cycle { nodes: Vec<NodeId> },
        #[error("parameter {parameter} is produced by both {existing} and {incoming}")]
        ProducerConflict { parameter: ParameterId, existing: String, incoming: String },
        #[error("parameter {parameter} referenced by {referenced_by} is not declared")]
        UnknownParameter { parameter: ParameterId, referenced_by: String },
        #[error("relationship instance {0} is declared twice")]
        DuplicateRelationship(RelationshipId),
    }

    fn join(nodes: &[NodeId]) -> String {
        nodes.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
    }
}
