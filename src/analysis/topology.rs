use crate::graph::{ExecutionModel, NodeId};
use std::collections::{BTreeSet, VecDeque};

/// Every node the start nodes transitively depend on, start nodes included.
pub fn upstream_from(model: &ExecutionModel, start_nodes: &[NodeId]) -> BTreeSet<NodeId> {
    walk(start_nodes, |node| model.dependencies(node))
}

/// Every node transitively depending on the start nodes, start nodes included.
///
/// Used to find what a changed input can affect.
pub fn downstream_from(model: &ExecutionModel, start_nodes: &[NodeId]) -> BTreeSet<NodeId> {
    walk(start_nodes, |node| model.dependents(node))
}

fn walk(start_nodes: &[NodeId], next: impl Fn(&NodeId) -> Vec<NodeId>) -> BTreeSet<NodeId> {
    let mut visited = BTreeSet::new();
    let mut queue = VecDeque::from(start_nodes.to_vec());

    while let Some(node) = queue.pop_front() {
        if visited.contains(&node) {
            continue;
        }
        queue.extend(next(&node));
        visited.insert(node);
    }
    visited
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::build_exec_model;
    use crate::graph::{ModelPath, ParameterId, RelationshipId};
    use crate::testing;

    fn param(path: ModelPath, name: &str) -> NodeId {
        NodeId::Parameter(ParameterId::new_static(path, name))
    }

    #[test]
    fn test_closures_cross_submodel_ports() {
        let exec = build_exec_model(&testing::polynomial_model(), 1).unwrap();
        let inner = ModelPath::root().child("calc_square_term");

        let down = downstream_from(&exec, &[param(ModelPath::root(), "x")]);
        assert!(down.contains(&param(inner.clone(), "y")));
        assert!(down.contains(&param(ModelPath::root(), "y")));
        assert!(!down.contains(&param(ModelPath::root(), "a0")));

        let up = upstream_from(&exec, &[param(ModelPath::root(), "x_squared")]);
        let expected: BTreeSet<NodeId> = [
            param(ModelPath::root(), "x"),
            param(inner.clone(), "x"),
            NodeId::Relationship(RelationshipId::new_static(inner.clone(), "square")),
            param(inner, "y"),
            param(ModelPath::root(), "x_squared"),
        ]
        .into();
        assert_eq!(up, expected);
    }

    #[test]
    fn test_lagged_dependencies_follow_time() {
        let exec = build_exec_model(&testing::diamond_mdp_model(), 4).unwrap();
        let start = NodeId::Parameter(ParameterId::new_time_series(ModelPath::root(), "location", 0));
        let down = downstream_from(&exec, &[start]);
        let last = NodeId::Parameter(ParameterId::new_time_series(ModelPath::root(), "location", 3));
        assert!(down.contains(&last));
        assert!(down.contains(&param(ModelPath::root(), "cumulative_reward")));
    }
}
