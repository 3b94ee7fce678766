use crate::analysis::topology;
use crate::computation::Assignment;
use crate::graph::{ExecutionModel, NodeId, ParameterId};
use std::collections::HashMap;
use std::fmt::Write;

const RULE: &str = "--------------------------------------------------";

/// Renders how `target` got its value: the producing relationship instance or
/// port edge, then the same for each input, recursively.
pub fn format_trace(model: &ExecutionModel, values: &Assignment, target: &ParameterId) -> String {
    let mut tracer = Tracer { model, values, visited_at_level: HashMap::new(), output: String::new() };

    if !model.parameter_ids().contains(target) {
        let _ = writeln!(tracer.output, "Error: unknown parameter {}", target);
        return tracer.output;
    }

    let _ = writeln!(tracer.output, "AUDIT TRACE for parameter '{}':", target);
    let _ = writeln!(tracer.output, "{}", RULE);
    tracer.trace_parameter(target, 1, "");

    let inputs = topology::upstream_from(model, &[NodeId::Parameter(target.clone())])
        .iter()
        .filter_map(NodeId::as_parameter)
        .filter(|id| model.input_parameter_ids().contains(*id))
        .count();
    let _ = writeln!(tracer.output, "{}", RULE);
    let _ = writeln!(tracer.output, "Depends on {} external inputs.", inputs);
    tracer.output
}

struct Tracer<'a> {
    model: &'a ExecutionModel,
    values: &'a Assignment,
    visited_at_level: HashMap<ParameterId, usize>,
    output: String,
}

impl<'a> Tracer<'a> {
    fn trace_parameter(&mut self, id: &ParameterId, level: usize, prefix: &str) {
        if let Some(&first_seen) = self.visited_at_level.get(id) {
            let _ = writeln!(self.output, "{}{} -> (Ref to L{})", prefix, id, first_seen);
            return;
        }
        self.visited_at_level.insert(id.clone(), level);

        let header = format!("[L{}] {} {}", level, id, self.format_value(id));
        let model = self.model;

        if let Some(rel_id) = model.producer_of(id) {
            let args = model
                .relationship(rel_id)
                .map(|info| info.inputs.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>().join(", "))
                .unwrap_or_default();
            let _ = writeln!(self.output, "{}{} = {}({})", prefix, header, rel_id, args);
            let children: Vec<ParameterId> = model
                .relationship_id_to_input_parameter_ids()
                .get(rel_id)
                .map(|ids| ids.iter().cloned().collect())
                .unwrap_or_default();
            self.recurse_children(prefix, &children, level);
        } else if let Some(source) = model.port_mapping_inverse().get(id) {
            let _ = writeln!(self.output, "{}{} <- port", prefix, header);
            self.recurse_children(prefix, std::slice::from_ref(source), level);
        } else {
            let _ = writeln!(self.output, "{}{} -> Input", prefix, header);
        }
    }

    fn recurse_children(&mut self, prefix: &str, children: &[ParameterId], level: usize) {
        let stem = build_child_stem(prefix);
        for (i, child) in children.iter().enumerate() {
            let connector = if i == children.len() - 1 { "`-- " } else { "|-- " };
            self.trace_parameter(child, level + 1, &format!("{}{}", stem, connector));
        }
    }

    fn format_value(&self, id: &ParameterId) -> String {
        match self.values.get(id) {
            Some(v) => format!("[{}]", v),
            None => "[?]".to_string(),
        }
    }
}

fn build_child_stem(current_prefix: &str) -> String {
    current_prefix.replace("`-- ", "    ").replace("|-- ", "|   ")
}
