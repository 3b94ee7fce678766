//! builder.rs
//! Lowers a `DeclarativeModel` into a flat, time-expanded `ExecutionModel`.
//!
//! The walk is recursive over sub-model relationships. Every parameter becomes
//! one id (static) or one id per step (time series); every function relationship
//! becomes one instance, or one per active step when it runs at each time step.
//! Sub-model boundaries become port edges.

use super::error::{BuildError, ResolveError};
use super::resolver::{resolve, resolve_input, TimeContext};
use super::BuildOptions;
use crate::graph::{
    Connector, ExecutionGraphBuilder, ExecutionModel, ModelPath, ParameterId, RelationshipId, RelationshipInfo,
};
use crate::model::{
    Collection, DeclarativeModel, FunctionRelationship, RefTarget, Reference, Relationship, SubModelRelationship,
};
use smallvec::SmallVec;
use tracing::{debug, info, trace};

/// Compiles `model` for `n_time_steps` steps.
pub fn build_exec_model(model: &DeclarativeModel, n_time_steps: usize) -> Result<ExecutionModel, BuildError> {
    build_with(model, &BuildOptions { n_time_steps })
}

pub fn build_with(model: &DeclarativeModel, options: &BuildOptions) -> Result<ExecutionModel, BuildError> {
    let n = options.n_time_steps;
    if n == 0 {
        return Err(BuildError::InvalidTimeSteps(n));
    }
    let mut graph = ExecutionGraphBuilder::new(n);
    visit(model, &ModelPath::root(), n, &mut graph)?;
    let exec = graph.finish()?;
    info!(
        model = %model.name,
        n_time_steps = n,
        parameters = exec.parameter_ids().len(),
        relationships = exec.relationships().len(),
        required_inputs = exec.input_parameter_ids().len(),
        "compiled execution model"
    );
    Ok(exec)
}

fn visit(
    model: &DeclarativeModel,
    path: &ModelPath,
    n: usize,
    graph: &mut ExecutionGraphBuilder,
) -> Result<(), BuildError> {
    for parameter in model.iter_all_parameters() {
        if parameter.is_time_series {
            for t in 0..n {
                graph.add_parameter(ParameterId::new_time_series(path.clone(), &parameter.name, t));
            }
        } else {
            graph.add_parameter(ParameterId::new_static(path.clone(), &parameter.name));
        }
    }

    for relationship in model.iter_all_relationships() {
        let steps = active_steps(relationship, model, n)?;
        match relationship {
            Relationship::Function(function) => add_function(function, &steps, model, path, n, graph)?,
            Relationship::SubModel(sub) => {
                visit(&sub.model, &path.child(&sub.name), n, graph)?;
                add_ports(sub, &steps, model, path, n, graph)?;
            }
        }
    }
    Ok(())
}

/// The steps a relationship is instantiated at; `None` is the single once-per-run instance.
///
/// Reading `previous` drops step 0, writing `next` drops the last step. Reading
/// `next` or writing `previous` of a time series has no window and is rejected.
fn active_steps(
    relationship: &Relationship,
    model: &DeclarativeModel,
    n: usize,
) -> Result<Vec<Option<usize>>, BuildError> {
    let past = relationship.includes_past();
    let future = relationship.includes_future();
    if past && future {
        return Err(BuildError::MixedTemporalDirection { relationship: relationship.name().to_string() });
    }
    if !relationship.at_each_time_step() {
        return Ok(vec![None]);
    }
    if let Some(reference) = relationship.reversed_references().into_iter().find(|r| is_time_series(model, r)) {
        return Err(BuildError::ReversedTemporalDirection {
            relationship: relationship.name().to_string(),
            reference: reference.to_string(),
        });
    }
    let steps = match (past, future) {
        (true, _) => 1..n,
        (_, true) => 0..n - 1,
        _ => 0..n,
    };
    Ok(steps.map(Some).collect())
}

fn is_time_series(model: &DeclarativeModel, reference: &Reference) -> bool {
    match reference.target {
        RefTarget::Parameter => model.parameter(&reference.name).is_some_and(|p| p.is_time_series),
        RefTarget::Mapping { .. } | RefTarget::Array { .. } => {
            model.collection(&reference.name).is_some_and(Collection::is_time_series)
        }
    }
}

fn context(step: Option<usize>, n: usize) -> TimeContext {
    match step {
        Some(time_step) => TimeContext::PerStep { time_step, n_time_steps: n },
        None => TimeContext::OncePerRun { n_time_steps: n },
    }
}

fn add_function(
    function: &FunctionRelationship,
    steps: &[Option<usize>],
    model: &DeclarativeModel,
    path: &ModelPath,
    n: usize,
    graph: &mut ExecutionGraphBuilder,
) -> Result<(), BuildError> {
    debug!(path = %path, relationship = %function.name, instances = steps.len(), "instantiating relationship");

    for &step in steps {
        let ctx = context(step, n);
        let id = match step {
            Some(t) => RelationshipId::new_time_series(path.clone(), &function.name, t),
            None => RelationshipId::new_static(path.clone(), &function.name),
        };
        let resolve_error = |reference: String| {
            let relationship = id.to_string();
            move |source: ResolveError| BuildError::Resolve { relationship, reference, source }
        };

        let mut inputs = Vec::with_capacity(function.inputs.len());
        for (arg, input) in &function.inputs {
            let slot = resolve_input(input, model, path, ctx).map_err(resolve_error(input.to_string()))?;
            inputs.push((arg.clone(), slot));
        }
        let mut outputs: SmallVec<[Connector; 2]> = SmallVec::with_capacity(function.outputs.len());
        for output in &function.outputs {
            outputs.push(resolve(output, model, path, ctx).map_err(resolve_error(output.to_string()))?);
        }

        trace!(relationship = %id, inputs = inputs.len(), outputs = outputs.len(), "resolved relationship instance");
        graph.add_relationship(id, RelationshipInfo { relationship: function.clone(), inputs, outputs })?;
    }
    Ok(())
}

fn add_ports(
    sub: &SubModelRelationship,
    steps: &[Option<usize>],
    model: &DeclarativeModel,
    path: &ModelPath,
    n: usize,
    graph: &mut ExecutionGraphBuilder,
) -> Result<(), BuildError> {
    let inner_path = path.child(&sub.name);
    debug!(path = %path, submodel = %sub.name, instances = steps.len(), "mapping sub-model ports");

    for &step in steps {
        let ctx = context(step, n);
        let pair = |inner: &Reference, outer: &Reference| -> Result<Vec<(ParameterId, ParameterId)>, BuildError> {
            let resolve_error = |reference: &Reference| {
                let relationship = sub.name.clone();
                let reference = reference.to_string();
                move |source: ResolveError| BuildError::Resolve { relationship, reference, source }
            };
            let inner_ids = resolve(inner, &sub.model, &inner_path, ctx).map_err(resolve_error(inner))?;
            let outer_ids = resolve(outer, model, path, ctx).map_err(resolve_error(outer))?;
            if inner_ids.len() != outer_ids.len() {
                return Err(BuildError::PortArityMismatch {
                    relationship: sub.name.clone(),
                    inner: inner.to_string(),
                    outer: outer.to_string(),
                    inner_len: inner_ids.len(),
                    outer_len: outer_ids.len(),
                });
            }
            Ok(inner_ids
                .parameter_ids()
                .into_iter()
                .cloned()
                .zip(outer_ids.parameter_ids().into_iter().cloned())
                .collect())
        };

        for (inner, outer) in &sub.inputs {
            for (inner_id, outer_id) in pair(inner, outer)? {
                trace!(from = %outer_id, to = %inner_id, "input port");
                graph.add_port(outer_id, inner_id)?;
            }
        }
        for (inner, outer) in &sub.outputs {
            for (inner_id, outer_id) in pair(inner, outer)? {
                trace!(from = %inner_id, to = %outer_id, "output port");
                graph.add_port(inner_id, outer_id)?;
            }
        }
    }
    Ok(())
}
