//! Turns a symbolic `Reference` into the concrete ids it denotes at one point of
//! the time-expanded model.

use super::error::ResolveError;
use crate::graph::{Connector, InputSlot, ModelPath, ParameterId};
use crate::model::{
    Collection, CollectionLayout, DeclarativeModel, ExecInfo, FunctionInput, KeyFilter, KeyPart, MappingKey,
    Parameter, Qualifier, RefTarget, Reference,
};
use std::collections::BTreeMap;

/// Where a relationship instance sits in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeContext {
    /// One instance of a per-time-step relationship.
    PerStep { time_step: usize, n_time_steps: usize },
    /// The single instance of a once-per-run relationship.
    OncePerRun { n_time_steps: usize },
}

impl TimeContext {
    pub fn n_time_steps(&self) -> usize {
        match self {
            TimeContext::PerStep { n_time_steps, .. } | TimeContext::OncePerRun { n_time_steps } => *n_time_steps,
        }
    }

    pub fn time_step(&self) -> Option<usize> {
        match self {
            TimeContext::PerStep { time_step, .. } => Some(*time_step),
            TimeContext::OncePerRun { .. } => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            TimeContext::PerStep { .. } => "per-time-step",
            TimeContext::OncePerRun { .. } => "once-per-run",
        }
    }
}

/// Which steps of a target a resolved reference covers.
enum Selection {
    /// One step, or `None` for a static target.
    Snapshot(Option<usize>),
    /// Every step `0..N`, in order.
    AllSteps,
}

fn select(reference: &Reference, is_time_series: bool, ctx: TimeContext) -> Result<Selection, ResolveError> {
    let context_error = || ResolveError::QualifierContext { reference: reference.to_string(), context: ctx.label() };
    match ctx {
        TimeContext::PerStep { time_step, n_time_steps } => match reference.qualifier {
            Qualifier::Initial | Qualifier::AllTimeSteps => Err(context_error()),
            _ if !is_time_series => Ok(Selection::Snapshot(None)),
            Qualifier::Normal => Ok(Selection::Snapshot(Some(time_step))),
            Qualifier::Previous => time_step
                .checked_sub(1)
                .map(|t| Selection::Snapshot(Some(t)))
                .ok_or_else(|| ResolveError::StepOutOfRange {
                    reference: reference.to_string(),
                    time_step,
                    n_time_steps,
                }),
            Qualifier::Next if time_step + 1 < n_time_steps => Ok(Selection::Snapshot(Some(time_step + 1))),
            Qualifier::Next => Err(ResolveError::StepOutOfRange {
                reference: reference.to_string(),
                time_step,
                n_time_steps,
            }),
        },
        TimeContext::OncePerRun { .. } => match reference.qualifier {
            Qualifier::Previous | Qualifier::Next => Err(context_error()),
            _ if !is_time_series => Ok(Selection::Snapshot(None)),
            Qualifier::Initial => Ok(Selection::Snapshot(Some(0))),
            Qualifier::AllTimeSteps => Ok(Selection::AllSteps),
            Qualifier::Normal => Err(ResolveError::MissingAggregate(reference.to_string())),
        },
    }
}

fn parameter_id(path: &ModelPath, name: &str, step: Option<usize>) -> ParameterId {
    match step {
        Some(t) => ParameterId::new_time_series(path.clone(), name, t),
        None => ParameterId::new_static(path.clone(), name),
    }
}

/// Resolves `reference`, declared in `model` at `path`, for one relationship instance.
pub fn resolve(
    reference: &Reference,
    model: &DeclarativeModel,
    path: &ModelPath,
    ctx: TimeContext,
) -> Result<Connector, ResolveError> {
    match &reference.target {
        RefTarget::Parameter => {
            let parameter = model.parameter(&reference.name).ok_or_else(|| {
                if model.collection(&reference.name).is_some() {
                    ResolveError::KindMismatch { name: reference.name.clone(), expected: "parameter", found: "collection" }
                } else {
                    ResolveError::UnknownParameter(reference.name.clone())
                }
            })?;
            resolve_parameter(reference, parameter, path, ctx)
        }
        RefTarget::Mapping { .. } | RefTarget::Array { .. } => {
            let collection = model.collection(&reference.name).ok_or_else(|| {
                if model.parameter(&reference.name).is_some() {
                    ResolveError::KindMismatch { name: reference.name.clone(), expected: "collection", found: "parameter" }
                } else {
                    ResolveError::UnknownCollection(reference.name.clone())
                }
            })?;
            resolve_collection(reference, collection, path, ctx)
        }
    }
}

/// Resolves one declared function argument, which may be an exec-info request.
pub fn resolve_input(
    input: &FunctionInput,
    model: &DeclarativeModel,
    path: &ModelPath,
    ctx: TimeContext,
) -> Result<InputSlot, ResolveError> {
    match input {
        FunctionInput::Reference(reference) => resolve(reference, model, path, ctx).map(InputSlot::Connector),
        FunctionInput::ExecInfo(ExecInfo::Time) if ctx.time_step().is_none() => {
            Err(ResolveError::ExecInfoContext(ExecInfo::Time))
        }
        FunctionInput::ExecInfo(info) => Ok(InputSlot::ExecInfo(*info)),
    }
}

fn resolve_parameter(
    reference: &Reference,
    parameter: &Parameter,
    path: &ModelPath,
    ctx: TimeContext,
) -> Result<Connector, ResolveError> {
    match select(reference, parameter.is_time_series, ctx)? {
        Selection::Snapshot(step) => Ok(Connector::Scalar(parameter_id(path, &parameter.name, step))),
        Selection::AllSteps => {
            let n = ctx.n_time_steps();
            let ids = (0..n).map(|t| parameter_id(path, &parameter.name, Some(t))).collect();
            Ok(Connector::Array { shape: vec![n], ids })
        }
    }
}

fn resolve_collection(
    reference: &Reference,
    collection: &Collection,
    path: &ModelPath,
    ctx: TimeContext,
) -> Result<Connector, ResolveError> {
    let members = collection
        .parameters()
        .ok_or_else(|| ResolveError::NotParameterCollection(reference.name.clone()))?;
    let selection = select(reference, collection.is_time_series(), ctx)?;
    let snapshot = |step: Option<usize>| -> Vec<ParameterId> {
        members.iter().map(|p| parameter_id(path, &p.name, step)).collect()
    };
    let steps: Vec<Vec<ParameterId>> = match selection {
        Selection::Snapshot(step) => vec![snapshot(step)],
        Selection::AllSteps => (0..ctx.n_time_steps()).map(|t| snapshot(Some(t))).collect(),
    };
    let all_steps = matches!(selection, Selection::AllSteps);

    match (&reference.target, collection.layout()) {
        (RefTarget::Mapping { key }, CollectionLayout::Mapping(keys)) => {
            let keyed = |ids: Vec<ParameterId>| -> BTreeMap<MappingKey, ParameterId> {
                keys.iter().cloned().zip(ids).collect()
            };
            let mut maps: Vec<_> = steps.into_iter().map(keyed).collect();
            match (key, all_steps) {
                (None, false) => Ok(Connector::Mapping(maps.remove(0))),
                (None, true) => Ok(Connector::MappingList(maps)),
                (Some(filter), false) => Ok(match filter_mapping(reference, &maps[0], filter)? {
                    Filtered::One(id) => Connector::Scalar(id),
                    Filtered::Many(m) => Connector::Mapping(m),
                }),
                (Some(filter), true) => filter_mapping_list(reference, &maps, filter),
            }
        }
        (RefTarget::Array { index }, CollectionLayout::Array(shape)) => {
            if index.is_some() {
                return Err(ResolveError::ArrayFilterUnsupported(reference.name.clone()));
            }
            let mut full_shape = Vec::with_capacity(shape.len() + 1);
            if all_steps {
                full_shape.push(steps.len());
            }
            full_shape.extend_from_slice(shape);
            Ok(Connector::Array { shape: full_shape, ids: steps.into_iter().flatten().collect() })
        }
        (RefTarget::Mapping { .. }, CollectionLayout::Array(_)) => Err(ResolveError::KindMismatch {
            name: reference.name.clone(),
            expected: "mapping",
            found: "array",
        }),
        (_, _) => Err(ResolveError::KindMismatch {
            name: reference.name.clone(),
            expected: "array",
            found: "mapping",
        }),
    }
}

enum Filtered {
    One(ParameterId),
    Many(BTreeMap<MappingKey, ParameterId>),
}

/// Projects a mapping through a key filter.
///
/// A filter that fixes every key position selects one element. Otherwise the
/// surviving elements are re-keyed by their wildcard positions only.
fn filter_mapping(
    reference: &Reference,
    mapping: &BTreeMap<MappingKey, ParameterId>,
    filter: &KeyFilter,
) -> Result<Filtered, ResolveError> {
    let arity = mapping.keys().next().map_or(1, MappingKey::arity);
    let missing = || ResolveError::MissingKey(reference.to_string());
    let parts: Vec<KeyPart> = match filter {
        KeyFilter::Exact(k) => vec![KeyPart::Is(k.clone())],
        KeyFilter::Pattern(parts) => parts.clone(),
    };
    if parts.len() != arity {
        return Err(ResolveError::KeyArity { name: reference.name.clone(), expected: arity, actual: parts.len() });
    }

    if parts.iter().all(|p| matches!(p, KeyPart::Is(_))) {
        let fixed: Vec<&str> = parts
            .iter()
            .filter_map(|p| match p {
                KeyPart::Is(s) => Some(s.as_str()),
                KeyPart::Any => None,
            })
            .collect();
        return mapping
            .iter()
            .find(|(k, _)| k.parts() == fixed)
            .map(|(_, id)| Filtered::One(id.clone()))
            .ok_or_else(missing);
    }

    let mut selected = BTreeMap::new();
    for (key, id) in mapping {
        let key_parts = key.parts();
        let matches = key_parts.iter().zip(&parts).all(|(k, p)| match p {
            KeyPart::Is(s) => s == k,
            KeyPart::Any => true,
        });
        if !matches {
            continue;
        }
        let mut reduced: Vec<String> = key_parts
            .iter()
            .zip(&parts)
            .filter(|(_, p)| matches!(p, KeyPart::Any))
            .map(|(k, _)| k.to_string())
            .collect();
        let new_key = if reduced.len() == 1 {
            MappingKey::Single(reduced.remove(0))
        } else {
            MappingKey::Tuple(reduced)
        };
        selected.insert(new_key, id.clone());
    }
    if selected.is_empty() {
        return Err(missing());
    }
    Ok(Filtered::Many(selected))
}

/// Filters every step of a mapping list; a single-element selection becomes an array over steps.
fn filter_mapping_list(
    reference: &Reference,
    maps: &[BTreeMap<MappingKey, ParameterId>],
    filter: &KeyFilter,
) -> Result<Connector, ResolveError> {
    let mut ids = Vec::with_capacity(maps.len());
    let mut mappings = Vec::with_capacity(maps.len());
    for map in maps {
        match filter_mapping(reference, map, filter)? {
            Filtered::One(id) => ids.push(id),
            Filtered::Many(m) => mappings.push(m),
        }
    }
    if mappings.is_empty() {
        Ok(Connector::Array { shape: vec![ids.len()], ids })
    } else {
        Ok(Connector::MappingList(mappings))
    }
}
