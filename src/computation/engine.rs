//! A synchronous, single-threaded interpreter over a compiled `ExecutionModel`.
//!
//! One call walks the precomputed order once. The model is only read, so any
//! number of evaluations may share it across threads.
use crate::computation::ledger::{EvalError, Ledger};
use crate::computation::value::{Arguments, Value};
use crate::graph::{Connector, ExecutionModel, InputSlot, NodeId, ParameterId, RelationshipId};
use crate::model::{ExecInfo, MappingKey};
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Values keyed by parameter id: the inputs of an evaluation, or its results.
pub type Assignment = BTreeMap<ParameterId, Value>;

pub struct ComputationEngine<'a> {
    model: &'a ExecutionModel,
}

impl<'a> ComputationEngine<'a> {
    pub fn new(model: &'a ExecutionModel) -> Self {
        Self { model }
    }

    /// Resolves every parameter of the model from `inputs`.
    pub fn run(&self, inputs: &Assignment) -> Result<Assignment, EvalError> {
        let mut ledger = Ledger::new();
        for node in self.model.order() {
            match node {
                NodeId::Parameter(id) => self.resolve_parameter(id, inputs, &mut ledger)?,
                NodeId::Relationship(id) => self.evaluate_relationship(id, &mut ledger)?,
            }
        }
        debug!(values = ledger.len(), "evaluation finished");
        Ok(ledger.into_values())
    }

    fn resolve_parameter(&self, id: &ParameterId, inputs: &Assignment, ledger: &mut Ledger) -> Result<(), EvalError> {
        if ledger.contains(id) {
            return Ok(());
        }
        if let Some(value) = inputs.get(id) {
            return ledger.insert(id.clone(), value.clone());
        }
        if let Some(source) = self.model.port_mapping_inverse().get(id) {
            let value = ledger
                .get(source)
                .or_else(|| inputs.get(source))
                .cloned()
                .ok_or_else(|| EvalError::MissingProducer { parameter: id.clone(), source_id: source.clone() })?;
            trace!(parameter = %id, source = %source, "port copy");
            return ledger.insert(id.clone(), value);
        }
        Err(EvalError::MissingInput { parameter: id.clone() })
    }

    fn evaluate_relationship(&self, id: &RelationshipId, ledger: &mut Ledger) -> Result<(), EvalError> {
        let info = self.model.relationship(id).ok_or_else(|| EvalError::UnknownRelationship(id.clone()))?;

        let mut args = Arguments::new();
        for (name, slot) in &info.inputs {
            let value = match slot {
                InputSlot::Connector(connector) => gather(connector, ledger, id)?,
                InputSlot::ExecInfo(ExecInfo::NTimeSteps) => Value::Integer(self.model.n_time_steps() as i64),
                InputSlot::ExecInfo(ExecInfo::Time) => {
                    let t = id.time_step().ok_or_else(|| EvalError::NoTimeStep(id.clone()))?;
                    Value::Integer(t as i64)
                }
            };
            args.insert(name.clone(), value);
        }

        trace!(relationship = %id, arguments = args.len(), "calling relationship");
        let results = info
            .relationship
            .call(&args)
            .map_err(|source| EvalError::Function { relationship: id.clone(), source })?;
        if results.len() != info.outputs.len() {
            return Err(EvalError::OutputCount {
                relationship: id.clone(),
                expected: info.outputs.len(),
                actual: results.len(),
            });
        }

        for (output, (value, connector)) in results.into_iter().zip(&info.outputs).enumerate() {
            let shape_error = |message: String| EvalError::OutputShape { relationship: id.clone(), output, message };
            for (target, v) in scatter(connector, value).map_err(shape_error)? {
                ledger.insert(target.clone(), v)?;
            }
        }
        Ok(())
    }
}

/// Materializes a connector's values in the connector's shape.
fn gather(connector: &Connector, ledger: &Ledger, relationship: &RelationshipId) -> Result<Value, EvalError> {
    let lookup = |id: &ParameterId| -> Result<Value, EvalError> {
        ledger.get(id).cloned().ok_or_else(|| EvalError::MissingValue {
            relationship: relationship.clone(),
            parameter: id.clone(),
        })
    };
    let keyed = |map: &BTreeMap<MappingKey, ParameterId>| -> Result<Value, EvalError> {
        map.iter()
            .map(|(k, id)| Ok((k.clone(), lookup(id)?)))
            .collect::<Result<BTreeMap<_, _>, EvalError>>()
            .map(Value::Map)
    };
    match connector {
        Connector::Scalar(id) => lookup(id),
        Connector::Mapping(map) => keyed(map),
        Connector::MappingList(steps) => steps.iter().map(&keyed).collect::<Result<Vec<_>, _>>().map(Value::List),
        Connector::Array { shape, ids } => {
            let flat = ids.iter().map(&lookup).collect::<Result<Vec<_>, _>>()?;
            Ok(nest(shape, flat))
        }
    }
}

/// Builds nested lists over a row-major buffer.
fn nest(shape: &[usize], flat: Vec<Value>) -> Value {
    match shape {
        [] | [_] => Value::List(flat),
        [_, rest @ ..] => {
            let stride: usize = rest.iter().product();
            let mut rows = Vec::with_capacity(shape[0]);
            let mut flat = flat.into_iter();
            for _ in 0..shape[0] {
                rows.push(nest(rest, flat.by_ref().take(stride).collect()));
            }
            Value::List(rows)
        }
    }
}

/// Pairs each id of `connector` with its element of a like-shaped `value`.
fn scatter(connector: &Connector, value: Value) -> Result<Vec<(&ParameterId, Value)>, String> {
    fn unkey(map: &BTreeMap<MappingKey, ParameterId>, value: Value) -> Result<Vec<(&ParameterId, Value)>, String> {
        let mut entries = match value {
            Value::Map(entries) => entries,
            other => return Err(format!("expected a map, found {}", other.kind_name())),
        };
        if entries.len() != map.len() {
            return Err(format!("expected {} keys, found {}", map.len(), entries.len()));
        }
        map.iter()
            .map(|(k, id)| entries.remove(k).map(|v| (id, v)).ok_or_else(|| format!("missing key '{}'", k)))
            .collect()
    }

    match connector {
        Connector::Scalar(id) => Ok(vec![(id, value)]),
        Connector::Mapping(map) => unkey(map, value),
        Connector::MappingList(steps) => {
            let items = expect_list(value, steps.len())?;
            let mut out = Vec::new();
            for (map, item) in steps.iter().zip(items) {
                out.extend(unkey(map, item)?);
            }
            Ok(out)
        }
        Connector::Array { shape, ids } => {
            let mut flat = Vec::with_capacity(ids.len());
            flatten(value, shape, &mut flat)?;
            Ok(ids.iter().zip(flat).collect())
        }
    }
}

fn expect_list(value: Value, len: usize) -> Result<Vec<Value>, String> {
    match value {
        Value::List(items) if items.len() == len => Ok(items),
        Value::List(items) => Err(format!("expected {} elements, found {}", len, items.len())),
        other => Err(format!("expected a list, found {}", other.kind_name())),
    }
}

fn flatten(value: Value, shape: &[usize], out: &mut Vec<Value>) -> Result<(), String> {
    match shape.split_first() {
        None => {
            out.push(value);
            Ok(())
        }
        Some((&len, rest)) => {
            for item in expect_list(value, len)? {
                flatten(item, rest, out)?;
            }
            Ok(())
        }
    }
}

/// Evaluates `model` against one input assignment.
pub fn execute(model: &ExecutionModel, inputs: &Assignment) -> Result<Assignment, EvalError> {
    ComputationEngine::new(model).run(inputs)
}

/// Evaluates independent assignments in parallel; results keep the input order.
pub fn execute_scenarios(model: &ExecutionModel, scenarios: &[Assignment]) -> Vec<Result<Assignment, EvalError>> {
    debug!(scenarios = scenarios.len(), "evaluating scenarios");
    scenarios.par_iter().map(|inputs| execute(model, inputs)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::build_exec_model;
    use crate::graph::ModelPath;
    use crate::model::{Collection, DeclarativeModel, FunctionRelationship, Parameter, Reference};
    use crate::testing;
    use rstest::rstest;

    fn root(name: &str) -> ParameterId {
        ParameterId::new_static(ModelPath::root(), name)
    }

    #[test]
    fn test_square_scenario() {
        let exec = build_exec_model(&testing::square_model(), 1).unwrap();
        let inputs = Assignment::from([(root("x"), Value::Real(4.0))]);
        let results = execute(&exec, &inputs).unwrap();
        assert_eq!(results, Assignment::from([(root("x"), Value::Real(4.0)), (root("y"), Value::Real(16.0))]));
    }

    #[test]
    fn test_polynomial_scenario() {
        let exec = build_exec_model(&testing::polynomial_model(), 1).unwrap();
        let results = execute(&exec, &testing::polynomial_inputs()).unwrap();
        let inner = ModelPath::root().child("calc_square_term");

        assert_eq!(results[&root("x_squared")], Value::Real(16.0));
        assert_eq!(results[&root("y")], Value::Real(57.0));
        assert_eq!(results[&ParameterId::new_static(inner.clone(), "x")], Value::Real(4.0));
        assert_eq!(results[&ParameterId::new_static(inner, "y")], Value::Real(16.0));
    }

    #[test]
    fn test_port_mapped_ids_agree() {
        let exec = build_exec_model(&testing::polynomial_model(), 1).unwrap();
        let results = execute(&exec, &testing::polynomial_inputs()).unwrap();
        for (dst, src) in exec.port_mapping_inverse() {
            assert_eq!(results[dst], results[src], "{} vs {}", dst, src);
        }
    }

    #[test]
    fn test_diamond_mdp_scenario() {
        let exec = build_exec_model(&testing::diamond_mdp_model(), 4).unwrap();
        let results = execute(&exec, &testing::diamond_mdp_inputs()).unwrap();
        let series = |name: &str| -> Vec<Value> {
            (0..4).map(|t| results[&ParameterId::new_time_series(ModelPath::root(), name, t)].clone()).collect()
        };
        let tags = |tags: [&str; 4]| -> Vec<Value> { tags.into_iter().map(Value::category).collect() };

        assert_eq!(series("location"), tags(["start", "left", "end", "end"]));
        assert_eq!(series("action"), tags(["go_left", "move_forward", "none", "none"]));
        assert_eq!(series("reward"), vec![Value::Real(0.0), Value::Real(0.0), Value::Real(1.0), Value::Real(0.0)]);
        assert_eq!(results[&root("cumulative_reward")], Value::Real(1.0));
        assert_eq!(results.len(), exec.parameter_ids().len());
    }

    #[test]
    fn test_missing_input_fails() {
        let exec = build_exec_model(&testing::square_model(), 1).unwrap();
        let err = execute(&exec, &Assignment::new()).unwrap_err();
        assert_eq!(err, EvalError::MissingInput { parameter: root("x") });
    }

    #[test]
    fn test_produced_value_wins_over_input() {
        let exec = build_exec_model(&testing::square_model(), 1).unwrap();
        let inputs = Assignment::from([(root("x"), Value::Real(3.0)), (root("y"), Value::Real(-1.0))]);
        let results = execute(&exec, &inputs).unwrap();
        assert_eq!(results[&root("y")], Value::Real(9.0));
    }

    #[test]
    fn test_function_failure_is_wrapped() {
        let exec = build_exec_model(&testing::square_model(), 1).unwrap();
        let inputs = Assignment::from([(root("x"), Value::Boolean(true))]);
        let err = execute(&exec, &inputs).unwrap_err();
        assert!(matches!(err, EvalError::Function { .. }), "{:?}", err);
    }

    fn splitter(output: Reference, returned: Value) -> DeclarativeModel {
        let members = Collection::mapping("parts", [("a", Parameter::real("")), ("b", Parameter::real(""))]).unwrap();
        DeclarativeModel::builder("split")
            .parameter(Parameter::real("total"))
            .collection(members)
            .relationship(
                FunctionRelationship::new("split", move |_| Ok(vec![returned.clone()]))
                    .input("total", Reference::parameter("total"))
                    .output(output),
            )
            .build()
            .unwrap()
    }

    #[rstest]
    #[case(Value::Real(1.0))]
    #[case(Value::Map(BTreeMap::from([(MappingKey::from("a"), Value::Real(1.0))])))]
    #[case(Value::Map(BTreeMap::from([
        (MappingKey::from("a"), Value::Real(1.0)),
        (MappingKey::from("c"), Value::Real(2.0)),
    ])))]
    fn test_mapping_output_shape_is_checked(#[case] returned: Value) {
        let exec = build_exec_model(&splitter(Reference::mapping("parts"), returned), 1).unwrap();
        let inputs = Assignment::from([(root("total"), Value::Real(3.0))]);
        let err = execute(&exec, &inputs).unwrap_err();
        assert!(matches!(err, EvalError::OutputShape { output: 0, .. }), "{:?}", err);
    }

    #[test]
    fn test_mapping_output_is_distributed() {
        let returned = Value::Map(BTreeMap::from([
            (MappingKey::from("a"), Value::Real(1.0)),
            (MappingKey::from("b"), Value::Real(2.0)),
        ]));
        let exec = build_exec_model(&splitter(Reference::mapping("parts"), returned), 1).unwrap();
        let inputs = Assignment::from([(root("total"), Value::Real(3.0))]);
        let results = execute(&exec, &inputs).unwrap();
        assert_eq!(results[&root("parts[b]")], Value::Real(2.0));
    }

    #[test]
    fn test_array_values_nest_by_shape() {
        let ids: Vec<Value> = (0..6).map(Value::Integer).collect();
        let nested = nest(&[2, 3], ids.clone());
        assert_eq!(nested.to_string(), "[[0, 1, 2], [3, 4, 5]]");

        let mut flat = Vec::new();
        flatten(nested, &[2, 3], &mut flat).unwrap();
        assert_eq!(flat, ids);
        assert!(flatten(Value::List(vec![Value::Integer(0)]), &[2], &mut Vec::new()).is_err());
    }

    #[test]
    fn test_scenarios_run_in_parallel_and_keep_order() {
        let exec = build_exec_model(&testing::square_model(), 1).unwrap();
        let scenarios: Vec<Assignment> =
            (0..16).map(|i| Assignment::from([(root("x"), Value::Real(i as f64))])).collect();
        let results = execute_scenarios(&exec, &scenarios);
        for (i, result) in results.into_iter().enumerate() {
            assert_eq!(result.unwrap()[&root("y")], Value::Real((i * i) as f64));
        }
    }

    fn series(results: &Assignment, path: &ModelPath, name: &str, n: usize) -> Vec<Value> {
        (0..n).map(|t| results[&ParameterId::new_time_series(path.clone(), name, t)].clone()).collect()
    }

    #[test]
    fn test_per_step_submodel_scenario() {
        let exec = build_exec_model(&testing::stepwise_square_model(), 3).unwrap();
        let results = execute(&exec, &testing::stepwise_square_inputs(&[1.0, 2.0, 3.0])).unwrap();
        let squares = vec![Value::Real(1.0), Value::Real(4.0), Value::Real(9.0)];

        assert_eq!(series(&results, &ModelPath::root(), "s_squared", 3), squares);
        assert_eq!(series(&results, &ModelPath::root().child("square_each_step"), "y", 3), squares);
        assert_eq!(results.len(), exec.parameter_ids().len());
    }

    #[test]
    fn test_array_input_is_read_in_order() {
        let exec = build_exec_model(&testing::array_polynomial_model(), 1).unwrap();
        let inputs = Assignment::from([
            (root("a[0]"), Value::Real(1.0)),
            (root("a[1]"), Value::Real(2.0)),
            (root("a[2]"), Value::Real(3.0)),
            (root("x"), Value::Real(2.0)),
        ]);
        assert_eq!(execute(&exec, &inputs).unwrap()[&root("y")], Value::Real(17.0));
    }

    #[test]
    fn test_mapping_list_output_is_distributed_per_step() {
        let stock = Collection::mapping(
            "stock",
            [("a", Parameter::real("").time_series()), ("b", Parameter::real("").time_series())],
        )
        .unwrap();
        let model = DeclarativeModel::builder("m")
            .collection(stock)
            .relationship(
                FunctionRelationship::new("fill", |args| {
                    let n = args.integer("n")?;
                    let steps = (0..n)
                        .map(|t| {
                            Value::Map(BTreeMap::from([
                                (MappingKey::from("a"), Value::Real(t as f64)),
                                (MappingKey::from("b"), Value::Real(10.0 * t as f64)),
                            ]))
                        })
                        .collect();
                    Ok(vec![Value::List(steps)])
                })
                .input("n", ExecInfo::NTimeSteps)
                .output(Reference::mapping("stock").all_time_steps()),
            )
            .build()
            .unwrap();
        let exec = build_exec_model(&model, 3).unwrap();
        let results = execute(&exec, &Assignment::new()).unwrap();

        assert_eq!(
            series(&results, &ModelPath::root(), "stock[b]", 3),
            vec![Value::Real(0.0), Value::Real(10.0), Value::Real(20.0)]
        );
        assert_eq!(results[&ParameterId::new_time_series(ModelPath::root(), "stock[a]", 2)], Value::Real(2.0));
    }

    fn grid_writer(returned: Value) -> DeclarativeModel {
        let grid = Collection::array("grid", vec![2, 2], (0..4).map(|_| Parameter::real(""))).unwrap();
        DeclarativeModel::builder("m")
            .collection(grid)
            .relationship(
                FunctionRelationship::new("fill", move |_| Ok(vec![returned.clone()])).output(Reference::array("grid")),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_array_output_is_distributed_row_major() {
        let rows = Value::List(vec![
            Value::List(vec![Value::Real(1.0), Value::Real(2.0)]),
            Value::List(vec![Value::Real(3.0), Value::Real(4.0)]),
        ]);
        let exec = build_exec_model(&grid_writer(rows), 1).unwrap();
        let results = execute(&exec, &Assignment::new()).unwrap();
        assert_eq!(results[&root("grid[0, 1]")], Value::Real(2.0));
        assert_eq!(results[&root("grid[1, 0]")], Value::Real(3.0));

        let flat = Value::List((0..4).map(|i| Value::Real(i as f64)).collect());
        let exec = build_exec_model(&grid_writer(flat), 1).unwrap();
        let err = execute(&exec, &Assignment::new()).unwrap_err();
        assert!(matches!(err, EvalError::OutputShape { .. }), "{:?}", err);
    }

    #[test]
    fn test_exec_info_values() {
        let model = DeclarativeModel::builder("m")
            .parameter(Parameter::real("progress").time_series())
            .relationship(
                FunctionRelationship::new("clock", |args| {
                    Ok(vec![Value::Real(args.integer("t")? as f64 / args.integer("n")? as f64)])
                })
                .input("t", ExecInfo::Time)
                .input("n", ExecInfo::NTimeSteps)
                .output(Reference::parameter("progress"))
                .at_each_time_step(),
            )
            .build()
            .unwrap();
        let exec = build_exec_model(&model, 4).unwrap();
        let results = execute(&exec, &Assignment::new()).unwrap();
        assert_eq!(
            series(&results, &ModelPath::root(), "progress", 4),
            vec![Value::Real(0.0), Value::Real(0.25), Value::Real(0.5), Value::Real(0.75)]
        );
    }
}
