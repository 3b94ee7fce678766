//! Shared model fixtures for the unit tests.

use crate::computation::{Assignment, Value, ValueError};
use crate::graph::{ModelPath, ParameterId};
use crate::model::{
    Collection, DeclarativeModel, FunctionRelationship, Parameter, Reference, SubModelRelationship,
};

fn root(name: &str) -> ParameterId {
    ParameterId::new_static(ModelPath::root(), name)
}

/// `y = x^2`.
pub fn square_model() -> DeclarativeModel {
    DeclarativeModel::builder("square")
        .parameter(Parameter::real("x"))
        .parameter(Parameter::real("y"))
        .relationship(
            FunctionRelationship::new("square", |args| {
                let x = args.real("x")?;
                Ok(vec![Value::Real(x * x)])
            })
            .input("x", Reference::parameter("x"))
            .output(Reference::parameter("y"))
            .with_body("y = x ** 2"),
        )
        .build()
        .expect("square model")
}

/// `y = a0 + a1 * x + a2 * x^2`, with the square computed by an embedded `square_model`.
pub fn polynomial_model() -> DeclarativeModel {
    let square_term = SubModelRelationship::new("calc_square_term", square_model())
        .input(Reference::parameter("x"), Reference::parameter("x"))
        .output(Reference::parameter("y"), Reference::parameter("x_squared"));
    DeclarativeModel::builder("polynomial")
        .parameter(Parameter::real("a0"))
        .parameter(Parameter::real("a1"))
        .parameter(Parameter::real("a2"))
        .parameter(Parameter::real("x"))
        .parameter(Parameter::real("x_squared"))
        .parameter(Parameter::real("y"))
        .relationship(square_term)
        .relationship(
            FunctionRelationship::new("polynomial", |args| {
                let y = args.real("a0")? + args.real("a1")? * args.real("x")? + args.real("a2")? * args.real("x_squared")?;
                Ok(vec![Value::Real(y)])
            })
            .input("a0", Reference::parameter("a0"))
            .input("a1", Reference::parameter("a1"))
            .input("a2", Reference::parameter("a2"))
            .input("x", Reference::parameter("x"))
            .input("x_squared", Reference::parameter("x_squared"))
            .output(Reference::parameter("y")),
        )
        .build()
        .expect("polynomial model")
}

pub fn polynomial_inputs() -> Assignment {
    Assignment::from([
        (root("a0"), Value::Real(1.0)),
        (root("a1"), Value::Real(2.0)),
        (root("a2"), Value::Real(3.0)),
        (root("x"), Value::Real(4.0)),
    ])
}

/// The polynomial with its coefficients held in an array collection `a`.
pub fn array_polynomial_model() -> DeclarativeModel {
    let coefficients = Collection::array("a", vec![3], (0..3).map(|_| Parameter::real(""))).expect("array");
    DeclarativeModel::builder("array_polynomial")
        .parameter(Parameter::real("x"))
        .parameter(Parameter::real("y"))
        .collection(coefficients)
        .relationship(
            FunctionRelationship::new("polynomial", |args| {
                let x = args.real("x")?;
                let y = args.reals("a")?.iter().rev().fold(0.0, |acc, a| acc * x + a);
                Ok(vec![Value::Real(y)])
            })
            .input("a", Reference::array("a"))
            .input("x", Reference::parameter("x"))
            .output(Reference::parameter("y")),
        )
        .build()
        .expect("array polynomial model")
}

fn invalid(what: &str, a: &str, b: &str) -> ValueError {
    ValueError::invalid(format!("invalid {} combination: {}, {}", what, a, b))
}

/// A four-state decision process: start, then left or right, then end.
pub fn diamond_mdp_model() -> DeclarativeModel {
    let action_selection = FunctionRelationship::new("action_selection", |args| {
        let action = match (args.category("location")?, args.category("policy")?) {
            ("start", "left") => "go_left",
            ("start", "right") => "go_right",
            ("left", "left") | ("right", "right") => "move_forward",
            ("end", _) => "none",
            (location, policy) => return Err(invalid("policy and location", policy, location)),
        };
        Ok(vec![Value::category(action)])
    })
    .input("policy", Reference::parameter("policy"))
    .input("location", Reference::parameter("location"))
    .output(Reference::parameter("action"))
    .at_each_time_step();

    let state_transition = FunctionRelationship::new("state_transition", |args| {
        let next = match (args.category("location")?, args.category("action")?) {
            ("start", "go_left") => "left",
            ("start", "go_right") => "right",
            ("left", "move_forward") | ("right", "move_forward") => "end",
            ("end", _) => "end",
            (location, action) => return Err(invalid("location and action", location, action)),
        };
        Ok(vec![Value::category(next)])
    })
    .input("location", Reference::parameter("location"))
    .input("action", Reference::parameter("action"))
    .output(Reference::parameter("location").next())
    .at_each_time_step();

    let reward_function = FunctionRelationship::new("reward_function", |args| {
        let reached = args.category("previous_location")? != "end" && args.category("location")? == "end";
        Ok(vec![Value::Real(if reached { 1.0 } else { 0.0 })])
    })
    .input("previous_location", Reference::parameter("location").previous())
    .input("action", Reference::parameter("action").previous())
    .input("location", Reference::parameter("location"))
    .output(Reference::parameter("reward"))
    .at_each_time_step();

    let initial_reward = FunctionRelationship::new("initial_reward", |_| Ok(vec![Value::Real(0.0)]))
        .output(Reference::parameter("reward").initial());

    let cumulative_reward = FunctionRelationship::new("cumulative_reward_calculation", |args| {
        Ok(vec![Value::Real(args.reals("reward")?.iter().sum())])
    })
    .input("reward", Reference::parameter("reward").all_time_steps())
    .output(Reference::parameter("cumulative_reward"));

    DeclarativeModel::builder("diamond_mdp")
        .parameter(Parameter::categorical("policy", ["left", "right"]))
        .parameter(Parameter::categorical("location", ["start", "left", "right", "end"]).time_series())
        .parameter(Parameter::categorical("action", ["go_left", "go_right", "move_forward", "none"]).time_series())
        .parameter(Parameter::real("reward").time_series())
        .parameter(Parameter::real("cumulative_reward"))
        .relationship(action_selection)
        .relationship(state_transition)
        .relationship(reward_function)
        .relationship(initial_reward)
        .relationship(cumulative_reward)
        .build()
        .expect("diamond mdp model")
}

pub fn diamond_mdp_inputs() -> Assignment {
    Assignment::from([
        (root("policy"), Value::category("left")),
        (ParameterId::new_time_series(ModelPath::root(), "location", 0), Value::category("start")),
    ])
}

/// Squares a time series step by step through a per-step sub-model.
///
/// The static `scale` boundary is mapped again at every step.
pub fn stepwise_square_model() -> DeclarativeModel {
    let scaled_square = DeclarativeModel::builder("scaled_square")
        .parameter(Parameter::real("scale"))
        .parameter(Parameter::real("x").time_series())
        .parameter(Parameter::real("y").time_series())
        .relationship(
            FunctionRelationship::new("square", |args| {
                let x = args.real("x")?;
                Ok(vec![Value::Real(args.real("scale")? * x * x)])
            })
            .input("scale", Reference::parameter("scale"))
            .input("x", Reference::parameter("x"))
            .output(Reference::parameter("y"))
            .at_each_time_step(),
        )
        .build()
        .expect("scaled square model");

    DeclarativeModel::builder("stepwise_square")
        .parameter(Parameter::real("scale"))
        .parameter(Parameter::real("s").time_series())
        .parameter(Parameter::real("s_squared").time_series())
        .relationship(
            SubModelRelationship::new("square_each_step", scaled_square)
                .input(Reference::parameter("scale"), Reference::parameter("scale"))
                .input(Reference::parameter("x"), Reference::parameter("s"))
                .output(Reference::parameter("y"), Reference::parameter("s_squared"))
                .at_each_time_step(),
        )
        .build()
        .expect("stepwise square model")
}

pub fn stepwise_square_inputs(series: &[f64]) -> Assignment {
    let mut inputs = Assignment::from([(root("scale"), Value::Real(1.0))]);
    for (t, &v) in series.iter().enumerate() {
        inputs.insert(ParameterId::new_time_series(ModelPath::root(), "s", t), Value::Real(v));
    }
    inputs
}
