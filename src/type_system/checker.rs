//! The central checker that applies every rule to an assignment.
use super::error::{ValidationError, ValidationErrorType};
use super::rules::{domain, kinds};
use crate::computation::{Assignment, Value};
use crate::graph::{ExecutionModel, ParameterId};
use crate::model::DeclarativeModel;

pub struct TypeChecker<'a> {
    model: &'a DeclarativeModel,
    exec: &'a ExecutionModel,
}

impl<'a> TypeChecker<'a> {
    pub fn new(model: &'a DeclarativeModel, exec: &'a ExecutionModel) -> Self {
        Self { model, exec }
    }

    /// Checks an input assignment: completeness, unknown ids, then each value.
    pub fn check_inputs(&self, inputs: &Assignment) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        for id in self.exec.input_parameter_ids() {
            if !inputs.contains_key(id) {
                errors.push(ValidationError::new(id, ValidationErrorType::Missing, "required input has no value"));
            }
        }
        for (id, value) in inputs {
            if self.exec.parameter_ids().contains(id) {
                self.check_value(id, value, &mut errors);
            } else {
                errors.push(ValidationError::new(id, ValidationErrorType::Unknown, "not a parameter of the model"));
            }
        }
        finish(errors)
    }

    /// Applies the per-value rules only; usable on evaluation results.
    pub fn check_values(&self, values: &Assignment) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        for (id, value) in values {
            self.check_value(id, value, &mut errors);
        }
        finish(errors)
    }

    fn check_value(&self, id: &ParameterId, value: &Value, errors: &mut Vec<ValidationError>) {
        let Some(parameter) = self.model.find_parameter(id) else {
            errors.push(ValidationError::new(id, ValidationErrorType::Unknown, "no declaration found"));
            return;
        };
        if let Err(msg) = kinds::validate(&parameter.kind, value) {
            errors.push(ValidationError::new(id, ValidationErrorType::KindMismatch, msg));
            return;
        }
        if let Err(msg) = domain::validate(&parameter.kind, value) {
            errors.push(ValidationError::new(id, ValidationErrorType::OutOfDomain, msg));
        }
    }
}

fn finish(errors: Vec<ValidationError>) -> Result<(), Vec<ValidationError>> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
