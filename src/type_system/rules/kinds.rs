//! Rule matching a value variant against the declared parameter kind.
use crate::computation::Value;
use crate::model::ParameterKind;

pub(crate) fn validate(kind: &ParameterKind, value: &Value) -> Result<(), String> {
    let fits = match kind {
        ParameterKind::Boolean => matches!(value, Value::Boolean(_)),
        // Exec-info integers may feed real parameters.
        ParameterKind::Real { .. } => matches!(value, Value::Real(_) | Value::Integer(_)),
        ParameterKind::Categorical { .. } => matches!(value, Value::Category(_)),
        ParameterKind::Structured { .. } => matches!(value, Value::Record(_)),
    };
    if fits {
        Ok(())
    } else {
        Err(format!("expected a {} value, found {}", kind.type_name(), value.kind_name()))
    }
}
