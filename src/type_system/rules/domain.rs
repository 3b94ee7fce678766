//! Rule checking a well-kinded value against bounds and category sets.
use crate::computation::Value;
use crate::model::ParameterKind;

pub(crate) fn validate(kind: &ParameterKind, value: &Value) -> Result<(), String> {
    match (kind, value) {
        (ParameterKind::Real { lower_bound, upper_bound, .. }, value) => {
            let Ok(v) = value.as_real() else { return Ok(()) };
            if let Some(lo) = *lower_bound {
                if v.is_nan() || v < lo {
                    return Err(format!("{} is below the lower bound {}", v, lo));
                }
            }
            if let Some(hi) = *upper_bound {
                if v.is_nan() || v > hi {
                    return Err(format!("{} is above the upper bound {}", v, hi));
                }
            }
            Ok(())
        }
        (ParameterKind::Categorical { categories }, Value::Category(tag)) => {
            if categories.iter().any(|c| c == tag) {
                Ok(())
            } else {
                Err(format!("'{}' is not one of {:?}", tag, categories))
            }
        }
        _ => Ok(()),
    }
}
