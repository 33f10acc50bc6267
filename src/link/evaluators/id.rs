//! Identity evaluator with conversions inside the scalar and vector groups.

use crate::core::error::LinkError;
use crate::core::property::Property;
use crate::core::types::{Value, ValueKind};
use crate::link::evaluator::{accept_or_keep, incompatible, LinkEvaluator, LinkInput};

/// Copies the source value to the destination.
///
/// Bool, int, float and string convert into each other; a string that
/// does not parse keeps the old target. Int and float vectors convert into
/// each other, copying the shared components and keeping the rest.
/// Option, file path and selection values only link to the same kind.
#[derive(Debug, Clone, Default)]
pub struct IdEvaluator;

impl LinkEvaluator for IdEvaluator {
    fn class_name(&self) -> &'static str {
        "id"
    }

    fn display_name(&self) -> &'static str {
        "Identity"
    }

    fn are_linkable(&self, source: &Property, destination: &Property) -> bool {
        let (s, d) = (source.kind(), destination.kind());
        s == d || (s.is_scalar() && d.is_scalar()) || (s.is_vector() && d.is_vector())
    }

    fn eval(&self, input: &LinkInput) -> Result<Value, LinkError> {
        if !self.are_linkable(input.source, input.destination) {
            return Err(incompatible(self, input));
        }
        let target = input.destination.get();
        let candidate = convert(input.source.get(), target).unwrap_or_else(|| target.clone());
        Ok(accept_or_keep(input.destination, candidate))
    }

    fn create(&self) -> Box<dyn LinkEvaluator> {
        Box::new(IdEvaluator)
    }

    fn clone_box(&self) -> Box<dyn LinkEvaluator> {
        Box::new(self.clone())
    }
}

/// Convert `value` to the kind of `target`. `None` when the value has no
/// representation in that kind.
pub(crate) fn convert(value: &Value, target: &Value) -> Option<Value> {
    let kind = target.kind();
    if value.kind() == kind {
        return Some(value.clone());
    }
    match kind {
        ValueKind::Bool => to_bool(value).map(Value::Bool),
        ValueKind::Int => to_float(value).map(|f| Value::Int(f.round() as i64)),
        ValueKind::Float => to_float(value).map(Value::Float),
        ValueKind::String => Some(Value::String(value.to_string())),
        k if k.is_vector() => {
            let components = value.components()?;
            let fill = target.components().unwrap_or_default();
            Value::from_components(k, &components, &fill)
        }
        _ => None,
    }
}

fn to_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Int(i) => Some(*i != 0),
        Value::Float(f) => Some(*f != 0.0),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn to_float(value: &Value) -> Option<f64> {
    match value {
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Int(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}
