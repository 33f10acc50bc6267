//! Evaluator mapping the relative position inside the source bounds onto
//! the destination bounds.

use crate::core::error::LinkError;
use crate::core::property::Property;
use crate::core::types::{Value, ValueKind};
use crate::link::evaluator::{accept_or_keep, incompatible, LinkEvaluator, LinkInput};

/// Normalized identity.
///
/// A source at 25% of its range puts the destination at 25% of its range.
/// Bool sources map to the destination minimum or maximum, bool
/// destinations become true once the source reaches the middle of its
/// range. A source with an empty range maps to the destination minimum.
#[derive(Debug, Clone, Default)]
pub struct IdNormalizedEvaluator;

impl LinkEvaluator for IdNormalizedEvaluator {
    fn class_name(&self) -> &'static str {
        "id_normalized"
    }

    fn display_name(&self) -> &'static str {
        "Normalized Identity"
    }

    fn are_linkable(&self, source: &Property, destination: &Property) -> bool {
        let bounded = |p: &Property| p.kind() == ValueKind::Bool || p.bounds().is_some();
        let (s, d) = (source.kind(), destination.kind());
        let scalar = |k: ValueKind| k.is_numeric() || k == ValueKind::Bool;
        let kinds = (scalar(s) && scalar(d)) || (s.is_vector() && d.is_vector());
        kinds && bounded(source) && bounded(destination)
    }

    fn eval(&self, input: &LinkInput) -> Result<Value, LinkError> {
        if !self.are_linkable(input.source, input.destination) {
            return Err(incompatible(self, input));
        }
        let source = input.source;
        let destination = input.destination;
        let target = destination.get();

        let candidate = match (source.get(), target) {
            (Value::Bool(b), Value::Bool(_)) => Some(Value::Bool(*b)),
            (Value::Bool(b), _) => destination
                .bounds()
                .map(|(lo, hi)| if *b { hi.clone() } else { lo.clone() }),
            (value, Value::Bool(_)) => match (value.as_float(), scalar_bounds(source)) {
                (Some(v), Some((lo, hi))) => Some(Value::Bool(v >= lo + (hi - lo) / 2.0)),
                _ => None,
            },
            (value, Value::Int(_)) => map_scalar(value, source, destination)
                .map(|v| Value::Int(v.round() as i64)),
            (value, Value::Float(_)) => map_scalar(value, source, destination).map(Value::Float),
            (value, target) => map_vector(value, target, source, destination),
        };
        Ok(accept_or_keep(
            destination,
            candidate.unwrap_or_else(|| target.clone()),
        ))
    }

    fn create(&self) -> Box<dyn LinkEvaluator> {
        Box::new(IdNormalizedEvaluator)
    }

    fn clone_box(&self) -> Box<dyn LinkEvaluator> {
        Box::new(self.clone())
    }
}

fn scalar_bounds(property: &Property) -> Option<(f64, f64)> {
    let (lo, hi) = property.bounds()?;
    Some((lo.as_float()?, hi.as_float()?))
}

fn vector_bounds(property: &Property) -> Option<(Vec<f64>, Vec<f64>)> {
    let (lo, hi) = property.bounds()?;
    Some((lo.components()?, hi.components()?))
}

/// Map `v` from [s_lo, s_hi] onto [d_lo, d_hi].
fn remap(v: f64, s_lo: f64, s_hi: f64, d_lo: f64, d_hi: f64) -> f64 {
    let range = s_hi - s_lo;
    if range == 0.0 {
        return d_lo;
    }
    d_lo + (v - s_lo) * (d_hi - d_lo) / range
}

fn map_scalar(value: &Value, source: &Property, destination: &Property) -> Option<f64> {
    let v = value.as_float()?;
    let (s_lo, s_hi) = scalar_bounds(source)?;
    let (d_lo, d_hi) = scalar_bounds(destination)?;
    Some(remap(v, s_lo, s_hi, d_lo, d_hi))
}

fn map_vector(
    value: &Value,
    target: &Value,
    source: &Property,
    destination: &Property,
) -> Option<Value> {
    let v = value.components()?;
    let (s_lo, s_hi) = vector_bounds(source)?;
    let (d_lo, d_hi) = vector_bounds(destination)?;
    let mapped: Vec<f64> = (0..v.len().min(d_lo.len()))
        .map(|i| remap(v[i], s_lo[i], s_hi[i], d_lo[i], d_hi[i]))
        .collect();
    let fill = target.components().unwrap_or_default();
    Value::from_components(target.kind(), &mapped, &fill)
}
