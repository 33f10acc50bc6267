//! Affine evaluator: `destination = source * scale + offset`.

use crate::core::error::LinkError;
use crate::core::property::Property;
use crate::core::types::Value;
use crate::link::evaluator::{
    accept_or_keep, decode_parameters, incompatible, LinkEvaluator, LinkInput,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
struct AffineParameters {
    #[serde(default = "one")]
    scale: f64,
    #[serde(default)]
    offset: f64,
}

fn one() -> f64 {
    1.0
}

/// Scales and offsets numeric values.
///
/// Links int and float scalars in any combination, and vectors of equal
/// dimension component-wise. Integer destinations are rounded.
#[derive(Debug, Clone, PartialEq)]
pub struct AffineEvaluator {
    scale: f64,
    offset: f64,
}

impl AffineEvaluator {
    pub fn new(scale: f64, offset: f64) -> Self {
        Self { scale, offset }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    fn apply(&self, v: f64) -> f64 {
        v * self.scale + self.offset
    }
}

impl Default for AffineEvaluator {
    fn default() -> Self {
        Self::new(1.0, 0.0)
    }
}

impl LinkEvaluator for AffineEvaluator {
    fn class_name(&self) -> &'static str {
        "affine"
    }

    fn display_name(&self) -> &'static str {
        "Affine"
    }

    fn are_linkable(&self, source: &Property, destination: &Property) -> bool {
        let (s, d) = (source.kind(), destination.kind());
        (s.is_numeric() && d.is_numeric())
            || (s.is_vector() && d.is_vector() && s.dimension() == d.dimension())
    }

    fn eval(&self, input: &LinkInput) -> Result<Value, LinkError> {
        if !self.are_linkable(input.source, input.destination) {
            return Err(incompatible(self, input));
        }
        let target = input.destination.get();
        let source = input.source.get();
        let candidate = match target {
            Value::Int(_) => source.as_float().map(|v| Value::Int(self.apply(v).round() as i64)),
            Value::Float(_) => source.as_float().map(|v| Value::Float(self.apply(v))),
            _ => source.components().and_then(|c| {
                let mapped: Vec<f64> = c.iter().map(|v| self.apply(*v)).collect();
                Value::from_components(target.kind(), &mapped, &[])
            }),
        };
        // Non-finite results (huge scale) keep the old target
        let candidate = candidate.filter(|v| match v {
            Value::Float(f) => f.is_finite(),
            other => other.components().map_or(true, |c| c.iter().all(|f| f.is_finite())),
        });
        Ok(accept_or_keep(
            input.destination,
            candidate.unwrap_or_else(|| target.clone()),
        ))
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({ "scale": self.scale, "offset": self.offset })
    }

    fn configure(&mut self, parameters: &serde_json::Value) -> Result<(), LinkError> {
        if parameters.is_null() {
            return Ok(());
        }
        let decoded: AffineParameters = decode_parameters(self.class_name(), parameters)?;
        self.scale = decoded.scale;
        self.offset = decoded.offset;
        Ok(())
    }

    fn create(&self) -> Box<dyn LinkEvaluator> {
        Box::new(AffineEvaluator::default())
    }

    fn clone_box(&self) -> Box<dyn LinkEvaluator> {
        Box::new(self.clone())
    }
}
