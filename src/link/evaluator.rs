//! The link evaluator trait.
//!
//! An evaluator computes the new destination value of a link from the
//! source's old and new value and the destination's current value. It is
//! addressed by class name so documents can persist it.

use crate::core::error::LinkError;
use crate::core::property::Property;
use crate::core::types::Value;

/// Inputs of one link evaluation.
///
/// `source` already holds the new value, `destination` still holds the old
/// target value.
pub struct LinkInput<'a> {
    pub source: &'a Property,
    pub old_source: &'a Value,
    pub destination: &'a Property,
}

/// Strategy computing link targets.
///
/// `are_linkable` must agree with `eval`: when it holds for two properties,
/// `eval` succeeds for every value the properties can legally hold, and the
/// result is accepted by the destination.
pub trait LinkEvaluator {
    /// Name used by factories and documents.
    fn class_name(&self) -> &'static str;

    /// Human-readable name.
    fn display_name(&self) -> &'static str {
        self.class_name()
    }

    /// Whether a link from `source` to `destination` can be evaluated.
    fn are_linkable(&self, source: &Property, destination: &Property) -> bool;

    /// Compute the new destination value.
    fn eval(&self, input: &LinkInput) -> Result<Value, LinkError>;

    /// Evaluator-specific parameters, `Null` when there are none.
    fn parameters(&self) -> serde_json::Value {
        serde_json::Value::Null
    }

    /// Restore parameters written by [`parameters`](Self::parameters).
    fn configure(&mut self, _parameters: &serde_json::Value) -> Result<(), LinkError> {
        Ok(())
    }

    /// Fresh instance with default parameters.
    fn create(&self) -> Box<dyn LinkEvaluator>;

    /// Copy including parameters.
    fn clone_box(&self) -> Box<dyn LinkEvaluator>;
}

impl Clone for Box<dyn LinkEvaluator> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

impl std::fmt::Debug for dyn LinkEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkEvaluator")
            .field("class_name", &self.class_name())
            .field("parameters", &self.parameters())
            .finish()
    }
}

/// `candidate` if the destination accepts it, otherwise its current value.
pub fn accept_or_keep(destination: &Property, candidate: Value) -> Value {
    destination
        .validate(candidate)
        .unwrap_or_else(|_| destination.get().clone())
}

/// Error for a link the evaluator cannot handle.
pub(crate) fn incompatible(evaluator: &dyn LinkEvaluator, input: &LinkInput) -> LinkError {
    LinkError::Incompatible {
        evaluator: evaluator.class_name().to_string(),
        src: input.source.kind(),
        dst: input.destination.kind(),
    }
}

/// Decode serde parameters, mapping failures to `InvalidParameters`.
pub(crate) fn decode_parameters<T: serde::de::DeserializeOwned>(
    evaluator: &str,
    parameters: &serde_json::Value,
) -> Result<T, LinkError> {
    serde_json::from_value(parameters.clone()).map_err(|e| LinkError::InvalidParameters {
        evaluator: evaluator.to_string(),
        reason: e.to_string(),
    })
}
