//! Validation pipeline implementation.

use crate::core::error::ValidationReport;
use crate::network::structure::ProcessorNetwork;
use crate::validation::stages::{LinkValidation, PortValidation, StructuralValidation, ValidationStage};

/// Multi-stage validation pipeline.
///
/// Runs a series of validation stages on a network to find problems
/// before it is evaluated.
pub struct ValidationPipeline {
    stages: Vec<Box<dyn ValidationStage>>,
}

impl ValidationPipeline {
    /// Create a new pipeline with the given stages.
    pub fn new(stages: Vec<Box<dyn ValidationStage>>) -> Self {
        Self { stages }
    }

    /// Create the default validation pipeline with all standard stages.
    pub fn default_pipeline() -> Self {
        Self {
            stages: vec![
                Box::new(StructuralValidation),
                Box::new(PortValidation),
                Box::new(LinkValidation),
            ],
        }
    }

    /// Structure only.
    pub fn minimal_pipeline() -> Self {
        Self {
            stages: vec![Box::new(StructuralValidation)],
        }
    }

    /// Add a custom validation stage.
    pub fn add_stage(&mut self, stage: Box<dyn ValidationStage>) {
        self.stages.push(stage);
    }

    /// Validate a network through all stages.
    pub fn validate(&self, network: &ProcessorNetwork) -> ValidationReport {
        let mut report = ValidationReport::new();
        for stage in &self.stages {
            match stage.validate(network) {
                Ok(warnings) => warnings.into_iter().for_each(|w| report.add_warning(w)),
                Err(errors) => {
                    log::debug!("{} found {} error(s)", stage.name(), errors.len());
                    errors.into_iter().for_each(|e| report.add_error(e));
                }
            }
        }
        report
    }

    /// Quick validation - just check if the network can be evaluated.
    pub fn can_execute(&self, network: &ProcessorNetwork) -> bool {
        self.validate(network).can_execute()
    }
}

impl Default for ValidationPipeline {
    fn default() -> Self {
        Self::default_pipeline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;

    #[test]
    fn test_empty_network_warns() {
        let report = ValidationPipeline::default_pipeline().validate(&ProcessorNetwork::new());
        assert!(report.can_execute());
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_valid_chain() {
        let registry = Registry::with_builtins();
        let mut network = ProcessorNetwork::new();
        let source = network.add(&registry, "ImageSource", None).unwrap();
        let canvas = network.add(&registry, "Canvas", None).unwrap();
        network.connect(source, "image.output", canvas, "image.input").unwrap();

        let report = ValidationPipeline::default().validate(&network);
        assert!(report.can_execute());
        assert!(report.warnings.is_empty());
        assert_eq!(report.summary(), "Network is valid");
    }
}
