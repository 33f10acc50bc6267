//! Individual validation stages.
//!
//! Each stage checks for a specific category of problems.

use crate::core::error::ValidationIssue;
use crate::core::processor::LifecycleState;
use crate::link::property_link::PropertyKey;
use crate::network::structure::ProcessorNetwork;
use crate::network::topology::TopologyAnalyzer;
use std::collections::HashMap;

/// Trait for validation stages.
pub trait ValidationStage {
    /// Name of this validation stage.
    fn name(&self) -> &str;

    /// Validate the network.
    ///
    /// Returns Ok with warnings, or Err with errors.
    fn validate(&self, network: &ProcessorNetwork) -> Result<Vec<ValidationIssue>, Vec<ValidationIssue>>;
}

fn finish(
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
) -> Result<Vec<ValidationIssue>, Vec<ValidationIssue>> {
    if errors.is_empty() {
        Ok(warnings)
    } else {
        Err(errors)
    }
}

/// Structural validation - checks network structure.
///
/// Verifies:
/// - Data connections form no cycle
/// - No processor is stuck in the Failed state
pub struct StructuralValidation;

impl ValidationStage for StructuralValidation {
    fn name(&self) -> &str {
        "Structural Validation"
    }

    fn validate(&self, network: &ProcessorNetwork) -> Result<Vec<ValidationIssue>, Vec<ValidationIssue>> {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if network.is_empty() {
            warnings.push(
                ValidationIssue::new("Network is empty")
                    .suggest("Add processors to build a pipeline"),
            );
            return Ok(warnings);
        }

        let analyzer = TopologyAnalyzer::new(network);
        for id in analyzer.cycle_members() {
            errors.push(
                ValidationIssue::new("Processor is part of a connection cycle")
                    .on(network.name_of(id))
                    .suggest("Break the cycle or route it through a feedback inport"),
            );
        }

        for node in network.processors() {
            if node.state() == LifecycleState::Failed {
                warnings.push(
                    ValidationIssue::new("Processor failed and will be skipped")
                        .on(node.name())
                        .suggest("Reinitialize the network"),
                );
            }
        }

        finish(errors, warnings)
    }
}

/// Port validation - checks that required inputs can receive data.
pub struct PortValidation;

impl ValidationStage for PortValidation {
    fn name(&self) -> &str {
        "Port Validation"
    }

    fn validate(&self, network: &ProcessorNetwork) -> Result<Vec<ValidationIssue>, Vec<ValidationIssue>> {
        let mut warnings = Vec::new();

        for node in network.processors() {
            for port in node.required_inports() {
                let connected = network
                    .connections_to(node.id())
                    .any(|c| c.to.port == port);
                if !connected {
                    warnings.push(
                        ValidationIssue::new(format!("Required inport '{}' is not connected", port))
                            .on(node.name())
                            .suggest("The processor is skipped until the port receives data"),
                    );
                }
            }
        }

        if !network.is_empty() && !network.processors().any(|n| n.is_end_processor()) {
            warnings.push(
                ValidationIssue::new("Network has no end processor")
                    .suggest("Add a Canvas to display results"),
            );
        }

        Ok(warnings)
    }
}

/// Link validation - checks property links.
///
/// Verifies:
/// - Every link's evaluator still accepts its properties
/// - Properties driven by several links are reported
pub struct LinkValidation;

impl ValidationStage for LinkValidation {
    fn name(&self) -> &str {
        "Link Validation"
    }

    fn validate(&self, network: &ProcessorNetwork) -> Result<Vec<ValidationIssue>, Vec<ValidationIssue>> {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let label = |key: &PropertyKey| format!("{}.{}", network.name_of(key.processor), key.property);

        for link in network.links() {
            let linkable = match (network.property(link.source()), network.property(link.destination())) {
                (Ok(src), Ok(dst)) => link.evaluator().are_linkable(src, dst),
                _ => false,
            };
            if !linkable {
                errors.push(
                    ValidationIssue::new(format!(
                        "Link {} -> {} is not valid for evaluator '{}'",
                        label(link.source()),
                        label(link.destination()),
                        link.evaluator().class_name()
                    ))
                    .on(network.name_of(link.destination().processor))
                    .suggest("Remove the link or choose another evaluator"),
                );
            }
        }

        let mut writers: HashMap<&PropertyKey, usize> = HashMap::new();
        for link in network.links() {
            *writers.entry(link.destination()).or_default() += 1;
        }
        let mut driven: Vec<(&PropertyKey, usize)> = writers.into_iter().filter(|(_, n)| *n > 1).collect();
        driven.sort_by_key(|(key, _)| label(*key));
        for (key, count) in driven {
            warnings.push(
                ValidationIssue::new(format!("Property {} is the destination of {} links", label(key), count))
                    .on(network.name_of(key.processor))
                    .suggest("Only the first link reaching it in a pass takes effect"),
            );
        }

        finish(errors, warnings)
    }
}
