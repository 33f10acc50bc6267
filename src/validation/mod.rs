//! Validation module for pre-evaluation checking.
//!
//! The validation pipeline runs before evaluation to catch problems early.

pub mod pipeline;
pub mod stages;

pub use pipeline::ValidationPipeline;
pub use stages::{LinkValidation, PortValidation, StructuralValidation, ValidationStage};
