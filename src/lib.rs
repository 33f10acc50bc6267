//! # Voreen - Processor Networks
//!
//! Voreen builds data-flow networks of processors connected by typed ports.
//! Processor properties can be linked so that changing one updates others,
//! and whole networks are saved to and loaded from JSON documents.
//!
//! ## Features
//!
//! - **Typed ports**: render images, volumes, generic values and coprocessor callables
//! - **Property links**: pluggable evaluators with a per-pass cycle guard
//! - **Registries**: processors and evaluators created by class name, filled from modules
//! - **Incremental evaluation**: only invalid processors and their consumers run
//! - **Documents**: versioned, all-or-nothing network loading
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use voreen::prelude::*;
//!
//! let registry = Registry::with_builtins();
//! let mut network = ProcessorNetwork::new();
//!
//! let source = network.add(&registry, "ImageSource", None)?;
//! let blur = network.add(&registry, "Blur", None)?;
//! let canvas = network.add(&registry, "Canvas", None)?;
//! network.connect(source, "image.output", blur, "image.input")?;
//! network.connect(blur, "image.output", canvas, "image.input")?;
//!
//! // Keep the source square
//! let width = network.key("ImageSource", "width")?;
//! let height = network.key("ImageSource", "height")?;
//! network.link_with(&registry, width, height, None)?;
//!
//! let mut evaluator = NetworkEvaluator::new();
//! let report = evaluator.process(&mut network)?;
//!
//! NetworkDocument::from_network(&network).save("network.json")?;
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: values, properties, ports, the processor trait and errors
//! - [`link`]: property links and link evaluators
//! - [`registry`]: processor and evaluator factories and modules
//! - [`processors`]: built-in processors of the `base` module
//! - [`network`]: network structure, ordering and documents
//! - [`execution`]: the network evaluator
//! - [`validation`]: pre-evaluation checks
//! - [`config`]: TOML engine configuration

#![warn(clippy::all)]

pub mod config;
pub mod core;
pub mod execution;
pub mod link;
pub mod network;
pub mod processors;
pub mod registry;
pub mod validation;

/// Prelude module for convenient imports.
///
/// Import everything commonly needed with:
/// ```rust,ignore
/// use voreen::prelude::*;
/// ```
pub mod prelude {
    // Values and properties
    pub use crate::core::property::{ObserverId, Property, PropertyChange};
    pub use crate::core::types::{SelectionEntry, Value, ValueKind};

    // Processors and ports
    pub use crate::core::context::ProcessContext;
    pub use crate::core::port::{Payload, PortDefinition, PortKind, Volume};
    pub use crate::core::processor::{
        Category, InvalidationLevel, LifecycleState, Processor, ProcessorMetadata,
    };

    // Errors
    pub use crate::core::error::{
        ConnectionId, DocumentError, LinkError, LinkId, NetworkError, NetworkResult, ProcessError,
        ProcessResult, ProcessorId, PropertyError, RegistryError, ValidationReport, VoreenError,
        VoreenResult,
    };

    // Links
    pub use crate::link::{LinkEvaluator, LinkInput, PropertyKey, PropertyLink};

    // Registries
    pub use crate::registry::{Module, Registry};

    // Network
    pub use crate::network::{
        NetworkDocument, NetworkObserver, ProcessorNetwork, PropagationReport, TopologyAnalyzer,
    };

    // Evaluation and validation
    pub use crate::execution::{
        CancelHandle, EvaluationReport, EvaluatorOptions, NetworkEvaluator, ProgressUpdate,
    };
    pub use crate::validation::ValidationPipeline;

    pub use crate::config::EngineConfig;
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
