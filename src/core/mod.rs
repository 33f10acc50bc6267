//! Core types and traits of the processor network.
//!
//! This module contains the building blocks the network is made of:
//! - Property values and properties
//! - Port definitions and payloads
//! - The processor trait and metadata
//! - Error types
//! - The process context

pub mod types;
pub mod port;
pub mod property;
pub mod error;
pub mod context;
pub mod processor;

// Re-export commonly used types
pub use types::{Interval, SelectionEntry, Value, ValueKind};
pub use port::{CoprocessorFn, Payload, Port, PortDefinition, PortDirection, PortKind, Volume};
pub use property::{ObserverId, OptionItem, Property, PropertyChange};
pub use error::{
    ConnectionId, DocumentError, LinkError, LinkId, NetworkError, ProcessError, ProcessorId,
    PropertyError, RegistryError, VoreenError,
};
pub use context::ProcessContext;
pub use processor::{
    Category, InvalidationLevel, LifecycleState, PassthroughProcessor, Processor,
    ProcessorMetadata,
};
