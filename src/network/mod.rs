//! Processor network: structure, ordering and documents.
//!
//! Processors are connected through typed ports and their properties are
//! wired together with links.

pub mod connection;
pub mod node;
pub mod observer;
pub mod serialization;
pub mod structure;
pub mod topology;

pub use connection::{Connection, Endpoint};
pub use node::ProcessorNode;
pub use observer::NetworkObserver;
pub use serialization::{
    ConnectionEntry, LinkEntry, NetworkDocument, PortRef, ProcessorEntry, PropertyRef,
};
pub use structure::{NetworkMetadata, PropagationFailure, PropagationReport, ProcessorNetwork};
pub use topology::TopologyAnalyzer;
