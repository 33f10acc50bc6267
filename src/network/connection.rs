//! Connection types for the network.

use crate::core::error::{ConnectionId, ProcessorId};
use serde::{Deserialize, Serialize};

/// An endpoint of a connection (processor + port).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub processor: ProcessorId,
    pub port: String,
}

impl Endpoint {
    /// Create a new endpoint.
    pub fn new(processor: ProcessorId, port: impl Into<String>) -> Self {
        Self {
            processor,
            port: port.into(),
        }
    }
}

/// A connection from an outport to an inport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub id: ConnectionId,
    /// Source endpoint (outport).
    pub from: Endpoint,
    /// Target endpoint (inport).
    pub to: Endpoint,
    /// Coprocessor or feedback edge, ignored by evaluation ordering.
    pub exempt: bool,
}

impl Connection {
    /// Create a new connection.
    pub fn new(from: Endpoint, to: Endpoint, exempt: bool) -> Self {
        Self {
            id: ConnectionId::new(),
            from,
            to,
            exempt,
        }
    }

    /// Whether either end belongs to `processor`.
    pub fn involves(&self, processor: ProcessorId) -> bool {
        self.from.processor == processor || self.to.processor == processor
    }

    /// Same outport and inport.
    pub fn joins(&self, from: &Endpoint, to: &Endpoint) -> bool {
        &self.from == from && &self.to == to
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection() {
        let a = ProcessorId::new();
        let b = ProcessorId::new();

        let conn = Connection::new(Endpoint::new(a, "image.output"), Endpoint::new(b, "image.input"), false);

        assert!(conn.involves(a));
        assert!(conn.involves(b));
        assert!(!conn.involves(ProcessorId::new()));
        assert!(conn.joins(&Endpoint::new(a, "image.output"), &Endpoint::new(b, "image.input")));
        assert!(!conn.exempt);
    }
}
