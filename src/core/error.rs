//! Error types for Voreen.
//!
//! Uses thiserror for structured errors with context. Errors are designed to:
//! - Name the offending processor, port, property or link so a network
//!   document can be repaired by hand
//! - Be reported without partially applying the failed change
//! - Support conversion into the top-level [`VoreenError`]

use crate::core::port::PortKind;
use crate::core::types::ValueKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for a processor inside a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProcessorId(pub Uuid);

impl ProcessorId {
    /// Create a new random processor ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ProcessorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProcessorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// Unique identifier for a port connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Create a new random connection ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// Unique identifier for a property link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkId(pub Uuid);

impl LinkId {
    /// Create a new random link ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LinkId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// Top-level error type for Voreen.
///
/// This enum encompasses all error categories and enables automatic
/// conversion between specific error types.
#[derive(Error, Debug)]
pub enum VoreenError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Property error: {0}")]
    Property(#[from] PropertyError),

    #[error("Link error: {0}")]
    Link(#[from] LinkError),

    #[error("Process error: {0}")]
    Process(#[from] ProcessError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),
}

/// Errors related to network structure and operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NetworkError {
    #[error("Unknown class '{class}' (referenced by '{entry}')")]
    UnknownClass { class: String, entry: String },

    #[error("Cycle detected in network involving processors: {processors:?}")]
    NetworkCycle { processors: Vec<String> },

    #[error("Cannot connect {from} ({from_kind}) to {to} ({to_kind})")]
    IncompatibleKind {
        from: String,
        to: String,
        from_kind: PortKind,
        to_kind: PortKind,
    },

    #[error("Properties {src} and {dst} cannot be linked with evaluator '{evaluator}'")]
    LinkIncompatible {
        src: String,
        dst: String,
        evaluator: String,
    },

    #[error("Port {port} is already connected")]
    AlreadyConnected { port: String },

    #[error("Processor '{processor}' failed to initialize: {reason}")]
    ProcessorInitFailed { processor: String, reason: String },

    #[error("Processor '{0}' not found")]
    ProcessorNotFound(String),

    #[error("Port '{port}' not found on processor '{processor}'")]
    PortNotFound { processor: String, port: String },

    #[error("Property '{property}' not found on processor '{processor}'")]
    PropertyNotFound { processor: String, property: String },

    #[error("Port {port} is not an {expected}")]
    WrongDirection { port: String, expected: &'static str },

    #[error("Processor name '{0}' is already used in the network")]
    DuplicateName(String),

    #[error("Processor name must not be empty")]
    EmptyName,

    #[error("Properties {src} and {dst} are already linked")]
    AlreadyLinked { src: String, dst: String },

    #[error("Property {0} cannot be linked with itself")]
    SelfLink(String),

    #[error("Link {0} not found")]
    LinkNotFound(LinkId),

    #[error(transparent)]
    Property(#[from] PropertyError),

    #[error(transparent)]
    Link(#[from] LinkError),
}

/// Errors raised by property writes.
///
/// Both variants are programming errors on the caller's side: they are
/// reported at the `set` call and the stored value stays untouched.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyError {
    #[error("Property '{property}' holds {expected} values, got {got}")]
    TypeMismatch {
        property: String,
        expected: ValueKind,
        got: ValueKind,
    },

    #[error("Property '{property}' has no option '{option}'")]
    InvalidOption { property: String, option: String },
}

/// Errors raised by link evaluators.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LinkError {
    #[error("Evaluator '{evaluator}' cannot link {src} to {dst}")]
    Incompatible {
        evaluator: String,
        src: ValueKind,
        dst: ValueKind,
    },

    #[error("Invalid parameters for evaluator '{evaluator}': {reason}")]
    InvalidParameters { evaluator: String, reason: String },
}

/// Errors raised while a processor runs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProcessError {
    #[error("Missing input on port '{0}'")]
    MissingInput(String),

    #[error("Unknown port '{0}'")]
    UnknownPort(String),

    #[error("Unknown property '{0}'")]
    UnknownProperty(String),

    #[error("Property '{property}' is not a {expected} property")]
    WrongPropertyKind {
        property: String,
        expected: ValueKind,
    },

    #[error("Port '{port}' carries {expected} data, got {got}")]
    PayloadKind {
        port: String,
        expected: PortKind,
        got: PortKind,
    },

    #[error("Processor is not initialized")]
    NotInitialized,

    #[error("Coprocessor call failed: {0}")]
    Coprocessor(String),

    #[error("Missing resource: {0}")]
    MissingResource(String),

    #[error("{0}")]
    Failed(String),
}

/// Errors from the processor and link evaluator registries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Unknown class '{0}'")]
    UnknownClass(String),

    #[error("Class '{0}' is already registered")]
    DuplicateClass(String),

    #[error("Unknown module '{0}'")]
    UnknownModule(String),
}

/// Errors while reading or instantiating a network document.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocumentError {
    #[error("Invalid document version '{0}'")]
    InvalidVersion(String),

    #[error("Unsupported document version {found} (supported: {supported})")]
    UnsupportedVersion { found: String, supported: String },

    #[error("Loading '{entry}' failed: {error}")]
    Entry { entry: String, error: NetworkError },
}

impl DocumentError {
    /// The network error behind an entry failure, if any.
    pub fn network_error(&self) -> Option<&NetworkError> {
        match self {
            DocumentError::Entry { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl NetworkError {
    /// Names of the processors this error refers to, if it refers to any.
    pub fn affected_processors(&self) -> Vec<String> {
        match self {
            NetworkError::NetworkCycle { processors } => processors.clone(),
            NetworkError::ProcessorInitFailed { processor, .. }
            | NetworkError::PortNotFound { processor, .. }
            | NetworkError::PropertyNotFound { processor, .. } => vec![processor.clone()],
            NetworkError::ProcessorNotFound(name) | NetworkError::DuplicateName(name) => {
                vec![name.clone()]
            }
            _ => Vec::new(),
        }
    }
}

/// Result type alias for Voreen operations.
pub type VoreenResult<T> = Result<T, VoreenError>;

/// Result type alias for network operations.
pub type NetworkResult<T> = Result<T, NetworkError>;

/// Result type alias for processor execution.
pub type ProcessResult<T> = Result<T, ProcessError>;

// ============================================================================
// Validation Report
// ============================================================================

/// A single finding of the validation pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationIssue {
    /// Human readable description.
    pub message: String,
    /// Processor the issue refers to, if any.
    pub processor: Option<String>,
    /// Suggestion for addressing the issue.
    pub suggestion: Option<String>,
}

impl ValidationIssue {
    /// Create an issue without processor context.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            processor: None,
            suggestion: None,
        }
    }

    /// Attach the processor name.
    pub fn on(mut self, processor: impl Into<String>) -> Self {
        self.processor = Some(processor.into());
        self
    }

    /// Attach a suggestion.
    pub fn suggest(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.processor {
            Some(p) => write!(f, "[{}] {}", p, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Comprehensive validation report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Errors that make the network non-executable.
    pub errors: Vec<ValidationIssue>,
    /// Non-fatal issues.
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Create a new empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an error to the report.
    pub fn add_error(&mut self, issue: ValidationIssue) {
        self.errors.push(issue);
    }

    /// Add a warning to the report.
    pub fn add_warning(&mut self, issue: ValidationIssue) {
        self.warnings.push(issue);
    }

    /// Check if the network can be evaluated.
    pub fn can_execute(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get a human-readable summary.
    pub fn summary(&self) -> String {
        if self.can_execute() {
            if self.warnings.is_empty() {
                "Network is valid".to_string()
            } else {
                format!("Network is valid with {} warning(s)", self.warnings.len())
            }
        } else {
            format!("Validation failed with {} error(s)", self.errors.len())
        }
    }

    /// Get detailed messages with suggestions.
    pub fn detailed_errors(&self) -> Vec<String> {
        self.errors
            .iter()
            .enumerate()
            .map(|(i, issue)| {
                let mut msg = format!("{}. {}", i + 1, issue);
                if let Some(fix) = &issue.suggestion {
                    msg.push_str(&format!("\n   -> Suggestion: {}", fix));
                }
                msg
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processor_id_display() {
        let id = ProcessorId::new();
        assert_eq!(format!("{}", id).len(), 8);
    }

    #[test]
    fn test_unknown_class_names_entry() {
        let error = NetworkError::UnknownClass {
            class: "Nonexistent".to_string(),
            entry: "Renderer 1".to_string(),
        };
        let msg = error.to_string();
        assert!(msg.contains("Nonexistent"));
        assert!(msg.contains("Renderer 1"));
    }

    #[test]
    fn test_affected_processors() {
        let error = NetworkError::NetworkCycle {
            processors: vec!["A".into(), "B".into()],
        };
        assert_eq!(error.affected_processors(), vec!["A", "B"]);
        assert!(NetworkError::EmptyName.affected_processors().is_empty());
    }

    #[test]
    fn test_validation_report() {
        let mut report = ValidationReport::new();
        assert!(report.can_execute());

        report.add_warning(ValidationIssue::new("unconnected").on("Blur"));
        assert!(report.can_execute());

        report.add_error(ValidationIssue::new("cycle").suggest("remove a connection"));
        assert!(!report.can_execute());
        assert!(report.detailed_errors()[0].contains("remove a connection"));
    }
}
