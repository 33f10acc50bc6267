//! Network documents for saving and loading.
//!
//! A document references processors by instance name, so it can be loaded
//! into a fresh network with new ids. Loading is all-or-nothing: the network
//! is only returned when every entry was applied.

use crate::core::error::{DocumentError, NetworkError, VoreenResult};
use crate::core::types::Value;
use crate::link::property_link::{PropertyKey, PropertyLink};
use crate::network::structure::{NetworkMetadata, ProcessorNetwork};
use crate::registry::Registry;
use indexmap::IndexMap;
use semver::Version;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Serialized processor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessorEntry {
    /// Class name to look up in the registry
    #[serde(rename = "class")]
    pub class_name: String,
    pub name: String,
    /// Property values in declaration order
    #[serde(default)]
    pub properties: IndexMap<String, Value>,
}

/// A processor port addressed by processor name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortRef {
    pub processor: String,
    pub port: String,
}

/// Serialized connection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnectionEntry {
    pub from: PortRef,
    pub to: PortRef,
}

/// A property addressed by processor name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropertyRef {
    pub processor: String,
    pub property: String,
}

impl std::fmt::Display for PropertyRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.processor, self.property)
    }
}

/// Serialized property link.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinkEntry {
    pub source: PropertyRef,
    pub destination: PropertyRef,
    /// Evaluator class name
    pub evaluator: String,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub parameters: serde_json::Value,
}

/// Serializable representation of a complete network.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkDocument {
    /// Document format version
    pub version: String,
    #[serde(default)]
    pub metadata: NetworkMetadata,
    #[serde(default)]
    pub processors: Vec<ProcessorEntry>,
    #[serde(default)]
    pub connections: Vec<ConnectionEntry>,
    #[serde(default)]
    pub links: Vec<LinkEntry>,
}

impl Default for NetworkDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkDocument {
    /// Current format version.
    pub const VERSION: &'static str = "1.0.0";

    pub fn new() -> Self {
        Self {
            version: Self::VERSION.to_string(),
            metadata: NetworkMetadata::default(),
            processors: Vec::new(),
            connections: Vec::new(),
            links: Vec::new(),
        }
    }

    /// Capture the structure and every property value of a network.
    pub fn from_network(network: &ProcessorNetwork) -> Self {
        let processors = network
            .processors()
            .map(|node| ProcessorEntry {
                class_name: node.class_name().to_string(),
                name: node.name().to_string(),
                properties: node
                    .properties()
                    .iter()
                    .map(|(id, p)| (id.clone(), p.get().clone()))
                    .collect(),
            })
            .collect();

        let connections = network
            .connections()
            .iter()
            .map(|c| ConnectionEntry {
                from: PortRef {
                    processor: network.name_of(c.from.processor),
                    port: c.from.port.clone(),
                },
                to: PortRef {
                    processor: network.name_of(c.to.processor),
                    port: c.to.port.clone(),
                },
            })
            .collect();

        let property_ref = |key: &PropertyKey| PropertyRef {
            processor: network.name_of(key.processor),
            property: key.property.clone(),
        };
        let links = network
            .links()
            .iter()
            .map(|l| LinkEntry {
                source: property_ref(l.source()),
                destination: property_ref(l.destination()),
                evaluator: l.evaluator().class_name().to_string(),
                parameters: l.evaluator().parameters(),
            })
            .collect();

        Self {
            version: Self::VERSION.to_string(),
            metadata: network.metadata.clone(),
            processors,
            connections,
            links,
        }
    }

    /// Check that the document version can be read.
    pub fn check_version(&self) -> Result<Version, DocumentError> {
        let version = Version::parse(&self.version)
            .map_err(|_| DocumentError::InvalidVersion(self.version.clone()))?;
        if version.major != 1 {
            return Err(DocumentError::UnsupportedVersion {
                found: self.version.clone(),
                supported: "1.x".to_string(),
            });
        }
        Ok(version)
    }

    /// Build a new network from the document.
    ///
    /// Property values are restored without link propagation. Links are
    /// created inactive and activated once everything else is in place.
    pub fn instantiate(&self, registry: &Registry) -> Result<ProcessorNetwork, DocumentError> {
        self.check_version()?;
        let mut network = ProcessorNetwork::new();
        network.metadata = self.metadata.clone();

        for entry in &self.processors {
            let wrap = |error: NetworkError| DocumentError::Entry {
                entry: entry.name.clone(),
                error,
            };
            let id = network
                .add(registry, &entry.class_name, Some(&entry.name))
                .map_err(wrap)?;
            let node = network.node_mut(id).map_err(wrap)?;
            for (property, value) in &entry.properties {
                let target = node.property_mut(property).ok_or_else(|| {
                    wrap(NetworkError::PropertyNotFound {
                        processor: entry.name.clone(),
                        property: property.clone(),
                    })
                })?;
                target
                    .assign(value.clone())
                    .map_err(|e| wrap(NetworkError::Property(e)))?;
            }
        }

        for entry in &self.connections {
            let label = format!(
                "{}.{} -> {}.{}",
                entry.from.processor, entry.from.port, entry.to.processor, entry.to.port
            );
            network
                .connect_names(&entry.from.processor, &entry.from.port, &entry.to.processor, &entry.to.port)
                .map_err(|error| DocumentError::Entry { entry: label, error })?;
        }

        for entry in &self.links {
            let label = format!("{} -> {}", entry.source, entry.destination);
            Self::restore_link(&mut network, registry, entry, &label)
                .map_err(|error| DocumentError::Entry { entry: label, error })?;
        }
        network.set_links_active(true);

        log::debug!(
            "Loaded network with {} processor(s), {} connection(s), {} link(s)",
            network.len(),
            network.connections().len(),
            network.links().len()
        );
        Ok(network)
    }

    fn restore_link(
        network: &mut ProcessorNetwork,
        registry: &Registry,
        entry: &LinkEntry,
        label: &str,
    ) -> Result<(), NetworkError> {
        let source = network.key(&entry.source.processor, &entry.source.property)?;
        let destination = network.key(&entry.destination.processor, &entry.destination.property)?;
        let evaluator = registry
            .evaluators()
            .create_configured(&entry.evaluator, &entry.parameters)
            .map_err(|_| NetworkError::UnknownClass {
                class: entry.evaluator.clone(),
                entry: label.to_string(),
            })??;
        network.check_link(&source, &destination, evaluator.as_ref())?;
        let mut link = PropertyLink::new(source, destination, evaluator);
        link.set_active(false);
        network.insert_link(link);
        Ok(())
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> VoreenResult<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> VoreenResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&json)?)
    }
}

impl ProcessorNetwork {
    pub fn to_document(&self) -> NetworkDocument {
        NetworkDocument::from_network(self)
    }

    pub fn from_document(document: &NetworkDocument, registry: &Registry) -> Result<Self, DocumentError> {
        document.instantiate(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ProcessorId;
    use crate::link::evaluators::AffineEvaluator;
    use crate::network::topology::TopologyAnalyzer;
    use proptest::prelude::*;

    fn blur_sharpen(registry: &Registry) -> ProcessorNetwork {
        let mut network = ProcessorNetwork::new().with_name("Filters");
        let blur = network.add(registry, "Blur", None).unwrap();
        let sharpen = network.add(registry, "Sharpen", None).unwrap();
        network.connect(blur, "image.output", sharpen, "image.input").unwrap();
        network.set("Blur", "sigma", Value::Float(2.5)).unwrap();
        let a = network.key("Blur", "sigma").unwrap();
        let b = network.key("Sharpen", "sigma").unwrap();
        network
            .link(a, b, Box::new(AffineEvaluator::new(2.0, 0.5)))
            .unwrap();
        network
    }

    #[test]
    fn test_round_trip() {
        let registry = Registry::with_builtins();
        let network = blur_sharpen(&registry);
        let document = network.to_document();

        let json = document.to_json().unwrap();
        assert!(json.contains("\"class\": \"Blur\""));
        assert!(json.contains("affine"));

        let loaded = NetworkDocument::from_json(&json)
            .unwrap()
            .instantiate(&Registry::with_builtins())
            .unwrap();
        assert_eq!(loaded.to_document(), document);
        assert_eq!(loaded.metadata.name.as_deref(), Some("Filters"));

        let order: Vec<String> = TopologyAnalyzer::new(&loaded)
            .evaluation_order()
            .unwrap()
            .into_iter()
            .map(|id| loaded.name_of(id))
            .collect();
        assert_eq!(order, vec!["Blur", "Sharpen"]);
    }

    #[test]
    fn test_load_does_not_propagate() {
        let registry = Registry::with_builtins();
        let mut document = blur_sharpen(&registry).to_document();
        document.processors[1]
            .properties
            .insert("sigma".into(), Value::Float(0.25));

        let mut loaded = document.instantiate(&registry).unwrap();
        let sharpen = loaded.key("Sharpen", "sigma").unwrap();
        assert_eq!(loaded.property(&sharpen).unwrap().get(), &Value::Float(0.25));

        // Links are live once loading finished
        assert!(loaded.links().iter().all(|l| l.is_active()));
        loaded.set("Blur", "sigma", Value::Float(1.0)).unwrap();
        assert_eq!(loaded.property(&sharpen).unwrap().get(), &Value::Float(2.5));
    }

    #[test]
    fn test_unknown_class_fails_whole_load() {
        let registry = Registry::with_builtins();
        let mut document = blur_sharpen(&registry).to_document();
        document.processors.push(ProcessorEntry {
            class_name: "Nonexistent".into(),
            name: "Renderer 1".into(),
            properties: IndexMap::new(),
        });

        let err = document.instantiate(&registry).unwrap_err();
        assert_eq!(
            err.network_error(),
            Some(&NetworkError::UnknownClass {
                class: "Nonexistent".into(),
                entry: "Renderer 1".into()
            })
        );
    }

    #[test]
    fn test_unknown_evaluator_names_link() {
        let registry = Registry::with_builtins();
        let mut document = blur_sharpen(&registry).to_document();
        document.links[0].evaluator = "python".into();

        match document.instantiate(&registry).unwrap_err() {
            DocumentError::Entry { entry, error } => {
                assert_eq!(entry, "Blur.sigma -> Sharpen.sigma");
                assert!(matches!(error, NetworkError::UnknownClass { .. }));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_version_check() {
        let registry = Registry::with_builtins();
        let mut document = NetworkDocument::new();
        document.version = "2.0.0".into();
        assert!(matches!(
            document.instantiate(&registry),
            Err(DocumentError::UnsupportedVersion { .. })
        ));
        document.version = "one".into();
        assert!(matches!(
            document.instantiate(&registry),
            Err(DocumentError::InvalidVersion(_))
        ));
        document.version = "1.4.2".into();
        assert!(document.instantiate(&registry).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_property_is_rejected() {
        let registry = Registry::with_builtins();
        let mut document = blur_sharpen(&registry).to_document();
        document.processors[0]
            .properties
            .insert("radius".into(), Value::Float(3.0));
        assert!(matches!(
            document.instantiate(&registry).unwrap_err().network_error(),
            Some(NetworkError::PropertyNotFound { .. })
        ));
    }

    #[test]
    fn test_save_and_load_file() {
        let registry = Registry::with_builtins();
        let document = blur_sharpen(&registry).to_document();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("network.json");

        document.save(&path).unwrap();
        assert_eq!(NetworkDocument::load(&path).unwrap(), document);
    }

    const CLASSES: [&str; 6] = ["ImageSource", "Blur", "Sharpen", "ColorMap", "Colorize", "Canvas"];

    /// Builds a network from generated choices. Invalid connections and
    /// links are skipped, so every generated plan yields some network.
    fn planned_network(
        registry: &Registry,
        classes: &[usize],
        sigmas: &[f64],
        connections: &[(usize, usize)],
        links: &[(usize, usize, f64, f64)],
    ) -> ProcessorNetwork {
        let mut network = ProcessorNetwork::new().with_name("Generated");
        let ids: Vec<ProcessorId> = classes
            .iter()
            .map(|c| network.add(registry, CLASSES[*c], None).unwrap())
            .collect();
        for (id, sigma) in ids.iter().zip(sigmas) {
            let key = PropertyKey::new(*id, "sigma");
            if network.property(&key).is_ok() {
                network.set_property(&key, Value::Float(*sigma)).unwrap();
            }
        }
        for (a, b) in connections {
            let (from, to) = (a % ids.len(), b % ids.len());
            if from >= to {
                continue;
            }
            for (outport, inport) in [("image.output", "image.input"), ("cp.colormap", "cp.colormap")] {
                let _ = network.connect(ids[from], outport, ids[to], inport);
            }
        }
        for (a, b, scale, offset) in links {
            let src = PropertyKey::new(ids[a % ids.len()], "sigma");
            let dst = PropertyKey::new(ids[b % ids.len()], "sigma");
            let _ = network.link(src, dst, Box::new(AffineEvaluator::new(*scale, *offset)));
        }
        network
    }

    fn order_names(network: &ProcessorNetwork) -> Vec<String> {
        TopologyAnalyzer::new(network)
            .evaluation_order()
            .unwrap()
            .into_iter()
            .map(|id| network.name_of(id))
            .collect()
    }

    proptest! {
        #[test]
        fn generated_documents_survive_reload(
            classes in prop::collection::vec(0usize..CLASSES.len(), 1..8),
            sigmas in prop::collection::vec(0.0f64..20.0, 8),
            connections in prop::collection::vec((0usize..8, 0usize..8), 0..12),
            links in prop::collection::vec((0usize..8, 0usize..8, -4.0f64..4.0, -2.0f64..2.0), 0..6),
        ) {
            let registry = Registry::with_builtins();
            let network = planned_network(&registry, &classes, &sigmas, &connections, &links);
            let document = network.to_document();

            let json = document.to_json().unwrap();
            let loaded = NetworkDocument::from_json(&json).unwrap().instantiate(&registry).unwrap();
            prop_assert_eq!(&loaded.to_document(), &document);
            prop_assert_eq!(order_names(&loaded), order_names(&network));
        }
    }
}
