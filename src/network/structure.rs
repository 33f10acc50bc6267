//! Network structure: processors, connections and property links.
//!
//! The ProcessorNetwork owns every processor instance. Connections and
//! links refer to processors by id, so removing a processor is a matter
//! of dropping everything that mentions its id. Using a single owner gives:
//! - Easy serialization
//! - Network-wide validation
//! - Single-writer property propagation through `&mut self`

use crate::core::error::{ConnectionId, LinkId, NetworkError, NetworkResult, ProcessorId};
use crate::core::port::{Payload, PortDefinition, PortKind};
use crate::core::processor::{InvalidationLevel, Processor};
use crate::core::property::{ObserverId, Property, PropertyChange};
use crate::core::types::Value;
use crate::link::evaluator::{LinkEvaluator, LinkInput};
use crate::link::property_link::{PropertyKey, PropertyLink};
use crate::network::connection::{Connection, Endpoint};
use crate::network::node::ProcessorNode;
use crate::network::observer::NetworkObserver;
use crate::registry::Registry;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Metadata about the network itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NetworkMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A link evaluation that failed during propagation.
#[derive(Debug, Clone, PartialEq)]
pub struct PropagationFailure {
    pub link: LinkId,
    pub error: NetworkError,
}

/// Outcome of one property write and the link cascade it started.
#[derive(Debug, Default)]
pub struct PropagationReport {
    /// Effective changes in the order they were applied.
    pub changes: Vec<PropertyChange>,
    /// Links skipped because their destination was already written.
    pub skipped: usize,
    /// Links whose evaluation failed. Other writes of the pass stay.
    pub failures: Vec<PropagationFailure>,
}

impl PropagationReport {
    /// Whether every reached link evaluated successfully.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Whether `property` of `processor` changed during the pass.
    pub fn changed(&self, processor: ProcessorId, property: &str) -> bool {
        self.changes
            .iter()
            .any(|c| c.owner == Some(processor) && c.property == property)
    }

    fn merge(&mut self, other: PropagationReport) {
        self.changes.extend(other.changes);
        self.skipped += other.skipped;
        self.failures.extend(other.failures);
    }
}

/// The processor network.
///
/// Uses IndexMap to keep processor insertion order for consistent
/// iteration, naming and serialization.
pub struct ProcessorNetwork {
    nodes: IndexMap<ProcessorId, ProcessorNode>,
    connections: Vec<Connection>,
    links: Vec<PropertyLink>,
    observers: Vec<Box<dyn NetworkObserver>>,
    /// Bumped on every change affecting evaluation order.
    revision: u64,
    pub metadata: NetworkMetadata,
}

impl Default for ProcessorNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProcessorNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessorNetwork")
            .field("processors", &self.nodes.len())
            .field("connections", &self.connections.len())
            .field("links", &self.links.len())
            .field("revision", &self.revision)
            .field("metadata", &self.metadata)
            .finish()
    }
}

impl ProcessorNetwork {
    /// Create a new empty network.
    pub fn new() -> Self {
        Self {
            nodes: IndexMap::new(),
            connections: Vec::new(),
            links: Vec::new(),
            observers: Vec::new(),
            revision: 0,
            metadata: NetworkMetadata::default(),
        }
    }

    /// Create with a name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.metadata.name = Some(name.into());
        self
    }

    /// Register a network observer.
    pub fn add_observer(&mut self, observer: Box<dyn NetworkObserver>) {
        self.observers.push(observer);
    }

    /// Revision counter, changed whenever processors or connections change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    // ========================================================================
    // Processor Management
    // ========================================================================

    /// Add a processor. Without a name the class name is used, suffixed
    /// with a number if it is taken ("Blur 2").
    pub fn add_processor(
        &mut self,
        processor: Box<dyn Processor>,
        name: Option<&str>,
    ) -> NetworkResult<ProcessorId> {
        let name = match name {
            Some(name) => {
                self.check_name(name)?;
                name.to_string()
            }
            None => self.unique_name(&processor.metadata().class_name),
        };

        let id = ProcessorId::new();
        self.nodes
            .insert(id, ProcessorNode::new(id, name.clone(), processor));
        self.touch();
        log::debug!("Added processor '{}' ({})", name, id);
        for observer in self.observers.iter_mut() {
            observer.processor_added(id, &name);
        }
        Ok(id)
    }

    /// Instantiate a registered class and add it.
    pub fn add(
        &mut self,
        registry: &Registry,
        class: &str,
        name: Option<&str>,
    ) -> NetworkResult<ProcessorId> {
        let processor = registry
            .processors()
            .create(class)
            .map_err(|_| NetworkError::UnknownClass {
                class: class.to_string(),
                entry: name.unwrap_or(class).to_string(),
            })?;
        self.add_processor(processor, name)
    }

    fn check_name(&self, name: &str) -> NetworkResult<()> {
        if name.trim().is_empty() {
            return Err(NetworkError::EmptyName);
        }
        if self.nodes.values().any(|n| n.name() == name) {
            return Err(NetworkError::DuplicateName(name.to_string()));
        }
        Ok(())
    }

    /// `base` if no processor uses it, otherwise the first free "base N".
    pub fn unique_name(&self, base: &str) -> String {
        let taken = |candidate: &str| self.nodes.values().any(|n| n.name() == candidate);
        if !taken(base) {
            return base.to_string();
        }
        let mut suffix = 2;
        loop {
            let candidate = format!("{} {}", base, suffix);
            if !taken(&candidate) {
                return candidate;
            }
            suffix += 1;
        }
    }

    /// Rename a processor. The new name must be unique.
    pub fn rename(&mut self, id: ProcessorId, name: &str) -> NetworkResult<()> {
        let old = self.node(id)?.name().to_string();
        if old == name {
            return Ok(());
        }
        self.check_name(name)?;
        self.node_mut(id)?.set_name(name.to_string());
        log::debug!("Renamed processor '{}' to '{}'", old, name);
        for observer in self.observers.iter_mut() {
            observer.processor_renamed(id, &old, name);
        }
        Ok(())
    }

    /// Remove a processor with its connections and links. The processor
    /// is deinitialized before it is returned.
    pub fn remove_processor(&mut self, id: ProcessorId) -> NetworkResult<ProcessorNode> {
        self.node(id)?;

        let (removed, kept): (Vec<Connection>, Vec<Connection>) = std::mem::take(&mut self.connections)
            .into_iter()
            .partition(|c| c.involves(id));
        self.connections = kept;
        for connection in &removed {
            if let Some(consumer) = self.nodes.get_mut(&connection.to.processor) {
                consumer.invalidate(InvalidationLevel::InvalidPorts);
            }
            for observer in self.observers.iter_mut() {
                observer.connection_removed(connection);
            }
        }

        let link_ids: Vec<LinkId> = self
            .links
            .iter()
            .filter(|l| l.involves(id))
            .map(|l| l.id())
            .collect();
        self.links.retain(|l| !l.involves(id));
        for link in &link_ids {
            for observer in self.observers.iter_mut() {
                observer.link_removed(*link);
            }
        }

        let mut node = self
            .nodes
            .shift_remove(&id)
            .ok_or_else(|| NetworkError::ProcessorNotFound(id.to_string()))?;
        node.deinitialize();
        self.touch();
        log::debug!(
            "Removed processor '{}' with {} connection(s) and {} link(s)",
            node.name(),
            removed.len(),
            link_ids.len()
        );
        for observer in self.observers.iter_mut() {
            observer.processor_removed(id, node.name());
        }
        Ok(node)
    }

    /// Remove everything. Processors are deinitialized first.
    pub fn clear(&mut self) {
        for node in self.nodes.values_mut() {
            node.deinitialize();
        }
        self.connections.clear();
        self.links.clear();
        let removed: Vec<(ProcessorId, String)> = self
            .nodes
            .drain(..)
            .map(|(id, node)| (id, node.name().to_string()))
            .collect();
        for (id, name) in &removed {
            for observer in self.observers.iter_mut() {
                observer.processor_removed(*id, name);
            }
        }
        self.touch();
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    pub fn processor(&self, id: ProcessorId) -> Option<&ProcessorNode> {
        self.nodes.get(&id)
    }

    pub fn processor_by_name(&self, name: &str) -> Option<&ProcessorNode> {
        self.nodes.values().find(|n| n.name() == name)
    }

    /// Id of the processor called `name`.
    pub fn id_of(&self, name: &str) -> NetworkResult<ProcessorId> {
        self.processor_by_name(name)
            .map(|n| n.id())
            .ok_or_else(|| NetworkError::ProcessorNotFound(name.to_string()))
    }

    /// Processor name, or the id when the processor is unknown.
    pub fn name_of(&self, id: ProcessorId) -> String {
        self.nodes
            .get(&id)
            .map(|n| n.name().to_string())
            .unwrap_or_else(|| id.to_string())
    }

    /// Processors in insertion order.
    pub fn processors(&self) -> impl Iterator<Item = &ProcessorNode> {
        self.nodes.values()
    }

    pub fn processor_ids(&self) -> Vec<ProcessorId> {
        self.nodes.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn connections_to(&self, id: ProcessorId) -> impl Iterator<Item = &Connection> {
        self.connections.iter().filter(move |c| c.to.processor == id)
    }

    pub fn connections_from(&self, id: ProcessorId) -> impl Iterator<Item = &Connection> {
        self.connections.iter().filter(move |c| c.from.processor == id)
    }

    pub fn links(&self) -> &[PropertyLink] {
        &self.links
    }

    pub fn find_link(&self, id: LinkId) -> Option<&PropertyLink> {
        self.links.iter().find(|l| l.id() == id)
    }

    pub fn links_from<'a>(&'a self, key: &'a PropertyKey) -> impl Iterator<Item = &'a PropertyLink> {
        self.links.iter().filter(move |l| l.source() == key)
    }

    pub fn links_to<'a>(&'a self, key: &'a PropertyKey) -> impl Iterator<Item = &'a PropertyLink> {
        self.links.iter().filter(move |l| l.destination() == key)
    }

    fn node(&self, id: ProcessorId) -> NetworkResult<&ProcessorNode> {
        self.nodes
            .get(&id)
            .ok_or_else(|| NetworkError::ProcessorNotFound(id.to_string()))
    }

    pub(crate) fn node_mut(&mut self, id: ProcessorId) -> NetworkResult<&mut ProcessorNode> {
        self.nodes
            .get_mut(&id)
            .ok_or_else(|| NetworkError::ProcessorNotFound(id.to_string()))
    }

    pub(crate) fn nodes_mut(&mut self) -> impl Iterator<Item = &mut ProcessorNode> {
        self.nodes.values_mut()
    }

    /// Raise the invalidation level of a processor.
    pub fn invalidate(&mut self, id: ProcessorId, level: InvalidationLevel) -> NetworkResult<()> {
        self.node_mut(id)?.invalidate(level);
        Ok(())
    }

    // ========================================================================
    // Connections
    // ========================================================================

    fn port_label(&self, endpoint: &Endpoint) -> String {
        format!("{}.{}", self.name_of(endpoint.processor), endpoint.port)
    }

    fn port_definition(&self, endpoint: &Endpoint) -> NetworkResult<&PortDefinition> {
        let node = self.node(endpoint.processor)?;
        node.port(&endpoint.port)
            .map(|p| &p.definition)
            .ok_or_else(|| NetworkError::PortNotFound {
                processor: node.name().to_string(),
                port: endpoint.port.clone(),
            })
    }

    /// Connect an outport to an inport.
    ///
    /// Ports must have equal kinds. An inport accepts one connection
    /// unless it is declared multiple. Cycles are allowed here and only
    /// rejected when the evaluation order is computed.
    pub fn connect(
        &mut self,
        from: ProcessorId,
        outport: &str,
        to: ProcessorId,
        inport: &str,
    ) -> NetworkResult<ConnectionId> {
        let from = Endpoint::new(from, outport);
        let to = Endpoint::new(to, inport);
        let out_def = self.port_definition(&from)?;
        let in_def = self.port_definition(&to)?;

        if !out_def.is_outport() {
            return Err(NetworkError::WrongDirection {
                port: self.port_label(&from),
                expected: "outport",
            });
        }
        if !in_def.is_inport() {
            return Err(NetworkError::WrongDirection {
                port: self.port_label(&to),
                expected: "inport",
            });
        }
        if out_def.kind != in_def.kind {
            return Err(NetworkError::IncompatibleKind {
                from: self.port_label(&from),
                to: self.port_label(&to),
                from_kind: out_def.kind,
                to_kind: in_def.kind,
            });
        }
        let existing = self.connections.iter().filter(|c| c.to == to).count();
        let duplicate = self.connections.iter().any(|c| c.joins(&from, &to));
        if duplicate || in_def.capacity().is_some_and(|cap| existing >= cap) {
            return Err(NetworkError::AlreadyConnected {
                port: self.port_label(&to),
            });
        }

        let exempt = in_def.is_exempt() || out_def.kind == PortKind::Coprocessor;
        let connection = Connection::new(from, to, exempt);
        let id = connection.id;
        log::debug!(
            "Connected {} -> {}{}",
            self.port_label(&connection.from),
            self.port_label(&connection.to),
            if exempt { " (exempt)" } else { "" }
        );
        self.node_mut(connection.to.processor)?
            .invalidate(InvalidationLevel::InvalidPorts);
        for observer in self.observers.iter_mut() {
            observer.connection_added(&connection);
        }
        self.connections.push(connection);
        self.touch();
        Ok(id)
    }

    /// Connect by processor names.
    pub fn connect_names(
        &mut self,
        from: &str,
        outport: &str,
        to: &str,
        inport: &str,
    ) -> NetworkResult<ConnectionId> {
        let (from, to) = (self.id_of(from)?, self.id_of(to)?);
        self.connect(from, outport, to, inport)
    }

    /// Remove a connection. Returns false if it did not exist.
    pub fn disconnect(&mut self, from: ProcessorId, outport: &str, to: ProcessorId, inport: &str) -> bool {
        let (from, to) = (Endpoint::new(from, outport), Endpoint::new(to, inport));
        match self.connections.iter().position(|c| c.joins(&from, &to)) {
            Some(index) => {
                self.remove_connection_at(index);
                true
            }
            None => false,
        }
    }

    /// Remove a connection by id. Returns false if it did not exist.
    pub fn disconnect_id(&mut self, id: ConnectionId) -> bool {
        match self.connections.iter().position(|c| c.id == id) {
            Some(index) => {
                self.remove_connection_at(index);
                true
            }
            None => false,
        }
    }

    fn remove_connection_at(&mut self, index: usize) {
        let connection = self.connections.remove(index);
        if let Some(consumer) = self.nodes.get_mut(&connection.to.processor) {
            consumer.invalidate(InvalidationLevel::InvalidPorts);
        }
        log::debug!(
            "Disconnected {} -> {}",
            self.port_label(&connection.from),
            self.port_label(&connection.to)
        );
        for observer in self.observers.iter_mut() {
            observer.connection_removed(&connection);
        }
        self.touch();
    }

    /// Payloads arriving at each inport of a processor, in connection order.
    pub fn gather_inputs(&self, id: ProcessorId) -> IndexMap<String, Vec<Payload>> {
        let mut inputs: IndexMap<String, Vec<Payload>> = IndexMap::new();
        for connection in self.connections_to(id) {
            let payload = self
                .nodes
                .get(&connection.from.processor)
                .and_then(|n| n.output(&connection.from.port));
            if let Some(payload) = payload {
                inputs
                    .entry(connection.to.port.clone())
                    .or_default()
                    .push(payload.clone());
            }
        }
        inputs
    }

    /// Required inports of a processor that receive no data.
    pub fn missing_inputs(&self, id: ProcessorId) -> Vec<String> {
        let Some(node) = self.nodes.get(&id) else {
            return Vec::new();
        };
        let inputs = self.gather_inputs(id);
        node.required_inports()
            .into_iter()
            .filter(|port| inputs.get(*port).map_or(true, |p| p.is_empty()))
            .map(str::to_string)
            .collect()
    }

    /// Republish coprocessor callables from current property values.
    pub fn refresh_coprocessors(&mut self) {
        for node in self.nodes.values_mut() {
            node.refresh_coprocessors();
        }
    }

    // ========================================================================
    // Properties
    // ========================================================================

    /// Key of `property` on the processor called `processor`.
    pub fn key(&self, processor: &str, property: &str) -> NetworkResult<PropertyKey> {
        let key = PropertyKey::new(self.id_of(processor)?, property);
        self.property(&key)?;
        Ok(key)
    }

    fn key_label(&self, key: &PropertyKey) -> String {
        format!("{}.{}", self.name_of(key.processor), key.property)
    }

    pub fn property(&self, key: &PropertyKey) -> NetworkResult<&Property> {
        let node = self.node(key.processor)?;
        node.property(&key.property)
            .ok_or_else(|| NetworkError::PropertyNotFound {
                processor: node.name().to_string(),
                property: key.property.clone(),
            })
    }

    fn property_mut(&mut self, key: &PropertyKey) -> NetworkResult<&mut Property> {
        let node = self.node_mut(key.processor)?;
        let processor = node.name().to_string();
        node.property_mut(&key.property)
            .ok_or_else(|| NetworkError::PropertyNotFound {
                processor,
                property: key.property.clone(),
            })
    }

    /// Write a property and propagate the change through links.
    ///
    /// Links leaving the property run first, in registration order, each
    /// cascade depth-first to completion; then the property's observers are
    /// notified. A property written once in a pass is skipped when reached
    /// again. Kind and option errors are returned before anything changes.
    pub fn set_property(&mut self, key: &PropertyKey, value: Value) -> NetworkResult<PropagationReport> {
        let mut report = PropagationReport::default();
        if let Some(change) = self.property_mut(key)?.assign(value)? {
            let mut visited = HashSet::new();
            visited.insert(key.clone());
            self.apply_change(key, change, &mut visited, &mut report);
        }
        Ok(report)
    }

    /// Write by processor and property name.
    pub fn set(&mut self, processor: &str, property: &str, value: Value) -> NetworkResult<PropagationReport> {
        let key = self.key(processor, property)?;
        self.set_property(&key, value)
    }

    /// Apply several writes, merging their reports. Stops at the first
    /// write that is rejected.
    pub fn set_many(
        &mut self,
        writes: impl IntoIterator<Item = (PropertyKey, Value)>,
    ) -> NetworkResult<PropagationReport> {
        let mut report = PropagationReport::default();
        for (key, value) in writes {
            report.merge(self.set_property(&key, value)?);
        }
        Ok(report)
    }

    fn apply_change(
        &mut self,
        key: &PropertyKey,
        change: PropertyChange,
        visited: &mut HashSet<PropertyKey>,
        report: &mut PropagationReport,
    ) {
        report.changes.push(change.clone());
        if let Some(node) = self.nodes.get_mut(&key.processor) {
            node.invalidate(InvalidationLevel::InvalidResult);
        }
        self.propagate(key, &change.old, visited, report);
        if let Ok(property) = self.property_mut(key) {
            property.notify(&change);
        }
        for observer in self.observers.iter_mut() {
            observer.property_changed(&change);
        }
    }

    fn propagate(
        &mut self,
        source: &PropertyKey,
        old_source: &Value,
        visited: &mut HashSet<PropertyKey>,
        report: &mut PropagationReport,
    ) {
        let outgoing: Vec<usize> = self
            .links
            .iter()
            .enumerate()
            .filter(|(_, l)| l.is_active() && l.source() == source)
            .map(|(i, _)| i)
            .collect();

        for index in outgoing {
            let link_id = self.links[index].id();
            let destination = self.links[index].destination().clone();
            if !visited.insert(destination.clone()) {
                report.skipped += 1;
                log::trace!("Link {} skipped, {} already written", link_id, destination);
                continue;
            }
            match self.evaluate_link(index, old_source) {
                Ok(Some(change)) => self.apply_change(&destination, change, visited, report),
                Ok(None) => {}
                Err(error) => {
                    log::warn!(
                        "Link {} -> {} failed: {}",
                        self.key_label(source),
                        self.key_label(&destination),
                        error
                    );
                    report.failures.push(PropagationFailure { link: link_id, error });
                }
            }
        }
    }

    fn evaluate_link(&mut self, index: usize, old_source: &Value) -> NetworkResult<Option<PropertyChange>> {
        let link = &self.links[index];
        let value = {
            let source = self.property(link.source())?;
            let destination = self.property(link.destination())?;
            link.evaluator().eval(&LinkInput {
                source,
                old_source,
                destination,
            })?
        };
        let destination = link.destination().clone();
        Ok(self.property_mut(&destination)?.assign(value)?)
    }

    /// Subscribe to changes of one property.
    pub fn subscribe(
        &mut self,
        key: &PropertyKey,
        observer: impl FnMut(&PropertyChange) + 'static,
    ) -> NetworkResult<ObserverId> {
        Ok(self.property_mut(key)?.subscribe(observer))
    }

    pub fn unsubscribe(&mut self, key: &PropertyKey, id: ObserverId) -> NetworkResult<bool> {
        Ok(self.property_mut(key)?.unsubscribe(id))
    }

    // ========================================================================
    // Links
    // ========================================================================

    /// Link `source` to `destination`.
    ///
    /// The evaluator must accept the pair, and a dry run with the current
    /// values must succeed. Linking does not write the destination.
    pub fn link(
        &mut self,
        source: PropertyKey,
        destination: PropertyKey,
        evaluator: Box<dyn LinkEvaluator>,
    ) -> NetworkResult<LinkId> {
        self.check_link(&source, &destination, evaluator.as_ref())?;
        Ok(self.insert_link(PropertyLink::new(source, destination, evaluator)))
    }

    /// Link with an evaluator from the registry. Without a class name the
    /// registry's default evaluator for the pair is used.
    pub fn link_with(
        &mut self,
        registry: &Registry,
        source: PropertyKey,
        destination: PropertyKey,
        evaluator: Option<&str>,
    ) -> NetworkResult<LinkId> {
        let entry = format!("{} -> {}", self.key_label(&source), self.key_label(&destination));
        let class = match evaluator {
            Some(class) => class.to_string(),
            None => {
                let src = self.property(&source)?;
                let dst = self.property(&destination)?;
                registry
                    .evaluators()
                    .default_for(src, dst)
                    .map(str::to_string)
                    .ok_or_else(|| NetworkError::LinkIncompatible {
                        src: self.key_label(&source),
                        dst: self.key_label(&destination),
                        evaluator: "<none>".to_string(),
                    })?
            }
        };
        let evaluator = registry
            .evaluators()
            .create(&class)
            .map_err(|_| NetworkError::UnknownClass { class, entry })?;
        self.link(source, destination, evaluator)
    }

    /// Link a group of properties.
    ///
    /// Transitive groups get a bidirectional chain closed into a ring,
    /// otherwise every ordered pair is linked. Existing links are kept.
    /// Nothing is linked if any pair is rejected.
    pub fn link_all(
        &mut self,
        keys: &[PropertyKey],
        evaluator: &dyn LinkEvaluator,
        transitive: bool,
    ) -> NetworkResult<Vec<LinkId>> {
        let n = keys.len();
        let mut pairs = Vec::new();
        if transitive {
            for i in 0..n.saturating_sub(1) {
                pairs.push((i, i + 1));
                pairs.push((i + 1, i));
            }
            if n > 2 {
                pairs.push((n - 1, 0));
                pairs.push((0, n - 1));
            }
        } else {
            for i in 0..n {
                for j in (0..n).filter(|j| *j != i) {
                    pairs.push((i, j));
                }
            }
        }

        let mut accepted = Vec::with_capacity(pairs.len());
        for (i, j) in pairs {
            match self.check_link(&keys[i], &keys[j], evaluator) {
                Ok(()) => accepted.push((i, j)),
                Err(NetworkError::AlreadyLinked { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(accepted
            .into_iter()
            .map(|(i, j)| {
                self.insert_link(PropertyLink::new(
                    keys[i].clone(),
                    keys[j].clone(),
                    evaluator.clone_box(),
                ))
            })
            .collect())
    }

    pub(crate) fn check_link(
        &self,
        source: &PropertyKey,
        destination: &PropertyKey,
        evaluator: &dyn LinkEvaluator,
    ) -> NetworkResult<()> {
        let src = self.property(source)?;
        let dst = self.property(destination)?;
        if source == destination {
            return Err(NetworkError::SelfLink(self.key_label(source)));
        }
        if self.links.iter().any(|l| l.connects(source, destination)) {
            return Err(NetworkError::AlreadyLinked {
                src: self.key_label(source),
                dst: self.key_label(destination),
            });
        }

        let incompatible = || NetworkError::LinkIncompatible {
            src: self.key_label(source),
            dst: self.key_label(destination),
            evaluator: evaluator.class_name().to_string(),
        };
        if !evaluator.are_linkable(src, dst) {
            return Err(incompatible());
        }
        // Dry run with the current values
        let trial = evaluator
            .eval(&LinkInput {
                source: src,
                old_source: src.get(),
                destination: dst,
            })
            .map_err(|_| incompatible())?;
        dst.validate(trial).map_err(|_| incompatible())?;
        Ok(())
    }

    pub(crate) fn insert_link(&mut self, link: PropertyLink) -> LinkId {
        let id = link.id();
        log::debug!(
            "Linked {} -> {} ({})",
            self.key_label(link.source()),
            self.key_label(link.destination()),
            link.evaluator().class_name()
        );
        for observer in self.observers.iter_mut() {
            observer.link_added(&link);
        }
        self.links.push(link);
        id
    }

    /// Activate or deactivate every link.
    pub(crate) fn set_links_active(&mut self, active: bool) {
        for link in self.links.iter_mut() {
            link.set_active(active);
        }
    }

    /// Remove a link.
    pub fn unlink(&mut self, id: LinkId) -> NetworkResult<PropertyLink> {
        let index = self
            .links
            .iter()
            .position(|l| l.id() == id)
            .ok_or(NetworkError::LinkNotFound(id))?;
        let link = self.links.remove(index);
        log::debug!(
            "Unlinked {} -> {}",
            self.key_label(link.source()),
            self.key_label(link.destination())
        );
        for observer in self.observers.iter_mut() {
            observer.link_removed(id);
        }
        Ok(link)
    }
}

impl Drop for ProcessorNetwork {
    fn drop(&mut self) {
        for node in self.nodes.values_mut() {
            if node.holds_resources() {
                node.deinitialize();
            }
        }
    }
}
