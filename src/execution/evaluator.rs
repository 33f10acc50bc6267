//! Network evaluation.
//!
//! The evaluator initializes processors, runs incremental passes in
//! topological order and tears the network down again. A pass only
//! processes invalid processors, what depends on them, and end processors.

use crate::core::error::{NetworkError, NetworkResult, ProcessError, ProcessorId};
use crate::core::processor::{InvalidationLevel, LifecycleState};
use crate::execution::progress::{CancelHandle, ProgressCallback, ProgressTracker, ProgressUpdate, SkipReason};
use crate::link::property_link::PropertyKey;
use crate::network::structure::ProcessorNetwork;
use crate::network::topology::TopologyAnalyzer;
use std::collections::HashSet;
use std::rc::Rc;
use std::time::Instant;

/// Evaluation options.
#[derive(Clone)]
pub struct EvaluatorOptions {
    /// Process end processors in every pass, even when valid.
    pub process_end_processors: bool,
    /// Retry initialization of failed processors before a pass.
    pub reinitialize_failed: bool,
    /// Progress callback.
    pub progress_callback: Option<ProgressCallback>,
    /// Cancellation flag checked between processors.
    pub cancel: Option<CancelHandle>,
}

impl std::fmt::Debug for EvaluatorOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvaluatorOptions")
            .field("process_end_processors", &self.process_end_processors)
            .field("reinitialize_failed", &self.reinitialize_failed)
            .field("progress_callback", &self.progress_callback.as_ref().map(|_| "<callback>"))
            .field("cancel", &self.cancel)
            .finish()
    }
}

impl Default for EvaluatorOptions {
    fn default() -> Self {
        Self {
            process_end_processors: true,
            reinitialize_failed: false,
            progress_callback: None,
            cancel: None,
        }
    }
}

impl EvaluatorOptions {
    /// Create a new options builder.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_end_processors(mut self, always: bool) -> Self {
        self.process_end_processors = always;
        self
    }

    pub fn with_reinitialize_failed(mut self, retry: bool) -> Self {
        self.reinitialize_failed = retry;
        self
    }

    /// Set progress callback.
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ProgressUpdate) + 'static,
    {
        self.progress_callback = Some(Rc::new(callback));
        self
    }

    pub fn with_cancel(mut self, handle: CancelHandle) -> Self {
        self.cancel = Some(handle);
        self
    }
}

/// Result of one evaluation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationReport {
    /// Processors that ran, in evaluation order.
    pub processed: Vec<ProcessorId>,
    pub skipped: Vec<(ProcessorId, SkipReason)>,
    pub failed: Vec<(ProcessorId, ProcessError)>,
    /// The pass stopped early on request.
    pub cancelled: bool,
    /// Link evaluations that failed while applying requested writes.
    pub propagation_failures: usize,
}

impl EvaluationReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && !self.cancelled
    }

    pub fn was_processed(&self, id: ProcessorId) -> bool {
        self.processed.contains(&id)
    }

    pub fn skip_reason(&self, id: ProcessorId) -> Option<SkipReason> {
        self.skipped.iter().find(|(p, _)| *p == id).map(|(_, r)| *r)
    }
}

/// Drives the lifecycle and evaluation of a network.
#[derive(Debug, Default)]
pub struct NetworkEvaluator {
    options: EvaluatorOptions,
    /// Evaluation order and the network revision it was computed for.
    cached_order: Option<(u64, Vec<ProcessorId>)>,
}

impl NetworkEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: EvaluatorOptions) -> Self {
        Self {
            options,
            cached_order: None,
        }
    }

    pub fn options(&self) -> &EvaluatorOptions {
        &self.options
    }

    /// Initialize every processor that is not initialized yet.
    ///
    /// All processors are attempted. The first failure is returned; failed
    /// processors stay in the Failed state.
    pub fn initialize_network(&self, network: &mut ProcessorNetwork) -> NetworkResult<()> {
        let mut first_failure = None;
        for node in network.nodes_mut() {
            let pending = match node.state() {
                LifecycleState::Uninitialized => true,
                LifecycleState::Failed => self.options.reinitialize_failed,
                LifecycleState::Initialized => false,
            };
            if !pending {
                continue;
            }
            if let Err(e) = node.initialize() {
                log::error!("Initialization of '{}' failed: {}", node.name(), e);
                first_failure.get_or_insert(NetworkError::ProcessorInitFailed {
                    processor: node.name().to_string(),
                    reason: e.to_string(),
                });
            } else {
                log::debug!("Initialized '{}'", node.name());
            }
        }
        first_failure.map_or(Ok(()), Err)
    }

    /// Deinitialize every processor.
    pub fn deinitialize_network(&self, network: &mut ProcessorNetwork) {
        for node in network.nodes_mut() {
            node.deinitialize();
        }
        log::debug!("Deinitialized {} processor(s)", network.len());
    }

    /// Evaluation order, recomputed only when the network changed.
    pub fn evaluation_order(&mut self, network: &ProcessorNetwork) -> NetworkResult<Vec<ProcessorId>> {
        if let Some((revision, order)) = &self.cached_order {
            if *revision == network.revision() {
                return Ok(order.clone());
            }
        }
        let order = TopologyAnalyzer::new(network).evaluation_order()?;
        self.cached_order = Some((network.revision(), order.clone()));
        Ok(order)
    }

    /// Run one evaluation pass.
    ///
    /// Fails before processing anything if the network has a cycle.
    /// Processor failures do not fail the pass; they are reported and
    /// halt the failed processor's downstream for this pass.
    pub fn process(&mut self, network: &mut ProcessorNetwork) -> NetworkResult<EvaluationReport> {
        let order = self.evaluation_order(network)?;
        if let Err(e) = self.initialize_network(network) {
            log::warn!("Evaluating with uninitialized processors: {}", e);
        }
        network.refresh_coprocessors();

        let roots: Vec<ProcessorId> = network
            .processors()
            .filter(|n| {
                n.invalidation() != InvalidationLevel::Valid
                    || (self.options.process_end_processors && n.is_end_processor())
            })
            .map(|n| n.id())
            .collect();
        let scheduled = TopologyAnalyzer::new(network).downstream_closure(roots);
        let order: Vec<ProcessorId> = order.into_iter().filter(|id| scheduled.contains(id)).collect();

        let mut tracker = ProgressTracker::new(order.len(), self.options.progress_callback.clone());
        tracker.start();
        let mut report = EvaluationReport::default();
        let mut halted: HashSet<ProcessorId> = HashSet::new();

        for id in order {
            if self.options.cancel.as_ref().is_some_and(|c| c.is_cancelled()) {
                log::info!("Evaluation cancelled");
                report.cancelled = true;
                tracker.cancelled();
                break;
            }

            let skip = if halted.contains(&id) {
                Some(SkipReason::UpstreamFailed)
            } else if !network.processor(id).is_some_and(|n| n.is_initialized()) {
                Some(SkipReason::NotInitialized)
            } else if !network.missing_inputs(id).is_empty() {
                Some(SkipReason::NotReady)
            } else {
                None
            };
            if let Some(reason) = skip {
                log::debug!("Skipping '{}': {:?}", network.name_of(id), reason);
                // Outputs of an earlier pass must not reach consumers
                network.node_mut(id)?.clear_outputs();
                tracker.processor_skipped(id, reason);
                report.skipped.push((id, reason));
                continue;
            }

            let name = network.name_of(id);
            let inputs = network.gather_inputs(id);
            tracker.processor_started(id, &name);
            let start = Instant::now();

            match network.node_mut(id)?.run(inputs) {
                Ok(requests) => {
                    for (property, value) in requests {
                        let key = PropertyKey::new(id, property);
                        match network.set_property(&key, value) {
                            Ok(propagation) => report.propagation_failures += propagation.failures.len(),
                            Err(e) => log::warn!("'{}' requested an invalid write: {}", name, e),
                        }
                    }
                    network.node_mut(id)?.set_valid();
                    tracker.processor_completed(id, start.elapsed().as_millis() as u64);
                    report.processed.push(id);
                }
                Err(error) => {
                    log::warn!("Processor '{}' failed: {}", name, error);
                    network.node_mut(id)?.mark_failed();
                    tracker.processor_failed(id, error.to_string());
                    let downstream = TopologyAnalyzer::new(network).downstream_closure([id]);
                    halted.extend(downstream.into_iter().filter(|d| *d != id));
                    report.failed.push((id, error));
                }
            }
        }

        tracker.complete();
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::ProcessContext;
    use crate::core::error::ProcessResult;
    use crate::core::port::{Payload, PortDefinition, PortKind};
    use crate::core::processor::{Processor, ProcessorMetadata};
    use crate::core::property::Property;
    use crate::core::types::Value;
    use crate::registry::Registry;
    use indexmap::IndexMap;
    use std::cell::RefCell;

    /// Publishes its `value` property on a generic port.
    struct Constant;

    impl Processor for Constant {
        fn metadata(&self) -> ProcessorMetadata {
            ProcessorMetadata::builder("Constant")
                .outport(PortDefinition::outport("output", PortKind::Generic))
                .property(Property::int("value", "Value", 1, 0, 100))
                .build()
        }

        fn create(&self) -> Box<dyn Processor> {
            Box::new(Constant)
        }

        fn process(&mut self, ctx: &mut ProcessContext) -> ProcessResult<()> {
            let value = ctx.int("value")?;
            ctx.set_output("output", Payload::Value(Value::Int(value)))
        }
    }

    /// Fails in process() or in initialize().
    struct Failing {
        on_init: bool,
    }

    impl Processor for Failing {
        fn metadata(&self) -> ProcessorMetadata {
            ProcessorMetadata::builder("Failing")
                .inport(PortDefinition::inport("input", PortKind::Generic).optional())
                .outport(PortDefinition::outport("output", PortKind::Generic))
                .build()
        }

        fn create(&self) -> Box<dyn Processor> {
            Box::new(Failing { on_init: self.on_init })
        }

        fn initialize(&mut self, _properties: &IndexMap<String, Property>) -> ProcessResult<()> {
            if self.on_init {
                return Err(ProcessError::MissingResource("shader".into()));
            }
            Ok(())
        }

        fn process(&mut self, _ctx: &mut ProcessContext) -> ProcessResult<()> {
            Err(ProcessError::Failed("boom".into()))
        }
    }

    /// Counts lifecycle calls and always fails in process().
    struct Counting {
        calls: Rc<RefCell<(u32, u32)>>,
    }

    impl Processor for Counting {
        fn metadata(&self) -> ProcessorMetadata {
            ProcessorMetadata::builder("Counting")
                .outport(PortDefinition::outport("output", PortKind::Generic))
                .build()
        }

        fn create(&self) -> Box<dyn Processor> {
            Box::new(Counting { calls: self.calls.clone() })
        }

        fn initialize(&mut self, _properties: &IndexMap<String, Property>) -> ProcessResult<()> {
            self.calls.borrow_mut().0 += 1;
            Ok(())
        }

        fn deinitialize(&mut self) {
            self.calls.borrow_mut().1 += 1;
        }

        fn process(&mut self, _ctx: &mut ProcessContext) -> ProcessResult<()> {
            Err(ProcessError::Failed("boom".into()))
        }
    }

    fn image_chain(registry: &Registry) -> (ProcessorNetwork, [ProcessorId; 3]) {
        let mut network = ProcessorNetwork::new();
        let source = network.add(registry, "ImageSource", None).unwrap();
        let blur = network.add(registry, "Blur", None).unwrap();
        let canvas = network.add(registry, "Canvas", None).unwrap();
        network.connect(source, "image.output", blur, "image.input").unwrap();
        network.connect(blur, "image.output", canvas, "image.input").unwrap();
        (network, [source, blur, canvas])
    }

    #[test]
    fn test_incremental_passes() {
        let registry = Registry::with_builtins();
        let (mut network, [source, blur, canvas]) = image_chain(&registry);
        let mut evaluator = NetworkEvaluator::new();

        let first = evaluator.process(&mut network).unwrap();
        assert_eq!(first.processed, vec![source, blur, canvas]);
        let size = network.key("Canvas", "imageSize").unwrap();
        assert_eq!(network.property(&size).unwrap().get(), &Value::IntVec2([64, 64]));

        // Nothing changed: only the end processor runs
        let second = evaluator.process(&mut network).unwrap();
        assert_eq!(second.processed, vec![canvas]);

        network.set("Blur", "sigma", Value::Float(2.0)).unwrap();
        let third = evaluator.process(&mut network).unwrap();
        assert_eq!(third.processed, vec![blur, canvas]);
        assert!(third.is_success());
    }

    #[test]
    fn test_end_processors_optional() {
        let registry = Registry::with_builtins();
        let (mut network, _) = image_chain(&registry);
        let mut evaluator =
            NetworkEvaluator::with_options(EvaluatorOptions::new().with_end_processors(false));

        evaluator.process(&mut network).unwrap();
        let second = evaluator.process(&mut network).unwrap();
        assert!(second.processed.is_empty());
    }

    #[test]
    fn test_missing_input_skips() {
        let registry = Registry::with_builtins();
        let mut network = ProcessorNetwork::new();
        let blur = network.add(&registry, "Blur", None).unwrap();
        let canvas = network.add(&registry, "Canvas", None).unwrap();
        network.connect(blur, "image.output", canvas, "image.input").unwrap();

        let report = NetworkEvaluator::new().process(&mut network).unwrap();
        assert!(report.processed.is_empty());
        assert_eq!(report.skip_reason(blur), Some(SkipReason::NotReady));
        assert_eq!(report.skip_reason(canvas), Some(SkipReason::NotReady));
    }

    #[test]
    fn test_failure_halts_downstream() {
        let registry = Registry::with_builtins();
        let mut network = ProcessorNetwork::new();
        let constant = network.add_processor(Box::new(Constant), None).unwrap();
        let failing = network.add_processor(Box::new(Failing { on_init: false }), None).unwrap();
        let after = network.add(&registry, "Passthrough", None).unwrap();
        network.connect(constant, "output", failing, "input").unwrap();
        network.connect(failing, "output", after, "input").unwrap();

        let report = NetworkEvaluator::new().process(&mut network).unwrap();
        assert_eq!(report.processed, vec![constant]);
        assert_eq!(report.failed, vec![(failing, ProcessError::Failed("boom".into()))]);
        assert_eq!(report.skip_reason(after), Some(SkipReason::UpstreamFailed));
        assert_eq!(network.processor(failing).unwrap().state(), LifecycleState::Failed);
        // Upstream output is kept
        assert!(network.processor(constant).unwrap().output("output").is_some());
    }

    #[test]
    fn test_initialize_network_reports_first_failure() {
        let mut network = ProcessorNetwork::new();
        network.add_processor(Box::new(Constant), None).unwrap();
        network
            .add_processor(Box::new(Failing { on_init: true }), Some("Raycaster"))
            .unwrap();
        network
            .add_processor(Box::new(Failing { on_init: true }), Some("Other"))
            .unwrap();

        let evaluator = NetworkEvaluator::new();
        let err = evaluator.initialize_network(&mut network).unwrap_err();
        assert!(matches!(
            err,
            NetworkError::ProcessorInitFailed { ref processor, .. } if processor == "Raycaster"
        ));
        let states: Vec<LifecycleState> = network.processors().map(|n| n.state()).collect();
        assert_eq!(
            states,
            vec![LifecycleState::Initialized, LifecycleState::Failed, LifecycleState::Failed]
        );

        evaluator.deinitialize_network(&mut network);
        assert!(network.processors().all(|n| n.state() == LifecycleState::Uninitialized));
    }

    #[test]
    fn test_cycle_fails_before_processing() {
        let registry = Registry::with_builtins();
        let mut network = ProcessorNetwork::new();
        let a = network.add(&registry, "Passthrough", Some("A")).unwrap();
        let b = network.add(&registry, "Passthrough", Some("B")).unwrap();
        network.connect(a, "output", b, "input").unwrap();
        network.connect(b, "output", a, "input").unwrap();

        let err = NetworkEvaluator::new().process(&mut network).unwrap_err();
        assert!(matches!(err, NetworkError::NetworkCycle { .. }));
        assert!(network.processors().all(|n| !n.is_initialized()));
    }

    #[test]
    fn test_cancel_between_processors() {
        let registry = Registry::with_builtins();
        let (mut network, [source, ..]) = image_chain(&registry);
        let cancel = CancelHandle::new();
        let trigger = cancel.clone();
        let options = EvaluatorOptions::new()
            .with_cancel(cancel)
            .with_progress(move |update| {
                if matches!(update, ProgressUpdate::ProcessorCompleted { .. }) {
                    trigger.cancel();
                }
            });

        let report = NetworkEvaluator::with_options(options).process(&mut network).unwrap();
        assert!(report.cancelled);
        assert_eq!(report.processed, vec![source]);
    }

    #[test]
    fn test_progress_events() {
        let registry = Registry::with_builtins();
        let (mut network, _) = image_chain(&registry);
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        let options = EvaluatorOptions::new().with_progress(move |u| sink.borrow_mut().push(u.clone()));

        NetworkEvaluator::with_options(options).process(&mut network).unwrap();
        let events = events.borrow();
        assert_eq!(events.first(), Some(&ProgressUpdate::Started { total_processors: 3 }));
        assert!(matches!(
            events.last(),
            Some(ProgressUpdate::Completed { processed: 3, skipped: 0, .. })
        ));
    }

    #[test]
    fn test_order_cache_follows_revision() {
        let registry = Registry::with_builtins();
        let (mut network, [source, blur, canvas]) = image_chain(&registry);
        let mut evaluator = NetworkEvaluator::new();
        assert_eq!(evaluator.evaluation_order(&network).unwrap(), vec![source, blur, canvas]);

        network.disconnect(blur, "image.output", canvas, "image.input");
        let sharpen = network.add(&registry, "Sharpen", None).unwrap();
        network.connect(blur, "image.output", sharpen, "image.input").unwrap();
        network.connect(sharpen, "image.output", canvas, "image.input").unwrap();
        assert_eq!(
            evaluator.evaluation_order(&network).unwrap(),
            vec![source, blur, sharpen, canvas]
        );
    }

    #[test]
    fn test_failed_processor_releases_resources() {
        let calls = Rc::new(RefCell::new((0, 0)));
        let mut network = ProcessorNetwork::new();
        let id = network
            .add_processor(Box::new(Counting { calls: calls.clone() }), None)
            .unwrap();
        let mut evaluator =
            NetworkEvaluator::with_options(EvaluatorOptions::new().with_reinitialize_failed(true));

        evaluator.process(&mut network).unwrap();
        assert_eq!(network.processor(id).unwrap().state(), LifecycleState::Failed);
        assert!(network.processor(id).unwrap().holds_resources());

        // The retry releases the first initialization before starting over
        network.invalidate(id, InvalidationLevel::InvalidResult).unwrap();
        evaluator.process(&mut network).unwrap();
        assert_eq!(*calls.borrow(), (2, 1));

        drop(network);
        assert_eq!(*calls.borrow(), (2, 2));
    }

    #[test]
    fn test_skipped_processor_drops_stale_outputs() {
        let registry = Registry::with_builtins();
        let (mut network, [source, blur, canvas]) = image_chain(&registry);
        let mut evaluator = NetworkEvaluator::new();
        evaluator.process(&mut network).unwrap();
        assert!(network.processor(blur).unwrap().output("image.output").is_some());

        network.disconnect(source, "image.output", blur, "image.input");
        let report = evaluator.process(&mut network).unwrap();
        assert_eq!(report.skip_reason(blur), Some(SkipReason::NotReady));
        assert_eq!(report.skip_reason(canvas), Some(SkipReason::NotReady));
        assert!(!report.was_processed(canvas));
        assert!(network.processor(blur).unwrap().output("image.output").is_none());
    }
}
