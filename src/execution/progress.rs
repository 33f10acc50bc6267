//! Progress tracking for evaluation passes.

use crate::core::error::ProcessorId;
use std::sync::atomic::{AtomicBool, Ordering};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;

/// A progress update event.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressUpdate {
    /// A pass has started.
    Started {
        total_processors: usize,
    },
    /// A processor is about to run.
    ProcessorStarted {
        processor: ProcessorId,
        name: String,
        index: usize,
        total: usize,
    },
    /// A processor finished successfully.
    ProcessorCompleted {
        processor: ProcessorId,
        duration_ms: u64,
    },
    /// A processor was not run in this pass.
    ProcessorSkipped {
        processor: ProcessorId,
        reason: SkipReason,
    },
    /// A processor failed.
    ProcessorFailed {
        processor: ProcessorId,
        message: String,
    },
    /// The pass has completed.
    Completed {
        total_duration_ms: u64,
        processed: usize,
        skipped: usize,
    },
    /// The pass was cancelled.
    Cancelled,
}

/// Reason why a processor was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A required inport has no data.
    NotReady,
    /// An upstream processor failed in this pass.
    UpstreamFailed,
    /// Processor is not initialized.
    NotInitialized,
}

/// Callback type for progress updates.
pub type ProgressCallback = Rc<dyn Fn(&ProgressUpdate)>;

/// Shared cancellation flag. Checked between processors.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Clear a previous request.
    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// Tracks one evaluation pass.
pub struct ProgressTracker {
    total: usize,
    processed: usize,
    skipped: usize,
    start_time: Option<Instant>,
    callback: Option<ProgressCallback>,
}

impl ProgressTracker {
    pub fn new(total: usize, callback: Option<ProgressCallback>) -> Self {
        Self {
            total,
            processed: 0,
            skipped: 0,
            start_time: None,
            callback,
        }
    }

    /// Start tracking.
    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
        self.send_update(ProgressUpdate::Started {
            total_processors: self.total,
        });
    }

    pub fn processor_started(&self, processor: ProcessorId, name: &str) {
        self.send_update(ProgressUpdate::ProcessorStarted {
            processor,
            name: name.to_string(),
            index: self.processed + self.skipped,
            total: self.total,
        });
    }

    pub fn processor_completed(&mut self, processor: ProcessorId, duration_ms: u64) {
        self.processed += 1;
        self.send_update(ProgressUpdate::ProcessorCompleted {
            processor,
            duration_ms,
        });
    }

    pub fn processor_skipped(&mut self, processor: ProcessorId, reason: SkipReason) {
        self.skipped += 1;
        self.send_update(ProgressUpdate::ProcessorSkipped { processor, reason });
    }

    pub fn processor_failed(&mut self, processor: ProcessorId, message: String) {
        self.send_update(ProgressUpdate::ProcessorFailed { processor, message });
    }

    pub fn cancelled(&self) {
        self.send_update(ProgressUpdate::Cancelled);
    }

    /// Complete tracking.
    pub fn complete(&self) {
        let duration = self
            .start_time
            .map(|t| t.elapsed().as_millis() as u64)
            .unwrap_or(0);

        self.send_update(ProgressUpdate::Completed {
            total_duration_ms: duration,
            processed: self.processed,
            skipped: self.skipped,
        });
    }

    /// Share of the pass handled so far, in percent.
    pub fn progress_percent(&self) -> f32 {
        if self.total == 0 {
            return 100.0;
        }
        ((self.processed + self.skipped) as f32 / self.total as f32) * 100.0
    }

    fn send_update(&self, update: ProgressUpdate) {
        if let Some(ref callback) = self.callback {
            callback(&update);
        }
    }
}
