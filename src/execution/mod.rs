//! Network evaluation.
//!
//! This module drives initialization and incremental evaluation passes.

pub mod evaluator;
pub mod progress;

pub use evaluator::{EvaluationReport, EvaluatorOptions, NetworkEvaluator};
pub use progress::{CancelHandle, ProgressCallback, ProgressTracker, ProgressUpdate, SkipReason};
