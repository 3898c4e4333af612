//! Progress-callback trait for per-file run events.
//!
//! Inject an [`Arc<dyn RunProgressCallback>`] via
//! [`crate::config::RunConfigBuilder::progress_callback`] to receive events
//! as each stage processes its files. The CLI drives an `indicatif` progress
//! bar from it; library callers can forward events anywhere.
//!
//! # Example
//!
//! ```rust
//! use irconv::{ConversionResult, RunConfig, RunProgressCallback, Stage};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct Counting(AtomicUsize);
//!
//! impl RunProgressCallback for Counting {
//!     fn on_file_complete(&self, _stage: Stage, _result: &ConversionResult) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//!
//! let config = RunConfig::builder()
//!     .language("Python")
//!     .progress_callback(Arc::new(Counting(AtomicUsize::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use crate::output::{ConversionResult, RunResult};
use std::fmt;
use std::sync::Arc;

/// A stage of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Phase 1: source files to intermediate files.
    Preprocess,
    /// Phase 2: intermediate files to every target language.
    Convert,
}

impl Stage {
    /// Verb used in log lines, e.g. `Preprocessing 3 files...`.
    pub fn verb(self) -> &'static str {
        match self {
            Stage::Preprocess => "Preprocessing",
            Stage::Convert => "Converting",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// Called by the orchestrator as it processes each file.
///
/// Files within a stage run concurrently, so `on_file_complete` may be called
/// from several tasks at once. All methods default to no-ops.
pub trait RunProgressCallback: Send + Sync {
    /// Called once per stage, before any of its files starts.
    fn on_stage_start(&self, stage: Stage, total_files: usize) {
        let _ = (stage, total_files);
    }

    /// Called for every conversion result the stage produces. In the
    /// conversion stage one file yields one result per target.
    fn on_file_complete(&self, stage: Stage, result: &ConversionResult) {
        let _ = (stage, result);
    }

    /// Called once per stage after every file has been attempted, or after
    /// the first fatal queue error.
    fn on_stage_complete(&self, stage: Stage, results: &RunResult) {
        let _ = (stage, results);
    }
}

/// The default when no callback is configured.
pub struct NoopProgressCallback;

impl RunProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::RunConfig`].
pub type ProgressCallback = Arc<dyn RunProgressCallback>;
