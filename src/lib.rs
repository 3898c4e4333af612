//! # irconv
//!
//! Convert intermediate-representation (IR) source files into several target
//! languages at once, concurrently, with per-file failure isolation.
//!
//! ## Pipeline Overview
//!
//! ```text
//! files
//!  │
//!  ├─ 1. Configure    resolve languages, load project metadata (fatal errors)
//!  ├─ 2. Preprocess   per file, by extension (.irm modules → .ir), bounded queue
//!  ├─ 3. Convert      each intermediate file → every target language
//!  ├─ 4. Report       per-file lines + run summary, exit status
//!  └─ 5. Postprocess  project files, only if every conversion succeeded
//! ```
//!
//! Converters are built lazily and at most once per run, even when many
//! files ask for the same one at the same time. A converter that fails to
//! build fails every file routed to it, and nothing else.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use irconv::{run, RunConfig, TokioFileSystem};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RunConfig::builder()
//!         .languages(["Python", "Ruby"])
//!         .build()?;
//!     let files = vec!["src/greeting.ir".to_string()];
//!     let outcome = run(&files, &config, Arc::new(TokioFileSystem)).await?;
//!     eprintln!("{} succeeded, {} failed", outcome.stats.succeeded, outcome.stats.failed);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `irconv` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! irconv = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod converter;
pub mod converters;
pub mod error;
pub mod fs;
pub mod output;
pub mod paths;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{RunConfig, RunConfigBuilder, DEFAULT_CONCURRENCY};
pub use convert::{run, run_pipeline, run_sync, run_to_exit_status};
pub use converter::{Converter, ConverterCreator, CreateConverterDependencies, CreatorRegistry};
pub use error::{ConversionError, IrconvError};
pub use fs::{FileSystem, MemoryFileSystem, TokioFileSystem};
pub use output::{
    ConversionResult, ConversionStatus, ExitStatus, PipelineOutcome, PostprocessReport, RunResult,
    RunStats,
};
pub use pipeline::queue::{queue_async_actions, QueueError};
pub use progress::{NoopProgressCallback, ProgressCallback, RunProgressCallback, Stage};
