//! The conversion orchestration engine.
//!
//! ## Data Flow
//!
//! ```text
//! files ──▶ orchestrator ──▶ queue ──▶ coordinator ──▶ cache ──▶ converter
//!              │                        (per file)    (per key)
//!              └──▶ report ──▶ postprocess
//! ```
//!
//! 1. [`queue`]         sliding-window task queue with a concurrency bound
//! 2. [`cache`]         at-most-once, in-flight-shared converter construction
//! 3. [`coordinator`]   preprocess one file by extension, then fan out to
//!    every target language
//! 4. [`orchestrator`]  run all files in one or two phases and aggregate
//! 5. [`report`]        log lines and summaries
//! 6. [`postprocess`]   project files, only after a fully successful run

pub mod cache;
pub mod coordinator;
pub mod orchestrator;
pub mod postprocess;
pub mod queue;
pub mod report;
