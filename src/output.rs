//! Result types produced by a run.

use crate::error::ConversionError;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::process::ExitCode;

/// Whether a conversion, or a whole run, succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionStatus {
    Succeeded,
    Failed,
}

/// Outcome of converting one file with one converter.
///
/// A failed result always carries an error and a successful one never does;
/// the private fields and the two constructors keep it that way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionResult {
    source_path: String,
    output_path: String,
    status: ConversionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ConversionError>,
}

impl ConversionResult {
    pub fn succeeded(source_path: impl Into<String>, output_path: impl Into<String>) -> Self {
        Self {
            source_path: source_path.into(),
            output_path: output_path.into(),
            status: ConversionStatus::Succeeded,
            error: None,
        }
    }

    pub fn failed(
        source_path: impl Into<String>,
        output_path: impl Into<String>,
        error: ConversionError,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            output_path: output_path.into(),
            status: ConversionStatus::Failed,
            error: Some(error),
        }
    }

    pub fn source_path(&self) -> &str {
        &self.source_path
    }

    /// For a pass-through this equals [`source_path`](Self::source_path).
    pub fn output_path(&self) -> &str {
        &self.output_path
    }

    pub fn status(&self) -> ConversionStatus {
        self.status
    }

    pub fn error(&self) -> Option<&ConversionError> {
        self.error.as_ref()
    }

    pub fn is_success(&self) -> bool {
        self.status == ConversionStatus::Succeeded
    }
}

/// Aggregate of many conversion results.
///
/// Order carries no meaning: two runs over the same inputs compare equal
/// after [`normalized`](Self::normalized) whatever order tasks finished in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunResult {
    pub successes: Vec<ConversionResult>,
    pub failures: Vec<ConversionResult>,
}

impl RunResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// File a result into the matching list.
    pub fn record(&mut self, result: ConversionResult) {
        if result.is_success() {
            self.successes.push(result);
        } else {
            self.failures.push(result);
        }
    }

    /// `Failed` iff at least one failure was recorded.
    pub fn status(&self) -> ConversionStatus {
        if self.failures.is_empty() {
            ConversionStatus::Succeeded
        } else {
            ConversionStatus::Failed
        }
    }

    pub fn attempted(&self) -> usize {
        self.successes.len() + self.failures.len()
    }

    /// Both lists sorted by (source, output) for order-independent comparison.
    pub fn normalized(mut self) -> Self {
        let key = |r: &ConversionResult| (r.source_path.clone(), r.output_path.clone());
        self.successes.sort_by_key(key);
        self.failures.sort_by_key(key);
        self
    }
}

impl Serialize for RunResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("RunResult", 3)?;
        s.serialize_field("status", &self.status())?;
        s.serialize_field("successes", &self.successes)?;
        s.serialize_field("failures", &self.failures)?;
        s.end()
    }
}

/// What happened after conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum PostprocessReport {
    /// Not attempted: no postprocessor configured, or a phase failed.
    Skipped,
    /// Files written by the postprocessor.
    Created(Vec<String>),
    Failed(String),
}

/// Counters and timings for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Distinct input files requested.
    pub files: usize,
    /// Distinct intermediate files handed to phase 2.
    pub intermediate_files: usize,
    /// Conversion results produced by phase 2 (or the single phase).
    pub conversions: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub preprocess_duration_ms: u64,
    pub convert_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    /// Preprocessing results, one per distinct input file. Pass-throughs
    /// are recorded as successes whose output equals their source.
    pub preprocessing: RunResult,
    /// Phase 2 results; `None` when phase 1 failed and phase 2 never ran.
    pub conversion: Option<RunResult>,
    /// Paths that fed phase 2.
    pub intermediate_files: Vec<String>,
    pub postprocessing: PostprocessReport,
    pub stats: RunStats,
}

impl PipelineOutcome {
    /// Verdict of the conversion phases alone.
    pub fn status(&self) -> ConversionStatus {
        let conversion_failed = self
            .conversion
            .as_ref()
            .is_some_and(|r| r.status() == ConversionStatus::Failed);
        if self.preprocessing.status() == ConversionStatus::Failed || conversion_failed {
            ConversionStatus::Failed
        } else {
            ConversionStatus::Succeeded
        }
    }

    /// Process verdict: also fails when postprocessing failed.
    pub fn exit_status(&self) -> ExitStatus {
        match (self.status(), &self.postprocessing) {
            (ConversionStatus::Succeeded, PostprocessReport::Failed(_)) => ExitStatus::Error,
            (ConversionStatus::Succeeded, _) => ExitStatus::Ok,
            (ConversionStatus::Failed, _) => ExitStatus::Error,
        }
    }
}

/// Process exit code of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitStatus {
    Ok = 0,
    Error = 1,
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        ExitCode::from(status as u8)
    }
}
