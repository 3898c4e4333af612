//! Run orchestration: every requested file through the bounded queue, in one
//! or two phases, followed by postprocessing.

use crate::config::RunConfig;
use crate::error::IrconvError;
use crate::output::{
    ConversionResult, ConversionStatus, PipelineOutcome, PostprocessReport, RunResult, RunStats,
};
use crate::pipeline::coordinator::FileCoordinator;
use crate::pipeline::postprocess::Postprocessor;
use crate::pipeline::queue::queue_async_actions;
use crate::pipeline::report;
use crate::progress::{NoopProgressCallback, ProgressCallback, Stage};
use std::collections::{BTreeSet, HashSet};
use std::convert::Infallible;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tracing::{error, info};

/// What one queued task does with its file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Preprocess,
    Convert,
    PreprocessAndConvert,
}

type StepResults = (Vec<ConversionResult>, Vec<ConversionResult>);

impl Step {
    /// (preprocessing results, conversion results) for one file.
    async fn run(self, coordinator: &FileCoordinator, path: &str) -> StepResults {
        match self {
            Step::Preprocess => (vec![coordinator.preprocess_file(path).await], Vec::new()),
            Step::Convert => (Vec::new(), coordinator.convert_preprocessed(path).await),
            Step::PreprocessAndConvert => {
                let outcome = coordinator.convert_file(path).await;
                (vec![outcome.preprocessed], outcome.converted)
            }
        }
    }
}

/// Drives a file set through a [`FileCoordinator`].
///
/// Owns the run's coordinator and, through it, the run's converter caches;
/// nothing is shared between two orchestrators.
pub struct Orchestrator {
    coordinator: Arc<FileCoordinator>,
    concurrency: usize,
    two_phase: bool,
    progress: ProgressCallback,
}

impl Orchestrator {
    pub fn new(coordinator: FileCoordinator, config: &RunConfig) -> Self {
        Self {
            coordinator: Arc::new(coordinator),
            concurrency: config.concurrency.max(1),
            two_phase: config.two_phase,
            progress: config
                .progress_callback
                .clone()
                .unwrap_or_else(|| Arc::new(NoopProgressCallback)),
        }
    }

    /// Run every file, then `postprocessor` if nothing failed.
    ///
    /// Duplicate paths in `files` are processed once. Returns `Err` only for
    /// internal faults of the queue itself; conversion failures are data in
    /// the returned outcome.
    pub async fn run(
        &self,
        files: &[String],
        postprocessor: Option<&dyn Postprocessor>,
    ) -> Result<PipelineOutcome, IrconvError> {
        let started = Instant::now();
        let files = unique_in_order(files);
        let mut stats = RunStats {
            files: files.len(),
            ..RunStats::default()
        };

        let (preprocessing, conversion) = if self.two_phase {
            // ── Phase 1: preprocess ──────────────────────────────────────────
            let phase_start = Instant::now();
            self.start_stage(Stage::Preprocess, files.len());
            let (preprocessing, _) = self.run_step(Step::Preprocess, &files).await?;
            stats.preprocess_duration_ms = phase_start.elapsed().as_millis() as u64;
            self.finish_stage(Stage::Preprocess, &preprocessing);

            if preprocessing.status() == ConversionStatus::Failed {
                stats.failed = preprocessing.failures.len();
                stats.total_duration_ms = started.elapsed().as_millis() as u64;
                return Ok(PipelineOutcome {
                    preprocessing,
                    conversion: None,
                    intermediate_files: Vec::new(),
                    postprocessing: PostprocessReport::Skipped,
                    stats,
                });
            }

            // ── Phase 2: convert intermediates ───────────────────────────────
            let intermediate = intermediate_paths(&preprocessing);
            let phase_start = Instant::now();
            self.start_stage(Stage::Convert, intermediate.len());
            let (_, conversion) = self.run_step(Step::Convert, &intermediate).await?;
            stats.convert_duration_ms = phase_start.elapsed().as_millis() as u64;
            (preprocessing, conversion)
        } else {
            let phase_start = Instant::now();
            self.start_stage(Stage::Convert, files.len());
            let (preprocessing, conversion) =
                self.run_step(Step::PreprocessAndConvert, &files).await?;
            stats.convert_duration_ms = phase_start.elapsed().as_millis() as u64;
            (preprocessing, conversion)
        };

        self.finish_stage(Stage::Convert, &conversion);
        let summary = report::run_summary(files.len(), &conversion);
        report::log_summary(&summary, conversion.status() == ConversionStatus::Failed);

        let intermediate_files = intermediate_paths(&preprocessing);
        stats.intermediate_files = intermediate_files.len();
        stats.conversions = conversion.attempted();
        stats.succeeded = conversion.successes.len();
        stats.failed = preprocessing.failures.len() + conversion.failures.len();

        // ── Postprocess ──────────────────────────────────────────────────────
        let clean = preprocessing.status() == ConversionStatus::Succeeded
            && conversion.status() == ConversionStatus::Succeeded;
        let postprocessing = match postprocessor {
            Some(postprocessor) if clean => match postprocessor.postprocess().await {
                Ok(created) => PostprocessReport::Created(created),
                Err(e) => {
                    error!("{}", e);
                    PostprocessReport::Failed(e.to_string())
                }
            },
            _ => PostprocessReport::Skipped,
        };

        stats.total_duration_ms = started.elapsed().as_millis() as u64;
        Ok(PipelineOutcome {
            preprocessing,
            conversion: Some(conversion),
            intermediate_files,
            postprocessing,
            stats,
        })
    }

    fn start_stage(&self, stage: Stage, files: usize) {
        info!("{}", report::stage_prefix(stage, files));
        self.progress.on_stage_start(stage, files);
    }

    fn finish_stage(&self, stage: Stage, results: &RunResult) {
        let summary = report::stage_summary(stage, results);
        report::log_summary(&summary, results.status() == ConversionStatus::Failed);
        self.progress.on_stage_complete(stage, results);
    }

    /// Queue one task per path and merge results as each task finishes.
    ///
    /// Converter panics are already failed results by the time they get
    /// here; see [`FileCoordinator`].
    async fn run_step(&self, step: Step, paths: &[String]) -> Result<(RunResult, RunResult), IrconvError> {
        let preprocessing = Arc::new(Mutex::new(RunResult::new()));
        let conversion = Arc::new(Mutex::new(RunResult::new()));

        let actions = paths.iter().cloned().map(|path| {
            let coordinator = Arc::clone(&self.coordinator);
            let progress = Arc::clone(&self.progress);
            let preprocessing = Arc::clone(&preprocessing);
            let conversion = Arc::clone(&conversion);
            move || async move {
                let (pre, conv) = step.run(&coordinator, &path).await;
                for result in pre {
                    progress.on_file_complete(Stage::Preprocess, &result);
                    lock(&preprocessing).record(result);
                }
                for result in conv {
                    progress.on_file_complete(Stage::Convert, &result);
                    lock(&conversion).record(result);
                }
                Ok::<(), Infallible>(())
            }
        });

        queue_async_actions(actions, self.concurrency)
            .await
            .map_err(|e| IrconvError::Internal(e.to_string()))?;

        let preprocessing = std::mem::take(&mut *lock(&preprocessing));
        let conversion = std::mem::take(&mut *lock(&conversion));
        Ok((preprocessing, conversion))
    }
}

fn lock(m: &Mutex<RunResult>) -> MutexGuard<'_, RunResult> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

fn unique_in_order(files: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    files
        .iter()
        .filter(|f| seen.insert(f.as_str()))
        .cloned()
        .collect()
}

/// Successful phase 1 outputs, de-duplicated by path and sorted.
fn intermediate_paths(preprocessing: &RunResult) -> Vec<String> {
    preprocessing
        .successes
        .iter()
        .map(|r| r.output_path().to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
