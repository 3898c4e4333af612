//! Human-readable log lines and run summaries.

use crate::output::{ConversionResult, RunResult};
use crate::progress::Stage;
use tracing::{error, info};

/// Prefix every line of `text` with four spaces.
pub fn indent(text: &str) -> String {
    format!("    {}", text.replace('\n', "\n    "))
}

fn plural(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

/// `Converting 3 files...`
pub fn stage_prefix(stage: Stage, files: usize) -> String {
    format!("{} {}...", stage.verb(), plural(files, "file", "files"))
}

/// `Converted a.ir to a.py`, or `Failed converting a.ir:` plus the indented
/// diagnostic. `None` for a pass-through, which is not worth a line.
pub fn result_line(stage: Stage, result: &ConversionResult) -> Option<String> {
    let (done, failed) = match stage {
        Stage::Preprocess => ("Preprocessed", "preprocessing"),
        Stage::Convert => ("Converted", "converting"),
    };
    match result.error() {
        None if result.source_path() == result.output_path() => None,
        None => Some(format!(
            "{done} {} to {}",
            result.source_path(),
            result.output_path()
        )),
        Some(e) => Some(format!(
            "Failed {failed} {}:\n{}",
            result.source_path(),
            indent(&e.to_string())
        )),
    }
}

/// One line per attempted (file, converter) pair.
pub fn log_result(stage: Stage, result: &ConversionResult) {
    if let Some(line) = result_line(stage, result) {
        if result.is_success() {
            info!("{}", line);
        } else {
            error!("{}", line);
        }
    }
}

/// `Converting complete.` or `Converting failed with 2 failures.` followed
/// by one `source -> output` line per failure.
pub fn stage_summary(stage: Stage, results: &RunResult) -> String {
    if results.failures.is_empty() {
        return format!("{} complete.", stage.verb());
    }
    let mut out = format!(
        "{} failed with {}.",
        stage.verb(),
        plural(results.failures.len(), "failure", "failures")
    );
    push_failures(&mut out, results);
    out
}

/// `Ran 4 conversions across 2 files. Success!` or
/// `Ran 4 conversions across 2 files. 3 successes. 1 failure.` followed by
/// the failing pairs.
pub fn run_summary(files: usize, results: &RunResult) -> String {
    let mut out = format!(
        "Ran {} across {}.",
        plural(results.attempted(), "conversion", "conversions"),
        plural(files, "file", "files")
    );
    if results.failures.is_empty() {
        out.push_str(" Success!");
        return out;
    }
    out.push_str(&format!(
        " {}. {}.",
        plural(results.successes.len(), "success", "successes"),
        plural(results.failures.len(), "failure", "failures")
    ));
    push_failures(&mut out, results);
    out
}

fn push_failures(out: &mut String, results: &RunResult) {
    let mut failures: Vec<&ConversionResult> = results.failures.iter().collect();
    failures.sort_by(|a, b| {
        (a.source_path(), a.output_path()).cmp(&(b.source_path(), b.output_path()))
    });
    for failure in failures {
        out.push('\n');
        out.push_str(&indent(&format!(
            "{} -> {}",
            failure.source_path(),
            failure.output_path()
        )));
    }
}

/// Log a summary at `info` when clean and at `error` otherwise.
pub fn log_summary(summary: &str, failed: bool) {
    if failed {
        error!("{}", summary);
    } else {
        info!("{}", summary);
    }
}
