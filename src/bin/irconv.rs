//! CLI binary for irconv.
//!
//! A thin shim over the library crate that maps CLI flags to `RunConfig`
//! and reports the outcome.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use irconv::{
    run, ConversionResult, ConversionStatus, PipelineOutcome, PostprocessReport, ProgressCallback,
    RunConfig, RunProgressCallback, RunResult, Stage, TokioFileSystem,
};
use std::collections::HashSet;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar per stage plus a line per result.
/// Results arrive out of order when files run concurrently.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Results per file in the conversion stage (one per target language).
    targets: usize,
}

impl CliProgressCallback {
    fn new(targets: usize) -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            targets: targets.max(1),
        })
    }
}

impl RunProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage, total_files: usize) {
        let total = match stage {
            Stage::Preprocess => total_files,
            Stage::Convert => total_files * self.targets,
        };
        self.bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {pos:>3}/{len}  ⏱ {elapsed_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        self.bar.set_length(total as u64);
        self.bar.set_position(0);
        self.bar.set_prefix(stage.verb());
        self.bar.reset_eta();
    }

    fn on_file_complete(&self, stage: Stage, result: &ConversionResult) {
        match result.error() {
            None if result.source_path() != result.output_path() => {
                self.bar.println(format!(
                    "  {} {} {} {}",
                    green("✓"),
                    result.source_path(),
                    dim("→"),
                    result.output_path()
                ));
            }
            None => {}
            Some(e) => {
                self.bar.println(format!(
                    "  {} {}  {}",
                    red("✗"),
                    result.source_path(),
                    red(&e.to_string())
                ));
            }
        }
        // In single-phase runs preprocessing results share the convert bar.
        if stage == Stage::Convert || self.bar.prefix() == stage.verb() {
            self.bar.inc(1);
        }
    }

    fn on_stage_complete(&self, stage: Stage, results: &RunResult) {
        if stage == Stage::Convert || results.status() == ConversionStatus::Failed {
            self.bar.finish_and_clear();
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert one file to Python
  irconv -l Python src/greeting.ir

  # Several languages, output under a namespace directory
  irconv -l Python -l Ruby -b src -n generated src/*.ir

  # IR modules with includes, plus project files
  irconv -l JavaScript -m irconv.json -p project.json src/main.irm

  # Machine-readable outcome
  irconv -l Java --json src/*.ir > outcome.json

ENVIRONMENT VARIABLES:
  IRCONV_LANGUAGE       Comma-separated target languages
  IRCONV_CONCURRENCY    Files processed at once per stage
  RUST_LOG              Log filter (overrides -v / -q)
"#;

#[derive(Parser, Debug)]
#[command(
    name = "irconv",
    version,
    about = "Convert IR source files into multiple target languages",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Files to convert. Paths are used literally; let the shell expand globs.
    #[arg(required_unless_present = "list_languages")]
    files: Vec<String>,

    /// Target language (repeatable). See --list-languages.
    #[arg(short, long = "language", env = "IRCONV_LANGUAGE", value_delimiter = ',')]
    languages: Vec<String>,

    /// File to leave out even if listed (repeatable).
    #[arg(short, long, env = "IRCONV_EXCLUDE", value_delimiter = ',')]
    exclude: Vec<String>,

    /// Directory output paths are made relative to when --namespace is set.
    #[arg(short, long, env = "IRCONV_BASE_DIRECTORY")]
    base_directory: Option<PathBuf>,

    /// Directory to place converted files (and project files) under.
    #[arg(short, long, env = "IRCONV_NAMESPACE")]
    namespace: Option<String>,

    /// Project metadata JSON; generates one project file per language.
    #[arg(short, long, env = "IRCONV_PROJECT")]
    project: Option<PathBuf>,

    /// Module configuration JSON required for .irm files.
    #[arg(short, long, env = "IRCONV_MODULE_CONFIG")]
    module_config: Option<PathBuf>,

    #[arg(short, long, env = "IRCONV_CONCURRENCY", default_value_t = irconv::DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// Preprocess and convert each file in one pass instead of two phases.
    #[arg(long, env = "IRCONV_SINGLE_PHASE")]
    single_phase: bool,

    /// Print the run outcome as JSON on stdout.
    #[arg(long, env = "IRCONV_JSON")]
    json: bool,

    #[arg(long, env = "IRCONV_NO_PROGRESS")]
    no_progress: bool,

    /// Print the built-in languages and exit.
    #[arg(long)]
    list_languages: bool,

    #[arg(short, long, env = "IRCONV_VERBOSE")]
    verbose: bool,

    #[arg(short, long, env = "IRCONV_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level lines when it is shown.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.verbose;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── List languages ───────────────────────────────────────────────────
    if cli.list_languages {
        for language in ir_syntax::LANGUAGES {
            println!("{:<12} {}", language.name, dim(language.extension));
        }
        return Ok(ExitCode::SUCCESS);
    }

    // ── Resolve files ────────────────────────────────────────────────────
    let excluded: HashSet<&str> = cli.exclude.iter().map(String::as_str).collect();
    let files: Vec<String> = cli
        .files
        .iter()
        .filter(|f| !excluded.contains(f.as_str()))
        .cloned()
        .collect();

    // ── Build config ─────────────────────────────────────────────────────
    let mut config = build_config(&cli)?;
    if show_progress {
        // Sized from the deduplicated language list, not the raw flags.
        let cb: ProgressCallback = CliProgressCallback::new(config.languages.len());
        config.progress_callback = Some(cb);
    }

    // ── Run ──────────────────────────────────────────────────────────────
    let outcome = match run(&files, &config, Arc::new(TokioFileSystem)).await {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("{} {}", red("✘"), e);
            return Ok(ExitCode::FAILURE);
        }
    };

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&outcome).context("Failed to serialize outcome")?
        );
    } else if !cli.quiet {
        print_summary(&outcome);
    }

    Ok(outcome.exit_status().into())
}

fn build_config(cli: &Cli) -> Result<RunConfig> {
    let mut builder = RunConfig::builder()
        .languages(cli.languages.iter().cloned())
        .concurrency(cli.concurrency)
        .two_phase(!cli.single_phase);

    if let Some(ref dir) = cli.base_directory {
        builder = builder.base_directory(dir);
    }
    if let Some(ref ns) = cli.namespace {
        builder = builder.namespace(ns);
    }
    if let Some(ref project) = cli.project {
        builder = builder.project(project);
    }
    if let Some(ref module_config) = cli.module_config {
        builder = builder.module_config(module_config);
    }
    builder.build().context("Invalid configuration")
}

fn print_summary(outcome: &PipelineOutcome) {
    let stats = &outcome.stats;
    let mark = match outcome.status() {
        ConversionStatus::Succeeded => green("✔"),
        ConversionStatus::Failed => red("✘"),
    };
    eprintln!(
        "{}  {} conversion(s) across {} file(s): {} succeeded, {} failed  {}",
        mark,
        bold(&stats.conversions.to_string()),
        stats.files,
        stats.succeeded,
        stats.failed,
        dim(&format!("{}ms", stats.total_duration_ms)),
    );

    let failures = outcome
        .preprocessing
        .failures
        .iter()
        .chain(outcome.conversion.iter().flat_map(|r| r.failures.iter()));
    for failure in failures {
        eprintln!(
            "   {} {} {}",
            red(failure.source_path()),
            dim("->"),
            failure.output_path()
        );
    }

    match &outcome.postprocessing {
        PostprocessReport::Created(files) => {
            for file in files {
                eprintln!("   {} {}", cyan("◆"), file);
            }
        }
        PostprocessReport::Failed(message) => eprintln!("   {} {}", red("✗"), message),
        PostprocessReport::Skipped => {}
    }
}
