//! Run entry points.
//!
//! [`run`] is what the CLI calls: it validates configuration, wires the
//! built-in converters into an [`Orchestrator`] and runs it.
//! [`run_pipeline`] is for callers that bring their own converters.

use crate::config::RunConfig;
use crate::converter::CreateConverterDependencies;
use crate::converters::{default_preprocessors, language_targets};
use crate::error::{panic_message, IrconvError};
use crate::fs::{FileContents, FileSystem, TokioFileSystem};
use crate::output::{ExitStatus, PipelineOutcome};
use crate::pipeline::cache::ConverterCache;
use crate::pipeline::coordinator::FileCoordinator;
use crate::pipeline::orchestrator::Orchestrator;
use crate::pipeline::postprocess::{Postprocessor, ProjectFilesPostprocessor, ProjectMetadata};
use futures::FutureExt;
use ir_syntax::Language;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Convert `files` into every language in `config`.
///
/// # Errors
/// Returns `Err(IrconvError)` only for fatal errors, all detected before
/// any file is touched:
/// - no language, or an unknown language name
/// - unreadable or malformed project metadata
///
/// Conversion failures are reported in the returned [`PipelineOutcome`].
pub async fn run(
    files: &[String],
    config: &RunConfig,
    file_system: Arc<dyn FileSystem>,
) -> Result<PipelineOutcome, IrconvError> {
    // ── Step 1: Resolve languages ────────────────────────────────────────
    let languages = resolve_languages(&config.languages)?;
    debug!(
        "Target languages: {}",
        languages.iter().map(|l| l.name).collect::<Vec<_>>().join(", ")
    );

    // ── Step 2: Load project metadata ────────────────────────────────────
    let metadata = match &config.project {
        Some(path) => Some(load_project_metadata(file_system.as_ref(), path).await?),
        None => None,
    };

    // ── Step 3: Build caches and orchestrator ────────────────────────────
    let orchestrator = build_orchestrator(config, &languages, Arc::clone(&file_system));
    let postprocessor = metadata.map(|metadata| {
        ProjectFilesPostprocessor::new(Arc::clone(&file_system), languages.clone(), metadata)
            .output_directory(config.namespace.as_ref().map(PathBuf::from))
    });

    // ── Step 4: Run ──────────────────────────────────────────────────────
    info!("Starting run: {} file(s)", files.len());
    run_pipeline(
        &orchestrator,
        files,
        postprocessor.as_ref().map(|p| p as &dyn Postprocessor),
    )
    .await
}

/// Run an already wired orchestrator.
///
/// Panics escaping the orchestrator are caught here and reported as
/// [`IrconvError::Internal`].
pub async fn run_pipeline(
    orchestrator: &Orchestrator,
    files: &[String],
    postprocessor: Option<&dyn Postprocessor>,
) -> Result<PipelineOutcome, IrconvError> {
    AssertUnwindSafe(orchestrator.run(files, postprocessor))
        .catch_unwind()
        .await
        .map_err(|payload| IrconvError::Internal(panic_message(payload.as_ref())))?
}

/// [`run`], reduced to a process exit status. Fatal errors are logged once.
pub async fn run_to_exit_status(
    files: &[String],
    config: &RunConfig,
    file_system: Arc<dyn FileSystem>,
) -> ExitStatus {
    match run(files, config, file_system).await {
        Ok(outcome) => outcome.exit_status(),
        Err(e) => {
            error!("{}", e);
            ExitStatus::Error
        }
    }
}

/// Synchronous wrapper around [`run`] on the real file system.
///
/// Creates a temporary tokio runtime internally.
pub fn run_sync(files: &[String], config: &RunConfig) -> Result<PipelineOutcome, IrconvError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| IrconvError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(run(files, config, Arc::new(TokioFileSystem)))
}

/// Map language names to built-in languages, in request order.
pub fn resolve_languages(names: &[String]) -> Result<Vec<&'static Language>, IrconvError> {
    let available = || ir_syntax::names().join(", ");
    if names.is_empty() {
        return Err(IrconvError::NoLanguages {
            available: available(),
        });
    }
    names
        .iter()
        .map(|name| {
            ir_syntax::by_name(name).ok_or_else(|| IrconvError::UnknownLanguage {
                name: name.clone(),
                available: available(),
            })
        })
        .collect()
}

/// Read and parse the project metadata file.
pub async fn load_project_metadata(
    file_system: &dyn FileSystem,
    path: &Path,
) -> Result<ProjectMetadata, IrconvError> {
    let raw = file_system
        .read_file(&path.to_string_lossy())
        .await
        .map_err(|e| IrconvError::ProjectReadFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
    ProjectMetadata::parse(path, &raw)
}

/// Wire the built-in converters for `languages` into a fresh orchestrator.
///
/// Every call builds new caches, so two orchestrators never share state.
pub fn build_orchestrator(
    config: &RunConfig,
    languages: &[&'static Language],
    file_system: Arc<dyn FileSystem>,
) -> Orchestrator {
    let file_contents = Arc::new(FileContents::new(Arc::clone(&file_system)));
    let dependencies = Arc::new(
        CreateConverterDependencies::new(file_system, file_contents)
            .with_base_directory(config.base_directory.clone())
            .with_output_namespace(config.namespace.clone())
            .with_module_config(config.module_config.clone()),
    );
    let coordinator = FileCoordinator::new(
        ConverterCache::new(default_preprocessors(), Arc::clone(&dependencies)),
        ConverterCache::new(language_targets(languages), dependencies),
        languages.iter().map(|l| l.name.to_string()).collect(),
    );
    Orchestrator::new(coordinator, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFileSystem;
    use crate::output::{ConversionStatus, PostprocessReport};

    fn files(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn resolves_languages_in_order() {
        let langs = resolve_languages(&files(&["Ruby", "C#"])).unwrap();
        assert_eq!(langs.iter().map(|l| l.name).collect::<Vec<_>>(), vec!["Ruby", "C#"]);
    }

    #[test]
    fn language_errors_are_fatal() {
        assert!(matches!(resolve_languages(&[]), Err(IrconvError::NoLanguages { .. })));
        assert!(matches!(
            resolve_languages(&files(&["Python", "Cobol"])),
            Err(IrconvError::UnknownLanguage { ref name, .. }) if name == "Cobol"
        ));
    }

    #[tokio::test]
    async fn configuration_errors_stop_before_any_file() {
        let fs = Arc::new(MemoryFileSystem::with_files([
            ("a.ir", "print : 1\n"),
            ("project.json", "{ nope"),
        ]));
        let config = RunConfig::builder()
            .language("Python")
            .project("project.json")
            .build()
            .unwrap();
        let err = run(&files(&["a.ir"]), &config, fs.clone()).await.unwrap_err();
        assert!(matches!(err, IrconvError::MalformedProject { .. }));
        assert!(fs.get("a.py").is_none());

        let config = RunConfig::builder().language("Python").project("missing.json").build().unwrap();
        let err = run(&files(&["a.ir"]), &config, fs.clone()).await.unwrap_err();
        assert!(matches!(err, IrconvError::ProjectReadFailed { .. }));
    }

    #[tokio::test]
    async fn full_run_in_memory() {
        let fs = Arc::new(MemoryFileSystem::with_files([
            ("src/greeting.ir", "print : \"hello\"\n"),
            ("project.json", r#"{"name": "greeter", "version": "0.1.0", "description": "hi"}"#),
        ]));
        let config = RunConfig::builder()
            .languages(["Python", "JavaScript"])
            .base_directory("src")
            .namespace("out")
            .project("project.json")
            .build()
            .unwrap();
        let outcome = run(&files(&["src/greeting.ir"]), &config, fs.clone()).await.unwrap();

        assert_eq!(outcome.status(), ConversionStatus::Succeeded);
        assert_eq!(fs.get("out/greeting.py").unwrap(), "print(\"hello\")\n");
        assert_eq!(fs.get("out/greeting.js").unwrap(), "console.log(\"hello\");\n");
        assert_eq!(
            outcome.postprocessing,
            PostprocessReport::Created(vec!["out/setup.py".into(), "out/package.json".into()])
        );
        assert_eq!(outcome.exit_status(), ExitStatus::Ok);
    }

    #[test]
    fn runs_on_a_current_thread_runtime() {
        let fs = Arc::new(MemoryFileSystem::with_files([("a.ir", "print : 1\n")]));
        let config = RunConfig::builder().language("Ruby").build().unwrap();
        let outcome = tokio_test::block_on(run(&files(&["a.ir"]), &config, fs.clone())).unwrap();
        assert_eq!(outcome.exit_status(), ExitStatus::Ok);
        assert_eq!(fs.get("a.rb").unwrap(), "puts 1\n");
    }

    #[tokio::test]
    async fn preprocessed_output_replaces_cached_include() {
        // lib.ir is both a listed include (read when the module converter
        // is built) and the intermediate written for lib.irm.
        let fs = Arc::new(MemoryFileSystem::with_files([
            ("mods.json", r#"{"include":["lib.ir"]}"#),
            ("lib.ir", "print : \"old\""),
            ("lib.irm", "print : \"new\""),
        ]));
        let config = RunConfig::builder()
            .language("Python")
            .module_config("mods.json")
            .build()
            .unwrap();
        let outcome = run(&files(&["lib.irm"]), &config, fs.clone()).await.unwrap();

        assert_eq!(outcome.status(), ConversionStatus::Succeeded);
        assert_eq!(fs.get("lib.ir").unwrap(), "print : \"new\"\n");
        assert_eq!(fs.get("lib.py").unwrap(), "print(\"new\")\n");
        assert_eq!(
            fs.files().into_keys().collect::<Vec<_>>(),
            vec!["lib.ir", "lib.irm", "lib.py", "mods.json"]
        );
    }

    #[test]
    fn run_sync_writes_next_to_sources() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("hello.ir");
        std::fs::write(&source, "print : \"hi\"\n").unwrap();
        let config = RunConfig::builder().language("Python").build().unwrap();

        let outcome = run_sync(&[source.to_string_lossy().into_owned()], &config).unwrap();

        assert_eq!(outcome.exit_status(), ExitStatus::Ok);
        let written = std::fs::read_to_string(dir.path().join("hello.py")).unwrap();
        assert_eq!(written, "print(\"hi\")\n");
    }

    #[tokio::test]
    async fn exit_status_reflects_failures() {
        let fs = Arc::new(MemoryFileSystem::with_files([("bad.ir", "not ir at all\n")]));
        let config = RunConfig::builder().language("Ruby").build().unwrap();
        assert_eq!(run_to_exit_status(&files(&["bad.ir"]), &config, fs).await, ExitStatus::Error);

        let config = RunConfig::builder().build().unwrap();
        let fs = Arc::new(MemoryFileSystem::new());
        assert_eq!(run_to_exit_status(&[], &config, fs).await, ExitStatus::Error);
    }
}
