//! Per-file coordination: preprocess by extension, then fan out to targets.

use crate::error::{panic_message, ConversionError};
use crate::output::ConversionResult;
use crate::paths::get_file_extension;
use crate::pipeline::cache::{CachedConverter, ConverterCache};
use crate::pipeline::report;
use crate::progress::Stage;
use futures::future::join_all;
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;

/// Results of taking one file through both stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    pub preprocessed: ConversionResult,
    /// One result per target; empty when preprocessing failed.
    pub converted: Vec<ConversionResult>,
}

/// Converts single files using a run's converter caches.
///
/// Preprocessors are keyed by file extension, targets by language name.
pub struct FileCoordinator {
    preprocessors: ConverterCache,
    targets: ConverterCache,
    target_names: Vec<String>,
}

impl FileCoordinator {
    pub fn new(preprocessors: ConverterCache, targets: ConverterCache, target_names: Vec<String>) -> Self {
        Self {
            preprocessors,
            targets,
            target_names,
        }
    }

    /// Phase 1 for one file.
    ///
    /// An extension with no registered preprocessor is a pass-through: the
    /// result succeeds with `output_path == path`. A panicking preprocessor
    /// fails this file's preprocessing result.
    pub async fn preprocess_file(&self, path: &str) -> ConversionResult {
        let result = isolate_panic(path, async {
            match self.preprocessors.get(get_file_extension(path)).await {
                CachedConverter::Unregistered => ConversionResult::succeeded(path, path),
                CachedConverter::Failed(e) => ConversionResult::failed(path, path, e),
                CachedConverter::Ready(converter) => converter.convert_file(path).await,
            }
        })
        .await;
        report::log_result(Stage::Preprocess, &result);
        result
    }

    /// Phase 2 for one (already preprocessed) file: every target runs
    /// independently on the same input, and a failure or panic in one does
    /// not stop the others. Always one result per target.
    pub async fn convert_preprocessed(&self, path: &str) -> Vec<ConversionResult> {
        join_all(self.target_names.iter().map(|name| async move {
            let result = isolate_panic(path, async {
                match self.targets.get(name).await {
                    CachedConverter::Ready(converter) => converter.convert_file(path).await,
                    CachedConverter::Unregistered => ConversionResult::failed(
                        path,
                        path,
                        ConversionError::Unregistered { key: name.clone() },
                    ),
                    CachedConverter::Failed(e) => ConversionResult::failed(path, path, e),
                }
            })
            .await;
            report::log_result(Stage::Convert, &result);
            result
        }))
        .await
    }

    /// Both phases for one file. Phase 2 runs only if phase 1 succeeded.
    pub async fn convert_file(&self, path: &str) -> FileOutcome {
        let preprocessed = self.preprocess_file(path).await;
        let converted = if preprocessed.is_success() {
            self.convert_preprocessed(preprocessed.output_path()).await
        } else {
            Vec::new()
        };
        FileOutcome {
            preprocessed,
            converted,
        }
    }
}

/// Run one (file, converter) pair, turning a panic into a failed result.
async fn isolate_panic<F>(path: &str, pair: F) -> ConversionResult
where
    F: Future<Output = ConversionResult>,
{
    AssertUnwindSafe(pair).catch_unwind().await.unwrap_or_else(|payload| {
        let error = ConversionError::Panicked {
            path: path.to_string(),
            detail: panic_message(payload.as_ref()),
        };
        ConversionResult::failed(path, path, error)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::{Converter, ConverterCreator, CreateConverterDependencies, CreatorRegistry};
    use crate::fs::{FileContents, MemoryFileSystem};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// Records calls; fails when the path contains `fail_on` and panics
    /// when it contains `panic_on`.
    struct Recording {
        suffix: &'static str,
        fail_on: Option<&'static str>,
        panic_on: Option<&'static str>,
        seen: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Converter for Recording {
        async fn convert_file(&self, source_path: &str) -> ConversionResult {
            self.seen.lock().unwrap().push(source_path.to_string());
            if self.panic_on.is_some_and(|pat| source_path.contains(pat)) {
                panic!("{source_path} blew up");
            }
            let out = format!("{source_path}{}", self.suffix);
            match self.fail_on {
                Some(pat) if source_path.contains(pat) => {
                    ConversionResult::failed(source_path, out, ConversionError::other("nope"))
                }
                _ => ConversionResult::succeeded(source_path, out),
            }
        }
    }

    struct Creator(Option<Arc<Recording>>);

    #[async_trait]
    impl ConverterCreator for Creator {
        async fn create(
            &self,
            _deps: Arc<CreateConverterDependencies>,
        ) -> Result<Arc<dyn Converter>, ConversionError> {
            match &self.0 {
                Some(c) => Ok(c.clone()),
                None => Err(ConversionError::other("missing config")),
            }
        }
    }

    fn cache(entries: Vec<(&str, Creator)>) -> ConverterCache {
        let mut creators: CreatorRegistry = HashMap::new();
        for (k, c) in entries {
            creators.insert(k.to_string(), Arc::new(c));
        }
        let fs = Arc::new(MemoryFileSystem::new());
        let deps = CreateConverterDependencies::new(fs.clone(), Arc::new(FileContents::new(fs)));
        ConverterCache::new(creators, Arc::new(deps))
    }

    fn recording(suffix: &'static str, fail_on: Option<&'static str>) -> (Arc<Recording>, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        (
            Arc::new(Recording {
                suffix,
                fail_on,
                panic_on: None,
                seen: seen.clone(),
            }),
            seen,
        )
    }

    fn panicking(suffix: &'static str) -> Arc<Recording> {
        Arc::new(Recording {
            suffix,
            fail_on: None,
            panic_on: Some(""),
            seen: Arc::new(Mutex::new(Vec::new())),
        })
    }

    #[tokio::test]
    async fn unknown_extension_passes_through_unchanged() {
        let (py, seen) = recording(".py", None);
        let coordinator = FileCoordinator::new(
            cache(vec![(".irm", Creator(None))]),
            cache(vec![("Python", Creator(Some(py)))]),
            vec!["Python".into()],
        );
        let outcome = coordinator.convert_file("a.ir").await;
        assert_eq!(outcome.preprocessed, ConversionResult::succeeded("a.ir", "a.ir"));
        assert_eq!(outcome.converted, vec![ConversionResult::succeeded("a.ir", "a.ir.py")]);
        assert_eq!(*seen.lock().unwrap(), vec!["a.ir".to_string()]);
    }

    #[tokio::test]
    async fn failed_preprocessor_construction_stops_the_file() {
        let (py, seen) = recording(".py", None);
        let coordinator = FileCoordinator::new(
            cache(vec![(".irm", Creator(None))]),
            cache(vec![("Python", Creator(Some(py)))]),
            vec!["Python".into()],
        );
        let outcome = coordinator.convert_file("m.irm").await;
        assert!(!outcome.preprocessed.is_success());
        assert_eq!(outcome.preprocessed.output_path(), "m.irm");
        assert!(matches!(
            outcome.preprocessed.error(),
            Some(ConversionError::Construction { key, .. }) if key == ".irm"
        ));
        assert!(outcome.converted.is_empty());
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn preprocessed_output_feeds_targets() {
        let (pre, _) = recording(".ir", None);
        let (py, seen) = recording(".py", None);
        let coordinator = FileCoordinator::new(
            cache(vec![(".irm", Creator(Some(pre)))]),
            cache(vec![("Python", Creator(Some(py)))]),
            vec!["Python".into()],
        );
        let outcome = coordinator.convert_file("m.irm").await;
        assert_eq!(outcome.preprocessed.output_path(), "m.irm.ir");
        assert_eq!(*seen.lock().unwrap(), vec!["m.irm.ir".to_string()]);
    }

    #[tokio::test]
    async fn targets_fail_independently() {
        let (good, _) = recording(".y", None);
        let coordinator = FileCoordinator::new(
            cache(vec![]),
            cache(vec![("X", Creator(None)), ("Y", Creator(Some(good)))]),
            vec!["X".into(), "Y".into(), "Z".into()],
        );
        let results = coordinator.convert_preprocessed("g.ir").await;
        assert_eq!(results.len(), 3);
        assert!(matches!(results[0].error(), Some(ConversionError::Construction { .. })));
        assert_eq!(results[1], ConversionResult::succeeded("g.ir", "g.ir.y"));
        assert!(matches!(
            results[2].error(),
            Some(ConversionError::Unregistered { key }) if key == "Z"
        ));
    }

    #[tokio::test]
    async fn panicking_target_leaves_sibling_result() {
        let (good, seen) = recording(".y", None);
        let coordinator = FileCoordinator::new(
            cache(vec![]),
            cache(vec![("X", Creator(Some(panicking(".x")))), ("Y", Creator(Some(good)))]),
            vec!["X".into(), "Y".into()],
        );
        let results = coordinator.convert_preprocessed("a.ir").await;
        assert_eq!(results.len(), 2);
        assert!(matches!(
            results[0].error(),
            Some(ConversionError::Panicked { path, detail }) if path == "a.ir" && detail.contains("blew up")
        ));
        assert_eq!(results[1], ConversionResult::succeeded("a.ir", "a.ir.y"));
        assert_eq!(*seen.lock().unwrap(), vec!["a.ir".to_string()]);
    }

    #[tokio::test]
    async fn panicking_preprocessor_fails_preprocessing_only() {
        let (py, seen) = recording(".py", None);
        let coordinator = FileCoordinator::new(
            cache(vec![(".irm", Creator(Some(panicking(".ir"))))]),
            cache(vec![("Python", Creator(Some(py)))]),
            vec!["Python".into()],
        );
        let outcome = coordinator.convert_file("m.irm").await;
        assert!(matches!(outcome.preprocessed.error(), Some(ConversionError::Panicked { .. })));
        assert!(outcome.converted.is_empty());
        assert!(seen.lock().unwrap().is_empty());
    }
}
