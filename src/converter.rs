//! Converter contracts.
//!
//! A [`Converter`] turns one file into one output file. Converters are built
//! lazily by a [`ConverterCreator`], at most once per key per run, by
//! [`crate::pipeline::cache::ConverterCache`]. Keys are file extensions
//! (`.irm`) for preprocessors and language names (`Python`) for targets.

use crate::error::ConversionError;
use crate::fs::{FileContents, FileSystem};
use crate::output::ConversionResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Converts files of one kind.
///
/// Implementations never return `Err`: every problem is reported as a failed
/// [`ConversionResult`] so the run can carry on with other files.
#[async_trait]
pub trait Converter: Send + Sync {
    async fn convert_file(&self, source_path: &str) -> ConversionResult;
}

/// Builds a [`Converter`]. Construction may fail, e.g. on missing
/// configuration; the failure is cached for the rest of the run.
#[async_trait]
pub trait ConverterCreator: Send + Sync {
    async fn create(
        &self,
        dependencies: Arc<CreateConverterDependencies>,
    ) -> Result<Arc<dyn Converter>, ConversionError>;
}

/// Key to creator.
pub type CreatorRegistry = HashMap<String, Arc<dyn ConverterCreator>>;

/// Everything a creator may need, shared by every converter in a run.
pub struct CreateConverterDependencies {
    pub file_system: Arc<dyn FileSystem>,
    /// Contents already loaded this run, keyed by path.
    pub file_contents: Arc<FileContents>,
    pub base_directory: Option<PathBuf>,
    pub output_namespace: Option<String>,
    pub module_config: Option<PathBuf>,
}

impl CreateConverterDependencies {
    pub fn new(file_system: Arc<dyn FileSystem>, file_contents: Arc<FileContents>) -> Self {
        Self {
            file_system,
            file_contents,
            base_directory: None,
            output_namespace: None,
            module_config: None,
        }
    }

    pub fn with_base_directory(mut self, dir: Option<PathBuf>) -> Self {
        self.base_directory = dir;
        self
    }

    pub fn with_output_namespace(mut self, namespace: Option<String>) -> Self {
        self.output_namespace = namespace;
        self
    }

    pub fn with_module_config(mut self, path: Option<PathBuf>) -> Self {
        self.module_config = path;
        self
    }
}
