//! Preprocessor for IR module files (`.irm`).
//!
//! A module is IR with `include : <path>` directives. Each directive is
//! replaced by the contents of the named IR file, re-indented to the
//! directive's indentation. Only files listed in the module configuration
//! may be included:
//!
//! ```json
//! { "include": ["lib/common.ir", "lib/strings.ir"] }
//! ```
//!
//! The configuration is read, and every listed file loaded into the run's
//! shared [`FileContents`], once per run when the preprocessor is built.
//! Includes are expanded one level deep; directives inside included files
//! are left as they are.

use crate::converter::{Converter, ConverterCreator, CreateConverterDependencies};
use crate::error::ConversionError;
use crate::fs::{FileContents, FileSystem};
use crate::output::ConversionResult;
use crate::paths::replace_file_extension;
use crate::converters::ir::IR_EXTENSION;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// Extension of IR module files.
pub const MODULE_EXTENSION: &str = ".irm";

/// `indent`, `path`.
static RE_INCLUDE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\s*)include\s*:\s*(\S.*?)\s*$").unwrap());

#[derive(Debug, Deserialize)]
struct ModuleConfig {
    #[serde(default)]
    include: Vec<String>,
}

/// Expands includes in `.irm` files and writes the result as `.ir`.
pub struct ModuleConverter {
    includes: BTreeSet<String>,
    file_system: Arc<dyn FileSystem>,
    file_contents: Arc<FileContents>,
}

impl ModuleConverter {
    async fn expand(&self, source: &str) -> Result<String, ConversionError> {
        let mut out = String::with_capacity(source.len());
        for (i, line) in source.lines().enumerate() {
            let Some(caps) = RE_INCLUDE.captures(line) else {
                out.push_str(line);
                out.push('\n');
                continue;
            };
            let indent = &caps[1];
            let path = &caps[2];
            if !self.includes.contains(path) {
                return Err(ConversionError::other(format!(
                    "line {}: '{}' is not listed in the module configuration",
                    i + 1,
                    path
                )));
            }
            let included = self.file_contents.get(path).await?;
            for included_line in included.lines() {
                if !included_line.trim().is_empty() {
                    out.push_str(indent);
                    out.push_str(included_line);
                }
                out.push('\n');
            }
        }
        Ok(out)
    }
}

#[async_trait]
impl Converter for ModuleConverter {
    async fn convert_file(&self, source_path: &str) -> ConversionResult {
        let output_path = replace_file_extension(source_path, MODULE_EXTENSION, IR_EXTENSION);

        let source = match self.file_system.read_file(source_path).await {
            Ok(source) => source,
            Err(e) => {
                let error = ConversionError::ReadFailed {
                    path: source_path.to_string(),
                    detail: e.to_string(),
                };
                return ConversionResult::failed(source_path, output_path, error);
            }
        };

        let expanded = match self.expand(&source).await {
            Ok(expanded) => expanded,
            Err(e) => return ConversionResult::failed(source_path, output_path, e),
        };

        if let Err(e) = self.file_system.write_file(&output_path, &expanded).await {
            let error = ConversionError::WriteFailed {
                path: output_path.clone(),
                detail: e.to_string(),
            };
            return ConversionResult::failed(source_path, output_path, error);
        }
        // Phase 2 reads the intermediate from here instead of the disk. The
        // path may already be cached as an include or a single-phase read.
        self.file_contents.set(&output_path, expanded);

        ConversionResult::succeeded(source_path, output_path)
    }
}

/// Builds a [`ModuleConverter`] from the run's module configuration.
pub struct ModuleConverterCreator;

impl ModuleConverterCreator {
    fn error(detail: impl Into<String>) -> ConversionError {
        ConversionError::Construction {
            key: MODULE_EXTENSION.to_string(),
            detail: detail.into(),
        }
    }
}

#[async_trait]
impl ConverterCreator for ModuleConverterCreator {
    async fn create(
        &self,
        dependencies: Arc<CreateConverterDependencies>,
    ) -> Result<Arc<dyn Converter>, ConversionError> {
        let Some(config_path) = dependencies.module_config.as_ref() else {
            return Err(Self::error(
                "No module configuration file provided (--module-config).",
            ));
        };
        let config_path = config_path.to_string_lossy();

        let raw = dependencies
            .file_system
            .read_file(&config_path)
            .await
            .map_err(|e| Self::error(format!("Could not read '{}': {}", config_path, e)))?;
        let config: ModuleConfig = serde_json::from_str(&raw)
            .map_err(|e| Self::error(format!("Could not parse '{}': {}", config_path, e)))?;

        for include in &config.include {
            dependencies
                .file_contents
                .get(include)
                .await
                .map_err(|e| Self::error(e.to_string()))?;
        }
        debug!(
            "Loaded module configuration '{}' with {} include(s)",
            config_path,
            config.include.len()
        );

        Ok(Arc::new(ModuleConverter {
            includes: config.include.into_iter().collect(),
            file_system: Arc::clone(&dependencies.file_system),
            file_contents: Arc::clone(&dependencies.file_contents),
        }))
    }
}
