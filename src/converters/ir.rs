//! Target-language converter: `.ir` source to one language via `ir-syntax`.

use crate::converter::{Converter, ConverterCreator, CreateConverterDependencies};
use crate::error::ConversionError;
use crate::fs::{FileContents, FileSystem};
use crate::output::ConversionResult;
use crate::paths::{rebase_output_path, replace_file_extension};
use async_trait::async_trait;
use ir_syntax::Language;
use std::path::PathBuf;
use std::sync::Arc;

/// Extension of intermediate-representation files.
pub const IR_EXTENSION: &str = ".ir";

/// Converts IR files into one target language.
pub struct IrConverter {
    language: &'static Language,
    file_system: Arc<dyn FileSystem>,
    file_contents: Arc<FileContents>,
    base_directory: Option<PathBuf>,
    output_namespace: Option<String>,
}

impl IrConverter {
    /// Where the output for `source_path` is written.
    pub fn output_path(&self, source_path: &str) -> String {
        let renamed = replace_file_extension(source_path, IR_EXTENSION, self.language.extension);
        rebase_output_path(
            &renamed,
            self.base_directory.as_deref(),
            self.output_namespace.as_deref(),
        )
    }
}

#[async_trait]
impl Converter for IrConverter {
    async fn convert_file(&self, source_path: &str) -> ConversionResult {
        let output_path = self.output_path(source_path);

        let source = match self.file_contents.get(source_path).await {
            Ok(source) => source,
            Err(e) => return ConversionResult::failed(source_path, output_path, e),
        };

        let output = match self.language.convert(&source) {
            Ok(output) => output,
            Err(e) => {
                return ConversionResult::failed(
                    source_path,
                    output_path,
                    ConversionError::Syntax {
                        path: source_path.to_string(),
                        detail: e.to_string(),
                    },
                )
            }
        };

        if let Err(e) = self.file_system.write_file(&output_path, &output).await {
            let error = ConversionError::WriteFailed {
                path: output_path.clone(),
                detail: e.to_string(),
            };
            return ConversionResult::failed(source_path, output_path, error);
        }

        ConversionResult::succeeded(source_path, output_path)
    }
}

/// Builds an [`IrConverter`] for one language. Never fails.
pub struct IrConverterCreator {
    language: &'static Language,
}

impl IrConverterCreator {
    pub fn new(language: &'static Language) -> Self {
        Self { language }
    }
}

#[async_trait]
impl ConverterCreator for IrConverterCreator {
    async fn create(
        &self,
        dependencies: Arc<CreateConverterDependencies>,
    ) -> Result<Arc<dyn Converter>, ConversionError> {
        Ok(Arc::new(IrConverter {
            language: self.language,
            file_system: Arc::clone(&dependencies.file_system),
            file_contents: Arc::clone(&dependencies.file_contents),
            base_directory: dependencies.base_directory.clone(),
            output_namespace: dependencies.output_namespace.clone(),
        }))
    }
}
