//! Error types for the irconv library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`IrconvError`]: **Fatal**, the run cannot proceed at all, e.g. no target
//!   language or unusable project metadata. Returned
//!   as `Err(IrconvError)` from the top-level `run*` functions.
//!
//! * [`ConversionError`]: **Non-fatal**, one file failed to convert for one
//!   target. Stored inside [`crate::output::ConversionResult`] so the rest of
//!   the run still completes and the failure shows up in the summary.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the irconv library.
#[derive(Debug, Error)]
pub enum IrconvError {
    // ── Configuration errors ──────────────────────────────────────────────
    /// No target language was requested.
    #[error("No language(s) provided.\nAvailable languages: {available}")]
    NoLanguages { available: String },

    /// A requested target language is not built in.
    #[error("Unknown language '{name}'.\nAvailable languages: {available}")]
    UnknownLanguage { name: String, available: String },

    /// The project metadata file could not be read.
    #[error("Could not read project metadata '{path}': {source}")]
    ProjectReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The project metadata file was read but is not usable.
    #[error("Could not parse project metadata '{path}': {detail}")]
    MalformedProject { path: PathBuf, detail: String },

    /// A configuration value is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Postprocessing errors ─────────────────────────────────────────────
    /// A postprocessing step failed after every conversion succeeded.
    #[error("Postprocessing failed: {0}")]
    PostprocessFailed(String),

    // ── Internal errors ───────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error for one file and one converter.
///
/// Implements `Clone` so results can be both logged and returned, and
/// `Serialize` so a whole run can be dumped as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConversionError {
    /// The converter for `key` could not be constructed. Every file routed to
    /// that converter during the run reports this same error.
    #[error("Could not create converter '{key}': {detail}")]
    Construction { key: String, detail: String },

    /// No creator is registered for `key`.
    #[error("No converter registered for '{key}'")]
    Unregistered { key: String },

    #[error("Could not read '{path}': {detail}")]
    ReadFailed { path: String, detail: String },

    #[error("Could not write '{path}': {detail}")]
    WriteFailed { path: String, detail: String },

    #[error("Invalid syntax in '{path}': {detail}")]
    Syntax { path: String, detail: String },

    /// The conversion task panicked; the panic payload is kept as text.
    #[error("Conversion of '{path}' panicked: {detail}")]
    Panicked { path: String, detail: String },

    #[error("{message}")]
    Other { message: String },
}

impl ConversionError {
    pub fn other(message: impl Into<String>) -> Self {
        ConversionError::Other {
            message: message.into(),
        }
    }
}

/// Render a panic payload caught by `catch_unwind` or a `JoinError`.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
