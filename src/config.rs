//! Configuration types for a conversion run.
//!
//! All run behaviour is controlled through [`RunConfig`], built via its
//! [`RunConfigBuilder`]. The CLI maps its flags onto the builder one to one.

use crate::error::IrconvError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;

/// Default bound on concurrently running file tasks.
pub const DEFAULT_CONCURRENCY: usize = 16;

/// Configuration for a conversion run.
///
/// # Example
/// ```rust
/// use irconv::RunConfig;
///
/// let config = RunConfig::builder()
///     .language("Python")
///     .language("Ruby")
///     .concurrency(4)
///     .build()
///     .unwrap();
/// assert_eq!(config.languages, vec!["Python", "Ruby"]);
/// ```
#[derive(Clone)]
pub struct RunConfig {
    /// Target language names, in request order, without duplicates.
    pub languages: Vec<String>,

    /// Maximum number of files processed at once per stage. Default: 16.
    pub concurrency: usize,

    /// Run the preprocessing phase before conversion. Default: true.
    ///
    /// With `false`, each file is preprocessed and immediately converted in a
    /// single pass; intermediate paths are then not de-duplicated.
    pub two_phase: bool,

    /// Root that output paths are made relative to when `namespace` is set.
    pub base_directory: Option<PathBuf>,

    /// Directory prefix placed on every target output path.
    pub namespace: Option<String>,

    /// Project metadata JSON. When set, project files are generated after a
    /// fully successful run.
    pub project: Option<PathBuf>,

    /// Configuration file required by the `.irm` module preprocessor.
    pub module_config: Option<PathBuf>,

    pub progress_callback: Option<ProgressCallback>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            languages: Vec::new(),
            concurrency: DEFAULT_CONCURRENCY,
            two_phase: true,
            base_directory: None,
            namespace: None,
            project: None,
            module_config: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunConfig")
            .field("languages", &self.languages)
            .field("concurrency", &self.concurrency)
            .field("two_phase", &self.two_phase)
            .field("base_directory", &self.base_directory)
            .field("namespace", &self.namespace)
            .field("project", &self.project)
            .field("module_config", &self.module_config)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn RunProgressCallback>"),
            )
            .finish()
    }
}

impl RunConfig {
    /// Create a new builder for `RunConfig`.
    pub fn builder() -> RunConfigBuilder {
        RunConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`RunConfig`].
#[derive(Debug)]
pub struct RunConfigBuilder {
    config: RunConfig,
}

impl RunConfigBuilder {
    /// Add a target language. Repeats are ignored.
    pub fn language(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.config.languages.contains(&name) {
            self.config.languages.push(name);
        }
        self
    }

    pub fn languages<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names.into_iter().fold(self, |b, n| b.language(n))
    }

    /// A limit of 0 is treated as 1.
    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn two_phase(mut self, v: bool) -> Self {
        self.config.two_phase = v;
        self
    }

    pub fn base_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.base_directory = Some(dir.into());
        self
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.namespace = Some(namespace.into());
        self
    }

    pub fn project(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.project = Some(path.into());
        self
    }

    pub fn module_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.module_config = Some(path.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    ///
    /// Language names are checked later, against the built-in registry, by
    /// [`crate::convert::resolve_languages`].
    pub fn build(self) -> Result<RunConfig, IrconvError> {
        let c = &self.config;
        if c.concurrency == 0 {
            return Err(IrconvError::InvalidConfig("Concurrency must be ≥ 1".into()));
        }
        if let Some(ns) = &c.namespace {
            if ns.trim_matches('/').is_empty() {
                return Err(IrconvError::InvalidConfig(
                    "Namespace must name a directory".into(),
                ));
            }
        }
        Ok(self.config)
    }
}
