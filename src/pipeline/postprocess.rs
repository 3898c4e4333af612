//! Postprocessing: project-level side effects after a fully successful run.
//!
//! The built-in [`ProjectFilesPostprocessor`] writes one project file per
//! target language (`setup.py`, `package.json`, `MyProject.csproj`, ...)
//! from a small JSON metadata file:
//!
//! ```json
//! { "name": "my project", "version": "1.0.0", "description": "Says hello" }
//! ```
//!
//! `name` is converted to each language's case style before it is inserted
//! into that language's template; every other scalar field is inserted as is.

use crate::error::IrconvError;
use crate::fs::FileSystem;
use async_trait::async_trait;
use ir_syntax::{insert_into_template, Language};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// A step run once, after every conversion succeeded.
#[async_trait]
pub trait Postprocessor: Send + Sync {
    /// Returns the paths it created.
    async fn postprocess(&self) -> Result<Vec<String>, IrconvError>;
}

/// Parsed project metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectMetadata {
    pub name: String,
    /// Every scalar field of the JSON object, `name` included, as text.
    pub values: BTreeMap<String, String>,
}

impl ProjectMetadata {
    /// Parse the metadata JSON read from `path`.
    ///
    /// The document must be an object with a string `name`. Nested arrays
    /// and objects are ignored; numbers and booleans become text.
    pub fn parse(path: &Path, raw: &str) -> Result<Self, IrconvError> {
        let malformed = |detail: String| IrconvError::MalformedProject {
            path: path.to_path_buf(),
            detail,
        };

        let document: Value = serde_json::from_str(raw).map_err(|e| malformed(e.to_string()))?;
        let object = document
            .as_object()
            .ok_or_else(|| malformed("expected a JSON object".into()))?;
        let name = object
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| malformed("missing string field \"name\"".into()))?
            .to_string();

        let values = object
            .iter()
            .filter_map(|(key, value)| {
                let text = match value {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    _ => return None,
                };
                Some((key.clone(), text))
            })
            .collect();

        Ok(Self { name, values })
    }

    /// Template values for `language`, with `name` in its case style.
    pub fn values_for(&self, language: &Language) -> BTreeMap<String, String> {
        let mut values = self.values.clone();
        values.insert(
            "name".to_string(),
            language.project.name_style.convert(&self.name),
        );
        values
    }
}

/// Writes one project file per target language.
pub struct ProjectFilesPostprocessor {
    file_system: Arc<dyn FileSystem>,
    languages: Vec<&'static Language>,
    metadata: ProjectMetadata,
    output_directory: Option<PathBuf>,
}

impl ProjectFilesPostprocessor {
    pub fn new(
        file_system: Arc<dyn FileSystem>,
        languages: Vec<&'static Language>,
        metadata: ProjectMetadata,
    ) -> Self {
        Self {
            file_system,
            languages,
            metadata,
            output_directory: None,
        }
    }

    /// Write project files under `dir` instead of the working directory.
    pub fn output_directory(mut self, dir: Option<PathBuf>) -> Self {
        self.output_directory = dir;
        self
    }

    /// (path, contents) of the project file for `language`.
    ///
    /// Values are escaped for the project file's syntax; the file name uses
    /// them as is.
    pub fn render(&self, language: &Language) -> (String, String) {
        let values = self.metadata.values_for(language);
        let file_name = insert_into_template(language.project.file_name, &values);
        let path = match &self.output_directory {
            Some(dir) => dir.join(&file_name).to_string_lossy().into_owned(),
            None => file_name,
        };
        let escaped = values
            .iter()
            .map(|(key, value)| (key.clone(), language.project.escape.apply(value)))
            .collect();
        let mut contents =
            insert_into_template(&language.project.file_format.join("\n"), &escaped);
        contents.push('\n');
        (path, contents)
    }
}

#[async_trait]
impl Postprocessor for ProjectFilesPostprocessor {
    async fn postprocess(&self) -> Result<Vec<String>, IrconvError> {
        let mut created = Vec::with_capacity(self.languages.len());
        for language in &self.languages {
            let (path, contents) = self.render(language);
            self.file_system
                .write_file(&path, &contents)
                .await
                .map_err(|e| {
                    IrconvError::PostprocessFailed(format!("Could not write '{}': {}", path, e))
                })?;
            info!("{}: Created {}", language.name, path);
            created.push(path);
        }
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFileSystem;

    const META: &str = r#"{ "name": "hello world", "version": "1.2.0", "description": "Greets", "stars": 3, "tags": ["x"] }"#;

    #[test]
    fn parses_scalars_and_requires_name() {
        let meta = ProjectMetadata::parse(Path::new("p.json"), META).unwrap();
        assert_eq!(meta.name, "hello world");
        assert_eq!(meta.values["stars"], "3");
        assert!(!meta.values.contains_key("tags"));

        let err = ProjectMetadata::parse(Path::new("p.json"), r#"{"version": "1"}"#).unwrap_err();
        assert!(err.to_string().contains("name"));
        assert!(matches!(
            ProjectMetadata::parse(Path::new("p.json"), "{ not json"),
            Err(IrconvError::MalformedProject { .. })
        ));
        assert!(matches!(
            ProjectMetadata::parse(Path::new("p.json"), "[1, 2]"),
            Err(IrconvError::MalformedProject { .. })
        ));
    }

    #[test]
    fn renders_name_in_language_case() {
        let meta = ProjectMetadata::parse(Path::new("p.json"), META).unwrap();
        let post = ProjectFilesPostprocessor::new(
            Arc::new(MemoryFileSystem::new()),
            vec![],
            meta,
        );
        let (path, contents) = post.render(ir_syntax::by_name("C#").unwrap());
        assert_eq!(path, "HelloWorld.csproj");
        assert!(contents.contains("<AssemblyName>HelloWorld</AssemblyName>"));
        assert!(contents.contains("<Version>1.2.0</Version>"));

        let (path, contents) = post.render(ir_syntax::by_name("Python").unwrap());
        assert_eq!(path, "setup.py");
        assert!(contents.contains("name=\"hello_world\""));
    }

    #[test]
    fn escapes_values_for_each_file_syntax() {
        let raw = r#"{ "name": "demo", "description": "Say \"hi\" <loud> & #{proud}" }"#;
        let meta = ProjectMetadata::parse(Path::new("p.json"), raw).unwrap();
        let post = ProjectFilesPostprocessor::new(Arc::new(MemoryFileSystem::new()), vec![], meta);

        let (_, csproj) = post.render(ir_syntax::by_name("C#").unwrap());
        assert!(csproj.contains(
            "<Description>Say &quot;hi&quot; &lt;loud&gt; &amp; #{proud}</Description>"
        ));

        let (_, package) = post.render(ir_syntax::by_name("JavaScript").unwrap());
        let parsed: Value = serde_json::from_str(&package).unwrap();
        assert_eq!(parsed["description"], "Say \"hi\" <loud> & #{proud}");

        let (_, gemspec) = post.render(ir_syntax::by_name("Ruby").unwrap());
        assert!(gemspec.contains(r#"s.summary = "Say \"hi\" <loud> & \#{proud}""#));
    }

    #[tokio::test]
    async fn writes_one_file_per_language() {
        let fs = Arc::new(MemoryFileSystem::new());
        let languages = vec![
            ir_syntax::by_name("JavaScript").unwrap(),
            ir_syntax::by_name("Ruby").unwrap(),
        ];
        let meta = ProjectMetadata::parse(Path::new("p.json"), META).unwrap();
        let post = ProjectFilesPostprocessor::new(fs.clone(), languages, meta)
            .output_directory(Some(PathBuf::from("out")));
        let created = post.postprocess().await.unwrap();
        assert_eq!(created, vec!["out/package.json", "out/hello_world.gemspec"]);
        assert!(fs.get("out/package.json").unwrap().contains("\"name\": \"hello-world\""));
    }
}
