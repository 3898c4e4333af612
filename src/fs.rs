//! File system access.
//!
//! Converters never touch the disk directly; they go through
//! [`FileSystem`] so a run can target the real disk ([`TokioFileSystem`]) or
//! memory ([`MemoryFileSystem`], used by tests and dry runs).

use crate::error::ConversionError;
use crate::pipeline::cache::InFlightMap;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

#[async_trait]
pub trait FileSystem: Send + Sync {
    async fn read_file(&self, path: &str) -> io::Result<String>;

    /// Write `contents`, creating parent directories as needed.
    async fn write_file(&self, path: &str, contents: &str) -> io::Result<()>;
}

/// The real file system, via `tokio::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioFileSystem;

#[async_trait]
impl FileSystem for TokioFileSystem {
    async fn read_file(&self, path: &str) -> io::Result<String> {
        tokio::fs::read_to_string(path).await
    }

    /// Atomic: writes a sibling temp file, then renames it over `path`.
    async fn write_file(&self, path: &str, contents: &str) -> io::Result<()> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let tmp_path = format!("{path}.tmp");
        tokio::fs::write(&tmp_path, contents).await?;
        tokio::fs::rename(&tmp_path, path).await
    }
}

/// In-memory file system.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    files: Mutex<BTreeMap<String, String>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_files<I, P, C>(files: I) -> Self
    where
        I: IntoIterator<Item = (P, C)>,
        P: Into<String>,
        C: Into<String>,
    {
        Self {
            files: Mutex::new(
                files
                    .into_iter()
                    .map(|(p, c)| (p.into(), c.into()))
                    .collect(),
            ),
        }
    }

    pub fn get(&self, path: &str) -> Option<String> {
        self.lock().get(path).cloned()
    }

    /// Every file, sorted by path.
    pub fn files(&self) -> BTreeMap<String, String> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.files.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl FileSystem for MemoryFileSystem {
    async fn read_file(&self, path: &str) -> io::Result<String> {
        self.get(path).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no such file: {path}"))
        })
    }

    async fn write_file(&self, path: &str, contents: &str) -> io::Result<()> {
        self.lock().insert(path.to_string(), contents.to_string());
        Ok(())
    }
}

/// Run-scoped cache of file contents.
///
/// Each path is read at most once, even when several converters ask for it
/// at the same time. Read failures are cached too.
pub struct FileContents {
    file_system: Arc<dyn FileSystem>,
    entries: InFlightMap<Result<Arc<str>, ConversionError>>,
}

impl FileContents {
    pub fn new(file_system: Arc<dyn FileSystem>) -> Self {
        Self {
            file_system,
            entries: InFlightMap::new(),
        }
    }

    /// Contents of `path`, reading it on first request.
    pub async fn get(&self, path: &str) -> Result<Arc<str>, ConversionError> {
        let file_system = Arc::clone(&self.file_system);
        let owned = path.to_string();
        self.entries
            .get_or_start(path, move || async move {
                file_system
                    .read_file(&owned)
                    .await
                    .map(Arc::<str>::from)
                    .map_err(|e| ConversionError::ReadFailed {
                        path: owned.clone(),
                        detail: e.to_string(),
                    })
            })
            .await
    }

    /// Record `contents` as the current text of `path`, replacing anything
    /// read or recorded earlier in the run.
    pub fn set(&self, path: &str, contents: impl Into<Arc<str>>) {
        self.entries.set_ready(path, Ok(contents.into()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingFs {
        inner: MemoryFileSystem,
        reads: AtomicUsize,
    }

    #[async_trait]
    impl FileSystem for CountingFs {
        async fn read_file(&self, path: &str) -> io::Result<String> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            self.inner.read_file(path).await
        }

        async fn write_file(&self, path: &str, contents: &str) -> io::Result<()> {
            self.inner.write_file(path, contents).await
        }
    }

    #[tokio::test]
    async fn memory_round_trip() {
        let fs = MemoryFileSystem::new();
        fs.write_file("a/b.txt", "hi").await.unwrap();
        assert_eq!(fs.read_file("a/b.txt").await.unwrap(), "hi");
        let err = fs.read_file("missing").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn tokio_write_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/out.py");
        let path = path.to_str().unwrap();
        TokioFileSystem.write_file(path, "print(1)\n").await.unwrap();
        assert_eq!(TokioFileSystem.read_file(path).await.unwrap(), "print(1)\n");
        assert!(!Path::new(&format!("{path}.tmp")).exists());
    }

    #[tokio::test]
    async fn file_contents_reads_once() {
        let fs = Arc::new(CountingFs {
            inner: MemoryFileSystem::with_files([("x.ir", "print : 1")]),
            reads: AtomicUsize::new(0),
        });
        let contents = Arc::new(FileContents::new(fs.clone()));
        let reads: Vec<_> = (0..5)
            .map(|_| {
                let contents = Arc::clone(&contents);
                tokio::spawn(async move { contents.get("x.ir").await })
            })
            .collect();
        for r in reads {
            assert_eq!(&*r.await.unwrap().unwrap(), "print : 1");
        }
        assert_eq!(fs.reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn set_replaces_text_already_read() {
        let fs = Arc::new(MemoryFileSystem::with_files([("a.ir", "print : 1")]));
        let contents = FileContents::new(fs.clone());
        assert_eq!(&*contents.get("a.ir").await.unwrap(), "print : 1");
        contents.set("a.ir", "print : 2");
        assert_eq!(&*contents.get("a.ir").await.unwrap(), "print : 2");
        // Only the cache changes; writing the file is the caller's job.
        assert_eq!(fs.get("a.ir").as_deref(), Some("print : 1"));
    }

    #[tokio::test]
    async fn missing_file_is_read_failure() {
        let contents = FileContents::new(Arc::new(MemoryFileSystem::new()));
        assert!(matches!(
            contents.get("nope").await,
            Err(ConversionError::ReadFailed { .. })
        ));
    }
}
