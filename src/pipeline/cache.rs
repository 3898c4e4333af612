//! Run-scoped caches with at-most-once construction per key.
//!
//! Concurrent first requests for a key must share one construction, so the
//! cache stores the *in-flight future* under a lock before anyone awaits it.
//! Later callers clone the same [`Shared`] future and observe the same value,
//! including a failed value: failures are cached for the rest of the run.

use crate::converter::{Converter, CreateConverterDependencies, CreatorRegistry};
use crate::error::ConversionError;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

/// Map from key to a shared, possibly still running, computation.
pub struct InFlightMap<V: Clone + Send + Sync + 'static> {
    entries: Mutex<HashMap<String, Shared<BoxFuture<'static, V>>>>,
}

impl<V: Clone + Send + Sync + 'static> Default for InFlightMap<V> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<V: Clone + Send + Sync + 'static> InFlightMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value for `key`, starting `start` only if no entry exists yet.
    ///
    /// The entry is inserted before the lock is released and before anything
    /// is awaited, so `start` runs at most once per key.
    pub async fn get_or_start<F, Fut>(&self, key: &str, start: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V> + Send + 'static,
    {
        let shared = {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            entries
                .entry(key.to_string())
                .or_insert_with(|| start().boxed().shared())
                .clone()
        };
        shared.await
    }

    /// Store a ready value for `key`, replacing any existing entry.
    ///
    /// Callers already holding the old shared future still see the old value.
    pub fn set_ready(&self, key: &str, value: V) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), futures::future::ready(value).boxed().shared());
    }
}

/// What the converter cache holds for a key.
#[derive(Clone)]
pub enum CachedConverter {
    Ready(Arc<dyn Converter>),
    /// No creator registered; callers treat the file as pass-through or as
    /// a failure depending on their role.
    Unregistered,
    /// Construction failed. Returned for every later lookup of the key.
    Failed(ConversionError),
}

impl fmt::Debug for CachedConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CachedConverter::Ready(_) => f.write_str("Ready(<dyn Converter>)"),
            CachedConverter::Unregistered => f.write_str("Unregistered"),
            CachedConverter::Failed(e) => f.debug_tuple("Failed").field(e).finish(),
        }
    }
}

/// Lazily constructs converters from a creator registry, once per key.
pub struct ConverterCache {
    creators: CreatorRegistry,
    dependencies: Arc<CreateConverterDependencies>,
    entries: InFlightMap<CachedConverter>,
}

impl ConverterCache {
    pub fn new(creators: CreatorRegistry, dependencies: Arc<CreateConverterDependencies>) -> Self {
        Self {
            creators,
            dependencies,
            entries: InFlightMap::new(),
        }
    }

    pub fn is_registered(&self, key: &str) -> bool {
        self.creators.contains_key(key)
    }

    /// Converter for `key`, constructing it on first request.
    pub async fn get(&self, key: &str) -> CachedConverter {
        let Some(creator) = self.creators.get(key).cloned() else {
            return CachedConverter::Unregistered;
        };
        let dependencies = Arc::clone(&self.dependencies);
        let owned_key = key.to_string();

        self.entries
            .get_or_start(key, move || async move {
                debug!("Creating converter '{}'", owned_key);
                match creator.create(dependencies).await {
                    Ok(converter) => CachedConverter::Ready(converter),
                    Err(e) => {
                        let e = match e {
                            e @ ConversionError::Construction { .. } => e,
                            other => ConversionError::Construction {
                                key: owned_key.clone(),
                                detail: other.to_string(),
                            },
                        };
                        warn!("{}", e);
                        CachedConverter::Failed(e)
                    }
                }
            })
            .await
    }
}
