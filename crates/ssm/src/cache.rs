//! Compiled-model caches keyed by the definition fingerprint.
//!
//! | Cache | Scope | Persistence |
//! |-------|-------|-------------|
//! | [`NoCache`] | none | compiles on every request |
//! | [`MemoryCache`] | process | `HashMap` behind a `Mutex` |
//! | [`FileCache`] | directory | `cached-{name}-{fingerprint}.json` plus an in-memory layer |
//!
//! Every cache returns a value equivalent to `definition.compile()`; a
//! cache is purely an optimisation. A corrupt or mismatching artifact on
//! disk is logged and rebuilt, and a failed write never fails the request.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::definition::{CompiledModel, ModelDefinition};
use crate::error::ModelError;

/// Source of compiled models, shared across worker threads.
pub trait ModelCache: Send + Sync {
    /// Returns the compiled model for `definition`, building it if needed.
    ///
    /// # Errors
    ///
    /// Returns the [`ModelError`] from [`ModelDefinition::compile()`] when
    /// the definition itself is invalid.
    fn get_or_build(&self, definition: &ModelDefinition) -> Result<Arc<CompiledModel>, ModelError>;
}

/// Compiles on every request.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCache;

impl ModelCache for NoCache {
    fn get_or_build(&self, definition: &ModelDefinition) -> Result<Arc<CompiledModel>, ModelError> {
        Ok(Arc::new(definition.compile()?))
    }
}

/// Process-wide cache.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Arc<CompiledModel>>>,
}

impl MemoryCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of compiled models held.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if nothing has been compiled yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<CompiledModel>>> {
        // A panic while holding the lock cannot leave a half-written entry.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn get(&self, fingerprint: &str) -> Option<Arc<CompiledModel>> {
        self.lock().get(fingerprint).cloned()
    }

    fn insert(&self, compiled: Arc<CompiledModel>) -> Arc<CompiledModel> {
        self.lock()
            .entry(compiled.fingerprint().to_string())
            .or_insert(compiled)
            .clone()
    }
}

impl ModelCache for MemoryCache {
    fn get_or_build(&self, definition: &ModelDefinition) -> Result<Arc<CompiledModel>, ModelError> {
        let fingerprint = definition.fingerprint();
        if let Some(hit) = self.get(&fingerprint) {
            return Ok(hit);
        }
        let compiled = Arc::new(definition.compile()?);
        Ok(self.insert(compiled))
    }
}

/// Directory-backed cache with an in-memory front.
#[derive(Debug)]
pub struct FileCache {
    dir: PathBuf,
    memory: MemoryCache,
}

impl FileCache {
    /// Creates a cache rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            memory: MemoryCache::new(),
        }
    }

    /// Cache directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Artifact path for `definition`.
    pub fn artifact_path(&self, definition: &ModelDefinition) -> PathBuf {
        self.dir.join(format!(
            "cached-{}-{}.json",
            definition.name(),
            definition.fingerprint()
        ))
    }

    fn load(&self, path: &Path, definition: &ModelDefinition) -> Option<CompiledModel> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read cached model, rebuilding");
                return None;
            }
        };
        let compiled: CompiledModel = match serde_json::from_str(&text) {
            Ok(compiled) => compiled,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "corrupt cached model, rebuilding");
                return None;
            }
        };
        if compiled.definition() != definition {
            warn!(path = %path.display(), "cached model belongs to another definition, rebuilding");
            return None;
        }
        if let Err(e) = compiled.validate() {
            warn!(path = %path.display(), error = %e, "stale cached model, rebuilding");
            return None;
        }
        Some(compiled)
    }

    fn store(&self, path: &Path, compiled: &CompiledModel) {
        let result = fs::create_dir_all(&self.dir)
            .map_err(|e| e.to_string())
            .and_then(|()| serde_json::to_string(compiled).map_err(|e| e.to_string()))
            .and_then(|json| fs::write(path, json).map_err(|e| e.to_string()));
        match result {
            Ok(()) => debug!(path = %path.display(), "wrote cached model"),
            Err(e) => warn!(path = %path.display(), error = %e, "cannot write cached model"),
        }
    }
}

impl ModelCache for FileCache {
    fn get_or_build(&self, definition: &ModelDefinition) -> Result<Arc<CompiledModel>, ModelError> {
        let fingerprint = definition.fingerprint();
        if let Some(hit) = self.memory.get(&fingerprint) {
            return Ok(hit);
        }

        let path = self.artifact_path(definition);
        let compiled = match self.load(&path, definition) {
            Some(compiled) => {
                debug!(path = %path.display(), "loaded cached model");
                compiled
            }
            None => {
                let compiled = definition.compile()?;
                self.store(&path, &compiled);
                compiled
            }
        };
        Ok(self.memory.insert(Arc::new(compiled)))
    }
}
