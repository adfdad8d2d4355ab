//! Copy-on-write publication of registry snapshots.
//!
//! Readers take a [`snapshot`](SharedRegistry::snapshot) (an `Arc` clone) and
//! decode against it without further locking. A reload builds a new
//! [`MemoryRegistry`] off to the side and swaps the pointer; readers holding
//! the old snapshot keep it until they drop it.

use abicodec_core::{
    error::SchemaError,
    fingerprint::Fingerprint,
    schema::{Schema, SchemaKind, SchemaRegistry},
};
use std::{
    path::Path,
    sync::{Arc, Mutex, PoisonError, RwLock},
};

use crate::{
    memory::{DuplicatePolicy, MemoryRegistry, RegistryState},
    source::SchemaSource,
};

/// Thread-safe handle to the current registry snapshot.
#[derive(Debug, Default)]
pub struct SharedRegistry {
    current: RwLock<Arc<MemoryRegistry>>,
    /// Serialises reloads so concurrent writers cannot lose each other's schemas.
    writer: Mutex<()>,
    policy: DuplicatePolicy,
}

impl SharedRegistry {
    /// An `Empty` registry.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Publish an existing snapshot.
    pub fn from_registry(registry: MemoryRegistry) -> Self {
        Self {
            current: RwLock::new(Arc::new(registry)),
            ..Self::default()
        }
    }

    /// The snapshot current at the time of the call.
    pub fn snapshot(&self) -> Arc<MemoryRegistry> {
        Arc::clone(&*self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn state(&self) -> RegistryState {
        self.snapshot().state()
    }

    /// Replace the current snapshot, returning the previous one.
    pub fn publish(&self, registry: MemoryRegistry) -> Arc<MemoryRegistry> {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        self.swap(Arc::new(registry))
    }

    /// Build a new snapshot from the current one plus `source`, then publish it.
    /// Returns the number of schemas added. On error nothing is published.
    pub fn reload(&self, source: impl SchemaSource) -> Result<usize, SchemaError> {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let mut builder = self.snapshot().to_builder().with_policy(self.policy);
        let added = builder.load(source)?;
        let next = builder.build();
        tracing::debug!(added, total = next.len(), "publishing registry snapshot");
        self.swap(Arc::new(next));
        Ok(added)
    }

    /// [`reload`](Self::reload) from a schema file.
    pub fn reload_file(&self, path: &Path) -> Result<usize, SchemaError> {
        self.reload(crate::source::from_path(path)?)
    }

    fn swap(&self, next: Arc<MemoryRegistry>) -> Arc<MemoryRegistry> {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *current, next)
    }
}

impl SchemaRegistry for SharedRegistry {
    fn get_by_fingerprint(&self, fp: &Fingerprint) -> Option<Arc<Schema>> {
        self.snapshot().get_by_fingerprint(fp)
    }

    fn fingerprint_of(&self, kind: SchemaKind, signature: &str) -> Option<Fingerprint> {
        self.snapshot().fingerprint_of(kind, signature)
    }

    fn len(&self) -> usize {
        self.snapshot().len()
    }
}
