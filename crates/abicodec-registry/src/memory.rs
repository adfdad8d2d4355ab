//! In-memory `SchemaRegistry` implementation.
//!
//! Schemas live in an arena (`Vec<Arc<Schema>>`); the fingerprint and
//! signature indexes store [`SchemaId`] handles into it. A [`MemoryRegistry`]
//! is immutable once built, so it can be shared across threads without
//! locking. All mutation goes through [`RegistryBuilder`].
//!
//! Schemas are also indexed by name (the source id, else the schema name) and
//! version, so a revision history can be walked with [`MemoryRegistry::history`]
//! and the latest non-deprecated revision resolved with
//! [`MemoryRegistry::get_by_name`].

use abicodec_core::{
    error::SchemaError,
    fingerprint::Fingerprint,
    schema::{Schema, SchemaKind, SchemaRegistry},
};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, path::Path, sync::Arc};

use crate::source::{self, SchemaSource};

/// Handle of a schema inside one registry's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaId(u32);

impl SchemaId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What to do when a fingerprint is already bound to a structurally
/// different schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Fail the load with `DuplicateFingerprint`.
    #[default]
    Reject,
    /// Keep the schema that was registered first and log a warning.
    KeepFirst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryState {
    Empty,
    Loaded,
}

/// Result of a single insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(SchemaId),
    /// A structurally identical schema was already present.
    Unchanged(SchemaId),
    /// A different schema owns the fingerprint and `KeepFirst` kept it.
    Skipped(SchemaId),
}

#[derive(Debug, Clone, Default)]
struct Arena {
    schemas: Vec<Arc<Schema>>,
    by_fingerprint: HashMap<Fingerprint, SchemaId>,
    by_signature: HashMap<(SchemaKind, String), SchemaId>,
    /// name → ids, ascending by version; unversioned schemas sort first
    by_name: HashMap<String, Vec<SchemaId>>,
}

fn version_of(schema: &Schema) -> u32 {
    schema.meta().version.unwrap_or(0)
}

impl Arena {
    fn get(&self, id: SchemaId) -> Option<&Arc<Schema>> {
        self.schemas.get(id.index())
    }

    fn revisions(&self, name: &str) -> impl Iterator<Item = &Arc<Schema>> + '_ {
        self.by_name
            .get(name)
            .into_iter()
            .flatten()
            .filter_map(|id| self.get(*id))
    }

    /// A different schema already registered under the same name and explicit version.
    fn version_conflict(&self, schema: &Schema) -> Option<(SchemaId, u32)> {
        let version = schema.meta().version?;
        let key = schema.meta().key(schema.name());
        self.by_name
            .get(key)?
            .iter()
            .copied()
            .find(|id| {
                self.get(*id)
                    .is_some_and(|s| s.meta().version == Some(version))
            })
            .map(|id| (id, version))
    }

    fn push(&mut self, schema: Arc<Schema>) -> Result<SchemaId, SchemaError> {
        let id = u32::try_from(self.schemas.len())
            .map(SchemaId)
            .map_err(|_| SchemaError::Parse("registry arena is full".into()))?;
        self.by_fingerprint.insert(schema.fingerprint(), id);
        self.by_signature
            .insert((schema.kind(), schema.signature().to_string()), id);

        let version = version_of(&schema);
        let ids = self
            .by_name
            .entry(schema.meta().key(schema.name()).to_string())
            .or_default();
        // ties keep insertion order
        let at = ids.partition_point(|other| {
            self.schemas
                .get(other.index())
                .map_or(true, |s| version_of(s) <= version)
        });
        ids.insert(at, id);

        self.schemas.push(schema);
        Ok(id)
    }

    /// Drop every schema at or after `len` along with its index entries.
    fn truncate(&mut self, len: usize) {
        if len >= self.schemas.len() {
            return;
        }
        for schema in self.schemas.drain(len..) {
            self.by_fingerprint.remove(&schema.fingerprint());
            self.by_signature
                .remove(&(schema.kind(), schema.signature().to_string()));
        }
        self.by_name.retain(|_, ids| {
            ids.retain(|id| id.index() < len);
            !ids.is_empty()
        });
    }
}

/// An immutable, fingerprint-keyed schema snapshot.
#[derive(Debug, Clone)]
pub struct MemoryRegistry {
    arena: Arena,
    state: RegistryState,
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self {
            arena: Arena::default(),
            state: RegistryState::Empty,
        }
    }
}

impl MemoryRegistry {
    /// A registry with no schemas, in the `Empty` state.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Build a registry from one source with the default `Reject` policy.
    pub fn from_source(source: impl SchemaSource) -> Result<Self, SchemaError> {
        let mut builder = RegistryBuilder::new();
        builder.load(source)?;
        Ok(builder.build())
    }

    /// Build a registry from a single `.csdl`, `.json`/`.abi` or `.sol`/`.txt` file.
    pub fn from_file(path: &Path) -> Result<Self, SchemaError> {
        let mut builder = RegistryBuilder::new();
        builder.load_file(path)?;
        Ok(builder.build())
    }

    pub fn state(&self) -> RegistryState {
        self.state
    }

    pub fn get(&self, id: SchemaId) -> Option<Arc<Schema>> {
        self.arena.get(id).cloned()
    }

    pub fn id_of(&self, fp: &Fingerprint) -> Option<SchemaId> {
        self.arena.by_fingerprint.get(fp).copied()
    }

    /// All schemas in insertion order.
    pub fn schemas(&self) -> impl Iterator<Item = &Arc<Schema>> {
        self.arena.schemas.iter()
    }

    /// A revision by name. `None` picks the highest version that is not deprecated.
    pub fn get_by_name(&self, name: &str, version: Option<u32>) -> Option<Arc<Schema>> {
        let mut revisions = self.arena.revisions(name);
        let found = match version {
            Some(v) => revisions.find(|s| s.meta().version == Some(v)),
            None => revisions.filter(|s| !s.meta().deprecated).last(),
        };
        found.cloned()
    }

    /// Every revision registered under `name`, oldest first, deprecated ones included.
    pub fn history(&self, name: &str) -> Vec<Arc<Schema>> {
        self.arena.revisions(name).cloned().collect()
    }

    /// Schemas that declare `chain` among their chains, in insertion order.
    pub fn list_for_chain(&self, chain: &str) -> Vec<Arc<Schema>> {
        self.schemas()
            .filter(|s| s.meta().applies_to_chain(chain))
            .cloned()
            .collect()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.arena.by_name.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// A builder seeded with this snapshot's schemas; the arena entries are shared.
    pub fn to_builder(&self) -> RegistryBuilder {
        RegistryBuilder {
            arena: self.arena.clone(),
            policy: DuplicatePolicy::default(),
        }
    }
}

impl SchemaRegistry for MemoryRegistry {
    fn get_by_fingerprint(&self, fp: &Fingerprint) -> Option<Arc<Schema>> {
        self.id_of(fp).and_then(|id| self.get(id))
    }

    fn fingerprint_of(&self, kind: SchemaKind, signature: &str) -> Option<Fingerprint> {
        let id = self
            .arena
            .by_signature
            .get(&(kind, signature.to_string()))?;
        self.arena.get(*id).map(|s| s.fingerprint())
    }

    fn len(&self) -> usize {
        self.arena.schemas.len()
    }
}

/// The mutable loading phase of a registry.
#[derive(Debug, Clone, Default)]
pub struct RegistryBuilder {
    arena: Arena,
    policy: DuplicatePolicy,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.arena.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.schemas.is_empty()
    }

    /// Insert one schema. Re-inserting a structurally identical schema is a no-op.
    pub fn insert(&mut self, schema: Schema) -> Result<InsertOutcome, SchemaError> {
        let fp = schema.fingerprint();
        let existing = self
            .arena
            .by_fingerprint
            .get(&fp)
            .and_then(|id| self.arena.get(*id).map(|s| (*id, s)));

        match existing {
            None => match self.arena.version_conflict(&schema) {
                None => self.arena.push(Arc::new(schema)).map(InsertOutcome::Inserted),
                Some((id, version)) => match self.policy {
                    DuplicatePolicy::Reject => Err(SchemaError::DuplicateVersion {
                        name: schema.meta().key(schema.name()).to_string(),
                        version,
                    }),
                    DuplicatePolicy::KeepFirst => {
                        tracing::warn!(
                            name = schema.meta().key(schema.name()),
                            version,
                            ignored = %schema.declaration(),
                            "version already registered; keeping the first schema"
                        );
                        Ok(InsertOutcome::Skipped(id))
                    }
                },
            },
            Some((id, current)) if current.is_structurally_equal(&schema) => {
                Ok(InsertOutcome::Unchanged(id))
            }
            Some((id, current)) => match self.policy {
                DuplicatePolicy::Reject => Err(SchemaError::DuplicateFingerprint {
                    fingerprint: fp,
                    existing: current.declaration(),
                    incoming: schema.declaration(),
                }),
                DuplicatePolicy::KeepFirst => {
                    tracing::warn!(
                        fingerprint = %fp,
                        kept = %current.declaration(),
                        ignored = %schema.declaration(),
                        "fingerprint collision; keeping the first schema"
                    );
                    Ok(InsertOutcome::Skipped(id))
                }
            },
        }
    }

    /// Insert every schema from `source`. Returns how many were new.
    ///
    /// The load is atomic: on error the builder is left as it was before the call.
    pub fn load(&mut self, source: impl SchemaSource) -> Result<usize, SchemaError> {
        let schemas = source.schemas()?;
        let before = self.arena.schemas.len();
        let mut added = 0;
        for schema in schemas {
            match self.insert(schema) {
                Ok(InsertOutcome::Inserted(_)) => added += 1,
                Ok(_) => {}
                Err(err) => {
                    self.arena.truncate(before);
                    return Err(err);
                }
            }
        }
        tracing::debug!(added, total = self.len(), "schemas loaded");
        Ok(added)
    }

    /// Load a single schema file; the format is picked from its extension.
    pub fn load_file(&mut self, path: &Path) -> Result<usize, SchemaError> {
        let source = source::from_path(path)?;
        self.load(source)
    }

    /// Load every recognised schema file under `dir`, recursively, in path order.
    ///
    /// Every file is parsed before anything is inserted, so one bad file leaves
    /// the builder unchanged.
    pub fn load_directory(&mut self, dir: &Path) -> Result<usize, SchemaError> {
        let mut schemas = Vec::new();
        for path in source::schema_files(dir)? {
            let parsed = source::from_path(&path)?
                .schemas()
                .map_err(|e| match e {
                    SchemaError::Parse(msg) => {
                        SchemaError::Parse(format!("{}: {msg}", path.display()))
                    }
                    other => other,
                })?;
            schemas.extend(parsed);
        }
        self.load(schemas)
    }

    /// Freeze into an immutable registry in the `Loaded` state.
    pub fn build(self) -> MemoryRegistry {
        MemoryRegistry {
            arena: self.arena,
            state: RegistryState::Loaded,
        }
    }
}
