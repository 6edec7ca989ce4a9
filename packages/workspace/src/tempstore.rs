//! Server-side staging for in-progress edit sessions.
//!
//! Commands never mutate the stored entity field directly. Each session
//! works a staging entry: a private copy of the layout tree keyed by
//! entity, field and view mode. Mutating commands rewrite the entry,
//! save copies it back through the [`EntityAdapter`], cancel throws it
//! away.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use collage_model::LayoutTree;

use crate::adapters::{AdapterError, EntityAdapter};

/// Identity of one staged field.
///
/// The string form `entity--field--view_mode` is the storage key and
/// doubles as the layout id the client editor was booted with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageKey {
    pub entity: String,
    pub field: String,
    pub view_mode: String,
}

impl StorageKey {
    pub fn new(
        entity: impl Into<String>,
        field: impl Into<String>,
        view_mode: impl Into<String>,
    ) -> Self {
        Self {
            entity: entity.into(),
            field: field.into(),
            view_mode: view_mode.into(),
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}--{}--{}", self.entity, self.field, self.view_mode)
    }
}

/// Where a pending insert lands once its form is submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertAnchor {
    Before(Uuid),
    After(Uuid),
    Region { parent: Uuid, region: String },
    /// End of the top level.
    End,
}

/// A two-phase insert between placement and form submit.
///
/// The insert command already placed the component in the staging
/// layout; the anchor is kept so the submit response can tell the
/// client where the rendered markup belongs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingInsert {
    pub uuid: Uuid,
    pub type_id: String,
    pub anchor: InsertAnchor,
}

/// One staged layout plus its bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct StagingEntry {
    pub layout: LayoutTree,
    /// Bumped by every mutating command; echoed to the client for
    /// lost-update detection.
    pub revision: u64,
    pub updated: DateTime<Utc>,
    pub pending: Option<PendingInsert>,
}

impl StagingEntry {
    pub fn new(layout: LayoutTree) -> Self {
        Self {
            layout,
            revision: 1,
            updated: Utc::now(),
            pending: None,
        }
    }

    /// Stamps a mutation: next revision, fresh update time.
    pub fn touch(&mut self) {
        self.revision += 1;
        self.updated = Utc::now();
    }
}

/// Shared store of staging entries.
///
/// `get` lazily seeds a missing entry from the adapter, so the first
/// command of a session transparently copies the stored field value
/// into staging.
pub struct TempstoreRepository {
    adapter: Arc<dyn EntityAdapter>,
    entries: RwLock<HashMap<StorageKey, StagingEntry>>,
}

impl TempstoreRepository {
    pub fn new(adapter: Arc<dyn EntityAdapter>) -> Self {
        Self {
            adapter,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// The existing entry, or a fresh one seeded from the entity field.
    pub async fn get(&self, key: &StorageKey) -> Result<StagingEntry, AdapterError> {
        // Try read lock first
        {
            let entries = self.entries.read().await;
            if let Some(entry) = entries.get(key) {
                return Ok(entry.clone());
            }
        }

        let layout = self.adapter.load(&key.entity, &key.field)?;

        let mut entries = self.entries.write().await;
        // Double-check (another task may have seeded it)
        if let Some(entry) = entries.get(key) {
            return Ok(entry.clone());
        }
        let entry = StagingEntry::new(layout);
        entries.insert(key.clone(), entry.clone());
        Ok(entry)
    }

    /// The existing entry, without seeding a missing one.
    pub async fn peek(&self, key: &StorageKey) -> Option<StagingEntry> {
        self.entries.read().await.get(key).cloned()
    }

    pub async fn set(&self, key: &StorageKey, entry: StagingEntry) {
        self.entries.write().await.insert(key.clone(), entry);
    }

    /// Drops an entry. Returns whether one existed.
    pub async fn delete(&self, key: &StorageKey) -> bool {
        self.entries.write().await.remove(key).is_some()
    }

    pub async fn contains(&self, key: &StorageKey) -> bool {
        self.entries.read().await.contains_key(key)
    }
}
