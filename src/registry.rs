//! The module registry: an in-memory catalog of scraping modules mirrored to
//! `modules.json`, plus the add/delete/refresh protocol that keeps cached
//! scripts in line with their remote metadata.
//!
//! # Locking
//!
//! Every operation, including `list` and `get_content`, holds the registry
//! lock for its full duration. Network fetches inside `add` and `refresh`
//! therefore block all other callers until they finish.
//!
//! # Failure handling
//!
//! `add`, `delete` and `get_content` return the first error they hit.
//! Persistence failures and per-record refresh failures are logged and never
//! returned; the registry keeps serving from memory.

use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    error::{RegistryError, RegistryResult},
    fetcher::ModuleFetcher,
    module::{script_file_name, ModuleMetadata, ModuleRecord, ModuleSummary},
    store::ModuleStore,
};

#[derive(Debug, Default)]
struct RegistryState {
    records: IndexMap<Uuid, ModuleRecord>,
}

pub struct Registry {
    state: Mutex<RegistryState>,
    store: ModuleStore,
    fetcher: Arc<dyn ModuleFetcher>,
}

/// Result of refreshing one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RefreshOutcome {
    Unchanged,
    Updated { from: String, to: String },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshEntry {
    pub id: Uuid,
    pub name: String,
    #[serde(flatten)]
    pub outcome: RefreshOutcome,
}

/// Per-record outcomes of one refresh cycle, in registry order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefreshReport {
    pub entries: Vec<RefreshEntry>,
}

impl RefreshReport {
    pub fn updated(&self) -> usize {
        self.count(|o| matches!(o, RefreshOutcome::Updated { .. }))
    }

    pub fn unchanged(&self) -> usize {
        self.count(|o| matches!(o, RefreshOutcome::Unchanged))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, RefreshOutcome::Failed { .. }))
    }

    pub fn outcome(&self, id: Uuid) -> Option<&RefreshOutcome> {
        self.entries
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| &entry.outcome)
    }

    fn count(&self, pred: impl Fn(&RefreshOutcome) -> bool) -> usize {
        self.entries.iter().filter(|entry| pred(&entry.outcome)).count()
    }
}

impl Registry {
    /// Builds a registry persisted at `<storage_dir>/modules.json` and loads
    /// whatever is already there.
    pub async fn new<P: AsRef<Path>>(storage_dir: P, fetcher: Arc<dyn ModuleFetcher>) -> Self {
        let registry = Self {
            state: Mutex::new(RegistryState::default()),
            store: ModuleStore::new(storage_dir),
            fetcher,
        };
        registry.load().await;
        registry
    }

    /// Replaces the in-memory list with the persisted one.
    ///
    /// A missing file is treated as an empty registry. An unreadable or
    /// corrupt file is logged and the current list is kept.
    pub async fn load(&self) {
        let mut state = self.state.lock().await;
        match self.store.load().await {
            Ok(Some(records)) => {
                state.records = records.into_iter().map(|r| (r.id, r)).collect();
                debug!(
                    "Loaded {} modules from {}",
                    state.records.len(),
                    self.store.path().display()
                );
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Failed to load modules"),
        }
    }

    /// Writes the current list to disk. Failures are logged only.
    pub async fn save(&self) {
        let state = self.state.lock().await;
        self.persist(&state).await;
    }

    async fn persist(&self, state: &RegistryState) {
        if let Err(e) = self.store.save(state.records.values()).await {
            error!(error = %e, "Failed to save modules");
        }
    }

    #[tracing::instrument(skip(self, storage_dir), level = "debug")]
    pub async fn add(&self, metadata_url: &str, storage_dir: &Path) -> RegistryResult<ModuleRecord> {
        let mut state = self.state.lock().await;

        if state
            .records
            .values()
            .any(|r| r.metadata_url == metadata_url)
        {
            return Err(RegistryError::AlreadyExists {
                metadata_url: metadata_url.to_string(),
            });
        }

        let metadata = self.fetcher.fetch_metadata(metadata_url).await?;
        let script = self.fetcher.fetch_script(&metadata.script_url).await?;

        let file_name = script_file_name();
        let script_path = storage_dir.join(&file_name);
        fs::write(&script_path, &script)
            .await
            .map_err(|e| RegistryError::io(&script_path, e))?;

        let record = ModuleRecord::new(metadata, file_name, metadata_url.to_string());
        state.records.insert(record.id, record.clone());
        self.persist(&state).await;

        info!(source = %record.source_name(), "Added module");
        Ok(record)
    }

    #[tracing::instrument(skip(self, storage_dir), level = "debug")]
    pub async fn delete(&self, id: Uuid, storage_dir: &Path) -> RegistryResult<()> {
        let mut state = self.state.lock().await;

        // shift_remove keeps the remaining records in insertion order
        let Some(record) = state.records.shift_remove(&id) else {
            return Err(RegistryError::NotFound { id });
        };

        let script_path = storage_dir.join(&record.local_path);
        if let Err(e) = fs::remove_file(&script_path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(error = %e, path = %script_path.display(), "Failed to delete module script");
            }
        }

        self.persist(&state).await;

        info!(source = %record.source_name(), "Deleted module");
        Ok(())
    }

    pub async fn list(&self) -> Vec<ModuleSummary> {
        let state = self.state.lock().await;
        state.records.values().map(ModuleRecord::summary).collect()
    }

    pub async fn get(&self, id: Uuid) -> Option<ModuleRecord> {
        let state = self.state.lock().await;
        state.records.get(&id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.records.is_empty()
    }

    /// Returns the cached script of module `id` as text.
    ///
    /// A record whose script file was removed out-of-band surfaces here as
    /// `RegistryError::Io`.
    pub async fn get_content(&self, id: Uuid, storage_dir: &Path) -> RegistryResult<String> {
        let state = self.state.lock().await;

        let record = state
            .records
            .get(&id)
            .ok_or(RegistryError::NotFound { id })?;

        let script_path = storage_dir.join(&record.local_path);
        let content = fs::read(&script_path)
            .await
            .map_err(|e| RegistryError::io(&script_path, e))?;
        Ok(String::from_utf8_lossy(&content).into_owned())
    }

    /// Re-fetches metadata for every record and downloads a new script for
    /// those whose remote `version` differs from the stored one.
    ///
    /// Each record is handled independently: a failure is logged, recorded in
    /// the report and leaves that record untouched. The list is saved exactly
    /// once at the end, whatever the individual outcomes.
    #[tracing::instrument(skip(self, storage_dir), level = "debug")]
    pub async fn refresh(&self, storage_dir: &Path) -> RefreshReport {
        let mut state = self.state.lock().await;
        let mut report = RefreshReport::default();

        let ids: Vec<Uuid> = state.records.keys().copied().collect();
        for id in ids {
            let Some(record) = state.records.get(&id) else {
                continue;
            };
            let name = record.source_name().to_string();

            let result = self.check_for_update(record, storage_dir).await;
            let outcome = match result {
                Ok(None) => RefreshOutcome::Unchanged,
                Ok(Some(metadata)) => {
                    let to = metadata.version.clone();
                    let from = state
                        .records
                        .get_mut(&id)
                        .map(|record| std::mem::replace(&mut record.metadata, metadata).version)
                        .unwrap_or_default();
                    info!(source = %name, version = %to, "Updated module");
                    RefreshOutcome::Updated { from, to }
                }
                Err(e) => RefreshOutcome::Failed {
                    error: e.to_string(),
                },
            };

            report.entries.push(RefreshEntry { id, name, outcome });
        }

        self.persist(&state).await;
        report
    }

    /// Returns the new metadata once its script has been written over the
    /// record's cached file, or `None` when the remote version is unchanged.
    async fn check_for_update(
        &self,
        record: &ModuleRecord,
        storage_dir: &Path,
    ) -> RegistryResult<Option<ModuleMetadata>> {
        let source = record.source_name();

        let metadata = self
            .fetcher
            .fetch_metadata(&record.metadata_url)
            .await
            .inspect_err(|e| warn!(source = %source, error = %e, "Failed to refresh module"))?;

        if metadata.version == record.version() {
            return Ok(None);
        }

        let script = self
            .fetcher
            .fetch_script(&metadata.script_url)
            .await
            .inspect_err(|e| warn!(source = %source, error = %e, "Failed to fetch updated script"))?;

        let script_path = storage_dir.join(&record.local_path);
        fs::write(&script_path, &script)
            .await
            .map_err(|e| RegistryError::io(&script_path, e))
            .inspect_err(|e| warn!(source = %source, error = %e, "Failed to save updated script"))?;

        Ok(Some(metadata))
    }
}
