//! Plan transaction history visible to the wallet.
//!
//! The watch loop writes a [`PlanTransaction`] on every poll so activity
//! views reflect the latest step statuses. Two backends are provided: an
//! in-memory map and SQLite.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;
use tokio::task;

use crate::{
    db::Database,
    error::{PlanError, Result},
    models::{normalize_address, ChainId, PlanTransaction},
};

/// Storage for plan transactions keyed by address, chain and plan id.
#[async_trait]
pub trait PlanTransactionStore: Send + Sync {
    /// Inserts the record or replaces the one with the same key.
    async fn upsert(&self, record: PlanTransaction) -> Result<()>;

    async fn get(
        &self,
        address: &str,
        chain_id: ChainId,
        plan_id: &str,
    ) -> Result<Option<PlanTransaction>>;

    /// Records for an address, newest first, optionally for one chain.
    async fn list(&self, address: &str, chain_id: Option<ChainId>) -> Result<Vec<PlanTransaction>>;
}

type HistoryKey = (String, ChainId, String);

/// Process-local history, lost on exit.
#[derive(Debug, Default)]
pub struct MemoryHistory {
    records: Mutex<HashMap<HistoryKey, PlanTransaction>>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> Result<MutexGuard<'_, HashMap<HistoryKey, PlanTransaction>>> {
        self.records.lock().map_err(|e| PlanError::Configuration {
            message: format!("History lock poisoned: {e}"),
        })
    }
}

#[async_trait]
impl PlanTransactionStore for MemoryHistory {
    async fn upsert(&self, mut record: PlanTransaction) -> Result<()> {
        record.address = normalize_address(&record.address);
        let key = (record.address.clone(), record.chain_id, record.plan_id.clone());
        self.records()?.insert(key, record);
        Ok(())
    }

    async fn get(
        &self,
        address: &str,
        chain_id: ChainId,
        plan_id: &str,
    ) -> Result<Option<PlanTransaction>> {
        let key = (normalize_address(address), chain_id, plan_id.to_string());
        Ok(self.records()?.get(&key).cloned())
    }

    async fn list(&self, address: &str, chain_id: Option<ChainId>) -> Result<Vec<PlanTransaction>> {
        let address = normalize_address(address);
        let mut out: Vec<PlanTransaction> = self
            .records()?
            .values()
            .filter(|r| r.address == address && chain_id.map_or(true, |c| r.chain_id == c))
            .cloned()
            .collect();
        out.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| a.plan_id.cmp(&b.plan_id))
        });
        Ok(out)
    }
}

/// SQLite-backed history.
///
/// One connection is opened up front and shared by clones; queries run on
/// blocking tasks while holding it.
#[derive(Clone)]
pub struct SqliteHistory {
    db_path: PathBuf,
    db: Arc<Mutex<Database>>,
}

impl SqliteHistory {
    /// Opens (and if needed creates) the history database at `path`.
    ///
    /// # Errors
    ///
    /// Returns `PlanError::FileSystem` if the parent directory cannot be
    /// created and `PlanError::Database` if schema initialization fails.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();
        let open_path = db_path.clone();

        let db = task::spawn_blocking(move || {
            if let Some(parent) = open_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| PlanError::FileSystem {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
            Database::new(&open_path)
        })
        .await
        .map_err(join_error)??;

        Ok(Self {
            db_path,
            db: Arc::new(Mutex::new(db)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    async fn with_db<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Database) -> Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let mut db = db.lock().map_err(|e| PlanError::Configuration {
                message: format!("History database lock poisoned: {e}"),
            })?;
            f(&mut db)
        })
        .await
        .map_err(join_error)?
    }
}

fn join_error(e: task::JoinError) -> PlanError {
    PlanError::Configuration {
        message: format!("Task join error: {e}"),
    }
}

#[async_trait]
impl PlanTransactionStore for SqliteHistory {
    async fn upsert(&self, record: PlanTransaction) -> Result<()> {
        self.with_db(move |db| db.upsert_transaction(&record)).await
    }

    async fn get(
        &self,
        address: &str,
        chain_id: ChainId,
        plan_id: &str,
    ) -> Result<Option<PlanTransaction>> {
        let address = address.to_string();
        let plan_id = plan_id.to_string();
        self.with_db(move |db| db.get_transaction(&address, chain_id, &plan_id))
            .await
    }

    async fn list(&self, address: &str, chain_id: Option<ChainId>) -> Result<Vec<PlanTransaction>> {
        let address = address.to_string();
        self.with_db(move |db| db.list_transactions(&address, chain_id))
            .await
    }
}
