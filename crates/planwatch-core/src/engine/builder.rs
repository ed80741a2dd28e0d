//! Builder for creating and configuring PlanEngine instances.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use super::{BalanceRefresher, NoopBalances, PlanEngine, WatchConfig};
use crate::{
    analytics::{AnalyticsSink, LogAnalytics},
    client::PlanClient,
    error::{PlanError, Result},
    history::{MemoryHistory, PlanTransactionStore, SqliteHistory},
    notify::{NotificationDispatcher, NotificationSink},
    store::ActivePlanStore,
};

/// Builder for creating and configuring PlanEngine instances.
pub struct PlanEngineBuilder {
    client: Arc<dyn PlanClient>,
    store: Option<Arc<ActivePlanStore>>,
    history: Option<Arc<dyn PlanTransactionStore>>,
    database_path: Option<PathBuf>,
    persistent_history: bool,
    balances: Arc<dyn BalanceRefresher>,
    notifications: NotificationDispatcher,
    analytics: Arc<dyn AnalyticsSink>,
    config: WatchConfig,
}

impl PlanEngineBuilder {
    /// Creates a new builder around a planning service client.
    pub fn new(client: Arc<dyn PlanClient>) -> Self {
        Self {
            client,
            store: None,
            history: None,
            database_path: None,
            persistent_history: false,
            balances: Arc::new(NoopBalances),
            notifications: NotificationDispatcher::default(),
            analytics: Arc::new(LogAnalytics),
            config: WatchConfig::default(),
        }
    }

    /// Shares an existing store, e.g. one the UI already subscribes to.
    pub fn with_store(mut self, store: Arc<ActivePlanStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Uses a custom history backend.
    pub fn with_history(mut self, history: Arc<dyn PlanTransactionStore>) -> Self {
        self.history = Some(history);
        self
    }

    /// Persists history in SQLite at the given path.
    pub fn with_database_path<P: AsRef<Path>>(mut self, path: Option<P>) -> Self {
        if let Some(path) = path {
            self.database_path = Some(path.as_ref().to_path_buf());
            self.persistent_history = true;
        }
        self
    }

    /// Persists history in SQLite, at the default path unless one is set.
    ///
    /// The default follows the XDG Base Directory specification:
    /// `$XDG_DATA_HOME/planwatch/history.db` or
    /// `~/.local/share/planwatch/history.db`
    pub fn with_persistent_history(mut self) -> Self {
        self.persistent_history = true;
        self
    }

    pub fn with_balance_refresher(mut self, balances: Arc<dyn BalanceRefresher>) -> Self {
        self.balances = balances;
        self
    }

    pub fn with_notification_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.notifications = NotificationDispatcher::new(sink);
        self
    }

    pub fn with_analytics(mut self, analytics: Arc<dyn AnalyticsSink>) -> Self {
        self.analytics = analytics;
        self
    }

    pub fn with_watch_config(mut self, config: WatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the configured engine.
    ///
    /// # Errors
    ///
    /// Returns `PlanError::Configuration` for a zero attempt budget,
    /// `PlanError::XdgDirectory` if the default path cannot be resolved,
    /// `PlanError::FileSystem` if the database directory cannot be created,
    /// and `PlanError::Database` if history initialization fails.
    pub async fn build(self) -> Result<PlanEngine> {
        if self.config.max_attempts == 0 {
            return Err(PlanError::Configuration {
                message: "max_attempts must be at least 1".to_string(),
            });
        }

        let history: Arc<dyn PlanTransactionStore> = match (self.history, self.persistent_history) {
            (Some(history), _) => history,
            (None, true) => {
                let path = match self.database_path {
                    Some(path) => path,
                    None => Self::default_database_path()?,
                };
                Arc::new(SqliteHistory::open(path).await?)
            }
            (None, false) => Arc::new(MemoryHistory::new()),
        };

        Ok(PlanEngine {
            client: self.client,
            store: self.store.unwrap_or_default(),
            history,
            balances: self.balances,
            notifications: self.notifications,
            analytics: self.analytics,
            config: self.config,
        })
    }

    /// Returns the default database path following XDG Base Directory
    /// specification.
    pub fn default_database_path() -> Result<PathBuf> {
        xdg::BaseDirectories::with_prefix("planwatch")
            .place_data_file("history.db")
            .map_err(|e| PlanError::XdgDirectory(e.to_string()))
    }
}
