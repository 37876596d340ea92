// SPDX-FileCopyrightText: 2026 Recap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the Recap store traits.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use recap_config::model::StorageConfig;
use recap_core::{
    ActiveChat, AdapterType, ClaimOutcome, ClaimToken, DoneOutcome, HealthStatus, JobClaimLedger,
    MessageSource, PersistedSummary, PluginAdapter, RateLimitBucket, RateLimitStore, RecapError,
    RunSource, RunStats, StoredMessage, SummaryRun, SummaryRunStore, SummaryStore,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed store for every table the worker touches.
///
/// The database is opened by [`SqliteStorage::initialize`]; every other
/// method fails with a storage error until then.
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage. The database is not opened yet.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Create and initialize in one step.
    pub async fn open(config: StorageConfig) -> Result<Self, RecapError> {
        let storage = Self::new(config);
        storage.initialize().await?;
        Ok(storage)
    }

    /// Opens the database and applies migrations.
    pub async fn initialize(&self) -> Result<(), RecapError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| RecapError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    /// The underlying database, for query modules not exposed through a trait.
    pub fn database(&self) -> Result<&Database, RecapError> {
        self.db.get().ok_or_else(|| RecapError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    /// Stores an ingested message. Returns `false` for a duplicate.
    pub async fn insert_message(&self, message: &StoredMessage) -> Result<bool, RecapError> {
        queries::messages::insert_message(self.database()?, message).await
    }

    /// Recent summaries for a chat, newest first.
    pub async fn summary_history(
        &self,
        chat_id: i64,
        limit: Option<u32>,
    ) -> Result<Vec<PersistedSummary>, RecapError> {
        queries::summaries::summary_history(self.database()?, chat_id, limit).await
    }

    /// Aggregated run telemetry since `since`.
    pub async fn run_stats(
        &self,
        since: i64,
        source: Option<RunSource>,
    ) -> Result<RunStats, RecapError> {
        queries::summary_runs::run_stats(self.database()?, since, source).await
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, RecapError> {
        let db = self.database()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), RecapError> {
        if let Some(db) = self.db.get() {
            db.connection()
                .call(|conn| -> Result<(), rusqlite::Error> {
                    conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                    Ok(())
                })
                .await
                .map_err(crate::database::map_tr_err)?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl JobClaimLedger for SqliteStorage {
    async fn claim(
        &self,
        job_id: &str,
        now: i64,
        lease_seconds: i64,
    ) -> Result<ClaimOutcome, RecapError> {
        queries::claims::claim(self.database()?, job_id, now, lease_seconds).await
    }

    async fn mark_done(
        &self,
        job_id: &str,
        claim: ClaimToken,
        now: i64,
    ) -> Result<DoneOutcome, RecapError> {
        queries::claims::mark_done(self.database()?, job_id, claim, now).await
    }

    async fn release(&self, job_id: &str, claim: ClaimToken) -> Result<bool, RecapError> {
        queries::claims::release(self.database()?, job_id, claim).await
    }
}

#[async_trait]
impl RateLimitStore for SqliteStorage {
    async fn increment_counter(
        &self,
        bucket: RateLimitBucket,
        scope_key: &str,
        window_start: i64,
        now: i64,
    ) -> Result<u32, RecapError> {
        queries::rate_limits::increment_counter(
            self.database()?,
            &bucket.to_string(),
            scope_key,
            window_start,
            now,
        )
        .await
    }

    async fn delete_stale_counters(&self, cutoff: i64, batch_size: u32) -> Result<u64, RecapError> {
        queries::rate_limits::delete_stale_counters(self.database()?, cutoff, batch_size).await
    }
}

#[async_trait]
impl SummaryStore for SqliteStorage {
    async fn latest_summary(
        &self,
        chat_id: i64,
        window_start: i64,
        window_end: i64,
    ) -> Result<Option<PersistedSummary>, RecapError> {
        queries::summaries::latest_summary(self.database()?, chat_id, window_start, window_end)
            .await
    }

    async fn insert_summary(
        &self,
        chat_id: i64,
        window_start: i64,
        window_end: i64,
        summary_text: &str,
        ts: i64,
    ) -> Result<i64, RecapError> {
        queries::summaries::insert_summary(
            self.database()?,
            chat_id,
            window_start,
            window_end,
            summary_text,
            ts,
        )
        .await
    }
}

#[async_trait]
impl SummaryRunStore for SqliteStorage {
    async fn record_run(&self, run: &SummaryRun) -> Result<(), RecapError> {
        queries::summary_runs::record_run(self.database()?, run).await
    }

    async fn count_recent_ai_failures(
        &self,
        since: i64,
        source: Option<RunSource>,
    ) -> Result<u64, RecapError> {
        queries::summary_runs::count_recent_ai_failures(self.database()?, since, source).await
    }
}

#[async_trait]
impl MessageSource for SqliteStorage {
    async fn load_messages(
        &self,
        chat_id: i64,
        window_start: i64,
        window_end: i64,
        limit: u32,
    ) -> Result<Vec<StoredMessage>, RecapError> {
        queries::messages::load_messages_for_window(
            self.database()?,
            chat_id,
            window_start,
            window_end,
            limit,
        )
        .await
    }

    async fn active_chats(
        &self,
        window_start: i64,
        window_end: i64,
    ) -> Result<Vec<ActiveChat>, RecapError> {
        queries::messages::load_active_chats(self.database()?, window_start, window_end).await
    }
}
