// SPDX-FileCopyrightText: 2026 Recap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local at-least-once transport over the SQLite `queue` table.

use std::sync::Arc;

use async_trait::async_trait;
use recap_config::QueueConfig;
use recap_core::{Clock, JobQueue, RecapError, SummaryJob};
use recap_storage::{QueueCounts, SqliteStorage, queries};
use tracing::debug;

/// A dequeued transport row: its id, delivery count, and decoded job.
#[derive(Debug)]
pub struct QueuedDelivery {
    pub entry_id: i64,
    pub attempts: u32,
    pub job: Result<SummaryJob, RecapError>,
}

/// [`JobQueue`] backed by the `queue` table of a [`SqliteStorage`].
pub struct SqliteJobQueue {
    storage: Arc<SqliteStorage>,
    clock: Arc<dyn Clock>,
    name: String,
    max_attempts: u32,
    visibility_secs: i64,
}

impl SqliteJobQueue {
    pub fn new(storage: Arc<SqliteStorage>, clock: Arc<dyn Clock>, config: &QueueConfig) -> Self {
        Self {
            storage,
            clock,
            name: config.name.clone(),
            max_attempts: config.max_attempts,
            visibility_secs: config.visibility_timeout_secs,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Delivers up to `limit` visible jobs and hides them for the visibility timeout.
    pub async fn dequeue(&self, limit: u32) -> Result<Vec<QueuedDelivery>, RecapError> {
        let entries = queries::queue::dequeue_batch(
            self.storage.database()?,
            &self.name,
            self.clock.now(),
            limit,
            self.visibility_secs,
        )
        .await?;

        Ok(entries
            .into_iter()
            .map(|entry| QueuedDelivery {
                entry_id: entry.id,
                attempts: entry.attempts,
                job: serde_json::from_str(&entry.payload).map_err(|e| {
                    RecapError::Queue(format!("malformed payload in entry {}: {e}", entry.id))
                }),
            })
            .collect())
    }

    pub async fn ack(&self, entry_id: i64) -> Result<(), RecapError> {
        queries::queue::ack(self.storage.database()?, entry_id).await
    }

    /// Makes the entry visible again after `delay_seconds`. Returns `false`
    /// if it ran out of attempts and was marked failed instead.
    pub async fn retry(&self, entry_id: i64, delay_seconds: i64) -> Result<bool, RecapError> {
        queries::queue::retry(
            self.storage.database()?,
            entry_id,
            self.clock.now(),
            delay_seconds,
        )
        .await
    }

    pub async fn counts(&self) -> Result<QueueCounts, RecapError> {
        queries::queue::counts(self.storage.database()?, &self.name).await
    }
}

#[async_trait]
impl JobQueue for SqliteJobQueue {
    async fn enqueue(&self, job: &SummaryJob) -> Result<(), RecapError> {
        let payload = serde_json::to_string(job)
            .map_err(|e| RecapError::Queue(format!("failed to encode job: {e}")))?;
        let id = queries::queue::enqueue(
            self.storage.database()?,
            &self.name,
            &payload,
            self.clock.now(),
            self.max_attempts,
        )
        .await?;
        debug!(job_id = job.job_id(), entry_id = id, "job enqueued");
        Ok(())
    }
}
