// SPDX-FileCopyrightText: 2026 Recap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Store wrapper that fails selected operations on demand.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use recap_core::{
    ActiveChat, ClaimOutcome, ClaimToken, DoneOutcome, JobClaimLedger, MessageSource,
    PersistedSummary, RateLimitBucket, RateLimitStore, RecapError, RunSource, StoredMessage,
    SummaryRun, SummaryRunStore, SummaryStore,
};
use recap_storage::SqliteStorage;

/// Store operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    Claim,
    MarkDone,
    Release,
    IncrementCounter,
    DeleteCounters,
    LatestSummary,
    InsertSummary,
    RecordRun,
    CountFailures,
    LoadMessages,
    ActiveChats,
}

/// Delegates to a real [`SqliteStorage`] unless the operation is marked faulty.
pub struct FaultyStore {
    inner: Arc<SqliteStorage>,
    faults: Mutex<HashSet<Fault>>,
}

impl FaultyStore {
    pub fn new(inner: Arc<SqliteStorage>) -> Self {
        Self {
            inner,
            faults: Mutex::new(HashSet::new()),
        }
    }

    pub fn fail(&self, fault: Fault) {
        self.faults
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(fault);
    }

    pub fn heal(&self, fault: Fault) {
        self.faults
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&fault);
    }

    fn check(&self, fault: Fault) -> Result<(), RecapError> {
        let faulty = self
            .faults
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&fault);
        if faulty {
            return Err(RecapError::Storage {
                source: format!("injected fault: {fault:?}").into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl JobClaimLedger for FaultyStore {
    async fn claim(
        &self,
        job_id: &str,
        now: i64,
        lease_seconds: i64,
    ) -> Result<ClaimOutcome, RecapError> {
        self.check(Fault::Claim)?;
        self.inner.claim(job_id, now, lease_seconds).await
    }

    async fn mark_done(
        &self,
        job_id: &str,
        claim: ClaimToken,
        now: i64,
    ) -> Result<DoneOutcome, RecapError> {
        self.check(Fault::MarkDone)?;
        self.inner.mark_done(job_id, claim, now).await
    }

    async fn release(&self, job_id: &str, claim: ClaimToken) -> Result<bool, RecapError> {
        self.check(Fault::Release)?;
        self.inner.release(job_id, claim).await
    }
}

#[async_trait]
impl RateLimitStore for FaultyStore {
    async fn increment_counter(
        &self,
        bucket: RateLimitBucket,
        scope_key: &str,
        window_start: i64,
        now: i64,
    ) -> Result<u32, RecapError> {
        self.check(Fault::IncrementCounter)?;
        self.inner
            .increment_counter(bucket, scope_key, window_start, now)
            .await
    }

    async fn delete_stale_counters(&self, cutoff: i64, batch_size: u32) -> Result<u64, RecapError> {
        self.check(Fault::DeleteCounters)?;
        self.inner.delete_stale_counters(cutoff, batch_size).await
    }
}

#[async_trait]
impl SummaryStore for FaultyStore {
    async fn latest_summary(
        &self,
        chat_id: i64,
        window_start: i64,
        window_end: i64,
    ) -> Result<Option<PersistedSummary>, RecapError> {
        self.check(Fault::LatestSummary)?;
        self.inner
            .latest_summary(chat_id, window_start, window_end)
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
        self.check(Fault::InsertSummary)?;
        self.inner
            .insert_summary(chat_id, window_start, window_end, summary_text, ts)
            .await
    }
}

#[async_trait]
impl SummaryRunStore for FaultyStore {
    async fn record_run(&self, run: &SummaryRun) -> Result<(), RecapError> {
        self.check(Fault::RecordRun)?;
        self.inner.record_run(run).await
    }

    async fn count_recent_ai_failures(
        &self,
        since: i64,
        source: Option<RunSource>,
    ) -> Result<u64, RecapError> {
        self.check(Fault::CountFailures)?;
        self.inner.count_recent_ai_failures(since, source).await
    }
}

#[async_trait]
impl MessageSource for FaultyStore {
    async fn load_messages(
        &self,
        chat_id: i64,
        window_start: i64,
        window_end: i64,
        limit: u32,
    ) -> Result<Vec<StoredMessage>, RecapError> {
        self.check(Fault::LoadMessages)?;
        self.inner
            .load_messages(chat_id, window_start, window_end, limit)
            .await
    }

    async fn active_chats(
        &self,
        window_start: i64,
        window_end: i64,
    ) -> Result<Vec<ActiveChat>, RecapError> {
        self.check(Fault::ActiveChats)?;
        self.inner.active_chats(window_start, window_end).await
    }
}
