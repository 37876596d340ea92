// SPDX-FileCopyrightText: 2026 Recap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Store traits backing the claim ledger, rate limiter, and summary cache.
//!
//! The relational store is the only coordination point between workers,
//! so every mutation here is expected to be a single conditional write.

use async_trait::async_trait;

use crate::error::RecapError;
use crate::types::{
    ActiveChat, ClaimOutcome, ClaimToken, DoneOutcome, PersistedSummary, RateLimitBucket,
    RunSource, StoredMessage, SummaryRun,
};

/// Per-job lease records giving at-most-once side effects over an at-least-once queue.
#[async_trait]
pub trait JobClaimLedger: Send + Sync {
    /// Claims `job_id` with a lease of `lease_seconds` (at least one second).
    async fn claim(
        &self,
        job_id: &str,
        now: i64,
        lease_seconds: i64,
    ) -> Result<ClaimOutcome, RecapError>;

    /// Marks a claimed job done if `claim` still matches the stored lease pair.
    async fn mark_done(
        &self,
        job_id: &str,
        claim: ClaimToken,
        now: i64,
    ) -> Result<DoneOutcome, RecapError>;

    /// Deletes the claim if `claim` still matches. Returns whether a row was removed.
    async fn release(&self, job_id: &str, claim: ClaimToken) -> Result<bool, RecapError>;
}

/// Fixed-window counters.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Upserts and increments the counter, returning the post-increment count.
    async fn increment_counter(
        &self,
        bucket: RateLimitBucket,
        scope_key: &str,
        window_start: i64,
        now: i64,
    ) -> Result<u32, RecapError>;

    /// Deletes up to `batch_size` counters last updated before `cutoff`.
    async fn delete_stale_counters(&self, cutoff: i64, batch_size: u32) -> Result<u64, RecapError>;
}

/// Persisted summaries keyed by exact window.
#[async_trait]
pub trait SummaryStore: Send + Sync {
    /// Latest summary for the window by `(ts desc, id desc)`.
    async fn latest_summary(
        &self,
        chat_id: i64,
        window_start: i64,
        window_end: i64,
    ) -> Result<Option<PersistedSummary>, RecapError>;

    /// Appends a summary row and returns its id.
    async fn insert_summary(
        &self,
        chat_id: i64,
        window_start: i64,
        window_end: i64,
        summary_text: &str,
        ts: i64,
    ) -> Result<i64, RecapError>;
}

/// Summary run telemetry.
#[async_trait]
pub trait SummaryRunStore: Send + Sync {
    async fn record_run(&self, run: &SummaryRun) -> Result<(), RecapError>;

    /// Counts failed runs with `error_type = "ai_error"` at or after `since`.
    async fn count_recent_ai_failures(
        &self,
        since: i64,
        source: Option<RunSource>,
    ) -> Result<u64, RecapError>;
}

/// Read access to ingested chat messages.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Messages in `[window_start, window_end]`, newest first, at most `limit` rows.
    async fn load_messages(
        &self,
        chat_id: i64,
        window_start: i64,
        window_end: i64,
        limit: u32,
    ) -> Result<Vec<StoredMessage>, RecapError>;

    /// Chats with at least one message in `[window_start, window_end]`.
    async fn active_chats(
        &self,
        window_start: i64,
        window_end: i64,
    ) -> Result<Vec<ActiveChat>, RecapError>;
}
