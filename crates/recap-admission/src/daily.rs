// SPDX-FileCopyrightText: 2026 Recap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Daily dispatch: one summary job per active, allow-listed chat.

use std::sync::Arc;

use recap_core::{DailySummaryJob, JobQueue, MessageSource, RecapError, SummaryJob};
use tracing::{info, warn};

use crate::retention::CounterSweeper;

pub const DAY_SECONDS: i64 = 24 * 60 * 60;

/// Counts from one dispatch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub window_start: i64,
    pub window_end: i64,
    /// Chats with messages in the window.
    pub active: usize,
    /// Active chats on the allowlist.
    pub allowed: usize,
    pub enqueued: usize,
    /// Stale rate-limit counters removed by the sweep.
    pub swept: u64,
}

/// Chats not listed are never summarized. An empty list allows nothing.
pub fn is_chat_allowed(chat_id: i64, allowed_chat_ids: &[i64]) -> bool {
    allowed_chat_ids.contains(&chat_id)
}

pub struct DailyDispatcher {
    messages: Arc<dyn MessageSource>,
    queue: Arc<dyn JobQueue>,
    sweeper: CounterSweeper,
    allowed_chat_ids: Vec<i64>,
}

impl DailyDispatcher {
    pub fn new(
        messages: Arc<dyn MessageSource>,
        queue: Arc<dyn JobQueue>,
        sweeper: CounterSweeper,
        allowed_chat_ids: Vec<i64>,
    ) -> Self {
        Self {
            messages,
            queue,
            sweeper,
            allowed_chat_ids,
        }
    }

    /// Enqueues daily jobs for the 24 hours ending at `scheduled_at`.
    ///
    /// The counter sweep runs first and never fails the dispatch. Failing to
    /// list chats or to enqueue is returned to the caller.
    pub async fn run(&self, scheduled_at: i64) -> Result<DispatchReport, RecapError> {
        let window_end = scheduled_at;
        let window_start = window_end - DAY_SECONDS;

        let swept = match self.sweeper.sweep(window_end).await {
            Ok(swept) => {
                if swept > 0 {
                    info!(swept, "deleted stale rate limit counters");
                }
                swept
            }
            Err(e) => {
                warn!(error = %e, "rate limit sweep failed");
                0
            }
        };

        let chats = self.messages.active_chats(window_start, window_end).await?;
        let active = chats.len();
        let jobs: Vec<SummaryJob> = chats
            .into_iter()
            .filter(|chat| is_chat_allowed(chat.chat_id, &self.allowed_chat_ids))
            .map(|chat| {
                DailySummaryJob::new(
                    chat.chat_id,
                    chat.chat_username,
                    window_start,
                    window_end,
                    scheduled_at,
                )
                .into()
            })
            .collect();
        let allowed = jobs.len();

        self.queue.enqueue_batch(&jobs).await?;

        let report = DispatchReport {
            window_start,
            window_end,
            active,
            allowed,
            enqueued: jobs.len(),
            swept,
        };
        info!(
            window_start,
            window_end,
            active,
            enqueued = report.enqueued,
            skipped = active - allowed,
            "daily dispatch finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recap_config::RateLimitConfig;
    use recap_core::{RateLimitBucket, RateLimitStore, StoredMessage};
    use recap_test_utils::{Fault, FaultyStore, RecordingQueue, TestStore, text_message};

    const END: i64 = 1_000_000;

    fn with_username(mut msg: StoredMessage, username: &str) -> StoredMessage {
        msg.chat_username = Some(username.to_string());
        msg
    }

    async fn seeded_store() -> TestStore {
        let store = TestStore::new().await;
        store
            .seed(with_username(text_message(-1, 1, END - 100, "a"), "one"))
            .await;
        store.seed_text(-2, 1, END - 200, "b").await;
        store.seed_text(-3, 1, END - 300, "c").await;
        // Outside the window.
        store.seed_text(-4, 1, END - DAY_SECONDS - 1, "d").await;
        store
    }

    fn dispatcher(
        store: &TestStore,
        messages: Arc<dyn MessageSource>,
        queue: Arc<RecordingQueue>,
        allowed: Vec<i64>,
    ) -> DailyDispatcher {
        let sweeper = CounterSweeper::new(store.storage.clone(), &RateLimitConfig::default());
        DailyDispatcher::new(messages, queue, sweeper, allowed)
    }

    #[test]
    fn empty_allowlist_allows_nothing() {
        assert!(!is_chat_allowed(5, &[]));
        assert!(is_chat_allowed(5, &[1, 5]));
    }

    #[tokio::test]
    async fn enqueues_allowlisted_active_chats() {
        let store = seeded_store().await;
        let queue = Arc::new(RecordingQueue::new());
        let d = dispatcher(&store, store.storage.clone(), queue.clone(), vec![-1, -3, -4]);

        let report = d.run(END).await.unwrap();
        assert_eq!(report.active, 3);
        assert_eq!(report.allowed, 2);
        assert_eq!(report.enqueued, 2);

        let mut ids: Vec<String> = queue.jobs().iter().map(|j| j.job_id().to_string()).collect();
        ids.sort();
        assert_eq!(
            ids,
            vec![
                format!("daily:-1:{}:{END}", END - DAY_SECONDS),
                format!("daily:-3:{}:{END}", END - DAY_SECONDS),
            ]
        );
        let with_name = queue
            .jobs()
            .into_iter()
            .find(|j| j.chat_id() == -1)
            .unwrap();
        match with_name {
            SummaryJob::Daily(job) => assert_eq!(job.chat_username.as_deref(), Some("one")),
            SummaryJob::OnDemand(_) => panic!("expected daily job"),
        }
    }

    #[tokio::test]
    async fn empty_allowlist_enqueues_nothing() {
        let store = seeded_store().await;
        let queue = Arc::new(RecordingQueue::new());
        let d = dispatcher(&store, store.storage.clone(), queue.clone(), Vec::new());

        let report = d.run(END).await.unwrap();
        assert_eq!(report.active, 3);
        assert_eq!(report.enqueued, 0);
        assert!(queue.jobs().is_empty());
    }

    #[tokio::test]
    async fn sweeps_stale_counters_first() {
        let store = seeded_store().await;
        store
            .storage
            .increment_counter(RateLimitBucket::Chat, "-1", 0, 10)
            .await
            .unwrap();
        let queue = Arc::new(RecordingQueue::new());
        let d = dispatcher(&store, store.storage.clone(), queue, vec![-1]);

        assert_eq!(d.run(END).await.unwrap().swept, 1);
    }

    #[tokio::test]
    async fn sweep_failure_does_not_block_dispatch() {
        let store = seeded_store().await;
        let faulty = Arc::new(FaultyStore::new(store.storage.clone()));
        faulty.fail(Fault::DeleteCounters);
        let queue = Arc::new(RecordingQueue::new());
        let sweeper = CounterSweeper::new(faulty, &RateLimitConfig::default());
        let d = DailyDispatcher::new(store.storage.clone(), queue.clone(), sweeper, vec![-2]);

        let report = d.run(END).await.unwrap();
        assert_eq!(report.swept, 0);
        assert_eq!(report.enqueued, 1);
    }

    #[tokio::test]
    async fn chat_listing_failure_is_returned() {
        let store = seeded_store().await;
        let faulty = Arc::new(FaultyStore::new(store.storage.clone()));
        faulty.fail(Fault::ActiveChats);
        let queue = Arc::new(RecordingQueue::new());
        let d = dispatcher(&store, faulty, queue.clone(), vec![-1]);

        assert!(d.run(END).await.is_err());
        assert!(queue.jobs().is_empty());
    }

    #[tokio::test]
    async fn enqueue_failure_is_returned() {
        let store = seeded_store().await;
        let queue = Arc::new(RecordingQueue::new());
        queue.set_failing(true);
        let d = dispatcher(&store, store.storage.clone(), queue, vec![-1]);

        assert!(matches!(d.run(END).await, Err(RecapError::Queue(_))));
    }
}
