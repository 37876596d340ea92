// SPDX-FileCopyrightText: 2026 Recap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Polling loop that feeds the local transport into the batch processor.

use std::sync::Arc;
use std::time::Duration;

use recap_config::QueueConfig;
use recap_core::RecapError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::processor::{BatchProcessor, Delivery, Disposition};
use crate::transport::SqliteJobQueue;

pub struct QueueRuntime {
    queue: Arc<SqliteJobQueue>,
    processor: BatchProcessor,
    batch_size: u32,
    lease_seconds: i64,
    poll_interval: Duration,
    malformed_retry_secs: i64,
}

impl QueueRuntime {
    pub fn new(queue: Arc<SqliteJobQueue>, processor: BatchProcessor, config: &QueueConfig) -> Self {
        Self {
            queue,
            processor,
            batch_size: config.batch_size,
            lease_seconds: config.lease_seconds,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            malformed_retry_secs: config.transient_retry_secs,
        }
    }

    /// Dequeues one batch, processes it, and applies the dispositions.
    ///
    /// Returns the number of entries taken off the queue.
    pub async fn run_once(&self) -> Result<usize, RecapError> {
        let delivered = self.queue.dequeue(self.batch_size).await?;
        let taken = delivered.len();
        if taken == 0 {
            return Ok(0);
        }

        let mut entry_ids = Vec::with_capacity(taken);
        let mut deliveries = Vec::with_capacity(taken);
        for entry in delivered {
            match entry.job {
                Ok(job) => {
                    entry_ids.push(entry.entry_id);
                    deliveries.push(Delivery {
                        job,
                        attempts: entry.attempts,
                    });
                }
                Err(e) => {
                    error!(entry_id = entry.entry_id, attempts = entry.attempts, error = %e, "undecodable queue entry");
                    let retry = Disposition::Retry {
                        delay_seconds: self.malformed_retry_secs,
                    };
                    self.apply(entry.entry_id, retry).await;
                }
            }
        }

        let dispositions = self
            .processor
            .process_batch(deliveries, self.lease_seconds)
            .await;
        for (entry_id, disposition) in entry_ids.into_iter().zip(dispositions) {
            self.apply(entry_id, disposition).await;
        }
        Ok(taken)
    }

    async fn apply(&self, entry_id: i64, disposition: Disposition) {
        let result = match disposition {
            Disposition::Ack => self.queue.ack(entry_id).await,
            Disposition::Retry { delay_seconds } => {
                self.queue
                    .retry(entry_id, delay_seconds)
                    .await
                    .map(|requeued| {
                        if !requeued {
                            warn!(entry_id, "queue entry out of attempts, marked failed");
                        }
                    })
            }
        };
        if let Err(e) = result {
            // The entry reappears once its visibility timeout passes.
            warn!(entry_id, error = %e, "failed to apply disposition");
        }
    }

    /// Polls until `cancel` fires. Sleeps for the poll interval whenever the
    /// queue is empty or unreachable.
    pub async fn run(&self, cancel: CancellationToken) {
        info!(queue = self.queue.name(), "queue runtime started");
        while !cancel.is_cancelled() {
            let idle = match self.run_once().await {
                Ok(0) => true,
                Ok(taken) => {
                    debug!(taken, "processed queue batch");
                    false
                }
                Err(e) => {
                    warn!(error = %e, "queue poll failed");
                    true
                }
            };
            if idle {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(self.poll_interval) => {}
                }
            }
        }
        info!(queue = self.queue.name(), "queue runtime stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recap_config::SummaryConfig;
    use recap_core::{DailySummaryJob, JobQueue, SummaryJob};
    use recap_storage::queries;
    use recap_summarizer::{BackgroundWrites, SummarizerStores, WindowSummarizer};
    use recap_test_utils::{ManualClock, MockGenerator, MockSender, TestStore};

    use crate::processor::RetryPolicy;

    const NOW: i64 = 200_000;

    struct Fixture {
        store: TestStore,
        generator: Arc<MockGenerator>,
        sender: Arc<MockSender>,
        queue: Arc<SqliteJobQueue>,
        runtime: QueueRuntime,
    }

    async fn fixture() -> Fixture {
        let store = TestStore::new().await;
        let generator = Arc::new(MockGenerator::new());
        let sender = Arc::new(MockSender::new());
        let clock = Arc::new(ManualClock::new(NOW));
        let config = QueueConfig {
            poll_interval_ms: 10,
            ..QueueConfig::default()
        };
        let stores = SummarizerStores {
            summaries: store.storage.clone(),
            runs: store.storage.clone(),
            messages: store.storage.clone(),
        };
        let summarizer = WindowSummarizer::new(
            stores,
            generator.clone(),
            clock.clone(),
            &SummaryConfig::default(),
            BackgroundWrites::Inline,
        );
        let processor = BatchProcessor::new(
            store.storage.clone(),
            Arc::new(summarizer),
            sender.clone(),
            clock.clone(),
            RetryPolicy::from_config(&config),
        );
        let queue = Arc::new(SqliteJobQueue::new(store.storage.clone(), clock, &config));
        let runtime = QueueRuntime::new(queue.clone(), processor, &config);
        Fixture {
            store,
            generator,
            sender,
            queue,
            runtime,
        }
    }

    fn daily_job(chat_id: i64) -> SummaryJob {
        DailySummaryJob::new(chat_id, None, NOW - 86_400, NOW, NOW).into()
    }

    #[tokio::test]
    async fn empty_queue_takes_nothing() {
        let f = fixture().await;
        assert_eq!(f.runtime.run_once().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn acked_jobs_leave_the_queue() {
        let f = fixture().await;
        f.store.seed_text(-1001, 1, NOW - 10, "hello").await;
        f.queue.enqueue(&daily_job(-1001)).await.unwrap();
        assert_eq!(f.runtime.run_once().await.unwrap(), 1);

        // The same logical job enqueued again is acked as a duplicate.
        f.queue.enqueue(&daily_job(-1001)).await.unwrap();
        assert_eq!(f.runtime.run_once().await.unwrap(), 1);

        let counts = f.queue.counts().await.unwrap();
        assert_eq!((counts.pending, counts.processing, counts.failed), (0, 0, 0));
        assert_eq!(f.generator.calls(), 1);
        assert_eq!(f.sender.sent_count(), 1);
    }

    #[tokio::test]
    async fn retried_jobs_stay_pending() {
        let f = fixture().await;
        f.store.seed_text(-1001, 1, NOW - 10, "hello").await;
        f.generator.push_error("overloaded");
        f.queue.enqueue(&daily_job(-1001)).await.unwrap();

        assert_eq!(f.runtime.run_once().await.unwrap(), 1);
        assert_eq!(f.queue.counts().await.unwrap().pending, 1);
        // Not visible until the generator delay passes.
        assert_eq!(f.runtime.run_once().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn malformed_entries_do_not_block_the_batch() {
        let f = fixture().await;
        queries::queue::enqueue(
            f.store.storage.database().unwrap(),
            f.queue.name(),
            "not json",
            NOW,
            5,
        )
        .await
        .unwrap();
        f.queue.enqueue(&daily_job(-1001)).await.unwrap();

        assert_eq!(f.runtime.run_once().await.unwrap(), 2);
        let counts = f.queue.counts().await.unwrap();
        assert_eq!(counts.pending, 1);
        assert_eq!(counts.processing, 0);
    }

    #[tokio::test]
    async fn run_stops_on_cancel() {
        let f = fixture().await;
        let cancel = CancellationToken::new();
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), f.runtime.run(cancel))
            .await
            .expect("runtime should stop");
    }
}
