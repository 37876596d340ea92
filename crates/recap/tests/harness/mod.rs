// SPDX-FileCopyrightText: 2026 Recap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end harness: a temp SQLite store behind a fault-injecting wrapper,
//! a manual clock, a scripted generator, and a capturing sender, wired to the
//! real processor, transport, admission gate, and daily dispatcher.

#![allow(dead_code)]

use std::sync::Arc;

use recap_admission::{CounterSweeper, DailyDispatcher, RateLimiter, SummaryAdmission};
use recap_config::RecapConfig;
use recap_core::{JobClaimLedger, SummaryJob};
use recap_queue::{BatchProcessor, Delivery, Disposition, QueueRuntime, RetryPolicy, SqliteJobQueue};
use recap_summarizer::{BackgroundWrites, SummarizerStores, WindowSummarizer};
use recap_test_utils::{FaultyStore, ManualClock, MockGenerator, MockSender, TestStore};

pub const START: i64 = 1_000_000;

pub struct TestHarnessBuilder {
    config: RecapConfig,
    now: i64,
}

impl TestHarnessBuilder {
    pub fn with_now(mut self, now: i64) -> Self {
        self.now = now;
        self
    }

    pub fn with_allowed_chats(mut self, chats: Vec<i64>) -> Self {
        self.config.telegram.allowed_chat_ids = chats;
        self
    }

    pub fn with_config(mut self, edit: impl FnOnce(&mut RecapConfig)) -> Self {
        edit(&mut self.config);
        self
    }

    pub async fn build(self) -> TestHarness {
        let store = TestStore::new().await;
        let clock = Arc::new(ManualClock::new(self.now));
        let generator = Arc::new(MockGenerator::new());
        let sender = Arc::new(MockSender::new());
        let faults = Arc::new(FaultyStore::new(store.storage.clone()));
        let queue = Arc::new(SqliteJobQueue::new(
            store.storage.clone(),
            clock.clone(),
            &self.config.queue,
        ));

        let summarizer = Arc::new(WindowSummarizer::new(
            SummarizerStores {
                summaries: faults.clone(),
                runs: faults.clone(),
                messages: faults.clone(),
            },
            generator.clone(),
            clock.clone(),
            &self.config.summary,
            BackgroundWrites::Inline,
        ));
        let processor = BatchProcessor::new(
            faults.clone(),
            summarizer,
            sender.clone(),
            clock.clone(),
            RetryPolicy::from_config(&self.config.queue),
        );
        let runtime = QueueRuntime::new(queue.clone(), processor.clone(), &self.config.queue);

        TestHarness {
            config: self.config,
            store,
            clock,
            generator,
            sender,
            faults,
            queue,
            processor,
            runtime,
        }
    }
}

pub struct TestHarness {
    pub config: RecapConfig,
    pub store: TestStore,
    pub clock: Arc<ManualClock>,
    pub generator: Arc<MockGenerator>,
    pub sender: Arc<MockSender>,
    pub faults: Arc<FaultyStore>,
    pub queue: Arc<SqliteJobQueue>,
    pub processor: BatchProcessor,
    pub runtime: QueueRuntime,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        let mut config = RecapConfig::default();
        config.summary.background_writes = false;
        TestHarnessBuilder { config, now: START }
    }

    /// The real ledger, bypassing fault injection.
    pub fn ledger(&self) -> Arc<dyn JobClaimLedger> {
        self.store.storage.clone()
    }

    pub fn lease_seconds(&self) -> i64 {
        self.config.queue.lease_seconds
    }

    /// Delivers one job to the processor as delivery number `attempts`.
    pub async fn deliver(&self, job: &SummaryJob, attempts: u32) -> Disposition {
        let mut dispositions = self
            .processor
            .process_batch(
                vec![Delivery {
                    job: job.clone(),
                    attempts,
                }],
                self.lease_seconds(),
            )
            .await;
        dispositions.remove(0)
    }

    pub fn limiter(&self) -> RateLimiter {
        RateLimiter::new(self.faults.clone(), &self.config.rate_limit)
    }

    pub fn admission(&self) -> SummaryAdmission {
        SummaryAdmission::new(
            self.limiter(),
            self.queue.clone(),
            self.config.summary.max_summary_hours,
            self.config.telegram.allowed_chat_ids.clone(),
        )
    }

    pub fn dispatcher(&self) -> DailyDispatcher {
        DailyDispatcher::new(
            self.faults.clone(),
            self.queue.clone(),
            CounterSweeper::new(self.faults.clone(), &self.config.rate_limit),
            self.config.telegram.allowed_chat_ids.clone(),
        )
    }
}
