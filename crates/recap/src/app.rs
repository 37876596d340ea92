// SPDX-FileCopyrightText: 2026 Recap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiring shared by every subcommand.

use std::sync::Arc;

use recap_admission::{CounterSweeper, DailyDispatcher, RateLimiter, SummaryAdmission};
use recap_config::RecapConfig;
use recap_core::{Clock, RecapError, ReplySender, SummaryGenerator, SystemClock};
use recap_queue::{BatchProcessor, RetryPolicy, SqliteJobQueue};
use recap_storage::SqliteStorage;
use recap_summarizer::{BackgroundWrites, SummarizerStores, WindowSummarizer};

/// Opened storage plus the components built on top of it.
pub struct App {
    pub config: RecapConfig,
    pub clock: Arc<dyn Clock>,
    pub storage: Arc<SqliteStorage>,
    pub queue: Arc<SqliteJobQueue>,
}

impl App {
    /// Opens the database (running migrations) and the local queue.
    pub async fn open(config: RecapConfig) -> Result<Self, RecapError> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let storage = Arc::new(SqliteStorage::open(config.storage.clone()).await?);
        let queue = Arc::new(SqliteJobQueue::new(storage.clone(), clock.clone(), &config.queue));
        Ok(Self {
            config,
            clock,
            storage,
            queue,
        })
    }

    pub fn sweeper(&self) -> CounterSweeper {
        CounterSweeper::new(self.storage.clone(), &self.config.rate_limit)
    }

    pub fn dispatcher(&self) -> DailyDispatcher {
        DailyDispatcher::new(
            self.storage.clone(),
            self.queue.clone(),
            self.sweeper(),
            self.config.telegram.allowed_chat_ids.clone(),
        )
    }

    pub fn admission(&self) -> SummaryAdmission {
        SummaryAdmission::new(
            RateLimiter::new(self.storage.clone(), &self.config.rate_limit),
            self.queue.clone(),
            self.config.summary.max_summary_hours,
            self.config.telegram.allowed_chat_ids.clone(),
        )
    }

    /// Builds the batch processor. Side writes go through `writes`.
    pub fn processor(
        &self,
        generator: Arc<dyn SummaryGenerator>,
        sender: Arc<dyn ReplySender>,
        writes: BackgroundWrites,
    ) -> BatchProcessor {
        let stores = SummarizerStores {
            summaries: self.storage.clone(),
            runs: self.storage.clone(),
            messages: self.storage.clone(),
        };
        let summarizer = Arc::new(WindowSummarizer::new(
            stores,
            generator,
            self.clock.clone(),
            &self.config.summary,
            writes,
        ));
        BatchProcessor::new(
            self.storage.clone(),
            summarizer,
            sender,
            self.clock.clone(),
            RetryPolicy::from_config(&self.config.queue),
        )
    }
}
