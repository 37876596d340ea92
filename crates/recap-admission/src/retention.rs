// SPDX-FileCopyrightText: 2026 Recap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retention sweep for rate-limit counters.

use std::sync::Arc;

use recap_config::RateLimitConfig;
use recap_core::{RateLimitStore, RecapError};
use tracing::debug;

/// Deletes counters untouched for longer than the retention horizon, in
/// bounded batches.
pub struct CounterSweeper {
    store: Arc<dyn RateLimitStore>,
    retention_seconds: i64,
    batch_size: u32,
    max_batches: u32,
}

impl CounterSweeper {
    pub fn new(store: Arc<dyn RateLimitStore>, config: &RateLimitConfig) -> Self {
        Self {
            store,
            retention_seconds: config.retention_seconds,
            batch_size: config.cleanup_batch_size,
            max_batches: config.cleanup_max_batches,
        }
    }

    /// Sweeps counters last updated before `now - retention`. Stops after
    /// the first batch that deletes nothing. Returns the rows deleted.
    pub async fn sweep(&self, now: i64) -> Result<u64, RecapError> {
        let cutoff = now - self.retention_seconds;
        let mut deleted = 0;
        for batch in 0..self.max_batches {
            let removed = self
                .store
                .delete_stale_counters(cutoff, self.batch_size)
                .await?;
            debug!(batch, removed, "rate limit sweep batch");
            if removed == 0 {
                break;
            }
            deleted += removed;
        }
        Ok(deleted)
    }
}
