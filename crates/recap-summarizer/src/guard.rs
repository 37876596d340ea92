// SPDX-FileCopyrightText: 2026 Recap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Degraded-mode guard: stop calling a generator that keeps failing.

use std::sync::Arc;

use recap_config::SummaryConfig;
use recap_core::{RunSource, SummaryRunStore};
use tracing::{info, warn};

/// Trips when recent generator failures reach a threshold.
///
/// Failures are read from run telemetry, so the guard is shared by every
/// worker writing to the same store.
pub struct DegradedGuard {
    runs: Arc<dyn SummaryRunStore>,
    enabled: bool,
    threshold: u64,
    horizon_seconds: i64,
}

impl DegradedGuard {
    pub fn new(runs: Arc<dyn SummaryRunStore>, config: &SummaryConfig) -> Self {
        Self {
            runs,
            enabled: config.degraded_guard,
            threshold: config.degraded_failure_threshold,
            horizon_seconds: config.degraded_horizon_seconds,
        }
    }

    /// Whether generation should be skipped right now.
    ///
    /// A failure to read the counts leaves the guard closed.
    pub async fn is_tripped(&self, now: i64, source: Option<RunSource>) -> bool {
        if !self.enabled {
            return false;
        }
        let since = now - self.horizon_seconds;
        match self.runs.count_recent_ai_failures(since, source).await {
            Ok(failures) if failures >= self.threshold => {
                info!(failures, threshold = self.threshold, "degraded guard tripped");
                true
            }
            Ok(_) => false,
            Err(e) => {
                warn!(error = %e, "degraded guard check failed; continuing");
                false
            }
        }
    }
}
