// SPDX-FileCopyrightText: 2026 Recap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cron-driven daily dispatch for `recap serve`.

use std::time::Duration;

use chrono::{DateTime, Utc};
use croner::Cron;
use recap_admission::DailyDispatcher;
use recap_core::RecapError;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Parses the configured daily expression (UTC).
pub fn parse_cron(expression: &str) -> Result<Cron, RecapError> {
    expression
        .parse::<Cron>()
        .map_err(|e| RecapError::Config(format!("invalid schedule.daily_cron '{expression}': {e}")))
}

/// First occurrence strictly after `after`.
pub fn next_run(cron: &Cron, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
    cron.find_next_occurrence(&after, false).ok()
}

/// Runs the dispatcher at every occurrence of `cron` until cancelled.
///
/// The dispatch window ends at the scheduled instant, not at wake-up time,
/// so a late wake-up still produces the same job ids.
pub async fn run_daily_schedule(cron: Cron, dispatcher: DailyDispatcher, cancel: CancellationToken) {
    loop {
        let now = Utc::now();
        let Some(next) = next_run(&cron, now) else {
            warn!("daily schedule has no future occurrence; stopping");
            return;
        };
        let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
        info!(next = %next, "next daily dispatch scheduled");

        tokio::select! {
            _ = cancel.cancelled() => {
                info!("daily schedule stopped");
                return;
            }
            _ = tokio::time::sleep(wait) => {}
        }

        match dispatcher.run(next.timestamp()).await {
            Ok(report) => info!(
                window_start = report.window_start,
                window_end = report.window_end,
                active = report.active,
                allowed = report.allowed,
                enqueued = report.enqueued,
                swept = report.swept,
                "daily dispatch completed"
            ),
            Err(e) => error!(error = %e, "daily dispatch failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn next_midnight_utc() {
        let cron = parse_cron("0 0 * * *").unwrap();
        let after = Utc.with_ymd_and_hms(2026, 3, 4, 15, 30, 0).unwrap();
        assert_eq!(
            next_run(&cron, after),
            Some(Utc.with_ymd_and_hms(2026, 3, 5, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn occurrence_at_boundary_is_skipped() {
        let cron = parse_cron("0 0 * * *").unwrap();
        let midnight = Utc.with_ymd_and_hms(2026, 3, 5, 0, 0, 0).unwrap();
        assert_eq!(
            next_run(&cron, midnight),
            Some(Utc.with_ymd_and_hms(2026, 3, 6, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(parse_cron("every day"), Err(RecapError::Config(_))));
    }
}
