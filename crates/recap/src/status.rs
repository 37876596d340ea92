// SPDX-FileCopyrightText: 2026 Recap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `recap status` command implementation.
//!
//! Aggregates summary run telemetry over a trailing window and reports the
//! local queue depth.

use recap_config::RecapConfig;
use recap_core::{RecapError, RunStats};
use serde::Serialize;

use crate::app::App;

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub since: i64,
    pub runs: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub avg_latency_ms: Option<f64>,
    pub p50_latency_ms: Option<u64>,
    pub p95_latency_ms: Option<u64>,
    pub avg_input_chars: Option<f64>,
    pub avg_output_chars: Option<f64>,
    pub queue_pending: u64,
    pub queue_processing: u64,
    pub queue_failed: u64,
}

/// Runs the `recap status` command.
pub async fn run_status(config: RecapConfig, since_hours: u32, json: bool) -> Result<(), RecapError> {
    let app = App::open(config).await?;
    let since = app.clock.now() - i64::from(since_hours) * 3600;
    let stats = app.storage.run_stats(since, None).await?;
    let counts = app.queue.counts().await?;

    let report = StatusReport {
        since,
        runs: stats.total,
        succeeded: stats.succeeded,
        failed: stats.failed,
        avg_latency_ms: stats.avg_latency_ms,
        p50_latency_ms: stats.p50_latency_ms,
        p95_latency_ms: stats.p95_latency_ms,
        avg_input_chars: stats.avg_input_chars,
        avg_output_chars: stats.avg_output_chars,
        queue_pending: counts.pending,
        queue_processing: counts.processing,
        queue_failed: counts.failed,
    };

    if json {
        let out = serde_json::to_string_pretty(&report)
            .map_err(|e| RecapError::Internal(format!("failed to encode status: {e}")))?;
        println!("{out}");
    } else {
        println!("Summary runs (last {since_hours}h)");
        println!("  {}", format_runs(&stats));
        println!("  latency: {}", format_latency(&stats));
        println!(
            "Queue: {} pending, {} processing, {} failed",
            counts.pending, counts.processing, counts.failed
        );
    }
    Ok(())
}

fn format_runs(stats: &RunStats) -> String {
    if stats.total == 0 {
        return "no runs".to_string();
    }
    let rate = stats.succeeded as f64 * 100.0 / stats.total as f64;
    format!(
        "{} runs, {} succeeded, {} failed ({rate:.1}% success)",
        stats.total, stats.succeeded, stats.failed
    )
}

fn format_latency(stats: &RunStats) -> String {
    match (stats.avg_latency_ms, stats.p50_latency_ms, stats.p95_latency_ms) {
        (Some(avg), Some(p50), Some(p95)) => format!("avg {avg:.0}ms, p50 {p50}ms, p95 {p95}ms"),
        _ => "n/a".to_string(),
    }
}
