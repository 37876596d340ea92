// SPDX-FileCopyrightText: 2026 Recap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Summary run telemetry in `summary_runs`.

use recap_core::{RecapError, RunSource, RunStats, SummaryRun};
use rusqlite::params;

use crate::database::{Database, map_tr_err};

const MAX_ERROR_TYPE_LEN: usize = 80;

/// Normalises an error label: whitespace runs become `_`, capped at 80 chars,
/// and an empty label becomes `unknown`.
pub fn sanitize_error_type(raw: &str) -> String {
    let joined = raw.split_whitespace().collect::<Vec<_>>().join("_");
    let capped: String = joined.chars().take(MAX_ERROR_TYPE_LEN).collect();
    if capped.is_empty() {
        "unknown".to_string()
    } else {
        capped
    }
}

/// Nearest-rank percentile of an ascending slice: `sorted[ceil(n * p) - 1]`.
pub fn percentile(sorted: &[u64], p: f64) -> Option<u64> {
    if sorted.is_empty() {
        return None;
    }
    let rank = (sorted.len() as f64 * p).ceil() as usize;
    let idx = rank.clamp(1, sorted.len()) - 1;
    Some(sorted[idx])
}

/// Inserts one run row.
pub async fn record_run(db: &Database, run: &SummaryRun) -> Result<(), RecapError> {
    let run = run.clone();
    let error_type = run.error_type.as_deref().map(sanitize_error_type);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO summary_runs (
                     source, run_type, chat_id, window_start, window_end, window_seconds,
                     input_message_count, input_chars, input_token_estimate, model,
                     latency_ms, success, error_type, output_chars, ts
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                params![
                    run.source.to_string(),
                    run.run_type.to_string(),
                    run.chat_id,
                    run.window_start,
                    run.window_end,
                    run.window_seconds(),
                    run.input_message_count,
                    run.input_chars as i64,
                    run.input_token_estimate as i64,
                    run.model,
                    run.latency_ms as i64,
                    run.success,
                    error_type,
                    run.output_chars as i64,
                    run.ts,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Counts failed runs labelled `ai_error` at or after `since`, optionally for one source.
pub async fn count_recent_ai_failures(
    db: &Database,
    since: i64,
    source: Option<RunSource>,
) -> Result<u64, RecapError> {
    let source = source.map(|s| s.to_string());
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM summary_runs
                 WHERE success = 0 AND error_type = 'ai_error' AND ts >= ?1
                   AND (?2 IS NULL OR source = ?2)",
                params![since, source],
                |row| row.get::<_, i64>(0),
            )
        })
        .await
        .map(|n| n as u64)
        .map_err(map_tr_err)
}

/// Aggregates runs at or after `since`, optionally for one source.
pub async fn run_stats(
    db: &Database,
    since: i64,
    source: Option<RunSource>,
) -> Result<RunStats, RecapError> {
    let source = source.map(|s| s.to_string());
    db.connection()
        .call(move |conn| {
            let (total, succeeded, avg_latency, avg_input, avg_output) = conn.query_row(
                "SELECT COUNT(*), COALESCE(SUM(success), 0), AVG(latency_ms),
                        AVG(input_chars), AVG(output_chars)
                 FROM summary_runs
                 WHERE ts >= ?1 AND (?2 IS NULL OR source = ?2)",
                params![since, source],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, Option<f64>>(2)?,
                        row.get::<_, Option<f64>>(3)?,
                        row.get::<_, Option<f64>>(4)?,
                    ))
                },
            )?;

            let mut stmt = conn.prepare(
                "SELECT latency_ms FROM summary_runs
                 WHERE ts >= ?1 AND (?2 IS NULL OR source = ?2)
                 ORDER BY latency_ms ASC",
            )?;
            let latencies = stmt
                .query_map(params![since, source], |row| row.get::<_, i64>(0))?
                .map(|r| r.map(|ms| ms.max(0) as u64))
                .collect::<rusqlite::Result<Vec<u64>>>()?;

            Ok(RunStats {
                total: total as u64,
                succeeded: succeeded as u64,
                failed: (total - succeeded) as u64,
                avg_latency_ms: avg_latency,
                p50_latency_ms: percentile(&latencies, 0.50),
                p95_latency_ms: percentile(&latencies, 0.95),
                avg_input_chars: avg_input,
                avg_output_chars: avg_output,
            })
        })
        .await
        .map_err(map_tr_err)
}
