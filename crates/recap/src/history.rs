// SPDX-FileCopyrightText: 2026 Recap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `recap history` command implementation.

use chrono::DateTime;
use recap_config::RecapConfig;
use recap_core::{PersistedSummary, RecapError};
use serde::Serialize;

use crate::app::App;

/// One stored summary in `--json` mode.
#[derive(Debug, Serialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub window_start: i64,
    pub window_end: i64,
    pub created_at: i64,
    pub summary: String,
}

impl From<PersistedSummary> for HistoryEntry {
    fn from(summary: PersistedSummary) -> Self {
        Self {
            id: summary.id,
            window_start: summary.window_start,
            window_end: summary.window_end,
            created_at: summary.ts,
            summary: summary.summary_text,
        }
    }
}

/// Runs the `recap history` command: stored summaries for a chat, newest first.
pub async fn run_history(
    config: RecapConfig,
    chat_id: i64,
    limit: Option<u32>,
    json: bool,
) -> Result<(), RecapError> {
    let app = App::open(config).await?;
    let summaries = app.storage.summary_history(chat_id, limit).await?;

    if json {
        let entries: Vec<HistoryEntry> = summaries.into_iter().map(HistoryEntry::from).collect();
        let out = serde_json::to_string_pretty(&entries)
            .map_err(|e| RecapError::Internal(format!("failed to encode history: {e}")))?;
        println!("{out}");
        return Ok(());
    }

    if summaries.is_empty() {
        println!("No summaries stored for chat {chat_id}");
        return Ok(());
    }
    for summary in &summaries {
        println!("{}", format_header(summary));
        println!("{}", summary.summary_text);
        println!();
    }
    Ok(())
}

fn format_header(summary: &PersistedSummary) -> String {
    format!(
        "#{} {} .. {}",
        summary.id,
        format_ts(summary.window_start),
        format_ts(summary.window_end)
    )
}

fn format_ts(ts: i64) -> String {
    DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| ts.to_string())
}
