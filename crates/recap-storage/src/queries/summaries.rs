// SPDX-FileCopyrightText: 2026 Recap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persisted window summaries.

use recap_core::{PersistedSummary, RecapError};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};

/// Default and maximum page sizes for [`summary_history`].
pub const DEFAULT_HISTORY_LIMIT: u32 = 20;
pub const MAX_HISTORY_LIMIT: u32 = 100;

fn row_to_summary(row: &rusqlite::Row<'_>) -> rusqlite::Result<PersistedSummary> {
    Ok(PersistedSummary {
        id: row.get(0)?,
        chat_id: row.get(1)?,
        window_start: row.get(2)?,
        window_end: row.get(3)?,
        summary_text: row.get(4)?,
        ts: row.get(5)?,
    })
}

/// Latest summary for the exact window, ordered by `(ts desc, id desc)`.
pub async fn latest_summary(
    db: &Database,
    chat_id: i64,
    window_start: i64,
    window_end: i64,
) -> Result<Option<PersistedSummary>, RecapError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT id, chat_id, window_start, window_end, summary_text, ts
                 FROM summaries
                 WHERE chat_id = ?1 AND window_start = ?2 AND window_end = ?3
                 ORDER BY ts DESC, id DESC
                 LIMIT 1",
                params![chat_id, window_start, window_end],
                row_to_summary,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Appends a summary row and returns its id.
pub async fn insert_summary(
    db: &Database,
    chat_id: i64,
    window_start: i64,
    window_end: i64,
    summary_text: &str,
    ts: i64,
) -> Result<i64, RecapError> {
    let summary_text = summary_text.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO summaries (chat_id, window_start, window_end, summary_text, ts)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![chat_id, window_start, window_end, summary_text, ts],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)
}

/// Most recent summaries for a chat, newest first.
///
/// `limit` defaults to 20 and is clamped to `1..=100`.
pub async fn summary_history(
    db: &Database,
    chat_id: i64,
    limit: Option<u32>,
) -> Result<Vec<PersistedSummary>, RecapError> {
    let limit = limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, chat_id, window_start, window_end, summary_text, ts
                 FROM summaries
                 WHERE chat_id = ?1
                 ORDER BY ts DESC, id DESC
                 LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![chat_id, limit], row_to_summary)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("summaries.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn missing_window_returns_none() {
        let (db, _dir) = setup_db().await;
        assert!(latest_summary(&db, -1001, 100, 200).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn latest_prefers_newest_ts_then_id() {
        let (db, _dir) = setup_db().await;
        insert_summary(&db, -1001, 100, 200, "older", 300).await.unwrap();
        insert_summary(&db, -1001, 100, 200, "newer-a", 400).await.unwrap();
        let last = insert_summary(&db, -1001, 100, 200, "newer-b", 400).await.unwrap();
        insert_summary(&db, -1001, 100, 201, "other window", 999).await.unwrap();

        let latest = latest_summary(&db, -1001, 100, 200).await.unwrap().unwrap();
        assert_eq!(latest.id, last);
        assert_eq!(latest.summary_text, "newer-b");
    }

    #[tokio::test]
    async fn history_is_clamped_and_ordered() {
        let (db, _dir) = setup_db().await;
        for i in 0..3 {
            insert_summary(&db, 5, i * 10, i * 10 + 10, &format!("s{i}"), 100 + i)
                .await
                .unwrap();
        }
        insert_summary(&db, 6, 0, 10, "other chat", 500).await.unwrap();

        let all = summary_history(&db, 5, None).await.unwrap();
        let texts: Vec<_> = all.iter().map(|s| s.summary_text.as_str()).collect();
        assert_eq!(texts, vec!["s2", "s1", "s0"]);

        let one = summary_history(&db, 5, Some(0)).await.unwrap();
        assert_eq!(one.len(), 1);
    }
}
