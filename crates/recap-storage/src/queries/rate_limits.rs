// SPDX-FileCopyrightText: 2026 Recap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixed-window counters in `rate_limits`.

use recap_core::RecapError;
use rusqlite::params;

use crate::database::{Database, map_tr_err};

/// Upserts the counter for `(bucket, scope_key, window_start)` and returns the
/// count after incrementing.
///
/// The upsert and the read are two statements; a concurrent increment landing
/// in between can only make the returned count higher.
pub async fn increment_counter(
    db: &Database,
    bucket: &str,
    scope_key: &str,
    window_start: i64,
    now: i64,
) -> Result<u32, RecapError> {
    let bucket = bucket.to_string();
    let scope_key = scope_key.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO rate_limits (bucket, scope_key, window_start, count, updated_at)
                 VALUES (?1, ?2, ?3, 1, ?4)
                 ON CONFLICT (bucket, scope_key, window_start)
                 DO UPDATE SET count = count + 1, updated_at = excluded.updated_at",
                params![bucket, scope_key, window_start, now],
            )?;
            conn.query_row(
                "SELECT count FROM rate_limits
                 WHERE bucket = ?1 AND scope_key = ?2 AND window_start = ?3",
                params![bucket, scope_key, window_start],
                |row| row.get::<_, u32>(0),
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Deletes up to `batch_size` counters whose `updated_at` is before `cutoff`,
/// oldest first. Returns the number of rows removed.
pub async fn delete_stale_counters(
    db: &Database,
    cutoff: i64,
    batch_size: u32,
) -> Result<u64, RecapError> {
    db.connection()
        .call(move |conn| {
            let deleted = conn.execute(
                "DELETE FROM rate_limits WHERE rowid IN (
                     SELECT rowid FROM rate_limits
                     WHERE updated_at < ?1
                     ORDER BY updated_at
                     LIMIT ?2
                 )",
                params![cutoff, batch_size],
            )?;
            Ok(deleted as u64)
        })
        .await
        .map_err(map_tr_err)
}

/// Total number of counter rows.
pub async fn count_counters(db: &Database) -> Result<u64, RecapError> {
    db.connection()
        .call(|conn| {
            conn.query_row("SELECT COUNT(*) FROM rate_limits", [], |row| {
                row.get::<_, i64>(0)
            })
        })
        .await
        .map(|n| n as u64)
        .map_err(map_tr_err)
}
