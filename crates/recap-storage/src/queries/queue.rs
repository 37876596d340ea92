// SPDX-FileCopyrightText: 2026 Recap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local at-least-once job queue.
//!
//! A dequeued row stays `processing` until acked (deleted) or retried. A row
//! whose lock expires without either is delivered again, which is how a
//! crashed worker's jobs come back.

use recap_core::RecapError;
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::models::{QueueCounts, QueueEntry};

/// Enqueue a payload, visible from `now`. Returns the new entry id.
pub async fn enqueue(
    db: &Database,
    queue_name: &str,
    payload: &str,
    now: i64,
    max_attempts: u32,
) -> Result<i64, RecapError> {
    let queue_name = queue_name.to_string();
    let payload = payload.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO queue
                     (queue_name, payload, status, attempts, max_attempts, visible_at,
                      created_at, updated_at)
                 VALUES (?1, ?2, 'pending', 0, ?3, ?4, ?4, ?4)",
                params![queue_name, payload, max_attempts, now],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Delivers up to `limit` visible entries, oldest first.
///
/// Each returned entry is marked `processing` until `now + visibility_secs`
/// and has its `attempts` incremented. Expired `processing` rows that have
/// used up their attempts are moved to `failed` instead of redelivered.
pub async fn dequeue_batch(
    db: &Database,
    queue_name: &str,
    now: i64,
    limit: u32,
    visibility_secs: i64,
) -> Result<Vec<QueueEntry>, RecapError> {
    let queue_name = queue_name.to_string();
    let locked_until = now + visibility_secs.max(1);
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            tx.execute(
                "UPDATE queue SET status = 'failed', locked_until = NULL, updated_at = ?2
                 WHERE queue_name = ?1 AND status = 'processing'
                   AND locked_until <= ?2 AND attempts >= max_attempts",
                params![queue_name, now],
            )?;

            let mut entries = {
                let mut stmt = tx.prepare(
                    "SELECT id, queue_name, payload, status, attempts, max_attempts,
                            visible_at, locked_until, created_at, updated_at
                     FROM queue
                     WHERE queue_name = ?1
                       AND ((status = 'pending' AND visible_at <= ?2)
                         OR (status = 'processing' AND locked_until <= ?2))
                     ORDER BY visible_at ASC, id ASC
                     LIMIT ?3",
                )?;
                let rows = stmt.query_map(params![queue_name, now, limit], |row| {
                    Ok(QueueEntry {
                        id: row.get(0)?,
                        queue_name: row.get(1)?,
                        payload: row.get(2)?,
                        status: row.get(3)?,
                        attempts: row.get(4)?,
                        max_attempts: row.get(5)?,
                        visible_at: row.get(6)?,
                        locked_until: row.get(7)?,
                        created_at: row.get(8)?,
                        updated_at: row.get(9)?,
                    })
                })?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            };

            for entry in &mut entries {
                tx.execute(
                    "UPDATE queue SET status = 'processing', attempts = attempts + 1,
                         locked_until = ?1, updated_at = ?2
                     WHERE id = ?3",
                    params![locked_until, now, entry.id],
                )?;
                entry.status = "processing".to_string();
                entry.attempts += 1;
                entry.locked_until = Some(locked_until);
                entry.updated_at = now;
            }

            tx.commit()?;
            Ok(entries)
        })
        .await
        .map_err(map_tr_err)
}

/// Acknowledge an entry, removing it from the queue.
pub async fn ack(db: &Database, id: i64) -> Result<(), RecapError> {
    db.connection()
        .call(move |conn| {
            conn.execute("DELETE FROM queue WHERE id = ?1", params![id])?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Schedule an in-flight entry for redelivery after `delay_secs`.
///
/// Entries that have used up their attempts are marked `failed` instead.
/// Returns `true` if the entry will be delivered again.
pub async fn retry(db: &Database, id: i64, now: i64, delay_secs: i64) -> Result<bool, RecapError> {
    let visible_at = now + delay_secs.max(0);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE queue
                 SET status = CASE WHEN attempts >= max_attempts THEN 'failed' ELSE 'pending' END,
                     visible_at = ?1, locked_until = NULL, updated_at = ?2
                 WHERE id = ?3 AND status = 'processing'",
                params![visible_at, now, id],
            )?;
            let pending: i64 = conn.query_row(
                "SELECT COUNT(*) FROM queue WHERE id = ?1 AND status = 'pending'",
                params![id],
                |row| row.get(0),
            )?;
            Ok(pending > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Row counts of `queue_name` by status.
pub async fn counts(db: &Database, queue_name: &str) -> Result<QueueCounts, RecapError> {
    let queue_name = queue_name.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT status, COUNT(*) FROM queue WHERE queue_name = ?1 GROUP BY status",
            )?;
            let mut counts = QueueCounts::default();
            let rows = stmt.query_map(params![queue_name], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?;
            for row in rows {
                let (status, n) = row?;
                match status.as_str() {
                    "pending" => counts.pending = n as u64,
                    "processing" => counts.processing = n as u64,
                    "failed" => counts.failed = n as u64,
                    _ => {}
                }
            }
            Ok(counts)
        })
        .await
        .map_err(map_tr_err)
}
