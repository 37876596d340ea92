// SPDX-FileCopyrightText: 2026 Recap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ingested chat messages.

use recap_core::{ActiveChat, RecapError, StoredMessage};
use rusqlite::params;

use crate::database::{Database, map_tr_err};

/// Stores a message. Returns `false` if `(chat_id, message_id)` was already present.
pub async fn insert_message(db: &Database, msg: &StoredMessage) -> Result<bool, RecapError> {
    let msg = msg.clone();
    db.connection()
        .call(move |conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO messages
                     (chat_id, chat_username, message_id, user_id, username, text, ts,
                      reply_to_message_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    msg.chat_id,
                    msg.chat_username,
                    msg.message_id,
                    msg.user_id,
                    msg.username,
                    msg.text,
                    msg.ts,
                    msg.reply_to_message_id,
                ],
            )?;
            Ok(inserted > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Messages of one chat with `window_start <= ts <= window_end`, newest first.
pub async fn load_messages_for_window(
    db: &Database,
    chat_id: i64,
    window_start: i64,
    window_end: i64,
    limit: u32,
) -> Result<Vec<StoredMessage>, RecapError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT chat_id, chat_username, message_id, user_id, username, text, ts,
                        reply_to_message_id
                 FROM messages
                 WHERE chat_id = ?1 AND ts BETWEEN ?2 AND ?3
                 ORDER BY ts DESC, message_id DESC
                 LIMIT ?4",
            )?;
            let rows = stmt.query_map(params![chat_id, window_start, window_end, limit], |row| {
                Ok(StoredMessage {
                    chat_id: row.get(0)?,
                    chat_username: row.get(1)?,
                    message_id: row.get(2)?,
                    user_id: row.get(3)?,
                    username: row.get(4)?,
                    text: row.get(5)?,
                    ts: row.get(6)?,
                    reply_to_message_id: row.get(7)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Distinct chats with messages in the window, with the latest known username.
pub async fn load_active_chats(
    db: &Database,
    window_start: i64,
    window_end: i64,
) -> Result<Vec<ActiveChat>, RecapError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT chat_id, MAX(chat_username)
                 FROM messages
                 WHERE ts BETWEEN ?1 AND ?2
                 GROUP BY chat_id
                 ORDER BY chat_id",
            )?;
            let rows = stmt.query_map(params![window_start, window_end], |row| {
                Ok(ActiveChat {
                    chat_id: row.get(0)?,
                    chat_username: row.get(1)?,
                })
            })?;
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
        let db_path = dir.path().join("messages.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn msg(chat_id: i64, message_id: i64, ts: i64) -> StoredMessage {
        StoredMessage {
            chat_id,
            chat_username: Some("recapgroup".into()),
            message_id,
            user_id: Some(42),
            username: Some("alice".into()),
            text: Some(format!("message {message_id}")),
            ts,
            reply_to_message_id: None,
        }
    }

    #[tokio::test]
    async fn duplicate_insert_is_ignored() {
        let (db, _dir) = setup_db().await;
        assert!(insert_message(&db, &msg(-1001, 1, 150)).await.unwrap());
        assert!(!insert_message(&db, &msg(-1001, 1, 150)).await.unwrap());
    }

    #[tokio::test]
    async fn window_is_inclusive_newest_first_and_bounded() {
        let (db, _dir) = setup_db().await;
        for (id, ts) in [(1, 99), (2, 100), (3, 150), (4, 200), (5, 201)] {
            insert_message(&db, &msg(-1001, id, ts)).await.unwrap();
        }
        insert_message(&db, &msg(-2002, 9, 150)).await.unwrap();

        let rows = load_messages_for_window(&db, -1001, 100, 200, 200).await.unwrap();
        let ids: Vec<i64> = rows.iter().map(|m| m.message_id).collect();
        assert_eq!(ids, vec![4, 3, 2]);

        let bounded = load_messages_for_window(&db, -1001, 100, 200, 2).await.unwrap();
        assert_eq!(bounded.len(), 2);
        assert_eq!(bounded[0].message_id, 4);
    }

    #[tokio::test]
    async fn active_chats_are_distinct() {
        let (db, _dir) = setup_db().await;
        insert_message(&db, &msg(-1001, 1, 150)).await.unwrap();
        insert_message(&db, &msg(-1001, 2, 160)).await.unwrap();
        insert_message(&db, &msg(-2002, 1, 170)).await.unwrap();
        insert_message(&db, &msg(-3003, 1, 5_000)).await.unwrap();

        let chats = load_active_chats(&db, 100, 200).await.unwrap();
        let ids: Vec<i64> = chats.iter().map(|c| c.chat_id).collect();
        assert_eq!(ids, vec![-2002, -1001]);
        assert_eq!(chats[1].chat_username.as_deref(), Some("recapgroup"));
    }
}
