// SPDX-FileCopyrightText: 2026 Recap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Temp-dir SQLite store for tests.

use std::sync::Arc;

use recap_config::StorageConfig;
use recap_core::{StoredMessage, SummaryStore};
use recap_storage::SqliteStorage;
use tempfile::TempDir;

/// A text message from user 7 with no reply link.
pub fn text_message(chat_id: i64, message_id: i64, ts: i64, text: &str) -> StoredMessage {
    StoredMessage {
        chat_id,
        chat_username: None,
        message_id,
        user_id: Some(7),
        username: Some("tester".to_string()),
        text: Some(text.to_string()),
        ts,
        reply_to_message_id: None,
    }
}

/// An initialized [`SqliteStorage`] backed by a file in a temp directory.
///
/// The directory is removed when the `TestStore` is dropped.
pub struct TestStore {
    pub storage: Arc<SqliteStorage>,
    pub path: String,
    _dir: TempDir,
}

impl TestStore {
    /// Panics if the temp dir or database cannot be created.
    pub async fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let path = dir.path().join("recap-test.db").to_string_lossy().into_owned();
        let storage = SqliteStorage::open(StorageConfig {
            database_path: path.clone(),
            wal_mode: true,
        })
        .await
        .expect("open test storage");
        Self {
            storage: Arc::new(storage),
            path,
            _dir: dir,
        }
    }

    pub async fn seed(&self, message: StoredMessage) {
        self.storage
            .insert_message(&message)
            .await
            .expect("seed message");
    }

    pub async fn seed_text(&self, chat_id: i64, message_id: i64, ts: i64, text: &str) {
        self.seed(text_message(chat_id, message_id, ts, text)).await;
    }

    pub async fn latest_summary_text(
        &self,
        chat_id: i64,
        window_start: i64,
        window_end: i64,
    ) -> Option<String> {
        self.storage
            .latest_summary(chat_id, window_start, window_end)
            .await
            .expect("read summary")
            .map(|s| s.summary_text)
    }
}
