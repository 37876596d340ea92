// SPDX-FileCopyrightText: 2026 Recap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock reply sender that captures outbound messages for assertions.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use recap_core::{RecapError, ReplySender};

/// One captured outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub chat_id: i64,
    /// `Some` for replies, `None` for standalone chat posts.
    pub reply_to: Option<i64>,
    pub text: String,
}

/// Captures every send. Can be switched into a failing mode.
#[derive(Default)]
pub struct MockSender {
    sent: Mutex<Vec<SentMessage>>,
    failing: AtomicBool,
}

impl MockSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent sends fail with a channel error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn record(&self, chat_id: i64, reply_to: Option<i64>, text: &str) -> Result<(), RecapError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RecapError::channel("mock sender offline"));
        }
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(SentMessage {
                chat_id,
                reply_to,
                text: text.to_string(),
            });
        Ok(())
    }
}

#[async_trait]
impl ReplySender for MockSender {
    async fn send_to_chat(&self, chat_id: i64, text: &str) -> Result<(), RecapError> {
        self.record(chat_id, None, text)
    }

    async fn send_reply(
        &self,
        chat_id: i64,
        reply_to_message_id: i64,
        text: &str,
    ) -> Result<(), RecapError> {
        self.record(chat_id, Some(reply_to_message_id), text)
    }
}
