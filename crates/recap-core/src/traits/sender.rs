// SPDX-FileCopyrightText: 2026 Recap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound delivery of summaries and replies.

use async_trait::async_trait;

use crate::error::RecapError;

/// Delivers text to a chat. An `Err` means the message was not delivered.
#[async_trait]
pub trait ReplySender: Send + Sync {
    /// Posts a standalone message to a chat.
    async fn send_to_chat(&self, chat_id: i64, text: &str) -> Result<(), RecapError>;

    /// Posts a message as a reply to `reply_to_message_id`.
    async fn send_reply(
        &self,
        chat_id: i64,
        reply_to_message_id: i64,
        text: &str,
    ) -> Result<(), RecapError>;
}
