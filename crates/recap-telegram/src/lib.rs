// SPDX-FileCopyrightText: 2026 Recap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram reply sender for Recap.
//!
//! Implements [`ReplySender`] over the Bot API via teloxide. Messages go out
//! with HTML parse mode and link previews disabled; replies tolerate a
//! deleted parent message.

use async_trait::async_trait;
use recap_config::TelegramConfig;
use recap_core::{AdapterType, HealthStatus, PluginAdapter, RecapError, ReplySender};
use teloxide::prelude::*;
use teloxide::types::{ChatId, LinkPreviewOptions, MessageId, ParseMode, ReplyParameters};
use tracing::{debug, warn};

/// Sends summaries and notices through a Telegram bot.
pub struct TelegramSender {
    bot: Bot,
}

impl TelegramSender {
    /// Creates a sender from `telegram.bot_token`.
    pub fn new(config: &TelegramConfig) -> Result<Self, RecapError> {
        let token = config.bot_token.as_deref().ok_or_else(|| {
            RecapError::Config("telegram.bot_token is required to deliver summaries".into())
        })?;

        if token.is_empty() {
            return Err(RecapError::Config("telegram.bot_token cannot be empty".into()));
        }

        Ok(Self {
            bot: Bot::new(token),
        })
    }

    /// Points the bot at another Bot API server.
    pub fn with_api_url(mut self, url: reqwest::Url) -> Self {
        self.bot = self.bot.set_api_url(url);
        self
    }

    async fn send(
        &self,
        chat_id: i64,
        reply_to: Option<i64>,
        text: &str,
    ) -> Result<(), RecapError> {
        let reply = reply_to.map(reply_parameters).transpose()?;

        let mut request = self
            .bot
            .send_message(ChatId(chat_id), text)
            .parse_mode(ParseMode::Html)
            .link_preview_options(no_preview());
        if let Some(params) = reply.clone() {
            request = request.reply_parameters(params);
        }

        match request.await {
            Ok(_) => {
                debug!(chat_id, reply_to, "message sent");
                Ok(())
            }
            Err(e) if e.to_string().contains("can't parse entities") => {
                warn!(chat_id, error = %e, "HTML rejected, sending as plain text");
                let mut plain = self
                    .bot
                    .send_message(ChatId(chat_id), text)
                    .link_preview_options(no_preview());
                if let Some(params) = reply {
                    plain = plain.reply_parameters(params);
                }
                plain.await.map_err(|e| RecapError::Channel {
                    message: format!("failed to send message: {e}"),
                    source: Some(Box::new(e)),
                })?;
                Ok(())
            }
            Err(e) => Err(RecapError::Channel {
                message: format!("failed to send message: {e}"),
                source: Some(Box::new(e)),
            }),
        }
    }
}

fn reply_parameters(message_id: i64) -> Result<ReplyParameters, RecapError> {
    let id = i32::try_from(message_id)
        .map_err(|_| RecapError::channel(format!("message id {message_id} out of range")))?;
    Ok(ReplyParameters::new(MessageId(id)).allow_sending_without_reply())
}

fn no_preview() -> LinkPreviewOptions {
    LinkPreviewOptions {
        is_disabled: true,
        url: None,
        prefer_small_media: false,
        prefer_large_media: false,
        show_above_text: false,
    }
}

#[async_trait]
impl ReplySender for TelegramSender {
    async fn send_to_chat(&self, chat_id: i64, text: &str) -> Result<(), RecapError> {
        self.send(chat_id, None, text).await
    }

    async fn send_reply(
        &self,
        chat_id: i64,
        reply_to_message_id: i64,
        text: &str,
    ) -> Result<(), RecapError> {
        self.send(chat_id, Some(reply_to_message_id), text).await
    }
}

#[async_trait]
impl PluginAdapter for TelegramSender {
    fn name(&self) -> &str {
        "telegram"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, RecapError> {
        match self.bot.get_me().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!("Telegram bot unreachable: {e}"))),
        }
    }

    async fn shutdown(&self) -> Result<(), RecapError> {
        debug!("Telegram sender shutting down");
        Ok(())
    }
}
