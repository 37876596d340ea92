// SPDX-FileCopyrightText: 2026 Recap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI-compatible summary generator for Recap.
//!
//! Formats a window's messages into a compact prompt, sends it to a
//! chat-completions endpoint, and returns the model's HTML summary.

pub mod client;
pub mod format;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use recap_config::{GeneratorConfig, SummaryConfig};
use recap_core::{
    AdapterType, GenerationOutcome, GenerationRequest, HealthStatus, PluginAdapter, RecapError,
    SummaryGenerator,
};
use tracing::{debug, info};

use crate::client::ChatCompletionsClient;
use crate::format::{format_messages, window_text};
use crate::types::{ChatMessage, ChatRequest};

/// Instructions sent with every summary request.
///
/// Replies are posted with Telegram's HTML parse mode, so the model is
/// asked for plain lines with a small set of inline tags.
pub const SYSTEM_PROMPT: &str = "You summarize group chat activity for the members who missed it.\n\
Write 3 to 8 short bullet lines, each starting with \"• \", covering the main topics, \
decisions, questions left open, and links worth reading.\n\
Mention people by the @username shown when it helps.\n\
You may use <b>, <i> and <a href=\"...\"> tags. Do not use Markdown or any other HTML.\n\
Reply in the language most of the messages are written in.";

/// Summary generator backed by a chat-completions API.
pub struct ChatCompletionsGenerator {
    client: ChatCompletionsClient,
    model: String,
    max_tokens: u32,
    max_message_length: usize,
    max_prompt_chars: usize,
}

impl ChatCompletionsGenerator {
    /// Creates a generator from configuration.
    ///
    /// Fails with [`RecapError::Config`] when no API key is available.
    pub fn new(config: &GeneratorConfig, summary: &SummaryConfig) -> Result<Self, RecapError> {
        let api_key = resolve_api_key(&config.api_key)?;
        let client = ChatCompletionsClient::new(
            &api_key,
            &config.base_url,
            Duration::from_secs(config.timeout_secs),
        )?;

        info!(model = %config.model, endpoint = client.endpoint(), "summary generator initialized");

        Ok(Self {
            client,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            max_message_length: summary.max_message_length,
            max_prompt_chars: summary.max_prompt_chars,
        })
    }

    /// Builds the chat request for a window, or `None` when there is nothing to summarize.
    pub fn build_request(&self, request: &GenerationRequest) -> Option<ChatRequest> {
        let content = format_messages(
            &request.messages,
            request.chat_username.as_deref(),
            self.max_message_length,
            self.max_prompt_chars,
        );
        if content.is_empty() {
            return None;
        }

        Some(ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(format!(
                    "Messages from {}:\n\n{content}",
                    window_text(&request.command)
                )),
            ],
            max_tokens: self.max_tokens,
        })
    }
}

#[async_trait]
impl SummaryGenerator for ChatCompletionsGenerator {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationOutcome, RecapError> {
        let Some(chat_request) = self.build_request(request) else {
            debug!(chat_id = request.chat_id, "no text to summarize");
            return Ok(GenerationOutcome::NoText);
        };

        let response = self.client.complete(&chat_request).await?;
        match response.first_text().map(str::trim) {
            Some(text) if !text.is_empty() => Ok(GenerationOutcome::Summary(text.to_string())),
            _ => Err(RecapError::provider("completion returned no content")),
        }
    }
}

#[async_trait]
impl PluginAdapter for ChatCompletionsGenerator {
    fn name(&self) -> &str {
        "chat-completions"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, RecapError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), RecapError> {
        Ok(())
    }
}

/// Resolves the API key from config or the `OPENAI_API_KEY` environment variable.
fn resolve_api_key(config_key: &Option<String>) -> Result<String, RecapError> {
    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Ok(key.clone());
    }

    std::env::var("OPENAI_API_KEY")
        .ok()
        .filter(|key| !key.is_empty())
        .ok_or_else(|| {
            RecapError::Config(
                "generator API key not found. Set generator.api_key in config or OPENAI_API_KEY environment variable.".into(),
            )
        })
}
