// SPDX-FileCopyrightText: 2026 Recap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cache-or-generate summary of one chat window.

use std::sync::Arc;
use std::time::{Duration, Instant};

use recap_config::SummaryConfig;
use recap_core::{
    Clock, GenerationOutcome, GenerationRequest, MessageSource, RecapError, RunContext,
    SummaryCommand, SummaryGenerator, SummaryRun, SummaryRunStore, SummaryStore,
};
use strum::Display;
use tracing::{debug, warn};

use crate::background::BackgroundWrites;
use crate::guard::DegradedGuard;

/// Why a window produced no summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SummaryFailure {
    /// No messages in the window.
    NoMessages,
    /// Messages exist but none carry summarizable text.
    NoText,
    /// The generator failed.
    AiError,
    /// Generation is paused after repeated generator failures.
    Degraded,
}

/// Result of [`WindowSummarizer::summarize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryResult {
    Summary(String),
    Failed(SummaryFailure),
}

/// The exact window to summarize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryWindow {
    pub chat_id: i64,
    pub chat_username: Option<String>,
    pub window_start: i64,
    pub window_end: i64,
    pub command: SummaryCommand,
}

/// Store handles the summarizer reads and writes.
#[derive(Clone)]
pub struct SummarizerStores {
    pub summaries: Arc<dyn SummaryStore>,
    pub runs: Arc<dyn SummaryRunStore>,
    pub messages: Arc<dyn MessageSource>,
}

#[derive(Default)]
struct InputUsage {
    message_count: u32,
    chars: u64,
}

/// Looks up a persisted summary for a window or generates and stores a new one.
///
/// Repeated calls for the same `(chat, window_start, window_end)` return the
/// stored text without touching the message store or the generator.
pub struct WindowSummarizer {
    stores: SummarizerStores,
    generator: Arc<dyn SummaryGenerator>,
    clock: Arc<dyn Clock>,
    guard: DegradedGuard,
    writes: BackgroundWrites,
    max_messages: u32,
}

impl WindowSummarizer {
    pub fn new(
        stores: SummarizerStores,
        generator: Arc<dyn SummaryGenerator>,
        clock: Arc<dyn Clock>,
        config: &SummaryConfig,
        writes: BackgroundWrites,
    ) -> Self {
        Self {
            guard: DegradedGuard::new(stores.runs.clone(), config),
            stores,
            generator,
            clock,
            writes,
            max_messages: config.max_messages,
        }
    }

    /// Handle to the side-write executor, for draining at shutdown.
    pub fn writes(&self) -> &BackgroundWrites {
        &self.writes
    }

    /// Summarizes `window`. A run row is recorded only when `context` is given.
    ///
    /// Store failures while reading the cache or the messages are returned as
    /// `Err`; generator failures become [`SummaryFailure::AiError`].
    pub async fn summarize(
        &self,
        window: &SummaryWindow,
        context: Option<RunContext>,
    ) -> Result<SummaryResult, RecapError> {
        let started = Instant::now();
        let mut usage = InputUsage::default();
        let result = self.run(window, context, &mut usage).await;

        if let Some(context) = context {
            self.record_run(window, context, &usage, started.elapsed(), &result)
                .await;
        }
        result
    }

    async fn run(
        &self,
        window: &SummaryWindow,
        context: Option<RunContext>,
        usage: &mut InputUsage,
    ) -> Result<SummaryResult, RecapError> {
        if let Some(cached) = self
            .stores
            .summaries
            .latest_summary(window.chat_id, window.window_start, window.window_end)
            .await?
        {
            debug!(chat_id = window.chat_id, summary_id = cached.id, "summary cache hit");
            return Ok(SummaryResult::Summary(cached.summary_text));
        }

        let now = self.clock.now();
        if self.guard.is_tripped(now, context.map(|c| c.source)).await {
            return Ok(SummaryResult::Failed(SummaryFailure::Degraded));
        }

        let mut messages = self
            .stores
            .messages
            .load_messages(
                window.chat_id,
                window.window_start,
                window.window_end,
                self.max_messages,
            )
            .await?;
        if messages.is_empty() {
            return Ok(SummaryResult::Failed(SummaryFailure::NoMessages));
        }
        usage.message_count = messages.len() as u32;
        usage.chars = messages
            .iter()
            .filter_map(|m| m.text.as_deref())
            .map(|t| t.chars().count() as u64)
            .sum();

        // Loaded newest first; generators read oldest first.
        messages.reverse();
        let request = GenerationRequest {
            chat_id: window.chat_id,
            chat_username: window.chat_username.clone(),
            command: window.command,
            messages,
        };

        let text = match self.generator.generate(&request).await {
            Ok(GenerationOutcome::Summary(text)) if !text.trim().is_empty() => text,
            Ok(GenerationOutcome::Summary(_)) => {
                warn!(chat_id = window.chat_id, "generator returned empty summary");
                return Ok(SummaryResult::Failed(SummaryFailure::AiError));
            }
            Ok(GenerationOutcome::NoText) => {
                return Ok(SummaryResult::Failed(SummaryFailure::NoText));
            }
            Err(e) => {
                warn!(chat_id = window.chat_id, error = %e, "summary generation failed");
                return Ok(SummaryResult::Failed(SummaryFailure::AiError));
            }
        };

        self.persist(window, &text).await;
        Ok(SummaryResult::Summary(text))
    }

    async fn persist(&self, window: &SummaryWindow, text: &str) {
        let summaries = self.stores.summaries.clone();
        let (chat_id, start, end) = (window.chat_id, window.window_start, window.window_end);
        let text = text.to_string();
        let ts = self.clock.now();
        self.writes
            .submit(async move {
                if let Err(e) = summaries.insert_summary(chat_id, start, end, &text, ts).await {
                    warn!(chat_id, error = %e, "failed to persist summary");
                }
            })
            .await;
    }

    async fn record_run(
        &self,
        window: &SummaryWindow,
        context: RunContext,
        usage: &InputUsage,
        elapsed: Duration,
        result: &Result<SummaryResult, RecapError>,
    ) {
        let (success, error_type, output_chars) = match result {
            Ok(SummaryResult::Summary(text)) => (true, None, text.chars().count() as u64),
            Ok(SummaryResult::Failed(reason)) => (false, Some(reason.to_string()), 0),
            Err(_) => (false, Some("storage_error".to_string()), 0),
        };
        let run = SummaryRun {
            source: context.source,
            run_type: context.run_type,
            chat_id: window.chat_id,
            window_start: window.window_start,
            window_end: window.window_end,
            input_message_count: usage.message_count,
            input_chars: usage.chars,
            input_token_estimate: estimate_tokens(usage.chars),
            model: Some(self.generator.model().to_string()),
            latency_ms: elapsed.as_millis() as u64,
            success,
            error_type,
            output_chars,
            ts: self.clock.now(),
        };

        let runs = self.stores.runs.clone();
        self.writes
            .submit(async move {
                if let Err(e) = runs.record_run(&run).await {
                    warn!(chat_id = run.chat_id, error = %e, "failed to record summary run");
                }
            })
            .await;
    }
}

/// Rough token count for telemetry: one token per four characters, rounded up.
pub fn estimate_tokens(chars: u64) -> u64 {
    chars.div_ceil(4)
}
