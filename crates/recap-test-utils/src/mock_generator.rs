// SPDX-FileCopyrightText: 2026 Recap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock summary generator for deterministic testing.
//!
//! `MockGenerator` implements `SummaryGenerator` with scripted outcomes,
//! so summarizer and queue tests never call a real API.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use recap_core::{GenerationOutcome, GenerationRequest, RecapError, SummaryGenerator};

enum Scripted {
    Summary(String),
    NoText,
    Error(String),
}

struct State {
    script: VecDeque<Scripted>,
    requests: Vec<GenerationRequest>,
    delay: Option<Duration>,
}

/// A generator that replays pre-configured outcomes.
///
/// Outcomes are popped from a FIFO queue. When the queue is empty,
/// a default "mock summary" text is returned.
pub struct MockGenerator {
    state: Mutex<State>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                script: VecDeque::new(),
                requests: Vec::new(),
                delay: None,
            }),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn push_summary(&self, text: &str) {
        self.state().script.push_back(Scripted::Summary(text.to_string()));
    }

    pub fn push_no_text(&self) {
        self.state().script.push_back(Scripted::NoText);
    }

    pub fn push_error(&self, message: &str) {
        self.state().script.push_back(Scripted::Error(message.to_string()));
    }

    /// Sleep this long inside every `generate` call.
    pub fn set_delay(&self, delay: Duration) {
        self.state().delay = Some(delay);
    }

    /// Number of `generate` calls so far.
    pub fn calls(&self) -> usize {
        self.state().requests.len()
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.state().requests.clone()
    }

    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.state().requests.last().cloned()
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SummaryGenerator for MockGenerator {
    fn model(&self) -> &str {
        "mock-model"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationOutcome, RecapError> {
        let (next, delay) = {
            let mut state = self.state();
            state.requests.push(request.clone());
            (state.script.pop_front(), state.delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match next {
            Some(Scripted::Summary(text)) => Ok(GenerationOutcome::Summary(text)),
            Some(Scripted::NoText) => Ok(GenerationOutcome::NoText),
            Some(Scripted::Error(message)) => Err(RecapError::provider(message)),
            None => Ok(GenerationOutcome::Summary("mock summary".to_string())),
        }
    }
}
