// SPDX-FileCopyrightText: 2026 Recap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text-generation backend used by the window summarizer.

use async_trait::async_trait;

use crate::error::RecapError;
use crate::types::{GenerationOutcome, GenerationRequest};

/// Produces a summary for a batch of chat messages.
///
/// `Ok(GenerationOutcome::NoText)` means the batch had nothing to summarize.
/// Any `Err` is treated by callers as a generator failure.
#[async_trait]
pub trait SummaryGenerator: Send + Sync {
    /// Model identifier recorded in telemetry.
    fn model(&self) -> &str;

    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationOutcome, RecapError>;
}
