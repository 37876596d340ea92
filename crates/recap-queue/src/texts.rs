// SPDX-FileCopyrightText: 2026 Recap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User-facing message texts. Messages are sent with HTML parse mode.

use recap_core::SummaryCommand;
use recap_summarizer::SummaryFailure;

pub const NO_MESSAGES: &str = "No messages found in that window.";
pub const NO_TEXT: &str = "No text messages found in that window.";
pub const DEGRADED: &str = "Summaries are temporarily unavailable. Please try again later.";
pub const GENERATION_FAILED: &str = "Failed to generate a summary. Please try again later.";

/// Body of the scheduled daily post.
pub fn daily_summary(summary: &str) -> String {
    format!("<b>Daily Summary (Auto, last 24h)</b>\n\n{summary}")
}

/// Reply to a successful on-demand request.
pub fn on_demand_summary(command: &SummaryCommand, summary: &str) -> String {
    format!("<b>Summary ({})</b>\n\n{summary}", command.describe())
}

/// Reply explaining why no summary was produced.
pub fn failure(reason: SummaryFailure) -> &'static str {
    match reason {
        SummaryFailure::NoMessages => NO_MESSAGES,
        SummaryFailure::NoText => NO_TEXT,
        SummaryFailure::Degraded => DEGRADED,
        SummaryFailure::AiError => GENERATION_FAILED,
    }
}
