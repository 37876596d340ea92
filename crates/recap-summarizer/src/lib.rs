// SPDX-FileCopyrightText: 2026 Recap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Window summarizer for the Recap worker.
//!
//! Given an exact `(chat, window_start, window_end)` tuple, returns the
//! persisted summary if one exists, otherwise loads the window's messages,
//! asks the configured generator, and stores the result.

pub mod background;
pub mod guard;
pub mod summarizer;

pub use background::BackgroundWrites;
pub use guard::DegradedGuard;
pub use summarizer::{
    SummarizerStores, SummaryFailure, SummaryResult, SummaryWindow, WindowSummarizer,
    estimate_tokens,
};
