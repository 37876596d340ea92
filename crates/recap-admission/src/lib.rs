// SPDX-FileCopyrightText: 2026 Recap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Admission side of the Recap worker.
//!
//! Everything that decides whether a summary job is created: the
//! fixed-window [`RateLimiter`], the on-demand [`SummaryAdmission`] gate,
//! and the scheduled [`DailyDispatcher`].

pub mod admission;
pub mod daily;
pub mod limiter;
pub mod retention;

pub use admission::{AdmissionOutcome, OnDemandRequest, SummaryAdmission, validate_command};
pub use daily::{DAY_SECONDS, DailyDispatcher, DispatchReport, is_chat_allowed};
pub use limiter::{RateLimiter, denial_text, window_start};
pub use retention::CounterSweeper;
