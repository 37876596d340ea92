// SPDX-FileCopyrightText: 2026 Recap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the core components and their collaborators.
//!
//! Every trait uses `#[async_trait]` so implementations can be held as
//! `Arc<dyn Trait>` and swapped for mocks in tests.

pub mod adapter;
pub mod clock;
pub mod generator;
pub mod queue;
pub mod sender;
pub mod store;

pub use adapter::PluginAdapter;
pub use clock::{Clock, SystemClock};
pub use generator::SummaryGenerator;
pub use queue::JobQueue;
pub use sender::ReplySender;
pub use store::{JobClaimLedger, MessageSource, RateLimitStore, SummaryRunStore, SummaryStore};
