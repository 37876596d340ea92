// SPDX-FileCopyrightText: 2026 Recap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Summary job processing for the Recap worker.
//!
//! The [`BatchProcessor`] turns at-least-once deliveries into at-most-once
//! side effects by claiming each job in the ledger first. The
//! [`SqliteJobQueue`] and [`QueueRuntime`] provide a local transport that
//! delivers jobs to it.

pub mod processor;
pub mod runtime;
pub mod texts;
pub mod transport;

pub use processor::{BatchProcessor, Delivery, Disposition, RetryPolicy};
pub use runtime::QueueRuntime;
pub use transport::{QueuedDelivery, SqliteJobQueue};
