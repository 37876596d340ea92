// SPDX-FileCopyrightText: 2026 Recap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Recap summary worker.
//!
//! One `tokio-rusqlite` connection per [`Database`] serializes writes within
//! the process; across processes every coordination write is a conditional
//! statement, so the store stays the single source of truth for claims and
//! rate-limit counters.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use adapter::SqliteStorage;
pub use database::Database;
pub use models::{ClaimRecord, QueueCounts, QueueEntry};
