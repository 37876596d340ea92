// SPDX-FileCopyrightText: 2026 Recap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Recap integration tests.
//!
//! Provides mock collaborators and a temp-dir SQLite store for fast,
//! deterministic tests without Telegram or a generation API.
//!
//! # Components
//!
//! - [`ManualClock`] - Clock that only moves when told to
//! - [`MockGenerator`] - Summary generator with scripted outcomes
//! - [`MockSender`] - Reply sender that captures outbound messages
//! - [`RecordingQueue`] - Job queue that captures enqueued jobs
//! - [`FaultyStore`] - Store wrapper with per-operation failure injection
//! - [`TestStore`] - Temp-dir [`recap_storage::SqliteStorage`] with seeding helpers

pub mod clock;
pub mod faulty_store;
pub mod mock_generator;
pub mod mock_queue;
pub mod mock_sender;
pub mod store;

pub use clock::ManualClock;
pub use faulty_store::{Fault, FaultyStore};
pub use mock_generator::MockGenerator;
pub use mock_queue::RecordingQueue;
pub use mock_sender::{MockSender, SentMessage};
pub use store::{TestStore, text_message};
