// SPDX-FileCopyrightText: 2026 Recap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules, one per table.

pub mod claims;
pub mod messages;
pub mod queue;
pub mod rate_limits;
pub mod summaries;
pub mod summary_runs;
