// SPDX-FileCopyrightText: 2026 Recap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row types returned by the query modules that have no counterpart in `recap-core`.

/// A row of the claim ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimRecord {
    pub job_id: String,
    pub status: String,
    pub lease_until: i64,
    pub updated_at: i64,
    pub done_at: Option<i64>,
}

impl ClaimRecord {
    pub fn is_done(&self) -> bool {
        self.status == crate::queries::claims::STATUS_DONE
    }
}

/// A message in the local job queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub id: i64,
    pub queue_name: String,
    pub payload: String,
    pub status: String,
    /// Deliveries so far, including the current one.
    pub attempts: u32,
    pub max_attempts: u32,
    pub visible_at: i64,
    pub locked_until: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Row counts of a queue by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueCounts {
    pub pending: u64,
    pub processing: u64,
    pub failed: u64,
}
