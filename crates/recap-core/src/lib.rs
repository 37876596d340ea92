// SPDX-FileCopyrightText: 2026 Recap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Recap summary worker.
//!
//! Holds the shared error type, the job wire shapes, the claim and rate-limit
//! value types, and the trait seams every other crate plugs into.

pub mod error;
pub mod jobs;
pub mod traits;
pub mod types;

pub use error::RecapError;
pub use jobs::{DailySummaryJob, OnDemandSummaryJob, SummaryJob, daily_job_id, on_demand_job_id};
pub use types::{
    ActiveChat, AdapterType, ClaimOutcome, ClaimToken, DoneOutcome, GenerationOutcome,
    GenerationRequest, HealthStatus, PersistedSummary, RateLimitBucket, RateLimitDecision,
    RateLimitDenial, RateLimitScope, RunContext, RunSource, RunStats, RunType, StoredMessage,
    SummaryCommand, SummaryRun,
};

pub use traits::{
    Clock, JobClaimLedger, JobQueue, MessageSource, PluginAdapter, RateLimitStore, ReplySender,
    SummaryGenerator, SummaryRunStore, SummaryStore, SystemClock,
};
