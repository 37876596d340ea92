// SPDX-FileCopyrightText: 2026 Recap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Summary job shapes exchanged between producers and the batch processor.
//!
//! Job ids are deterministic so that re-enqueuing the same logical request
//! lands on the same claim-ledger row. Producers must build jobs through the
//! constructors here rather than formatting ids themselves.

use serde::{Deserialize, Serialize};

use crate::types::SummaryCommand;

/// Id for a daily job: `daily:<chat_id>:<window_start>:<window_end>`.
pub fn daily_job_id(chat_id: i64, window_start: i64, window_end: i64) -> String {
    format!("daily:{chat_id}:{window_start}:{window_end}")
}

/// Id for an on-demand job: `on_demand:<chat_id>:<message_id>`.
pub fn on_demand_job_id(chat_id: i64, message_id: i64) -> String {
    format!("on_demand:{chat_id}:{message_id}")
}

/// A scheduled summary of a fixed window, posted to the chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummaryJob {
    pub job_id: String,
    pub chat_id: i64,
    pub chat_username: Option<String>,
    pub window_start: i64,
    pub window_end: i64,
    pub scheduled_at_ts: i64,
}

impl DailySummaryJob {
    pub fn new(
        chat_id: i64,
        chat_username: Option<String>,
        window_start: i64,
        window_end: i64,
        scheduled_at_ts: i64,
    ) -> Self {
        Self {
            job_id: daily_job_id(chat_id, window_start, window_end),
            chat_id,
            chat_username,
            window_start,
            window_end,
            scheduled_at_ts,
        }
    }
}

/// A user-requested summary, answered as a reply to the requesting message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnDemandSummaryJob {
    pub job_id: String,
    pub chat_id: i64,
    pub chat_username: Option<String>,
    pub command: SummaryCommand,
    pub requested_at_ts: i64,
    pub requester_user_id: Option<i64>,
    pub reply_to_message_id: i64,
}

impl OnDemandSummaryJob {
    pub fn new(
        chat_id: i64,
        chat_username: Option<String>,
        command: SummaryCommand,
        requested_at_ts: i64,
        requester_user_id: Option<i64>,
        reply_to_message_id: i64,
    ) -> Self {
        Self {
            job_id: on_demand_job_id(chat_id, reply_to_message_id),
            chat_id,
            chat_username,
            command,
            requested_at_ts,
            requester_user_id,
            reply_to_message_id,
        }
    }

    /// The `(window_start, window_end)` this request covers.
    pub fn window(&self) -> (i64, i64) {
        self.command.window_at(self.requested_at_ts)
    }
}

/// A queued summary job, tagged on the wire as `{"type": "daily" | "on_demand", ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SummaryJob {
    Daily(DailySummaryJob),
    OnDemand(OnDemandSummaryJob),
}

impl SummaryJob {
    pub fn job_id(&self) -> &str {
        match self {
            SummaryJob::Daily(job) => &job.job_id,
            SummaryJob::OnDemand(job) => &job.job_id,
        }
    }

    pub fn chat_id(&self) -> i64 {
        match self {
            SummaryJob::Daily(job) => job.chat_id,
            SummaryJob::OnDemand(job) => job.chat_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SummaryJob::Daily(_) => "daily",
            SummaryJob::OnDemand(_) => "on_demand",
        }
    }
}

impl From<DailySummaryJob> for SummaryJob {
    fn from(job: DailySummaryJob) -> Self {
        SummaryJob::Daily(job)
    }
}

impl From<OnDemandSummaryJob> for SummaryJob {
    fn from(job: OnDemandSummaryJob) -> Self {
        SummaryJob::OnDemand(job)
    }
}
