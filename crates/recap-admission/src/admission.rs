// SPDX-FileCopyrightText: 2026 Recap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rate-gated admission of on-demand summary requests.

use std::sync::Arc;

use recap_core::{
    JobQueue, OnDemandSummaryJob, RateLimitDecision, RateLimitDenial, RecapError,
    SummaryCommand, SummaryJob,
};
use tracing::{debug, info};

use crate::daily::is_chat_allowed;
use crate::limiter::{RateLimiter, denial_text};

/// A parsed `/summary` request as it arrives from the chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnDemandRequest {
    pub chat_id: i64,
    pub chat_username: Option<String>,
    /// `None` for anonymous admins and channel posts.
    pub user_id: Option<i64>,
    pub message_id: i64,
    pub command: SummaryCommand,
    pub requested_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionOutcome {
    Enqueued { job_id: String },
    RateLimited {
        denial: RateLimitDenial,
        reply_text: String,
    },
    Invalid { reason: String },
    /// The chat is not on the allowlist. Nothing is counted or enqueued.
    NotAllowed,
}

/// Checks that `command` asks for a window we can serve.
pub fn validate_command(command: &SummaryCommand, max_summary_hours: u32) -> Result<(), String> {
    if command.from_hours == 0 || command.from_hours > max_summary_hours {
        return Err(format!(
            "window must start between 1 and {max_summary_hours} hours ago"
        ));
    }
    if command.to_hours >= command.from_hours {
        return Err("window end must be more recent than its start".to_string());
    }
    Ok(())
}

pub struct SummaryAdmission {
    limiter: RateLimiter,
    queue: Arc<dyn JobQueue>,
    max_summary_hours: u32,
    allowed_chat_ids: Vec<i64>,
}

impl SummaryAdmission {
    pub fn new(
        limiter: RateLimiter,
        queue: Arc<dyn JobQueue>,
        max_summary_hours: u32,
        allowed_chat_ids: Vec<i64>,
    ) -> Self {
        Self {
            limiter,
            queue,
            max_summary_hours,
            allowed_chat_ids,
        }
    }

    /// Checks the allowlist, validates, rate-limits, and enqueues one request.
    ///
    /// Only a failed enqueue is an error; rate-limit store failures admit.
    pub async fn admit(&self, request: &OnDemandRequest) -> Result<AdmissionOutcome, RecapError> {
        if !is_chat_allowed(request.chat_id, &self.allowed_chat_ids) {
            debug!(chat_id = request.chat_id, "summary request from chat not on allowlist");
            return Ok(AdmissionOutcome::NotAllowed);
        }

        if let Err(reason) = validate_command(&request.command, self.max_summary_hours) {
            debug!(chat_id = request.chat_id, reason = %reason, "invalid summary request");
            return Ok(AdmissionOutcome::Invalid { reason });
        }

        let decision = self
            .limiter
            .check_summary_rate_limit(request.chat_id, request.user_id, request.requested_at)
            .await;
        if let RateLimitDecision::Denied(denial) = decision {
            info!(
                chat_id = request.chat_id,
                scope = %denial.scope,
                retry_after = denial.retry_after_seconds,
                "summary request rate limited"
            );
            return Ok(AdmissionOutcome::RateLimited {
                reply_text: denial_text(&denial),
                denial,
            });
        }

        let job = OnDemandSummaryJob::new(
            request.chat_id,
            request.chat_username.clone(),
            request.command,
            request.requested_at,
            request.user_id,
            request.message_id,
        );
        let job_id = job.job_id.clone();
        self.queue.enqueue(&SummaryJob::OnDemand(job)).await?;
        info!(job_id = %job_id, "on-demand summary enqueued");
        Ok(AdmissionOutcome::Enqueued { job_id })
    }
}
