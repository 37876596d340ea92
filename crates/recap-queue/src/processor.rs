// SPDX-FileCopyrightText: 2026 Recap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Claim-gated processing of delivered summary jobs.
//!
//! Every delivery is claimed in the ledger before any side effect. The
//! outcome of the work is reduced to a [`Disposition`]; an ack marks the
//! claim done, a retry releases it so a later delivery can claim afresh.

use std::sync::Arc;

use recap_config::QueueConfig;
use recap_core::{
    ClaimOutcome, ClaimToken, Clock, DailySummaryJob, DoneOutcome, JobClaimLedger,
    OnDemandSummaryJob, RecapError, ReplySender, RunContext, RunType, SummaryCommand, SummaryJob,
};
use recap_summarizer::{SummaryFailure, SummaryResult, SummaryWindow, WindowSummarizer};
use tracing::{debug, error, info, warn};

use crate::texts;

/// What the transport should do with a delivered message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Ack,
    Retry { delay_seconds: i64 },
}

/// A job as handed over by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub job: SummaryJob,
    /// Delivery count including this one, starting at 1.
    pub attempts: u32,
}

/// Retry delays and the attempt cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub transient_secs: i64,
    pub generator_secs: i64,
    pub in_flight_floor_secs: i64,
    pub max_attempts: u32,
}

impl RetryPolicy {
    pub fn from_config(config: &QueueConfig) -> Self {
        Self {
            transient_secs: config.transient_retry_secs,
            generator_secs: config.generator_retry_secs,
            in_flight_floor_secs: config.in_flight_retry_floor_secs,
            max_attempts: config.max_attempts,
        }
    }

    fn transient(&self) -> Disposition {
        Disposition::Retry {
            delay_seconds: self.transient_secs,
        }
    }

    fn generator(&self) -> Disposition {
        Disposition::Retry {
            delay_seconds: self.generator_secs,
        }
    }

    /// Redelivery delay while another owner holds the lease: roughly when it expires.
    pub fn in_flight_delay(&self, lease_until: i64, now: i64, lease_seconds: i64) -> i64 {
        (lease_until - now)
            .min(lease_seconds)
            .max(self.in_flight_floor_secs)
    }

    fn is_final_attempt(&self, attempts: u32) -> bool {
        attempts >= self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&QueueConfig::default())
    }
}

/// Processes delivered batches of [`SummaryJob`]s.
///
/// Cloning is cheap; all collaborators are shared.
#[derive(Clone)]
pub struct BatchProcessor {
    ledger: Arc<dyn JobClaimLedger>,
    summarizer: Arc<WindowSummarizer>,
    sender: Arc<dyn ReplySender>,
    clock: Arc<dyn Clock>,
    policy: RetryPolicy,
}

impl BatchProcessor {
    pub fn new(
        ledger: Arc<dyn JobClaimLedger>,
        summarizer: Arc<WindowSummarizer>,
        sender: Arc<dyn ReplySender>,
        clock: Arc<dyn Clock>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            ledger,
            summarizer,
            sender,
            clock,
            policy,
        }
    }

    /// Processes every delivery independently and returns one disposition
    /// per delivery, in input order.
    pub async fn process_batch(
        &self,
        deliveries: Vec<Delivery>,
        lease_seconds: i64,
    ) -> Vec<Disposition> {
        let pending = deliveries
            .into_iter()
            .map(|delivery| self.process_one(delivery, lease_seconds));
        futures::future::join_all(pending).await
    }

    async fn process_one(&self, delivery: Delivery, lease_seconds: i64) -> Disposition {
        let Delivery { job, attempts } = delivery;
        let job_id = job.job_id().to_string();
        let kind = job.kind();
        let now = self.clock.now();

        let claim = match self.ledger.claim(&job_id, now, lease_seconds).await {
            Ok(ClaimOutcome::Acquired(claim)) => claim,
            Ok(ClaimOutcome::AlreadyDone) => {
                debug!(job_id = %job_id, kind, attempts, "job already done, acking duplicate");
                return Disposition::Ack;
            }
            Ok(ClaimOutcome::InFlight { lease_until }) => {
                let delay_seconds = self.policy.in_flight_delay(lease_until, now, lease_seconds);
                debug!(job_id = %job_id, kind, lease_until, delay_seconds, "job in flight elsewhere");
                return Disposition::Retry { delay_seconds };
            }
            Err(e) => {
                warn!(job_id = %job_id, kind, attempts, error = %e, "claim failed, retrying");
                return self.policy.transient();
            }
        };

        // Run the work on its own task so a panic stays inside this delivery.
        let worker = self.clone();
        let handle = tokio::spawn(async move { worker.dispatch(&job, attempts).await });
        let disposition = match handle.await {
            Ok(Ok(disposition)) => disposition,
            Ok(Err(e)) => {
                error!(job_id = %job_id, kind, attempts, error = %e, "summary job failed");
                self.policy.transient()
            }
            Err(e) => {
                error!(job_id = %job_id, kind, attempts, error = %e, "summary job panicked");
                self.policy.transient()
            }
        };

        match disposition {
            Disposition::Ack => self.complete(&job_id, claim).await,
            Disposition::Retry { .. } => {
                self.release(&job_id, claim).await;
                disposition
            }
        }
    }

    async fn dispatch(&self, job: &SummaryJob, attempts: u32) -> Result<Disposition, RecapError> {
        match job {
            SummaryJob::Daily(job) => self.run_daily(job, attempts).await,
            SummaryJob::OnDemand(job) => self.run_on_demand(job, attempts).await,
        }
    }

    async fn run_daily(
        &self,
        job: &DailySummaryJob,
        attempts: u32,
    ) -> Result<Disposition, RecapError> {
        let window = SummaryWindow {
            chat_id: job.chat_id,
            chat_username: job.chat_username.clone(),
            window_start: job.window_start,
            window_end: job.window_end,
            command: SummaryCommand::LAST_24H,
        };
        let result = self
            .summarizer
            .summarize(&window, Some(RunContext::real(RunType::DailyCron)))
            .await?;

        match result {
            SummaryResult::Summary(text) => {
                let body = texts::daily_summary(&text);
                if let Err(e) = self.sender.send_to_chat(job.chat_id, &body).await {
                    warn!(job_id = %job.job_id, error = %e, "daily summary delivery failed");
                    return Ok(self.policy.transient());
                }
                info!(job_id = %job.job_id, chat_id = job.chat_id, "daily summary sent");
                Ok(Disposition::Ack)
            }
            SummaryResult::Failed(SummaryFailure::AiError) => {
                if self.policy.is_final_attempt(attempts) {
                    warn!(job_id = %job.job_id, attempts, "daily summary generation failed, giving up");
                    return Ok(Disposition::Ack);
                }
                Ok(self.policy.generator())
            }
            SummaryResult::Failed(reason) => {
                info!(job_id = %job.job_id, reason = %reason, "daily summary skipped");
                Ok(Disposition::Ack)
            }
        }
    }

    async fn run_on_demand(
        &self,
        job: &OnDemandSummaryJob,
        attempts: u32,
    ) -> Result<Disposition, RecapError> {
        let (window_start, window_end) = job.window();
        let window = SummaryWindow {
            chat_id: job.chat_id,
            chat_username: job.chat_username.clone(),
            window_start,
            window_end,
            command: job.command,
        };
        let result = self
            .summarizer
            .summarize(&window, Some(RunContext::real(RunType::OnDemand)))
            .await?;

        let reply = match result {
            SummaryResult::Summary(text) => texts::on_demand_summary(&job.command, &text),
            SummaryResult::Failed(SummaryFailure::AiError)
                if !self.policy.is_final_attempt(attempts) =>
            {
                return Ok(self.policy.generator());
            }
            SummaryResult::Failed(reason) => {
                info!(job_id = %job.job_id, reason = %reason, "on-demand summary unavailable");
                texts::failure(reason).to_string()
            }
        };

        if let Err(e) = self
            .sender
            .send_reply(job.chat_id, job.reply_to_message_id, &reply)
            .await
        {
            warn!(job_id = %job.job_id, error = %e, "summary reply delivery failed");
            return Ok(self.policy.transient());
        }
        Ok(Disposition::Ack)
    }

    async fn complete(&self, job_id: &str, claim: ClaimToken) -> Disposition {
        match self.ledger.mark_done(job_id, claim, self.clock.now()).await {
            Ok(DoneOutcome::Marked) => Disposition::Ack,
            Ok(DoneOutcome::AlreadyDone) => {
                debug!(job_id, "job completed by another delivery");
                Disposition::Ack
            }
            Ok(DoneOutcome::LostClaim) => {
                warn!(job_id, "job lost its claim before completion; side effects may repeat");
                Disposition::Ack
            }
            Err(e) => {
                warn!(job_id, error = %e, "failed to mark job done, retrying");
                self.release(job_id, claim).await;
                self.policy.transient()
            }
        }
    }

    async fn release(&self, job_id: &str, claim: ClaimToken) {
        match self.ledger.release(job_id, claim).await {
            Ok(true) => debug!(job_id, "claim released"),
            Ok(false) => debug!(job_id, "claim already superseded"),
            Err(e) => warn!(job_id, error = %e, "failed to release claim"),
        }
    }
}
