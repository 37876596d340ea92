// SPDX-FileCopyrightText: 2026 Recap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the store traits, the summarizer, and the queue.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a [`crate::PluginAdapter`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    Provider,
    Channel,
    Queue,
}

// --- Chat data ---

/// A chat message as stored by the ingestion side and read back for summaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub chat_id: i64,
    pub chat_username: Option<String>,
    pub message_id: i64,
    pub user_id: Option<i64>,
    pub username: Option<String>,
    pub text: Option<String>,
    pub ts: i64,
    pub reply_to_message_id: Option<i64>,
}

/// A chat that had at least one message inside a window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveChat {
    pub chat_id: i64,
    pub chat_username: Option<String>,
}

/// A generated summary persisted for an exact `(chat, window_start, window_end)` tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedSummary {
    pub id: i64,
    pub chat_id: i64,
    pub window_start: i64,
    pub window_end: i64,
    pub summary_text: String,
    pub ts: i64,
}

/// Hour offsets of a summary request, relative to the time it was made.
///
/// `from_hours = 3, to_hours = 1` covers the span from three hours ago
/// up to one hour ago.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryCommand {
    pub from_hours: u32,
    pub to_hours: u32,
}

impl SummaryCommand {
    /// The fixed command used by daily jobs.
    pub const LAST_24H: SummaryCommand = SummaryCommand {
        from_hours: 24,
        to_hours: 0,
    };

    pub fn new(from_hours: u32, to_hours: u32) -> Self {
        Self {
            from_hours,
            to_hours,
        }
    }

    /// Returns `(window_start, window_end)` in seconds for a request made at `requested_at`.
    pub fn window_at(&self, requested_at: i64) -> (i64, i64) {
        let start = requested_at - i64::from(self.from_hours) * 3600;
        let end = requested_at - i64::from(self.to_hours) * 3600;
        (start, end)
    }

    /// Human-readable description of the covered span.
    pub fn describe(&self) -> String {
        if self.to_hours == 0 {
            if self.from_hours == 1 {
                "last hour".to_string()
            } else {
                format!("last {} hours", self.from_hours)
            }
        } else {
            format!("{} to {} hours ago", self.from_hours, self.to_hours)
        }
    }
}

// --- Claim ledger ---

/// The `(lease_until, updated_at)` pair observed at claim time.
///
/// Every later transition on the same job must present this exact pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimToken {
    pub lease_until: i64,
    pub updated_at: i64,
}

/// Result of trying to claim a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The caller now owns the job until `lease_until`.
    Acquired(ClaimToken),
    /// The job was completed by an earlier delivery.
    AlreadyDone,
    /// Another owner holds a live lease.
    InFlight { lease_until: i64 },
}

/// Result of marking a claimed job as done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoneOutcome {
    Marked,
    AlreadyDone,
    /// The lease was taken over by another owner after it expired.
    LostClaim,
}

// --- Rate limiting ---

/// Counter bucket used by the summary admission policy.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum RateLimitBucket {
    #[strum(serialize = "summary_user_in_chat")]
    UserInChat,
    #[strum(serialize = "summary_chat")]
    Chat,
}

impl RateLimitBucket {
    pub fn scope(self) -> RateLimitScope {
        match self {
            RateLimitBucket::UserInChat => RateLimitScope::User,
            RateLimitBucket::Chat => RateLimitScope::Chat,
        }
    }
}

/// The scope a denial applies to, as reported back to the requester.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum RateLimitScope {
    User,
    Chat,
}

/// Details of a denied admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDenial {
    pub scope: RateLimitScope,
    pub limit: u32,
    pub window_seconds: i64,
    pub retry_after_seconds: i64,
}

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    Denied(RateLimitDenial),
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitDecision::Allowed)
    }
}

// --- Telemetry ---

/// Where a summary run originated.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
pub enum RunSource {
    RealUsage,
    SyntheticBenchmark,
}

/// What triggered a summary run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
pub enum RunType {
    OnDemand,
    DailyCron,
}

/// Telemetry context attached to a summarize call. No run row is written without one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunContext {
    pub source: RunSource,
    pub run_type: RunType,
}

impl RunContext {
    pub fn real(run_type: RunType) -> Self {
        Self {
            source: RunSource::RealUsage,
            run_type,
        }
    }
}

/// One recorded summary attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRun {
    pub source: RunSource,
    pub run_type: RunType,
    pub chat_id: i64,
    pub window_start: i64,
    pub window_end: i64,
    pub input_message_count: u32,
    pub input_chars: u64,
    pub input_token_estimate: u64,
    pub model: Option<String>,
    pub latency_ms: u64,
    pub success: bool,
    pub error_type: Option<String>,
    pub output_chars: u64,
    pub ts: i64,
}

impl SummaryRun {
    pub fn window_seconds(&self) -> i64 {
        (self.window_end - self.window_start).max(0)
    }
}

/// Aggregated statistics over recorded summary runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStats {
    pub total: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub avg_latency_ms: Option<f64>,
    pub p50_latency_ms: Option<u64>,
    pub p95_latency_ms: Option<u64>,
    pub avg_input_chars: Option<f64>,
    pub avg_output_chars: Option<f64>,
}

// --- Generation ---

/// Input handed to a [`crate::SummaryGenerator`]. Messages are oldest first.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub chat_id: i64,
    pub chat_username: Option<String>,
    pub command: SummaryCommand,
    pub messages: Vec<StoredMessage>,
}

/// Non-error outcome of a generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Summary(String),
    /// The batch contained nothing worth summarizing.
    NoText,
}
