// SPDX-FileCopyrightText: 2026 Recap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Recap summary worker.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so that a misspelled key
//! is rejected at startup instead of silently falling back to a default.

use serde::{Deserialize, Serialize};

/// Top-level Recap configuration.
///
/// Every section is optional and defaults to values suitable for a single
/// worker process against a local SQLite file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RecapConfig {
    /// Service identity and logging.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Telegram bot settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Text-generation backend settings.
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// SQLite storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Fixed-window admission limits and counter retention.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Window summarizer settings.
    #[serde(default)]
    pub summary: SummaryConfig,

    /// Job queue, lease, and retry settings.
    #[serde(default)]
    pub queue: QueueConfig,

    /// Daily dispatch schedule.
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

/// Service identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Instance name, used in log lines.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "recap".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Telegram bot configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Telegram Bot API token. Required by commands that deliver messages.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Chats that receive daily summaries. Empty means none.
    #[serde(default)]
    pub allowed_chat_ids: Vec<i64>,
}

/// OpenAI-compatible chat-completions backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorConfig {
    /// API key sent as a bearer token.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL of the API, without the `/chat/completions` suffix.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,

    /// Upper bound on generated tokens.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_timeout_secs() -> u64 {
    60
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("recap").join("recap.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("recap.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Fixed-window rate limits for summary requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    /// Window length in seconds. Windows are aligned to multiples of this value.
    #[serde(default = "default_window_seconds")]
    pub window_seconds: i64,

    /// Requests allowed per (chat, user) per window.
    #[serde(default = "default_user_limit")]
    pub user_limit: u32,

    /// Requests allowed per chat per window.
    #[serde(default = "default_chat_limit")]
    pub chat_limit: u32,

    /// Counters untouched for longer than this are swept.
    #[serde(default = "default_retention_seconds")]
    pub retention_seconds: i64,

    /// Rows deleted per sweep batch.
    #[serde(default = "default_cleanup_batch_size")]
    pub cleanup_batch_size: u32,

    /// Maximum batches per sweep.
    #[serde(default = "default_cleanup_max_batches")]
    pub cleanup_max_batches: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_seconds: default_window_seconds(),
            user_limit: default_user_limit(),
            chat_limit: default_chat_limit(),
            retention_seconds: default_retention_seconds(),
            cleanup_batch_size: default_cleanup_batch_size(),
            cleanup_max_batches: default_cleanup_max_batches(),
        }
    }
}

fn default_window_seconds() -> i64 {
    600
}

fn default_user_limit() -> u32 {
    5
}

fn default_chat_limit() -> u32 {
    20
}

fn default_retention_seconds() -> i64 {
    2 * 86_400
}

fn default_cleanup_batch_size() -> u32 {
    500
}

fn default_cleanup_max_batches() -> u32 {
    20
}

/// Window summarizer configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SummaryConfig {
    /// Maximum messages loaded for one window.
    #[serde(default = "default_max_messages")]
    pub max_messages: u32,

    /// Characters kept per message in the prompt.
    #[serde(default = "default_max_message_length")]
    pub max_message_length: usize,

    /// Upper bound on the formatted message batch.
    #[serde(default = "default_max_prompt_chars")]
    pub max_prompt_chars: usize,

    /// Largest `from_hours` an on-demand request may ask for.
    #[serde(default = "default_max_summary_hours")]
    pub max_summary_hours: u32,

    /// Stop calling the generator after repeated recent failures.
    #[serde(default = "default_degraded_guard")]
    pub degraded_guard: bool,

    /// Generator failures within the horizon that trip the guard.
    #[serde(default = "default_degraded_failure_threshold")]
    pub degraded_failure_threshold: u64,

    /// Trailing horizon for counting generator failures.
    #[serde(default = "default_degraded_horizon_seconds")]
    pub degraded_horizon_seconds: i64,

    /// Write summaries and telemetry on background tasks instead of inline.
    #[serde(default = "default_background_writes")]
    pub background_writes: bool,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            max_messages: default_max_messages(),
            max_message_length: default_max_message_length(),
            max_prompt_chars: default_max_prompt_chars(),
            max_summary_hours: default_max_summary_hours(),
            degraded_guard: default_degraded_guard(),
            degraded_failure_threshold: default_degraded_failure_threshold(),
            degraded_horizon_seconds: default_degraded_horizon_seconds(),
            background_writes: default_background_writes(),
        }
    }
}

fn default_max_messages() -> u32 {
    200
}

fn default_max_message_length() -> usize {
    280
}

fn default_max_prompt_chars() -> usize {
    8000
}

fn default_max_summary_hours() -> u32 {
    168
}

fn default_degraded_guard() -> bool {
    true
}

fn default_degraded_failure_threshold() -> u64 {
    5
}

fn default_degraded_horizon_seconds() -> i64 {
    900
}

fn default_background_writes() -> bool {
    true
}

/// Job queue and claim-lease configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QueueConfig {
    /// Queue name in the local transport table.
    #[serde(default = "default_queue_name")]
    pub name: String,

    /// Claim lease length. A stalled worker loses the job after this long.
    #[serde(default = "default_lease_seconds")]
    pub lease_seconds: i64,

    /// Messages delivered per batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Idle poll interval of the local queue runtime.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// How long a delivered message stays invisible before redelivery.
    #[serde(default = "default_visibility_timeout_secs")]
    pub visibility_timeout_secs: i64,

    /// Deliveries before a message is given up on.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Retry delay after store or delivery failures.
    #[serde(default = "default_transient_retry_secs")]
    pub transient_retry_secs: i64,

    /// Retry delay after a generator failure.
    #[serde(default = "default_generator_retry_secs")]
    pub generator_retry_secs: i64,

    /// Minimum retry delay when another worker holds the lease.
    #[serde(default = "default_in_flight_retry_floor_secs")]
    pub in_flight_retry_floor_secs: i64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            name: default_queue_name(),
            lease_seconds: default_lease_seconds(),
            batch_size: default_batch_size(),
            poll_interval_ms: default_poll_interval_ms(),
            visibility_timeout_secs: default_visibility_timeout_secs(),
            max_attempts: default_max_attempts(),
            transient_retry_secs: default_transient_retry_secs(),
            generator_retry_secs: default_generator_retry_secs(),
            in_flight_retry_floor_secs: default_in_flight_retry_floor_secs(),
        }
    }
}

fn default_queue_name() -> String {
    "summary-jobs".to_string()
}

fn default_lease_seconds() -> i64 {
    180
}

fn default_batch_size() -> u32 {
    10
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_visibility_timeout_secs() -> i64 {
    300
}

fn default_max_attempts() -> u32 {
    5
}

fn default_transient_retry_secs() -> i64 {
    10
}

fn default_generator_retry_secs() -> i64 {
    30
}

fn default_in_flight_retry_floor_secs() -> i64 {
    5
}

/// Daily dispatch schedule.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleConfig {
    /// Run the daily dispatch from `serve`.
    #[serde(default = "default_daily_enabled")]
    pub daily_enabled: bool,

    /// Cron expression (UTC) for the daily dispatch.
    #[serde(default = "default_daily_cron")]
    pub daily_cron: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            daily_enabled: default_daily_enabled(),
            daily_cron: default_daily_cron(),
        }
    }
}

fn default_daily_enabled() -> bool {
    true
}

fn default_daily_cron() -> String {
    "0 0 * * *".to_string()
}

impl RecapConfig {
    /// Copy of the configuration with secrets replaced, for display.
    pub fn redacted(&self) -> RecapConfig {
        let mut copy = self.clone();
        if copy.telegram.bot_token.is_some() {
            copy.telegram.bot_token = Some("<redacted>".to_string());
        }
        if copy.generator.api_key.is_some() {
            copy.generator.api_key = Some("<redacted>".to_string());
        }
        copy
    }
}
