// SPDX-FileCopyrightText: 2026 Recap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks cross-field constraints serde cannot express, such as lease
//! lengths relative to retry floors and parseable cron expressions.

use crate::diagnostic::ConfigError;
use crate::model::RecapConfig;

/// Hard upper bound on how far back a summary may reach.
pub const MAX_SUMMARY_HOURS_LIMIT: u32 = 168;

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every violation instead of stopping at the first one.
pub fn validate_config(config: &RecapConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    let rl = &config.rate_limit;
    if rl.window_seconds <= 0 {
        fail(format!(
            "rate_limit.window_seconds must be positive, got {}",
            rl.window_seconds
        ));
    }
    if rl.user_limit == 0 {
        fail("rate_limit.user_limit must be at least 1".to_string());
    }
    if rl.chat_limit < rl.user_limit {
        fail(format!(
            "rate_limit.chat_limit ({}) must not be lower than rate_limit.user_limit ({})",
            rl.chat_limit, rl.user_limit
        ));
    }
    if rl.retention_seconds < rl.window_seconds {
        fail(format!(
            "rate_limit.retention_seconds ({}) must cover at least one window ({})",
            rl.retention_seconds, rl.window_seconds
        ));
    }
    if rl.cleanup_batch_size == 0 || rl.cleanup_max_batches == 0 {
        fail("rate_limit.cleanup_batch_size and cleanup_max_batches must be at least 1".to_string());
    }

    let summary = &config.summary;
    if summary.max_messages == 0 {
        fail("summary.max_messages must be at least 1".to_string());
    }
    if summary.max_summary_hours == 0 || summary.max_summary_hours > MAX_SUMMARY_HOURS_LIMIT {
        fail(format!(
            "summary.max_summary_hours must be within 1..={MAX_SUMMARY_HOURS_LIMIT}, got {}",
            summary.max_summary_hours
        ));
    }
    if summary.degraded_guard && summary.degraded_failure_threshold == 0 {
        fail("summary.degraded_failure_threshold must be at least 1 when the guard is on".to_string());
    }
    if summary.degraded_horizon_seconds <= 0 {
        fail("summary.degraded_horizon_seconds must be positive".to_string());
    }

    let queue = &config.queue;
    if queue.name.trim().is_empty() {
        fail("queue.name must not be empty".to_string());
    }
    if queue.max_attempts == 0 {
        fail("queue.max_attempts must be at least 1".to_string());
    }
    if queue.batch_size == 0 {
        fail("queue.batch_size must be at least 1".to_string());
    }
    if queue.in_flight_retry_floor_secs < 1 {
        fail("queue.in_flight_retry_floor_secs must be at least 1".to_string());
    }
    if queue.lease_seconds <= queue.in_flight_retry_floor_secs {
        fail(format!(
            "queue.lease_seconds ({}) must exceed queue.in_flight_retry_floor_secs ({})",
            queue.lease_seconds, queue.in_flight_retry_floor_secs
        ));
    }
    if queue.transient_retry_secs < 0 || queue.generator_retry_secs < 0 {
        fail("queue retry delays must not be negative".to_string());
    }
    if queue.visibility_timeout_secs <= 0 {
        fail("queue.visibility_timeout_secs must be positive".to_string());
    }
    // A redelivery while the owner still holds its lease would reset the owner's entry.
    if queue.visibility_timeout_secs < queue.lease_seconds {
        fail(format!(
            "queue.visibility_timeout_secs ({}) must be at least queue.lease_seconds ({})",
            queue.visibility_timeout_secs, queue.lease_seconds
        ));
    }

    if let Err(e) = config.schedule.daily_cron.parse::<croner::Cron>() {
        fail(format!(
            "schedule.daily_cron `{}` is not a valid cron expression: {e}",
            config.schedule.daily_cron
        ));
    }

    if let Some(token) = &config.telegram.bot_token
        && token.trim().is_empty()
    {
        fail("telegram.bot_token must not be empty when set".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&RecapConfig::default()).is_ok());
    }

    #[test]
    fn collects_all_errors() {
        let mut config = RecapConfig::default();
        config.rate_limit.window_seconds = 0;
        config.queue.max_attempts = 0;
        config.schedule.daily_cron = "not a cron".to_string();

        let errors = validate_config(&config).expect_err("should fail");
        assert!(errors.len() >= 3, "expected every violation, got {errors:?}");
    }

    #[test]
    fn lease_must_exceed_floor() {
        let mut config = RecapConfig::default();
        config.queue.lease_seconds = 5;
        config.queue.in_flight_retry_floor_secs = 5;

        let errors = validate_config(&config).expect_err("should fail");
        assert!(errors.iter().any(|e| e.to_string().contains("lease_seconds")));
    }

    #[test]
    fn visibility_timeout_must_cover_lease() {
        let mut config = RecapConfig::default();
        config.queue.lease_seconds = 180;
        config.queue.visibility_timeout_secs = 120;

        let errors = validate_config(&config).expect_err("should fail");
        assert!(
            errors
                .iter()
                .any(|e| e.to_string().contains("visibility_timeout_secs"))
        );

        config.queue.visibility_timeout_secs = 180;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn chat_limit_below_user_limit_rejected() {
        let mut config = RecapConfig::default();
        config.rate_limit.user_limit = 10;
        config.rate_limit.chat_limit = 3;

        let errors = validate_config(&config).expect_err("should fail");
        assert!(errors.iter().any(|e| e.to_string().contains("chat_limit")));
    }

    #[test]
    fn summary_hours_capped() {
        let mut config = RecapConfig::default();
        config.summary.max_summary_hours = 200;
        assert!(validate_config(&config).is_err());
    }
}
