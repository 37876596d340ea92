// SPDX-FileCopyrightText: 2026 Recap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixed-window request counters.
//!
//! Windows are aligned to multiples of the window length. Every check
//! increments the counter first and compares afterwards, so a denied request
//! still counts against its window.

use std::sync::Arc;

use recap_config::RateLimitConfig;
use recap_core::{
    RateLimitBucket, RateLimitDecision, RateLimitDenial, RateLimitScope, RateLimitStore,
    RecapError,
};
use tracing::warn;

/// Start of the window containing `now`.
pub fn window_start(now: i64, window_seconds: i64) -> i64 {
    now.div_euclid(window_seconds) * window_seconds
}

/// Seconds until the window starting at `window_start` closes, at least one.
pub fn retry_after(now: i64, window_start: i64, window_seconds: i64) -> i64 {
    (window_start + window_seconds - now).max(1)
}

/// Scope key for a user inside a chat.
pub fn user_scope_key(chat_id: i64, user_id: i64) -> String {
    format!("{chat_id}:{user_id}")
}

/// Scope key for a whole chat.
pub fn chat_scope_key(chat_id: i64) -> String {
    chat_id.to_string()
}

pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    window_seconds: i64,
    user_limit: u32,
    chat_limit: u32,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn RateLimitStore>, config: &RateLimitConfig) -> Self {
        Self {
            store,
            window_seconds: config.window_seconds,
            user_limit: config.user_limit,
            chat_limit: config.chat_limit,
        }
    }

    pub fn limit_for(&self, bucket: RateLimitBucket) -> u32 {
        match bucket {
            RateLimitBucket::UserInChat => self.user_limit,
            RateLimitBucket::Chat => self.chat_limit,
        }
    }

    /// Counts one request against `(bucket, scope_key)` and decides it.
    pub async fn check(
        &self,
        bucket: RateLimitBucket,
        scope_key: &str,
        now: i64,
    ) -> Result<RateLimitDecision, RecapError> {
        let start = window_start(now, self.window_seconds);
        let count = self
            .store
            .increment_counter(bucket, scope_key, start, now)
            .await?;
        let limit = self.limit_for(bucket);
        if count > limit {
            return Ok(RateLimitDecision::Denied(RateLimitDenial {
                scope: bucket.scope(),
                limit,
                window_seconds: self.window_seconds,
                retry_after_seconds: retry_after(now, start, self.window_seconds),
            }));
        }
        Ok(RateLimitDecision::Allowed)
    }

    /// Summary admission policy: the per-user bucket (when the requester is
    /// known), then the per-chat bucket. Store failures allow the request.
    pub async fn check_summary_rate_limit(
        &self,
        chat_id: i64,
        user_id: Option<i64>,
        now: i64,
    ) -> RateLimitDecision {
        match self.check_scopes(chat_id, user_id, now).await {
            Ok(decision) => decision,
            Err(e) => {
                warn!(chat_id, error = %e, "rate limit check failed, allowing request");
                RateLimitDecision::Allowed
            }
        }
    }

    async fn check_scopes(
        &self,
        chat_id: i64,
        user_id: Option<i64>,
        now: i64,
    ) -> Result<RateLimitDecision, RecapError> {
        if let Some(user_id) = user_id {
            let key = user_scope_key(chat_id, user_id);
            let decision = self.check(RateLimitBucket::UserInChat, &key, now).await?;
            if !decision.is_allowed() {
                return Ok(decision);
            }
        }
        self.check(RateLimitBucket::Chat, &chat_scope_key(chat_id), now)
            .await
    }
}

/// Reply text for a denied request.
pub fn denial_text(denial: &RateLimitDenial) -> String {
    let target = match denial.scope {
        RateLimitScope::User => "you",
        RateLimitScope::Chat => "this chat",
    };
    format!(
        "Rate limit exceeded for {target}. Limit: {} summaries per {} minutes. Try again in {}.",
        denial.limit,
        denial.window_seconds / 60,
        format_retry_after(denial.retry_after_seconds)
    )
}

fn format_retry_after(seconds: i64) -> String {
    if seconds < 60 {
        return format!("{seconds}s");
    }
    let (minutes, rest) = (seconds / 60, seconds % 60);
    if rest == 0 {
        format!("{minutes}m")
    } else {
        format!("{minutes}m {rest}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use recap_test_utils::{Fault, FaultyStore, TestStore};

    fn config(user_limit: u32, chat_limit: u32) -> RateLimitConfig {
        RateLimitConfig {
            window_seconds: 600,
            user_limit,
            chat_limit,
            ..RateLimitConfig::default()
        }
    }

    #[test]
    fn windows_align_to_multiples() {
        assert_eq!(window_start(0, 600), 0);
        assert_eq!(window_start(599, 600), 0);
        assert_eq!(window_start(600, 600), 600);
        assert_eq!(window_start(1_234, 600), 1_200);
    }

    #[test]
    fn retry_after_is_at_least_one_second() {
        assert_eq!(retry_after(1_234, 1_200, 600), 566);
        assert_eq!(retry_after(1_799, 1_200, 600), 1);
        assert_eq!(retry_after(1_800, 1_200, 600), 1);
    }

    #[test]
    fn denial_text_formats_retry() {
        let mut denial = RateLimitDenial {
            scope: RateLimitScope::User,
            limit: 5,
            window_seconds: 600,
            retry_after_seconds: 42,
        };
        assert_eq!(
            denial_text(&denial),
            "Rate limit exceeded for you. Limit: 5 summaries per 10 minutes. Try again in 42s."
        );
        denial.scope = RateLimitScope::Chat;
        denial.retry_after_seconds = 120;
        assert_eq!(
            denial_text(&denial),
            "Rate limit exceeded for this chat. Limit: 5 summaries per 10 minutes. Try again in 2m."
        );
        assert_eq!(format_retry_after(125), "2m 5s");
        assert_eq!(format_retry_after(120), "2m");
    }

    #[tokio::test]
    async fn limit_then_deny_then_reset() {
        let store = TestStore::new().await;
        let limiter = RateLimiter::new(store.storage.clone(), &config(3, 20));

        let now = 1_234;
        for _ in 0..3 {
            let decision = limiter.check(RateLimitBucket::UserInChat, "1:2", now).await.unwrap();
            assert!(decision.is_allowed());
        }
        let denied = limiter.check(RateLimitBucket::UserInChat, "1:2", now).await.unwrap();
        assert_eq!(
            denied,
            RateLimitDecision::Denied(RateLimitDenial {
                scope: RateLimitScope::User,
                limit: 3,
                window_seconds: 600,
                retry_after_seconds: 566,
            })
        );

        let next_window = limiter.check(RateLimitBucket::UserInChat, "1:2", 1_800).await.unwrap();
        assert!(next_window.is_allowed());
    }

    #[tokio::test]
    async fn chat_limit_applies_across_users() {
        let store = TestStore::new().await;
        let limiter = RateLimiter::new(store.storage.clone(), &config(5, 20));

        for i in 0..20 {
            let decision = limiter.check_summary_rate_limit(-1001, Some(i), 600).await;
            assert!(decision.is_allowed(), "request {i} should pass");
        }
        let decision = limiter.check_summary_rate_limit(-1001, Some(99), 600).await;
        match decision {
            RateLimitDecision::Denied(denial) => {
                assert_eq!(denial.scope, RateLimitScope::Chat);
                assert_eq!(denial.limit, 20);
            }
            RateLimitDecision::Allowed => panic!("21st request should be denied"),
        }
    }

    #[tokio::test]
    async fn user_denial_stops_before_chat_counter() {
        let store = TestStore::new().await;
        let limiter = RateLimiter::new(store.storage.clone(), &config(1, 2));

        assert!(limiter.check_summary_rate_limit(5, Some(1), 0).await.is_allowed());
        let second = limiter.check_summary_rate_limit(5, Some(1), 0).await;
        assert!(matches!(
            second,
            RateLimitDecision::Denied(RateLimitDenial {
                scope: RateLimitScope::User,
                ..
            })
        ));
        // The chat counter saw only the first request, so another user still fits.
        assert!(limiter.check_summary_rate_limit(5, Some(2), 0).await.is_allowed());
    }

    #[tokio::test]
    async fn anonymous_requests_skip_user_bucket() {
        let store = TestStore::new().await;
        let limiter = RateLimiter::new(store.storage.clone(), &config(1, 3));

        for _ in 0..3 {
            assert!(limiter.check_summary_rate_limit(5, None, 0).await.is_allowed());
        }
        assert!(!limiter.check_summary_rate_limit(5, None, 0).await.is_allowed());
    }

    #[tokio::test]
    async fn store_failure_fails_open() {
        let store = TestStore::new().await;
        let faulty = Arc::new(FaultyStore::new(store.storage.clone()));
        faulty.fail(Fault::IncrementCounter);
        let limiter = RateLimiter::new(faulty, &config(0, 0));

        assert!(limiter.check_summary_rate_limit(5, Some(1), 0).await.is_allowed());
    }

    proptest! {
        #[test]
        fn window_contains_now(now in 0i64..10_000_000, window in 1i64..100_000) {
            let start = window_start(now, window);
            prop_assert!(start <= now);
            prop_assert!(now < start + window);
            prop_assert_eq!(start % window, 0);
            let wait = retry_after(now, start, window);
            prop_assert!(wait >= 1 && wait <= window);
        }
    }
}
