// SPDX-FileCopyrightText: 2026 Recap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the summary pipeline.
//!
//! Each test builds an isolated TestHarness with a temp SQLite store and
//! mock collaborators. Tests are independent and order-insensitive.

mod harness;

use harness::{START, TestHarness};
use recap_admission::AdmissionOutcome;
use recap_admission::OnDemandRequest;
use recap_core::{
    ClaimOutcome, DailySummaryJob, DoneOutcome, OnDemandSummaryJob, RateLimitDecision,
    RateLimitScope, SummaryCommand, SummaryJob,
};
use recap_queue::Disposition;
use recap_queue::texts;
use recap_storage::QueueCounts;
use recap_test_utils::{Fault, SentMessage, text_message};

const CHAT: i64 = -1001;

fn on_demand(message_id: i64, command: SummaryCommand) -> SummaryJob {
    OnDemandSummaryJob::new(CHAT, None, command, START, Some(7), message_id).into()
}

// ---- Daily redelivery ----

#[tokio::test]
async fn daily_job_delivered_twice_runs_side_effects_once() {
    let h = TestHarness::builder().build().await;
    h.store.seed_text(CHAT, 1, 150, "release is on friday").await;
    h.generator.push_summary("• Release moved to Friday");

    let job: SummaryJob = DailySummaryJob::new(CHAT, None, 100, 200, 200).into();
    assert_eq!(job.job_id(), "daily:-1001:100:200");

    assert_eq!(h.deliver(&job, 1).await, Disposition::Ack);
    assert_eq!(
        h.sender.sent(),
        vec![SentMessage {
            chat_id: CHAT,
            reply_to: None,
            text: texts::daily_summary("• Release moved to Friday"),
        }]
    );

    assert_eq!(h.deliver(&job, 2).await, Disposition::Ack);
    assert_eq!(h.generator.calls(), 1);
    assert_eq!(h.sender.sent_count(), 1);
    assert_eq!(
        h.ledger().claim(job.job_id(), START, 60).await.unwrap(),
        ClaimOutcome::AlreadyDone
    );
}

#[tokio::test]
async fn daily_job_with_empty_window_is_acked_silently() {
    let h = TestHarness::builder().build().await;
    let job: SummaryJob = DailySummaryJob::new(CHAT, None, 100, 200, 200).into();

    assert_eq!(h.deliver(&job, 1).await, Disposition::Ack);
    assert_eq!(h.generator.calls(), 0);
    assert_eq!(h.sender.sent_count(), 0);
}

// ---- Generator failure and reclaim ----

#[tokio::test]
async fn on_demand_generator_failure_retries_then_reclaims() {
    let h = TestHarness::builder().build().await;
    h.store.seed_text(CHAT, 10, START - 600, "who has the keys?").await;
    h.generator.push_error("upstream 503");
    h.generator.push_summary("• Keys are with Sam");

    let job = on_demand(42, SummaryCommand::new(1, 0));
    assert_eq!(
        h.deliver(&job, 1).await,
        Disposition::Retry { delay_seconds: 30 }
    );
    assert_eq!(h.sender.sent_count(), 0, "no reply before the final attempt");

    // The claim was released, so the redelivery acquires a fresh lease.
    h.clock.advance(30);
    assert_eq!(h.deliver(&job, 2).await, Disposition::Ack);
    assert_eq!(h.generator.calls(), 2);
    assert_eq!(
        h.sender.sent(),
        vec![SentMessage {
            chat_id: CHAT,
            reply_to: Some(42),
            text: texts::on_demand_summary(&SummaryCommand::new(1, 0), "• Keys are with Sam"),
        }]
    );
}

#[tokio::test]
async fn on_demand_generator_failure_on_final_attempt_replies_and_acks() {
    let h = TestHarness::builder().build().await;
    h.store.seed_text(CHAT, 10, START - 600, "hello").await;
    h.generator.push_error("still down");

    let job = on_demand(43, SummaryCommand::new(1, 0));
    let final_attempt = h.config.queue.max_attempts;
    assert_eq!(h.deliver(&job, final_attempt).await, Disposition::Ack);
    assert_eq!(h.sender.sent()[0].text, texts::GENERATION_FAILED);
}

#[tokio::test]
async fn on_demand_empty_window_replies_without_generating() {
    let h = TestHarness::builder().build().await;
    let job = on_demand(44, SummaryCommand::new(2, 1));

    assert_eq!(h.deliver(&job, 1).await, Disposition::Ack);
    assert_eq!(h.generator.calls(), 0);
    assert_eq!(h.sender.sent()[0].text, texts::NO_MESSAGES);
    assert_eq!(h.sender.sent()[0].reply_to, Some(44));
}

// ---- Summarizer cache ----

#[tokio::test]
async fn identical_windows_share_one_generation() {
    let h = TestHarness::builder().build().await;
    h.store.seed_text(CHAT, 10, START - 60, "standup moved").await;
    h.generator.push_summary("• Standup moved");

    let command = SummaryCommand::new(1, 0);
    assert_eq!(h.deliver(&on_demand(50, command), 1).await, Disposition::Ack);
    assert_eq!(h.deliver(&on_demand(51, command), 1).await, Disposition::Ack);

    assert_eq!(h.generator.calls(), 1);
    let sent = h.sender.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].text, sent[1].text);
    assert_eq!(
        h.store.latest_summary_text(CHAT, START - 3600, START).await.as_deref(),
        Some("• Standup moved")
    );
}

// ---- Claim ledger ----

#[tokio::test]
async fn claim_lease_lifecycle() {
    let h = TestHarness::builder().build().await;
    let ledger = h.ledger();
    let job_id = "on_demand:-1001:9";

    let ClaimOutcome::Acquired(first) = ledger.claim(job_id, 1_000, 60).await.unwrap() else {
        panic!("first claim should acquire");
    };
    assert_eq!(
        ledger.claim(job_id, 1_030, 60).await.unwrap(),
        ClaimOutcome::InFlight { lease_until: 1_060 }
    );

    // Takeover after expiry.
    let ClaimOutcome::Acquired(second) = ledger.claim(job_id, 1_060, 60).await.unwrap() else {
        panic!("expired lease should be taken over");
    };
    assert_eq!(second.lease_until, 1_120);

    // The superseded owner can neither release nor complete.
    assert!(!ledger.release(job_id, first).await.unwrap());
    assert_eq!(
        ledger.mark_done(job_id, first, 1_070).await.unwrap(),
        DoneOutcome::LostClaim
    );

    // Release by the current owner frees the id for a fresh claim.
    assert!(ledger.release(job_id, second).await.unwrap());
    let ClaimOutcome::Acquired(third) = ledger.claim(job_id, 1_080, 60).await.unwrap() else {
        panic!("released job should be claimable");
    };
    assert_eq!(
        ledger.mark_done(job_id, third, 1_090).await.unwrap(),
        DoneOutcome::Marked
    );
    for now in [1_100, 5_000, 100_000] {
        assert_eq!(
            ledger.claim(job_id, now, 60).await.unwrap(),
            ClaimOutcome::AlreadyDone
        );
    }
}

#[tokio::test]
async fn claim_store_outage_becomes_transient_retry() {
    let h = TestHarness::builder().build().await;
    h.faults.fail(Fault::Claim);

    let job = on_demand(60, SummaryCommand::new(1, 0));
    assert_eq!(
        h.deliver(&job, 1).await,
        Disposition::Retry {
            delay_seconds: h.config.queue.transient_retry_secs
        }
    );
    assert_eq!(h.generator.calls(), 0);
}

#[tokio::test]
async fn in_flight_job_retries_near_lease_expiry() {
    let h = TestHarness::builder().build().await;
    let job = on_demand(61, SummaryCommand::new(1, 0));
    h.ledger().claim(job.job_id(), START, 40).await.unwrap();

    assert_eq!(
        h.deliver(&job, 1).await,
        Disposition::Retry { delay_seconds: 40 }
    );
}

// ---- Rate limiting ----

#[tokio::test]
async fn twenty_first_chat_request_is_denied_by_chat_scope() {
    let h = TestHarness::builder().build().await;
    let limiter = h.limiter();
    let now = 1_200; // start of a 600s window

    for call in 1..=20 {
        assert_eq!(
            limiter.check_summary_rate_limit(CHAT, None, now).await,
            RateLimitDecision::Allowed,
            "call {call}"
        );
    }
    let RateLimitDecision::Denied(denial) = limiter.check_summary_rate_limit(CHAT, None, now).await
    else {
        panic!("21st call should be denied");
    };
    assert_eq!(denial.scope, RateLimitScope::Chat);
    assert_eq!(denial.limit, 20);
    assert_eq!(denial.retry_after_seconds, 600);

    // Next window starts fresh.
    assert!(
        limiter
            .check_summary_rate_limit(CHAT, None, now + 600)
            .await
            .is_allowed()
    );
}

#[tokio::test]
async fn user_scope_denies_before_chat_scope() {
    let h = TestHarness::builder().build().await;
    let limiter = h.limiter();

    for _ in 0..5 {
        assert!(limiter.check_summary_rate_limit(CHAT, Some(7), 1_300).await.is_allowed());
    }
    let RateLimitDecision::Denied(denial) =
        limiter.check_summary_rate_limit(CHAT, Some(7), 1_300).await
    else {
        panic!("6th call for the same user should be denied");
    };
    assert_eq!(denial.scope, RateLimitScope::User);
    assert_eq!(denial.retry_after_seconds, 500);

    // Another user in the same chat is unaffected.
    assert!(limiter.check_summary_rate_limit(CHAT, Some(8), 1_300).await.is_allowed());
}

#[tokio::test]
async fn counter_store_outage_fails_open() {
    let h = TestHarness::builder()
        .with_config(|c| c.rate_limit.chat_limit = 5)
        .build()
        .await;
    h.faults.fail(Fault::IncrementCounter);

    let limiter = h.limiter();
    for _ in 0..10 {
        assert!(limiter.check_summary_rate_limit(CHAT, None, 1_200).await.is_allowed());
    }
}

// ---- Admission and dispatch through the local queue ----

#[tokio::test]
async fn admitted_request_is_summarized_by_the_runtime() {
    let h = TestHarness::builder()
        .with_allowed_chats(vec![CHAT])
        .build()
        .await;
    h.store.seed_text(CHAT, 10, START - 120, "lunch at noon").await;
    h.generator.push_summary("• Lunch at noon");

    let outcome = h
        .admission()
        .admit(&OnDemandRequest {
            chat_id: CHAT,
            chat_username: None,
            user_id: Some(7),
            message_id: 70,
            command: SummaryCommand::new(1, 0),
            requested_at: START,
        })
        .await
        .unwrap();
    assert_eq!(
        outcome,
        AdmissionOutcome::Enqueued {
            job_id: "on_demand:-1001:70".into()
        }
    );

    assert_eq!(h.runtime.run_once().await.unwrap(), 1);
    assert_eq!(h.sender.sent()[0].reply_to, Some(70));
    assert_eq!(h.queue.counts().await.unwrap(), QueueCounts::default());
}

#[tokio::test]
async fn rate_limited_request_is_not_enqueued() {
    let h = TestHarness::builder()
        .with_allowed_chats(vec![CHAT])
        .with_config(|c| {
            c.rate_limit.user_limit = 1;
            c.rate_limit.chat_limit = 1;
        })
        .build()
        .await;
    let admission = h.admission();
    let request = |message_id| OnDemandRequest {
        chat_id: CHAT,
        chat_username: None,
        user_id: Some(7),
        message_id,
        command: SummaryCommand::new(1, 0),
        requested_at: START,
    };

    assert!(matches!(
        admission.admit(&request(80)).await.unwrap(),
        AdmissionOutcome::Enqueued { .. }
    ));
    let AdmissionOutcome::RateLimited { reply_text, .. } =
        admission.admit(&request(81)).await.unwrap()
    else {
        panic!("second request should be rate limited");
    };
    assert!(reply_text.starts_with("Rate limit exceeded for you."));
    assert_eq!(h.queue.counts().await.unwrap().pending, 1);
}

#[tokio::test]
async fn request_from_chat_off_allowlist_is_dropped_without_quota() {
    let other_chat = -999;
    let h = TestHarness::builder()
        .with_allowed_chats(vec![CHAT])
        .with_config(|c| {
            c.rate_limit.user_limit = 1;
            c.rate_limit.chat_limit = 1;
        })
        .build()
        .await;
    let admission = h.admission();
    let request = |chat_id, message_id| OnDemandRequest {
        chat_id,
        chat_username: None,
        user_id: Some(7),
        message_id,
        command: SummaryCommand::new(1, 0),
        requested_at: START,
    };

    assert_eq!(
        admission.admit(&request(other_chat, 5)).await.unwrap(),
        AdmissionOutcome::NotAllowed
    );
    assert_eq!(h.queue.counts().await.unwrap(), QueueCounts::default());
    assert_eq!(h.runtime.run_once().await.unwrap(), 0);
    assert!(h.sender.sent().is_empty());

    // The rejected chat left the shared user quota untouched.
    assert!(matches!(
        admission.admit(&request(CHAT, 6)).await.unwrap(),
        AdmissionOutcome::Enqueued { .. }
    ));
}

#[tokio::test]
async fn daily_dispatch_posts_to_allowed_chats_only() {
    let other_chat = -2002;
    let h = TestHarness::builder()
        .with_allowed_chats(vec![CHAT])
        .build()
        .await;
    h.store.seed(text_message(CHAT, 1, START - 3_600, "deploy done")).await;
    h.store.seed(text_message(other_chat, 1, START - 3_600, "private")).await;
    h.generator.push_summary("• Deploy finished");

    let report = h.dispatcher().run(START).await.unwrap();
    assert_eq!(report.active, 2);
    assert_eq!(report.allowed, 1);
    assert_eq!(report.enqueued, 1);

    assert_eq!(h.runtime.run_once().await.unwrap(), 1);
    assert_eq!(
        h.sender.sent(),
        vec![SentMessage {
            chat_id: CHAT,
            reply_to: None,
            text: texts::daily_summary("• Deploy finished"),
        }]
    );

    // A second dispatch for the same instant re-enqueues the same job id,
    // which the ledger recognises as done.
    h.dispatcher().run(START).await.unwrap();
    assert_eq!(h.runtime.run_once().await.unwrap(), 1);
    assert_eq!(h.sender.sent_count(), 1);
    assert_eq!(h.generator.calls(), 1);
}
