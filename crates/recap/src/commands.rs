// SPDX-FileCopyrightText: 2026 Recap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot subcommands: `daily`, `request`, `sweep`, and `config check`.

use recap_admission::{AdmissionOutcome, OnDemandRequest};
use recap_config::RecapConfig;
use recap_core::{RecapError, SummaryCommand};
use tracing::info;

use crate::app::App;

/// Arguments of `recap request`.
#[derive(Debug, Clone)]
pub struct RequestParams {
    pub chat_id: i64,
    pub chat_username: Option<String>,
    pub user_id: Option<i64>,
    pub message_id: i64,
    pub from_hours: u32,
    pub to_hours: u32,
}

/// Enqueues daily jobs for the window ending at `at` (default: now).
pub async fn run_daily(config: RecapConfig, at: Option<i64>) -> Result<(), RecapError> {
    let app = App::open(config).await?;
    let scheduled_at = at.unwrap_or_else(|| app.clock.now());
    let report = app.dispatcher().run(scheduled_at).await?;

    info!(enqueued = report.enqueued, "daily dispatch completed");
    println!(
        "window {}..{}: {} active, {} allowed, {} enqueued, {} counters swept",
        report.window_start,
        report.window_end,
        report.active,
        report.allowed,
        report.enqueued,
        report.swept
    );
    Ok(())
}

/// Admits an on-demand request and prints what happened to it.
pub async fn run_request(config: RecapConfig, params: RequestParams) -> Result<(), RecapError> {
    let app = App::open(config).await?;
    let request = OnDemandRequest {
        chat_id: params.chat_id,
        chat_username: params.chat_username,
        user_id: params.user_id,
        message_id: params.message_id,
        command: SummaryCommand::new(params.from_hours, params.to_hours),
        requested_at: app.clock.now(),
    };

    match app.admission().admit(&request).await? {
        AdmissionOutcome::Enqueued { job_id } => println!("enqueued {job_id}"),
        AdmissionOutcome::RateLimited { reply_text, .. } => println!("{reply_text}"),
        AdmissionOutcome::Invalid { reason } => println!("rejected: {reason}"),
        AdmissionOutcome::NotAllowed => {
            println!("rejected: chat {} is not allowlisted", request.chat_id)
        }
    }
    Ok(())
}

/// Deletes stale rate-limit counters.
pub async fn run_sweep(config: RecapConfig) -> Result<(), RecapError> {
    let app = App::open(config).await?;
    let removed = app.sweeper().sweep(app.clock.now()).await?;
    println!("removed {removed} stale rate-limit counters");
    Ok(())
}

/// Prints the effective configuration as TOML with secrets redacted.
pub fn run_config_check(config: &RecapConfig) -> Result<(), RecapError> {
    println!("{}", render_config(config)?);
    Ok(())
}

fn render_config(config: &RecapConfig) -> Result<String, RecapError> {
    toml::to_string_pretty(&config.redacted())
        .map_err(|e| RecapError::Internal(format!("failed to render configuration: {e}")))
}
