// SPDX-FileCopyrightText: 2026 Recap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `recap serve` command implementation.
//!
//! Runs the local queue worker and, when enabled, the cron-scheduled daily
//! dispatch. On SIGINT/SIGTERM both loops stop, then pending background
//! writes are drained before the process exits.

use std::sync::Arc;

use recap_config::RecapConfig;
use recap_core::{PluginAdapter, RecapError};
use recap_provider::ChatCompletionsGenerator;
use recap_queue::QueueRuntime;
use recap_summarizer::BackgroundWrites;
use recap_telegram::TelegramSender;
use tracing::{info, warn};

use crate::app::App;
use crate::schedule;
use crate::shutdown;

/// Runs the `recap serve` command until a shutdown signal arrives.
pub async fn run_serve(config: RecapConfig) -> Result<(), RecapError> {
    info!(service = %config.service.name, "starting recap serve");

    let generator = Arc::new(ChatCompletionsGenerator::new(&config.generator, &config.summary)?);
    let sender = Arc::new(TelegramSender::new(&config.telegram)?);
    let app = App::open(config).await?;

    for adapter in [
        app.storage.as_ref() as &dyn PluginAdapter,
        generator.as_ref() as &dyn PluginAdapter,
        sender.as_ref() as &dyn PluginAdapter,
    ] {
        match adapter.health_check().await {
            Ok(status) => info!(adapter = adapter.name(), status = ?status, "adapter health"),
            Err(e) => warn!(adapter = adapter.name(), error = %e, "adapter health check failed"),
        }
    }

    let writes = BackgroundWrites::from_config(app.config.summary.background_writes);
    let processor = app.processor(generator.clone(), sender.clone(), writes.clone());
    let runtime = QueueRuntime::new(app.queue.clone(), processor, &app.config.queue);

    let cancel = shutdown::install_signal_handler();

    let daily = if app.config.schedule.daily_enabled {
        let cron = schedule::parse_cron(&app.config.schedule.daily_cron)?;
        Some(tokio::spawn(schedule::run_daily_schedule(
            cron,
            app.dispatcher(),
            cancel.clone(),
        )))
    } else {
        info!("daily schedule disabled");
        None
    };

    info!(queue = app.queue.name(), "queue worker running");
    runtime.run(cancel.clone()).await;

    if let Some(handle) = daily
        && let Err(e) = handle.await
    {
        warn!(error = %e, "daily schedule task ended abnormally");
    }

    info!("draining background writes");
    writes.drain().await;

    for adapter in [
        generator.as_ref() as &dyn PluginAdapter,
        sender.as_ref() as &dyn PluginAdapter,
    ] {
        if let Err(e) = adapter.shutdown().await {
            warn!(adapter = adapter.name(), error = %e, "adapter shutdown failed");
        }
    }

    info!("recap serve stopped");
    Ok(())
}

/// Initializes the tracing subscriber. `RUST_LOG` takes precedence.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("recap={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
