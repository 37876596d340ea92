// SPDX-FileCopyrightText: 2026 Recap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recap - chat window summary worker.
//!
//! This is the binary entry point. Every subcommand loads and validates
//! configuration first; invalid configuration exits with status 1 before
//! anything touches the database.

mod app;
mod commands;
mod history;
mod schedule;
mod serve;
mod shutdown;
mod status;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use recap_config::RecapConfig;
use recap_core::RecapError;

/// Recap - summarizes chat windows on demand and once a day.
#[derive(Parser, Debug)]
#[command(name = "recap", version, about, long_about = None)]
struct Cli {
    /// Configuration file to use instead of the standard lookup.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the queue worker and the daily schedule until interrupted.
    Serve,
    /// Enqueue daily summaries for every allowed active chat.
    Daily {
        /// End of the 24-hour window, in Unix seconds. Defaults to now.
        #[arg(long)]
        at: Option<i64>,
    },
    /// Admit an on-demand summary request through the rate gate.
    Request(RequestArgs),
    /// Delete expired rate-limit counters.
    Sweep,
    /// Print summary run statistics.
    Status {
        /// Trailing window to aggregate over.
        #[arg(long, default_value_t = 24)]
        since_hours: u32,
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Print stored summaries for a chat, newest first.
    History {
        /// Chat to list summaries for.
        #[arg(long, allow_negative_numbers = true)]
        chat: i64,
        /// Number of summaries to show (1-100, default 20).
        #[arg(long)]
        limit: Option<u32>,
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Inspect configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Args, Debug)]
struct RequestArgs {
    /// Chat the request was made in.
    #[arg(long, allow_negative_numbers = true)]
    chat: i64,
    /// Requesting user. Omit for anonymous admins.
    #[arg(long)]
    user: Option<i64>,
    /// Id of the command message; replies thread under it.
    #[arg(long)]
    message: i64,
    /// Public username of the chat, for message links.
    #[arg(long)]
    chat_username: Option<String>,
    /// Window start, in hours before now.
    #[arg(long, default_value_t = 24)]
    from_hours: u32,
    /// Window end, in hours before now.
    #[arg(long, default_value_t = 0)]
    to_hours: u32,
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Validate and print the effective configuration with secrets redacted.
    Check,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => recap_config::load_and_validate_path(path),
        None => recap_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            recap_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    serve::init_tracing(&config.service.log_level);

    if let Err(e) = run(cli.command, config).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: RecapConfig) -> Result<(), RecapError> {
    match command {
        Commands::Serve => serve::run_serve(config).await,
        Commands::Daily { at } => commands::run_daily(config, at).await,
        Commands::Request(args) => commands::run_request(config, args.into()).await,
        Commands::Sweep => commands::run_sweep(config).await,
        Commands::Status { since_hours, json } => {
            status::run_status(config, since_hours, json).await
        }
        Commands::History { chat, limit, json } => {
            history::run_history(config, chat, limit, json).await
        }
        Commands::Config {
            action: ConfigAction::Check,
        } => commands::run_config_check(&config),
    }
}

impl From<RequestArgs> for commands::RequestParams {
    fn from(args: RequestArgs) -> Self {
        commands::RequestParams {
            chat_id: args.chat,
            chat_username: args.chat_username,
            user_id: args.user,
            message_id: args.message,
            from_hours: args.from_hours,
            to_hours: args.to_hours,
        }
    }
}
