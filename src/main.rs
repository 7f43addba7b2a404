// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Eventix daily sales report entrypoint.
//!
//! Meant to run once per day from cron. Exits non-zero when no order data
//! could be collected.

use eventix_report::{
    config::Config,
    services::{DailyReport, TokenStore},
    time_utils::{report_window, yesterday_in},
};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    // Structured JSON logs on stderr; the CSV is the only data output
    init_logging();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    let date = config
        .report_date
        .unwrap_or_else(|| yesterday_in(config.timezone, chrono::Utc::now()));
    let window = match report_window(date, config.timezone) {
        Ok(window) => window,
        Err(e) => {
            tracing::error!(error = %e, "Failed to compute report window");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(token_file = %config.token_file.display(), "Using token store");
    let store = TokenStore::file(&config.token_file);

    let mut report = match DailyReport::from_config(&config, store) {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize report");
            return ExitCode::FAILURE;
        }
    };

    match report.run(&window).await {
        Ok(outcome) => {
            tracing::info!(
                path = %outcome.csv_path.display(),
                orders = outcome.summary.order_count,
                partial = outcome.partial,
                delivered = outcome.delivered,
                "Report run complete"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Report run failed");
            ExitCode::FAILURE
        }
    }
}

/// Initialize structured JSON logging on stderr.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("eventix_report=debug,info"));

    tracing_subscriber::registry().with(filter).with(format).init();
}
