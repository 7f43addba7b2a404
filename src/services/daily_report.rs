// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Daily sales report run.
//!
//! Handles the whole workflow:
//! 1. Fetch all order pages for the window (token refresh on 401)
//! 2. Normalize orders and write the CSV
//! 3. Summarize and mail the report with the CSV attached
//!
//! A fetch that yields nothing is fatal and triggers an error mail; a mail
//! failure after the CSV exists is only logged.

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{ReportSummary, ReportWindow};
use crate::services::eventix::EventixClient;
use crate::services::fetcher::OrderFetcher;
use crate::services::mailer::{Attachment, Email, Mailer};
use crate::services::normalize::normalize_all;
use crate::services::refresher::TokenRefresher;
use crate::services::report;
use crate::services::token_store::TokenStore;
use std::path::PathBuf;
use std::time::Duration;

/// Result of a successful run.
#[derive(Debug)]
pub struct RunOutcome {
    pub csv_path: PathBuf,
    pub summary: ReportSummary,
    /// Pagination ended early; the report covers fewer orders than exist
    pub partial: bool,
    /// The report mail was accepted by the transport
    pub delivered: bool,
}

/// Wires the fetcher, output directory and mailer together for one run.
pub struct DailyReport {
    fetcher: OrderFetcher,
    mailer: Mailer,
    output_dir: PathBuf,
}

impl DailyReport {
    pub fn new(fetcher: OrderFetcher, mailer: Mailer, output_dir: PathBuf) -> Self {
        Self {
            fetcher,
            mailer,
            output_dir,
        }
    }

    /// Build all collaborators from config, using `store` for tokens.
    pub fn from_config(config: &Config, store: TokenStore) -> Result<Self> {
        let timeout = Duration::from_secs(config.http_timeout_secs);

        let client = EventixClient::new(
            config.api_base.clone(),
            config.company_guid.clone(),
            config.endpoint,
            timeout,
        )?;
        let refresher = TokenRefresher::new(
            config.auth_url.clone(),
            &config.credentials,
            config.token_encoding,
            timeout,
        )?;
        let fetcher = OrderFetcher::new(
            client,
            refresher,
            store,
            config.credentials.clone(),
            config.per_page,
        );
        let mailer = Mailer::from_config(&config.mail, timeout)?;

        Ok(Self::new(fetcher, mailer, config.output_dir.clone()))
    }

    /// Produce and deliver the report for `window`.
    pub async fn run(&mut self, window: &ReportWindow) -> Result<RunOutcome> {
        tracing::info!(
            date = %window.date,
            start = %window.start,
            end = %window.end,
            "Starting daily sales report"
        );

        let mut fetched = self.fetcher.fetch_all(window).await;
        let partial = fetched.error.is_some();

        if fetched.is_total_failure() {
            let error = match fetched.error.take() {
                Some(e) => AppError::Http(e),
                None => AppError::Internal(anyhow::anyhow!("order fetch failed")),
            };
            tracing::error!(error = %error, "Could not fetch orders");
            self.notify_failure(window, &error).await;
            return Err(error);
        }

        if let Some(e) = &fetched.error {
            tracing::warn!(
                error = %e,
                collected = fetched.orders.len(),
                "Continuing with partial order data"
            );
        }

        let orders = normalize_all(&fetched.orders);
        let csv_path = match report::write_csv(&orders, &self.output_dir, window.date) {
            Ok(path) => path,
            Err(e) => {
                let error = AppError::Report(e);
                tracing::error!(error = %error, "Could not write CSV");
                self.notify_failure(window, &error).await;
                return Err(error);
            }
        };

        let summary = report::summarize(&orders);
        tracing::info!(
            orders = summary.order_count,
            revenue = summary.total_revenue,
            "Report summarized"
        );

        let delivered = match self.deliver(window, &summary, partial, &csv_path).await {
            Ok(()) => {
                tracing::info!(path = %csv_path.display(), "Report sent");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, path = %csv_path.display(), "Failed to send report email, CSV was created");
                false
            }
        };

        Ok(RunOutcome {
            csv_path,
            summary,
            partial,
            delivered,
        })
    }

    async fn deliver(
        &self,
        window: &ReportWindow,
        summary: &ReportSummary,
        partial: bool,
        csv_path: &std::path::Path,
    ) -> Result<()> {
        let attachment = Attachment::from_path(csv_path).map_err(crate::error::ReportError::Io)?;
        let email = Email {
            subject: report::render_subject(window.date, summary),
            body: report::render_body(window, summary, partial),
            attachments: vec![attachment],
        };
        self.mailer.send(&email).await?;
        Ok(())
    }

    /// Best-effort error mail to operators.
    async fn notify_failure(&self, window: &ReportWindow, error: &AppError) {
        let email = Email {
            subject: report::render_error_subject(window.date),
            body: report::render_error_body(window.date, &error.to_string()),
            attachments: Vec::new(),
        };
        if let Err(e) = self.mailer.send(&email).await {
            tracing::warn!(error = %e, "Failed to send error report email");
        }
    }
}
