// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Eventix/OpenTicket API client.
//!
//! Issues single page requests and hands back the raw status and body.
//! Status interpretation (401 handling, pagination) lives in the fetcher.

use crate::config::EndpointVariant;
use crate::error::HttpError;
use crate::models::ReportWindow;
use std::time::Duration;

const USER_AGENT: &str = concat!("Eventix-Daily-Report/", env!("CARGO_PKG_VERSION"));

/// Status and body of one API response.
#[derive(Debug, Clone)]
pub struct RawReply {
    pub status: u16,
    pub body: String,
}

impl RawReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A page request, identical across a retry except for the bearer token.
#[derive(Debug, Clone)]
pub struct PageRequest<'a> {
    pub window: &'a ReportWindow,
    pub page: u32,
    pub per_page: u32,
}

/// Eventix API client.
#[derive(Clone)]
pub struct EventixClient {
    http: reqwest::Client,
    base_url: String,
    company_guid: String,
    endpoint: EndpointVariant,
}

impl EventixClient {
    /// Create a client with a fixed per-request timeout.
    pub fn new(
        base_url: String,
        company_guid: String,
        endpoint: EndpointVariant,
        timeout: Duration,
    ) -> Result<Self, HttpError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| HttpError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            company_guid,
            endpoint,
        })
    }

    /// Send one page request with `access_token`.
    pub async fn send_page(
        &self,
        access_token: &str,
        request: &PageRequest<'_>,
    ) -> Result<RawReply, HttpError> {
        let paging = [
            ("page", request.page.to_string()),
            ("per_page", request.per_page.to_string()),
        ];

        let builder = match self.endpoint {
            EndpointVariant::Orders => {
                let url = format!("{}/orders", self.base_url);
                self.http.get(&url).query(&paging).query(&[
                    ("include", "payments,shop,tickets_count".to_string()),
                    ("append", "events".to_string()),
                    (
                        "created_at",
                        format!("{},{}", request.window.start, request.window.end),
                    ),
                ])
            }
            EndpointVariant::Statistics => {
                let url = format!(
                    "{}/admin/sales/statistics/{}",
                    self.base_url, self.company_guid
                );
                self.http
                    .post(&url)
                    .query(&paging)
                    .json(&serde_json::json!({
                        "start": request.window.start,
                        "end": request.window.end,
                    }))
            }
        };

        let response = builder
            .bearer_auth(access_token)
            .header(reqwest::header::ACCEPT, "application/json, text/plain, */*")
            .header("Company", &self.company_guid)
            .header("X-Authorization-By-OpenTicket", "1")
            .send()
            .await
            .map_err(|e| HttpError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| HttpError::Transport(format!("Failed to read response body: {}", e)))?;

        Ok(RawReply { status, body })
    }
}
