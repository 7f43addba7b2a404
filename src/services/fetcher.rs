// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Paginated order fetching with a single refresh-and-retry on 401.
//!
//! Each page request runs a two-state protocol:
//! - `Unauthenticated`: sent with whatever token the run currently holds.
//!   A 401 triggers exactly one refresh, then the identical request is
//!   retried in the next state.
//! - `Authenticated`: sent with a token just issued by the refresh. Any
//!   non-2xx here, 401 included, is terminal for the page.
//!
//! Statuses >= 400 other than 401 are never retried. A terminal error stops
//! pagination; orders from earlier pages are kept.

use crate::config::Credentials;
use crate::error::{truncate_body, HttpError, LOG_BODY_LIMIT};
use crate::models::ReportWindow;
use crate::services::eventix::{EventixClient, PageRequest, RawReply};
use crate::services::refresher::TokenRefresher;
use crate::services::token_store::TokenStore;
use serde_json::Value;

/// Where a page request stands in the retry protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticated,
}

/// What to do with a response in a given state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Accept,
    RefreshAndRetry,
    Fail,
}

impl AuthState {
    /// Decide the next step for `status`.
    pub fn step(self, status: u16) -> Step {
        match (self, status) {
            (_, 200..=299) => Step::Accept,
            (AuthState::Unauthenticated, 401) => Step::RefreshAndRetry,
            _ => Step::Fail,
        }
    }
}

/// One decoded page of results.
#[derive(Debug, Clone)]
pub struct Page {
    pub orders: Vec<Value>,
    /// Declared last page; 1 when the response omits it
    pub last_page: u32,
}

impl Page {
    /// Decode the `{data: [...], last_page: n}` envelope.
    pub fn from_body(body: &str) -> Result<Self, HttpError> {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| HttpError::Decode(format!("JSON parse error: {}", e)))?;

        let orders = match value.get("data") {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        };

        let last_page = match value.get("last_page") {
            Some(Value::Number(n)) => n.as_u64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        }
        .map(|n| n.min(u32::MAX as u64) as u32)
        .unwrap_or(1);

        Ok(Self { orders, last_page })
    }
}

/// Result of a paginated fetch.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    /// Raw order objects in upstream order
    pub orders: Vec<Value>,
    /// Pages successfully received
    pub pages_fetched: u32,
    /// The error that ended pagination early, if any
    pub error: Option<HttpError>,
}

impl FetchOutcome {
    /// Nothing was collected and the fetch failed.
    pub fn is_total_failure(&self) -> bool {
        self.orders.is_empty() && self.error.is_some()
    }
}

/// Fetches all order pages for a window, keeping the access token current.
pub struct OrderFetcher {
    client: EventixClient,
    refresher: TokenRefresher,
    store: TokenStore,
    seed: Credentials,
    per_page: u32,
    access_token: String,
}

impl OrderFetcher {
    /// Create a fetcher starting with the store's fresh token or the seed.
    pub fn new(
        client: EventixClient,
        refresher: TokenRefresher,
        store: TokenStore,
        seed: Credentials,
        per_page: u32,
    ) -> Self {
        let access_token = store.current_access_token(&seed);
        Self {
            client,
            refresher,
            store,
            seed,
            per_page,
            access_token,
        }
    }

    /// The access token the next request will carry.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Fetch every page for `window`, stopping at `last_page` or an empty page.
    pub async fn fetch_all(&mut self, window: &ReportWindow) -> FetchOutcome {
        let mut outcome = FetchOutcome::default();
        let mut page = 1u32;

        loop {
            let request = PageRequest {
                window,
                page,
                per_page: self.per_page,
            };

            match self.fetch_page(&request).await {
                Ok(result) => {
                    outcome.pages_fetched += 1;
                    if result.orders.is_empty() {
                        tracing::debug!(page, "Empty page, stopping pagination");
                        break;
                    }
                    outcome.orders.extend(result.orders);

                    if page >= result.last_page {
                        break;
                    }
                    page += 1;
                }
                Err(e) => {
                    tracing::error!(
                        page,
                        status = ?e.status(),
                        error = %e,
                        collected = outcome.orders.len(),
                        "Error fetching page, stopping pagination"
                    );
                    outcome.error = Some(e);
                    break;
                }
            }
        }

        tracing::info!(
            pages = outcome.pages_fetched,
            orders = outcome.orders.len(),
            complete = outcome.error.is_none(),
            "Order fetch finished"
        );
        outcome
    }

    /// Fetch one page, refreshing the token at most once on 401.
    pub async fn fetch_page(&mut self, request: &PageRequest<'_>) -> Result<Page, HttpError> {
        let mut state = AuthState::Unauthenticated;

        loop {
            let reply = self
                .client
                .send_page(&self.access_token, request)
                .await
                .inspect_err(|e| {
                    tracing::error!(page = request.page, error = %e, "Eventix request failed");
                })?;

            match state.step(reply.status) {
                Step::Accept => return Page::from_body(&reply.body),
                Step::RefreshAndRetry => {
                    tracing::warn!(
                        page = request.page,
                        "Access token unauthorized (401), trying refresh"
                    );
                    match self.renew_access_token().await {
                        Some(token) => {
                            self.access_token = token;
                            state = AuthState::Authenticated;
                        }
                        None => return Err(terminal_error(request.page, reply)),
                    }
                }
                Step::Fail => return Err(terminal_error(request.page, reply)),
            }
        }
    }

    /// Obtain a replacement token after a 401.
    ///
    /// If the refresh itself fails, another process may already have rotated
    /// the refresh token and stored its result; a fresh stored token that
    /// differs from the rejected one is used instead.
    async fn renew_access_token(&self) -> Option<String> {
        match self.refresher.refresh_and_store(&self.store, &self.seed).await {
            Ok(record) => Some(record.access_token),
            Err(e) => {
                tracing::warn!(status = ?e.status(), error = %e, "Token refresh failed");
                match self.store.load() {
                    Some(record) if record.access_token != self.access_token => {
                        tracing::info!("Using token stored by a concurrent run");
                        Some(record.access_token)
                    }
                    _ => None,
                }
            }
        }
    }
}

/// Log and convert a non-accepted reply into a terminal error.
fn terminal_error(page: u32, reply: RawReply) -> HttpError {
    let body = truncate_body(&reply.body, LOG_BODY_LIMIT);
    tracing::error!(page, status = reply.status, body = %body, "Error response from Eventix");

    if reply.status == 401 {
        HttpError::Unauthorized { body }
    } else {
        HttpError::Status {
            status: reply.status,
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_401_triggers_refresh() {
        assert_eq!(
            AuthState::Unauthenticated.step(401),
            Step::RefreshAndRetry
        );
    }

    #[test]
    fn test_401_after_refresh_is_terminal() {
        assert_eq!(AuthState::Authenticated.step(401), Step::Fail);
    }

    #[test]
    fn test_other_errors_never_retry() {
        for status in [400, 403, 404, 429, 500, 503] {
            assert_eq!(AuthState::Unauthenticated.step(status), Step::Fail);
            assert_eq!(AuthState::Authenticated.step(status), Step::Fail);
        }
    }

    #[test]
    fn test_success_accepted_in_both_states() {
        assert_eq!(AuthState::Unauthenticated.step(200), Step::Accept);
        assert_eq!(AuthState::Authenticated.step(204), Step::Accept);
    }

    #[test]
    fn test_page_defaults_last_page_to_one() {
        let page = Page::from_body(r#"{"data":[{"guid":"a"}]}"#).unwrap();
        assert_eq!(page.orders.len(), 1);
        assert_eq!(page.last_page, 1);
    }

    #[test]
    fn test_page_treats_missing_data_as_empty() {
        let page = Page::from_body(r#"{"last_page":4}"#).unwrap();
        assert!(page.orders.is_empty());
        assert_eq!(page.last_page, 4);

        let page = Page::from_body(r#"{"data":null,"last_page":"2"}"#).unwrap();
        assert!(page.orders.is_empty());
        assert_eq!(page.last_page, 2);
    }

    #[test]
    fn test_page_rejects_non_json() {
        assert!(matches!(
            Page::from_body("<html>oops</html>"),
            Err(HttpError::Decode(_))
        ));
    }
}
