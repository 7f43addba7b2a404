// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use chrono::NaiveDate;
use eventix_report::config::{Config, Credentials, EndpointVariant, TokenEncoding};
use eventix_report::models::ReportWindow;
use eventix_report::services::{EventixClient, OrderFetcher, TokenRefresher, TokenStore};
use serde_json::{json, Value};
use std::time::Duration;

/// Seed credentials used by every test.
#[allow(dead_code)]
pub fn test_credentials() -> Credentials {
    Config::test_default().credentials
}

/// Report window for 2025-01-15 in Amsterdam.
#[allow(dead_code)]
pub fn test_window() -> ReportWindow {
    eventix_report::time_utils::report_window(
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
        chrono_tz::Europe::Amsterdam,
    )
    .unwrap()
}

/// Config pointing every upstream at the mock server.
#[allow(dead_code)]
pub fn test_config(server_url: &str, output_dir: &std::path::Path) -> Config {
    let mut config = Config::test_default();
    config.api_base = server_url.to_string();
    config.auth_url = format!("{}/tokens", server_url);
    config.output_dir = output_dir.to_path_buf();
    config.http_timeout_secs = 5;
    config.mail.brevo_api_key = Some("test-brevo-key".to_string());
    config.mail.brevo_api_url = server_url.to_string();
    config
}

/// Fetcher against the mock server's `/orders` and `/tokens`.
#[allow(dead_code)]
pub fn test_fetcher(server_url: &str, store: TokenStore, per_page: u32) -> OrderFetcher {
    test_fetcher_with(server_url, store, per_page, EndpointVariant::Orders)
}

#[allow(dead_code)]
pub fn test_fetcher_with(
    server_url: &str,
    store: TokenStore,
    per_page: u32,
    endpoint: EndpointVariant,
) -> OrderFetcher {
    test_fetcher_timeout(server_url, store, per_page, endpoint, Duration::from_secs(5))
}

/// Fetcher whose page requests give up after `timeout`.
#[allow(dead_code)]
pub fn test_fetcher_timeout(
    server_url: &str,
    store: TokenStore,
    per_page: u32,
    endpoint: EndpointVariant,
    timeout: Duration,
) -> OrderFetcher {
    let credentials = test_credentials();
    let client = EventixClient::new(
        server_url.to_string(),
        "test-company".to_string(),
        endpoint,
        timeout,
    )
    .unwrap();
    let refresher = TokenRefresher::new(
        format!("{}/tokens", server_url),
        &credentials,
        TokenEncoding::Form,
        Duration::from_secs(5),
    )
    .unwrap();
    OrderFetcher::new(client, refresher, store, credentials, per_page)
}

/// Synthetic order with a total of `cents` minor units.
#[allow(dead_code)]
pub fn order_json(guid: &str, cents: u64) -> Value {
    json!({
        "guid": guid,
        "created_at": "2025-01-15T12:00:00+01:00",
        "events": {"evt-1": "Nieuwjaarsfeest"},
        "finn_price": cents,
    })
}

/// A `{data, last_page}` response body.
#[allow(dead_code)]
pub fn page_body(orders: Vec<Value>, last_page: u32) -> String {
    json!({ "data": orders, "last_page": last_page }).to_string()
}

/// A token endpoint response body.
#[allow(dead_code)]
pub fn token_body(access: &str, refresh: Option<&str>, expires_in: Option<i64>) -> String {
    let mut body = json!({ "access_token": access, "token_type": "Bearer" });
    if let Some(refresh) = refresh {
        body["refresh_token"] = json!(refresh);
    }
    if let Some(expires_in) = expires_in {
        body["expires_in"] = json!(expires_in);
    }
    body.to_string()
}
