// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OAuth2 refresh-token exchange against the Eventix token endpoint.
//!
//! Eventix refresh tokens are single use: every successful exchange may
//! rotate the refresh token, so the token to exchange is always read from
//! the store right before the request, never captured at startup.

use crate::config::{Credentials, TokenEncoding};
use crate::error::{truncate_body, AuthError, LOG_BODY_LIMIT};
use crate::models::TokenRecord;
use crate::services::token_store::TokenStore;
use crate::time_utils::unix_now;
use serde::{Deserialize, Deserializer};
use std::time::Duration;

/// Lifetime assumed when the provider omits `expires_in` (3 days).
pub const DEFAULT_EXPIRES_IN_SECS: i64 = 3 * 24 * 60 * 60;

/// Raw token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenRefreshResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default, deserialize_with = "lenient_seconds")]
    pub expires_in: Option<i64>,
}

/// Read `expires_in` as an integer, float or numeric string.
///
/// Anything else counts as absent. The old refresh token is already spent
/// when this runs, so a bad lifetime must never reject the new pair.
fn lenient_seconds<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let secs = match value {
        Some(serde_json::Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok().map(|f| f as i64),
        _ => None,
    };
    Ok(secs.filter(|secs| *secs > 0))
}

/// Client for the OAuth2 token endpoint.
#[derive(Clone)]
pub struct TokenRefresher {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    encoding: TokenEncoding,
}

impl TokenRefresher {
    pub fn new(
        token_url: String,
        credentials: &Credentials,
        encoding: TokenEncoding,
        timeout: Duration,
    ) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            token_url,
            client_id: credentials.client_id.clone(),
            client_secret: credentials.client_secret.clone(),
            encoding,
        })
    }

    /// Exchange `refresh_token` for a new token pair.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenRefreshResponse, AuthError> {
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];

        let request = self
            .http
            .post(&self.token_url)
            .header(reqwest::header::ACCEPT, "application/json");

        let request = match self.encoding {
            TokenEncoding::Form => request.form(&params),
            TokenEncoding::Json => {
                let body: serde_json::Map<String, serde_json::Value> = params
                    .iter()
                    .map(|(k, v)| (k.to_string(), serde_json::Value::from(*v)))
                    .collect();
                request.json(&body)
            }
        };

        let response = request
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = status.as_u16(),
                body = %truncate_body(&body, LOG_BODY_LIMIT),
                "Token refresh rejected"
            );
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                body: truncate_body(&body, LOG_BODY_LIMIT),
            });
        }

        let parsed: TokenRefreshResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Malformed(format!("JSON parse error: {}", e)))?;

        if parsed.access_token.is_empty() {
            return Err(AuthError::Malformed("empty access_token".to_string()));
        }

        Ok(parsed)
    }

    /// Refresh using the newest stored refresh token and persist the result.
    ///
    /// A response without `refresh_token` keeps the token that was just
    /// exchanged. A persistence failure is logged; the new pair is still
    /// returned so the current run can use it.
    pub async fn refresh_and_store(
        &self,
        store: &TokenStore,
        seed: &Credentials,
    ) -> Result<TokenRecord, AuthError> {
        let previous = store.latest_refresh_token(seed);
        let response = self.refresh(&previous).await?;

        let refresh_token = response
            .refresh_token
            .filter(|token| !token.is_empty())
            .unwrap_or(previous);
        let expires_in = response
            .expires_in
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_EXPIRES_IN_SECS);

        match store.save(&response.access_token, &refresh_token, expires_in) {
            Ok(record) => {
                tracing::info!(expires_at = record.expires_at, "Access token refreshed and stored");
                Ok(record)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Refreshed token could not be persisted, using it in memory");
                Ok(TokenRecord::issued_at(
                    response.access_token,
                    refresh_token,
                    expires_in,
                    unix_now(),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> TokenRefreshResponse {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn test_expires_in_accepts_integer_float_and_string() {
        assert_eq!(parse(r#"{"access_token":"a","expires_in":7200}"#).expires_in, Some(7200));
        assert_eq!(parse(r#"{"access_token":"a","expires_in":7200.9}"#).expires_in, Some(7200));
        assert_eq!(parse(r#"{"access_token":"a","expires_in":"259200"}"#).expires_in, Some(259_200));
    }

    #[test]
    fn test_unusable_expires_in_is_treated_as_missing() {
        assert_eq!(parse(r#"{"access_token":"a"}"#).expires_in, None);
        assert_eq!(parse(r#"{"access_token":"a","expires_in":null}"#).expires_in, None);
        assert_eq!(parse(r#"{"access_token":"a","expires_in":"soon"}"#).expires_in, None);
        assert_eq!(parse(r#"{"access_token":"a","expires_in":-5}"#).expires_in, None);
        assert_eq!(parse(r#"{"access_token":"a","expires_in":{}}"#).expires_in, None);
    }
}
