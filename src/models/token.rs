// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Persisted OAuth token pair.

use serde::{Deserialize, Deserializer, Serialize};

/// Safety buffer before expiry during which a stored token is no longer
/// handed out (1 hour).
pub const FRESHNESS_BUFFER_SECS: i64 = 60 * 60;

/// Access/refresh token pair as stored in the token file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub access_token: String,
    pub refresh_token: String,
    /// When the access token becomes invalid (unix seconds)
    #[serde(deserialize_with = "unix_seconds")]
    pub expires_at: i64,
}

impl TokenRecord {
    /// Build a record expiring `expires_in` seconds after `now`.
    pub fn issued_at(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_in: i64,
        now: i64,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            expires_at: now.saturating_add(expires_in),
        }
    }

    /// Whether the access token is still usable at `now`, including the buffer.
    pub fn is_fresh_at(&self, now: i64) -> bool {
        self.expires_at > now.saturating_add(FRESHNESS_BUFFER_SECS)
    }
}

/// Accept integer or fractional unix seconds; older writers stored floats.
fn unix_seconds<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if !value.is_finite() {
        return Err(serde::de::Error::custom("expires_at must be finite"));
    }
    Ok(value.floor() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_freshness_uses_one_hour_buffer() {
        let now = 1_700_000_000;
        let record = TokenRecord::issued_at("a", "r", FRESHNESS_BUFFER_SECS, now);
        assert!(!record.is_fresh_at(now));

        let record = TokenRecord::issued_at("a", "r", FRESHNESS_BUFFER_SECS + 1, now);
        assert!(record.is_fresh_at(now));
    }

    #[test]
    fn test_reads_fractional_expiry() {
        let json = r#"{"access_token":"a","refresh_token":"r","expires_at":1700000000.75}"#;
        let record: TokenRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.expires_at, 1_700_000_000);
    }

    #[test]
    fn test_writes_integer_expiry() {
        let record = TokenRecord::issued_at("a", "r", 10, 100);
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains(r#""expires_at":110"#));
    }
}
