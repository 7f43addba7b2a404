// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Error types for the report run.
//!
//! Fetch-level errors (`AuthError`, `HttpError`) end the current fetch but
//! keep whatever was collected. `DeliveryError` is non-fatal once the CSV
//! exists. Everything else bubbles up through `AppError`.

/// Token refresh failed (network or provider rejection).
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Token refresh request failed: {0}")]
    Transport(String),

    #[error("Token endpoint rejected refresh (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Token endpoint returned an unusable response: {0}")]
    Malformed(String),
}

impl AuthError {
    /// HTTP status of the rejection, if the provider answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            AuthError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A page request failed terminally.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("Eventix request failed: {0}")]
    Transport(String),

    #[error("Eventix API still unauthorized after token refresh: {body}")]
    Unauthorized { body: String },

    #[error("Eventix API error (HTTP {status}): {body}")]
    Status { status: u16, body: String },

    #[error("Eventix response could not be decoded: {0}")]
    Decode(String),
}

impl HttpError {
    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::Unauthorized { .. } => Some(401),
            HttpError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Sending the report email failed.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("No mail transport configured")]
    NotConfigured,

    #[error("Mail transport error: {0}")]
    Transport(String),

    #[error("Mail provider rejected message (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Mail address parse error: {0}")]
    Address(String),

    #[error("Mail build error: {0}")]
    Build(String),
}

/// Token persistence write failure. Reads never fail; they yield "no token".
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Token file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Token serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// CSV rendering failure.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Report I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Top-level error for a report run.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Http(#[from] HttpError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, AppError>;

/// Truncate a response body for logging, respecting char boundaries.
pub fn truncate_body(body: &str, max_chars: usize) -> String {
    match body.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &body[..idx]),
        None => body.to_string(),
    }
}

/// Maximum number of body characters carried into logs and errors.
pub const LOG_BODY_LIMIT: usize = 500;
