// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Canonical order record produced by the normalizer.

use serde::Serialize;

/// Default currency when the upstream order does not name one.
pub const DEFAULT_CURRENCY: &str = "EUR";

/// One normalized order. Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRecord {
    /// Upstream order identifier (guid, id or _id)
    pub order_id: String,
    /// Upstream creation timestamp, passed through as-is
    pub created_at: String,
    pub event_name: String,
    pub currency: String,
    /// Amount in major currency units, never negative
    pub total: f64,
}

impl Default for OrderRecord {
    fn default() -> Self {
        Self {
            order_id: String::new(),
            created_at: String::new(),
            event_name: String::new(),
            currency: DEFAULT_CURRENCY.to_string(),
            total: 0.0,
        }
    }
}
