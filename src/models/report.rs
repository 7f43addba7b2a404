// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Report aggregates and the reporting window.

use chrono::NaiveDate;

/// Totals over a set of orders. Recomputed on every run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportSummary {
    pub order_count: usize,
    /// Sum of order totals in major units
    pub total_revenue: f64,
}

/// The local calendar day a report covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportWindow {
    pub date: NaiveDate,
    /// Local midnight (RFC3339 with offset)
    pub start: String,
    /// Local 23:59:59 (RFC3339 with offset)
    pub end: String,
}
