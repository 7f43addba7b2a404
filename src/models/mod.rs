// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod order;
pub mod report;
pub mod token;

pub use order::OrderRecord;
pub use report::{ReportSummary, ReportWindow};
pub use token::TokenRecord;
