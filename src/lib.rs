// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Eventix daily sales report
//!
//! Polls the Eventix/OpenTicket API for yesterday's orders, keeps the
//! rotating OAuth2 tokens alive across runs, and mails a CSV summary.

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod time_utils;
