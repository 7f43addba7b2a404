// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod daily_report;
pub mod eventix;
pub mod fetcher;
pub mod mailer;
pub mod normalize;
pub mod refresher;
pub mod report;
pub mod token_store;

pub use daily_report::{DailyReport, RunOutcome};
pub use eventix::EventixClient;
pub use fetcher::{FetchOutcome, OrderFetcher};
pub use mailer::Mailer;
pub use refresher::TokenRefresher;
pub use token_store::{FileBackend, MemoryBackend, TokenBackend, TokenStore};
