// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Token persistence across report runs.
//!
//! The store holds one access/refresh pair. A stored access token is only
//! handed out while it is fresh (see [`TokenRecord::is_fresh_at`]); the
//! refresh token is handed out regardless, because the provider rotates it
//! and the newest one is the only one that still works.

use crate::config::Credentials;
use crate::error::StoreError;
use crate::models::TokenRecord;
use crate::time_utils::unix_now;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Durable storage for a single token record.
pub trait TokenBackend: Send + Sync {
    /// Read the stored record. Missing or unreadable data is `None`.
    fn read(&self) -> Option<TokenRecord>;

    /// Replace the stored record.
    fn write(&self, record: &TokenRecord) -> Result<(), StoreError>;
}

/// JSON file backend. Writes go to a temp file in the same directory and
/// are renamed into place, so readers never observe a partial file.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TokenBackend for FileBackend {
    fn read(&self) -> Option<TokenRecord> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to read token file");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Ignoring corrupt token file");
                None
            }
        }
    }

    fn write(&self, record: &TokenRecord) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer(&mut tmp, record)?;
        tmp.as_file_mut().flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }
}

/// In-memory backend for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    record: Arc<Mutex<Option<TokenRecord>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend pre-populated with `record`.
    pub fn with_record(record: TokenRecord) -> Self {
        Self {
            record: Arc::new(Mutex::new(Some(record))),
        }
    }
}

impl TokenBackend for MemoryBackend {
    fn read(&self) -> Option<TokenRecord> {
        self.record.lock().ok().and_then(|guard| guard.clone())
    }

    fn write(&self, record: &TokenRecord) -> Result<(), StoreError> {
        if let Ok(mut guard) = self.record.lock() {
            *guard = Some(record.clone());
        }
        Ok(())
    }
}

/// Token store with freshness rules on top of a backend.
#[derive(Clone)]
pub struct TokenStore {
    backend: Arc<dyn TokenBackend>,
}

impl TokenStore {
    pub fn new(backend: impl TokenBackend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Store backed by the JSON file at `path`.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(FileBackend::new(path))
    }

    /// Store kept in memory only.
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    /// The stored record, only if it is fresh now.
    pub fn load(&self) -> Option<TokenRecord> {
        self.load_at(unix_now())
    }

    /// The stored record, only if it is fresh at `now`.
    pub fn load_at(&self, now: i64) -> Option<TokenRecord> {
        self.backend.read().filter(|record| record.is_fresh_at(now))
    }

    /// The stored record regardless of freshness.
    pub fn load_any(&self) -> Option<TokenRecord> {
        self.backend.read()
    }

    /// Access token to start with: a fresh stored one, else the seed.
    pub fn current_access_token(&self, seed: &Credentials) -> String {
        match self.load() {
            Some(record) => record.access_token,
            None => seed.access_token.clone(),
        }
    }

    /// Most recently persisted refresh token, else the seed.
    pub fn latest_refresh_token(&self, seed: &Credentials) -> String {
        self.load_any()
            .map(|record| record.refresh_token)
            .filter(|token| !token.is_empty())
            .unwrap_or_else(|| seed.refresh_token.clone())
    }

    /// Persist a new pair expiring `expires_in` seconds from now.
    pub fn save(
        &self,
        access_token: &str,
        refresh_token: &str,
        expires_in: i64,
    ) -> Result<TokenRecord, StoreError> {
        self.save_at(access_token, refresh_token, expires_in, unix_now())
    }

    /// Persist a new pair expiring `expires_in` seconds after `now`.
    pub fn save_at(
        &self,
        access_token: &str,
        refresh_token: &str,
        expires_in: i64,
        now: i64,
    ) -> Result<TokenRecord, StoreError> {
        let record = TokenRecord::issued_at(access_token, refresh_token, expires_in, now);
        self.backend.write(&record)?;
        tracing::debug!(expires_at = record.expires_at, "Token record saved");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::token::FRESHNESS_BUFFER_SECS;

    fn seed() -> Credentials {
        Credentials {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            access_token: "seed_access".to_string(),
            refresh_token: "seed_refresh".to_string(),
        }
    }

    #[test]
    fn test_load_rejects_tokens_inside_buffer() {
        let now = 1_700_000_000;
        let store = TokenStore::in_memory();
        store
            .save_at("access", "refresh", FRESHNESS_BUFFER_SECS, now)
            .unwrap();

        assert!(store.load_at(now).is_none());
        assert_eq!(store.load_any().unwrap().access_token, "access");
    }

    #[test]
    fn test_load_returns_fresh_token() {
        let now = 1_700_000_000;
        let store = TokenStore::in_memory();
        store.save_at("access", "refresh", 259_200, now).unwrap();

        let record = store.load_at(now).unwrap();
        assert_eq!(record.expires_at, now + 259_200);
    }

    #[test]
    fn test_empty_store_falls_back_to_seed() {
        let store = TokenStore::in_memory();
        assert_eq!(store.current_access_token(&seed()), "seed_access");
        assert_eq!(store.latest_refresh_token(&seed()), "seed_refresh");
    }

    #[test]
    fn test_stale_record_still_supplies_refresh_token() {
        let store = TokenStore::new(MemoryBackend::with_record(TokenRecord {
            access_token: "old_access".to_string(),
            refresh_token: "rotated_refresh".to_string(),
            expires_at: 0,
        }));

        assert_eq!(store.current_access_token(&seed()), "seed_access");
        assert_eq!(store.latest_refresh_token(&seed()), "rotated_refresh");
    }
}
