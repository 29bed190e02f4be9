use async_trait::async_trait;
use lingo_core::model::AccountId;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Key under which one progress aggregate is stored.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct StorageKey(String);

impl StorageKey {
    const PREFIX: &'static str = "ls:progress";

    /// The single device-wide key.
    #[must_use]
    pub fn global() -> Self {
        Self(Self::PREFIX.to_owned())
    }

    /// A key namespaced by account, so several accounts can share a device.
    #[must_use]
    pub fn for_account(account: &AccountId) -> Self {
        Self(format!("{}:{}", Self::PREFIX, account))
    }

    /// Pick the account key when a session is present, the global key otherwise.
    #[must_use]
    pub fn from_session(account: Option<&AccountId>) -> Self {
        account.map_or_else(Self::global, Self::for_account)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for StorageKey {
    fn default() -> Self {
        Self::global()
    }
}

impl fmt::Debug for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StorageKey({})", self.0)
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Repository contract for serialized progress records.
///
/// Payloads are opaque strings here; decoding and recovery belong to the
/// services layer.
#[async_trait]
pub trait ProgressRecordRepository: Send + Sync {
    /// Fetch the stored payload for `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn load_record(&self, key: &StorageKey) -> Result<Option<String>, StorageError>;

    /// Replace the payload stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the payload cannot be stored.
    async fn save_record(&self, key: &StorageKey, payload: &str) -> Result<(), StorageError>;

    /// Remove the payload stored under `key`. Missing keys are not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn delete_record(&self, key: &StorageKey) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    records: Arc<Mutex<HashMap<StorageKey, String>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Repository pre-filled with a raw payload, e.g. a corrupted one.
    #[must_use]
    pub fn with_payload(key: StorageKey, payload: impl Into<String>) -> Self {
        let repo = Self::new();
        if let Ok(mut guard) = repo.records.lock() {
            guard.insert(key, payload.into());
        }
        repo
    }
}

#[async_trait]
impl ProgressRecordRepository for InMemoryRepository {
    async fn load_record(&self, key: &StorageKey) -> Result<Option<String>, StorageError> {
        let guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn save_record(&self, key: &StorageKey, payload: &str) -> Result<(), StorageError> {
        let mut guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key.clone(), payload.to_owned());
        Ok(())
    }

    async fn delete_record(&self, key: &StorageKey) -> Result<(), StorageError> {
        let mut guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(key);
        Ok(())
    }
}

/// Aggregates the progress repository behind a trait object for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRecordRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let progress: Arc<dyn ProgressRecordRepository> = Arc::new(InMemoryRepository::new());
        Self { progress }
    }
}
