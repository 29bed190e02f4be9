//! Serialized layout of the persisted progress aggregate.
//!
//! One JSON object per storage key:
//!
//! ```json
//! {
//!   "version": 1,
//!   "savedAt": "2024-05-01T10:00:00Z",
//!   "selectedLanguage": "es",
//!   "levels": { "es": "A2" },
//!   "completedLessons": { "es": ["es-g-a1-1", "es-v-a1-3"] }
//! }
//! ```
//!
//! Records without `version` were written before versioning existed and are
//! read as version 0.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use lingo_core::model::{CefrLevel, ItemId, LanguageId, UserProgress};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Version written by this build.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RecordError {
    #[error("malformed progress record: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("progress record version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    #[serde(default)]
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub selected_language: Option<LanguageId>,
    #[serde(default)]
    pub levels: BTreeMap<LanguageId, CefrLevel>,
    #[serde(default)]
    pub completed_lessons: BTreeMap<LanguageId, Vec<ItemId>>,
}

impl ProgressRecord {
    #[must_use]
    pub fn from_progress(progress: &UserProgress, saved_at: DateTime<Utc>) -> Self {
        Self {
            version: CURRENT_SCHEMA_VERSION,
            saved_at: Some(saved_at),
            selected_language: progress.selected_language().cloned(),
            levels: progress.levels().clone(),
            completed_lessons: progress
                .completed_lessons()
                .iter()
                .map(|(lang, items)| (lang.clone(), items.iter().cloned().collect()))
                .collect(),
        }
    }

    /// Parse a stored payload and bring it up to the current version.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::Malformed` if the payload is not a valid record
    /// and `RecordError::UnsupportedVersion` if it was written by a newer build.
    pub fn decode(payload: &str) -> Result<Self, RecordError> {
        let record: Self = serde_json::from_str(payload)?;
        record.upgrade()
    }

    /// Serialize the record for storage.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::Malformed` if serialization fails.
    pub fn encode(&self) -> Result<String, RecordError> {
        Ok(serde_json::to_string(self)?)
    }

    fn upgrade(mut self) -> Result<Self, RecordError> {
        if self.version > CURRENT_SCHEMA_VERSION {
            return Err(RecordError::UnsupportedVersion {
                found: self.version,
                supported: CURRENT_SCHEMA_VERSION,
            });
        }

        // 0 -> 1: legacy lists could hold the same id twice.
        if self.version == 0 {
            for items in self.completed_lessons.values_mut() {
                let mut seen = BTreeSet::new();
                items.retain(|id| seen.insert(id.clone()));
            }
            self.version = 1;
        }

        Ok(self)
    }

    #[must_use]
    pub fn into_progress(self) -> UserProgress {
        UserProgress::from_persisted(
            self.selected_language,
            self.levels,
            self.completed_lessons
                .into_iter()
                .map(|(lang, items)| (lang, items.into_iter().collect()))
                .collect(),
        )
    }
}
