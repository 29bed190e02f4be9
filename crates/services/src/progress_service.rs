use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::Utc;
use lingo_core::model::{AccountId, CefrLevel, ItemId, LanguageId, UserProgress};
use storage::record::{ProgressRecord, RecordError};
use storage::repository::{ProgressRecordRepository, StorageKey};
use tokio::sync::Mutex;

use crate::error::ProgressServiceError;

/// Write locks keyed by storage key.
///
/// Services built from clones of one registry serialize their writes to the
/// same key, even when they are separate instances.
#[derive(Clone, Default)]
pub struct WriteLocks {
    locks: Arc<std::sync::Mutex<HashMap<StorageKey, Arc<Mutex<()>>>>>,
}

impl WriteLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, key: &StorageKey) -> Arc<Mutex<()>> {
        let mut guard = match self.locks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Arc::clone(guard.entry(key.clone()).or_default())
    }
}

/// Single source of truth for a user's `UserProgress`.
///
/// Every write loads the whole aggregate, applies one change and stores the
/// whole aggregate back while holding a write lock, so chained calls never
/// lose each other's fields. Instances that may write the same key must
/// share a [`WriteLocks`] registry (see [`ProgressService::with_locks`]);
/// clones always share their lock. Reads never fail: a missing, unreadable or
/// unreachable record reads as a fresh start.
#[derive(Clone)]
pub struct ProgressService {
    key: StorageKey,
    records: Arc<dyn ProgressRecordRepository>,
    write_lock: Arc<Mutex<()>>,
}

impl ProgressService {
    /// Service over the device-wide storage key.
    #[must_use]
    pub fn new(records: Arc<dyn ProgressRecordRepository>) -> Self {
        Self::with_key(records, StorageKey::global())
    }

    /// Service over `key` with a lock of its own.
    #[must_use]
    pub fn with_key(records: Arc<dyn ProgressRecordRepository>, key: StorageKey) -> Self {
        Self::with_locks(records, key, &WriteLocks::new())
    }

    /// Service over `key` whose writes serialize with every other service
    /// taking its lock from `locks`.
    #[must_use]
    pub fn with_locks(
        records: Arc<dyn ProgressRecordRepository>,
        key: StorageKey,
        locks: &WriteLocks,
    ) -> Self {
        let write_lock = locks.lock_for(&key);
        Self {
            key,
            records,
            write_lock,
        }
    }

    /// Service scoped to the signed-in account, or the global key without one.
    #[must_use]
    pub fn for_session(
        records: Arc<dyn ProgressRecordRepository>,
        account: Option<&AccountId>,
    ) -> Self {
        Self::with_key(records, StorageKey::from_session(account))
    }

    #[must_use]
    pub fn key(&self) -> &StorageKey {
        &self.key
    }

    /// The full aggregate as currently stored.
    pub async fn snapshot(&self) -> UserProgress {
        let payload = match self.records.load_record(&self.key).await {
            Ok(Some(payload)) => payload,
            Ok(None) => return UserProgress::default(),
            Err(err) => {
                tracing::warn!(key = %self.key, error = %err, "progress store unreachable, reading defaults");
                return UserProgress::default();
            }
        };

        match ProgressRecord::decode(&payload) {
            Ok(record) => record.into_progress(),
            Err(err) => {
                tracing::warn!(key = %self.key, error = %err, "unreadable progress record, reading defaults");
                UserProgress::default()
            }
        }
    }

    pub async fn selected_language(&self) -> Option<LanguageId> {
        self.snapshot().await.selected_language().cloned()
    }

    /// Set the language in focus. No check that the language exists.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError` if the aggregate cannot be stored.
    pub async fn set_selected_language(
        &self,
        language: &LanguageId,
    ) -> Result<(), ProgressServiceError> {
        self.update(|progress| {
            progress.set_selected_language(language.clone());
            true
        })
        .await
        .map(|_| ())
    }

    /// Stored level, or A1 for a language that was never started.
    pub async fn current_level(&self, language: &LanguageId) -> CefrLevel {
        self.snapshot().await.level(language)
    }

    /// Overwrite (or create) the level entry for `language`.
    ///
    /// Placement, manual choice and test advancement all go through here.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError` if the aggregate cannot be stored.
    pub async fn set_current_level(
        &self,
        language: &LanguageId,
        level: CefrLevel,
    ) -> Result<(), ProgressServiceError> {
        self.update(|progress| {
            progress.set_level(language.clone(), level);
            true
        })
        .await
        .map(|_| ())
    }

    pub async fn completed_lessons(&self, language: &LanguageId) -> BTreeSet<ItemId> {
        self.snapshot()
            .await
            .completed(language)
            .cloned()
            .unwrap_or_default()
    }

    /// Record an item as done.
    ///
    /// Returns `false` without writing anything when it was already recorded.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError` if the aggregate cannot be stored.
    pub async fn mark_lesson_complete(
        &self,
        language: &LanguageId,
        item: &ItemId,
    ) -> Result<bool, ProgressServiceError> {
        self.update(|progress| progress.mark_completed(language.clone(), item.clone()))
            .await
    }

    /// Languages with an explicit level; empty for a brand-new user.
    pub async fn started_languages(&self) -> Vec<LanguageId> {
        self.snapshot().await.started_languages()
    }

    /// Forget one language's level and completed items.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError` if the aggregate cannot be stored.
    pub async fn reset_language_progress(
        &self,
        language: &LanguageId,
    ) -> Result<(), ProgressServiceError> {
        self.update(|progress| {
            progress.reset_language(language);
            true
        })
        .await
        .map(|_| ())
    }

    /// Wipe the whole aggregate.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError` if the record cannot be removed.
    pub async fn reset_progress(&self) -> Result<(), ProgressServiceError> {
        let _guard = self.write_lock.lock().await;
        self.records.delete_record(&self.key).await?;
        tracing::info!(key = %self.key, "progress reset");
        Ok(())
    }

    /// Load for a write. Unlike `snapshot`, backend failures propagate so a
    /// transient read error cannot be turned into an overwrite with defaults.
    async fn load_for_update(&self) -> Result<UserProgress, ProgressServiceError> {
        let Some(payload) = self.records.load_record(&self.key).await? else {
            return Ok(UserProgress::default());
        };

        match ProgressRecord::decode(&payload) {
            Ok(record) => Ok(record.into_progress()),
            Err(RecordError::UnsupportedVersion { found, supported }) => {
                Err(ProgressServiceError::UnsupportedSchema { found, supported })
            }
            Err(err) => {
                tracing::warn!(key = %self.key, error = %err, "replacing unreadable progress record");
                Ok(UserProgress::default())
            }
        }
    }

    async fn update<F>(&self, apply: F) -> Result<bool, ProgressServiceError>
    where
        F: FnOnce(&mut UserProgress) -> bool,
    {
        let _guard = self.write_lock.lock().await;
        let mut progress = self.load_for_update().await?;
        if !apply(&mut progress) {
            return Ok(false);
        }

        let payload = ProgressRecord::from_progress(&progress, Utc::now()).encode()?;
        self.records.save_record(&self.key, &payload).await?;
        tracing::debug!(key = %self.key, "progress saved");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use storage::repository::{InMemoryRepository, StorageError};

    /// Counts writes and can be told to fail reads.
    #[derive(Default)]
    struct CountingRepository {
        inner: InMemoryRepository,
        saves: AtomicUsize,
        fail_reads: bool,
    }

    #[async_trait]
    impl ProgressRecordRepository for CountingRepository {
        async fn load_record(&self, key: &StorageKey) -> Result<Option<String>, StorageError> {
            if self.fail_reads {
                return Err(StorageError::Connection("offline".into()));
            }
            self.inner.load_record(key).await
        }

        async fn save_record(&self, key: &StorageKey, payload: &str) -> Result<(), StorageError> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            self.inner.save_record(key, payload).await
        }

        async fn delete_record(&self, key: &StorageKey) -> Result<(), StorageError> {
            self.inner.delete_record(key).await
        }
    }

    fn es() -> LanguageId {
        LanguageId::new("es")
    }

    fn service() -> ProgressService {
        ProgressService::new(Arc::new(InMemoryRepository::new()))
    }

    #[tokio::test]
    async fn fresh_store_reads_defaults() {
        let service = service();
        assert_eq!(service.selected_language().await, None);
        assert_eq!(service.current_level(&es()).await, CefrLevel::A1);
        assert!(service.completed_lessons(&es()).await.is_empty());
        assert!(service.started_languages().await.is_empty());
    }

    #[tokio::test]
    async fn read_after_write_sees_new_values() {
        let service = service();
        service.set_selected_language(&es()).await.unwrap();
        service.set_current_level(&es(), CefrLevel::B2).await.unwrap();

        assert_eq!(service.selected_language().await, Some(es()));
        assert_eq!(service.current_level(&es()).await, CefrLevel::B2);
        assert_eq!(service.started_languages().await, vec![es()]);
    }

    #[tokio::test]
    async fn chained_writes_keep_each_others_fields() {
        let service = service();
        service.set_selected_language(&es()).await.unwrap();
        service
            .mark_lesson_complete(&es(), &ItemId::new("es-g-a1-1"))
            .await
            .unwrap();
        service.set_current_level(&es(), CefrLevel::A2).await.unwrap();

        let progress = service.snapshot().await;
        assert_eq!(progress.selected_language(), Some(&es()));
        assert_eq!(progress.level(&es()), CefrLevel::A2);
        assert!(progress.is_completed(&es(), &ItemId::new("es-g-a1-1")));
    }

    #[tokio::test]
    async fn repeated_completion_does_not_write() {
        let repo = Arc::new(CountingRepository::default());
        let service = ProgressService::new(repo.clone());
        let item = ItemId::new("es-v-a1-2");

        assert!(service.mark_lesson_complete(&es(), &item).await.unwrap());
        assert!(!service.mark_lesson_complete(&es(), &item).await.unwrap());

        assert_eq!(repo.saves.load(Ordering::SeqCst), 1);
        assert_eq!(service.completed_lessons(&es()).await.len(), 1);
    }

    #[tokio::test]
    async fn corrupted_record_reads_as_fresh_start() {
        let repo = InMemoryRepository::with_payload(StorageKey::global(), "{ definitely not json");
        let service = ProgressService::new(Arc::new(repo));

        assert_eq!(service.current_level(&es()).await, CefrLevel::A1);
        assert!(service.started_languages().await.is_empty());

        service.set_current_level(&es(), CefrLevel::B1).await.unwrap();
        assert_eq!(service.current_level(&es()).await, CefrLevel::B1);
    }

    #[tokio::test]
    async fn newer_schema_is_not_overwritten() {
        let payload = r#"{"version": 7, "levels": {"es": "C1"}}"#;
        let repo = InMemoryRepository::with_payload(StorageKey::global(), payload);
        let service = ProgressService::new(Arc::new(repo.clone()));

        assert_eq!(service.current_level(&es()).await, CefrLevel::A1);
        let err = service
            .set_current_level(&es(), CefrLevel::A2)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProgressServiceError::UnsupportedSchema { found: 7, .. }
        ));

        let stored = repo.load_record(&StorageKey::global()).await.unwrap();
        assert_eq!(stored.as_deref(), Some(payload));
    }

    #[tokio::test]
    async fn unreachable_backend_reads_defaults_but_fails_writes() {
        let repo = Arc::new(CountingRepository {
            fail_reads: true,
            ..CountingRepository::default()
        });
        let service = ProgressService::new(repo.clone());

        assert_eq!(service.current_level(&es()).await, CefrLevel::A1);
        let err = service.set_selected_language(&es()).await.unwrap_err();
        assert!(matches!(err, ProgressServiceError::Storage(_)));
        assert_eq!(repo.saves.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn reset_language_only_touches_that_language() {
        let service = service();
        let ja = LanguageId::new("ja");
        service.set_selected_language(&es()).await.unwrap();
        service.set_current_level(&es(), CefrLevel::B1).await.unwrap();
        service.set_current_level(&ja, CefrLevel::A2).await.unwrap();
        service
            .mark_lesson_complete(&ja, &ItemId::new("ja-g-a2-1"))
            .await
            .unwrap();
        let ja_before = service.completed_lessons(&ja).await;

        service.reset_language_progress(&es()).await.unwrap();

        assert_eq!(service.selected_language().await, None);
        assert_eq!(service.started_languages().await, vec![ja.clone()]);
        assert_eq!(service.current_level(&ja).await, CefrLevel::A2);
        assert_eq!(service.completed_lessons(&ja).await, ja_before);
    }

    #[tokio::test]
    async fn reset_progress_wipes_everything() {
        let service = service();
        service.set_selected_language(&es()).await.unwrap();
        service.set_current_level(&es(), CefrLevel::C1).await.unwrap();

        service.reset_progress().await.unwrap();

        assert!(service.snapshot().await.is_empty());
    }

    /// Yields inside every load so concurrent writers interleave.
    struct YieldingRepository(InMemoryRepository);

    #[async_trait]
    impl ProgressRecordRepository for YieldingRepository {
        async fn load_record(&self, key: &StorageKey) -> Result<Option<String>, StorageError> {
            let payload = self.0.load_record(key).await;
            tokio::task::yield_now().await;
            payload
        }

        async fn save_record(&self, key: &StorageKey, payload: &str) -> Result<(), StorageError> {
            self.0.save_record(key, payload).await
        }

        async fn delete_record(&self, key: &StorageKey) -> Result<(), StorageError> {
            self.0.delete_record(key).await
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn services_sharing_locks_do_not_lose_writes() {
        let repo: Arc<dyn ProgressRecordRepository> =
            Arc::new(YieldingRepository(InMemoryRepository::new()));
        let locks = WriteLocks::new();
        let first = ProgressService::with_locks(Arc::clone(&repo), StorageKey::global(), &locks);
        let second = ProgressService::with_locks(Arc::clone(&repo), StorageKey::global(), &locks);

        let mut tasks = Vec::new();
        for i in 0..40 {
            let service = if i % 2 == 0 { first.clone() } else { second.clone() };
            tasks.push(tokio::spawn(async move {
                service
                    .mark_lesson_complete(&es(), &ItemId::new(format!("item-{i}")))
                    .await
                    .unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(first.completed_lessons(&es()).await.len(), 40);
    }

    #[test]
    fn registry_hands_out_one_lock_per_key() {
        let locks = WriteLocks::new();
        let global = StorageKey::global();
        let alice = StorageKey::for_account(&AccountId::new("alice"));
        assert!(Arc::ptr_eq(&locks.lock_for(&global), &locks.lock_for(&global)));
        assert!(!Arc::ptr_eq(&locks.lock_for(&global), &locks.lock_for(&alice)));
    }

    #[tokio::test]
    async fn accounts_are_isolated() {
        let repo: Arc<dyn ProgressRecordRepository> = Arc::new(InMemoryRepository::new());
        let alice = ProgressService::for_session(Arc::clone(&repo), Some(&AccountId::new("alice")));
        let bob = ProgressService::for_session(Arc::clone(&repo), Some(&AccountId::new("bob")));

        alice.set_current_level(&es(), CefrLevel::B2).await.unwrap();

        assert_eq!(bob.current_level(&es()).await, CefrLevel::A1);
        assert!(bob.started_languages().await.is_empty());
    }
}
