use std::path::Path;
use std::sync::Arc;

use lingo_core::ContentProvider;
use lingo_core::model::AccountId;
use lingo_core::scoring::{LevelTestPolicy, PlacementPolicy};
use storage::content_pack::load_content_dir;
use storage::repository::Storage;

use crate::completion_service::CompletionService;
use crate::error::AppServicesError;
use crate::level_test_service::LevelTestService;
use crate::placement_service::PlacementService;
use crate::progress_service::ProgressService;

/// Score rules handed to the quiz services.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoringConfig {
    pub placement: PlacementPolicy,
    pub level_test: LevelTestPolicy,
}

/// Assembles app-facing services over one progress store.
#[derive(Clone)]
pub struct AppServices {
    content: Arc<dyn ContentProvider>,
    progress: Arc<ProgressService>,
    placement: Arc<PlacementService>,
    level_tests: Arc<LevelTestService>,
    completion: Arc<CompletionService>,
}

impl AppServices {
    /// Wire services over existing storage and content.
    ///
    /// With an account the progress record is kept under that account's key,
    /// otherwise under the device-wide one.
    #[must_use]
    pub fn new(
        storage: &Storage,
        content: Arc<dyn ContentProvider>,
        account: Option<&AccountId>,
        scoring: ScoringConfig,
    ) -> Self {
        let progress = Arc::new(ProgressService::for_session(
            Arc::clone(&storage.progress),
            account,
        ));
        let placement = Arc::new(PlacementService::with_policy(
            Arc::clone(&content),
            Arc::clone(&progress),
            scoring.placement,
        ));
        let level_tests = Arc::new(LevelTestService::with_policy(
            Arc::clone(&content),
            Arc::clone(&progress),
            scoring.level_test,
        ));
        let completion = Arc::new(CompletionService::new(
            Arc::clone(&content),
            Arc::clone(&progress),
        ));

        Self {
            content,
            progress,
            placement,
            level_tests,
            completion,
        }
    }

    /// Build services backed by `SQLite` storage and a directory of content packs.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or content loading fails.
    pub async fn new_sqlite(
        db_url: &str,
        content_dir: &Path,
        account: Option<&AccountId>,
        scoring: ScoringConfig,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let content: Arc<dyn ContentProvider> = Arc::new(load_content_dir(content_dir)?);
        let services = Self::new(&storage, content, account, scoring);
        tracing::debug!(
            languages = services.content.languages().len(),
            key = %services.progress.key(),
            "app services ready"
        );
        Ok(services)
    }

    #[must_use]
    pub fn content(&self) -> Arc<dyn ContentProvider> {
        Arc::clone(&self.content)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn placement(&self) -> Arc<PlacementService> {
        Arc::clone(&self.placement)
    }

    #[must_use]
    pub fn level_tests(&self) -> Arc<LevelTestService> {
        Arc::clone(&self.level_tests)
    }

    #[must_use]
    pub fn completion(&self) -> Arc<CompletionService> {
        Arc::clone(&self.completion)
    }
}
