use std::sync::Arc;

use lingo_core::ContentProvider;
use lingo_core::completion::{CompletionFilter, LevelProgress, category_progress};
use lingo_core::model::{CefrLevel, ContentCategory, ItemId, LanguageId};

use crate::progress_service::ProgressService;

/// Summary of one started language, as shown on the profile page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageOverview {
    pub language: LanguageId,
    pub level: CefrLevel,
    /// `None` when no content is installed for the language.
    pub progress: Option<LevelProgress>,
}

/// Read-only completion figures joined from stored progress and content.
#[derive(Clone)]
pub struct CompletionService {
    content: Arc<dyn ContentProvider>,
    progress: Arc<ProgressService>,
}

impl CompletionService {
    #[must_use]
    pub fn new(content: Arc<dyn ContentProvider>, progress: Arc<ProgressService>) -> Self {
        Self { content, progress }
    }

    /// Share of `category` items at `level` marked complete, in `[0, 1]`.
    ///
    /// Zero when there are no such items or the language is unknown.
    pub async fn fraction(
        &self,
        language: &LanguageId,
        level: CefrLevel,
        category: ContentCategory,
    ) -> f64 {
        let Some(module) = self.content.module(language) else {
            return 0.0;
        };
        let completed = self.progress.completed_lessons(language).await;
        category_progress(&module, &completed, level, category).fraction()
    }

    pub async fn level_progress(
        &self,
        language: &LanguageId,
        level: CefrLevel,
    ) -> Option<LevelProgress> {
        let module = self.content.module(language)?;
        let completed = self.progress.completed_lessons(language).await;
        Some(LevelProgress::compute(&module, &completed, level))
    }

    /// Progress at the learner's current level.
    pub async fn dashboard(&self, language: &LanguageId) -> Option<LevelProgress> {
        let module = self.content.module(language)?;
        let snapshot = self.progress.snapshot().await;
        let completed = snapshot.completed(language).cloned().unwrap_or_default();
        Some(LevelProgress::compute(
            &module,
            &completed,
            snapshot.level(language),
        ))
    }

    /// One entry per started language, in id order.
    pub async fn language_overviews(&self) -> Vec<LanguageOverview> {
        let snapshot = self.progress.snapshot().await;
        snapshot
            .started_languages()
            .into_iter()
            .map(|language| {
                let level = snapshot.level(&language);
                let progress = self.content.module(&language).map(|module| {
                    let completed = snapshot.completed(&language).cloned().unwrap_or_default();
                    LevelProgress::compute(&module, &completed, level)
                });
                LanguageOverview {
                    language,
                    level,
                    progress,
                }
            })
            .collect()
    }

    /// Ids of the items at `level` in `category` that pass `filter`, in content order.
    pub async fn filter_items(
        &self,
        language: &LanguageId,
        level: CefrLevel,
        category: ContentCategory,
        filter: CompletionFilter,
    ) -> Vec<ItemId> {
        let Some(module) = self.content.module(language) else {
            return Vec::new();
        };
        let completed = self.progress.completed_lessons(language).await;
        filter
            .apply(module.items_at(category, level), &completed)
            .into_iter()
            .map(|item| item.id().clone())
            .collect()
    }
}
