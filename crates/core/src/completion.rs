//! Progress fractions per content category.

use std::collections::BTreeSet;

use crate::model::{CefrLevel, ContentCategory, ContentItem, ItemId, LanguageModule};

/// Completed items out of the items available for one category and level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryProgress {
    pub completed: usize,
    pub total: usize,
}

impl CategoryProgress {
    /// `completed / total`, or 0 when there is nothing to complete.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.completed as f64 / self.total as f64
    }

    #[must_use]
    pub fn percent(&self) -> f64 {
        self.fraction() * 100.0
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }
}

/// Count how many of the category's items at `level` are in `completed`.
///
/// Completed ids from other levels or unknown items are ignored.
#[must_use]
pub fn category_progress(
    module: &LanguageModule,
    completed: &BTreeSet<ItemId>,
    level: CefrLevel,
    category: ContentCategory,
) -> CategoryProgress {
    let items = module.items_at(category, level);
    CategoryProgress {
        completed: items
            .iter()
            .filter(|item| completed.contains(item.id()))
            .count(),
        total: items.len(),
    }
}

/// Dashboard breakdown of one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelProgress {
    pub level: CefrLevel,
    pub grammar: CategoryProgress,
    pub vocabulary: CategoryProgress,
    pub verbs: CategoryProgress,
}

impl LevelProgress {
    #[must_use]
    pub fn compute(
        module: &LanguageModule,
        completed: &BTreeSet<ItemId>,
        level: CefrLevel,
    ) -> Self {
        Self {
            level,
            grammar: category_progress(module, completed, level, ContentCategory::Grammar),
            vocabulary: category_progress(module, completed, level, ContentCategory::Vocabulary),
            verbs: category_progress(module, completed, level, ContentCategory::Verbs),
        }
    }

    #[must_use]
    pub fn category(&self, category: ContentCategory) -> CategoryProgress {
        match category {
            ContentCategory::Grammar => self.grammar,
            ContentCategory::Vocabulary => self.vocabulary,
            ContentCategory::Verbs => self.verbs,
        }
    }

    /// All three categories summed.
    #[must_use]
    pub fn overall(&self) -> CategoryProgress {
        CategoryProgress {
            completed: self.grammar.completed + self.vocabulary.completed + self.verbs.completed,
            total: self.grammar.total + self.vocabulary.total + self.verbs.total,
        }
    }
}

/// List filter for item views.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompletionFilter {
    #[default]
    All,
    Todo,
    Done,
}

impl CompletionFilter {
    #[must_use]
    pub fn matches(self, completed: bool) -> bool {
        match self {
            CompletionFilter::All => true,
            CompletionFilter::Todo => !completed,
            CompletionFilter::Done => completed,
        }
    }

    /// Keep the items whose completion state passes the filter.
    #[must_use]
    pub fn apply<'a>(
        self,
        items: Vec<ContentItem<'a>>,
        completed: &BTreeSet<ItemId>,
    ) -> Vec<ContentItem<'a>> {
        items
            .into_iter()
            .filter(|item| self.matches(completed.contains(item.id())))
            .collect()
    }
}
