use std::collections::{BTreeMap, BTreeSet};

use crate::model::{CefrLevel, ItemId, LanguageId};

/// Per-device learning state: focus language, levels and completed items.
///
/// A language is "started" once it has an entry in the level map. Completed
/// items are a historical record and survive level changes; only
/// [`UserProgress::reset_language`] drops them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserProgress {
    selected_language: Option<LanguageId>,
    levels: BTreeMap<LanguageId, CefrLevel>,
    completed_lessons: BTreeMap<LanguageId, BTreeSet<ItemId>>,
}

impl UserProgress {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rehydrate progress from persisted parts.
    #[must_use]
    pub fn from_persisted(
        selected_language: Option<LanguageId>,
        levels: BTreeMap<LanguageId, CefrLevel>,
        completed_lessons: BTreeMap<LanguageId, BTreeSet<ItemId>>,
    ) -> Self {
        Self {
            selected_language,
            levels,
            completed_lessons,
        }
    }

    #[must_use]
    pub fn selected_language(&self) -> Option<&LanguageId> {
        self.selected_language.as_ref()
    }

    pub fn set_selected_language(&mut self, language: LanguageId) {
        self.selected_language = Some(language);
    }

    /// Stored level for `language`, or A1 when none was ever set.
    #[must_use]
    pub fn level(&self, language: &LanguageId) -> CefrLevel {
        self.levels.get(language).copied().unwrap_or_default()
    }

    pub fn set_level(&mut self, language: LanguageId, level: CefrLevel) {
        self.levels.insert(language, level);
    }

    #[must_use]
    pub fn levels(&self) -> &BTreeMap<LanguageId, CefrLevel> {
        &self.levels
    }

    #[must_use]
    pub fn completed(&self, language: &LanguageId) -> Option<&BTreeSet<ItemId>> {
        self.completed_lessons.get(language)
    }

    #[must_use]
    pub fn completed_lessons(&self) -> &BTreeMap<LanguageId, BTreeSet<ItemId>> {
        &self.completed_lessons
    }

    #[must_use]
    pub fn is_completed(&self, language: &LanguageId, item: &ItemId) -> bool {
        self.completed_lessons
            .get(language)
            .is_some_and(|items| items.contains(item))
    }

    /// Record `item` as done. Returns `false` if it was already recorded.
    pub fn mark_completed(&mut self, language: LanguageId, item: ItemId) -> bool {
        if self.is_completed(&language, &item) {
            return false;
        }
        self.completed_lessons
            .entry(language)
            .or_default()
            .insert(item)
    }

    /// Languages with an explicit level, in id order.
    #[must_use]
    pub fn started_languages(&self) -> Vec<LanguageId> {
        self.levels.keys().cloned().collect()
    }

    #[must_use]
    pub fn is_started(&self, language: &LanguageId) -> bool {
        self.levels.contains_key(language)
    }

    /// Drop the level and completed set of one language.
    ///
    /// Clears the selected language if it pointed at `language`.
    pub fn reset_language(&mut self, language: &LanguageId) {
        self.levels.remove(language);
        self.completed_lessons.remove(language);
        if self.selected_language.as_ref() == Some(language) {
            self.selected_language = None;
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selected_language.is_none()
            && self.levels.is_empty()
            && self.completed_lessons.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lang(id: &str) -> LanguageId {
        LanguageId::new(id)
    }

    #[test]
    fn unknown_language_defaults_to_a1() {
        let progress = UserProgress::new();
        assert_eq!(progress.level(&lang("es")), CefrLevel::A1);
        assert!(!progress.is_started(&lang("es")));
    }

    #[test]
    fn mark_completed_is_idempotent() {
        let mut progress = UserProgress::new();
        assert!(progress.mark_completed(lang("es"), ItemId::new("es-g-a1-1")));
        let once = progress.clone();
        assert!(!progress.mark_completed(lang("es"), ItemId::new("es-g-a1-1")));
        assert_eq!(progress, once);
        assert_eq!(progress.completed(&lang("es")).map(BTreeSet::len), Some(1));
    }

    #[test]
    fn completion_survives_level_change() {
        let mut progress = UserProgress::new();
        progress.set_level(lang("fr"), CefrLevel::A1);
        progress.mark_completed(lang("fr"), ItemId::new("fr-v-a1-1"));
        progress.set_level(lang("fr"), CefrLevel::A2);
        assert!(progress.is_completed(&lang("fr"), &ItemId::new("fr-v-a1-1")));
    }

    #[test]
    fn reset_language_leaves_other_languages_untouched() {
        let mut progress = UserProgress::new();
        progress.set_level(lang("es"), CefrLevel::B1);
        progress.set_level(lang("ja"), CefrLevel::A2);
        progress.mark_completed(lang("es"), ItemId::new("es-1"));
        progress.mark_completed(lang("ja"), ItemId::new("ja-1"));
        let ja_level = progress.levels().get(&lang("ja")).copied();
        let ja_done = progress.completed(&lang("ja")).cloned();

        progress.reset_language(&lang("es"));

        assert!(!progress.is_started(&lang("es")));
        assert!(progress.completed(&lang("es")).is_none());
        assert_eq!(progress.levels().get(&lang("ja")).copied(), ja_level);
        assert_eq!(progress.completed(&lang("ja")).cloned(), ja_done);
    }

    #[test]
    fn reset_language_clears_matching_selection_only() {
        let mut progress = UserProgress::new();
        progress.set_selected_language(lang("es"));
        progress.reset_language(&lang("ja"));
        assert_eq!(progress.selected_language(), Some(&lang("es")));

        progress.reset_language(&lang("es"));
        assert_eq!(progress.selected_language(), None);
    }

    #[test]
    fn started_languages_ignore_completion_only_entries() {
        let mut progress = UserProgress::new();
        progress.set_level(lang("ko"), CefrLevel::A1);
        progress.mark_completed(lang("it"), ItemId::new("it-1"));
        assert_eq!(progress.started_languages(), vec![lang("ko")]);
    }
}
