use std::collections::HashMap;
use std::sync::Arc;

use crate::model::{LanguageId, LanguageModule};

/// Read-only source of per-language content bundles.
///
/// `None` means the language is unknown. Callers render a not-found state
/// instead of treating it as an error.
pub trait ContentProvider: Send + Sync {
    fn module(&self, language: &LanguageId) -> Option<Arc<LanguageModule>>;

    /// Languages this provider has content for, in id order.
    fn languages(&self) -> Vec<LanguageId>;
}

/// Content provider backed by modules held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryContentProvider {
    modules: HashMap<LanguageId, Arc<LanguageModule>>,
}

impl InMemoryContentProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_module(mut self, language: LanguageId, module: LanguageModule) -> Self {
        self.insert(language, module);
        self
    }

    pub fn insert(&mut self, language: LanguageId, module: LanguageModule) {
        self.modules.insert(language, Arc::new(module));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl ContentProvider for InMemoryContentProvider {
    fn module(&self, language: &LanguageId) -> Option<Arc<LanguageModule>> {
        self.modules.get(language).map(Arc::clone)
    }

    fn languages(&self) -> Vec<LanguageId> {
        let mut ids: Vec<LanguageId> = self.modules.keys().cloned().collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_language_resolves_to_none() {
        let provider = InMemoryContentProvider::new()
            .with_module(LanguageId::new("es"), LanguageModule::default());
        assert!(provider.module(&LanguageId::new("es")).is_some());
        assert!(provider.module(&LanguageId::new("xx")).is_none());
    }

    #[test]
    fn languages_are_sorted() {
        let provider = InMemoryContentProvider::new()
            .with_module(LanguageId::new("ko"), LanguageModule::default())
            .with_module(LanguageId::new("es"), LanguageModule::default());
        assert_eq!(
            provider.languages(),
            vec![LanguageId::new("es"), LanguageId::new("ko")]
        );
    }
}
