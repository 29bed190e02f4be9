use serde::{Deserialize, Serialize};

use crate::model::{CefrLevel, ItemId, QuizQuestion};

/// A sentence shown alongside lessons, words and verbs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    pub native: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub romanized: Option<String>,
    pub translation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarLesson {
    pub id: ItemId,
    pub level: CefrLevel,
    pub title: String,
    pub explanation: String,
    #[serde(default)]
    pub examples: Vec<Example>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabItem {
    pub id: ItemId,
    pub level: CefrLevel,
    pub word: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub romanized: Option<String>,
    pub translation: String,
    /// Topic grouping such as "food" or "family".
    pub category: String,
    pub example: Example,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConjugationForm {
    pub pronoun: String,
    pub form: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub romanized: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConjugationTable {
    pub tense: String,
    pub forms: Vec<ConjugationForm>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verb {
    pub id: ItemId,
    pub level: CefrLevel,
    pub infinitive: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub romanized: Option<String>,
    pub meaning: String,
    #[serde(default)]
    pub conjugations: Vec<ConjugationTable>,
}

/// The three kinds of completable content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentCategory {
    Grammar,
    Vocabulary,
    Verbs,
}

impl ContentCategory {
    pub const ALL: [ContentCategory; 3] = [
        ContentCategory::Grammar,
        ContentCategory::Vocabulary,
        ContentCategory::Verbs,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ContentCategory::Grammar => "Grammar",
            ContentCategory::Vocabulary => "Vocabulary",
            ContentCategory::Verbs => "Verbs",
        }
    }
}

/// Borrowed view over any completable item, tagged by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentItem<'a> {
    Grammar(&'a GrammarLesson),
    Vocabulary(&'a VocabItem),
    Verb(&'a Verb),
}

impl<'a> ContentItem<'a> {
    #[must_use]
    pub fn id(&self) -> &'a ItemId {
        match self {
            ContentItem::Grammar(lesson) => &lesson.id,
            ContentItem::Vocabulary(item) => &item.id,
            ContentItem::Verb(verb) => &verb.id,
        }
    }

    #[must_use]
    pub fn level(&self) -> CefrLevel {
        match self {
            ContentItem::Grammar(lesson) => lesson.level,
            ContentItem::Vocabulary(item) => item.level,
            ContentItem::Verb(verb) => verb.level,
        }
    }

    #[must_use]
    pub fn category(&self) -> ContentCategory {
        match self {
            ContentItem::Grammar(_) => ContentCategory::Grammar,
            ContentItem::Vocabulary(_) => ContentCategory::Vocabulary,
            ContentItem::Verb(_) => ContentCategory::Verbs,
        }
    }
}

/// Everything a single language ships with.
///
/// Immutable once loaded. The serialized field names match the JSON content
/// packs (`placementQuestions`, `levelQuestions`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageModule {
    #[serde(default)]
    pub grammar: Vec<GrammarLesson>,
    #[serde(default)]
    pub vocab: Vec<VocabItem>,
    #[serde(default)]
    pub verbs: Vec<Verb>,
    #[serde(default)]
    pub placement_questions: Vec<QuizQuestion>,
    #[serde(default)]
    pub level_questions: Vec<QuizQuestion>,
}

impl LanguageModule {
    /// All items of one category, in content order.
    #[must_use]
    pub fn items(&self, category: ContentCategory) -> Vec<ContentItem<'_>> {
        match category {
            ContentCategory::Grammar => self.grammar.iter().map(ContentItem::Grammar).collect(),
            ContentCategory::Vocabulary => {
                self.vocab.iter().map(ContentItem::Vocabulary).collect()
            }
            ContentCategory::Verbs => self.verbs.iter().map(ContentItem::Verb).collect(),
        }
    }

    /// Items of one category tagged with `level`.
    #[must_use]
    pub fn items_at(&self, category: ContentCategory, level: CefrLevel) -> Vec<ContentItem<'_>> {
        self.items(category)
            .into_iter()
            .filter(|item| item.level() == level)
            .collect()
    }

    /// Look an item up by id across all categories.
    #[must_use]
    pub fn find_item(&self, id: &ItemId) -> Option<ContentItem<'_>> {
        ContentCategory::ALL
            .into_iter()
            .flat_map(|category| self.items(category))
            .find(|item| item.id() == id)
    }

    #[must_use]
    pub fn placement_questions(&self) -> &[QuizQuestion] {
        &self.placement_questions
    }

    /// The level-test bank for `level`, in content order.
    #[must_use]
    pub fn level_questions(&self, level: CefrLevel) -> Vec<QuizQuestion> {
        self.level_questions
            .iter()
            .filter(|q| q.level == level)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lesson(id: &str, level: CefrLevel) -> GrammarLesson {
        GrammarLesson {
            id: ItemId::new(id),
            level,
            title: format!("Lesson {id}"),
            explanation: String::new(),
            examples: Vec::new(),
        }
    }

    fn verb(id: &str, level: CefrLevel) -> Verb {
        Verb {
            id: ItemId::new(id),
            level,
            infinitive: "ser".into(),
            romanized: None,
            meaning: "to be".into(),
            conjugations: Vec::new(),
        }
    }

    #[test]
    fn items_at_filters_by_category_and_level() {
        let module = LanguageModule {
            grammar: vec![lesson("g1", CefrLevel::A1), lesson("g2", CefrLevel::A2)],
            verbs: vec![verb("v1", CefrLevel::A1)],
            ..LanguageModule::default()
        };

        let ids: Vec<&str> = module
            .items_at(ContentCategory::Grammar, CefrLevel::A1)
            .iter()
            .map(|item| item.id().as_str())
            .collect();
        assert_eq!(ids, vec!["g1"]);
        assert!(module
            .items_at(ContentCategory::Vocabulary, CefrLevel::A1)
            .is_empty());
    }

    #[test]
    fn find_item_reports_category() {
        let module = LanguageModule {
            grammar: vec![lesson("g1", CefrLevel::A1)],
            verbs: vec![verb("v1", CefrLevel::B1)],
            ..LanguageModule::default()
        };

        let found = module.find_item(&ItemId::new("v1")).unwrap();
        assert_eq!(found.category(), ContentCategory::Verbs);
        assert_eq!(found.level(), CefrLevel::B1);
        assert!(module.find_item(&ItemId::new("missing")).is_none());
    }

    #[test]
    fn deserializes_camel_case_pack() {
        let json = r#"{
            "grammar": [],
            "placementQuestions": [
                {"id": "p1", "level": "A1", "prompt": "?", "options": ["a", "b"], "answer": "a"}
            ]
        }"#;
        let module: LanguageModule = serde_json::from_str(json).unwrap();
        assert_eq!(module.placement_questions().len(), 1);
        assert!(module.level_questions.is_empty());
    }
}
