pub mod content;
mod ids;
mod language;
mod level;
mod progress;
mod quiz;

pub use content::{
    ConjugationForm, ConjugationTable, ContentCategory, ContentItem, Example, GrammarLesson,
    LanguageModule, VocabItem, Verb,
};
pub use ids::{AccountId, ItemId, LanguageId, ParseIdError};
pub use language::{LANGUAGES, Language, ScriptType};
pub use level::{CefrLevel, LevelParseError};
pub use progress::UserProgress;
pub use quiz::QuizQuestion;
