use crate::model::LanguageId;

/// Writing system a language is taught in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptType {
    Latin,
    HiraganaKanji,
    Hangul,
}

/// Display metadata for a supported language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    pub id: &'static str,
    pub name: &'static str,
    pub native_name: &'static str,
    pub flag: &'static str,
    pub script: ScriptType,
}

/// Languages the application ships content for.
pub const LANGUAGES: [Language; 5] = [
    Language {
        id: "es",
        name: "Spanish",
        native_name: "Español",
        flag: "🇪🇸",
        script: ScriptType::Latin,
    },
    Language {
        id: "fr",
        name: "French",
        native_name: "Français",
        flag: "🇫🇷",
        script: ScriptType::Latin,
    },
    Language {
        id: "it",
        name: "Italian",
        native_name: "Italiano",
        flag: "🇮🇹",
        script: ScriptType::Latin,
    },
    Language {
        id: "ja",
        name: "Japanese",
        native_name: "日本語",
        flag: "🇯🇵",
        script: ScriptType::HiraganaKanji,
    },
    Language {
        id: "ko",
        name: "Korean",
        native_name: "한국어",
        flag: "🇰🇷",
        script: ScriptType::Hangul,
    },
];

impl Language {
    #[must_use]
    pub fn find(id: &LanguageId) -> Option<&'static Language> {
        LANGUAGES.iter().find(|lang| lang.id == id.as_str())
    }

    #[must_use]
    pub fn language_id(&self) -> LanguageId {
        LanguageId::new(self.id)
    }
}
