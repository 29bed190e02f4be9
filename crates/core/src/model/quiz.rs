use serde::{Deserialize, Serialize};

use crate::model::CefrLevel;

/// A multiple-choice question from a placement quiz or a level test bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub id: String,
    pub level: CefrLevel,
    pub prompt: String,
    pub options: Vec<String>,
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl QuizQuestion {
    /// Exact string comparison against the designated answer.
    ///
    /// No trimming, case folding or partial credit.
    #[must_use]
    pub fn is_correct(&self, selected: &str) -> bool {
        selected == self.answer
    }
}
