use std::sync::Arc;

use lingo_core::ContentProvider;
use lingo_core::attempt::{AttemptError, QuizAttempt};
use lingo_core::model::{CefrLevel, LanguageId, QuizQuestion};
use lingo_core::scoring::PlacementPolicy;

use crate::error::ProgressServiceError;
use crate::progress_service::ProgressService;

/// Finished placement quiz and the level it points to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementResult {
    pub score: u32,
    pub total: usize,
    pub suggested: CefrLevel,
}

/// One run through a language's placement questions.
///
/// Nothing is stored until the caller confirms a level through
/// [`PlacementService::confirm`].
#[derive(Debug, Clone)]
pub struct PlacementSession {
    language: LanguageId,
    attempt: QuizAttempt,
    policy: PlacementPolicy,
}

impl PlacementSession {
    #[must_use]
    pub fn language(&self) -> &LanguageId {
        &self.language
    }

    #[must_use]
    pub fn attempt(&self) -> &QuizAttempt {
        &self.attempt
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&QuizQuestion> {
        self.attempt.current_question()
    }

    /// Reveal whether `option` answers the current question.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError` if the quiz is over or the question was already answered.
    pub fn select(&mut self, option: impl Into<String>) -> Result<bool, AttemptError> {
        self.attempt.select(option)
    }

    /// Move past the answered question; yields the result after the last one.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError` if the quiz is over or nothing was selected.
    pub fn advance(&mut self) -> Result<Option<PlacementResult>, AttemptError> {
        Ok(self.attempt.advance()?.map(|score| self.result_for(score)))
    }

    /// The result, once every question has been answered.
    #[must_use]
    pub fn result(&self) -> Option<PlacementResult> {
        self.attempt.final_score().map(|score| self.result_for(score))
    }

    fn result_for(&self, score: u32) -> PlacementResult {
        PlacementResult {
            score,
            total: self.attempt.total(),
            suggested: self.policy.suggest(score),
        }
    }
}

/// Places a learner on a starting level for a language.
#[derive(Clone)]
pub struct PlacementService {
    content: Arc<dyn ContentProvider>,
    progress: Arc<ProgressService>,
    policy: PlacementPolicy,
}

impl PlacementService {
    #[must_use]
    pub fn new(content: Arc<dyn ContentProvider>, progress: Arc<ProgressService>) -> Self {
        Self::with_policy(content, progress, PlacementPolicy::default())
    }

    #[must_use]
    pub fn with_policy(
        content: Arc<dyn ContentProvider>,
        progress: Arc<ProgressService>,
        policy: PlacementPolicy,
    ) -> Self {
        Self {
            content,
            progress,
            policy,
        }
    }

    #[must_use]
    pub fn policy(&self) -> PlacementPolicy {
        self.policy
    }

    /// Begin a placement quiz presenting the first question.
    ///
    /// Returns `None` when the language is unknown or has no placement
    /// questions; a level can still be chosen by hand through `confirm`.
    #[must_use]
    pub fn start(&self, language: &LanguageId) -> Option<PlacementSession> {
        let module = self.content.module(language)?;
        let mut attempt = QuizAttempt::new(module.placement_questions().to_vec());
        if let Err(err) = attempt.start() {
            tracing::debug!(%language, error = %err, "placement quiz unavailable");
            return None;
        }
        Some(PlacementSession {
            language: language.clone(),
            attempt,
            policy: self.policy,
        })
    }

    /// Store the chosen starting level, suggested or picked manually.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError` if the level cannot be stored.
    pub async fn confirm(
        &self,
        language: &LanguageId,
        level: CefrLevel,
    ) -> Result<(), ProgressServiceError> {
        self.progress.set_current_level(language, level).await?;
        tracing::info!(%language, level = %level, "starting level confirmed");
        Ok(())
    }
}
