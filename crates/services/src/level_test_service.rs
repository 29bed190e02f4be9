use std::sync::Arc;

use lingo_core::ContentProvider;
use lingo_core::attempt::{AttemptError, QuizAttempt};
use lingo_core::model::{CefrLevel, LanguageId, QuizQuestion};
use lingo_core::scoring::{LevelTestOutcome, LevelTestPolicy};

use crate::error::QuizFlowError;
use crate::progress_service::ProgressService;

/// What `LevelTestService::start` found for a language.
#[derive(Debug, Clone)]
pub enum LevelTestAvailability {
    UnknownLanguage,
    /// The language exists but has no test for the learner's current level.
    NoQuestions { level: CefrLevel },
    Ready(LevelTestSession),
}

/// A level test taken at a fixed level.
///
/// Finishing only produces a [`LevelTestOutcome`]; moving up is a separate
/// call to [`LevelTestService::advance`].
#[derive(Debug, Clone)]
pub struct LevelTestSession {
    language: LanguageId,
    level: CefrLevel,
    attempt: QuizAttempt,
    policy: LevelTestPolicy,
}

impl LevelTestSession {
    #[must_use]
    pub fn language(&self) -> &LanguageId {
        &self.language
    }

    #[must_use]
    pub fn level(&self) -> CefrLevel {
        self.level
    }

    #[must_use]
    pub fn attempt(&self) -> &QuizAttempt {
        &self.attempt
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&QuizQuestion> {
        self.attempt.current_question()
    }

    /// # Errors
    ///
    /// Returns `AttemptError` if the test is over or the question was already answered.
    pub fn select(&mut self, option: impl Into<String>) -> Result<bool, AttemptError> {
        self.attempt.select(option)
    }

    /// # Errors
    ///
    /// Returns `AttemptError` if the test is over or nothing was selected.
    pub fn advance(&mut self) -> Result<Option<LevelTestOutcome>, AttemptError> {
        Ok(self.attempt.advance()?.map(|score| self.outcome_for(score)))
    }

    #[must_use]
    pub fn outcome(&self) -> Option<LevelTestOutcome> {
        self.attempt.final_score().map(|score| self.outcome_for(score))
    }

    /// Throw the current run away and present the first question again.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::EmptyBank` if the bank is empty.
    pub fn retry(&mut self) -> Result<(), AttemptError> {
        self.attempt.retry();
        self.attempt.start()
    }

    fn outcome_for(&self, score: u32) -> LevelTestOutcome {
        self.policy.evaluate(self.level, score, self.attempt.total())
    }
}

/// Runs tests that gate advancement from one level to the next.
#[derive(Clone)]
pub struct LevelTestService {
    content: Arc<dyn ContentProvider>,
    progress: Arc<ProgressService>,
    policy: LevelTestPolicy,
}

impl LevelTestService {
    #[must_use]
    pub fn new(content: Arc<dyn ContentProvider>, progress: Arc<ProgressService>) -> Self {
        Self::with_policy(content, progress, LevelTestPolicy::default())
    }

    #[must_use]
    pub fn with_policy(
        content: Arc<dyn ContentProvider>,
        progress: Arc<ProgressService>,
        policy: LevelTestPolicy,
    ) -> Self {
        Self {
            content,
            progress,
            policy,
        }
    }

    #[must_use]
    pub fn policy(&self) -> LevelTestPolicy {
        self.policy
    }

    /// Begin the test for the learner's current level in `language`.
    pub async fn start(&self, language: &LanguageId) -> LevelTestAvailability {
        let Some(module) = self.content.module(language) else {
            return LevelTestAvailability::UnknownLanguage;
        };
        let level = self.progress.current_level(language).await;
        let mut attempt = QuizAttempt::new(module.level_questions(level));
        if attempt.start().is_err() {
            return LevelTestAvailability::NoQuestions { level };
        }
        tracing::debug!(%language, %level, questions = attempt.total(), "level test started");
        LevelTestAvailability::Ready(LevelTestSession {
            language: language.clone(),
            level,
            attempt,
            policy: self.policy,
        })
    }

    /// Move the learner up after a passed test.
    ///
    /// Returns the stored level, or `None` when the test was failed or was
    /// already taken at the highest level. Nothing is written in that case.
    ///
    /// # Errors
    ///
    /// Returns `QuizFlowError::Progress` if the new level cannot be stored.
    pub async fn advance(
        &self,
        language: &LanguageId,
        outcome: &LevelTestOutcome,
    ) -> Result<Option<CefrLevel>, QuizFlowError> {
        let Some(next) = outcome.passed.then_some(outcome.next_level).flatten() else {
            return Ok(None);
        };
        self.progress.set_current_level(language, next).await?;
        tracing::info!(%language, from = %outcome.level, to = %next, "advanced level");
        Ok(Some(next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use lingo_core::InMemoryContentProvider;
    use lingo_core::model::LanguageModule;
    use lingo_core::scoring::{LevelVerdict, PassThreshold};
    use storage::repository::InMemoryRepository;

    fn bank(level: CefrLevel, n: usize) -> Vec<QuizQuestion> {
        (0..n)
            .map(|i| QuizQuestion {
                id: format!("{}-{i}", level.code()),
                level,
                prompt: format!("{} question {i}", level.code()),
                options: vec!["yes".into(), "no".into()],
                answer: "yes".into(),
                hint: None,
            })
            .collect()
    }

    fn fixture(policy: LevelTestPolicy) -> (LevelTestService, Arc<ProgressService>) {
        let mut questions = bank(CefrLevel::A1, 15);
        questions.extend(bank(CefrLevel::C1, 15));
        let module = LanguageModule {
            level_questions: questions,
            ..LanguageModule::default()
        };
        let content = InMemoryContentProvider::new().with_module(LanguageId::new("es"), module);
        let progress = Arc::new(ProgressService::new(Arc::new(InMemoryRepository::new())));
        (
            LevelTestService::with_policy(Arc::new(content), Arc::clone(&progress), policy),
            progress,
        )
    }

    fn run(session: &mut LevelTestSession, correct: usize) -> LevelTestOutcome {
        let mut answered = 0;
        loop {
            let option = if answered < correct { "yes" } else { "no" };
            session.select(option).unwrap();
            answered += 1;
            if let Some(outcome) = session.advance().unwrap() {
                return outcome;
            }
        }
    }

    fn ready(availability: LevelTestAvailability) -> LevelTestSession {
        match availability {
            LevelTestAvailability::Ready(session) => session,
            other => panic!("expected a ready test, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn pass_offers_next_level_without_storing_it() {
        let (service, progress) = fixture(LevelTestPolicy::default());
        let es = LanguageId::new("es");
        let mut session = ready(service.start(&es).await);
        assert_eq!(session.level(), CefrLevel::A1);

        let outcome = run(&mut session, 12);
        assert!(outcome.passed);
        assert_eq!(outcome.verdict(), LevelVerdict::Advance(CefrLevel::A2));
        assert_eq!(progress.current_level(&es).await, CefrLevel::A1);

        let stored = service.advance(&es, &outcome).await.unwrap();
        assert_eq!(stored, Some(CefrLevel::A2));
        assert_eq!(progress.current_level(&es).await, CefrLevel::A2);
    }

    #[tokio::test]
    async fn failed_test_never_advances() {
        let (service, progress) = fixture(LevelTestPolicy::default());
        let es = LanguageId::new("es");
        let mut session = ready(service.start(&es).await);

        let outcome = run(&mut session, 11);
        assert_eq!(outcome.verdict(), LevelVerdict::Failed);
        assert_eq!(service.advance(&es, &outcome).await.unwrap(), None);
        assert!(progress.started_languages().await.is_empty());
    }

    #[tokio::test]
    async fn highest_level_pass_has_nothing_to_advance_to() {
        let (service, progress) = fixture(LevelTestPolicy::default());
        let es = LanguageId::new("es");
        progress.set_current_level(&es, CefrLevel::C1).await.unwrap();
        let mut session = ready(service.start(&es).await);
        assert_eq!(session.level(), CefrLevel::C1);

        let outcome = run(&mut session, 15);
        assert_eq!(outcome.verdict(), LevelVerdict::HighestLevelReached);
        assert_eq!(service.advance(&es, &outcome).await.unwrap(), None);
        assert_eq!(progress.current_level(&es).await, CefrLevel::C1);
    }

    #[tokio::test]
    async fn missing_bank_and_unknown_language_are_reported() {
        let (service, progress) = fixture(LevelTestPolicy::default());
        let es = LanguageId::new("es");
        progress.set_current_level(&es, CefrLevel::B1).await.unwrap();

        assert!(matches!(
            service.start(&es).await,
            LevelTestAvailability::NoQuestions {
                level: CefrLevel::B1
            }
        ));
        assert!(matches!(
            service.start(&LanguageId::new("de")).await,
            LevelTestAvailability::UnknownLanguage
        ));
    }

    #[tokio::test]
    async fn retry_resets_score() {
        let (service, _) = fixture(LevelTestPolicy::default());
        let mut session = ready(service.start(&LanguageId::new("es")).await);
        let first = run(&mut session, 3);
        assert!(!first.passed);

        session.retry().unwrap();
        assert_eq!(session.attempt().score(), 0);
        assert_eq!(session.attempt().current_index(), Some(0));
        assert_eq!(session.outcome(), None);

        let second = run(&mut session, 15);
        assert!(second.passed);
        assert_eq!(session.outcome(), Some(second));
    }

    #[tokio::test]
    async fn fractional_threshold_scales_with_bank() {
        let (service, _) = fixture(LevelTestPolicy::new(PassThreshold::Fraction(0.8)));
        let mut session = ready(service.start(&LanguageId::new("es")).await);
        assert!(run(&mut session, 12).passed);
        session.retry().unwrap();
        assert!(!run(&mut session, 11).passed);
    }
}
