//! Step-by-step state of one quiz attempt.
//!
//! Used for both the placement quiz and level tests:
//! `Idle -> Presenting { index, score } -> ... -> Finished { score }`.
//! Each question goes through select (which reveals correctness) and then
//! advance. `Finished` is terminal until [`QuizAttempt::retry`].

use thiserror::Error;

use crate::model::QuizQuestion;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AttemptError {
    #[error("question bank is empty")]
    EmptyBank,

    #[error("attempt is not presenting a question")]
    NotPresenting,

    #[error("attempt has already started")]
    AlreadyStarted,

    #[error("current question has already been answered")]
    AlreadyAnswered,

    #[error("current question has not been answered yet")]
    NotAnswered,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptState {
    Idle,
    Presenting {
        index: usize,
        score: u32,
        /// The revealed selection for the current question, if any.
        selected: Option<String>,
    },
    Finished {
        score: u32,
    },
}

/// In-memory attempt over a fixed question bank. Never persisted.
#[derive(Debug, Clone)]
pub struct QuizAttempt {
    questions: Vec<QuizQuestion>,
    state: AttemptState,
}

impl QuizAttempt {
    #[must_use]
    pub fn new(questions: Vec<QuizQuestion>) -> Self {
        Self {
            questions,
            state: AttemptState::Idle,
        }
    }

    /// Present the first question.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::EmptyBank` if there are no questions and
    /// `AttemptError::AlreadyStarted` unless the attempt is idle.
    pub fn start(&mut self) -> Result<(), AttemptError> {
        if self.state != AttemptState::Idle {
            return Err(AttemptError::AlreadyStarted);
        }
        if self.questions.is_empty() {
            return Err(AttemptError::EmptyBank);
        }
        self.state = AttemptState::Presenting {
            index: 0,
            score: 0,
            selected: None,
        };
        Ok(())
    }

    #[must_use]
    pub fn state(&self) -> &AttemptState {
        &self.state
    }

    #[must_use]
    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        match &self.state {
            AttemptState::Presenting { index, .. } => Some(*index),
            _ => None,
        }
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&QuizQuestion> {
        self.current_index().and_then(|i| self.questions.get(i))
    }

    /// The revealed selection for the current question.
    #[must_use]
    pub fn selected(&self) -> Option<&str> {
        match &self.state {
            AttemptState::Presenting { selected, .. } => selected.as_deref(),
            _ => None,
        }
    }

    /// Running score while presenting, final score once finished.
    #[must_use]
    pub fn score(&self) -> u32 {
        match &self.state {
            AttemptState::Idle => 0,
            AttemptState::Presenting { score, .. } | AttemptState::Finished { score } => *score,
        }
    }

    #[must_use]
    pub fn final_score(&self) -> Option<u32> {
        match &self.state {
            AttemptState::Finished { score } => Some(*score),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self.state, AttemptState::Finished { .. })
    }

    /// Select an option for the current question and reveal whether it was right.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::NotPresenting` outside of a running attempt and
    /// `AttemptError::AlreadyAnswered` if the question was already revealed.
    pub fn select(&mut self, option: impl Into<String>) -> Result<bool, AttemptError> {
        let AttemptState::Presenting {
            index, selected, ..
        } = &mut self.state
        else {
            return Err(AttemptError::NotPresenting);
        };
        if selected.is_some() {
            return Err(AttemptError::AlreadyAnswered);
        }
        let option = option.into();
        let correct = self
            .questions
            .get(*index)
            .is_some_and(|q| q.is_correct(&option));
        *selected = Some(option);
        Ok(correct)
    }

    /// Score the revealed selection and move on.
    ///
    /// Returns the final score when the last question was just scored.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::NotPresenting` outside of a running attempt and
    /// `AttemptError::NotAnswered` if nothing was selected yet.
    pub fn advance(&mut self) -> Result<Option<u32>, AttemptError> {
        let AttemptState::Presenting {
            index,
            score,
            selected,
        } = &self.state
        else {
            return Err(AttemptError::NotPresenting);
        };
        let Some(choice) = selected else {
            return Err(AttemptError::NotAnswered);
        };

        let correct = self
            .questions
            .get(*index)
            .is_some_and(|q| q.is_correct(choice));
        let score = if correct { score.saturating_add(1) } else { *score };
        let next = index + 1;

        if next >= self.questions.len() {
            self.state = AttemptState::Finished { score };
            Ok(Some(score))
        } else {
            self.state = AttemptState::Presenting {
                index: next,
                score,
                selected: None,
            };
            Ok(None)
        }
    }

    /// Discard all progress and return to `Idle`.
    pub fn retry(&mut self) {
        self.state = AttemptState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CefrLevel;

    fn bank(n: usize) -> Vec<QuizQuestion> {
        (0..n)
            .map(|i| QuizQuestion {
                id: format!("q{i}"),
                level: CefrLevel::A1,
                prompt: format!("Question {i}"),
                options: vec!["right".into(), "wrong".into()],
                answer: "right".into(),
                hint: None,
            })
            .collect()
    }

    #[test]
    fn empty_bank_cannot_start() {
        let mut attempt = QuizAttempt::new(Vec::new());
        assert_eq!(attempt.start(), Err(AttemptError::EmptyBank));
        assert_eq!(attempt.state(), &AttemptState::Idle);
    }

    #[test]
    fn walks_through_to_finished() {
        let mut attempt = QuizAttempt::new(bank(3));
        attempt.start().unwrap();

        assert!(attempt.select("right").unwrap());
        assert_eq!(attempt.advance().unwrap(), None);
        assert!(!attempt.select("wrong").unwrap());
        assert_eq!(attempt.advance().unwrap(), None);
        assert!(attempt.select("right").unwrap());
        assert_eq!(attempt.advance().unwrap(), Some(2));

        assert!(attempt.is_finished());
        assert_eq!(attempt.final_score(), Some(2));
        assert!(attempt.current_question().is_none());
    }

    #[test]
    fn advance_requires_selection() {
        let mut attempt = QuizAttempt::new(bank(2));
        attempt.start().unwrap();
        assert_eq!(attempt.advance(), Err(AttemptError::NotAnswered));
    }

    #[test]
    fn second_selection_is_rejected() {
        let mut attempt = QuizAttempt::new(bank(2));
        attempt.start().unwrap();
        attempt.select("wrong").unwrap();
        assert_eq!(attempt.select("right"), Err(AttemptError::AlreadyAnswered));
        assert_eq!(attempt.selected(), Some("wrong"));
    }

    #[test]
    fn finished_is_terminal_until_retry() {
        let mut attempt = QuizAttempt::new(bank(1));
        attempt.start().unwrap();
        attempt.select("right").unwrap();
        attempt.advance().unwrap();

        assert_eq!(attempt.select("right"), Err(AttemptError::NotPresenting));
        assert_eq!(attempt.start(), Err(AttemptError::AlreadyStarted));

        attempt.retry();
        assert_eq!(attempt.state(), &AttemptState::Idle);
        assert_eq!(attempt.score(), 0);
        attempt.start().unwrap();
        assert_eq!(attempt.current_index(), Some(0));
        assert_eq!(attempt.selected(), None);
    }

    #[test]
    fn case_mismatch_scores_zero() {
        let mut attempt = QuizAttempt::new(bank(1));
        attempt.start().unwrap();
        assert!(!attempt.select("Right").unwrap());
        assert_eq!(attempt.advance().unwrap(), Some(0));
    }
}
