//! Score-to-level rules for the placement quiz and level tests.
//!
//! The defaults are absolute scores tuned for a 10-question placement quiz
//! and 15-question level tests. They do not rescale when a bank has a
//! different length; [`PassThreshold::Fraction`] is available when that is
//! wanted.

use crate::model::{CefrLevel, QuizQuestion};

/// Placement quiz length the default breakpoints assume.
pub const PLACEMENT_QUIZ_LENGTH: usize = 10;

/// Level test length the default pass score assumes.
pub const LEVEL_TEST_LENGTH: usize = 15;

/// Default score needed to pass a level test.
pub const DEFAULT_PASS_SCORE: u32 = 12;

/// Number of answers that exactly match their question's answer.
pub fn score_answers<'a, I>(answers: I) -> u32
where
    I: IntoIterator<Item = (&'a QuizQuestion, &'a str)>,
{
    answers
        .into_iter()
        .filter(|(question, selected)| question.is_correct(selected))
        .fold(0_u32, |acc, _| acc.saturating_add(1))
}

//
// ─── PLACEMENT ─────────────────────────────────────────────────────────────────
//

/// Minimum placement scores for each suggested starting level.
///
/// Anything below `a2_min` starts at A1. C1 is never suggested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementPolicy {
    pub b2_min: u32,
    pub b1_min: u32,
    pub a2_min: u32,
}

impl Default for PlacementPolicy {
    fn default() -> Self {
        Self {
            b2_min: 9,
            b1_min: 7,
            a2_min: 5,
        }
    }
}

impl PlacementPolicy {
    #[must_use]
    pub fn suggest(&self, score: u32) -> CefrLevel {
        if score >= self.b2_min {
            CefrLevel::B2
        } else if score >= self.b1_min {
            CefrLevel::B1
        } else if score >= self.a2_min {
            CefrLevel::A2
        } else {
            CefrLevel::A1
        }
    }
}

//
// ─── LEVEL TEST ────────────────────────────────────────────────────────────────
//

/// Bar a level test score has to reach.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PassThreshold {
    /// Fixed number of correct answers regardless of bank length.
    Absolute(u32),
    /// Share of the bank, clamped to `[0, 1]` and rounded up.
    Fraction(f64),
}

const BASIS_POINTS: u64 = 10_000;

impl Default for PassThreshold {
    fn default() -> Self {
        PassThreshold::Absolute(DEFAULT_PASS_SCORE)
    }
}

impl PassThreshold {
    /// Correct answers required for a bank of `total` questions.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn required_score(&self, total: usize) -> u32 {
        match *self {
            PassThreshold::Absolute(score) => score,
            PassThreshold::Fraction(share) => {
                let share = if share.is_finite() {
                    share.clamp(0.0, 1.0)
                } else {
                    1.0
                };
                // Whole basis points, so exact multiples never round up.
                let bps = (share * BASIS_POINTS as f64).round() as u64;
                let required = bps.saturating_mul(total as u64).div_ceil(BASIS_POINTS);
                u32::try_from(required).unwrap_or(u32::MAX)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LevelTestPolicy {
    pub threshold: PassThreshold,
}

impl LevelTestPolicy {
    #[must_use]
    pub fn new(threshold: PassThreshold) -> Self {
        Self { threshold }
    }

    /// Decide pass/fail for a finished test taken at `level`.
    #[must_use]
    pub fn evaluate(&self, level: CefrLevel, score: u32, total: usize) -> LevelTestOutcome {
        let passed = score >= self.threshold.required_score(total);
        LevelTestOutcome {
            level,
            score,
            total,
            passed,
            next_level: if passed { level.next() } else { None },
        }
    }
}

/// Result of a finished level test. Does not change any stored state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelTestOutcome {
    pub level: CefrLevel,
    pub score: u32,
    pub total: usize,
    pub passed: bool,
    /// The level offered for advancement; only set on a pass below C1.
    pub next_level: Option<CefrLevel>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelVerdict {
    Advance(CefrLevel),
    HighestLevelReached,
    Failed,
}

impl LevelTestOutcome {
    #[must_use]
    pub fn verdict(&self) -> LevelVerdict {
        match (self.passed, self.next_level) {
            (false, _) => LevelVerdict::Failed,
            (true, Some(next)) => LevelVerdict::Advance(next),
            (true, None) => LevelVerdict::HighestLevelReached,
        }
    }
}
