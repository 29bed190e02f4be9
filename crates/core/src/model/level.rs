use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// CEFR proficiency tier, restricted to A1 through C1.
///
/// The derived ordering follows the advancement sequence, so `A1 < C1`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum CefrLevel {
    #[default]
    A1,
    A2,
    B1,
    B2,
    C1,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown CEFR level: {raw:?}")]
pub struct LevelParseError {
    raw: String,
}

impl CefrLevel {
    /// Every level in advancement order.
    pub const ALL: [CefrLevel; 5] = [
        CefrLevel::A1,
        CefrLevel::A2,
        CefrLevel::B1,
        CefrLevel::B2,
        CefrLevel::C1,
    ];

    /// Position of the level inside [`CefrLevel::ALL`].
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            CefrLevel::A1 => 0,
            CefrLevel::A2 => 1,
            CefrLevel::B1 => 2,
            CefrLevel::B2 => 3,
            CefrLevel::C1 => 4,
        }
    }

    /// The level unlocked by passing this level's test, if any.
    #[must_use]
    pub fn next(self) -> Option<CefrLevel> {
        Self::ALL.get(self.index() + 1).copied()
    }

    #[must_use]
    pub fn is_highest(self) -> bool {
        self.next().is_none()
    }

    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            CefrLevel::A1 => "A1",
            CefrLevel::A2 => "A2",
            CefrLevel::B1 => "B1",
            CefrLevel::B2 => "B2",
            CefrLevel::C1 => "C1",
        }
    }

    /// Human readable tier name.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            CefrLevel::A1 => "Beginner",
            CefrLevel::A2 => "Elementary",
            CefrLevel::B1 => "Intermediate",
            CefrLevel::B2 => "Upper Intermediate",
            CefrLevel::C1 => "Advanced",
        }
    }
}

impl fmt::Display for CefrLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for CefrLevel {
    type Err = LevelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.code() == s)
            .ok_or_else(|| LevelParseError { raw: s.to_owned() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_totally_ordered() {
        for pair in CefrLevel::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn next_walks_the_sequence() {
        assert_eq!(CefrLevel::A1.next(), Some(CefrLevel::A2));
        assert_eq!(CefrLevel::B2.next(), Some(CefrLevel::C1));
        assert_eq!(CefrLevel::C1.next(), None);
        assert!(CefrLevel::C1.is_highest());
    }

    #[test]
    fn parse_requires_exact_code() {
        assert_eq!("B1".parse::<CefrLevel>().unwrap(), CefrLevel::B1);
        assert!("b1".parse::<CefrLevel>().is_err());
        assert!("C2".parse::<CefrLevel>().is_err());
    }

    #[test]
    fn serde_uses_codes() {
        let json = serde_json::to_string(&CefrLevel::B2).unwrap();
        assert_eq!(json, "\"B2\"");
        let back: CefrLevel = serde_json::from_str("\"A2\"").unwrap();
        assert_eq!(back, CefrLevel::A2);
    }
}
