use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::*;

/// Named presets fixing the board size and mine density.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    #[serde(rename = "Very Easy")]
    VeryEasy,
    #[serde(rename = "Easy")]
    Easy,
    #[default]
    #[serde(rename = "Normal")]
    Normal,
    #[serde(rename = "Hard")]
    Hard,
    #[serde(rename = "Very Hard")]
    VeryHard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 5] = [
        Self::VeryEasy,
        Self::Easy,
        Self::Normal,
        Self::Hard,
        Self::VeryHard,
    ];

    pub const fn label(self) -> &'static str {
        use Difficulty::*;
        match self {
            VeryEasy => "Very Easy",
            Easy => "Easy",
            Normal => "Normal",
            Hard => "Hard",
            VeryHard => "Very Hard",
        }
    }

    /// Board size as `(rows, cols)`.
    pub const fn size(self) -> Coord2 {
        use Difficulty::*;
        match self {
            VeryEasy => (16, 16),
            Easy => (16, 20),
            Normal => (16, 24),
            Hard => (20, 24),
            VeryHard => (24, 30),
        }
    }

    /// One in this many cells is a mine.
    pub const fn mine_divisor(self) -> CellCount {
        use Difficulty::*;
        match self {
            VeryEasy => 20,
            Easy => 8,
            Normal => 5,
            Hard => 4,
            VeryHard => 3,
        }
    }

    pub const fn game_config(self) -> GameConfig {
        let size = self.size();
        GameConfig::new_unchecked(size, mult(size.0, size.1) / self.mine_divisor())
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown difficulty: {0:?}")]
pub struct UnknownDifficulty(pub String);

impl FromStr for Difficulty {
    type Err = UnknownDifficulty;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tier| tier.label() == s)
            .ok_or_else(|| UnknownDifficulty(s.to_owned()))
    }
}
