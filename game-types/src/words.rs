use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Difficulty {
    Easy,
    Normal,
    Hard,
    Insane,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Normal,
        Difficulty::Hard,
        Difficulty::Insane,
    ];

    /// Points awarded for a correct guess of a word in this tier.
    pub fn points(&self) -> i32 {
        match self {
            Difficulty::Easy => 10,
            Difficulty::Normal => 20,
            Difficulty::Hard => 25,
            Difficulty::Insane => 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct WordEntry {
    pub word: String,
    pub points: i32,
    pub difficulty: Difficulty,
}

impl WordEntry {
    pub fn new(word: impl Into<String>, difficulty: Difficulty) -> Self {
        WordEntry {
            word: word.into(),
            points: difficulty.points(),
            difficulty,
        }
    }
}
