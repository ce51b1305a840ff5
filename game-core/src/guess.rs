use game_types::{CoordinatorError, Submission, WordEntry};

/// Longest guess accepted, in characters.
pub const MAX_GUESS_LEN: usize = 100;
/// Hard cap on a round's word count; bonus batches stop at this level.
pub const MAX_ROUND_WORDS: usize = 32;
/// Words added per bonus grant.
pub const BONUS_WORD_BATCH: usize = 4;
/// Share of the current word set that must be correctly guessed before a
/// bonus batch is granted.
pub const BONUS_TRIGGER_RATIO: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuessEvaluation {
    Correct { points: i32 },
    /// Matched a word that was already credited this round; never rescored.
    AlreadyGuessed,
    Miss,
}

/// What one submission did to the round, including any bonus batch it
/// triggered.
#[derive(Debug, Clone)]
pub struct GuessOutcome {
    pub submission: Submission,
    pub word_count: u32,
    pub already_guessed: bool,
    pub bonus_words_added: u32,
}

/// Stateless guess rules. The session applies whatever these return; nothing
/// here touches state, which keeps every rule testable in isolation.
pub struct GuessEngine;

impl GuessEngine {
    /// Trim + uppercase. Matching is exact on the normalized form, making it
    /// case-insensitive while preserving interior whitespace.
    pub fn normalize(text: &str) -> String {
        text.trim().to_uppercase()
    }

    /// Validate raw guess text and return the normalized form.
    pub fn validate_text(text: &str) -> Result<String, CoordinatorError> {
        if text.chars().count() > MAX_GUESS_LEN {
            return Err(CoordinatorError::invalid_argument(
                "guess exceeds 100 characters",
            ));
        }
        let normalized = Self::normalize(text);
        if normalized.is_empty() {
            return Err(CoordinatorError::invalid_argument("guess must not be empty"));
        }
        Ok(normalized)
    }

    /// Match a normalized guess against the secret set, honoring the
    /// credit-once rule: each word scores at most once per round.
    pub fn evaluate(
        normalized: &str,
        words: &[WordEntry],
        prior_guesses: &[Submission],
    ) -> GuessEvaluation {
        let Some(entry) = words.iter().find(|w| w.word == normalized) else {
            return GuessEvaluation::Miss;
        };
        let credited = prior_guesses
            .iter()
            .any(|s| s.is_correct && !s.is_duplicate && s.word == entry.word);
        if credited {
            GuessEvaluation::AlreadyGuessed
        } else {
            GuessEvaluation::Correct {
                points: entry.points,
            }
        }
    }

    /// Distinct words credited so far this round.
    pub fn correct_count(guesses: &[Submission]) -> usize {
        guesses
            .iter()
            .filter(|s| s.is_correct && !s.is_duplicate)
            .count()
    }

    /// Whether a bonus batch is due after the latest guess. `last_bonus_at`
    /// is the word-count level at which the previous grant happened (0 at
    /// round start), which is what makes each threshold fire at most once
    /// while letting later, higher thresholds still fire as the set grows.
    pub fn bonus_due(
        correct_count: usize,
        word_count: usize,
        last_bonus_at: usize,
        bonus_enabled: bool,
    ) -> bool {
        bonus_enabled
            && word_count < MAX_ROUND_WORDS
            && word_count > last_bonus_at
            && correct_count >= (word_count as f64 * BONUS_TRIGGER_RATIO).floor() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use game_types::Difficulty;
    use uuid::Uuid;

    fn words() -> Vec<WordEntry> {
        vec![
            WordEntry::new("DOG", Difficulty::Easy),
            WordEntry::new("GUITAR", Difficulty::Normal),
            WordEntry::new("PARADOX", Difficulty::Hard),
            WordEntry::new("ICE CREAM", Difficulty::Easy),
        ]
    }

    fn submission(word: &str, is_correct: bool, is_duplicate: bool) -> Submission {
        Submission {
            player_id: Uuid::new_v4(),
            player_name: "Guesser".to_string(),
            word: word.to_string(),
            is_correct,
            is_duplicate,
            points: 0,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_normalize_trims_and_uppercases() {
        assert_eq!(GuessEngine::normalize("  dog  "), "DOG");
        assert_eq!(GuessEngine::normalize("GuItAr"), "GUITAR");
        assert_eq!(GuessEngine::normalize("ice cream"), "ICE CREAM");
    }

    #[test]
    fn test_validate_rejects_empty_and_whitespace() {
        for text in ["", "   ", "\t\n"] {
            let err = GuessEngine::validate_text(text).unwrap_err();
            assert!(matches!(err, CoordinatorError::InvalidArgument { .. }));
        }
    }

    #[test]
    fn test_validate_rejects_over_length() {
        let long = "a".repeat(101);
        let err = GuessEngine::validate_text(&long).unwrap_err();
        assert!(matches!(err, CoordinatorError::InvalidArgument { .. }));

        let exactly = "a".repeat(100);
        assert_eq!(GuessEngine::validate_text(&exactly).unwrap(), exactly.to_uppercase());
    }

    #[test]
    fn test_evaluate_scores_fresh_match() {
        let result = GuessEngine::evaluate("GUITAR", &words(), &[]);
        assert_eq!(result, GuessEvaluation::Correct { points: 20 });
    }

    #[test]
    fn test_evaluate_marks_repeat_as_already_guessed() {
        let prior = vec![submission("GUITAR", true, false)];
        let result = GuessEngine::evaluate("GUITAR", &words(), &prior);
        assert_eq!(result, GuessEvaluation::AlreadyGuessed);
    }

    #[test]
    fn test_repeat_of_a_duplicate_is_still_duplicate() {
        let prior = vec![
            submission("DOG", true, false),
            submission("DOG", true, true),
        ];
        assert_eq!(
            GuessEngine::evaluate("DOG", &words(), &prior),
            GuessEvaluation::AlreadyGuessed
        );
    }

    #[test]
    fn test_evaluate_miss() {
        assert_eq!(
            GuessEngine::evaluate("BANANA", &words(), &[]),
            GuessEvaluation::Miss
        );
    }

    #[test]
    fn test_tier_points_are_fixed() {
        assert_eq!(
            GuessEngine::evaluate("DOG", &words(), &[]),
            GuessEvaluation::Correct { points: 10 }
        );
        assert_eq!(
            GuessEngine::evaluate("PARADOX", &words(), &[]),
            GuessEvaluation::Correct { points: 25 }
        );
        assert_eq!(Difficulty::Insane.points(), 50);
    }

    #[test]
    fn test_correct_count_ignores_misses_and_duplicates() {
        let guesses = vec![
            submission("DOG", true, false),
            submission("DOG", true, true),
            submission("BANANA", false, false),
            submission("GUITAR", true, false),
        ];
        assert_eq!(GuessEngine::correct_count(&guesses), 2);
    }

    #[test]
    fn test_bonus_due_at_eighty_percent() {
        // floor(0.8 * 16) = 12
        assert!(!GuessEngine::bonus_due(11, 16, 0, true));
        assert!(GuessEngine::bonus_due(12, 16, 0, true));
        assert!(GuessEngine::bonus_due(13, 16, 0, true));
    }

    #[test]
    fn test_bonus_respects_grant_level() {
        // After a grant at 16 words the set is 20; the same correct count
        // no longer clears the higher threshold.
        assert!(!GuessEngine::bonus_due(12, 20, 16, true));
        // floor(0.8 * 20) = 16
        assert!(GuessEngine::bonus_due(16, 20, 16, true));
        // No regrant at a level that already granted.
        assert!(!GuessEngine::bonus_due(16, 20, 20, true));
    }

    #[test]
    fn test_bonus_stops_at_cap() {
        assert!(GuessEngine::bonus_due(25, 28, 24, true));
        assert!(!GuessEngine::bonus_due(32, 32, 28, true));
    }

    #[test]
    fn test_bonus_disabled_by_settings() {
        assert!(!GuessEngine::bonus_due(12, 16, 0, false));
    }
}
