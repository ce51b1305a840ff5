use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rand::prelude::*;

use game_types::{Difficulty, WordEntry};

use crate::word_lists;

/// Per-tier weights in `Difficulty::ALL` order.
pub type TierWeights = [f64; 4];

/// Distribution table for a difficulty tag. Unrecognized tags fall back to
/// an even mixed draw rather than failing.
pub fn tier_weights(tag: &str) -> TierWeights {
    match tag.trim().to_lowercase().as_str() {
        "easy" => [0.70, 0.30, 0.0, 0.0],
        "normal" => [0.20, 0.60, 0.20, 0.0],
        "hard" => [0.0, 0.25, 0.55, 0.20],
        "insane" => [0.0, 0.0, 0.40, 0.60],
        _ => [0.25, 0.25, 0.25, 0.25],
    }
}

/// Weighted word generator over a four-tier corpus.
///
/// Draws are uniform without replacement inside each tier and deterministic
/// for a fixed RNG seed, which is what makes generated rounds reproducible
/// in tests while staying unpredictable in production.
pub struct WordPool {
    tiers: [Vec<String>; 4],
}

fn parse_word_list(list: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    list.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_uppercase)
        .filter(|word| seen.insert(word.clone()))
        .collect()
}

impl WordPool {
    pub fn new(easy: &str, normal: &str, hard: &str, insane: &str) -> Self {
        WordPool {
            tiers: [
                parse_word_list(easy),
                parse_word_list(normal),
                parse_word_list(hard),
                parse_word_list(insane),
            ],
        }
    }

    /// Corpus compiled into the binary.
    pub fn builtin() -> Self {
        Self::new(
            word_lists::EASY,
            word_lists::NORMAL,
            word_lists::HARD,
            word_lists::INSANE,
        )
    }

    /// Load tier lists from `easy.txt`, `normal.txt`, `hard.txt` and
    /// `insane.txt` inside `dir`. Lines starting with `#` and blank lines
    /// are skipped; entries are trimmed, uppercased and deduplicated.
    pub fn load_from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let mut lists = Vec::with_capacity(4);
        for tier in ["easy", "normal", "hard", "insane"] {
            let path = dir.join(format!("{tier}.txt"));
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("reading word list {}", path.display()))?;
            lists.push(parse_word_list(&contents));
        }
        let mut lists = lists.into_iter();
        Ok(WordPool {
            tiers: [
                lists.next().unwrap_or_default(),
                lists.next().unwrap_or_default(),
                lists.next().unwrap_or_default(),
                lists.next().unwrap_or_default(),
            ],
        })
    }

    pub fn tier_size(&self, difficulty: Difficulty) -> usize {
        let index = Difficulty::ALL
            .iter()
            .position(|d| *d == difficulty)
            .unwrap_or(0);
        self.tiers[index].len()
    }

    /// Generate `count` words for a difficulty tag.
    ///
    /// Each tier's quota is `round(count * weight)`; rounding drift is
    /// corrected on the first nonzero-weighted tier (clamped at zero), and a
    /// quota larger than the tier is capped at the tier's size, so the result
    /// can be shorter than `count` only when the corpus itself runs out. The
    /// concatenated picks are returned in shuffled order.
    pub fn generate(&self, difficulty_tag: &str, count: usize, rng: &mut impl Rng) -> Vec<WordEntry> {
        let weights = tier_weights(difficulty_tag);

        let mut quotas = [0i64; 4];
        for (quota, weight) in quotas.iter_mut().zip(weights.iter()) {
            *quota = (count as f64 * weight).round() as i64;
        }
        let drift = count as i64 - quotas.iter().sum::<i64>();
        if drift != 0 {
            if let Some(first) = weights.iter().position(|w| *w > 0.0) {
                quotas[first] = (quotas[first] + drift).max(0);
            }
        }

        let mut words = Vec::with_capacity(count);
        for (index, difficulty) in Difficulty::ALL.iter().enumerate() {
            let tier = &self.tiers[index];
            let take = (quotas[index].max(0) as usize).min(tier.len());
            if take == 0 {
                continue;
            }
            words.extend(
                tier.choose_multiple(rng, take)
                    .map(|word| WordEntry::new(word.clone(), *difficulty)),
            );
        }
        words.shuffle(rng);
        words
    }
}
