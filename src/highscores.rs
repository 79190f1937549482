//! High score leaderboard
//!
//! Persisted through the session's `Storage`, keeps the top 50 scores.

use serde::{Deserialize, Serialize};

use crate::persistence::{HIGH_SCORES_KEY, Storage, load_json, save_json};
use crate::sim::country::country_or_default;

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 50;

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    /// Final score of the run
    pub score: u64,
    /// Country code the run was played with
    pub country: String,
    /// Flag glyph for display
    pub flag: String,
}

/// High score leaderboard, sorted descending
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    /// Create empty leaderboard
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Check if a score qualifies for the leaderboard
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        self.entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Get the rank a score would achieve (1-indexed, None if it doesn't qualify)
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.entries.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Add a new score to the leaderboard (if it qualifies)
    /// Returns the rank achieved (1-indexed) or None if it didn't qualify
    pub fn add_score(&mut self, score: u64, country: &str) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }

        let country = country_or_default(country);
        let entry = HighScoreEntry {
            score,
            country: country.code.to_string(),
            flag: country.flag.to_string(),
        };

        // Ties keep the earlier run ahead
        let pos = self.entries.iter().position(|e| score > e.score);
        let rank = match pos {
            Some(i) => {
                self.entries.insert(i, entry);
                i + 1
            }
            None => {
                self.entries.push(entry);
                self.entries.len()
            }
        };

        self.entries.truncate(MAX_HIGH_SCORES);

        Some(rank)
    }

    /// Check if the leaderboard is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the top score (if any)
    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    /// Load from storage; unavailable or malformed data starts fresh
    pub fn load(storage: &impl Storage) -> Self {
        match load_json::<HighScores>(storage, HIGH_SCORES_KEY) {
            Ok(Some(mut scores)) => {
                scores.entries.sort_by(|a, b| b.score.cmp(&a.score));
                scores.entries.retain(|e| e.score > 0);
                scores.entries.truncate(MAX_HIGH_SCORES);
                log::info!("Loaded {} high scores", scores.entries.len());
                scores
            }
            Ok(None) => {
                log::info!("No high scores found, starting fresh");
                Self::new()
            }
            Err(err) => {
                log::warn!("High scores unavailable ({}), starting fresh", err);
                Self::new()
            }
        }
    }

    /// Save to storage; failures are logged and dropped
    pub fn save(&self, storage: &mut impl Storage) {
        match save_json(storage, HIGH_SCORES_KEY, self) {
            Ok(()) => log::info!("High scores saved ({} entries)", self.entries.len()),
            Err(err) => log::warn!("Could not save high scores: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStorage;

    #[test]
    fn test_sorted_and_bounded() {
        let mut scores = HighScores::new();
        assert_eq!(scores.add_score(0, "US"), None);
        for score in 1..=60u64 {
            scores.add_score(score * 10, "US");
        }
        assert_eq!(scores.entries.len(), MAX_HIGH_SCORES);
        assert_eq!(scores.top_score(), Some(600));
        assert!(scores.entries.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(!scores.qualifies(50));
        assert_eq!(scores.potential_rank(605), Some(1));
    }

    #[test]
    fn test_entry_carries_country_flag() {
        let mut scores = HighScores::new();
        assert_eq!(scores.add_score(500, "de"), Some(1));
        assert_eq!(scores.add_score(900, "nowhere"), Some(1));
        assert_eq!(scores.entries[0].country, "XX");
        assert_eq!(scores.entries[1].country, "DE");
        assert_eq!(scores.entries[1].flag, "🇩🇪");
    }

    #[test]
    fn test_storage_fallback() {
        let mut storage = MemoryStorage::new();
        let mut scores = HighScores::new();
        scores.add_score(1234, "JP");
        scores.save(&mut storage);
        assert_eq!(HighScores::load(&storage).top_score(), Some(1234));

        let broken = MemoryStorage::unavailable();
        assert!(HighScores::load(&broken).is_empty());
    }
}
