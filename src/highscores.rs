//! High score leaderboard
//!
//! Top-N table ordered by score, plus a LocalStorage-backed store used when
//! the host doesn't provide a remote one.

use serde::{Deserialize, Serialize};

use crate::consts::LEADERBOARD_SIZE;
use crate::score::{LeaderboardStore, NewScore, ScoreError};

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    /// 1-indexed position
    pub rank: usize,
    pub player_name: String,
    pub score: u32,
}

/// High score leaderboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Leaderboard {
    entries: Vec<HighScoreEntry>,
    capacity: usize,
}

impl Default for Leaderboard {
    fn default() -> Self {
        Self::new(LEADERBOARD_SIZE)
    }
}

impl Leaderboard {
    /// Create empty leaderboard
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// Build from entries in any order. Ties keep their incoming order.
    pub fn from_entries(mut entries: Vec<HighScoreEntry>, capacity: usize) -> Self {
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        let mut board = Self {
            entries,
            capacity: capacity.max(1),
        };
        board.entries.truncate(board.capacity);
        board.rerank();
        board
    }

    pub fn entries(&self) -> &[HighScoreEntry] {
        &self.entries
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Check if a score qualifies for the leaderboard
    pub fn qualifies(&self, score: u32) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < self.capacity {
            return true;
        }
        // Must beat the lowest entry outright
        self.entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Get the rank a score would achieve (1-indexed, None if doesn't qualify)
    pub fn potential_rank(&self, score: u32) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.entries.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Add a score. Returns the rank achieved, or None if it didn't make it.
    pub fn insert(&mut self, player_name: &str, score: u32) -> Option<usize> {
        let rank = self.potential_rank(score)?;
        self.entries.insert(
            rank - 1,
            HighScoreEntry {
                rank,
                player_name: player_name.to_string(),
                score,
            },
        );
        self.entries.truncate(self.capacity);
        self.rerank();
        Some(rank)
    }

    /// Check if the leaderboard is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the top score (if any)
    pub fn top_score(&self) -> Option<u32> {
        self.entries.first().map(|e| e.score)
    }

    fn rerank(&mut self) {
        for (i, entry) in self.entries.iter_mut().enumerate() {
            entry.rank = i + 1;
        }
    }
}

/// Leaderboard kept in the browser (in memory on native)
#[derive(Debug, Clone, Default)]
pub struct LocalLeaderboard {
    board: Leaderboard,
}

impl LocalLeaderboard {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "secret_pong_highscores";

    pub fn new(capacity: usize) -> Self {
        Self {
            board: Leaderboard::new(capacity),
        }
    }

    pub fn board(&self) -> &Leaderboard {
        &self.board
    }

    /// Load high scores from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load(capacity: usize) -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(entries) = serde_json::from_str::<Vec<HighScoreEntry>>(&json) {
                    log::info!("Loaded {} high scores", entries.len());
                    return Self {
                        board: Leaderboard::from_entries(entries, capacity),
                    };
                }
            }
        }

        log::info!("No high scores found, starting fresh");
        Self::new(capacity)
    }

    /// Save high scores to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    fn save(&self) -> Result<(), ScoreError> {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or_else(|| ScoreError::Unavailable("LocalStorage not available".into()))?;
        let json = serde_json::to_string(self.board.entries())?;
        storage
            .set_item(Self::STORAGE_KEY, &json)
            .map_err(|e| ScoreError::Unavailable(format!("{:?}", e)))?;
        log::info!("High scores saved ({} entries)", self.board.entries().len());
        Ok(())
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(capacity: usize) -> Self {
        Self::new(capacity)
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn save(&self) -> Result<(), ScoreError> {
        Ok(())
    }
}

impl LeaderboardStore for LocalLeaderboard {
    fn submit(&mut self, entry: &NewScore) -> Result<(), ScoreError> {
        match self.board.insert(&entry.player_name, entry.score) {
            Some(rank) => {
                log::info!("{} placed #{} with {}", entry.player_name, rank, entry.score);
                self.save()
            }
            None => Ok(()),
        }
    }

    fn list(&self, top_n: usize) -> Result<Vec<HighScoreEntry>, ScoreError> {
        Ok(self.board.entries().iter().take(top_n).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_of(scores: &[u32]) -> Leaderboard {
        let entries = scores
            .iter()
            .map(|&score| HighScoreEntry {
                rank: 0,
                player_name: format!("p{}", score),
                score,
            })
            .collect();
        Leaderboard::from_entries(entries, 10)
    }

    #[test]
    fn test_from_entries_sorts_and_ranks() {
        let board = board_of(&[10, 50, 30]);
        let scores: Vec<_> = board.entries().iter().map(|e| (e.rank, e.score)).collect();
        assert_eq!(scores, vec![(1, 50), (2, 30), (3, 10)]);
    }

    #[test]
    fn test_qualifies_when_not_full() {
        let board = board_of(&[100, 90]);
        assert!(board.qualifies(1));
        assert!(!board.qualifies(0));
        assert_eq!(board.potential_rank(95), Some(2));
        assert_eq!(board.potential_rank(1), Some(3));
    }

    #[test]
    fn test_full_board_needs_to_beat_last() {
        let board = board_of(&[100, 95, 90, 85, 80, 75, 70, 65, 60, 50]);
        assert!(!board.qualifies(42));
        assert!(!board.qualifies(50));
        assert!(board.qualifies(51));
        assert_eq!(board.potential_rank(55), Some(10));
    }

    #[test]
    fn test_insert_truncates() {
        let mut board = board_of(&[100, 95, 90, 85, 80, 75, 70, 65, 60, 50]);
        assert_eq!(board.insert("Alex", 55), Some(10));
        assert_eq!(board.entries().len(), 10);
        assert_eq!(board.entries()[9].player_name, "Alex");
        assert_eq!(board.insert("Sam", 10), None);
        assert_eq!(board.top_score(), Some(100));
    }

    #[test]
    fn test_local_store_lists_top_n() {
        let mut store = LocalLeaderboard::new(10);
        for (name, score) in [("a", 5), ("b", 15), ("c", 10)] {
            store
                .submit(&NewScore {
                    score,
                    player_id: None,
                    player_name: name.into(),
                })
                .unwrap();
        }
        let top = store.list(2).unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].player_name, "b");
        assert_eq!(top[1].rank, 2);
    }
}
