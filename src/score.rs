//! Score submission
//!
//! Runs once per round when the game ends. Authenticated players submit
//! straight away under their account; anonymous players are asked for a
//! display name only when the score would place on the public leaderboard.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::MAX_NAME_LEN;
use crate::highscores::{HighScoreEntry, Leaderboard};

/// Signed-in player
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerIdentity {
    pub user_id: String,
    pub display_name: String,
}

/// Host authentication
pub trait AuthContext {
    fn is_authenticated(&self) -> bool;
    fn identity(&self) -> Option<PlayerIdentity>;
}

/// Nobody signed in
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl AuthContext for Anonymous {
    fn is_authenticated(&self) -> bool {
        false
    }

    fn identity(&self) -> Option<PlayerIdentity> {
        None
    }
}

/// A fixed signed-in player
#[derive(Debug, Clone)]
pub struct SignedIn(pub PlayerIdentity);

impl AuthContext for SignedIn {
    fn is_authenticated(&self) -> bool {
        true
    }

    fn identity(&self) -> Option<PlayerIdentity> {
        Some(self.0.clone())
    }
}

/// Entry sent to the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewScore {
    pub score: u32,
    /// None for anonymous entries
    pub player_id: Option<String>,
    pub player_name: String,
}

#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("leaderboard unavailable: {0}")]
    Unavailable(String),
    #[error("score rejected: {0}")]
    Rejected(String),
    #[error("leaderboard data is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Public leaderboard backend
pub trait LeaderboardStore {
    fn submit(&mut self, entry: &NewScore) -> Result<(), ScoreError>;
    /// Top entries, best first
    fn list(&self, top_n: usize) -> Result<Vec<HighScoreEntry>, ScoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("please enter a name")]
    Empty,
    #[error("names are limited to {max} characters")]
    TooLong { max: usize },
}

/// Trimmed, non-empty display name of at most `MAX_NAME_LEN` characters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerName(String);

impl PlayerName {
    pub fn parse(raw: &str) -> Result<Self, NameError> {
        let name = raw.trim();
        if name.is_empty() {
            return Err(NameError::Empty);
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(NameError::TooLong { max: MAX_NAME_LEN });
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The one submission a round may make
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreSubmission {
    pub score: u32,
    pub player_id: Option<String>,
    pub player_name: Option<String>,
    /// Flips to true at most once
    pub submitted: bool,
}

/// What the UI should show next
#[derive(Debug)]
pub enum ScoreFlow {
    /// Sent to the leaderboard
    Submitted { score: u32 },
    /// Anonymous score that wouldn't place; nothing to do
    NotQualified,
    /// Ask an anonymous player for a name
    NamePrompt { score: u32, rank: Option<usize> },
    /// Player declined to enter a name
    Skipped,
    /// Submission failed; shown as a notice, not retried
    Failed(ScoreError),
    /// This round's score was already dealt with
    AlreadyHandled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Armed,
    AwaitingName,
    Done,
}

/// Per-round submission guard
#[derive(Debug)]
pub struct ScoreService {
    leaderboard_size: usize,
    stage: Stage,
    submission: Option<ScoreSubmission>,
}

impl ScoreService {
    pub fn new(leaderboard_size: usize) -> Self {
        Self {
            leaderboard_size,
            stage: Stage::Armed,
            submission: None,
        }
    }

    pub fn submission(&self) -> Option<&ScoreSubmission> {
        self.submission.as_ref()
    }

    pub fn is_awaiting_name(&self) -> bool {
        self.stage == Stage::AwaitingName
    }

    /// Entry point when the round ends. Later calls return `AlreadyHandled`.
    pub fn on_game_over(
        &mut self,
        score: u32,
        auth: &dyn AuthContext,
        store: &mut dyn LeaderboardStore,
    ) -> ScoreFlow {
        if self.stage != Stage::Armed {
            return ScoreFlow::AlreadyHandled;
        }

        if auth.is_authenticated() {
            let Some(identity) = auth.identity() else {
                self.stage = Stage::Done;
                log::warn!("Signed in without an identity; score not submitted");
                return ScoreFlow::Failed(ScoreError::Rejected("missing identity".into()));
            };
            self.submission = Some(ScoreSubmission {
                score,
                player_id: Some(identity.user_id),
                player_name: Some(identity.display_name),
                submitted: false,
            });
            return self.submit(store);
        }

        let entries = match store.list(self.leaderboard_size) {
            Ok(entries) => entries,
            Err(e) => {
                self.stage = Stage::Done;
                log::warn!("Could not read leaderboard, skipping name prompt: {}", e);
                return ScoreFlow::NotQualified;
            }
        };
        let board = Leaderboard::from_entries(entries, self.leaderboard_size);
        let Some(rank) = board.potential_rank(score) else {
            self.stage = Stage::Done;
            log::debug!("Score {} doesn't place", score);
            return ScoreFlow::NotQualified;
        };

        self.submission = Some(ScoreSubmission {
            score,
            player_id: None,
            player_name: None,
            submitted: false,
        });
        self.stage = Stage::AwaitingName;
        ScoreFlow::NamePrompt {
            score,
            rank: Some(rank),
        }
    }

    /// Name entered at the prompt. Invalid names leave the prompt open.
    pub fn provide_name(
        &mut self,
        raw: &str,
        store: &mut dyn LeaderboardStore,
    ) -> Result<ScoreFlow, NameError> {
        if self.stage != Stage::AwaitingName {
            return Ok(ScoreFlow::AlreadyHandled);
        }
        let name = PlayerName::parse(raw)?;
        if let Some(submission) = self.submission.as_mut() {
            submission.player_name = Some(name.as_str().to_string());
        }
        Ok(self.submit(store))
    }

    /// Prompt dismissed
    pub fn skip_name(&mut self) -> ScoreFlow {
        if self.stage != Stage::AwaitingName {
            return ScoreFlow::AlreadyHandled;
        }
        self.stage = Stage::Done;
        log::info!("Name entry skipped");
        ScoreFlow::Skipped
    }

    fn submit(&mut self, store: &mut dyn LeaderboardStore) -> ScoreFlow {
        self.stage = Stage::Done;
        let Some(submission) = self.submission.as_mut() else {
            return ScoreFlow::AlreadyHandled;
        };
        if submission.submitted {
            return ScoreFlow::AlreadyHandled;
        }
        // Marked before sending; a failed attempt is not retried
        submission.submitted = true;

        let entry = NewScore {
            score: submission.score,
            player_id: submission.player_id.clone(),
            player_name: submission.player_name.clone().unwrap_or_default(),
        };
        match store.submit(&entry) {
            Ok(()) => {
                log::info!("Submitted score {} for {}", entry.score, entry.player_name);
                ScoreFlow::Submitted { score: entry.score }
            }
            Err(e) => {
                log::warn!("Score submission failed: {}", e);
                ScoreFlow::Failed(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeStore {
        entries: Vec<HighScoreEntry>,
        submitted: Vec<NewScore>,
        fail_submit: bool,
        fail_list: bool,
    }

    impl FakeStore {
        fn with_scores(scores: &[u32]) -> Self {
            let entries = scores
                .iter()
                .enumerate()
                .map(|(i, &score)| HighScoreEntry {
                    rank: i + 1,
                    player_name: format!("p{}", i),
                    score,
                })
                .collect();
            Self {
                entries,
                ..Default::default()
            }
        }
    }

    impl LeaderboardStore for FakeStore {
        fn submit(&mut self, entry: &NewScore) -> Result<(), ScoreError> {
            self.submitted.push(entry.clone());
            if self.fail_submit {
                return Err(ScoreError::Unavailable("offline".into()));
            }
            Ok(())
        }

        fn list(&self, top_n: usize) -> Result<Vec<HighScoreEntry>, ScoreError> {
            if self.fail_list {
                return Err(ScoreError::Unavailable("offline".into()));
            }
            Ok(self.entries.iter().take(top_n).cloned().collect())
        }
    }

    fn signed_in() -> SignedIn {
        SignedIn(PlayerIdentity {
            user_id: "u-1".into(),
            display_name: "Robin".into(),
        })
    }

    const FULL: [u32; 10] = [100, 95, 90, 85, 80, 75, 70, 65, 60, 50];

    #[test]
    fn test_name_validation() {
        assert_eq!(PlayerName::parse("  Alex ").unwrap().as_str(), "Alex");
        assert_eq!(PlayerName::parse("   "), Err(NameError::Empty));
        assert_eq!(
            PlayerName::parse(&"x".repeat(31)),
            Err(NameError::TooLong { max: 30 })
        );
        assert!(PlayerName::parse(&"é".repeat(30)).is_ok());
    }

    #[test]
    fn test_authenticated_submits_once() {
        let mut store = FakeStore::default();
        let mut service = ScoreService::new(10);
        let flow = service.on_game_over(12, &signed_in(), &mut store);
        assert!(matches!(flow, ScoreFlow::Submitted { score: 12 }));
        let again = service.on_game_over(12, &signed_in(), &mut store);
        assert!(matches!(again, ScoreFlow::AlreadyHandled));
        assert_eq!(store.submitted.len(), 1);
        assert_eq!(store.submitted[0].player_id.as_deref(), Some("u-1"));
        assert_eq!(store.submitted[0].player_name, "Robin");
        assert!(service.submission().unwrap().submitted);
    }

    #[test]
    fn test_anonymous_low_score_is_silent() {
        let mut store = FakeStore::with_scores(&FULL);
        let mut service = ScoreService::new(10);
        let flow = service.on_game_over(42, &Anonymous, &mut store);
        assert!(matches!(flow, ScoreFlow::NotQualified));
        assert!(store.submitted.is_empty());
        assert!(service.submission().is_none());
    }

    #[test]
    fn test_anonymous_qualifying_prompts_then_submits() {
        let mut store = FakeStore::with_scores(&FULL);
        let mut service = ScoreService::new(10);
        let flow = service.on_game_over(55, &Anonymous, &mut store);
        assert!(matches!(
            flow,
            ScoreFlow::NamePrompt {
                score: 55,
                rank: Some(10)
            }
        ));
        assert!(service.is_awaiting_name());

        assert_eq!(
            service.provide_name("", &mut store).unwrap_err(),
            NameError::Empty
        );
        assert!(service.is_awaiting_name());

        let flow = service.provide_name("Alex", &mut store).unwrap();
        assert!(matches!(flow, ScoreFlow::Submitted { score: 55 }));
        assert_eq!(
            store.submitted,
            vec![NewScore {
                score: 55,
                player_id: None,
                player_name: "Alex".into()
            }]
        );
        assert!(matches!(
            service.provide_name("Alex", &mut store).unwrap(),
            ScoreFlow::AlreadyHandled
        ));
        assert_eq!(store.submitted.len(), 1);
    }

    #[test]
    fn test_skip_submits_nothing() {
        let mut store = FakeStore::with_scores(&FULL);
        let mut service = ScoreService::new(10);
        service.on_game_over(55, &Anonymous, &mut store);
        assert!(matches!(service.skip_name(), ScoreFlow::Skipped));
        assert!(matches!(
            service.provide_name("Alex", &mut store).unwrap(),
            ScoreFlow::AlreadyHandled
        ));
        assert!(store.submitted.is_empty());
    }

    #[test]
    fn test_failure_is_terminal() {
        let mut store = FakeStore {
            fail_submit: true,
            ..Default::default()
        };
        let mut service = ScoreService::new(10);
        let flow = service.on_game_over(7, &signed_in(), &mut store);
        assert!(matches!(flow, ScoreFlow::Failed(ScoreError::Unavailable(_))));
        store.fail_submit = false;
        let again = service.on_game_over(7, &signed_in(), &mut store);
        assert!(matches!(again, ScoreFlow::AlreadyHandled));
        assert_eq!(store.submitted.len(), 1);
    }

    #[test]
    fn test_unreadable_leaderboard_skips_prompt() {
        let mut store = FakeStore {
            fail_list: true,
            ..Default::default()
        };
        let mut service = ScoreService::new(10);
        let flow = service.on_game_over(99, &Anonymous, &mut store);
        assert!(matches!(flow, ScoreFlow::NotQualified));
        assert!(store.submitted.is_empty());
    }

    #[test]
    fn test_zero_never_prompts() {
        let mut store = FakeStore::default();
        let mut service = ScoreService::new(10);
        let flow = service.on_game_over(0, &Anonymous, &mut store);
        assert!(matches!(flow, ScoreFlow::NotQualified));
    }
}
