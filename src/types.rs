//! Common types used throughout the ranking service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identifier shared by every rated participant (players and teams)
pub type ParticipantId = i64;

/// Unique identifier for players
pub type PlayerId = ParticipantId;

/// Unique identifier for teams
pub type TeamId = ParticipantId;

/// Unique identifier for recorded matches
pub type MatchId = i64;

/// ELO rating value
pub type Rating = i64;

/// Outcome of a match from one participant's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchResult {
    Win,
    Loss,
}

impl MatchResult {
    /// Actual score used by the ELO update (1 for a win, 0 for a loss)
    pub fn score(self) -> f64 {
        match self {
            MatchResult::Win => 1.0,
            MatchResult::Loss => 0.0,
        }
    }
}

/// Kind of rated participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParticipantKind {
    Player,
    Team,
}

impl std::fmt::Display for ParticipantKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParticipantKind::Player => write!(f, "Player"),
            ParticipantKind::Team => write!(f, "Team"),
        }
    }
}

/// A registered player and its current rating
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub rating: Rating,
}

/// A two-player team and its current team-level rating
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub player_ids: [PlayerId; 2],
    pub rating: Rating,
}

impl Team {
    /// Check whether the given player belongs to this team
    pub fn has_player(&self, player_id: PlayerId) -> bool {
        self.player_ids.contains(&player_id)
    }
}

/// Input of the pool correction for a single participant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoolEntry {
    pub old_rating: Rating,
    pub win_probability: f64,
    pub result: MatchResult,
    pub k_factor: i64,
}

/// Rating change of one participant caused by one match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingChange {
    pub old_rating: Rating,
    pub new_rating: Rating,
    pub delta: i64,
}

/// Player-level and team-level rating changes for one match
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRatingChanges {
    pub player_changes: HashMap<PlayerId, RatingChange>,
    pub team_changes: HashMap<TeamId, RatingChange>,
}

impl MatchRatingChanges {
    /// Sum of all player deltas (zero up to truncation)
    pub fn player_delta_sum(&self) -> i64 {
        self.player_changes.values().map(|c| c.delta).sum()
    }

    /// Sum of all team deltas (zero up to truncation)
    pub fn team_delta_sum(&self) -> i64 {
        self.team_changes.values().map(|c| c.delta).sum()
    }
}

/// A recorded match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: MatchId,
    pub winning_team_id: TeamId,
    pub losing_team_id: TeamId,
    pub played_at: DateTime<Utc>,
}

/// Immutable history record of one participant's rating change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingHistoryEntry {
    pub kind: ParticipantKind,
    pub participant_id: ParticipantId,
    pub match_id: MatchId,
    pub old_rating: Rating,
    pub new_rating: Rating,
    pub delta: i64,
    pub recorded_at: DateTime<Utc>,
}
