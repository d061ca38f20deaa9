//! League service: match orchestration over storage and the rating engine
//!
//! Recording a match reads fresh ratings, runs the calculator and commits the
//! result as one unit. Any failure along the way aborts the match with nothing
//! persisted.

use crate::error::{RankingError, Result};
use crate::rating::elo::derive_team_rating;
use crate::rating::{RatingCalculator, RatingStorage};
use crate::types::{
    MatchId, MatchRatingChanges, MatchRecord, ParticipantId, ParticipantKind, Player, PlayerId,
    RatingHistoryEntry, Team, TeamId,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Outcome of a recorded match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchReport {
    pub record: MatchRecord,
    pub changes: MatchRatingChanges,
}

/// Registers participants and records matches
pub struct LeagueService {
    storage: Arc<dyn RatingStorage>,
    calculator: Arc<dyn RatingCalculator>,
    /// Serialises read-compute-commit so two matches sharing a participant
    /// never work from the same stale snapshot
    match_lock: Mutex<()>,
}

impl LeagueService {
    /// Create a new league service
    pub fn new(storage: Arc<dyn RatingStorage>, calculator: Arc<dyn RatingCalculator>) -> Self {
        Self {
            storage,
            calculator,
            match_lock: Mutex::new(()),
        }
    }

    /// Register a player at the calculator's initial rating
    pub fn register_player(&self, name: &str) -> Result<Player> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RankingError::InvalidRequest {
                reason: "Player name cannot be empty".to_string(),
            }
            .into());
        }

        let player = self
            .storage
            .insert_player(name, self.calculator.initial_rating())?;
        info!(
            "Registered player '{}' ({}) at rating {}",
            player.name, player.id, player.rating
        );
        Ok(player)
    }

    /// Register a team of two distinct existing players
    ///
    /// The team starts at the truncated mean of its players' current ratings.
    pub fn register_team(
        &self,
        name: &str,
        player_a: PlayerId,
        player_b: PlayerId,
    ) -> Result<Team> {
        if player_a == player_b {
            return Err(RankingError::InvalidRequest {
                reason: format!("A team needs two different players, got {} twice", player_a),
            }
            .into());
        }

        let rating_a = self.require_player(player_a)?.rating;
        let rating_b = self.require_player(player_b)?.rating;
        let rating = derive_team_rating(rating_a, rating_b)?;

        let team = self
            .storage
            .insert_team(name.trim(), [player_a, player_b], rating)?;
        info!(
            "Registered team '{}' ({}) with players {} and {} at rating {}",
            team.name, team.id, player_a, player_b, team.rating
        );
        Ok(team)
    }

    /// Record a finished match and apply its rating changes
    pub fn record_match(
        &self,
        winning_team_id: TeamId,
        losing_team_id: TeamId,
    ) -> Result<MatchReport> {
        if winning_team_id == losing_team_id {
            return Err(RankingError::InvalidMatch {
                reason: format!("Team {} cannot play against itself", winning_team_id),
            }
            .into());
        }

        let _guard = self.match_lock.lock().map_err(|_| RankingError::InternalError {
            message: "Failed to acquire match lock".to_string(),
        })?;

        let winning_team = self.require_team(winning_team_id)?;
        let losing_team = self.require_team(losing_team_id)?;

        if let Some(&shared) = winning_team
            .player_ids
            .iter()
            .find(|&&player_id| losing_team.has_player(player_id))
        {
            return Err(RankingError::InvalidMatch {
                reason: format!("Player {} appears on both sides", shared),
            }
            .into());
        }

        let player_ids: Vec<PlayerId> = winning_team
            .player_ids
            .iter()
            .chain(losing_team.player_ids.iter())
            .copied()
            .collect();
        let player_ratings = self.storage.get_player_ratings(&player_ids)?;

        let changes = self
            .calculator
            .process_match(&winning_team, &losing_team, &player_ratings)
            .map_err(|e| {
                warn!(
                    "Rejected match {} vs {}: {}",
                    winning_team_id, losing_team_id, e
                );
                e
            })?;

        let record = self
            .storage
            .commit_match(winning_team_id, losing_team_id, &changes)?;

        info!(
            "Recorded match {}: team {} beat team {}",
            record.id, winning_team_id, losing_team_id
        );
        for (player_id, change) in &changes.player_changes {
            debug!(
                "  player {}: {} -> {} ({:+})",
                player_id, change.old_rating, change.new_rating, change.delta
            );
        }

        Ok(MatchReport { record, changes })
    }

    /// Delete a match record
    ///
    /// Rating history written for the match is kept and current ratings are
    /// not rolled back.
    pub fn delete_match(&self, match_id: MatchId) -> Result<()> {
        if !self.storage.remove_match(match_id)? {
            return Err(RankingError::MatchNotFound { match_id }.into());
        }

        info!("Deleted match {} (rating history retained)", match_id);
        Ok(())
    }

    /// Players ordered by rating, highest first
    pub fn leaderboard(&self, limit: Option<usize>) -> Result<Vec<Player>> {
        self.storage.ranked_players(limit)
    }

    /// Teams ordered by rating, highest first
    pub fn team_leaderboard(&self, limit: Option<usize>) -> Result<Vec<Team>> {
        self.storage.ranked_teams(limit)
    }

    pub fn player_history(&self, player_id: PlayerId) -> Result<Vec<RatingHistoryEntry>> {
        self.require_player(player_id)?;
        self.history_of(ParticipantKind::Player, player_id)
    }

    pub fn team_history(&self, team_id: TeamId) -> Result<Vec<RatingHistoryEntry>> {
        self.require_team(team_id)?;
        self.history_of(ParticipantKind::Team, team_id)
    }

    fn history_of(
        &self,
        kind: ParticipantKind,
        participant_id: ParticipantId,
    ) -> Result<Vec<RatingHistoryEntry>> {
        let history = self.storage.history(kind, participant_id)?;
        debug!(
            "{} {} has {} rating history entries",
            kind,
            participant_id,
            history.len()
        );
        Ok(history)
    }

    fn require_player(&self, player_id: PlayerId) -> Result<Player> {
        self.storage
            .get_player(player_id)?
            .ok_or_else(|| RankingError::PlayerNotFound { player_id }.into())
    }

    fn require_team(&self, team_id: TeamId) -> Result<Team> {
        self.storage
            .get_team(team_id)?
            .ok_or_else(|| RankingError::TeamNotFound { team_id }.into())
    }
}
