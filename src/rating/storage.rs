//! Rating storage interface and implementations
//!
//! This module defines the interface for looking up current ratings and
//! persisting the outcome of a match: new current ratings plus an immutable,
//! append-only history log.

use crate::error::RankingError;
use crate::types::{
    MatchId, MatchRatingChanges, MatchRecord, ParticipantId, ParticipantKind, Player, PlayerId,
    Rating, RatingChange, RatingHistoryEntry, Team, TeamId,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Trait for rating storage operations
#[cfg_attr(test, mockall::automock)]
pub trait RatingStorage: Send + Sync {
    /// Register a new player
    fn insert_player(&self, name: &str, rating: Rating) -> crate::error::Result<Player>;

    /// Register a new team
    fn insert_team(
        &self,
        name: &str,
        player_ids: [PlayerId; 2],
        rating: Rating,
    ) -> crate::error::Result<Team>;

    /// Get a player by id
    fn get_player(&self, player_id: PlayerId) -> crate::error::Result<Option<Player>>;

    /// Get a team by id
    fn get_team(&self, team_id: TeamId) -> crate::error::Result<Option<Team>>;

    /// Get current ratings for multiple players; unknown ids are left out
    fn get_player_ratings(
        &self,
        player_ids: &[PlayerId],
    ) -> crate::error::Result<HashMap<PlayerId, Rating>>;

    /// Persist new ratings and history for one match, all or nothing
    fn commit_match(
        &self,
        winning_team_id: TeamId,
        losing_team_id: TeamId,
        changes: &MatchRatingChanges,
    ) -> crate::error::Result<MatchRecord>;

    /// Get a recorded match
    fn get_match(&self, match_id: MatchId) -> crate::error::Result<Option<MatchRecord>>;

    /// Remove a match record; ratings and history are kept
    fn remove_match(&self, match_id: MatchId) -> crate::error::Result<bool>;

    /// Rating history of a participant in commit order
    fn history(
        &self,
        kind: ParticipantKind,
        participant_id: ParticipantId,
    ) -> crate::error::Result<Vec<RatingHistoryEntry>>;

    /// Players sorted by rating (descending)
    fn ranked_players(&self, limit: Option<usize>) -> crate::error::Result<Vec<Player>>;

    /// Teams sorted by rating (descending)
    fn ranked_teams(&self, limit: Option<usize>) -> crate::error::Result<Vec<Team>>;
}

#[derive(Debug, Default)]
struct StorageState {
    players: HashMap<PlayerId, Player>,
    teams: HashMap<TeamId, Team>,
    matches: HashMap<MatchId, MatchRecord>,
    history: Vec<RatingHistoryEntry>,
    last_player_id: PlayerId,
    last_team_id: TeamId,
    last_match_id: MatchId,
}

/// In-memory rating storage implementation
#[derive(Debug, Default)]
pub struct InMemoryRatingStorage {
    state: RwLock<StorageState>,
}

impl InMemoryRatingStorage {
    /// Create a new, empty in-memory rating storage
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> crate::error::Result<RwLockReadGuard<'_, StorageState>> {
        self.state.read().map_err(|_| {
            RankingError::InternalError {
                message: "Failed to acquire storage read lock".to_string(),
            }
            .into()
        })
    }

    fn write(&self) -> crate::error::Result<RwLockWriteGuard<'_, StorageState>> {
        self.state.write().map_err(|_| {
            RankingError::InternalError {
                message: "Failed to acquire storage write lock".to_string(),
            }
            .into()
        })
    }
}

fn sorted_changes<K: Copy + Ord>(changes: &HashMap<K, RatingChange>) -> Vec<(K, RatingChange)> {
    let mut sorted: Vec<_> = changes.iter().map(|(&id, &change)| (id, change)).collect();
    sorted.sort_by_key(|(id, _)| *id);
    sorted
}

fn history_entry(
    kind: ParticipantKind,
    participant_id: ParticipantId,
    match_id: MatchId,
    change: &RatingChange,
    recorded_at: DateTime<Utc>,
) -> RatingHistoryEntry {
    RatingHistoryEntry {
        kind,
        participant_id,
        match_id,
        old_rating: change.old_rating,
        new_rating: change.new_rating,
        delta: change.delta,
        recorded_at,
    }
}

impl RatingStorage for InMemoryRatingStorage {
    fn insert_player(&self, name: &str, rating: Rating) -> crate::error::Result<Player> {
        let mut state = self.write()?;

        state.last_player_id += 1;
        let player = Player {
            id: state.last_player_id,
            name: name.to_string(),
            rating,
        };
        state.players.insert(player.id, player.clone());

        Ok(player)
    }

    fn insert_team(
        &self,
        name: &str,
        player_ids: [PlayerId; 2],
        rating: Rating,
    ) -> crate::error::Result<Team> {
        let mut state = self.write()?;

        for player_id in player_ids {
            if !state.players.contains_key(&player_id) {
                return Err(RankingError::PlayerNotFound { player_id }.into());
            }
        }

        state.last_team_id += 1;
        let team = Team {
            id: state.last_team_id,
            name: name.to_string(),
            player_ids,
            rating,
        };
        state.teams.insert(team.id, team.clone());

        Ok(team)
    }

    fn get_player(&self, player_id: PlayerId) -> crate::error::Result<Option<Player>> {
        Ok(self.read()?.players.get(&player_id).cloned())
    }

    fn get_team(&self, team_id: TeamId) -> crate::error::Result<Option<Team>> {
        Ok(self.read()?.teams.get(&team_id).cloned())
    }

    fn get_player_ratings(
        &self,
        player_ids: &[PlayerId],
    ) -> crate::error::Result<HashMap<PlayerId, Rating>> {
        let state = self.read()?;

        let mut result = HashMap::new();
        for player_id in player_ids {
            if let Some(player) = state.players.get(player_id) {
                result.insert(*player_id, player.rating);
            }
        }

        Ok(result)
    }

    fn commit_match(
        &self,
        winning_team_id: TeamId,
        losing_team_id: TeamId,
        changes: &MatchRatingChanges,
    ) -> crate::error::Result<MatchRecord> {
        let mut state = self.write()?;

        // Check everything up front so a failed commit writes nothing
        for team_id in [winning_team_id, losing_team_id]
            .into_iter()
            .chain(changes.team_changes.keys().copied())
        {
            if !state.teams.contains_key(&team_id) {
                return Err(RankingError::TeamNotFound { team_id }.into());
            }
        }
        for &player_id in changes.player_changes.keys() {
            if !state.players.contains_key(&player_id) {
                return Err(RankingError::PlayerNotFound { player_id }.into());
            }
        }

        let now = Utc::now();
        state.last_match_id += 1;
        let record = MatchRecord {
            id: state.last_match_id,
            winning_team_id,
            losing_team_id,
            played_at: now,
        };

        for (player_id, change) in sorted_changes(&changes.player_changes) {
            if let Some(player) = state.players.get_mut(&player_id) {
                player.rating = change.new_rating;
            }
            state.history.push(history_entry(
                ParticipantKind::Player,
                player_id,
                record.id,
                &change,
                now,
            ));
        }
        for (team_id, change) in sorted_changes(&changes.team_changes) {
            if let Some(team) = state.teams.get_mut(&team_id) {
                team.rating = change.new_rating;
            }
            state.history.push(history_entry(
                ParticipantKind::Team,
                team_id,
                record.id,
                &change,
                now,
            ));
        }

        state.matches.insert(record.id, record.clone());
        Ok(record)
    }

    fn get_match(&self, match_id: MatchId) -> crate::error::Result<Option<MatchRecord>> {
        Ok(self.read()?.matches.get(&match_id).cloned())
    }

    fn remove_match(&self, match_id: MatchId) -> crate::error::Result<bool> {
        let mut state = self.write()?;
        Ok(state.matches.remove(&match_id).is_some())
    }

    fn history(
        &self,
        kind: ParticipantKind,
        participant_id: ParticipantId,
    ) -> crate::error::Result<Vec<RatingHistoryEntry>> {
        let state = self.read()?;

        Ok(state
            .history
            .iter()
            .filter(|entry| entry.kind == kind && entry.participant_id == participant_id)
            .cloned()
            .collect())
    }

    fn ranked_players(&self, limit: Option<usize>) -> crate::error::Result<Vec<Player>> {
        let state = self.read()?;

        let mut players: Vec<Player> = state.players.values().cloned().collect();
        players.sort_by(|a, b| b.rating.cmp(&a.rating).then(a.id.cmp(&b.id)));

        if let Some(limit) = limit {
            players.truncate(limit);
        }

        Ok(players)
    }

    fn ranked_teams(&self, limit: Option<usize>) -> crate::error::Result<Vec<Team>> {
        let state = self.read()?;

        let mut teams: Vec<Team> = state.teams.values().cloned().collect();
        teams.sort_by(|a, b| b.rating.cmp(&a.rating).then(a.id.cmp(&b.id)));

        if let Some(limit) = limit {
            teams.truncate(limit);
        }

        Ok(teams)
    }
}
