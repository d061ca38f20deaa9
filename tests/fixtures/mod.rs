//! Test fixtures shared by the integration tests

#![allow(dead_code)]

use babyfoot_ranking::rating::{EloRatingCalculator, InMemoryRatingStorage, RatingStorage};
use babyfoot_ranking::types::{Player, PlayerId, Rating, Team, TeamId};
use babyfoot_ranking::LeagueService;
use std::collections::HashMap;
use std::sync::Arc;

/// A league wired to in-memory storage and the default ELO calculator
pub struct TestLeague {
    pub league: LeagueService,
    pub storage: Arc<InMemoryRatingStorage>,
}

impl TestLeague {
    pub fn new() -> Self {
        let storage = Arc::new(InMemoryRatingStorage::new());
        let league = LeagueService::new(
            storage.clone(),
            Arc::new(EloRatingCalculator::default()),
        );
        Self { league, storage }
    }

    /// Insert a player at an explicit rating, bypassing the initial rating
    pub fn player_at(&self, name: &str, rating: Rating) -> Player {
        self.storage.insert_player(name, rating).unwrap()
    }

    /// Register a team through the league so its rating is derived
    pub fn team_of(&self, name: &str, a: &Player, b: &Player) -> Team {
        self.league.register_team(name, a.id, b.id).unwrap()
    }

    pub fn rating_of(&self, player_id: PlayerId) -> Rating {
        self.storage.get_player(player_id).unwrap().unwrap().rating
    }

    pub fn team_rating_of(&self, team_id: TeamId) -> Rating {
        self.storage.get_team(team_id).unwrap().unwrap().rating
    }

    /// Sum of all current player ratings
    pub fn total_player_rating(&self) -> Rating {
        self.league
            .leaderboard(None)
            .unwrap()
            .iter()
            .map(|p| p.rating)
            .sum()
    }
}

/// Build a team value directly, for engine-level tests
pub fn team(id: TeamId, player_ids: [PlayerId; 2], rating: Rating) -> Team {
    Team {
        id,
        name: format!("team{}", id),
        player_ids,
        rating,
    }
}

/// Player ratings keyed by id
pub fn player_ratings(entries: &[(PlayerId, Rating)]) -> HashMap<PlayerId, Rating> {
    entries.iter().cloned().collect()
}
