//! Rating calculator trait and the ELO implementation
//!
//! The league service only talks to the engine through `RatingCalculator`,
//! which keeps the orchestration testable with other calculators.

use crate::config::RatingConfig;
use crate::error::EloResult;
use crate::rating::elo;
use crate::types::{MatchRatingChanges, PlayerId, Rating, Team};
use std::collections::HashMap;
use tracing::debug;

/// Trait for calculating rating changes after a match
pub trait RatingCalculator: Send + Sync {
    /// Calculate player-level and team-level rating changes
    ///
    /// # Arguments
    /// * `winning_team` - Team that won, with its current team rating
    /// * `losing_team` - Team that lost, with its current team rating
    /// * `player_ratings` - Fresh ratings of (at least) the four players
    fn process_match(
        &self,
        winning_team: &Team,
        losing_team: &Team,
        player_ratings: &HashMap<PlayerId, Rating>,
    ) -> EloResult<MatchRatingChanges>;

    /// Get the initial rating for new players
    fn initial_rating(&self) -> Rating;
}

/// Pool-corrected ELO calculator
#[derive(Debug, Clone, Default)]
pub struct EloRatingCalculator {
    config: RatingConfig,
}

impl EloRatingCalculator {
    /// Create a new ELO calculator
    pub fn new(config: RatingConfig) -> crate::error::Result<Self> {
        config.validate()?;

        Ok(Self { config })
    }

    pub fn config(&self) -> &RatingConfig {
        &self.config
    }
}

impl RatingCalculator for EloRatingCalculator {
    fn process_match(
        &self,
        winning_team: &Team,
        losing_team: &Team,
        player_ratings: &HashMap<PlayerId, Rating>,
    ) -> EloResult<MatchRatingChanges> {
        let changes = elo::process_match(winning_team, losing_team, player_ratings)?;

        debug!(
            "Team {} beat team {}: player delta sum {}, team delta sum {}",
            winning_team.id,
            losing_team.id,
            changes.player_delta_sum(),
            changes.team_delta_sum()
        );

        Ok(changes)
    }

    fn initial_rating(&self) -> Rating {
        self.config.initial_rating
    }
}
