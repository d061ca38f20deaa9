//! Error types for the ranking service
//!
//! Engine precondition failures are typed (`EloError`) so callers can tell a
//! rejected match apart from storage or lookup problems, which travel as
//! `anyhow` errors carrying a `RankingError`.

use crate::types::{MatchId, PlayerId, Rating, TeamId};

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Result type for the pure rating engine
pub type EloResult<T> = std::result::Result<T, EloError>;

/// Precondition violations reported by the rating engine
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EloError {
    #[error("Rating must be non-negative, got {rating}")]
    NegativeRating { rating: Rating },

    #[error("Win probability must be within [0, 1], got {probability}")]
    ProbabilityOutOfRange { probability: f64 },

    #[error("K-factor must be positive, got {k_factor}")]
    NonPositiveKFactor { k_factor: i64 },

    #[error("Missing rating for player {player_id}")]
    MissingPlayer { player_id: PlayerId },

    #[error("Rating arithmetic overflowed while computing {operation}")]
    RatingOverflow { operation: &'static str },
}

/// Errors raised by storage and match orchestration
#[derive(Debug, thiserror::Error)]
pub enum RankingError {
    #[error("Player not found: {player_id}")]
    PlayerNotFound { player_id: PlayerId },

    #[error("Team not found: {team_id}")]
    TeamNotFound { team_id: TeamId },

    #[error("Match not found: {match_id}")]
    MatchNotFound { match_id: MatchId },

    #[error("Invalid match: {reason}")]
    InvalidMatch { reason: String },

    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Internal service error: {message}")]
    InternalError { message: String },
}
