//! Baby-foot Ranking - ELO ratings for 2v2 table-football matches
//!
//! This crate provides a pool-corrected, tiered-K-factor ELO engine plus the
//! storage and league bookkeeping needed to record matches against it.

pub mod config;
pub mod error;
pub mod league;
pub mod rating;
pub mod types;

// Re-export commonly used types and traits
pub use error::{EloError, EloResult, RankingError, Result};
pub use types::*;

// Re-export key components
pub use league::{LeagueService, MatchReport};
pub use rating::{EloRatingCalculator, InMemoryRatingStorage, RatingCalculator, RatingStorage};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
