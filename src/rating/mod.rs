//! ELO rating system
//!
//! This module provides the pure rating engine, the calculator seam used by
//! match orchestration, and the storage interface for ratings and history.

pub mod calculator;
pub mod elo;
pub mod storage;

// Re-export commonly used types
pub use calculator::{EloRatingCalculator, RatingCalculator};
pub use storage::{InMemoryRatingStorage, RatingStorage};
