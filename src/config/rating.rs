//! Rating system configuration

use crate::error::RankingError;
use crate::types::Rating;
use serde::{Deserialize, Serialize};

/// Rating settings for newly registered participants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    /// Rating given to a player on registration
    pub initial_rating: Rating,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            initial_rating: 1000,
        }
    }
}

impl RatingConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.initial_rating < 0 {
            return Err(RankingError::ConfigurationError {
                message: format!(
                    "Initial rating must be non-negative, got {}",
                    self.initial_rating
                ),
            }
            .into());
        }

        Ok(())
    }
}
