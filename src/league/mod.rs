//! League bookkeeping: registering players and teams, recording matches

pub mod service;

pub use service::{LeagueService, MatchReport};
