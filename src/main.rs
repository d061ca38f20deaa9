//! Command line entry point for the baby-foot ranking engine
//!
//! Simulates a single match or replays a league file through the full
//! storage + engine stack and prints the resulting standings.

use anyhow::{anyhow, Context, Result};
use babyfoot_ranking::config::AppConfig;
use babyfoot_ranking::rating::{EloRatingCalculator, InMemoryRatingStorage, RatingCalculator};
use babyfoot_ranking::types::{PlayerId, Rating, Team, TeamId};
use babyfoot_ranking::{LeagueService, VERSION};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

/// Baby-foot Ranking - ELO ratings for 2v2 table-football matches
#[derive(Parser)]
#[command(
    name = "babyfoot-ranking",
    version = VERSION,
    about = "Pool-corrected ELO ratings for 2v2 table-football matches",
    long_about = "Computes player-level and team-level ELO changes for baby-foot matches using \
                 tiered K-factors and a pool correction that keeps each match zero-sum, and \
                 replays whole leagues to produce leaderboards."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    /// Dry run mode (validate config and exit)
    #[arg(long, help = "Validate configuration and exit without running a command")]
    dry_run: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Compute the rating changes of a single match
    Simulate {
        /// Ratings of the two winning players, comma separated
        #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
        winners: Vec<Rating>,

        /// Ratings of the two losing players, comma separated
        #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
        losers: Vec<Rating>,

        /// Stored rating of the winning team (defaults to its players' mean)
        #[arg(long, allow_negative_numbers = true)]
        winning_team_rating: Option<Rating>,

        /// Stored rating of the losing team (defaults to its players' mean)
        #[arg(long, allow_negative_numbers = true)]
        losing_team_rating: Option<Rating>,
    },

    /// Replay a league file (players, teams, matches) and print standings
    Replay {
        /// League file in JSON format
        file: PathBuf,

        /// Number of entries to show per leaderboard
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
}

/// League file layout accepted by `replay`
#[derive(Debug, Deserialize)]
struct LeagueFile {
    players: Vec<String>,
    teams: Vec<LeagueFileTeam>,
    #[serde(default)]
    matches: Vec<LeagueFileMatch>,
}

#[derive(Debug, Deserialize)]
struct LeagueFileTeam {
    name: String,
    players: [String; 2],
}

#[derive(Debug, Deserialize)]
struct LeagueFileMatch {
    winner: String,
    loser: String,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Load configuration from file or environment, then apply CLI overrides
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(config_path) => AppConfig::from_file(config_path)?,
        None => AppConfig::from_env()?,
    };

    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    babyfoot_ranking::config::validate_config(&config)?;
    Ok(config)
}

fn team_from_ratings(
    team_id: TeamId,
    player_ids: [PlayerId; 2],
    ratings: &[Rating],
    stored_rating: Option<Rating>,
) -> Result<Team> {
    if ratings.len() != 2 {
        return Err(anyhow!(
            "A team needs exactly two player ratings, got {}",
            ratings.len()
        ));
    }

    let rating = match stored_rating {
        Some(rating) => rating,
        None => babyfoot_ranking::rating::elo::derive_team_rating(ratings[0], ratings[1])?,
    };

    Ok(Team {
        id: team_id,
        name: format!("team{}", team_id),
        player_ids,
        rating,
    })
}

fn run_simulate(
    config: &AppConfig,
    winners: &[Rating],
    losers: &[Rating],
    winning_team_rating: Option<Rating>,
    losing_team_rating: Option<Rating>,
) -> Result<()> {
    let calculator = EloRatingCalculator::new(config.rating.clone())?;

    let winning_team = team_from_ratings(1, [1, 2], winners, winning_team_rating)?;
    let losing_team = team_from_ratings(2, [3, 4], losers, losing_team_rating)?;
    let player_ratings: HashMap<PlayerId, Rating> = [1, 2, 3, 4]
        .into_iter()
        .zip(winners.iter().chain(losers.iter()).copied())
        .collect();

    let changes = calculator.process_match(&winning_team, &losing_team, &player_ratings)?;
    info!(
        "Player delta sum {}, team delta sum {}",
        changes.player_delta_sum(),
        changes.team_delta_sum()
    );

    println!("{}", serde_json::to_string_pretty(&changes)?);
    Ok(())
}

fn run_replay(config: &AppConfig, file: &Path, top: usize) -> Result<()> {
    let contents = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read league file {}", file.display()))?;
    let league_file: LeagueFile =
        serde_json::from_str(&contents).context("Invalid league file")?;

    let storage = Arc::new(InMemoryRatingStorage::new());
    let calculator = Arc::new(EloRatingCalculator::new(config.rating.clone())?);
    let league = LeagueService::new(storage, calculator);

    let mut player_ids = HashMap::new();
    for name in &league_file.players {
        let player = league.register_player(name)?;
        player_ids.insert(name.clone(), player.id);
    }

    let lookup_player = |name: &str| {
        player_ids
            .get(name)
            .copied()
            .ok_or_else(|| anyhow!("Unknown player '{}'", name))
    };

    let mut team_ids = HashMap::new();
    for team in &league_file.teams {
        let registered = league.register_team(
            &team.name,
            lookup_player(&team.players[0])?,
            lookup_player(&team.players[1])?,
        )?;
        team_ids.insert(team.name.clone(), registered.id);
    }

    let lookup_team = |name: &str| {
        team_ids
            .get(name)
            .copied()
            .ok_or_else(|| anyhow!("Unknown team '{}'", name))
    };

    for (index, played) in league_file.matches.iter().enumerate() {
        league
            .record_match(lookup_team(&played.winner)?, lookup_team(&played.loser)?)
            .with_context(|| {
                format!(
                    "Match #{} ({} vs {}) rejected",
                    index + 1,
                    played.winner,
                    played.loser
                )
            })?;
    }

    info!(
        "Replayed {} matches between {} teams",
        league_file.matches.len(),
        league_file.teams.len()
    );

    println!("Players");
    for (rank, player) in league.leaderboard(Some(top))?.iter().enumerate() {
        println!("  {:>3}. {:<20} {:>6}", rank + 1, player.name, player.rating);
    }
    println!("Teams");
    for (rank, team) in league.team_leaderboard(Some(top))?.iter().enumerate() {
        println!("  {:>3}. {:<20} {:>6}", rank + 1, team.name, team.rating);
    }

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    if args.dry_run {
        info!(
            "Configuration valid for {} v{}: service '{}', initial rating {}",
            env!("CARGO_PKG_NAME"),
            VERSION,
            config.service.name,
            config.rating.initial_rating
        );
        return Ok(());
    }

    let result = match &args.command {
        Some(Command::Simulate {
            winners,
            losers,
            winning_team_rating,
            losing_team_rating,
        }) => run_simulate(
            &config,
            winners,
            losers,
            *winning_team_rating,
            *losing_team_rating,
        ),
        Some(Command::Replay { file, top }) => run_replay(&config, file, *top),
        None => Err(anyhow!("No command given, see --help")),
    };

    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}
