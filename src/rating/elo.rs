//! ELO rating engine with tiered K-factors and pool correction
//!
//! Every function here is pure: ratings go in as arguments and new values come
//! back out. Deltas are truncated toward zero, never floored or rounded.

use crate::error::{EloError, EloResult};
use crate::types::{
    MatchRatingChanges, MatchResult, ParticipantId, PlayerId, PoolEntry, Rating, RatingChange,
    Team, TeamId,
};
use std::collections::HashMap;

/// K-factor below `MID_TIER_THRESHOLD`
pub const K_FACTOR_LOW_TIER: i64 = 200;
/// K-factor from `MID_TIER_THRESHOLD` up to `HIGH_TIER_THRESHOLD`
pub const K_FACTOR_MID_TIER: i64 = 100;
/// K-factor from `HIGH_TIER_THRESHOLD` upwards
pub const K_FACTOR_HIGH_TIER: i64 = 50;

pub const MID_TIER_THRESHOLD: Rating = 1200;
pub const HIGH_TIER_THRESHOLD: Rating = 1800;

/// Rating difference at which the stronger side is ten times as likely to win
const ELO_SCALE: f64 = 400.0;

fn ensure_non_negative(rating: Rating) -> EloResult<Rating> {
    if rating < 0 {
        return Err(EloError::NegativeRating { rating });
    }
    Ok(rating)
}

fn ensure_probability(probability: f64) -> EloResult<f64> {
    // NaN fails the range check as well
    if !(0.0..=1.0).contains(&probability) {
        return Err(EloError::ProbabilityOutOfRange { probability });
    }
    Ok(probability)
}

fn overflow(operation: &'static str) -> EloError {
    EloError::RatingOverflow { operation }
}

fn truncated_delta(k_factor: i64, result: MatchResult, win_probability: f64) -> i64 {
    (k_factor as f64 * (result.score() - win_probability)).trunc() as i64
}

/// Team rating derived from its two players: the mean, truncated.
///
/// A sum of 2001 yields 1000, not 1001.
pub fn derive_team_rating(rating_a: Rating, rating_b: Rating) -> EloResult<Rating> {
    let rating_a = ensure_non_negative(rating_a)?;
    let rating_b = ensure_non_negative(rating_b)?;
    // Halves first so the sum of two large ratings cannot overflow
    Ok(rating_a / 2 + rating_b / 2 + (rating_a % 2 + rating_b % 2) / 2)
}

/// Expected probability that a participant rated `rating_a` beats one rated
/// `rating_b`.
pub fn win_probability(rating_a: Rating, rating_b: Rating) -> EloResult<f64> {
    let rating_a = ensure_non_negative(rating_a)?;
    let rating_b = ensure_non_negative(rating_b)?;

    let exponent = (rating_b - rating_a) as f64 / ELO_SCALE;
    Ok(1.0 / (1.0 + 10f64.powf(exponent)))
}

/// Sensitivity of a rating to a single match
pub fn k_factor(rating: Rating) -> EloResult<i64> {
    let rating = ensure_non_negative(rating)?;

    let k = if rating < MID_TIER_THRESHOLD {
        K_FACTOR_LOW_TIER
    } else if rating < HIGH_TIER_THRESHOLD {
        K_FACTOR_MID_TIER
    } else {
        K_FACTOR_HIGH_TIER
    };
    Ok(k)
}

/// Uncorrected rating change: `trunc(K(rating) * (score - win_probability))`
pub fn calculate_elo_change(
    rating: Rating,
    win_probability: f64,
    result: MatchResult,
) -> EloResult<i64> {
    let k = k_factor(rating)?;
    let win_probability = ensure_probability(win_probability)?;
    Ok(truncated_delta(k, result, win_probability))
}

/// Compute corrected deltas for every participant of one match.
///
/// Raw deltas rarely sum to zero because each win probability is taken
/// against the opposing side only. The surplus is spread back over the pool
/// in proportion to each participant's K-factor, which leaves a residual of
/// at most one point per participant from truncation.
pub fn apply_pool_correction(
    pool: &HashMap<ParticipantId, PoolEntry>,
) -> EloResult<HashMap<ParticipantId, RatingChange>> {
    let mut raw_deltas = Vec::with_capacity(pool.len());
    let mut total_k = 0i64;
    let mut surplus = 0i64;

    for (&participant_id, entry) in pool {
        ensure_non_negative(entry.old_rating)?;
        let win_probability = ensure_probability(entry.win_probability)?;
        if entry.k_factor <= 0 {
            return Err(EloError::NonPositiveKFactor {
                k_factor: entry.k_factor,
            });
        }

        let raw = truncated_delta(entry.k_factor, entry.result, win_probability);
        total_k = total_k
            .checked_add(entry.k_factor)
            .ok_or_else(|| overflow("total K-factor"))?;
        surplus = surplus
            .checked_add(raw)
            .ok_or_else(|| overflow("pool surplus"))?;
        raw_deltas.push((participant_id, entry, raw));
    }

    let correction_per_k = if total_k == 0 {
        0.0
    } else {
        -(surplus as f64) / total_k as f64
    };

    let changes = raw_deltas
        .into_iter()
        .map(|(participant_id, entry, raw)| {
            let correction = (entry.k_factor as f64 * correction_per_k).trunc() as i64;
            let delta = raw
                .checked_add(correction)
                .ok_or_else(|| overflow("corrected delta"))?;
            let new_rating = entry
                .old_rating
                .checked_add(delta)
                .ok_or_else(|| overflow("new rating"))?;
            Ok((
                participant_id,
                RatingChange {
                    old_rating: entry.old_rating,
                    new_rating,
                    delta,
                },
            ))
        })
        .collect::<EloResult<HashMap<_, _>>>()?;

    Ok(changes)
}

fn team_player_ratings(
    team: &Team,
    player_ratings: &HashMap<PlayerId, Rating>,
) -> EloResult<[(PlayerId, Rating); 2]> {
    let lookup = |player_id: PlayerId| {
        player_ratings
            .get(&player_id)
            .map(|&rating| (player_id, rating))
            .ok_or(EloError::MissingPlayer { player_id })
    };

    Ok([lookup(team.player_ids[0])?, lookup(team.player_ids[1])?])
}

fn insert_side(
    pool: &mut HashMap<ParticipantId, PoolEntry>,
    participants: &[(ParticipantId, Rating)],
    win_probability: f64,
    result: MatchResult,
) -> EloResult<()> {
    for &(participant_id, rating) in participants {
        pool.insert(
            participant_id,
            PoolEntry {
                old_rating: rating,
                win_probability,
                result,
                k_factor: k_factor(rating)?,
            },
        );
    }
    Ok(())
}

/// Player-level deltas: one pool spanning all four players of the match.
///
/// Win probabilities come from the derived team ratings while each player's
/// own rating selects its K-factor.
pub fn compute_player_deltas(
    winning_team: &Team,
    losing_team: &Team,
    player_ratings: &HashMap<PlayerId, Rating>,
) -> EloResult<HashMap<PlayerId, RatingChange>> {
    let winners = team_player_ratings(winning_team, player_ratings)?;
    let losers = team_player_ratings(losing_team, player_ratings)?;

    let winning_rating = derive_team_rating(winners[0].1, winners[1].1)?;
    let losing_rating = derive_team_rating(losers[0].1, losers[1].1)?;
    let probability = win_probability(winning_rating, losing_rating)?;

    let mut pool = HashMap::with_capacity(4);
    insert_side(&mut pool, &winners, probability, MatchResult::Win)?;
    insert_side(&mut pool, &losers, 1.0 - probability, MatchResult::Loss)?;

    apply_pool_correction(&pool)
}

/// Team-level deltas: a two-entry pool using the stored team ratings.
pub fn compute_team_deltas(
    winning_team: &Team,
    losing_team: &Team,
) -> EloResult<HashMap<TeamId, RatingChange>> {
    let probability = win_probability(winning_team.rating, losing_team.rating)?;

    let mut pool = HashMap::with_capacity(2);
    insert_side(
        &mut pool,
        &[(winning_team.id, winning_team.rating)],
        probability,
        MatchResult::Win,
    )?;
    insert_side(
        &mut pool,
        &[(losing_team.id, losing_team.rating)],
        1.0 - probability,
        MatchResult::Loss,
    )?;

    apply_pool_correction(&pool)
}

/// Compute both delta sets for a finished match.
///
/// All four player ratings must be present in `player_ratings`; a missing
/// one is rejected before any delta is computed.
pub fn process_match(
    winning_team: &Team,
    losing_team: &Team,
    player_ratings: &HashMap<PlayerId, Rating>,
) -> EloResult<MatchRatingChanges> {
    for &player_id in winning_team
        .player_ids
        .iter()
        .chain(losing_team.player_ids.iter())
    {
        if !player_ratings.contains_key(&player_id) {
            return Err(EloError::MissingPlayer { player_id });
        }
    }

    Ok(MatchRatingChanges {
        player_changes: compute_player_deltas(winning_team, losing_team, player_ratings)?,
        team_changes: compute_team_deltas(winning_team, losing_team)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(id: TeamId, player_ids: [PlayerId; 2], rating: Rating) -> Team {
        Team {
            id,
            name: format!("team{}", id),
            player_ids,
            rating,
        }
    }

    fn ratings(entries: &[(PlayerId, Rating)]) -> HashMap<PlayerId, Rating> {
        entries.iter().cloned().collect()
    }

    #[test]
    fn test_team_rating_truncates() {
        assert_eq!(derive_team_rating(1001, 1000).unwrap(), 1000);
        assert_eq!(derive_team_rating(1500, 1500).unwrap(), 1500);
        assert_eq!(derive_team_rating(0, 1).unwrap(), 0);
    }

    #[test]
    fn test_team_rating_of_huge_ratings() {
        assert_eq!(derive_team_rating(i64::MAX, 1).unwrap(), 1i64 << 62);
        assert_eq!(derive_team_rating(i64::MAX, i64::MAX).unwrap(), i64::MAX);
        assert_eq!(derive_team_rating(i64::MAX, 0).unwrap(), i64::MAX / 2);
        assert_eq!(derive_team_rating(3, 5).unwrap(), 4);
    }

    #[test]
    fn test_rating_overflow_is_reported() {
        let winners = team(1, [1, 2], i64::MAX);
        let losers = team(2, [3, 4], i64::MAX);
        assert_eq!(
            compute_team_deltas(&winners, &losers),
            Err(EloError::RatingOverflow {
                operation: "new rating"
            })
        );

        // Losing from the top of the range still moves down normally
        let changes = compute_team_deltas(&team(1, [1, 2], 0), &losers).unwrap();
        assert_eq!(changes[&1].new_rating, 80);
        assert_eq!(changes[&2].delta, -80);
        assert_eq!(changes[&2].new_rating, i64::MAX - 80);

        let mut pool = HashMap::new();
        for (id, result) in [(1, MatchResult::Win), (2, MatchResult::Loss)] {
            pool.insert(
                id,
                PoolEntry {
                    old_rating: 1500,
                    win_probability: 0.5,
                    result,
                    k_factor: i64::MAX,
                },
            );
        }
        assert_eq!(
            apply_pool_correction(&pool),
            Err(EloError::RatingOverflow {
                operation: "total K-factor"
            })
        );
    }

    #[test]
    fn test_equal_ratings_give_even_odds() {
        assert_eq!(win_probability(1500, 1500).unwrap(), 0.5);
        assert_eq!(win_probability(0, 0).unwrap(), 0.5);
    }

    #[test]
    fn test_win_probability_favours_higher_rating() {
        let p = win_probability(1900, 1500).unwrap();
        // 400 points apart: 10 to 1
        assert!((p - 10.0 / 11.0).abs() < 1e-12);
        assert!((p + win_probability(1500, 1900).unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_k_factor_tier_boundaries() {
        assert_eq!(k_factor(0).unwrap(), 200);
        assert_eq!(k_factor(1199).unwrap(), 200);
        assert_eq!(k_factor(1200).unwrap(), 100);
        assert_eq!(k_factor(1799).unwrap(), 100);
        assert_eq!(k_factor(1800).unwrap(), 50);
        assert_eq!(k_factor(3000).unwrap(), 50);
    }

    #[test]
    fn test_elo_change_truncates_toward_zero() {
        assert_eq!(
            calculate_elo_change(1000, 0.25, MatchResult::Win).unwrap(),
            150
        );
        // 100 * (0 - 0.003) = -0.3 truncates to 0, not -1
        assert_eq!(
            calculate_elo_change(1500, 0.003, MatchResult::Loss).unwrap(),
            0
        );
        assert_eq!(
            calculate_elo_change(1500, 0.5, MatchResult::Loss).unwrap(),
            -50
        );
    }

    #[test]
    fn test_invalid_inputs_are_rejected() {
        assert_eq!(
            k_factor(-1),
            Err(EloError::NegativeRating { rating: -1 })
        );
        assert_eq!(
            win_probability(-1, 1500),
            Err(EloError::NegativeRating { rating: -1 })
        );
        assert_eq!(
            win_probability(1500, -20),
            Err(EloError::NegativeRating { rating: -20 })
        );
        assert_eq!(
            derive_team_rating(-1, 1500),
            Err(EloError::NegativeRating { rating: -1 })
        );
        assert_eq!(
            calculate_elo_change(1500, 1.5, MatchResult::Win),
            Err(EloError::ProbabilityOutOfRange { probability: 1.5 })
        );
        assert!(matches!(
            calculate_elo_change(1500, f64::NAN, MatchResult::Win),
            Err(EloError::ProbabilityOutOfRange { .. })
        ));
        assert_eq!(
            calculate_elo_change(-5, 0.5, MatchResult::Win),
            Err(EloError::NegativeRating { rating: -5 })
        );
    }

    #[test]
    fn test_pool_correction_rejects_bad_entries() {
        let mut pool = HashMap::new();
        pool.insert(
            1,
            PoolEntry {
                old_rating: 1500,
                win_probability: 0.5,
                result: MatchResult::Win,
                k_factor: 0,
            },
        );
        assert_eq!(
            apply_pool_correction(&pool),
            Err(EloError::NonPositiveKFactor { k_factor: 0 })
        );

        pool.insert(
            1,
            PoolEntry {
                old_rating: 1500,
                win_probability: -0.1,
                result: MatchResult::Win,
                k_factor: 100,
            },
        );
        assert_eq!(
            apply_pool_correction(&pool),
            Err(EloError::ProbabilityOutOfRange { probability: -0.1 })
        );
    }

    #[test]
    fn test_empty_pool_yields_no_changes() {
        let changes = apply_pool_correction(&HashMap::new()).unwrap();
        assert!(changes.is_empty());
    }

    #[test]
    fn test_pool_correction_spreads_surplus_by_k_factor() {
        let mut pool = HashMap::new();
        pool.insert(
            1,
            PoolEntry {
                old_rating: 1000,
                win_probability: 0.5,
                result: MatchResult::Win,
                k_factor: 200,
            },
        );
        pool.insert(
            2,
            PoolEntry {
                old_rating: 1900,
                win_probability: 0.5,
                result: MatchResult::Loss,
                k_factor: 50,
            },
        );

        // raw +100 / -25, surplus 75 over total K 250: -0.3 per K point
        let changes = apply_pool_correction(&pool).unwrap();
        assert_eq!(changes[&1].delta, 40);
        assert_eq!(changes[&1].new_rating, 1040);
        assert_eq!(changes[&2].delta, -40);
        assert_eq!(changes[&2].new_rating, 1860);
    }

    #[test]
    fn test_equal_low_tier_match() {
        let winners = team(10, [1, 2], 1000);
        let losers = team(20, [3, 4], 1000);
        let players = ratings(&[(1, 1000), (2, 1000), (3, 1000), (4, 1000)]);

        let changes = process_match(&winners, &losers, &players).unwrap();
        assert_eq!(changes.player_changes[&1].delta, 100);
        assert_eq!(changes.player_changes[&2].delta, 100);
        assert_eq!(changes.player_changes[&3].delta, -100);
        assert_eq!(changes.player_changes[&4].delta, -100);
        assert_eq!(changes.player_delta_sum(), 0);

        assert_eq!(changes.team_changes[&10].delta, 100);
        assert_eq!(changes.team_changes[&20].delta, -100);
    }

    #[test]
    fn test_equal_mid_tier_match() {
        let winners = team(10, [1, 2], 1500);
        let losers = team(20, [3, 4], 1500);
        let players = ratings(&[(1, 1500), (2, 1500), (3, 1500), (4, 1500)]);

        let changes = process_match(&winners, &losers, &players).unwrap();
        for (player_id, expected) in [(1, 50), (2, 50), (3, -50), (4, -50)] {
            let change = changes.player_changes[&player_id];
            assert_eq!(change.old_rating, 1500);
            assert_eq!(change.delta, expected);
            assert_eq!(change.new_rating, 1500 + expected);
        }

        assert_eq!(
            changes.team_changes[&10],
            RatingChange {
                old_rating: 1500,
                new_rating: 1550,
                delta: 50
            }
        );
        assert_eq!(
            changes.team_changes[&20],
            RatingChange {
                old_rating: 1500,
                new_rating: 1450,
                delta: -50
            }
        );
    }

    #[test]
    fn test_upset_shifts_surplus_onto_high_k_side() {
        let winners = team(10, [1, 2], 1000);
        let losers = team(20, [3, 4], 2000);
        let players = ratings(&[(1, 1000), (2, 1000), (3, 2000), (4, 2000)]);

        let p = win_probability(1000, 2000).unwrap();
        let naive_win = calculate_elo_change(1000, p, MatchResult::Win).unwrap();
        let naive_loss = calculate_elo_change(2000, 1.0 - p, MatchResult::Loss).unwrap();
        assert_eq!(naive_win, 199);
        assert_eq!(naive_loss, -49);

        let changes = process_match(&winners, &losers, &players).unwrap();
        let win_delta = changes.player_changes[&1].delta;
        let loss_delta = changes.player_changes[&3].delta;

        assert_eq!(win_delta, 79);
        assert_eq!(loss_delta, -79);
        assert!(win_delta < naive_win);
        assert!(loss_delta < naive_loss);
        assert!(changes.player_delta_sum().abs() <= 3);

        assert_eq!(changes.team_changes[&10].delta, 79);
        assert_eq!(changes.team_changes[&20].delta, -79);
    }

    #[test]
    fn test_mixed_tiers_leave_truncation_residual() {
        // K-factors 200/100 against 50/50: surplus 199 over total K 400
        let winners = team(10, [1, 2], 1200);
        let losers = team(20, [3, 4], 2037);
        let players = ratings(&[(1, 1100), (2, 1300), (3, 2037), (4, 2037)]);

        let changes = process_match(&winners, &losers, &players).unwrap();
        assert_eq!(changes.player_changes[&1].delta, 99);
        assert_eq!(changes.player_changes[&2].delta, 50);
        assert_eq!(changes.player_changes[&3].delta, -73);
        assert_eq!(changes.player_changes[&4].delta, -73);
        assert_eq!(changes.player_delta_sum(), 3);

        assert_eq!(changes.team_changes[&10].delta, 66);
        assert_eq!(changes.team_changes[&20].delta, -65);
        assert_eq!(changes.team_delta_sum(), 1);
    }

    #[test]
    fn test_missing_player_rejected() {
        let winners = team(10, [1, 2], 1500);
        let losers = team(20, [3, 4], 1500);
        let players = ratings(&[(1, 1500), (2, 1500), (3, 1500)]);

        assert_eq!(
            process_match(&winners, &losers, &players),
            Err(EloError::MissingPlayer { player_id: 4 })
        );
        assert_eq!(
            compute_player_deltas(&winners, &losers, &players),
            Err(EloError::MissingPlayer { player_id: 4 })
        );
    }

    #[test]
    fn test_negative_team_rating_rejected() {
        let winners = team(10, [1, 2], -3);
        let losers = team(20, [3, 4], 1500);

        assert_eq!(
            compute_team_deltas(&winners, &losers),
            Err(EloError::NegativeRating { rating: -3 })
        );
    }

    #[test]
    fn test_new_rating_is_not_floored() {
        let winners = team(10, [1, 2], 0);
        let losers = team(20, [3, 4], 100);
        let players = ratings(&[(1, 0), (2, 0), (3, 100), (4, 100)]);

        let changes = process_match(&winners, &losers, &players).unwrap();
        assert_eq!(changes.player_changes[&1].new_rating, 128);
        assert_eq!(changes.player_changes[&3].delta, -128);
        assert_eq!(changes.player_changes[&3].new_rating, -28);
    }
}
