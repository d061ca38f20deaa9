//! Property tests for the ELO engine

mod fixtures;

use babyfoot_ranking::error::EloError;
use babyfoot_ranking::rating::elo::{
    calculate_elo_change, derive_team_rating, k_factor, process_match, win_probability,
};
use babyfoot_ranking::types::MatchResult;
use fixtures::{player_ratings, team};
use proptest::prelude::*;

proptest! {
    #[test]
    fn win_probability_is_symmetric(a in 0i64..4000, b in 0i64..4000) {
        let forward = win_probability(a, b).unwrap();
        let backward = win_probability(b, a).unwrap();
        prop_assert!((forward + backward - 1.0).abs() < 1e-9);
        prop_assert!((0.0..=1.0).contains(&forward));
    }

    #[test]
    fn team_rating_is_truncated_mean(a in 0i64..4000, b in 0i64..4000) {
        let rating = derive_team_rating(a, b).unwrap();
        prop_assert_eq!(rating, (a + b) / 2);
        prop_assert!(rating >= a.min(b) && rating <= a.max(b));
    }

    #[test]
    fn k_factor_is_one_of_three_tiers(rating in 0i64..5000) {
        let k = k_factor(rating).unwrap();
        prop_assert!([200, 100, 50].contains(&k));
        if rating >= 1800 {
            prop_assert_eq!(k, 50);
        }
    }

    #[test]
    fn raw_change_is_bounded_by_k(rating in 0i64..4000, p in 0.0f64..=1.0) {
        let k = k_factor(rating).unwrap();
        let win = calculate_elo_change(rating, p, MatchResult::Win).unwrap();
        let loss = calculate_elo_change(rating, p, MatchResult::Loss).unwrap();
        prop_assert!(win >= 0 && win <= k);
        prop_assert!(loss <= 0 && loss >= -k);
    }

    #[test]
    fn negative_ratings_are_rejected(rating in i64::MIN / 2..0) {
        prop_assert_eq!(k_factor(rating), Err(EloError::NegativeRating { rating }));
        prop_assert!(win_probability(rating, 1500).is_err());
        prop_assert!(derive_team_rating(1500, rating).is_err());
    }

    #[test]
    fn match_deltas_sum_to_zero_within_truncation(
        w1 in 0i64..3000,
        w2 in 0i64..3000,
        l1 in 0i64..3000,
        l2 in 0i64..3000,
    ) {
        let winners = team(10, [1, 2], (w1 + w2) / 2);
        let losers = team(20, [3, 4], (l1 + l2) / 2);
        let players = player_ratings(&[(1, w1), (2, w2), (3, l1), (4, l2)]);

        let changes = process_match(&winners, &losers, &players).unwrap();

        prop_assert_eq!(changes.player_changes.len(), 4);
        prop_assert_eq!(changes.team_changes.len(), 2);
        prop_assert!(changes.player_delta_sum().abs() <= 3);
        prop_assert!(changes.team_delta_sum().abs() <= 1);

        for change in changes.player_changes.values().chain(changes.team_changes.values()) {
            prop_assert_eq!(change.old_rating + change.delta, change.new_rating);
        }
    }
}
