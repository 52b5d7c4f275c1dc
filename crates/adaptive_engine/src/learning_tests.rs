use super::*;
use crate::eval::WeightCategory;

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn test_expected_score_is_half_at_base_rating() {
    assert!(approx(expected_score(BASE_ELO), 0.5));
    assert!(expected_score(1900.0) < 0.5);
    assert!(expected_score(1100.0) > 0.5);
}

#[test]
fn test_first_win_from_defaults() {
    let mut state = LearningState::default();
    let update = state.record_result(GameOutcome::Win.score());

    assert!(approx(update.expected, 0.5));
    assert!(approx(state.elo, 1510.0));
    assert!(approx(update.elo_before, 1500.0));
    assert!(approx(update.elo_after, 1510.0));
    assert!(approx(state.weights.get(WeightCategory::Pawn), 1.005));
    assert!(approx(state.weights.get(WeightCategory::Mobility), 1.005));
    assert_eq!(state.games, 1);
    assert!(approx(state.performance, 1.0));
}

#[test]
fn test_performance_running_average() {
    let mut state = LearningState {
        games: 3,
        performance: 0.5,
        ..LearningState::default()
    };
    state.record_result(1.0);
    // (0.5 * 2 + 1.0) / 3
    assert!(approx(state.performance, 2.0 / 3.0));
    assert_eq!(state.games, 4);
}

#[test]
fn test_draw_at_base_rating_changes_nothing_but_counters() {
    let mut state = LearningState::default();
    state.record_result(GameOutcome::Draw.score());
    assert!(approx(state.elo, BASE_ELO));
    assert!(approx(state.weights.get(WeightCategory::King), 1.0));
    assert_eq!(state.games, 1);
}

#[test]
fn test_ranges_hold_under_long_streaks() {
    let mut state = LearningState::default();
    for _ in 0..2_000 {
        state.record_result(0.0);
        assert!(state.elo >= MIN_ELO && state.elo <= MAX_ELO);
        for (_, w) in state.weights.iter() {
            assert!((MIN_WEIGHT..=MAX_WEIGHT).contains(&w));
        }
        assert!((0.0..=1.0).contains(&state.performance));
    }
    assert!(approx(state.weights.get(WeightCategory::Pawn), MIN_WEIGHT));

    for _ in 0..5_000 {
        state.record_result(1.0);
    }
    assert!(state.elo <= MAX_ELO);
    assert!(state.weights.get(WeightCategory::Pawn) <= MAX_WEIGHT);
}

#[test]
fn test_normalize_clamps_and_fills() {
    let mut state: LearningState =
        serde_json::from_str(r#"{"weights":{"pawn":7.5},"games":4,"performance":1.4,"elo":12}"#)
            .unwrap();
    assert!(state.normalize());
    assert!(approx(state.weights.get(WeightCategory::Pawn), MAX_WEIGHT));
    assert_eq!(state.weights.iter().count(), 3);
    assert!(approx(state.elo, MIN_ELO));
    assert!(approx(state.performance, 1.0));
    assert!(!state.normalize());
}

#[test]
fn test_partial_record_uses_defaults() {
    let state: LearningState = serde_json::from_str(r#"{"games": 12}"#).unwrap();
    assert_eq!(state.games, 12);
    assert!(approx(state.elo, BASE_ELO));
    assert_eq!(state.weights, crate::eval::Weights::default());
    assert_eq!(state.search_depth(), 3);
}

#[test]
fn test_update_summary_is_readable() {
    let mut state = LearningState::default();
    let text = state.record_result(1.0).to_string();
    assert!(text.contains("elo 1500 -> 1510"));
    assert!(text.contains("games 1"));
}
