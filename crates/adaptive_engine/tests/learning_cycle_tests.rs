//! End-to-end learning cycle: play a few plies against the engine while
//! recording comparisons, analyse, update the profile and persist it.

use adaptive_engine::{
    analyze, AdaptiveEngine, GameOutcome, GameRecord, LearningState, ProfileStore,
    Recommendation, SearchPurpose,
};
use chess_core::{is_legal, legal_moves, Color, Position};

// =============================================================================
// Helpers
// =============================================================================

fn temp_profile() -> std::path::PathBuf {
    std::env::temp_dir().join(format!("cycle-{}.json", uuid::Uuid::new_v4()))
}

/// Plays `human_plies` human moves (always the first legal move) against
/// the engine, recording comparisons the way the game controller does.
fn play_short_game(engine: &AdaptiveEngine, state: &LearningState, human_plies: usize) -> GameRecord {
    let mut pos = Position::startpos();
    let mut record = GameRecord::new(pos.clone());

    for _ in 0..human_plies {
        assert_eq!(pos.side_to_move, Color::White);
        let cmp = engine.choose_move(&pos, state, SearchPurpose::Comparison);
        let human = legal_moves(&pos)[0];
        record.push_player_move(
            human,
            Recommendation {
                mv: cmp.best_move,
                score: cmp.score,
            },
        );
        pos.make_move(human);
        record.push_move(human, 0);

        let bot = engine
            .choose_move(&pos, state, SearchPurpose::BotMove)
            .best_move
            .expect("bot has a move");
        assert!(is_legal(&pos, bot));
        pos.make_move(bot);
        record.push_move(bot, 0);
    }
    record
}

// =============================================================================
// Cycle
// =============================================================================

#[test]
fn test_full_cycle_updates_and_persists_profile() {
    let path = temp_profile();
    let store = ProfileStore::new(&path);
    let mut state = store.load();
    assert_eq!(state, LearningState::default());

    let engine = AdaptiveEngine::new();
    let record = play_short_game(&engine, &state, 2);
    assert_eq!(record.len(), 4);
    assert_eq!(record.player_moves().len(), 2);
    assert_eq!(record.recommendations().len(), 2);

    let summary = analyze(&record, Some(&state.weights));
    assert_eq!(summary.total, 2);
    assert!((0.0..=100.0).contains(&summary.accuracy));

    let update = state.record_result(GameOutcome::Loss.score());
    assert!(update.elo_after < update.elo_before);
    store.save(&state).unwrap();

    let reloaded = ProfileStore::new(&path).load();
    assert_eq!(reloaded, state);
    assert_eq!(reloaded.games, 1);

    std::fs::remove_file(&path).ok();
}

#[test]
fn test_undo_keeps_sequences_aligned() {
    let engine = AdaptiveEngine::without_book();
    let state = LearningState::default();
    let mut record = play_short_game(&engine, &state, 2);

    // Back to the human's turn: bot reply then human move
    record.pop_move();
    record.pop_move();
    assert_eq!(record.len(), 2);
    assert_eq!(record.player_moves().len(), 1);
    assert_eq!(record.recommendations().len(), record.player_moves().len());
}
