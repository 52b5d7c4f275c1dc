use super::*;
use crate::puzzle::PUZZLES;
use chess_core::{legal_moves, parse_uci_shape};
use std::time::Duration;

fn test_config() -> AppConfig {
    let dir = std::env::temp_dir().join(format!("adaptive-chess-{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).unwrap();
    let mut config = AppConfig::default();
    config.paths.profile = dir.join("learning_data.json");
    config.paths.report = dir.join("lvl.txt");
    config.paths.deep_analysis = dir.join("analysis.txt");
    config.engine.use_book = false;
    config
}

fn controller() -> (GameController, AppConfig) {
    let config = test_config();
    (GameController::new(&config), config)
}

fn uci(text: &str) -> Move {
    parse_uci_shape(text).expect("well-formed UCI")
}

fn network(local: Color) -> GameController {
    let (mut game, _) = controller();
    game.new_game(Mode::Network { local });
    game
}

// =============================================================================
// Local games
// =============================================================================

#[test]
fn test_new_game_status() {
    let (game, _) = controller();
    assert_eq!(game.mode(), Mode::VsBot { human: Color::White });
    assert_eq!(game.status_line(), "White's turn | White 10:00 | Black 10:00");
    assert!(game.game_over().is_none());
}

#[test]
fn test_local_move_records_recommendation() {
    let (mut game, _) = controller();
    let outcome = game.apply_local_move("e4").unwrap();
    let MoveOutcome::Played(played) = outcome else {
        panic!("expected a played move");
    };
    assert_eq!(played.san, "e4");
    assert_eq!(played.captured, None);
    assert_eq!(game.sans(), &["e4".to_string()]);
    assert_eq!(game.record().player_moves().len(), 1);
    assert_eq!(game.record().recommendations().len(), 1);
    assert!(game.record().recommendations()[0].mv.is_some());
    assert_eq!(game.position().side_to_move, Color::Black);
    assert!(game.clock().is_running());

    assert!(matches!(game.apply_local_move("e5"), Err(GameError::NotYourTurn)));
    assert!(matches!(
        game.apply_local_move("Ke2"),
        Err(GameError::NotYourTurn)
    ));
}

#[test]
fn test_bad_input_is_rejected_without_change() {
    let (mut game, _) = controller();
    assert!(matches!(game.apply_local_move("e5"), Err(GameError::Notation(_))));
    assert!(matches!(game.apply_local_move("hello"), Err(GameError::Notation(_))));
    assert!(game.record().is_empty());
    assert_eq!(game.position(), &Position::startpos());
}

#[test]
fn test_bot_replies_with_legal_move() {
    let (mut game, _) = controller();
    assert_eq!(game.play_bot_turn().unwrap(), None);

    game.apply_local_move("d4").unwrap();
    let before = game.position().clone();
    let reply = game.play_bot_turn().unwrap().expect("bot moves");
    assert!(is_legal(&before, reply.mv));
    assert_eq!(game.position().side_to_move, Color::White);
    assert_eq!(game.record().len(), 2);
    assert_eq!(game.record().player_moves().len(), 1);
}

#[test]
fn test_undo_returns_to_human_turn() {
    let (mut game, _) = controller();
    assert!(matches!(game.undo(), Err(GameError::NothingToUndo)));

    game.apply_local_move("e4").unwrap();
    game.play_bot_turn().unwrap();
    assert_eq!(game.undo().unwrap(), 2);
    assert_eq!(game.position(), &Position::startpos());
    assert!(game.record().is_empty());
    assert!(game.record().player_moves().is_empty());
    assert!(game.sans().is_empty());

    // Human move without a reply yet
    game.apply_local_move("e4").unwrap();
    assert_eq!(game.undo().unwrap(), 1);
    assert_eq!(game.position().side_to_move, Color::White);
}

#[test]
fn test_undo_as_black_keeps_records_aligned() {
    let (mut game, _) = controller();
    game.new_game(Mode::VsBot { human: Color::Black });
    game.play_bot_turn().unwrap().expect("bot opens");
    let human = legal_moves(game.position())[0];
    game.play_local(human).unwrap();
    game.play_bot_turn().unwrap().expect("bot replies");

    assert_eq!(game.undo().unwrap(), 2);
    assert_eq!(game.record().len(), 1);
    assert_eq!(game.position().side_to_move, Color::Black);
    assert_eq!(
        game.record().player_moves().len(),
        game.record().recommendations().len()
    );
    assert!(game.record().player_moves().is_empty());
}

#[test]
fn test_hint_is_legal() {
    let (game, _) = controller();
    let (mv, text) = game.hint().unwrap();
    assert!(is_legal(game.position(), mv));
    assert_eq!(text, san(game.position(), mv));
}

#[test]
fn test_draw_offer_depends_on_engine_eval() {
    // Start position is +1.00 for White (mobility)
    let (mut game, _) = controller();
    assert!(game.offer_draw().unwrap());
    assert_eq!(game.game_over(), Some(GameEnd::Agreement));

    game.new_game(Mode::VsBot { human: Color::Black });
    assert!(!game.offer_draw().unwrap());
    assert!(game.game_over().is_none());
}

#[test]
fn test_resign_and_finish_updates_profile() {
    let (mut game, config) = controller();
    let end = game.resign().unwrap();
    assert_eq!(end, GameEnd::Resignation { winner: Color::Black });
    assert!(matches!(game.apply_local_move("e4"), Err(GameError::GameOver)));

    let summary = game.finish_game().unwrap().expect("first finish applies learning");
    assert_eq!(summary.update.games, 1);
    assert!(summary.update.elo_after < summary.update.elo_before);
    assert!(summary.report.contains("Result: 0-1"));
    assert!(game.finish_game().unwrap().is_none());

    let stored = ProfileStore::new(&config.paths.profile).load();
    assert_eq!(&stored, game.learning());
    let report = fs::read_to_string(&config.paths.report).unwrap();
    assert!(report.starts_with("Game Analysis - "));
}

#[test]
fn test_finish_requires_game_end() {
    let (mut game, _) = controller();
    assert!(matches!(game.finish_game(), Err(GameError::InProgress)));
}

#[test]
fn test_flag_fall_ends_game() {
    let (mut game, _) = controller();
    assert_eq!(game.check_clock(Instant::now() + Duration::from_secs(700)), None);

    game.apply_local_move("e4").unwrap();
    let end = game.check_clock(Instant::now() + Duration::from_secs(700));
    assert_eq!(end, Some(GameEnd::Timeout { winner: Color::White }));
    assert_eq!(end.map(GameEnd::result), Some("1-0"));
}

// =============================================================================
// Network games
// =============================================================================

#[test]
fn test_remote_move_is_applied() {
    let mut game = network(Color::Black);
    let played = game.apply_remote_move(uci("e2e4")).unwrap();
    assert_eq!(played.san, "e4");
    assert_eq!(played.captured, None);
    assert_eq!(game.position().side_to_move, Color::Black);
    assert_eq!(game.record().moves(), &[uci("e2e4")]);
    // Network games record no engine comparisons
    assert!(game.record().player_moves().is_empty());
    assert_eq!(game.status_line().split(" |").next(), Some("Your turn (Black)"));

    assert!(matches!(
        game.apply_remote_move(uci("e7e5")),
        Err(GameError::NotYourTurn)
    ));
}

#[test]
fn test_illegal_remote_move_is_dropped() {
    let mut game = network(Color::Black);
    assert!(matches!(
        game.apply_remote_move(uci("e2e5")),
        Err(GameError::IllegalRemote(_))
    ));
    assert!(game.record().is_empty());
    assert_eq!(game.position(), &Position::startpos());
}

#[test]
fn test_remote_move_outside_network_game() {
    let (mut game, _) = controller();
    assert!(matches!(
        game.apply_remote_move(uci("e2e4")),
        Err(GameError::Unavailable(_))
    ));
}

#[test]
fn test_network_game_restrictions() {
    let mut game = network(Color::White);
    assert!(matches!(game.undo(), Err(GameError::Unavailable(_))));
    assert!(matches!(game.hint(), Err(GameError::Unavailable(_))));
    assert!(matches!(
        game.start_puzzle(PUZZLES[0]),
        Err(GameError::Unavailable(_))
    ));
}

#[test]
fn test_captures_are_tracked() {
    let mut game = network(Color::White);
    game.apply_local_move("e4").unwrap();
    game.apply_remote_move(uci("d7d5")).unwrap();
    let MoveOutcome::Played(played) = game.apply_local_move("exd5").unwrap() else {
        panic!("expected a played move");
    };
    assert_eq!(played.captured.map(|p| p.kind), Some(PieceKind::Pawn));
    assert_eq!(game.captured_by(Color::White), vec![PieceKind::Pawn]);
    assert!(game.captured_by(Color::Black).is_empty());
    assert_eq!(game.move_list(), "1. e4 d5 2. exd5");
}

#[test]
fn test_checkmate_ends_game() {
    let mut game = network(Color::White);
    game.apply_local_move("f3").unwrap();
    game.apply_remote_move(uci("e7e5")).unwrap();
    game.apply_local_move("g4").unwrap();
    let mate = game.apply_remote_move(uci("d8h4")).unwrap();
    assert_eq!(mate.san, "Qh4#");
    assert_eq!(
        game.game_over(),
        Some(GameEnd::Checkmate { winner: Color::Black })
    );
    assert!(game.status_line().starts_with("Game over: Black wins by checkmate (0-1)"));
    assert!(matches!(game.resign(), Err(GameError::GameOver)));
}

#[test]
fn test_threefold_repetition() {
    let mut game = network(Color::White);
    for _ in 0..2 {
        game.apply_local_move("Nf3").unwrap();
        game.apply_remote_move(uci("g8f6")).unwrap();
        game.apply_local_move("Ng1").unwrap();
        assert!(game.game_over().is_none());
        game.apply_remote_move(uci("f6g8")).unwrap();
    }
    assert_eq!(game.game_over(), Some(GameEnd::Repetition));
}

// =============================================================================
// Puzzles
// =============================================================================

#[test]
fn test_wrong_puzzle_answer_is_reverted() {
    let (mut game, _) = controller();
    let back_rank = PUZZLES[1];
    game.start_puzzle(back_rank).unwrap();
    assert_eq!(game.mode(), Mode::Puzzle);
    let start = game.position().clone();

    let outcome = game.apply_local_move("Kf2").unwrap();
    assert_eq!(
        outcome,
        MoveOutcome::PuzzleRejected {
            san: "Kf2".to_string()
        }
    );
    assert_eq!(game.position(), &start);
    assert!(game.record().is_empty());

    let MoveOutcome::PuzzleSolved(played) = game.apply_local_move("Ra8").unwrap() else {
        panic!("expected the puzzle to be solved");
    };
    assert_eq!(played.san, "Ra8#");
    assert_eq!(game.game_over(), Some(GameEnd::PuzzleSolved));

    // Puzzles never touch the profile
    assert!(game.finish_game().unwrap().is_none());
    assert_eq!(game.learning().games, 0);
}

#[test]
fn test_puzzle_disables_undo_and_resign() {
    let (mut game, _) = controller();
    game.start_puzzle(PUZZLES[0]).unwrap();
    assert!(matches!(game.undo(), Err(GameError::Unavailable(_))));
    assert!(matches!(game.resign(), Err(GameError::Unavailable(_))));
    assert!(matches!(game.offer_draw(), Err(GameError::Unavailable(_))));
    assert!(matches!(game.deep_analysis(), Err(GameError::Unavailable(_))));
}

// =============================================================================
// Records and analysis
// =============================================================================

#[test]
fn test_pgn_save_and_load() {
    let (mut game, config) = controller();
    game.new_game(Mode::Network { local: Color::White });
    game.apply_local_move("e4").unwrap();
    game.apply_remote_move(uci("c7c5")).unwrap();
    game.apply_local_move("Nf3").unwrap();

    let path = config.paths.report.with_file_name("game.pgn");
    game.save_pgn(&path).unwrap();
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("[White \"Player\"]"));
    assert!(text.contains("[Black \"Opponent\"]"));
    assert!(text.contains("1. e4 c5 2. Nf3 *"));

    let (mut loaded, _) = controller();
    assert_eq!(loaded.load_pgn(&path).unwrap(), 3);
    assert_eq!(loaded.sans(), game.sans());
    assert_eq!(loaded.position(), game.position());
    assert!(loaded.record().player_moves().is_empty());
    assert!(!loaded.clock().is_running());
}

#[test]
fn test_loaded_position_detects_fifty_moves() {
    let (mut game, config) = controller();
    let path = config.paths.report.with_file_name("fifty.pgn");
    fs::write(
        &path,
        "[SetUp \"1\"]\n[FEN \"4k3/8/8/8/8/8/8/R3K3 w - - 99 60\"]\n\n60. Ra2 *\n",
    )
    .unwrap();
    assert_eq!(game.load_pgn(&path).unwrap(), 1);
    assert_eq!(game.game_over(), Some(GameEnd::FiftyMoves));
    assert_eq!(GameEnd::FiftyMoves.result(), "1/2-1/2");
}

#[test]
fn test_load_missing_file() {
    let (mut game, config) = controller();
    let path = config.paths.report.with_file_name("nope.pgn");
    assert!(matches!(game.load_pgn(&path), Err(GameError::Io { .. })));
}

#[test]
fn test_deep_analysis_export() {
    let (mut game, config) = controller();
    assert!(matches!(game.deep_analysis(), Err(GameError::Unavailable(_))));

    game.apply_local_move("e4").unwrap();
    game.play_bot_turn().unwrap();
    let deep = game.deep_analysis().unwrap();
    assert_eq!(deep.timeline.len(), 2);
    assert_eq!(deep.result, "*");
    assert_eq!(deep.summary.total, 1);

    let text = game.export_analysis().unwrap();
    assert!(text.contains("Move-by-Move Evaluation:"));
    let saved = fs::read_to_string(&config.paths.deep_analysis).unwrap();
    assert!(saved.starts_with("Detailed Game Analysis - "));
}

#[test]
fn test_game_end_scores() {
    let mate = GameEnd::Checkmate { winner: Color::White };
    assert_eq!(mate.score_for(Color::White), 1.0);
    assert_eq!(mate.score_for(Color::Black), 0.0);
    assert_eq!(GameEnd::Stalemate.score_for(Color::Black), 0.5);
    assert_eq!(GameEnd::Repetition.to_string(), "draw by threefold repetition");
}

#[test]
fn test_retract_unsent_restores_position() {
    let mut game = network(Color::White);
    let before = game.position().clone();
    game.apply_local_move("e4").unwrap();

    let mv = game.retract_unsent().unwrap();
    assert_eq!(mv, uci("e2e4"));
    assert_eq!(game.position(), &before);
    assert!(game.record().is_empty());
    assert!(game.sans().is_empty());
    assert!(game.captured_by(Color::White).is_empty());

    // Only the local player's own last move can be taken back
    assert!(matches!(game.retract_unsent(), Err(GameError::NothingToUndo)));
    game.apply_local_move("e4").unwrap();
    game.apply_remote_move(uci("e7e5")).unwrap();
    assert!(matches!(game.retract_unsent(), Err(GameError::NothingToUndo)));
}

#[test]
fn test_retract_unsent_is_network_only() {
    let (mut game, _) = controller();
    game.apply_local_move("e4").unwrap();
    assert!(matches!(
        game.retract_unsent(),
        Err(GameError::Unavailable(_))
    ));
}
