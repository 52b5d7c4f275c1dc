use super::*;
use crate::notation::parse_uci_shape;
use crate::types::PieceKind;

fn moves(ucis: &[&str]) -> Vec<Move> {
    ucis.iter()
        .map(|u| parse_uci_shape(u).expect("well-formed UCI"))
        .collect()
}

#[test]
fn test_write_pgn_numbers_moves_and_appends_result() {
    let start = Position::startpos();
    let line = moves(&["e2e4", "e7e5", "g1f3", "b8c6"]);
    let text = write_pgn(&[("Event", "Casual".to_string())], &start, &line, "*");

    assert!(text.starts_with("[Event \"Casual\"]\n"));
    assert!(text.contains("[Result \"*\"]"));
    assert!(!text.contains("[FEN"));
    assert!(text.contains("1. e4 e5 2. Nf3 Nc6 *"));
}

#[test]
fn test_write_pgn_from_custom_position_with_black_to_move() {
    let start = Position::from_fen("4k3/8/8/8/8/8/4P3/4K3 b - - 0 30").unwrap();
    let text = write_pgn(&[], &start, &moves(&["e8d7", "e2e4"]), "1/2-1/2");
    assert!(text.contains("[SetUp \"1\"]"));
    assert!(text.contains("[FEN \"4k3/8/8/8/8/8/4P3/4K3 b - - 0 30\"]"));
    assert!(text.contains("30... Kd7 31. e4 1/2-1/2"));
}

#[test]
fn test_read_pgn_roundtrip() {
    let start = Position::startpos();
    let line = moves(&["d2d4", "d7d5", "c2c4", "d5c4", "e2e3", "b7b5", "a2a4", "c7c6"]);
    let text = write_pgn(&[("White", "Human".to_string())], &start, &line, "*");

    let game = read_pgn(&text).unwrap();
    assert_eq!(game.header("White"), Some("Human"));
    assert_eq!(game.moves, line);
    assert_eq!(game.start, start);
}

#[test]
fn test_read_pgn_skips_comments_variations_and_nags() {
    let text = "[Event \"x\"]\n\n1. e4 {best by test} e5 (1... c5 2. Nf3) 2. Nf3 $1 Nc6 ; line comment\n3.Bb5 *\n";
    let game = read_pgn(text).unwrap();
    assert_eq!(
        game.moves,
        moves(&["e2e4", "e7e5", "g1f3", "b8c6", "f1b5"])
    );
    assert_eq!(
        game.final_position().piece_at(33).map(|p| p.kind),
        Some(PieceKind::Bishop)
    );
}

#[test]
fn test_read_pgn_reports_bad_move_with_ply() {
    let err = read_pgn("1. e4 e5 2. Ke3 *").unwrap_err();
    assert!(matches!(err, PgnError::Move { ply: 3, .. }));
}

#[test]
fn test_read_pgn_rejects_broken_header() {
    assert!(matches!(
        read_pgn("[Event \"unterminated]\n1. e4 *"),
        Err(PgnError::Header(_))
    ));
}
