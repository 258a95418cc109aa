//! End-to-end scenarios from the testable-properties list: immediate mate,
//! the Ko rule, and repetition draws, exercised through the public
//! `Position`/`SearchEngine` surface rather than internals.

use std::sync::Arc;

use laserchess_engine::params::EngineParams;
use laserchess_engine::piece::{Color, KingOrientation as KO, Piece};
use laserchess_engine::position::Position;
use laserchess_engine::search::SearchEngine;
use laserchess_engine::square::Square;
use laserchess_engine::zobrist::ZobristKeys;

fn engine() -> SearchEngine {
    SearchEngine::new(EngineParams::default(), 1)
}

#[test]
fn immediate_mate_is_found_at_depth_one() {
    // White king on a1 facing directly at Black's king on h1 down an open
    // rank: firing the laser zaps Black's king immediately, no reflection.
    let mut pos = Position::empty(ZobristKeys::new(101));
    pos.place_piece(Square::new(0, 0), Piece::king(Color::White, KO::EE));
    pos.place_piece(Square::new(7, 0), Piece::king(Color::Black, KO::WW));
    let root = Arc::new(pos);

    let engine = engine();
    let result = engine.search(&root, 1, None, None);
    assert!(result.best_move.is_some());
    assert!(result.score > 0, "expected a winning score, got {}", result.score);
}

#[test]
fn ko_rule_rejects_a_move_that_reverts_to_the_prior_key() {
    // A king's null rotation (`Rotation::None`, from == to) changes no
    // piece on the board, so with no laser zap the resulting key is
    // exactly the position's own key one ply ago with only the
    // side-to-move bit flipped — the immediate self-revert `make_move`'s
    // Ko check exists to reject.
    let mut pos = Position::empty(ZobristKeys::new(102));
    pos.place_piece(Square::new(0, 0), Piece::king(Color::White, KO::NN));
    pos.place_piece(Square::new(7, 7), Piece::king(Color::Black, KO::SS));
    let root = Arc::new(pos);

    let pass = laserchess_engine::movegen::generate_all(&root)
        .into_iter()
        .find(|m| m.is_null() && m.from() == Square::new(0, 0))
        .expect("a null king move exists for white");

    let (_after, outcome) = root.make_move(pass, true);
    assert!(outcome.is_ko(), "a self-reverting pass must be rejected as Ko");

    // With the rule switched off the very same move is legal: it only
    // flips the side to move, confirming the rejection above is the Ko
    // check firing and not some unrelated move-generation failure.
    let (after_unchecked, outcome_unchecked) = root.make_move(pass, false);
    assert!(!outcome_unchecked.is_ko());
    assert_ne!(after_unchecked.key(), root.key());
    assert_eq!(after_unchecked.to_move(), root.to_move().opposite());
}

#[test]
fn repeated_position_is_scored_as_a_draw() {
    let mut pos = Position::empty(ZobristKeys::new(103));
    pos.place_piece(Square::new(0, 0), Piece::king(Color::White, KO::NN));
    pos.place_piece(Square::new(7, 7), Piece::king(Color::Black, KO::SS));
    let root = Arc::new(pos);

    // Four-ply round trip: White rotates and back, Black rotates and back.
    let w1 = laserchess_engine::movegen::generate_all(&root)
        .into_iter()
        .find(|m| m.is_rotation_only() && m.from() == Square::new(0, 0))
        .unwrap();
    let (p1, _) = root.make_move(w1, false);
    let p1 = Arc::new(p1);
    let b1 = laserchess_engine::movegen::generate_all(&p1)
        .into_iter()
        .find(|m| m.is_rotation_only() && m.from() == Square::new(7, 7))
        .unwrap();
    let (p2, _) = p1.make_move(b1, false);
    let p2 = Arc::new(p2);
    let w2 = laserchess_engine::movegen::generate_all(&p2)
        .into_iter()
        .find(|m| m.is_rotation_only() && m.from() == Square::new(0, 0))
        .unwrap();
    let (p3, _) = p2.make_move(w2, false);
    let p3 = Arc::new(p3);
    let b2 = laserchess_engine::movegen::generate_all(&p3)
        .into_iter()
        .find(|m| m.is_rotation_only() && m.from() == Square::new(7, 7))
        .unwrap();
    let (p4, _) = p3.make_move(b2, false);

    assert_eq!(p4.key(), root.key());
    assert!(p4.is_repeated(4));
}

#[test]
fn hattack_increases_with_more_squares_covered() {
    use laserchess_engine::eval::eval;

    let params_on = EngineParams {
        pcentral: 0,
        pbetween: 0,
        kface: 0,
        kaggressive: 0,
        mobility: 0,
        pawnpin: 0,
        hattack: 150,
        ..EngineParams::default()
    };

    let mut narrow = Position::empty(ZobristKeys::new(104));
    narrow.place_piece(Square::new(0, 0), Piece::king(Color::White, KO::NN));
    narrow.place_piece(Square::new(7, 7), Piece::king(Color::Black, KO::SS));

    let mut wide = Position::empty(ZobristKeys::new(104));
    wide.place_piece(Square::new(0, 0), Piece::king(Color::White, KO::EE));
    wide.place_piece(Square::new(7, 7), Piece::king(Color::Black, KO::SS));

    // A king facing along the long open rank covers strictly more squares
    // than one facing into a corner wall, with no reflections either way.
    let narrow_score = eval(&narrow, &params_on);
    let wide_score = eval(&wide, &params_on);
    assert_ne!(narrow_score, wide_score);
}
