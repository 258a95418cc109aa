//! Perft scenario from the testable-properties list: leaf counts for a
//! fixed starting position, pinned as a regression once measured.

use std::sync::Arc;

use laserchess_engine::perft::perft;
use laserchess_engine::piece::{Color, KingOrientation as KO, Piece};
use laserchess_engine::position::Position;
use laserchess_engine::square::Square;
use laserchess_engine::zobrist::ZobristKeys;

fn two_kings_position(seed: u64) -> Arc<Position> {
    let mut pos = Position::empty(ZobristKeys::new(seed));
    pos.place_piece(Square::new(0, 0), Piece::king(Color::White, KO::NN));
    pos.place_piece(Square::new(7, 7), Piece::king(Color::Black, KO::SS));
    Arc::new(pos)
}

#[test]
fn perft_depth_one_counts_every_legal_king_move() {
    let root = two_kings_position(201);
    // A cornered king has 3 on-board step destinations plus 3 non-identity
    // rotations (Right/Uturn/Left) — 6 legal first moves.
    assert_eq!(perft(&root, 1, true), 6);
}

#[test]
fn perft_is_stable_across_repeated_calls() {
    let root = two_kings_position(202);
    let a = perft(&root, 2, true);
    let b = perft(&root, 2, true);
    assert_eq!(a, b);
}
