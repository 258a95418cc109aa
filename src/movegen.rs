//! Move generation: King/Pawn step and rotation enumeration, plus the
//! opponent-pin check that suppresses a Pawn's moves while it is held by
//! the opponent's laser. Grounded on `generate_all`/`generate_pinned_pawn_list`
//! in `examples/original_source/player/move_gen.c` and `eval.c`.

use crate::piece::{Move, PieceType, Rotation, DIR8};
use crate::position::{Position, MAX_PAWNS};
use crate::square::Square;

/// Squares of the opposing color's Pawns currently pinned by `color`'s
/// King's laser (and thus forbidden from moving). Grounded on
/// `generate_pinned_pawn_list` in `eval.c`.
#[must_use]
pub fn pinned_pawns(pos: &Position, color: crate::piece::Color) -> Vec<Square> {
    let opposite = color.opposite();
    let mut pinned = Vec::with_capacity(MAX_PAWNS);
    let mut loc = pos.king_square(color);
    let mut dir = pos.piece_at(loc).king_orientation();
    loop {
        let Some(next) = pos.next_piece(loc, dir) else {
            return pinned;
        };
        loc = next;
        let occupant = pos.piece_at(loc);
        match occupant.ptype() {
            PieceType::Pawn => {
                match crate::piece::reflect(dir, occupant.pawn_orientation()) {
                    None => return pinned,
                    Some(new_dir) => dir = new_dir,
                }
                if occupant.color() == opposite {
                    pinned.push(loc);
                }
            }
            PieceType::King | PieceType::Invalid => return pinned,
            PieceType::Empty => unreachable!("next_piece never stops on empty"),
        }
    }
}

/// Enumerate every legal move for the side to move: King steps/rotations
/// (plus its null move), and unpinned Pawn steps/rotations. Grounded on
/// `generate_all` in `move_gen.c`.
#[must_use]
pub fn generate_all(pos: &Position) -> Vec<Move> {
    let to_move = pos.to_move();
    let opposite = to_move.opposite();
    let pinned = pinned_pawns(pos, opposite);

    let mut moves = Vec::with_capacity(32);

    let king_loc = pos.king_square(to_move);
    debug_assert!(matches!(pos.piece_at(king_loc).ptype(), PieceType::King));
    for &delta in &DIR8 {
        let dest = king_loc.offset(delta);
        if matches!(pos.piece_at(dest).ptype(), PieceType::Invalid) {
            continue;
        }
        moves.push(Move::new(PieceType::King, Rotation::None, king_loc, dest));
    }
    for rot in [Rotation::None, Rotation::Right, Rotation::Uturn, Rotation::Left] {
        moves.push(Move::new(PieceType::King, rot, king_loc, king_loc));
    }

    for &pawn_loc in pos.pawn_squares(to_move) {
        debug_assert!(matches!(pos.piece_at(pawn_loc).ptype(), PieceType::Pawn));
        if pinned.contains(&pawn_loc) {
            continue;
        }
        for &delta in &DIR8 {
            let dest = pawn_loc.offset(delta);
            if matches!(pos.piece_at(dest).ptype(), PieceType::Invalid) {
                continue;
            }
            moves.push(Move::new(PieceType::Pawn, Rotation::None, pawn_loc, dest));
        }
        for rot in [Rotation::Right, Rotation::Uturn, Rotation::Left] {
            moves.push(Move::new(PieceType::Pawn, rot, pawn_loc, pawn_loc));
        }
    }

    moves
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::{Color, KingOrientation as KO, Piece};
    use crate::zobrist::ZobristKeys;

    fn two_kings() -> Position {
        let mut p = Position::empty(ZobristKeys::new(5));
        p.place_piece(Square::new(0, 0), Piece::king(Color::White, KO::NN));
        p.place_piece(Square::new(7, 7), Piece::king(Color::Black, KO::SS));
        p
    }

    #[test]
    fn corner_king_has_three_board_steps_and_four_rotations() {
        let p = two_kings();
        let moves = generate_all(&p);
        let steps = moves.iter().filter(|m| m.is_step()).count();
        let rotations = moves.iter().filter(|m| m.is_rotation_only()).count();
        assert_eq!(steps, 3);
        assert_eq!(rotations, 4);
        assert_eq!(moves.len(), 7);
    }

    #[test]
    fn pinned_pawn_generates_no_moves() {
        let mut p = two_kings();
        // It is White to move; Black's king at h8 faces SS, beaming straight
        // down the h-file. A White pawn sitting in that beam and deflecting
        // it (rather than absorbing it) is pinned and must generate no
        // moves for White, even though it is White's own turn.
        let pinned_sq = Square::new(7, 3);
        p.place_piece(pinned_sq, Piece::pawn(Color::White, crate::piece::PawnOrientation::NW));
        assert!(pinned_pawns(&p, Color::Black).contains(&pinned_sq));
        let moves = generate_all(&p);
        assert!(moves.iter().all(|m| m.from() != pinned_sq));
    }
}
