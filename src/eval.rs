//! Static position evaluation: the weighted sum of Pawn/King positional
//! heuristics plus material. Grounded on the active `eval()` in
//! `examples/original_source/player/eval.c`.

use crate::consts::{EV_SCORE_RATIO, PAWN_EV_VALUE};
use crate::params::EngineParams;
use crate::piece::{Color, KingOrientation, PieceType};
use crate::position::Position;
use crate::square::{Square, BOARD_WIDTH};

const EPSILON: f32 = 1e-7;

/// PCENTRAL heuristic: bonus for a Pawn near the center of the board.
/// Grounded on `pcentral` in `eval.c`.
fn pcentral(weight: i32, file: i32, rank: i32) -> f32 {
    let half = BOARD_WIDTH / 2;
    let df = {
        let d = half - file - 1;
        if d < 0 {
            (file - half) as f32
        } else {
            d as f32
        }
    };
    let dr = {
        let d = half - rank - 1;
        if d < 0 {
            (rank - half) as f32
        } else {
            d as f32
        }
    };
    let bonus = 1.0 - (df * df + dr * dr).sqrt() / BOARD_WIDTH as f32 * std::f32::consts::SQRT_2;
    weight as f32 * bonus
}

fn between(c: i32, a: i32, b: i32) -> bool {
    (c >= a && c <= b) || (c <= a && c >= b)
}

/// PBETWEEN heuristic: bonus for a Pawn inside the rectangle whose corners
/// are the two Kings. Grounded on `pbetween` in `eval.c`.
fn pbetween(weight: i32, pos: &Position, file: i32, rank: i32) -> i32 {
    let white_king = pos.king_square(Color::White);
    let black_king = pos.king_square(Color::Black);
    let is_between =
        between(file, white_king.file(), black_king.file()) && between(rank, white_king.rank(), black_king.rank());
    if is_between {
        weight
    } else {
        0
    }
}

/// KFACE heuristic: bonus/penalty for a King facing toward the opposing King.
/// Grounded on `kface` in `eval.c`.
fn kface(weight: i32, pos: &Position, color: Color, file: i32, rank: i32) -> i32 {
    let opp_sq = pos.king_square(color.opposite());
    let delta_file = opp_sq.file() - file;
    let delta_rank = opp_sq.rank() - rank;
    let ori = pos.piece_at(Square::new(file, rank)).king_orientation();
    let bonus = match ori {
        KingOrientation::NN => delta_rank,
        KingOrientation::EE => delta_file,
        KingOrientation::SS => -delta_rank,
        KingOrientation::WW => -delta_file,
    };
    let denom = delta_rank.abs() + delta_file.abs();
    if denom == 0 {
        0
    } else {
        (bonus * weight) / denom
    }
}

/// KAGGRESSIVE heuristic: bonus for a King that leaves itself more room to
/// retreat than its opponent. Grounded on `kaggressive` in `eval.c`.
fn kaggressive(weight: i32, pos: &Position, color: Color, file: i32, rank: i32) -> i32 {
    let opp_sq = pos.king_square(color.opposite());
    let (of, or) = (opp_sq.file(), opp_sq.rank());
    let delta_file = of - file;
    let delta_rank = or - rank;

    let bonus = if delta_file >= 0 && delta_rank >= 0 {
        (file + 1) * (rank + 1)
    } else if delta_file <= 0 && delta_rank >= 0 {
        (BOARD_WIDTH - file) * (rank + 1)
    } else if delta_file <= 0 && delta_rank <= 0 {
        (BOARD_WIDTH - file) * (BOARD_WIDTH - rank)
    } else {
        (file + 1) * (BOARD_WIDTH - rank)
    };

    (weight * bonus) / (BOARD_WIDTH * BOARD_WIDTH)
}

/// Harmonic-ish board distance: `1/(|df|+1) + 1/(|dr|+1)`. Grounded on
/// `h_dist`/`h_dist_table` in `eval.c`.
fn h_dist(a: Square, b: Square) -> f32 {
    let df = (a.file() - b.file()).unsigned_abs() as f32;
    let dr = (a.rank() - b.rank()).unsigned_abs() as f32;
    1.0 / (df + 1.0) + 1.0 / (dr + 1.0)
}

/// Outcome of walking `color`'s King's laser across the whole board: the
/// squares it touches (for the opponent's MOBILITY heuristic), how
/// attackable the opposing King's neighborhood is, and how many opposing
/// Pawns are pinned in its path. Grounded on `mark_laser_path_with_heuristics`
/// in `eval.c`.
struct LaserSweep {
    touched: [bool; crate::square::ARR_SIZE],
    squares_attackable: f32,
    enemy_pinned: u32,
}

fn sweep_laser(pos: &Position, color: Color) -> LaserSweep {
    let mut touched = [false; crate::square::ARR_SIZE];
    let opp_king = pos.king_square(color.opposite());

    let mut sq = pos.king_square(color);
    let mut dir = pos.piece_at(sq).king_orientation();
    touched[sq.as_usize()] = true;
    let mut squares_attackable = h_dist(sq, opp_king) + EPSILON;
    let mut enemy_pinned = 0u32;

    loop {
        let step = crate::piece::BEAM[dir as usize];
        let next = pos.next_piece(sq, dir);
        let mut walker = sq;
        loop {
            walker = walker.offset(step);
            if !walker.on_board() {
                break;
            }
            let prev_touched = touched[walker.as_usize()];
            touched[walker.as_usize()] = true;
            if !prev_touched {
                squares_attackable += h_dist(walker, opp_king);
            }
            if Some(walker) == next {
                break;
            }
        }
        let Some(landed) = next else { break };
        sq = landed;
        let occupant = pos.piece_at(sq);
        match occupant.ptype() {
            PieceType::Pawn => {
                if occupant.color() != color {
                    enemy_pinned += 1;
                }
                match crate::piece::reflect(dir, occupant.pawn_orientation()) {
                    None => break,
                    Some(new_dir) => dir = new_dir,
                }
            }
            PieceType::King => break,
            PieceType::Empty | PieceType::Invalid => unreachable!("next_piece never stops there"),
        }
    }

    LaserSweep {
        touched,
        squares_attackable,
        enemy_pinned,
    }
}

/// A King's mobility: its own square plus the 8 adjacent squares, counted
/// only where the opponent's laser (already swept into `enemy_laser`)
/// doesn't reach. Grounded on `get_king_mobility` in `eval.c`.
fn king_mobility(pos: &Position, enemy_laser: &[bool; crate::square::ARR_SIZE], color: Color) -> i32 {
    let king_sq = pos.king_square(color);
    let mut mobility = i32::from(!enemy_laser[king_sq.as_usize()]);
    for &delta in &crate::piece::DIR8 {
        let sq = king_sq.offset(delta);
        if sq.on_board() && !enemy_laser[sq.as_usize()] {
            mobility += 1;
        }
    }
    mobility
}

/// Full static evaluation from White's point of view, scaled down to
/// `score_t` units and sign-flipped for the side to move. Grounded on the
/// active `eval()` in `eval.c`.
#[must_use]
pub fn eval(pos: &Position, params: &EngineParams) -> i32 {
    let mut score = [0f32; 2];

    for &color in &[Color::White, Color::Black] {
        let idx = color.index();
        for &sq in pos.pawn_squares(color) {
            score[idx] += pbetween(params.pbetween, pos, sq.file(), sq.rank()) as f32;
            score[idx] += pcentral(params.pcentral, sq.file(), sq.rank());
        }
        let king_sq = pos.king_square(color);
        score[idx] += kface(params.kface, pos, color, king_sq.file(), king_sq.rank()) as f32;
        score[idx] += kaggressive(params.kaggressive, pos, color, king_sq.file(), king_sq.rank()) as f32;
    }

    score[Color::White.index()] += pos.pawn_count(Color::White) as f32 * PAWN_EV_VALUE as f32;
    score[Color::Black.index()] += pos.pawn_count(Color::Black) as f32 * PAWN_EV_VALUE as f32;

    let white_sweep = sweep_laser(pos, Color::White);
    let black_sweep = sweep_laser(pos, Color::Black);

    score[Color::White.index()] += (params.hattack as f32) * white_sweep.squares_attackable.trunc();
    score[Color::Black.index()] += (params.hattack as f32) * black_sweep.squares_attackable.trunc();

    score[Color::White.index()] +=
        (params.mobility * king_mobility(pos, &black_sweep.touched, Color::White)) as f32;
    score[Color::Black.index()] +=
        (params.mobility * king_mobility(pos, &white_sweep.touched, Color::Black)) as f32;

    score[Color::White.index()] +=
        (params.pawnpin * (pos.pawn_count(Color::White) as i32 - black_sweep.enemy_pinned as i32)) as f32;
    score[Color::Black.index()] +=
        (params.pawnpin * (pos.pawn_count(Color::Black) as i32 - white_sweep.enemy_pinned as i32)) as f32;

    let mut total = score[Color::White.index()] - score[Color::Black.index()];

    if params.randomize > 0 {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        let z = rng.gen_range(0..=(params.randomize * 2)) as f32;
        total += z - params.randomize as f32;
    }

    if pos.to_move() == Color::Black {
        total = -total;
    }

    (total / EV_SCORE_RATIO as f32).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::PAWN_VALUE;
    use crate::piece::{KingOrientation as KO, Piece};
    use crate::zobrist::ZobristKeys;

    fn centered_kings() -> Position {
        let mut p = Position::empty(ZobristKeys::new(9));
        p.place_piece(Square::new(0, 0), Piece::king(Color::White, KO::NN));
        p.place_piece(Square::new(7, 7), Piece::king(Color::Black, KO::SS));
        p
    }

    fn no_positional_weights() -> EngineParams {
        EngineParams {
            pcentral: 0,
            pbetween: 0,
            kface: 0,
            kaggressive: 0,
            hattack: 0,
            mobility: 0,
            pawnpin: 0,
            ..EngineParams::default()
        }
    }

    #[test]
    fn extra_pawn_is_worth_one_pawn_value_with_heuristics_off() {
        let mut p = centered_kings();
        p.place_piece(Square::new(3, 3), Piece::pawn(Color::White, crate::piece::PawnOrientation::NE));
        let score = eval(&p, &no_positional_weights());
        assert_eq!(score, PAWN_VALUE);
    }

    #[test]
    fn black_to_move_negates_the_white_relative_score() {
        let mut white_to_move = centered_kings();
        white_to_move.place_piece(Square::new(3, 3), Piece::pawn(Color::White, crate::piece::PawnOrientation::NE));
        let white_score = eval(&white_to_move, &no_positional_weights());

        let zob = ZobristKeys::new(9);
        let mut black_to_move = Position::empty(zob);
        black_to_move.place_piece(Square::new(0, 0), Piece::king(Color::White, KO::NN));
        black_to_move.place_piece(Square::new(7, 7), Piece::king(Color::Black, KO::SS));
        black_to_move.place_piece(Square::new(3, 3), Piece::pawn(Color::White, crate::piece::PawnOrientation::NE));
        let root = std::sync::Arc::new(black_to_move);
        let null_move = crate::piece::Move::null(Square::new(0, 0));
        let (after, _) = root.make_move(null_move, false);

        let black_score = eval(&after, &no_positional_weights());
        assert_eq!(white_score, -black_score);
    }

    #[test]
    fn kface_rewards_facing_the_opponent() {
        let mut facing = centered_kings();
        // White king at a1 facing NN (toward Black king on the same file,
        // above it): full positive KFACE bonus.
        let params = EngineParams {
            kface: 40,
            pcentral: 0,
            pbetween: 0,
            kaggressive: 0,
            hattack: 0,
            mobility: 0,
            pawnpin: 0,
            ..EngineParams::default()
        };
        facing.place_piece(Square::new(3, 3), Piece::pawn(Color::Black, crate::piece::PawnOrientation::NE));
        let facing_score = eval(&facing, &params);

        let zob = ZobristKeys::new(9);
        let mut away = Position::empty(zob);
        away.place_piece(Square::new(0, 0), Piece::king(Color::White, KO::SS));
        away.place_piece(Square::new(7, 7), Piece::king(Color::Black, KO::SS));
        away.place_piece(Square::new(3, 3), Piece::pawn(Color::Black, crate::piece::PawnOrientation::NE));
        let away_score = eval(&away, &params);

        assert!(facing_score > away_score);
    }
}
