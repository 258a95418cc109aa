//! Pure text (de)serialization of positions. Not part of the search core —
//! a command loop or test harness calls these to get a [`Position`] in and
//! a human-readable board out. Grounded on the shape of
//! `examples/menezesd-ChessEngine/src/board/fen.rs` (rank-by-rank parsing,
//! digit run-lengths for empty squares, a dedicated error enum) adapted to
//! this game's pieces: a King or Pawn needs an orientation suffix that
//! standard chess FEN has no room for, so ranks use `<piece><ori>` pairs
//! instead of bare piece letters.

use std::fmt;
use std::sync::Arc;

use crate::piece::{Color, KingOrientation, PawnOrientation, Piece, PieceType};
use crate::position::Position;
use crate::square::{Square, BOARD_WIDTH};
use crate::zobrist::ZobristKeys;

/// Failure modes when parsing board-text produced by [`display`] (or
/// hand-written test fixtures in the same notation).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotationError {
    TooFewParts { found: usize },
    TooManyRanks { found: usize },
    TooManyFiles { rank: i32, files: i32 },
    InvalidPieceChar { char: char },
    InvalidOrientation { piece: char, ori: String },
    InvalidSideToMove { found: String },
}

impl fmt::Display for NotationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotationError::TooFewParts { found } => {
                write!(f, "expected board and side-to-move fields, found {found}")
            }
            NotationError::TooManyRanks { found } => {
                write!(f, "expected {BOARD_WIDTH} ranks, found {found}")
            }
            NotationError::TooManyFiles { rank, files } => {
                write!(f, "rank {rank} has {files} files, expected at most {BOARD_WIDTH}")
            }
            NotationError::InvalidPieceChar { char } => write!(f, "unrecognized piece character '{char}'"),
            NotationError::InvalidOrientation { piece, ori } => {
                write!(f, "invalid orientation '{ori}' for piece '{piece}'")
            }
            NotationError::InvalidSideToMove { found } => {
                write!(f, "invalid side to move '{found}', expected 'w' or 'b'")
            }
        }
    }
}

impl std::error::Error for NotationError {}

fn king_char(color: Color) -> char {
    if color == Color::White {
        'K'
    } else {
        'k'
    }
}

fn pawn_char(color: Color) -> char {
    if color == Color::White {
        'P'
    } else {
        'p'
    }
}

fn king_ori_char(ori: KingOrientation) -> char {
    match ori {
        KingOrientation::NN => 'N',
        KingOrientation::EE => 'E',
        KingOrientation::SS => 'S',
        KingOrientation::WW => 'W',
    }
}

fn pawn_ori_str(ori: PawnOrientation) -> &'static str {
    match ori {
        PawnOrientation::NW => "NW",
        PawnOrientation::NE => "NE",
        PawnOrientation::SE => "SE",
        PawnOrientation::SW => "SW",
    }
}

fn parse_king_ori(c: char) -> Option<KingOrientation> {
    match c {
        'N' => Some(KingOrientation::NN),
        'E' => Some(KingOrientation::EE),
        'S' => Some(KingOrientation::SS),
        'W' => Some(KingOrientation::WW),
        _ => None,
    }
}

fn parse_pawn_ori(s: &str) -> Option<PawnOrientation> {
    match s {
        "NW" => Some(PawnOrientation::NW),
        "NE" => Some(PawnOrientation::NE),
        "SE" => Some(PawnOrientation::SE),
        "SW" => Some(PawnOrientation::SW),
        _ => None,
    }
}

/// Render `pos` as rank 7 (top) down to rank 0 (bottom), `/`-separated,
/// empty runs as digit counts, followed by the side to move. Kings render
/// as `K`/`k` plus one of `NESW`; Pawns as `P`/`p` plus one of the four
/// diagonal codes (`NW`, `NE`, `SE`, `SW`).
#[must_use]
pub fn display(pos: &Position) -> String {
    let mut out = String::new();
    for rank in (0..BOARD_WIDTH).rev() {
        let mut empty_run = 0;
        for file in 0..BOARD_WIDTH {
            let piece = pos.piece_at(Square::new(file, rank));
            match piece.ptype() {
                PieceType::Empty => empty_run += 1,
                PieceType::King => {
                    if empty_run > 0 {
                        out.push_str(&empty_run.to_string());
                        empty_run = 0;
                    }
                    out.push(king_char(piece.color()));
                    out.push(king_ori_char(piece.king_orientation()));
                }
                PieceType::Pawn => {
                    if empty_run > 0 {
                        out.push_str(&empty_run.to_string());
                        empty_run = 0;
                    }
                    out.push(pawn_char(piece.color()));
                    out.push_str(pawn_ori_str(piece.pawn_orientation()));
                }
                PieceType::Invalid => unreachable!("border square read inside the 8x8 playable region"),
            }
        }
        if empty_run > 0 {
            out.push_str(&empty_run.to_string());
        }
        if rank > 0 {
            out.push('/');
        }
    }
    out.push(' ');
    out.push(if pos.to_move() == Color::White { 'w' } else { 'b' });
    out
}

/// Parse text in the format [`display`] produces into a fresh [`Position`]
/// sharing `zobrist`'s keys.
pub fn fen_to_pos(text: &str, zobrist: Arc<ZobristKeys>) -> Result<Position, NotationError> {
    let parts: Vec<&str> = text.split_whitespace().collect();
    if parts.len() < 2 {
        return Err(NotationError::TooFewParts { found: parts.len() });
    }

    let ranks: Vec<&str> = parts[0].split('/').collect();
    if ranks.len() != BOARD_WIDTH as usize {
        return Err(NotationError::TooManyRanks { found: ranks.len() });
    }

    let mut pos = Position::empty(zobrist);
    for (rank_from_top, rank_str) in ranks.iter().enumerate() {
        let rank = BOARD_WIDTH - 1 - rank_from_top as i32;
        let mut file = 0;
        let chars: Vec<char> = rank_str.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            if c.is_ascii_digit() {
                file += c.to_digit(10).unwrap() as i32;
                i += 1;
                continue;
            }
            if file >= BOARD_WIDTH {
                return Err(NotationError::TooManyFiles { rank, files: file + 1 });
            }
            let color = if c.is_ascii_uppercase() { Color::White } else { Color::Black };
            let sq = Square::new(file, rank);
            match c.to_ascii_uppercase() {
                'K' => {
                    let ori_char = chars.get(i + 1).copied().ok_or(NotationError::InvalidOrientation {
                        piece: c,
                        ori: String::new(),
                    })?;
                    let ori = parse_king_ori(ori_char).ok_or_else(|| NotationError::InvalidOrientation {
                        piece: c,
                        ori: ori_char.to_string(),
                    })?;
                    pos.place_piece(sq, Piece::king(color, ori));
                    i += 2;
                }
                'P' => {
                    let ori_str: String = chars.iter().skip(i + 1).take(2).collect();
                    let ori = parse_pawn_ori(&ori_str).ok_or_else(|| NotationError::InvalidOrientation {
                        piece: c,
                        ori: ori_str.clone(),
                    })?;
                    pos.place_piece(sq, Piece::pawn(color, ori));
                    i += 3;
                }
                _ => return Err(NotationError::InvalidPieceChar { char: c }),
            }
            file += 1;
        }
    }

    pos.set_side_to_move(match parts[1] {
        "w" => Color::White,
        "b" => Color::Black,
        other => return Err(NotationError::InvalidSideToMove { found: other.to_string() }),
    });

    Ok(pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_simple_position() {
        let zobrist = ZobristKeys::new(11);
        let mut pos = Position::empty(Arc::clone(&zobrist));
        pos.place_piece(Square::new(0, 0), Piece::king(Color::White, KingOrientation::NN));
        pos.place_piece(Square::new(7, 7), Piece::king(Color::Black, KingOrientation::SS));
        pos.place_piece(Square::new(3, 3), Piece::pawn(Color::White, PawnOrientation::NE));
        pos.set_side_to_move(Color::Black);

        let text = display(&pos);
        let parsed = fen_to_pos(&text, zobrist).expect("round trip should parse");
        assert_eq!(parsed.key(), pos.key());
        assert_eq!(parsed.to_move(), Color::Black);
        assert_eq!(parsed.piece_at(Square::new(3, 3)).ptype(), PieceType::Pawn);
    }

    #[test]
    fn rejects_malformed_side_to_move() {
        let zobrist = ZobristKeys::new(12);
        let err = fen_to_pos("8/8/8/8/8/8/8/8 x", zobrist).unwrap_err();
        assert!(matches!(err, NotationError::InvalidSideToMove { .. }));
    }
}
