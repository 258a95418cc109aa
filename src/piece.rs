//! Piece, move, and direction-table primitives.
//!
//! Pieces, orientations, and moves are packed into small integers, matching
//! the reference implementation's bit layout so the laser/reflection tables
//! below can be indexed directly by orientation discriminant.

use std::fmt;

use crate::square::Square;

/// What occupies a square.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PieceType {
    Empty,
    Pawn,
    King,
    /// Sentinel occupant of the 10x10 border ring.
    Invalid,
}

/// Side to move / piece owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Color {
    White,
    Black,
}

impl Color {
    #[inline]
    #[must_use]
    pub const fn opposite(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    #[inline]
    #[must_use]
    pub(crate) const fn index(self) -> usize {
        match self {
            Color::White => 0,
            Color::Black => 1,
        }
    }
}

/// King facing direction. Discriminants double as indices into
/// [`BEAM`] and [`REFLECT`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KingOrientation {
    NN = 0,
    EE = 1,
    SS = 2,
    WW = 3,
}

/// Pawn diagonal facing. Shares the same 2-bit encoding space as
/// [`KingOrientation`] (both stored in the same packed field), but a
/// pawn's discriminant indexes [`REFLECT`]'s second axis, not [`BEAM`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PawnOrientation {
    NW = 0,
    NE = 1,
    SE = 2,
    SW = 3,
}

const fn king_ori_from_bits(bits: u8) -> KingOrientation {
    match bits & 3 {
        0 => KingOrientation::NN,
        1 => KingOrientation::EE,
        2 => KingOrientation::SS,
        _ => KingOrientation::WW,
    }
}

const fn pawn_ori_from_bits(bits: u8) -> PawnOrientation {
    match bits & 3 {
        0 => PawnOrientation::NW,
        1 => PawnOrientation::NE,
        2 => PawnOrientation::SE,
        _ => PawnOrientation::SW,
    }
}

/// A packed board occupant: `(type: 2 bits, color: 1 bit, orientation: 2
/// bits)`. `Copy` so boards can hold 100 of these with no indirection.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Piece {
    ptype: PieceType,
    color: Color,
    ori_bits: u8,
}

impl Piece {
    pub const EMPTY: Piece = Piece {
        ptype: PieceType::Empty,
        color: Color::White,
        ori_bits: 0,
    };

    pub const INVALID: Piece = Piece {
        ptype: PieceType::Invalid,
        color: Color::White,
        ori_bits: 0,
    };

    #[must_use]
    pub const fn king(color: Color, ori: KingOrientation) -> Piece {
        Piece {
            ptype: PieceType::King,
            color,
            ori_bits: ori as u8,
        }
    }

    #[must_use]
    pub const fn pawn(color: Color, ori: PawnOrientation) -> Piece {
        Piece {
            ptype: PieceType::Pawn,
            color,
            ori_bits: ori as u8,
        }
    }

    #[inline]
    #[must_use]
    pub const fn ptype(self) -> PieceType {
        self.ptype
    }

    #[inline]
    #[must_use]
    pub const fn color(self) -> Color {
        self.color
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        matches!(self.ptype, PieceType::Empty)
    }

    #[inline]
    #[must_use]
    pub const fn is_invalid(self) -> bool {
        matches!(self.ptype, PieceType::Invalid)
    }

    /// Non-empty and non-sentinel: what `ranks`/`files` bitsets track.
    #[inline]
    #[must_use]
    pub const fn is_occupant(self) -> bool {
        matches!(self.ptype, PieceType::Pawn | PieceType::King)
    }

    #[inline]
    #[must_use]
    pub const fn king_orientation(self) -> KingOrientation {
        debug_assert!(matches!(self.ptype, PieceType::King));
        king_ori_from_bits(self.ori_bits)
    }

    #[inline]
    #[must_use]
    pub const fn pawn_orientation(self) -> PawnOrientation {
        debug_assert!(matches!(self.ptype, PieceType::Pawn));
        pawn_ori_from_bits(self.ori_bits)
    }

    #[inline]
    #[must_use]
    pub(crate) const fn ori_bits(self) -> u8 {
        self.ori_bits
    }

    /// Rotate this piece's orientation by `rot` (mod 4), for either piece
    /// type uniformly since both share the 2-bit encoding.
    #[inline]
    #[must_use]
    pub const fn rotated(self, rot: Rotation) -> Piece {
        Piece {
            ori_bits: (self.ori_bits + rot as u8) & 3,
            ..self
        }
    }
}

impl fmt::Debug for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ptype {
            PieceType::Empty => write!(f, "."),
            PieceType::Invalid => write!(f, "#"),
            PieceType::King => write!(
                f,
                "{}K{:?}",
                if self.color == Color::White { "w" } else { "b" },
                self.king_orientation()
            ),
            PieceType::Pawn => write!(
                f,
                "{}P{:?}",
                if self.color == Color::White { "w" } else { "b" },
                self.pawn_orientation()
            ),
        }
    }
}

/// Rotation applied by a move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Rotation {
    None = 0,
    Right = 1,
    Uturn = 2,
    Left = 3,
}

/// A single move: the piece type moved, any in-place rotation, and the
/// from/to squares (equal for a rotation-only or null move).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Move {
    ptype: PieceType,
    rot: Rotation,
    from: Square,
    to: Square,
}

impl Move {
    #[must_use]
    pub const fn new(ptype: PieceType, rot: Rotation, from: Square, to: Square) -> Move {
        Move {
            ptype,
            rot,
            from,
            to,
        }
    }

    /// The King's null move: no rotation, no displacement.
    #[must_use]
    pub const fn null(king_sq: Square) -> Move {
        Move::new(PieceType::King, Rotation::None, king_sq, king_sq)
    }

    #[inline]
    #[must_use]
    pub const fn ptype(self) -> PieceType {
        self.ptype
    }

    #[inline]
    #[must_use]
    pub const fn rotation(self) -> Rotation {
        self.rot
    }

    #[inline]
    #[must_use]
    pub const fn from(self) -> Square {
        self.from
    }

    #[inline]
    #[must_use]
    pub const fn to(self) -> Square {
        self.to
    }

    #[inline]
    #[must_use]
    pub const fn is_rotation_only(self) -> bool {
        self.from.raw() == self.to.raw()
    }

    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.is_rotation_only() && matches!(self.rot, Rotation::None)
    }

    #[inline]
    #[must_use]
    pub const fn is_step(self) -> bool {
        self.from.raw() != self.to.raw()
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_rotation_only() {
            let c = match self.rot {
                Rotation::None => return write!(f, "{}{}", self.from, self.from),
                Rotation::Right => 'R',
                Rotation::Uturn => 'U',
                Rotation::Left => 'L',
            };
            write!(f, "{}{}", self.from, c)
        } else {
            write!(f, "{}{}", self.from, self.to)
        }
    }
}

/// Result of firing the laser: the ordered list of zapped pieces (at most
/// 13 — the entire board minus the two kings), or a distinguished outcome
/// for a Ko / illegal move.
///
/// The reference implementation overloads a negative `zapped_count` as the
/// Ko/illegal sentinel; Rust has no need for that trick, so the two
/// conditions are modeled as their own variants instead while preserving
/// exactly the same decision points described in spec.md §4.B.4/§7.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Normal resolution: the ordered list of zapped pieces (possibly
    /// empty).
    Zapped(Vec<Piece>),
    /// The move reverted the position to a recent state (spec.md §4.B.4).
    Ko,
    /// Rejected before laser resolution (only reachable via Ko today).
    Illegal,
}

impl Outcome {
    #[inline]
    #[must_use]
    pub fn zapped(&self) -> &[Piece] {
        match self {
            Outcome::Zapped(v) => v,
            Outcome::Ko | Outcome::Illegal => &[],
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_ko(&self) -> bool {
        matches!(self, Outcome::Ko)
    }

    #[inline]
    #[must_use]
    pub const fn is_illegal(&self) -> bool {
        matches!(self, Outcome::Illegal)
    }

    #[inline]
    #[must_use]
    pub fn king_was_zapped(&self) -> Option<Color> {
        match self {
            Outcome::Zapped(v) => v.last().and_then(|p| {
                matches!(p.ptype(), PieceType::King).then(|| p.color())
            }),
            Outcome::Ko | Outcome::Illegal => None,
        }
    }
}

/// The eight king-step offsets, in raw `Square` delta form. Grounded on
/// `dir[8]` in `examples/original_source/player/move_gen.c`.
pub const DIR8: [i32; 8] = [-11, -10, -9, -1, 1, 9, 10, 11];

/// Laser step offset per [`KingOrientation`] discriminant. Grounded on
/// `beam[NUM_ORI]` in the same file.
pub const BEAM: [i32; 4] = [1, 10, -1, -10];

/// `REFLECT[beam_dir][pawn_ori]`: outgoing beam direction (as a
/// `KingOrientation` discriminant) when a beam traveling `beam_dir` strikes
/// a pawn facing `pawn_ori`, or `-1` if the beam struck the pawn's back
/// (absorbed). Grounded on `reflect[NUM_ORI][NUM_ORI]` in
/// `examples/original_source/player/eval.c`.
pub const REFLECT: [[i8; 4]; 4] = [
    // NW  NE  SE  SW
    [-1, -1, 1, 3], // NN
    [0, -1, -1, 2], // EE
    [3, 1, -1, -1], // SS
    [-1, 0, 2, -1], // WW
];

/// Look up the outgoing beam direction, or `None` if the beam was absorbed
/// by the pawn's back.
#[inline]
#[must_use]
pub fn reflect(beam_dir: KingOrientation, pawn_ori: PawnOrientation) -> Option<KingOrientation> {
    let out = REFLECT[beam_dir as usize][pawn_ori as usize];
    if out < 0 {
        None
    } else {
        Some(king_ori_from_bits(out as u8))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_cycles_through_four_orientations() {
        let mut p = Piece::king(Color::White, KingOrientation::NN);
        for _ in 0..4 {
            p = p.rotated(Rotation::Right);
        }
        assert_eq!(p.king_orientation(), KingOrientation::NN);
    }

    #[test]
    fn null_move_is_rotation_only_with_no_rotation() {
        let sq = Square::new(3, 3);
        let mv = Move::null(sq);
        assert!(mv.is_null());
        assert!(mv.is_rotation_only());
        assert!(!mv.is_step());
    }

    #[test]
    fn reflect_back_hit_is_absorbed() {
        // Beam going NN hits a pawn facing NW or NE -> absorbed (back hit).
        assert_eq!(reflect(KingOrientation::NN, PawnOrientation::NW), None);
        assert_eq!(reflect(KingOrientation::NN, PawnOrientation::NE), None);
        assert_eq!(
            reflect(KingOrientation::NN, PawnOrientation::SE),
            Some(KingOrientation::EE)
        );
        assert_eq!(
            reflect(KingOrientation::NN, PawnOrientation::SW),
            Some(KingOrientation::WW)
        );
    }

    #[test]
    fn move_display_renders_rotation_suffix() {
        let sq = Square::new(0, 0);
        let mv = Move::new(PieceType::King, Rotation::Right, sq, sq);
        assert_eq!(mv.to_string(), "a1R");
    }

    #[test]
    fn outcome_king_zap_reports_winner() {
        let victims = Outcome::Zapped(vec![Piece::king(Color::Black, KingOrientation::NN)]);
        assert_eq!(victims.king_was_zapped(), Some(Color::Black));
    }
}
