//! The position: board, piece locations, Zobrist key, and the laser/make-move
//! machinery grounded on `examples/original_source/player/move_gen.c`.

use std::fmt;
use std::sync::Arc;

use crate::consts::DRAW;
use crate::piece::{Color, KingOrientation, Move, Outcome, Piece, PieceType, BEAM, REFLECT};
use crate::square::{Square, ARR_SIZE, BOARD_WIDTH, ORIGIN};
use crate::zobrist::ZobristKeys;

/// A player tracks at most seven Pawns; the eighth piece is always the King.
pub const MAX_PAWNS: usize = 7;

/// Recursion depth bound used to size fixed-size buffers in the search tree
/// (principal-variation arrays, history-chain walks).
pub const MAX_PLY_IN_SEARCH: usize = 100;

const BW: usize = BOARD_WIDTH as usize;

#[inline]
fn shr8(bits: u8, n: i32) -> u8 {
    if n >= 8 {
        0
    } else {
        bits >> n
    }
}

#[inline]
fn shl8(bits: u8, n: i32) -> u8 {
    if n >= 8 {
        0
    } else {
        bits << n
    }
}

/// A player's Pawns: their squares, in insertion order, plus a `[file][rank]`
/// map back to that order for O(1) lookup on make/unmake. Grounded on
/// `pawns_t`/`pawns_map` in `move_gen.h`/`move_gen.c`.
#[derive(Clone)]
struct PawnList {
    squares: [Square; MAX_PAWNS],
    count: u8,
    map: [[u8; BW]; BW],
}

impl PawnList {
    fn empty() -> Self {
        PawnList {
            squares: [Square::new(0, 0); MAX_PAWNS],
            count: 0,
            map: [[MAX_PAWNS as u8; BW]; BW],
        }
    }

    #[inline]
    fn index_at(&self, sq: Square) -> Option<usize> {
        let idx = self.map[sq.file() as usize][sq.rank() as usize];
        if (idx as usize) < MAX_PAWNS {
            Some(idx as usize)
        } else {
            None
        }
    }

    fn add(&mut self, sq: Square) {
        let i = self.count as usize;
        debug_assert!(i < MAX_PAWNS, "too many pawns for one side");
        self.squares[i] = sq;
        self.map[sq.file() as usize][sq.rank() as usize] = i as u8;
        self.count += 1;
    }

    fn remove(&mut self, sq: Square) {
        let i = self.index_at(sq).expect("removed square has no pawn");
        let last = self.count as usize - 1;
        let moved = self.squares[last];
        self.squares[i] = moved;
        self.map[moved.file() as usize][moved.rank() as usize] = i as u8;
        self.map[sq.file() as usize][sq.rank() as usize] = MAX_PAWNS as u8;
        self.count -= 1;
    }

    fn relocate(&mut self, from: Square, to: Square) {
        let i = self.index_at(from).expect("moved square has no pawn");
        self.squares[i] = to;
        self.map[from.file() as usize][from.rank() as usize] = MAX_PAWNS as u8;
        self.map[to.file() as usize][to.rank() as usize] = i as u8;
    }

    fn swap_colors_at(a: (&mut PawnList, Square), b: (&mut PawnList, Square)) {
        let (pa, sq_a) = a;
        let (pb, sq_b) = b;
        let i = pa.index_at(sq_a).expect("pawn a missing");
        let j = pb.index_at(sq_b).expect("pawn b missing");
        pa.squares[i] = sq_b;
        pb.squares[j] = sq_a;
        pa.map[sq_a.file() as usize][sq_a.rank() as usize] = MAX_PAWNS as u8;
        pa.map[sq_b.file() as usize][sq_b.rank() as usize] = i as u8;
        pb.map[sq_b.file() as usize][sq_b.rank() as usize] = MAX_PAWNS as u8;
        pb.map[sq_a.file() as usize][sq_a.rank() as usize] = j as u8;
    }

    #[inline]
    fn squares(&self) -> &[Square] {
        &self.squares[..self.count as usize]
    }
}

/// A single laser-chess position: the 10x10 board, side-to-move (implicit in
/// `ply`), Zobrist key, piece locations, and a handle to the position it was
/// derived from (for Ko and repetition checks).
#[derive(Clone)]
pub struct Position {
    board: [Piece; ARR_SIZE],
    zobrist: Arc<ZobristKeys>,
    key: u64,
    ply: u32,
    last_move: Option<Move>,
    victims: Outcome,
    kloc: [Square; 2],
    ploc: [PawnList; 2],
    ranks: [u8; BW],
    files: [u8; BW],
    history: Option<Arc<Position>>,
}

impl Position {
    /// An empty board (all playable squares empty, border sentineled), ply
    /// 0, no history. Callers place pieces with [`Position::place_piece`]
    /// before play begins — this is the building block `fen.rs` uses.
    #[must_use]
    pub fn empty(zobrist: Arc<ZobristKeys>) -> Position {
        Position {
            board: [Piece::INVALID; ARR_SIZE],
            zobrist,
            key: 0,
            ply: 0,
            last_move: None,
            victims: Outcome::Zapped(Vec::new()),
            kloc: [Square::new(0, 0), Square::new(0, 0)],
            ploc: [PawnList::empty(), PawnList::empty()],
            ranks: [0; BW],
            files: [0; BW],
            history: None,
        }
        .with_playable_squares_cleared()
    }

    fn with_playable_squares_cleared(mut self) -> Position {
        for file in 0..BOARD_WIDTH {
            for rank in 0..BOARD_WIDTH {
                let sq = Square::new(file, rank);
                self.board[sq.as_usize()] = Piece::EMPTY;
            }
        }
        self
    }

    /// Place `piece` on `sq` of an empty, not-yet-played position. Updates
    /// king/pawn locations, occupancy bitsets, and the incremental key.
    /// Not meaningful once play has started — use `make_move` from then on.
    pub fn place_piece(&mut self, sq: Square, piece: Piece) {
        debug_assert!(sq.on_board());
        debug_assert!(matches!(self.board[sq.as_usize()].ptype(), PieceType::Empty));
        self.board[sq.as_usize()] = piece;
        self.key ^= self
            .zobrist
            .piece_key(sq.as_usize(), piece.ptype(), piece.color(), piece.ori_bits());
        self.set_rank_and_file(sq);
        match piece.ptype() {
            PieceType::King => self.kloc[piece.color().index()] = sq,
            PieceType::Pawn => self.ploc[piece.color().index()].add(sq),
            PieceType::Empty | PieceType::Invalid => unreachable!(),
        }
    }

    /// Set which side moves next on a not-yet-played position, for notation
    /// parsing: `to_move` is derived from ply parity, so this only ever
    /// needs to flip between ply 0 and ply 1.
    pub fn set_side_to_move(&mut self, color: Color) {
        let current = self.to_move();
        if current != color {
            self.key ^= self.zobrist.side_to_move_key();
            self.ply ^= 1;
        }
    }

    #[inline]
    fn set_rank_and_file(&mut self, sq: Square) {
        let (f, r) = (sq.file() as usize, sq.rank() as usize);
        self.files[f] |= 1 << r;
        self.ranks[r] |= 1 << f;
    }

    #[inline]
    fn remove_rank_and_file(&mut self, sq: Square) {
        let (f, r) = (sq.file() as usize, sq.rank() as usize);
        self.files[f] &= !(1 << r);
        self.ranks[r] &= !(1 << f);
    }

    #[inline]
    #[must_use]
    pub fn piece_at(&self, sq: Square) -> Piece {
        self.board[sq.as_usize()]
    }

    #[inline]
    #[must_use]
    pub fn key(&self) -> u64 {
        self.key
    }

    #[inline]
    #[must_use]
    pub fn ply(&self) -> u32 {
        self.ply
    }

    #[inline]
    #[must_use]
    pub fn to_move(&self) -> Color {
        if self.ply % 2 == 0 {
            Color::White
        } else {
            Color::Black
        }
    }

    #[inline]
    #[must_use]
    pub fn last_move(&self) -> Option<Move> {
        self.last_move
    }

    #[inline]
    #[must_use]
    pub fn victims(&self) -> &Outcome {
        &self.victims
    }

    #[inline]
    #[must_use]
    pub fn king_square(&self, color: Color) -> Square {
        self.kloc[color.index()]
    }

    #[inline]
    #[must_use]
    pub fn pawn_squares(&self, color: Color) -> &[Square] {
        self.ploc[color.index()].squares()
    }

    #[inline]
    #[must_use]
    pub fn pawn_count(&self, color: Color) -> u8 {
        self.ploc[color.index()].count
    }

    #[must_use]
    pub fn zobrist(&self) -> &Arc<ZobristKeys> {
        &self.zobrist
    }

    /// The full Zobrist key recomputed from scratch by scanning the board,
    /// used only to cross-check the incrementally maintained `key` in debug
    /// assertions and property tests.
    #[must_use]
    pub fn recompute_key(&self) -> u64 {
        let mut key = 0u64;
        for file in 0..BOARD_WIDTH {
            for rank in 0..BOARD_WIDTH {
                let sq = Square::new(file, rank);
                let p = self.piece_at(sq);
                key ^= self
                    .zobrist
                    .piece_key(sq.as_usize(), p.ptype(), p.color(), p.ori_bits());
            }
        }
        if self.to_move() == Color::Black {
            key ^= self.zobrist.side_to_move_key();
        }
        key
    }

    /// Locate the next occupant along the laser beam travelling `dir` from
    /// `current`, in O(1) via the rank/file occupancy bitsets, or `None` if
    /// the beam runs off the board first. Grounded on `next_piece` in
    /// `move_gen.c`.
    #[must_use]
    pub(crate) fn next_piece(&self, current: Square, dir: KingOrientation) -> Option<Square> {
        let rank = current.rank();
        let file = current.file();
        match dir {
            KingOrientation::NN => {
                let bits = shr8(self.files[file as usize], rank + 1);
                (bits != 0).then(|| current.offset(bits.trailing_zeros() as i32 + 1))
            }
            KingOrientation::SS => {
                let bits = shl8(self.files[file as usize], 8 - rank);
                (bits != 0).then(|| current.offset(-(bits.leading_zeros() as i32 + 1)))
            }
            KingOrientation::WW => {
                let bits = shl8(self.ranks[rank as usize], 8 - file);
                (bits != 0).then(|| current.offset(-(bits.leading_zeros() as i32 + 1) * 10))
            }
            KingOrientation::EE => {
                let bits = shr8(self.ranks[rank as usize], file + 1);
                (bits != 0).then(|| current.offset((bits.trailing_zeros() as i32 + 1) * 10))
            }
        }
    }

    /// Naive O(board) fallback used only to cross-check [`Position::next_piece`]
    /// in debug assertions and property tests.
    #[must_use]
    pub(crate) fn next_piece_naive(&self, current: Square, dir: KingOrientation) -> Option<Square> {
        let step = BEAM[dir as usize];
        let mut sq = current.offset(step);
        loop {
            if !sq.on_board() {
                return None;
            }
            if !matches!(self.piece_at(sq).ptype(), PieceType::Empty) {
                return Some(sq);
            }
            sq = sq.offset(step);
        }
    }

    /// Fire the laser for `color`'s King and return the square of whatever
    /// it hits (Pawn's back or a King), or `None` if it runs off the board.
    /// Grounded on `fire_laser` in `move_gen.c`.
    fn fire_laser(&self, color: Color) -> Option<Square> {
        let mut sq = self.kloc[color.index()];
        let mut dir = self.piece_at(sq).king_orientation();
        loop {
            sq = self.next_piece(sq, dir)?;
            let occupant = self.piece_at(sq);
            match occupant.ptype() {
                PieceType::Pawn => match REFLECT[dir as usize][occupant.pawn_orientation() as usize] {
                    -1 => return Some(sq),
                    out => dir = king_ori_from_i8(out),
                },
                PieceType::King => return Some(sq),
                PieceType::Empty | PieceType::Invalid => unreachable!("next_piece never stops on empty/invalid"),
            }
        }
    }

    /// Move-phase 1: relocate/rotate a piece with no laser resolution yet.
    /// Grounded on `low_level_make_move` in `move_gen.c`.
    fn low_level_make_move(&self, history: Arc<Position>, mv: Move) -> Position {
        let mut p = self.clone();
        p.history = Some(history);
        p.last_move = Some(mv);
        p.key ^= self.zobrist.side_to_move_key();

        let (from, to) = (mv.from(), mv.to());
        if to.raw() != from.raw() {
            let from_piece = p.piece_at(from);
            let to_piece = p.piece_at(to);
            p.xor_piece_key(from, from_piece); // remove from_piece from from_sq
            p.xor_piece_key(to, to_piece); // remove to_piece from to_sq
            p.board[to.as_usize()] = from_piece;
            p.board[from.as_usize()] = to_piece;
            p.xor_piece_key(to, from_piece); // place from_piece in to_sq
            p.xor_piece_key(from, to_piece); // place to_piece in from_sq

            if matches!(to_piece.ptype(), PieceType::Empty) {
                p.set_rank_and_file(to);
                p.remove_rank_and_file(from);
            }

            match (from_piece.ptype(), to_piece.ptype()) {
                (PieceType::Pawn, PieceType::Pawn) => {
                    if from_piece.color() != to_piece.color() {
                        if from_piece.color().index() == 0 {
                            let (a, b) = p.ploc.split_at_mut(1);
                            PawnList::swap_colors_at((&mut a[0], from), (&mut b[0], to));
                        } else {
                            let (a, b) = p.ploc.split_at_mut(1);
                            PawnList::swap_colors_at((&mut b[0], from), (&mut a[0], to));
                        }
                    }
                }
                (PieceType::Pawn, _) => {
                    p.ploc[from_piece.color().index()].relocate(from, to);
                }
                (_, PieceType::Pawn) => {
                    p.ploc[to_piece.color().index()].relocate(to, from);
                }
                _ => {}
            }

            if matches!(from_piece.ptype(), PieceType::King) {
                p.kloc[from_piece.color().index()] = to;
            }
            if matches!(to_piece.ptype(), PieceType::King) {
                p.kloc[to_piece.color().index()] = from;
            }
        } else {
            let from_piece = p.piece_at(from);
            p.xor_piece_key(from, from_piece);
            let rotated = from_piece.rotated(mv.rotation());
            p.board[from.as_usize()] = rotated;
            p.xor_piece_key(from, rotated);
        }

        p.ply += 1;
        p
    }

    #[inline]
    fn xor_piece_key(&mut self, sq: Square, piece: Piece) {
        self.key ^= self
            .zobrist
            .piece_key(sq.as_usize(), piece.ptype(), piece.color(), piece.ori_bits());
    }

    /// Apply `mv` and resolve the resulting laser fire, returning the
    /// zapped pieces, a Ko rejection, or (not reachable from here) an
    /// illegal-move rejection. `use_ko` mirrors the `USE_KO` tunable.
    /// Grounded on `make_move` in `move_gen.c`.
    #[must_use]
    pub fn make_move(self: &Arc<Position>, mv: Move, use_ko: bool) -> (Position, Outcome) {
        let mover = self.to_move();
        let mut p = self.low_level_make_move(Arc::clone(self), mv);

        let mut zapped = Vec::new();
        while let Some(victim_sq) = p.fire_laser(mover) {
            let victim = p.piece_at(victim_sq);
            p.key ^= p
                .zobrist
                .piece_key(victim_sq.as_usize(), victim.ptype(), victim.color(), victim.ori_bits());
            p.board[victim_sq.as_usize()] = Piece::EMPTY;
            p.remove_rank_and_file(victim_sq);
            if matches!(victim.ptype(), PieceType::Pawn) {
                p.ploc[victim.color().index()].remove(victim_sq);
            }
            let is_king = matches!(victim.ptype(), PieceType::King);
            zapped.push(victim);
            if is_king {
                break;
            }
        }
        if use_ko {
            let grandparent_key = p.history.as_ref().and_then(|h| h.history.as_ref()).map(|gp| gp.key);
            let reverted_side = p.key == (self.key ^ self.zobrist.side_to_move_key());
            let reverted_two_ply = grandparent_key == Some(p.key);
            if reverted_side || reverted_two_ply {
                p.victims = Outcome::Ko;
                return (p, Outcome::Ko);
            }
        }

        p.victims = Outcome::Zapped(zapped.clone());
        (p, Outcome::Zapped(zapped))
    }

    /// Two-ply-at-a-time walk up the history chain looking for a repeated
    /// position, stopping as soon as any intervening ply captured
    /// something (a capture can never be undone, so it bounds repetition).
    /// Grounded on `is_repeated`/`get_draw_score` in `search_common.c`; the
    /// original's unconditional ancestor walk (safe only because the game
    /// root carries a sentinel non-empty `victims`) is replaced here with a
    /// bounded walk that simply reports "no repetition" once history runs
    /// out, since an owned `Arc` chain has no such sentinel to lean on.
    #[must_use]
    pub fn repeated_at_ply(&self, ply: u32) -> Option<i32> {
        let mut x = self.history.as_ref()?;
        for _ in 0..MAX_PLY_IN_SEARCH {
            if !x.victims.zapped().is_empty() {
                return None;
            }
            x = x.history.as_ref()?;
            if !x.victims.zapped().is_empty() {
                return None;
            }
            if x.key == self.key {
                return Some(if ply & 1 == 1 { -DRAW } else { DRAW });
            }
            x = x.history.as_ref()?;
        }
        None
    }

    #[inline]
    #[must_use]
    pub fn is_repeated(&self, ply: u32) -> bool {
        self.repeated_at_ply(ply).is_some()
    }
}

fn king_ori_from_i8(v: i8) -> KingOrientation {
    match v {
        0 => KingOrientation::NN,
        1 => KingOrientation::EE,
        2 => KingOrientation::SS,
        _ => KingOrientation::WW,
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ply {} ({:?} to move)", self.ply, self.to_move())?;
        for rank in (0..BOARD_WIDTH).rev() {
            write!(f, "{}  ", rank + 1)?;
            for file in 0..BOARD_WIDTH {
                write!(f, "{:>4?}", self.piece_at(Square::new(file, rank)))?;
            }
            writeln!(f)?;
        }
        write!(f, "   ")?;
        for file in 0..BOARD_WIDTH {
            write!(f, "  {} ", (file as u8 + b'a') as char)?;
        }
        writeln!(f)
    }
}

// ORIGIN is re-exported for fen.rs's direct-index board walks.
pub use crate::square::ORIGIN as SQUARE_ORIGIN;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::{KingOrientation as KO, PawnOrientation as PO, Rotation};

    fn empty_pos() -> Position {
        Position::empty(ZobristKeys::new(7))
    }

    #[test]
    fn place_piece_sets_king_location() {
        let mut p = empty_pos();
        let sq = Square::new(3, 3);
        p.place_piece(sq, Piece::king(Color::White, KO::NN));
        assert_eq!(p.king_square(Color::White), sq);
    }

    #[test]
    fn next_piece_matches_naive_scan_on_populated_board() {
        let mut p = empty_pos();
        p.place_piece(Square::new(0, 0), Piece::king(Color::White, KO::NN));
        p.place_piece(Square::new(0, 7), Piece::king(Color::Black, KO::SS));
        p.place_piece(Square::new(0, 4), Piece::pawn(Color::White, PO::NE));
        p.place_piece(Square::new(4, 0), Piece::pawn(Color::Black, PO::SW));

        for file in 0..BOARD_WIDTH {
            for rank in 0..BOARD_WIDTH {
                let sq = Square::new(file, rank);
                for &dir in &[KO::NN, KO::EE, KO::SS, KO::WW] {
                    assert_eq!(
                        p.next_piece(sq, dir),
                        p.next_piece_naive(sq, dir),
                        "mismatch at {sq:?} dir {dir:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn king_fires_laser_straight_down_empty_board() {
        let mut p = empty_pos();
        p.place_piece(Square::new(0, 0), Piece::king(Color::White, KO::NN));
        p.place_piece(Square::new(7, 7), Piece::king(Color::Black, KO::SS));
        assert_eq!(p.fire_laser(Color::White), None);
    }

    #[test]
    fn king_shoots_opposing_king_head_on() {
        let mut p = empty_pos();
        p.place_piece(Square::new(3, 0), Piece::king(Color::White, KO::NN));
        p.place_piece(Square::new(3, 7), Piece::king(Color::Black, KO::SS));
        assert_eq!(p.fire_laser(Color::White), Some(Square::new(3, 7)));
    }

    #[test]
    fn make_move_king_step_updates_location_and_ply() {
        let zob = ZobristKeys::new(3);
        let mut p = Position::empty(zob);
        p.place_piece(Square::new(0, 0), Piece::king(Color::White, KO::EE));
        p.place_piece(Square::new(7, 7), Piece::king(Color::Black, KO::WW));
        let root = Arc::new(p);
        let mv = Move::new(PieceType::King, Rotation::None, Square::new(0, 0), Square::new(1, 0));
        let (next, outcome) = root.make_move(mv, false);
        assert_eq!(next.king_square(Color::White), Square::new(1, 0));
        assert_eq!(next.ply(), 1);
        assert!(!outcome.is_ko());
    }

    #[test]
    fn recompute_key_matches_incremental_key_after_moves() {
        let zob = ZobristKeys::new(11);
        let mut p = Position::empty(zob);
        p.place_piece(Square::new(0, 0), Piece::king(Color::White, KO::EE));
        p.place_piece(Square::new(7, 7), Piece::king(Color::Black, KO::WW));
        p.place_piece(Square::new(3, 3), Piece::pawn(Color::White, PO::NE));
        assert_eq!(p.key(), p.recompute_key());
        let root = Arc::new(p);
        let mv = Move::new(PieceType::King, Rotation::None, Square::new(0, 0), Square::new(1, 0));
        let (next, _) = root.make_move(mv, false);
        assert_eq!(next.key(), next.recompute_key());
    }
}
