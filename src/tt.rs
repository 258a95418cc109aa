//! Lock-free transposition table shared across the search's parallel
//! workers.
//!
//! Each slot stores `key ^ data` alongside `data` in separate atomics; a
//! probe is valid only if re-xoring the two reproduces the hash, which
//! catches the torn reads that an unsynchronized concurrent writer can
//! otherwise produce (the bucket/depth-aged replacement policy is grounded
//! on `examples/menezesd-ChessEngine/src/tt.rs`; the lock-free xor
//! technique itself on that repo's `src/pawn_hash.rs`).

use std::sync::atomic::{AtomicU64, Ordering};

use crate::piece::{Move, PieceType, Rotation};
use crate::square::Square;

/// What a stored score means relative to the window it was produced in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bound {
    Exact,
    Lower,
    Upper,
}

fn bound_bits(b: Bound) -> u64 {
    match b {
        Bound::Exact => 0,
        Bound::Lower => 1,
        Bound::Upper => 2,
    }
}

fn bound_from_bits(bits: u64) -> Bound {
    match bits & 0b11 {
        0 => Bound::Exact,
        1 => Bound::Lower,
        _ => Bound::Upper,
    }
}

fn ptype_bits(ptype: PieceType) -> u64 {
    match ptype {
        PieceType::Pawn => 1,
        PieceType::King => 2,
        PieceType::Empty | PieceType::Invalid => 0,
    }
}

fn ptype_from_bits(bits: u64) -> Option<PieceType> {
    match bits & 0b11 {
        1 => Some(PieceType::Pawn),
        2 => Some(PieceType::King),
        _ => None,
    }
}

fn rot_bits(rot: Rotation) -> u64 {
    rot as u64 & 0b11
}

fn rot_from_bits(bits: u64) -> Rotation {
    match bits & 0b11 {
        1 => Rotation::Right,
        2 => Rotation::Uturn,
        3 => Rotation::Left,
        _ => Rotation::None,
    }
}

const HAS_MOVE_BIT: u64 = 1 << 52;

/// An entry read back from the table: score, bound type, search depth it
/// was computed at, and the move to try first (if any was stored).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TtEntry {
    pub depth: u8,
    pub score: i32,
    pub bound: Bound,
    pub best_move: Option<Move>,
    pub generation: u8,
}

fn pack(entry: &TtEntry) -> u64 {
    let mut data: u64 = 0;
    if let Some(mv) = entry.best_move {
        data |= HAS_MOVE_BIT;
        data |= mv.from().raw() as u64 & 0x7F;
        data |= (mv.to().raw() as u64 & 0x7F) << 7;
        data |= ptype_bits(mv.ptype()) << 14;
        data |= rot_bits(mv.rotation()) << 16;
    }
    data |= ((entry.score as i64 as u16 as u64) & 0xFFFF) << 18;
    data |= (entry.depth as u64) << 34;
    data |= bound_bits(entry.bound) << 42;
    data |= (entry.generation as u64) << 44;
    data
}

fn unpack(data: u64) -> TtEntry {
    let best_move = if data & HAS_MOVE_BIT != 0 {
        let from = Square::from_raw((data & 0x7F) as i32);
        let to = Square::from_raw(((data >> 7) & 0x7F) as i32);
        let ptype = ptype_from_bits(data >> 14).unwrap_or(PieceType::King);
        let rot = rot_from_bits(data >> 16);
        Some(Move::new(ptype, rot, from, to))
    } else {
        None
    };
    TtEntry {
        depth: ((data >> 34) & 0xFF) as u8,
        score: (((data >> 18) & 0xFFFF) as u16) as i16 as i32,
        bound: bound_from_bits(data >> 42),
        best_move,
        generation: ((data >> 44) & 0xFF) as u8,
    }
}

#[repr(C)]
struct Slot {
    key_xor: AtomicU64,
    data: AtomicU64,
}

impl Slot {
    fn empty() -> Self {
        Slot {
            key_xor: AtomicU64::new(0),
            data: AtomicU64::new(0),
        }
    }

    fn load(&self, key: u64) -> Option<TtEntry> {
        let data = self.data.load(Ordering::Relaxed);
        let key_xor = self.key_xor.load(Ordering::Relaxed);
        if data != 0 && key_xor ^ data == key {
            Some(unpack(data))
        } else {
            None
        }
    }

    fn store(&self, key: u64, data: u64) {
        self.data.store(data, Ordering::Relaxed);
        self.key_xor.store(key ^ data, Ordering::Relaxed);
    }

    fn occupant_depth_and_generation(&self) -> Option<(u8, u8)> {
        let data = self.data.load(Ordering::Relaxed);
        if data == 0 {
            None
        } else {
            Some((((data >> 34) & 0xFF) as u8, ((data >> 44) & 0xFF) as u8))
        }
    }
}

const BUCKET_SIZE: usize = 4;

struct Bucket {
    slots: [Slot; BUCKET_SIZE],
}

impl Bucket {
    fn empty() -> Self {
        Bucket {
            slots: [Slot::empty(), Slot::empty(), Slot::empty(), Slot::empty()],
        }
    }
}

/// Shared transposition table. `probe`/`store` both take `&self` so one
/// table can be wrapped in an `Arc` and handed to every worker in the YBW
/// fork-join tree without a lock.
pub struct TranspositionTable {
    buckets: Vec<Bucket>,
    mask: usize,
}

// Safety: every field access goes through `AtomicU64`.
unsafe impl Sync for TranspositionTable {}

impl TranspositionTable {
    #[must_use]
    pub fn with_size_mb(size_mb: usize) -> Self {
        let bucket_size = std::mem::size_of::<Bucket>();
        let mut num_buckets = (size_mb * 1024 * 1024) / bucket_size.max(1);
        num_buckets = num_buckets.next_power_of_two() / 2;
        if num_buckets == 0 {
            num_buckets = 1024;
        }
        let buckets = (0..num_buckets).map(|_| Bucket::empty()).collect();
        TranspositionTable {
            buckets,
            mask: num_buckets - 1,
        }
    }

    #[inline]
    fn index(&self, key: u64) -> usize {
        (key as usize) & self.mask
    }

    #[must_use]
    pub fn probe(&self, key: u64) -> Option<TtEntry> {
        let bucket = &self.buckets[self.index(key)];
        bucket.slots.iter().find_map(|slot| slot.load(key))
    }

    /// Store `entry` under `key`, preferring an empty slot, then a slot
    /// already holding `key`, then the shallowest/oldest occupant in the
    /// bucket.
    pub fn store(&self, key: u64, entry: TtEntry) {
        let bucket = &self.buckets[self.index(key)];
        let data = pack(&entry);

        for slot in &bucket.slots {
            if slot.data.load(Ordering::Relaxed) == 0 {
                slot.store(key, data);
                return;
            }
        }
        for slot in &bucket.slots {
            if slot.load(key).is_some() {
                slot.store(key, data);
                return;
            }
        }

        let mut worst = 0usize;
        let mut worst_priority = i32::MAX;
        for (i, slot) in bucket.slots.iter().enumerate() {
            if let Some((depth, generation)) = slot.occupant_depth_and_generation() {
                let age = entry.generation.wrapping_sub(generation);
                let priority = i32::from(depth) * 2 - i32::from(age);
                if priority < worst_priority {
                    worst_priority = priority;
                    worst = i;
                }
            }
        }
        bucket.slots[worst].store(key, data);
    }

    /// Drop every entry, e.g. between unrelated games.
    pub fn clear(&self) {
        for bucket in &self.buckets {
            for slot in &bucket.slots {
                slot.data.store(0, Ordering::Relaxed);
                slot.key_xor.store(0, Ordering::Relaxed);
            }
        }
    }
}

impl Default for TranspositionTable {
    fn default() -> Self {
        Self::with_size_mb(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::square::Square;

    #[test]
    fn store_then_probe_round_trips() {
        let tt = TranspositionTable::with_size_mb(1);
        let mv = Move::new(PieceType::King, Rotation::None, Square::new(0, 0), Square::new(1, 0));
        let key = 0xDEAD_BEEF_1234_5678;
        tt.store(
            key,
            TtEntry {
                depth: 5,
                score: -321,
                bound: Bound::Lower,
                best_move: Some(mv),
                generation: 2,
            },
        );
        let entry = tt.probe(key).expect("entry should be present");
        assert_eq!(entry.depth, 5);
        assert_eq!(entry.score, -321);
        assert_eq!(entry.bound, Bound::Lower);
        assert_eq!(entry.best_move, Some(mv));
        assert_eq!(entry.generation, 2);
    }

    #[test]
    fn negative_scores_round_trip_through_the_packed_word() {
        let tt = TranspositionTable::with_size_mb(1);
        tt.store(
            42,
            TtEntry {
                depth: 0,
                score: -crate::consts::INF,
                bound: Bound::Upper,
                best_move: None,
                generation: 0,
            },
        );
        assert_eq!(tt.probe(42).unwrap().score, -crate::consts::INF);
    }

    #[test]
    fn empty_table_probe_misses() {
        let tt = TranspositionTable::with_size_mb(1);
        assert!(tt.probe(12345).is_none());
    }
}
