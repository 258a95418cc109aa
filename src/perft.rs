//! Move-generator correctness/perf harness: counts leaf nodes reachable
//! from a position at a given depth. Used by integration tests to pin down
//! `movegen`/`Position::make_move` against known node counts, and by the
//! benchmark suite to track move-generation throughput.

use std::sync::Arc;

use crate::movegen::generate_all;
use crate::position::Position;

/// Count leaf positions at `depth` plies from `root`. Moves that are
/// rejected under the Ko rule do not count as legal and are skipped
/// without recursing.
#[must_use]
pub fn perft(root: &Arc<Position>, depth: u32, use_ko: bool) -> u64 {
    if depth == 0 {
        return 1;
    }
    let mut nodes = 0;
    for mv in generate_all(root) {
        let (child, outcome) = root.make_move(mv, use_ko);
        if outcome.is_ko() {
            continue;
        }
        if depth == 1 {
            nodes += 1;
        } else {
            nodes += perft(&Arc::new(child), depth - 1, use_ko);
        }
    }
    nodes
}

/// Per-move breakdown of `perft`, for diverging against a reference
/// implementation one root move at a time.
#[must_use]
pub fn perft_divide(root: &Arc<Position>, depth: u32, use_ko: bool) -> Vec<(crate::piece::Move, u64)> {
    generate_all(root)
        .into_iter()
        .filter_map(|mv| {
            let (child, outcome) = root.make_move(mv, use_ko);
            if outcome.is_ko() {
                return None;
            }
            let count = if depth <= 1 { 1 } else { perft(&Arc::new(child), depth - 1, use_ko) };
            Some((mv, count))
        })
        .collect()
}
