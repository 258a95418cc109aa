//! Young-Brothers-Wait fork-join: once the first (principal) move of a node
//! has established a working alpha, the remaining siblings are searched
//! concurrently with a null-window scout when the remaining depth clears
//! [`crate::params::EngineParams::depth_threshold`]. Grounded on the
//! serial/parallel split in `scout_search` in
//! `examples/original_source/player/search_scout.c`; `rayon`'s work-stealing
//! pool plays the role of that file's worker-thread pool (no kept example
//! repo's chess engine is itself parallel at the tree level — this composes
//! the `Arc<AtomicU64>`/shared-counter idiom from
//! `examples/menezesd-ChessEngine/src/board/search/smp.rs` with a plain
//! `rayon::par_iter` fan-out instead of that file's thread-per-worker Lazy
//! SMP scheme).

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use crate::piece::Move;
use crate::position::Position;

use super::node::Window;
use super::SearchEngine;

/// Search `moves` (already excluding the principal move searched serially by
/// the caller) against a shared, monotonically-tightening alpha seeded from
/// the principal move's score. Returns each move's scout/re-search result;
/// moves dropped once another sibling raised `alpha_cell` past `beta` are
/// omitted. A sibling started just before a cutoff is discovered is not
/// retroactively cancelled, trading a bounded amount of wasted work for
/// avoiding a per-node cooperative abort channel.
pub(super) fn search_siblings(
    engine: &SearchEngine,
    pos: &Arc<Position>,
    moves: &[Move],
    depth: i32,
    ply: u32,
    beta: i32,
    seed_alpha: i32,
) -> Vec<(Move, i32)> {
    let alpha_cell = AtomicI32::new(seed_alpha);

    moves
        .par_iter()
        .filter_map(|&mv| {
            if engine.should_stop() {
                return None;
            }
            let local_alpha = alpha_cell.load(Ordering::Relaxed);
            if local_alpha >= beta {
                return None;
            }
            let (child, outcome) = pos.make_move(mv, engine.params.use_ko);
            if outcome.is_ko() {
                return None;
            }
            let child = Arc::new(child);
            if let Some(zapped_color) = outcome.king_was_zapped() {
                let score = engine.terminal_score(pos.to_move(), zapped_color, ply);
                alpha_cell.fetch_max(score, Ordering::Relaxed);
                return Some((mv, score));
            }

            let probe = Window::new(-local_alpha - 1, -local_alpha);
            let mut score = -engine.negamax(&child, depth - 1, probe, ply + 1);
            if score > local_alpha && score < beta {
                let full = Window::new(-beta, -local_alpha);
                score = -engine.negamax(&child, depth - 1, full, ply + 1);
            }
            alpha_cell.fetch_max(score, Ordering::Relaxed);
            Some((mv, score))
        })
        .collect()
}
