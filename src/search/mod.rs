//! Iterative-deepening alpha-beta search over the laser-chess move tree:
//! principal-variation search with a null-window scout for non-first moves,
//! quiescence extension over zapping moves, late-move reductions, futility
//! pruning, and a shared lock-free transposition table. Grounded on
//! `examples/original_source/player/search_common.c` (`evaluate_as_leaf`,
//! `get_sortable_move_list`, the `fmarg` futility table) and
//! `search_scout.c` (`scout_search`'s serial-first/parallel-rest split,
//! reproduced here as [`parallel::search_siblings`]). The serial
//! principal-variation/null-window control flow itself mirrors
//! `examples/menezesd-ChessEngine/src/search/algorithms.rs`'s `negamax`.

mod node;
mod order;
mod parallel;

pub use node::{SearchResult, Window};

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

use crate::consts::{INF, PAWN_VALUE, WIN};
use crate::eval::eval;
use crate::movegen::generate_all;
use crate::params::{EngineParams, FUTILITY_MARGIN};
use crate::piece::{Color, Move, Outcome};
use crate::position::Position;
use crate::tables::{HistoryTable, KillerTable};
use crate::tt::{Bound, TranspositionTable, TtEntry};

use order::order_moves;

/// Owns every piece of state a search needs to share across iterative
/// deepening and (once depth clears `depth_threshold`) parallel workers: the
/// transposition table, killer/history tables, node counter, and abort
/// signal. Cheap to share via `&SearchEngine` since every field provides its
/// own interior mutability.
pub struct SearchEngine {
    params: EngineParams,
    tt: Arc<TranspositionTable>,
    killers: Arc<KillerTable>,
    history: Arc<HistoryTable>,
    nodes: AtomicU64,
    stop: AtomicBool,
    generation: AtomicU8,
    deadline: Mutex<Option<Instant>>,
}

impl SearchEngine {
    #[must_use]
    pub fn new(params: EngineParams, tt_size_mb: usize) -> Self {
        SearchEngine {
            params,
            tt: Arc::new(TranspositionTable::with_size_mb(tt_size_mb)),
            killers: Arc::new(KillerTable::new()),
            history: Arc::new(HistoryTable::new()),
            nodes: AtomicU64::new(0),
            stop: AtomicBool::new(false),
            generation: AtomicU8::new(0),
            deadline: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    #[must_use]
    pub fn nodes_searched(&self) -> u64 {
        self.nodes.load(Ordering::Relaxed)
    }

    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    fn should_stop(&self) -> bool {
        if self.stop.load(Ordering::Relaxed) {
            return true;
        }
        let n = self.nodes.load(Ordering::Relaxed);
        if self.params.abort_check_period == 0 || n & self.params.abort_check_period != 0 {
            return false;
        }
        let Some(deadline) = *self.deadline.lock() else {
            return false;
        };
        if Instant::now() >= deadline {
            self.stop.store(true, Ordering::Relaxed);
            true
        } else {
            false
        }
    }

    /// Run iterative deepening from depth 1 up to `max_depth`, stopping
    /// early if `deadline` passes or a forced mate is found. Returns the
    /// best result from the deepest *completed* iteration, calling
    /// `on_progress` with a copy of each completed iteration's result
    /// (`info depth D score S nodes N pv M1 M2 …` per spec.md §6) as it
    /// goes — the caller's UCI-like loop owns time/elapsed formatting,
    /// this only supplies the data.
    #[must_use]
    pub fn search(
        &self,
        root: &Arc<Position>,
        max_depth: i32,
        deadline: Option<Instant>,
        mut on_progress: Option<&mut dyn FnMut(&SearchResult)>,
    ) -> SearchResult {
        self.stop.store(false, Ordering::Relaxed);
        self.nodes.store(0, Ordering::Relaxed);
        self.generation.fetch_add(1, Ordering::Relaxed);
        *self.deadline.lock() = deadline;

        let mut result = SearchResult {
            best_move: None,
            score: 0,
            depth: 0,
            nodes: 0,
            pv: Vec::new(),
        };

        for depth in 1..=max_depth.max(1) {
            let score = self.negamax(root, depth, Window::new(-INF, INF), 0);
            if self.should_stop() && depth > 1 {
                break;
            }
            let best_move = self.tt.probe(root.key()).and_then(|e| e.best_move);
            let pv = self.collect_pv(root, depth);
            result = SearchResult {
                best_move,
                score,
                depth,
                nodes: self.nodes_searched(),
                pv,
            };
            #[cfg(feature = "logging")]
            log::debug!(
                "info depth {} score {} nodes {} pv {}",
                result.depth,
                result.score,
                result.nodes,
                result.pv.iter().map(|mv| mv.to_string()).collect::<Vec<_>>().join(" "),
            );
            if let Some(sink) = on_progress.as_deref_mut() {
                sink(&result);
            }
            if score.abs() >= WIN - MAX_PLY_IN_SEARCH_I32 {
                break;
            }
            if self.should_stop() {
                break;
            }
        }
        #[cfg(feature = "logging")]
        log::info!(
            "search finished: depth {} score {} nodes {}",
            result.depth,
            result.score,
            result.nodes,
        );
        result
    }

    /// Walk the transposition table from `root` following each position's
    /// stored best move, up to `max_len` plies or the first miss/cycle.
    /// Used only to report the line after the fact — the search itself
    /// doesn't need a PV array, since `negamax`'s return value already
    /// reflects it.
    fn collect_pv(&self, root: &Arc<Position>, max_len: i32) -> Vec<Move> {
        let mut pv = Vec::new();
        let mut seen_keys = Vec::new();
        let mut pos = Arc::clone(root);
        while pv.len() < max_len.max(0) as usize {
            let Some(entry) = self.tt.probe(pos.key()) else {
                break;
            };
            let Some(mv) = entry.best_move else {
                break;
            };
            if seen_keys.contains(&pos.key()) {
                break;
            }
            seen_keys.push(pos.key());
            let (next, outcome) = pos.make_move(mv, self.params.use_ko);
            if outcome.is_ko() {
                break;
            }
            pv.push(mv);
            if outcome.king_was_zapped().is_some() {
                break;
            }
            pos = Arc::new(next);
        }
        pv
    }

    /// Score assigned when `mover`'s move zapped `zapped_color`'s King,
    /// ending the game: a win for `mover` unless it shot its own King.
    /// Ply-adjusted so the search prefers the fastest available mate.
    fn terminal_score(&self, mover: Color, zapped_color: Color, ply: u32) -> i32 {
        let magnitude = WIN - ply as i32;
        if zapped_color == mover {
            -magnitude
        } else {
            magnitude
        }
    }

    fn should_fork(&self, depth: i32) -> bool {
        depth > self.params.depth_threshold
    }

    fn lmr_reduction(&self, depth: i32, legal_index: usize) -> i32 {
        if depth < 3 {
            0
        } else if legal_index >= self.params.lmr_r2 as usize {
            2
        } else if legal_index >= self.params.lmr_r1 as usize {
            1
        } else {
            0
        }
    }

    fn record_cutoff(&self, ply: u32, mv: Move, color: Color, depth: i32) {
        self.killers.record(ply as usize, mv);
        self.history.reward(color, mv.ptype(), mv.to(), mv.rotation() as u8, depth);
    }

    /// Principal-variation/null-window alpha-beta search. Grounded on
    /// `negamax` in `examples/menezesd-ChessEngine/src/search/algorithms.rs`,
    /// generalized from standard-chess captures/quiet moves to this game's
    /// every-ply laser resolution.
    pub(crate) fn negamax(&self, pos: &Arc<Position>, depth: i32, window: Window, ply: u32) -> i32 {
        self.nodes.fetch_add(1, Ordering::Relaxed);
        if self.should_stop() {
            return 0;
        }
        if depth <= 0 {
            return self.quiescence(pos, window, ply);
        }

        let mut alpha = window.alpha.max(-(WIN - ply as i32));
        let mut beta = window.beta.min(WIN - ply as i32);
        if alpha >= beta {
            return alpha;
        }

        if self.params.detect_draws {
            if let Some(score) = pos.repeated_at_ply(ply) {
                return score;
            }
        }

        let key = pos.key();
        let mut tt_move = None;
        if self.params.enable_tables {
            if let Some(entry) = self.tt.probe(key) {
                tt_move = entry.best_move;
                if i32::from(entry.depth) >= depth {
                    match entry.bound {
                        Bound::Exact => return entry.score,
                        Bound::Lower => alpha = alpha.max(entry.score),
                        Bound::Upper => beta = beta.min(entry.score),
                    }
                    if alpha >= beta {
                        return entry.score;
                    }
                }
            }
        }

        // Scout-only forward pruning: a null-window node whose stand-pat
        // already clears beta by a margin no reply at this shallow a depth
        // could plausibly close is cut off without generating moves at all.
        // Grounded on `evaluate_as_leaf` in `search_common.c`.
        if beta - alpha == 1 && depth <= 2 {
            let stand_pat = eval(pos, &self.params) + self.params.hmb;
            if (depth == 1 && stand_pat >= beta + 3 * PAWN_VALUE) || (depth == 2 && stand_pat >= beta + 5 * PAWN_VALUE) {
                return beta;
            }
        }

        let mut moves = generate_all(pos);
        let killers = self.killers.moves_at(ply as usize);
        order_moves(pos, &mut moves, tt_move, &killers, &self.history);

        let orig_alpha = alpha;
        let static_eval = (depth <= self.params.fut_depth).then(|| eval(pos, &self.params));
        let mover = pos.to_move();

        let mut moves_iter = moves.into_iter();
        let mut first = None;
        for mv in moves_iter.by_ref() {
            let (child, outcome) = pos.make_move(mv, self.params.use_ko);
            if outcome.is_ko() {
                continue;
            }
            first = Some((mv, child, outcome));
            break;
        }

        let Some((first_move, first_child, first_outcome)) = first else {
            // Every move reverted the position under Ko: no legal move this
            // ply. The mover has nothing to play and forfeits.
            return -(WIN - ply as i32);
        };

        let mut best_score = if let Some(color) = first_outcome.king_was_zapped() {
            self.terminal_score(mover, color, ply)
        } else {
            -self.negamax(&Arc::new(first_child), depth - 1, Window::new(-beta, -alpha), ply + 1)
        };
        let mut best_move = first_move;
        alpha = alpha.max(best_score);

        if alpha < beta {
            let remaining: Vec<Move> = moves_iter.collect();
            if !remaining.is_empty() {
                if self.should_fork(depth) {
                    let results = parallel::search_siblings(self, pos, &remaining, depth, ply, beta, best_score);
                    for (mv, score) in results {
                        if score > best_score {
                            best_score = score;
                            best_move = mv;
                        }
                    }
                    alpha = alpha.max(best_score);
                } else {
                    for (idx, mv) in remaining.into_iter().enumerate() {
                        if self.should_stop() || alpha >= beta {
                            break;
                        }
                        let legal_index = idx + 1;
                        if let Some(se) = static_eval {
                            let margin = FUTILITY_MARGIN[(depth.max(0) as usize).min(FUTILITY_MARGIN.len() - 1)];
                            if legal_index > 1 && se + margin <= orig_alpha {
                                continue;
                            }
                        }

                        let (child, outcome) = pos.make_move(mv, self.params.use_ko);
                        if outcome.is_ko() {
                            continue;
                        }
                        let child = Arc::new(child);

                        let score = if let Some(color) = outcome.king_was_zapped() {
                            self.terminal_score(mover, color, ply)
                        } else {
                            let reduction = self.lmr_reduction(depth, legal_index);
                            let mut s = -self.negamax(&child, depth - 1 - reduction, Window::new(-alpha - 1, -alpha), ply + 1);
                            if s > alpha && (reduction > 0 || s < beta) {
                                s = -self.negamax(&child, depth - 1, Window::new(-beta, -alpha), ply + 1);
                            }
                            s
                        };

                        if score > best_score {
                            best_score = score;
                            best_move = mv;
                        }
                        alpha = alpha.max(best_score);
                    }
                }
            }
        }

        if alpha >= beta {
            self.record_cutoff(ply, best_move, mover, depth);
        }

        if self.params.enable_tables {
            let bound = if best_score <= orig_alpha {
                Bound::Upper
            } else if best_score >= beta {
                Bound::Lower
            } else {
                Bound::Exact
            };
            self.tt.store(
                key,
                TtEntry {
                    depth: depth.clamp(0, i32::from(u8::MAX)) as u8,
                    score: best_score,
                    bound,
                    best_move: Some(best_move),
                    generation: self.generation.load(Ordering::Relaxed),
                },
            );
        }

        best_score
    }

    /// Extends search past the nominal horizon over moves that actually
    /// zapped something, since laser chess has no notion of "quiet" beyond
    /// that — a ply that zaps nothing cannot itself threaten material next
    /// ply any more than the static evaluation already reflects.
    fn quiescence(&self, pos: &Arc<Position>, window: Window, ply: u32) -> i32 {
        self.nodes.fetch_add(1, Ordering::Relaxed);
        if self.should_stop() {
            return 0;
        }
        let mut alpha = window.alpha;
        let beta = window.beta;

        let stand_pat = eval(pos, &self.params) + self.params.hmb;
        if stand_pat >= beta {
            return beta;
        }
        alpha = alpha.max(stand_pat);

        if ply as usize + 1 >= crate::position::MAX_PLY_IN_SEARCH {
            return alpha;
        }

        let mover = pos.to_move();
        for mv in generate_all(pos) {
            if self.should_stop() || alpha >= beta {
                break;
            }
            let (child, outcome) = pos.make_move(mv, self.params.use_ko);
            if outcome.is_ko() {
                continue;
            }
            let is_noisy = outcome.king_was_zapped().is_some() || !outcome.zapped().is_empty();
            if !is_noisy {
                continue;
            }
            let score = if let Some(color) = outcome.king_was_zapped() {
                self.terminal_score(mover, color, ply)
            } else {
                -self.quiescence(&Arc::new(child), Window::new(-beta, -alpha), ply + 1)
            };
            alpha = alpha.max(score);
        }
        alpha
    }
}

const MAX_PLY_IN_SEARCH_I32: i32 = crate::position::MAX_PLY_IN_SEARCH as i32;
