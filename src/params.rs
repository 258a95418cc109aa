//! Tunable search/evaluation knobs.
//!
//! The reference implementation exposes these as free-standing global `int`s
//! set from the command line at startup with no committed defaults; here
//! they're gathered into one `Copy` struct so a [`crate::search::SearchEngine`]
//! can be configured without touching process-wide state. Default values are
//! an Open Question resolution recorded in `DESIGN.md`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineParams {
    /// Half-width of the uniform noise added to the final score, in
    /// `ev_score_t` units. Zero disables randomization.
    pub randomize: i32,
    /// Respect the Ko rule (reject moves that revert a recent position).
    pub use_ko: bool,

    /// Weight of the PCENTRAL (Pawn-near-center) heuristic.
    pub pcentral: i32,
    /// Weight of the PBETWEEN (Pawn inside the King rectangle) heuristic.
    pub pbetween: i32,
    /// Weight of the KFACE (King facing opponent) heuristic.
    pub kface: i32,
    /// Weight of the KAGGRESSIVE (King space advantage) heuristic.
    pub kaggressive: i32,
    /// Weight of the HATTACK (squares the laser threatens) heuristic.
    pub hattack: i32,
    /// Weight of the MOBILITY (King escape squares) heuristic.
    pub mobility: i32,
    /// Weight of the PAWNPIN (unpinned Pawn count) heuristic.
    pub pawnpin: i32,

    /// Detect and score draws by repetition during search.
    pub detect_draws: bool,
    /// Deepest remaining depth at which futility pruning is attempted.
    pub fut_depth: i32,
    /// Legal-move-count threshold at which Late Move Reduction begins.
    pub lmr_r1: i32,
    /// Legal-move-count threshold at which LMR reduces by a second ply.
    pub lmr_r2: i32,
    /// Flat bonus added to the static eval for a leaf node's `search_process_score`
    /// call, biasing the tree toward trusting deeper search over the static eval.
    pub hmb: i32,
    /// Node-count mask controlling how often the search checks the clock.
    pub abort_check_period: u64,
    /// Use the transposition table.
    pub enable_tables: bool,
    /// Remaining depth above which the quiet move band forks in parallel
    /// instead of running serially (Young Brothers Wait threshold).
    pub depth_threshold: i32,
    /// Log every move considered at the root, for debugging search traces.
    pub trace_moves: bool,
}

impl Default for EngineParams {
    fn default() -> Self {
        EngineParams {
            randomize: 0,
            use_ko: true,

            pcentral: 100,
            pbetween: 10,
            kface: 30,
            kaggressive: 15,
            hattack: 150,
            mobility: 30,
            pawnpin: 30,

            detect_draws: true,
            fut_depth: 3,
            lmr_r1: 3,
            lmr_r2: 6,
            hmb: 10,
            abort_check_period: 0xFFF,
            enable_tables: true,
            depth_threshold: 1,
            trace_moves: false,
        }
    }
}

/// Futility-pruning margins indexed by remaining depth, widening as depth
/// grows since a shallow search result is less trustworthy the further it
/// has to carry. Grounded on `fmarg[10]` in
/// `examples/original_source/player/search_common.c`.
pub const FUTILITY_MARGIN: [i32; 10] = {
    use crate::consts::PAWN_VALUE as PV;
    [
        0,
        PV / 2,
        PV,
        (PV * 5) / 2,
        (PV * 9) / 2,
        PV * 7,
        PV * 10,
        PV * 15,
        PV * 20,
        PV * 30,
    ]
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_self_consistent() {
        let params = EngineParams::default();
        assert!(params.lmr_r2 >= params.lmr_r1);
        assert!(params.use_ko);
    }
}
