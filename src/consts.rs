//! Fixed score-scale constants shared by the evaluator and search.
//!
//! These are not tunable knobs (see [`crate::params::EngineParams`] for
//! those) — they define the scale of `score_t` itself, matching
//! `examples/original_source/player/search.h` / `eval.h`.

/// "Infinite" score used to seed alpha/beta before any real score is known.
pub const INF: i32 = 32_700;

/// Score magnitude of a won position; mate scores are `WIN` adjusted by ply
/// to prefer faster mates.
pub const WIN: i32 = 32_000;

/// Material value of a single Pawn, in `score_t` units.
pub const PAWN_VALUE: i32 = 100;

/// Scale factor between the evaluator's higher-resolution internal units
/// and the `score_t` scale search operates on.
pub const EV_SCORE_RATIO: i32 = 100;

/// Material value of a single Pawn, in the evaluator's higher-resolution
/// units (`PAWN_VALUE * EV_SCORE_RATIO`).
pub const PAWN_EV_VALUE: i32 = PAWN_VALUE * EV_SCORE_RATIO;

/// Score reported for a detected draw by repetition, before the ply-parity
/// sign flip. The reference implementation leaves this as an external
/// constant with no value in the kept source; zero is the conventional
/// choice for a drawn position.
pub const DRAW: i32 = 0;
