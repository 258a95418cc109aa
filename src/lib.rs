//! Laser-chess core: board representation, move generation, evaluation,
//! and search.

pub mod consts;
pub mod eval;
pub mod fen;
pub mod movegen;
pub mod params;
pub mod perft;
pub mod piece;
pub mod position;
pub mod search;
pub mod square;
pub mod tables;
pub mod tt;
pub mod zobrist;
