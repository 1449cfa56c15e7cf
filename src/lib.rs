// Bitboard position, staged move ordering and Lazy SMP alpha-beta search
pub mod board;
pub mod book;
pub mod config;
pub mod error;
pub mod eval;
pub mod perft;
pub mod search;

pub use board::{Move, Position};
pub use config::EngineConfig;
pub use search::{Engine, SearchParams, SearchResult};
