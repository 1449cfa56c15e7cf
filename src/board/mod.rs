pub mod bitboard;
pub mod movegen;
pub mod position;
pub mod types;
pub mod zobrist;

pub use bitboard::Bitboard;
pub use movegen::{Filter, MoveList};
pub use position::{Position, StateInfo};
pub use types::{Color, Move, MoveFlag, Piece, Square};
