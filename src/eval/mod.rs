pub mod pst;

pub use pst::PstEval;

use crate::board::{Move, Position};

/// Static scorer driven in lock-step with the position's make/unmake.
///
/// `make_move` receives the position *before* the move is applied, so an
/// implementation can read the moving and captured pieces from it. Null moves are
/// not reported; `evaluate` takes the side to move from the position it is given.
pub trait Evaluator: Send {
    /// Full re-initialisation from a position.
    fn set_position(&mut self, pos: &Position);
    fn make_move(&mut self, pos: &Position, mv: Move);
    fn unmake_move(&mut self);
    /// Centipawns from the side to move's point of view.
    fn evaluate(&mut self, pos: &Position) -> i32;
    /// Drop any state carried between games.
    fn clear_history(&mut self);
}
