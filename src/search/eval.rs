use crate::board::Piece;

const PAWN: i32 = 100;
const KNIGHT: i32 = 320;
const BISHOP: i32 = 330;
const ROOK: i32 = 500;
const QUEEN: i32 = 900;
const KING: i32 = 20_000;

/// Exchange values used by SEE, delta pruning and MVV/LVA ordering.
#[inline]
pub const fn piece_value(piece: Piece) -> i32 {
    match piece {
        Piece::Pawn => PAWN,
        Piece::Knight => KNIGHT,
        Piece::Bishop => BISHOP,
        Piece::Rook => ROOK,
        Piece::Queen => QUEEN,
        Piece::King => KING,
    }
}

pub const MAX_PLY: usize = 128;

// Mate scoring helpers
pub const MATE_SCORE: i32 = 30_000;
pub const DRAW_SCORE: i32 = 0;
pub const INFINITY: i32 = 32_000;
/// Scores at or beyond this magnitude encode a forced mate.
pub const MATE_BOUND: i32 = MATE_SCORE - MAX_PLY as i32;

#[inline]
pub const fn mated_in(ply: usize) -> i32 { -MATE_SCORE + ply as i32 }

#[inline]
pub const fn mate_in(ply: usize) -> i32 { MATE_SCORE - ply as i32 }

#[inline]
pub const fn is_mate_score(score: i32) -> bool { score.abs() >= MATE_BOUND }

/// Mate distance in moves, signed from the side to move (UCI "mate N").
pub fn mate_distance(score: i32) -> Option<i32> {
    if !is_mate_score(score) { return None; }
    let plies = MATE_SCORE - score.abs();
    let moves = (plies + 1) / 2;
    Some(if score > 0 { moves } else { -moves })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mate_helpers_agree() {
        assert_eq!(mate_in(1), MATE_SCORE - 1);
        assert!(is_mate_score(mated_in(40)));
        assert!(!is_mate_score(900));
        assert_eq!(mate_distance(mate_in(3)), Some(2));
        assert_eq!(mate_distance(mated_in(2)), Some(-1));
        assert_eq!(mate_distance(25), None);
    }
}
