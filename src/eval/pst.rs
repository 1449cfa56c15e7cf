use crate::board::bitboard::squares;
use crate::board::position::castle_rook_squares;
use crate::board::{Color, Move, MoveFlag, Piece, Position, Square};
use crate::search::eval::piece_value;
use super::Evaluator;

// Tables are laid out rank 8 first, from white's point of view.
#[rustfmt::skip]
const PAWN: [i32; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
    50, 50, 50, 50, 50, 50, 50, 50,
    10, 10, 20, 30, 30, 20, 10, 10,
     5,  5, 10, 25, 25, 10,  5,  5,
     0,  0,  0, 20, 20,  0,  0,  0,
     5, -5,-10,  0,  0,-10, -5,  5,
     5, 10, 10,-20,-20, 10, 10,  5,
     0,  0,  0,  0,  0,  0,  0,  0,
];

#[rustfmt::skip]
const KNIGHT: [i32; 64] = [
    -50,-40,-30,-30,-30,-30,-40,-50,
    -40,-20,  0,  0,  0,  0,-20,-40,
    -30,  0, 10, 15, 15, 10,  0,-30,
    -30,  5, 15, 20, 20, 15,  5,-30,
    -30,  0, 15, 20, 20, 15,  0,-30,
    -30,  5, 10, 15, 15, 10,  5,-30,
    -40,-20,  0,  5,  5,  0,-20,-40,
    -50,-40,-30,-30,-30,-30,-40,-50,
];

#[rustfmt::skip]
const BISHOP: [i32; 64] = [
    -20,-10,-10,-10,-10,-10,-10,-20,
    -10,  0,  0,  0,  0,  0,  0,-10,
    -10,  0,  5, 10, 10,  5,  0,-10,
    -10,  5,  5, 10, 10,  5,  5,-10,
    -10,  0, 10, 10, 10, 10,  0,-10,
    -10, 10, 10, 10, 10, 10, 10,-10,
    -10,  5,  0,  0,  0,  0,  5,-10,
    -20,-10,-10,-10,-10,-10,-10,-20,
];

#[rustfmt::skip]
const ROOK: [i32; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
     5, 10, 10, 10, 10, 10, 10,  5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
     0,  0,  0,  5,  5,  0,  0,  0,
];

#[rustfmt::skip]
const QUEEN: [i32; 64] = [
    -20,-10,-10, -5, -5,-10,-10,-20,
    -10,  0,  0,  0,  0,  0,  0,-10,
    -10,  0,  5,  5,  5,  5,  0,-10,
     -5,  0,  5,  5,  5,  5,  0, -5,
      0,  0,  5,  5,  5,  5,  0, -5,
    -10,  5,  5,  5,  5,  5,  0,-10,
    -10,  0,  5,  0,  0,  0,  0,-10,
    -20,-10,-10, -5, -5,-10,-10,-20,
];

#[rustfmt::skip]
const KING_MG: [i32; 64] = [
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -20,-30,-30,-40,-40,-30,-30,-20,
    -10,-20,-20,-20,-20,-20,-20,-10,
     20, 20,  0,  0,  0,  0, 20, 20,
     20, 30, 10,  0,  0, 10, 30, 20,
];

#[rustfmt::skip]
const KING_EG: [i32; 64] = [
    -50,-40,-30,-20,-20,-30,-40,-50,
    -30,-20,-10,  0,  0,-10,-20,-30,
    -30,-10, 20, 30, 30, 20,-10,-30,
    -30,-10, 30, 40, 40, 30,-10,-30,
    -30,-10, 30, 40, 40, 30,-10,-30,
    -30,-10, 20, 30, 30, 20,-10,-30,
    -30,-30,  0,  0,  0,  0,-30,-30,
    -50,-30,-30,-30,-30,-30,-30,-50,
];

const PHASE: [i32; 6] = [0, 1, 1, 2, 4, 0];
const MAX_PHASE: i32 = 24;

/// White-relative tapered material + placement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Score {
    mg: i32,
    eg: i32,
    phase: i32,
}

impl Score {
    fn toggle(&mut self, color: Color, piece: Piece, sq: Square, sign: i32) {
        let idx = match color { Color::White => (sq ^ 56) as usize, Color::Black => sq as usize };
        let (mg, eg) = match piece {
            Piece::Pawn => (PAWN[idx], PAWN[idx]),
            Piece::Knight => (KNIGHT[idx], KNIGHT[idx]),
            Piece::Bishop => (BISHOP[idx], BISHOP[idx]),
            Piece::Rook => (ROOK[idx], ROOK[idx]),
            Piece::Queen => (QUEEN[idx], QUEEN[idx]),
            Piece::King => (KING_MG[idx], KING_EG[idx]),
        };
        let material = if piece == Piece::King { 0 } else { piece_value(piece) };
        let side = if color == Color::White { sign } else { -sign };
        self.mg += side * (material + mg);
        self.eg += side * (material + eg);
        self.phase += sign * PHASE[piece.index()];
    }

    #[inline]
    fn add(&mut self, color: Color, piece: Piece, sq: Square) { self.toggle(color, piece, sq, 1); }

    #[inline]
    fn sub(&mut self, color: Color, piece: Piece, sq: Square) { self.toggle(color, piece, sq, -1); }

    fn compute(pos: &Position) -> Self {
        let mut s = Score::default();
        for color in Color::BOTH {
            for piece in Piece::ALL {
                for sq in squares(pos.pieces_of(color, piece)) { s.add(color, piece, sq); }
            }
        }
        s
    }

    fn tapered(&self) -> i32 {
        let phase = self.phase.clamp(0, MAX_PHASE);
        (self.mg * phase + self.eg * (MAX_PHASE - phase)) / MAX_PHASE
    }
}

/// Incremental piece-square evaluator: one accumulator per ply, popped on unmake.
#[derive(Clone, Debug, Default)]
pub struct PstEval {
    stack: Vec<Score>,
}

impl PstEval {
    pub fn new() -> Self { Self { stack: Vec::with_capacity(256) } }

    /// From-scratch score of a position, side to move's point of view.
    pub fn evaluate_full(pos: &Position) -> i32 {
        let white = Score::compute(pos).tapered();
        if pos.side_to_move() == Color::White { white } else { -white }
    }
}

impl Evaluator for PstEval {
    fn set_position(&mut self, pos: &Position) {
        self.stack.clear();
        self.stack.push(Score::compute(pos));
    }

    fn make_move(&mut self, pos: &Position, mv: Move) {
        let mut s = self.stack.last().copied().unwrap_or_else(|| Score::compute(pos));
        let us = pos.side_to_move();
        let them = us.flip();
        let (from, to) = (mv.from(), mv.to());
        if let Some(piece) = pos.piece_type_on(from) {
            s.sub(us, piece, from);
            match mv.flag() {
                MoveFlag::Castle => {
                    let (rook_from, rook_to) = castle_rook_squares(to);
                    s.add(us, Piece::King, to);
                    s.sub(us, Piece::Rook, rook_from);
                    s.add(us, Piece::Rook, rook_to);
                }
                MoveFlag::EnPassant => {
                    let cap_sq = if us == Color::White { to - 8 } else { to + 8 };
                    s.sub(them, Piece::Pawn, cap_sq);
                    s.add(us, Piece::Pawn, to);
                }
                _ => {
                    if let Some(captured) = pos.piece_type_on(to) { s.sub(them, captured, to); }
                    s.add(us, mv.promotion().unwrap_or(piece), to);
                }
            }
        }
        self.stack.push(s);
    }

    fn unmake_move(&mut self) {
        if self.stack.len() > 1 { self.stack.pop(); }
    }

    fn evaluate(&mut self, pos: &Position) -> i32 {
        let white = match self.stack.last() {
            Some(s) => s.tapered(),
            None => Score::compute(pos).tapered(),
        };
        if pos.side_to_move() == Color::White { white } else { -white }
    }

    fn clear_history(&mut self) { self.stack.clear(); }
}
