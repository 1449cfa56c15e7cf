// Move-count oracle using make/unmake (no cloning below the root)
use rayon::prelude::*;

use crate::board::movegen::{self, Filter};
use crate::board::{Move, Position};

pub fn perft(pos: &mut Position, depth: u32) -> u64 {
    if depth == 0 { return 1; }
    let moves = movegen::generate(pos, Filter::All);
    // Bulk count at the frontier: the list is already legal.
    if depth == 1 { return moves.len() as u64; }
    let mut nodes = 0u64;
    for &mv in moves.iter() {
        pos.make_move(mv);
        nodes += perft(pos, depth - 1);
        pos.unmake_move();
    }
    nodes
}

/// Per-root-move counts, in generation order.
pub fn perft_divide(pos: &mut Position, depth: u32) -> Vec<(Move, u64)> {
    if depth == 0 { return Vec::new(); }
    let moves = movegen::generate(pos, Filter::All);
    moves
        .iter()
        .map(|&mv| {
            pos.make_move(mv);
            let n = perft(pos, depth - 1);
            pos.unmake_move();
            (mv, n)
        })
        .collect()
}

/// Same count as `perft`, with root moves split across the current rayon pool.
pub fn perft_parallel(pos: &Position, depth: u32) -> u64 {
    if depth <= 1 { return perft(&mut pos.clone(), depth); }
    let moves: Vec<Move> = movegen::generate(pos, Filter::All).to_vec();
    moves
        .par_iter()
        .map(|&mv| {
            let mut child = pos.clone();
            child.make_move(mv);
            perft(&mut child, depth - 1)
        })
        .sum()
}
