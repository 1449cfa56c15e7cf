//! Move-ordering statistics: killers plus quiet, capture and continuation history.
//!
//! Every score is an `i16` kept inside `[-MAX_HISTORY, MAX_HISTORY]` by the gravity
//! update `h += bonus - h * |bonus| / MAX_HISTORY`.

use crate::board::types::colored_index;
use crate::board::{Color, Move, Piece, Square};
use super::eval::MAX_PLY;

pub const MAX_HISTORY: i32 = 16_384;

#[inline]
fn gravity(entry: &mut i16, bonus: i32) {
    let bonus = bonus.clamp(-MAX_HISTORY, MAX_HISTORY);
    let v = *entry as i32;
    *entry = (v + bonus - v * bonus.abs() / MAX_HISTORY) as i16;
}

fn halve(table: &mut [i16]) {
    for v in table.iter_mut() { *v /= 2; }
}

/// Depth-scaled bonus for a cutoff move (its negation is the malus for the rest).
#[inline]
pub fn stat_bonus(depth: i32, mul: i32, offset: i32, max: i32) -> i32 {
    (mul * depth - offset).clamp(0, max)
}

#[derive(Clone)]
pub struct KillerTable {
    slots: Vec<[Move; 2]>,
}

impl KillerTable {
    pub fn new() -> Self { Self { slots: vec![[Move::NULL; 2]; MAX_PLY + 4] } }

    pub fn clear(&mut self) { self.slots.fill([Move::NULL; 2]); }

    #[inline]
    pub fn get(&self, ply: usize) -> [Move; 2] { self.slots.get(ply).copied().unwrap_or([Move::NULL; 2]) }

    /// FIFO insert; a move already in front is left alone.
    pub fn push(&mut self, ply: usize, mv: Move) {
        let Some(slot) = self.slots.get_mut(ply) else { return; };
        if slot[0] != mv {
            slot[1] = slot[0];
            slot[0] = mv;
        }
    }
}

impl Default for KillerTable {
    fn default() -> Self { Self::new() }
}

/// Butterfly history for quiet moves, `[color][from][to]`.
#[derive(Clone)]
pub struct QuietHistory {
    table: Vec<i16>,
}

impl QuietHistory {
    pub fn new() -> Self { Self { table: vec![0; 2 * 64 * 64] } }

    #[inline]
    fn index(color: Color, mv: Move) -> usize { color.index() * 4096 + mv.from() as usize * 64 + mv.to() as usize }

    #[inline]
    pub fn get(&self, color: Color, mv: Move) -> i32 { self.table[Self::index(color, mv)] as i32 }

    pub fn update(&mut self, color: Color, mv: Move, bonus: i32) { gravity(&mut self.table[Self::index(color, mv)], bonus); }

    pub fn age(&mut self) { halve(&mut self.table); }

    pub fn clear(&mut self) { self.table.fill(0); }
}

impl Default for QuietHistory {
    fn default() -> Self { Self::new() }
}

/// `[colored attacker][to][captured type]`.
#[derive(Clone)]
pub struct CaptureHistory {
    table: Vec<i16>,
}

impl CaptureHistory {
    pub fn new() -> Self { Self { table: vec![0; 12 * 64 * 6] } }

    #[inline]
    fn index(color: Color, piece: Piece, to: Square, captured: Piece) -> usize {
        (colored_index(color, piece) * 64 + to as usize) * 6 + captured.index()
    }

    #[inline]
    pub fn get(&self, color: Color, piece: Piece, to: Square, captured: Piece) -> i32 {
        self.table[Self::index(color, piece, to, captured)] as i32
    }

    pub fn update(&mut self, color: Color, piece: Piece, to: Square, captured: Piece, bonus: i32) {
        gravity(&mut self.table[Self::index(color, piece, to, captured)], bonus);
    }

    pub fn age(&mut self) { halve(&mut self.table); }

    pub fn clear(&mut self) { self.table.fill(0); }
}

impl Default for CaptureHistory {
    fn default() -> Self { Self::new() }
}

/// Context for continuation history: which colored piece landed on which square.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ContIndex {
    pub piece: usize,
    pub to: Square,
}

impl ContIndex {
    pub fn new(color: Color, piece: Piece, to: Square) -> Self { Self { piece: colored_index(color, piece), to } }
}

/// `[prev colored piece][prev to][colored piece][to]`.
#[derive(Clone)]
pub struct ContinuationHistory {
    table: Vec<i16>,
}

impl ContinuationHistory {
    const ROW: usize = 12 * 64;

    pub fn new() -> Self { Self { table: vec![0; Self::ROW * Self::ROW] } }

    #[inline]
    fn index(prev: ContIndex, cur: ContIndex) -> usize {
        (prev.piece * 64 + prev.to as usize) * Self::ROW + cur.piece * 64 + cur.to as usize
    }

    #[inline]
    pub fn get(&self, prev: ContIndex, cur: ContIndex) -> i32 { self.table[Self::index(prev, cur)] as i32 }

    pub fn update(&mut self, prev: ContIndex, cur: ContIndex, bonus: i32) {
        gravity(&mut self.table[Self::index(prev, cur)], bonus);
    }

    pub fn age(&mut self) { halve(&mut self.table); }

    pub fn clear(&mut self) { self.table.fill(0); }
}

impl Default for ContinuationHistory {
    fn default() -> Self { Self::new() }
}

/// Per-worker bundle of all ordering tables.
#[derive(Clone, Default)]
pub struct Histories {
    pub killers: KillerTable,
    pub quiet: QuietHistory,
    pub capture: CaptureHistory,
    pub continuation: ContinuationHistory,
}

impl Histories {
    /// Between searches: forget killers, halve everything else.
    pub fn age(&mut self) {
        self.killers.clear();
        self.quiet.age();
        self.capture.age();
        self.continuation.age();
    }

    pub fn clear(&mut self) {
        self.killers.clear();
        self.quiet.clear();
        self.capture.clear();
        self.continuation.clear();
    }
}
