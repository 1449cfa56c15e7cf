use std::sync::OnceLock;
use super::types::{Color, Piece, Square};

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

pub struct Keys {
    pieces: [[[u64; 64]; 6]; 2],
    castling: [u64; 16],
    ep_file: [u64; 8],
    side: u64,
}

static KEYS: OnceLock<Keys> = OnceLock::new();

fn init_keys() -> Keys {
    let mut seed = 0xF00D_F00D_DEAD_BEEF;
    let mut next = || { seed = splitmix64(seed); seed };
    let mut k = Keys { pieces: [[[0; 64]; 6]; 2], castling: [0; 16], ep_file: [0; 8], side: 0 };
    for color in &mut k.pieces {
        for piece in color.iter_mut() {
            for v in piece.iter_mut() { *v = next(); }
        }
    }
    // Castling keys are XOR-composed from the four single-right keys so that
    // toggling one right is the same as switching between the two masks.
    let rights: [u64; 4] = [next(), next(), next(), next()];
    for (mask, v) in k.castling.iter_mut().enumerate() {
        *v = (0..4).filter(|b| mask & (1 << b) != 0).fold(0, |acc, b| acc ^ rights[b]);
    }
    for v in &mut k.ep_file { *v = next(); }
    k.side = splitmix64(0xABCDEF1234567890);
    k
}

#[inline]
fn keys() -> &'static Keys { KEYS.get_or_init(init_keys) }

#[inline]
pub fn piece(color: Color, piece: Piece, sq: Square) -> u64 { keys().pieces[color.index()][piece.index()][sq as usize] }

#[inline]
pub fn castling(mask: u8) -> u64 { keys().castling[(mask & 15) as usize] }

#[inline]
pub fn ep_file(file: u8) -> u64 { keys().ep_file[file as usize] }

#[inline]
pub fn side() -> u64 { keys().side }
