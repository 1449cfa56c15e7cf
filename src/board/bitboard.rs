use std::sync::OnceLock;
use super::types::{Color, Square};

pub type Bitboard = u64;

pub const EMPTY: Bitboard = 0;
pub const FILE_A: Bitboard = 0x0101_0101_0101_0101;
pub const FILE_H: Bitboard = FILE_A << 7;
pub const RANK_1: Bitboard = 0xff;
pub const RANK_2: Bitboard = RANK_1 << 8;
pub const RANK_4: Bitboard = RANK_1 << 24;
pub const RANK_5: Bitboard = RANK_1 << 32;
pub const RANK_7: Bitboard = RANK_1 << 48;
pub const RANK_8: Bitboard = RANK_1 << 56;

#[inline]
pub const fn bit(sq: Square) -> Bitboard { 1u64 << sq }

#[inline]
pub fn lsb(bb: Bitboard) -> Square { bb.trailing_zeros() as Square }

#[inline]
pub fn msb(bb: Bitboard) -> Square { (63 - bb.leading_zeros()) as Square }

#[inline]
pub fn pop_lsb(bb: &mut Bitboard) -> Square {
    let sq = lsb(*bb);
    *bb &= *bb - 1;
    sq
}

#[inline]
pub fn more_than_one(bb: Bitboard) -> bool { bb & bb.wrapping_sub(1) != 0 }

/// Iterate the set squares of a bitboard, least significant first.
#[inline]
pub fn squares(bb: Bitboard) -> impl Iterator<Item = Square> {
    let mut rest = bb;
    std::iter::from_fn(move || if rest == 0 { None } else { Some(pop_lsb(&mut rest)) })
}

// Ray directions as (file delta, rank delta); the first four are orthogonal.
const DIRS: [(i8, i8); 8] = [(0, 1), (1, 0), (0, -1), (-1, 0), (1, 1), (1, -1), (-1, -1), (-1, 1)];
// Directions whose ray squares increase in index: north, east, north-east, north-west.
const POSITIVE: [bool; 8] = [true, true, false, false, true, false, false, true];

struct Tables {
    knight: [Bitboard; 64],
    king: [Bitboard; 64],
    pawn: [[Bitboard; 64]; 2],
    rays: [[Bitboard; 64]; 8],
    between: Vec<Bitboard>,
    line: Vec<Bitboard>,
}

static TABLES: OnceLock<Tables> = OnceLock::new();

fn offset(sq: Square, df: i8, dr: i8) -> Option<Square> {
    let f = (sq & 7) as i8 + df;
    let r = (sq >> 3) as i8 + dr;
    if (0..8).contains(&f) && (0..8).contains(&r) { Some((r * 8 + f) as Square) } else { None }
}

fn leaper(sq: Square, deltas: &[(i8, i8)]) -> Bitboard {
    deltas.iter().filter_map(|&(df, dr)| offset(sq, df, dr)).fold(0, |acc, s| acc | bit(s))
}

fn build_tables() -> Tables {
    let mut t = Tables {
        knight: [0; 64],
        king: [0; 64],
        pawn: [[0; 64]; 2],
        rays: [[0; 64]; 8],
        between: vec![0; 64 * 64],
        line: vec![0; 64 * 64],
    };
    let knight_deltas = [(1, 2), (2, 1), (2, -1), (1, -2), (-1, -2), (-2, -1), (-2, 1), (-1, 2)];
    for sq in 0..64u8 {
        t.knight[sq as usize] = leaper(sq, &knight_deltas);
        t.king[sq as usize] = leaper(sq, &DIRS);
        t.pawn[Color::White.index()][sq as usize] = leaper(sq, &[(-1, 1), (1, 1)]);
        t.pawn[Color::Black.index()][sq as usize] = leaper(sq, &[(-1, -1), (1, -1)]);
        for (d, &(df, dr)) in DIRS.iter().enumerate() {
            let mut ray = 0;
            let mut cur = sq;
            while let Some(next) = offset(cur, df, dr) {
                ray |= bit(next);
                cur = next;
            }
            t.rays[d][sq as usize] = ray;
        }
    }
    for a in 0..64u8 {
        for (d, &(df, dr)) in DIRS.iter().enumerate() {
            let mut cur = a;
            let mut path = 0;
            while let Some(next) = offset(cur, df, dr) {
                let idx = a as usize * 64 + next as usize;
                t.between[idx] = path;
                // Full line through both squares, including the squares themselves.
                let opposite = (d + 2) % 4 + if d >= 4 { 4 } else { 0 };
                t.line[idx] = t.rays[d][a as usize] | t.rays[opposite][a as usize] | bit(a);
                path |= bit(next);
                cur = next;
            }
        }
    }
    t
}

#[inline]
fn tables() -> &'static Tables { TABLES.get_or_init(build_tables) }

/// Force initialisation of the attack tables (otherwise done lazily on first use).
pub fn init() { let _ = tables(); }

#[inline]
pub fn knight_attacks(sq: Square) -> Bitboard { tables().knight[sq as usize] }
#[inline]
pub fn king_attacks(sq: Square) -> Bitboard { tables().king[sq as usize] }
#[inline]
pub fn pawn_attacks(color: Color, sq: Square) -> Bitboard { tables().pawn[color.index()][sq as usize] }

#[inline]
fn ray_attacks(t: &Tables, dir: usize, sq: Square, occ: Bitboard) -> Bitboard {
    let ray = t.rays[dir][sq as usize];
    let blockers = ray & occ;
    if blockers == 0 { return ray; }
    let first = if POSITIVE[dir] { lsb(blockers) } else { msb(blockers) };
    ray ^ t.rays[dir][first as usize]
}

#[inline]
pub fn rook_attacks(sq: Square, occ: Bitboard) -> Bitboard {
    let t = tables();
    ray_attacks(t, 0, sq, occ) | ray_attacks(t, 1, sq, occ) | ray_attacks(t, 2, sq, occ) | ray_attacks(t, 3, sq, occ)
}

#[inline]
pub fn bishop_attacks(sq: Square, occ: Bitboard) -> Bitboard {
    let t = tables();
    ray_attacks(t, 4, sq, occ) | ray_attacks(t, 5, sq, occ) | ray_attacks(t, 6, sq, occ) | ray_attacks(t, 7, sq, occ)
}

#[inline]
pub fn queen_attacks(sq: Square, occ: Bitboard) -> Bitboard { rook_attacks(sq, occ) | bishop_attacks(sq, occ) }

/// Squares strictly between two aligned squares; empty when not aligned.
#[inline]
pub fn between(a: Square, b: Square) -> Bitboard { tables().between[a as usize * 64 + b as usize] }

/// The full board line through two aligned squares; empty when not aligned.
#[inline]
pub fn line(a: Square, b: Square) -> Bitboard { tables().line[a as usize * 64 + b as usize] }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaper_counts_from_corner_and_center() {
        assert_eq!(knight_attacks(0).count_ones(), 2);
        assert_eq!(knight_attacks(27).count_ones(), 8);
        assert_eq!(king_attacks(0).count_ones(), 3);
        assert_eq!(pawn_attacks(Color::White, 8), bit(17));
        assert_eq!(pawn_attacks(Color::Black, 55), bit(46));
    }

    #[test]
    fn sliders_stop_at_first_blocker() {
        // Rook on a1, blocker on a4: a2, a3, a4 plus the first rank.
        let att = rook_attacks(0, bit(24));
        assert_eq!(att, bit(8) | bit(16) | bit(24) | (RANK_1 & !bit(0)));
        assert_eq!(bishop_attacks(0, 0).count_ones(), 7);
    }

    #[test]
    fn between_and_line_are_symmetric() {
        assert_eq!(between(0, 63).count_ones(), 6);
        assert_eq!(between(0, 63), between(63, 0));
        assert_eq!(between(0, 10), 0);
        assert_eq!(line(0, 9), line(63, 54));
        assert_eq!(line(0, 10), 0);
        assert_eq!(line(4, 7) & RANK_1, RANK_1);
    }
}
