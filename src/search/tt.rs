//! Shared transposition table.
//!
//! Each slot is two `AtomicU64` words: `key ^ data` and `data`. A reader accepts a
//! slot only when both words xor back to its key, so a write torn by another thread
//! reads as a miss instead of a wrong hit. No locks are taken.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

use log::debug;

use crate::board::Move;
use super::eval::MATE_BOUND;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bound {
    Exact,
    Lower,
    Upper,
}

impl Bound {
    const fn bits(self) -> u64 {
        match self { Bound::Exact => 1, Bound::Lower => 2, Bound::Upper => 3 }
    }

    const fn from_bits(bits: u64) -> Option<Bound> {
        match bits { 1 => Some(Bound::Exact), 2 => Some(Bound::Lower), 3 => Some(Bound::Upper), _ => None }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TtEntry {
    pub best: Option<Move>,
    pub score: i32,
    pub static_eval: i32,
    pub depth: i32,
    pub bound: Bound,
    pub generation: u8,
}

pub const WAYS: usize = 4;
const GENERATION_MASK: u8 = 0x3f;
const SLOT_BYTES: usize = 16;

// data layout: move 0-15, score 16-31, static eval 32-47, depth 48-55, bound 56-57, generation 58-63
fn pack(best: Move, score: i32, static_eval: i32, depth: i32, bound: Bound, generation: u8) -> u64 {
    (best.raw() as u64)
        | ((score as i16 as u16 as u64) << 16)
        | ((static_eval as i16 as u16 as u64) << 32)
        | ((depth.clamp(0, 255) as u64) << 48)
        | (bound.bits() << 56)
        | (((generation & GENERATION_MASK) as u64) << 58)
}

fn unpack(data: u64) -> Option<TtEntry> {
    let bound = Bound::from_bits((data >> 56) & 3)?;
    let mv = Move::from_raw(data as u16);
    Some(TtEntry {
        best: if mv.is_null() { None } else { Some(mv) },
        score: (data >> 16) as u16 as i16 as i32,
        static_eval: (data >> 32) as u16 as i16 as i32,
        depth: ((data >> 48) & 0xff) as i32,
        bound,
        generation: ((data >> 58) as u8) & GENERATION_MASK,
    })
}

/// Node-relative mate scores are stored relative to the storing node.
#[inline]
fn score_to_tt(score: i32, ply: usize) -> i32 {
    if score >= MATE_BOUND { score + ply as i32 } else if score <= -MATE_BOUND { score - ply as i32 } else { score }
}

#[inline]
fn score_from_tt(score: i32, ply: usize) -> i32 {
    if score >= MATE_BOUND { score - ply as i32 } else if score <= -MATE_BOUND { score + ply as i32 } else { score }
}

#[derive(Default)]
struct Slot {
    key: AtomicU64,
    data: AtomicU64,
}

impl Slot {
    #[inline]
    fn read(&self) -> (u64, u64) {
        let data = self.data.load(Ordering::Relaxed);
        let key = self.key.load(Ordering::Relaxed) ^ data;
        (key, data)
    }

    #[inline]
    fn write(&self, key: u64, data: u64) {
        self.key.store(key ^ data, Ordering::Relaxed);
        self.data.store(data, Ordering::Relaxed);
    }
}

pub struct TranspositionTable {
    slots: Vec<Slot>,
    buckets: usize,
    generation: AtomicU8,
}

impl TranspositionTable {
    pub fn new(mb: usize) -> Self {
        let buckets = Self::buckets_for(mb);
        let mut slots = Vec::with_capacity(buckets * WAYS);
        slots.resize_with(buckets * WAYS, Slot::default);
        Self { slots, buckets, generation: AtomicU8::new(0) }
    }

    fn buckets_for(mb: usize) -> usize {
        ((mb.max(1) * 1024 * 1024) / (SLOT_BYTES * WAYS)).max(1)
    }

    /// Reallocates for a new memory budget. All entries are lost.
    pub fn resize(&mut self, mb: usize) {
        *self = Self::new(mb);
        debug!("tt resized to {} MB ({} entries)", mb, self.capacity());
    }

    pub fn clear(&self) {
        for slot in &self.slots { slot.write(0, 0); }
        self.generation.store(0, Ordering::Relaxed);
    }

    /// Ages every existing entry by one generation.
    pub fn new_search(&self) {
        let g = self.generation.load(Ordering::Relaxed);
        self.generation.store(g.wrapping_add(1) & GENERATION_MASK, Ordering::Relaxed);
    }

    #[inline]
    pub fn generation(&self) -> u8 { self.generation.load(Ordering::Relaxed) }

    pub fn capacity(&self) -> usize { self.slots.len() }

    #[inline]
    fn bucket(&self, hash: u64) -> &[Slot] {
        let idx = ((hash as u128 * self.buckets as u128) >> 64) as usize;
        &self.slots[idx * WAYS..idx * WAYS + WAYS]
    }

    pub fn probe(&self, hash: u64, ply: usize) -> Option<TtEntry> {
        for slot in self.bucket(hash) {
            let (key, data) = slot.read();
            if key != hash { continue; }
            if let Some(mut e) = unpack(data) {
                e.score = score_from_tt(e.score, ply);
                return Some(e);
            }
        }
        None
    }

    /// Best move stored for a position, if any.
    pub fn best_move(&self, hash: u64) -> Option<Move> { self.probe(hash, 0).and_then(|e| e.best) }

    #[allow(clippy::too_many_arguments)]
    pub fn store(&self, hash: u64, bound: Bound, depth: i32, ply: usize, best: Option<Move>, static_eval: i32, score: i32) {
        let generation = self.generation();
        let bucket = self.bucket(hash);

        let mut same = None;
        let mut empty = None;
        for (i, slot) in bucket.iter().enumerate() {
            let (key, data) = slot.read();
            match unpack(data) {
                Some(e) if key == hash => { same = Some((i, e)); break; }
                None if empty.is_none() => empty = Some(i),
                _ => {}
            }
        }

        let mut best = best;
        let target = if let Some((i, old)) = same {
            // A shallower result never replaces a deeper one for the same position.
            if depth < old.depth { return; }
            if best.is_none() { best = old.best; }
            i
        } else if let Some(i) = empty {
            i
        } else {
            // Stale generations go first, then the shallowest entry.
            let mut victim = 0;
            let mut victim_rank = (true, i32::MAX);
            for (i, slot) in bucket.iter().enumerate() {
                let Some(e) = unpack(slot.read().1) else { continue; };
                let rank = (e.generation == generation, e.depth);
                if rank < victim_rank { victim_rank = rank; victim = i; }
            }
            victim
        };

        let data = pack(best.unwrap_or(Move::NULL), score_to_tt(score, ply), static_eval, depth, bound, generation);
        bucket[target].write(hash, data);
    }

    /// Per-mille share of sampled slots written in the current generation.
    pub fn hashfull(&self) -> usize {
        let sample = self.slots.len().min(1000);
        if sample == 0 { return 0; }
        let generation = self.generation();
        let used = self.slots[..sample]
            .iter()
            .filter_map(|s| unpack(s.read().1))
            .filter(|e| e.generation == generation)
            .count();
        used * 1000 / sample
    }
}

impl Default for TranspositionTable {
    fn default() -> Self { Self::new(16) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::MoveFlag;

    #[test]
    fn packed_fields_survive_negative_values() {
        let mv = Move::new(12, 28, MoveFlag::DoublePush);
        let e = unpack(pack(mv, -1234, -77, 9, Bound::Upper, 5)).unwrap();
        assert_eq!(e.best, Some(mv));
        assert_eq!(e.score, -1234);
        assert_eq!(e.static_eval, -77);
        assert_eq!(e.depth, 9);
        assert_eq!(e.bound, Bound::Upper);
        assert_eq!(e.generation, 5);
    }

    #[test]
    fn torn_slot_reads_as_miss() {
        let tt = TranspositionTable::new(1);
        let key = 0xdead_beef_u64;
        tt.store(key, Bound::Exact, 4, 0, None, 0, 10);
        let slot = tt.bucket(key).iter().find(|s| s.read().0 == key).unwrap();
        slot.data.store(slot.data.load(Ordering::Relaxed) ^ 1 << 20, Ordering::Relaxed);
        assert!(tt.probe(key, 0).is_none());
    }
}
