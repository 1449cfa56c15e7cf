//! Staged move supply for the main search and quiescence.
//!
//! Main search: hash move, good captures (winning before even), killers, bad captures, quiets.
//! Each stage scores its moves once and hands them out by partial selection sort, so
//! a cutoff early in the list never pays for sorting the tail.

use crate::board::movegen::{self, Filter, MoveList, MAX_MOVES};
use crate::board::{Move, MoveFlag, Piece, Position};
use super::eval::piece_value;
use super::history::{ContIndex, Histories};
use super::see::see_ge;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    TtMove,
    GenCaptures,
    GoodCaptures,
    Killers,
    BadCaptures,
    GenQuiets,
    Quiets,
    QsTtMove,
    QsGen,
    QsMoves,
    Done,
}

const EVASION_CAPTURE_BONUS: i32 = 1 << 20;
const WINNING_CAPTURE_BONUS: i32 = 1 << 19;

pub struct MovePicker {
    stage: Stage,
    tt_move: Move,
    killers: [Move; 2],
    killer_idx: usize,
    conts: [Option<ContIndex>; 2],
    list: MoveList,
    scores: [i32; MAX_MOVES],
    cur: usize,
    bad: MoveList,
    bad_cur: usize,
    qs_filter: Filter,
    skip_quiets: bool,
}

impl MovePicker {
    /// Main-search picker. `tt_move` and `killers` are re-validated against `pos`.
    pub fn new(pos: &Position, tt_move: Option<Move>, killers: [Move; 2], conts: [Option<ContIndex>; 2]) -> Self {
        let tt_move = tt_move.filter(|&m| movegen::is_legal(pos, m)).unwrap_or(Move::NULL);
        Self {
            stage: Stage::TtMove,
            tt_move,
            killers,
            killer_idx: 0,
            conts,
            list: MoveList::new(),
            scores: [0; MAX_MOVES],
            cur: 0,
            bad: MoveList::new(),
            bad_cur: 0,
            qs_filter: Filter::Captures,
            skip_quiets: false,
        }
    }

    /// Quiescence picker over `filter` (`All` when in check, for evasions).
    pub fn new_qsearch(pos: &Position, tt_move: Option<Move>, filter: Filter) -> Self {
        let tt_move = tt_move
            .filter(|&m| movegen::is_legal(pos, m))
            .filter(|&m| match filter {
                Filter::All => true,
                Filter::Captures => pos.is_tactical(m),
                Filter::Noisy => pos.is_tactical(m) || movegen::gives_check(pos, m),
                Filter::Quiet => !pos.is_tactical(m),
            })
            .unwrap_or(Move::NULL);
        let mut picker = Self::new(pos, None, [Move::NULL; 2], [None; 2]);
        picker.stage = Stage::QsTtMove;
        picker.tt_move = tt_move;
        picker.qs_filter = filter;
        picker
    }

    /// Drop killers and quiets from here on; captures still come through.
    pub fn skip_quiets(&mut self) { self.skip_quiets = true; }

    pub fn stage(&self) -> Stage { self.stage }

    pub fn next(&mut self, pos: &Position, hist: &Histories) -> Option<Move> {
        loop {
            match self.stage {
                Stage::TtMove => {
                    self.stage = Stage::GenCaptures;
                    if !self.tt_move.is_null() { return Some(self.tt_move); }
                }
                Stage::GenCaptures => {
                    movegen::generate_into(pos, Filter::Captures, &mut self.list);
                    self.score_captures(pos, hist, true);
                    self.stage = Stage::GoodCaptures;
                }
                Stage::GoodCaptures => {
                    while let Some(mv) = self.select_best() {
                        if mv == self.tt_move { continue; }
                        if !see_ge(pos, mv, 0) {
                            self.bad.push(mv);
                            continue;
                        }
                        return Some(mv);
                    }
                    self.stage = Stage::Killers;
                }
                Stage::Killers => {
                    while self.killer_idx < 2 && !self.skip_quiets {
                        let k = self.killers[self.killer_idx];
                        self.killer_idx += 1;
                        if !k.is_null() && k != self.tt_move && !pos.is_tactical(k) && movegen::is_legal(pos, k) {
                            return Some(k);
                        }
                    }
                    self.stage = Stage::BadCaptures;
                }
                Stage::BadCaptures => {
                    if self.bad_cur < self.bad.len() {
                        let mv = self.bad[self.bad_cur];
                        self.bad_cur += 1;
                        return Some(mv);
                    }
                    self.stage = Stage::GenQuiets;
                }
                Stage::GenQuiets => {
                    if self.skip_quiets {
                        self.stage = Stage::Done;
                        continue;
                    }
                    movegen::generate_into(pos, Filter::Quiet, &mut self.list);
                    self.score_quiets(pos, hist);
                    self.stage = Stage::Quiets;
                }
                Stage::Quiets => {
                    if !self.skip_quiets {
                        while let Some(mv) = self.select_best() {
                            if mv == self.tt_move || mv == self.killers[0] || mv == self.killers[1] { continue; }
                            return Some(mv);
                        }
                    }
                    self.stage = Stage::Done;
                }
                Stage::QsTtMove => {
                    self.stage = Stage::QsGen;
                    if !self.tt_move.is_null() { return Some(self.tt_move); }
                }
                Stage::QsGen => {
                    movegen::generate_into(pos, self.qs_filter, &mut self.list);
                    if self.qs_filter == Filter::All {
                        self.score_evasions(pos, hist);
                    } else {
                        self.score_captures(pos, hist, false);
                    }
                    self.stage = Stage::QsMoves;
                }
                Stage::QsMoves => {
                    while let Some(mv) = self.select_best() {
                        if mv == self.tt_move { continue; }
                        return Some(mv);
                    }
                    self.stage = Stage::Done;
                }
                Stage::Done => return None,
            }
        }
    }

    /// Swap the best remaining move to the front of the unscanned suffix.
    fn select_best(&mut self) -> Option<Move> {
        if self.cur >= self.list.len() { return None; }
        let mut best = self.cur;
        for i in self.cur + 1..self.list.len() {
            if self.scores[i] > self.scores[best] { best = i; }
        }
        self.list.swap(self.cur, best);
        self.scores.swap(self.cur, best);
        let mv = self.list[self.cur];
        self.cur += 1;
        Some(mv)
    }

    fn capture_score(pos: &Position, hist: &Histories, mv: Move) -> i32 {
        let us = pos.side_to_move();
        let attacker = pos.piece_type_on(mv.from()).unwrap_or(Piece::Pawn);
        let victim = if mv.flag() == MoveFlag::EnPassant { Some(Piece::Pawn) } else { pos.piece_type_on(mv.to()) };
        let mut score = mv.promotion().map_or(0, piece_value);
        if let Some(victim) = victim {
            // MVV first, LVA to break ties, capture history inside a victim tier.
            score += piece_value(victim) * 16 - attacker.index() as i32;
            score += hist.capture.get(us, attacker, mv.to(), victim) / 16;
        }
        score
    }

    /// `tiered` puts captures that win material ahead of even trades.
    fn score_captures(&mut self, pos: &Position, hist: &Histories, tiered: bool) {
        self.cur = 0;
        for i in 0..self.list.len() {
            let mv = self.list[i];
            self.scores[i] = Self::capture_score(pos, hist, mv);
            if tiered && see_ge(pos, mv, 1) { self.scores[i] += WINNING_CAPTURE_BONUS; }
        }
    }

    fn quiet_score(&self, pos: &Position, hist: &Histories, mv: Move) -> i32 {
        let us = pos.side_to_move();
        let mut score = hist.quiet.get(us, mv);
        if let Some(piece) = pos.piece_type_on(mv.from()) {
            let cur = ContIndex::new(us, piece, mv.to());
            for prev in self.conts.iter().flatten() {
                score += hist.continuation.get(*prev, cur);
            }
        }
        score
    }

    fn score_quiets(&mut self, pos: &Position, hist: &Histories) {
        self.cur = 0;
        for i in 0..self.list.len() {
            self.scores[i] = self.quiet_score(pos, hist, self.list[i]);
        }
    }

    fn score_evasions(&mut self, pos: &Position, hist: &Histories) {
        self.cur = 0;
        for i in 0..self.list.len() {
            let mv = self.list[i];
            self.scores[i] = if pos.is_tactical(mv) {
                EVASION_CAPTURE_BONUS + Self::capture_score(pos, hist, mv)
            } else {
                self.quiet_score(pos, hist, mv)
            };
        }
    }
}
