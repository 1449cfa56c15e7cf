//! Per-thread iterative-deepening alpha-beta with PVS and quiescence.
//!
//! Every worker owns its position copy, evaluator, ordering tables and search
//! stack. Only the transposition table, the stop flag and the node counter are
//! shared. Scores are fail-hard: a node returns a value inside `[alpha, beta]`.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info};

use crate::board::bitboard::bit;
use crate::board::movegen::{self, Filter, MoveList};
use crate::board::{Move, MoveFlag, Piece, Position};
use crate::eval::Evaluator;
use super::eval::{is_mate_score, mate_distance, mate_in, mated_in, piece_value, DRAW_SCORE, INFINITY, MATE_BOUND, MAX_PLY};
use super::history::{stat_bonus, ContIndex, Histories};
use super::params::{LmrTable, Tunables};
use super::picker::MovePicker;
use super::see::see_ge;
use super::time::TimeManager;
use super::tt::{Bound, TranspositionTable};

/// Static eval slot value for nodes searched in check.
pub const NO_EVAL: i32 = -32_001;
const POLL_INTERVAL: u64 = 1024;

/// Hard limits shared by all workers of one search.
#[derive(Clone, Copy, Debug)]
pub struct Limits {
    pub depth: i32,
    pub nodes: Option<u64>,
    pub deadline: Option<Instant>,
}

impl Default for Limits {
    fn default() -> Self { Self { depth: MAX_PLY as i32 - 1, nodes: None, deadline: None } }
}

/// Result of the deepest fully searched iteration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Iteration {
    pub depth: i32,
    pub seldepth: usize,
    pub score: i32,
    pub best: Move,
    pub pv: Vec<Move>,
}

#[derive(Clone, Debug)]
pub struct StackEntry {
    pub static_eval: i32,
    pub mv: Move,
    pub cont: Option<ContIndex>,
    pub pv: Vec<Move>,
}

impl Default for StackEntry {
    fn default() -> Self { Self { static_eval: NO_EVAL, mv: Move::NULL, cont: None, pv: Vec::with_capacity(MAX_PLY) } }
}

pub struct Searcher<E: Evaluator> {
    id: usize,
    pos: Position,
    eval: E,
    tt: Arc<TranspositionTable>,
    pub hist: Histories,
    stack: Vec<StackEntry>,
    params: Tunables,
    lmr: LmrTable,
    stop: Arc<AtomicBool>,
    shared_nodes: Arc<AtomicU64>,
    limits: Limits,
    stopped: bool,
    nodes: u64,
    since_poll: u64,
    seldepth: usize,
    root_nodes: Vec<u64>,
    completed: Option<Iteration>,
}

impl<E: Evaluator> Searcher<E> {
    pub fn new(id: usize, eval: E, tt: Arc<TranspositionTable>, params: &Tunables, stop: Arc<AtomicBool>, shared_nodes: Arc<AtomicU64>) -> Self {
        Self {
            id,
            pos: Position::startpos(),
            eval,
            tt,
            hist: Histories::default(),
            stack: vec![StackEntry::default(); MAX_PLY + 4],
            params: params.clone(),
            lmr: LmrTable::new(params),
            stop,
            shared_nodes,
            limits: Limits::default(),
            stopped: false,
            nodes: 0,
            since_poll: 0,
            seldepth: 0,
            root_nodes: vec![0; 64 * 64],
            completed: None,
        }
    }

    pub fn id(&self) -> usize { self.id }

    pub fn nodes(&self) -> u64 { self.nodes }

    pub fn completed(&self) -> Option<&Iteration> { self.completed.as_ref() }

    pub fn set_tt(&mut self, tt: Arc<TranspositionTable>) { self.tt = tt; }

    pub fn set_params(&mut self, params: &Tunables) {
        self.params = params.clone();
        self.lmr = LmrTable::new(params);
    }

    pub fn evaluator_mut(&mut self) -> &mut E { &mut self.eval }

    fn reset(&mut self, root: &Position, limits: &Limits) {
        self.pos = root.clone();
        self.eval.set_position(&self.pos);
        self.limits = *limits;
        self.stopped = false;
        self.nodes = 0;
        self.since_poll = 0;
        self.seldepth = 0;
        self.completed = None;
        for e in &mut self.stack {
            e.static_eval = NO_EVAL;
            e.mv = Move::NULL;
            e.cont = None;
            e.pv.clear();
        }
    }

    /// Iterative deepening from `root`. The main worker passes the time manager and
    /// owns soft-limit decisions; helpers run until the shared stop flag is raised.
    pub fn iterate(&mut self, root: &Position, limits: &Limits, mut time: Option<&mut TimeManager>) -> Option<Iteration> {
        self.reset(root, limits);
        let max_depth = limits.depth.clamp(1, MAX_PLY as i32 - 1);
        // Odd helpers start one ply deeper so the pool does not move in lockstep.
        let start_depth = if self.id % 2 == 1 { 2.min(max_depth) } else { 1 };
        let mut prev_best = Move::NULL;
        let mut stability = 0u32;
        let mut score = 0;

        for depth in start_depth..=max_depth {
            self.poll();
            if self.stopped { break; }
            self.root_nodes.fill(0);
            let nodes_before = self.nodes;

            score = self.aspiration(depth, score);
            if self.stopped { break; }
            let Some(&best) = self.stack[0].pv.first() else { break; };

            self.completed = Some(Iteration {
                depth,
                seldepth: self.seldepth,
                score,
                best,
                pv: self.stack[0].pv.clone(),
            });
            if self.id == 0 { self.report(depth, score, time.as_deref()); }

            if let Some(tm) = time.as_deref_mut() {
                stability = if best == prev_best { stability + 1 } else { 0 };
                let spent = (self.nodes - nodes_before).max(1);
                let share = self.root_nodes[Self::root_index(best)] as f64 / spent as f64;
                tm.update(stability, share);
                if tm.soft_expired() { break; }
            }
            prev_best = best;
        }

        self.flush_nodes();
        self.completed.clone()
    }

    fn report(&self, depth: i32, score: i32, time: Option<&TimeManager>) {
        let total = self.shared_nodes.load(Ordering::Relaxed) + self.since_poll;
        let score_text = match mate_distance(score) {
            Some(m) => format!("mate {m}"),
            None => format!("cp {score}"),
        };
        let pv: Vec<String> = self.stack[0].pv.iter().map(|m| m.to_string()).collect();
        match time {
            Some(tm) => {
                let ms = tm.elapsed().as_millis().max(1) as u64;
                info!(
                    "depth {} seldepth {} score {} nodes {} nps {} hashfull {} time {} pv {}",
                    depth, self.seldepth, score_text, total, total * 1000 / ms, self.tt.hashfull(), ms, pv.join(" ")
                );
            }
            None => info!("depth {} seldepth {} score {} nodes {} pv {}", depth, self.seldepth, score_text, total, pv.join(" ")),
        }
    }

    fn aspiration(&mut self, depth: i32, prev: i32) -> i32 {
        let mut delta = self.params.asp_window;
        let (mut alpha, mut beta) = if depth >= self.params.asp_min_depth && !is_mate_score(prev) {
            ((prev - delta).max(-INFINITY), (prev + delta).min(INFINITY))
        } else {
            (-INFINITY, INFINITY)
        };
        loop {
            let score = self.search(depth, 0, alpha, beta, true);
            if self.stopped { return score; }
            if score <= alpha && alpha > -INFINITY {
                beta = (alpha + beta) / 2;
                alpha = (score - delta).max(-INFINITY);
                debug!("worker {} depth {} fail low, window [{}, {}]", self.id, depth, alpha, beta);
            } else if score >= beta && beta < INFINITY {
                beta = (score + delta).min(INFINITY);
                debug!("worker {} depth {} fail high, window [{}, {}]", self.id, depth, alpha, beta);
            } else {
                return score;
            }
            delta *= 2;
        }
    }

    #[inline]
    fn root_index(mv: Move) -> usize { mv.from() as usize * 64 + mv.to() as usize }

    fn flush_nodes(&mut self) {
        if self.since_poll > 0 {
            self.shared_nodes.fetch_add(self.since_poll, Ordering::Relaxed);
            self.since_poll = 0;
        }
    }

    /// Flush the local node count and check the stop flag, node budget and deadline.
    fn poll(&mut self) {
        let total = self.shared_nodes.fetch_add(self.since_poll, Ordering::Relaxed) + self.since_poll;
        self.since_poll = 0;
        if self.stop.load(Ordering::Relaxed) {
            self.stopped = true;
            return;
        }
        let out_of_nodes = self.limits.nodes.is_some_and(|n| total >= n);
        let out_of_time = self.limits.deadline.is_some_and(|d| Instant::now() >= d);
        if out_of_nodes || out_of_time {
            self.stop.store(true, Ordering::Relaxed);
            self.stopped = true;
        }
    }

    /// Counts a node; true once the search must unwind.
    #[inline]
    fn enter_node(&mut self, ply: usize) -> bool {
        if self.stopped { return true; }
        self.nodes += 1;
        self.since_poll += 1;
        if self.since_poll >= POLL_INTERVAL { self.poll(); }
        self.seldepth = self.seldepth.max(ply);
        self.stopped
    }

    #[inline]
    fn evaluate(&mut self) -> i32 {
        self.eval.evaluate(&self.pos).clamp(-MATE_BOUND + 1, MATE_BOUND - 1)
    }

    fn update_pv(&mut self, ply: usize, mv: Move) {
        let (head, tail) = self.stack.split_at_mut(ply + 1);
        let pv = &mut head[ply].pv;
        pv.clear();
        pv.push(mv);
        pv.extend_from_slice(&tail[0].pv);
    }

    fn make(&mut self, ply: usize, mv: Move) {
        let us = self.pos.side_to_move();
        self.stack[ply].mv = mv;
        self.stack[ply].cont = self.pos.piece_type_on(mv.from()).map(|p| ContIndex::new(us, p, mv.to()));
        self.eval.make_move(&self.pos, mv);
        self.pos.make_move(mv);
    }

    fn unmake(&mut self) {
        self.pos.unmake_move();
        self.eval.unmake_move();
    }

    /// A capture of the last non-pawn piece on the board.
    fn enters_pawn_endgame(&self, mv: Move) -> bool {
        let Some(captured) = self.pos.piece_type_on(mv.to()) else { return false; };
        if captured == Piece::Pawn { return false; }
        let non_pawn = self.pos.pieces(Piece::Knight) | self.pos.pieces(Piece::Bishop) | self.pos.pieces(Piece::Rook) | self.pos.pieces(Piece::Queen);
        non_pawn & !bit(mv.to()) == 0
    }

    fn search(&mut self, mut depth: i32, ply: usize, mut alpha: i32, mut beta: i32, is_pv: bool) -> i32 {
        if depth <= 0 { return self.qsearch(ply, alpha, beta, 0); }
        self.stack[ply].pv.clear();
        if self.enter_node(ply) { return 0; }

        let root = ply == 0;
        let in_check = self.pos.in_check();
        if !root {
            if self.pos.is_draw() { return DRAW_SCORE.clamp(alpha, beta); }
            if ply >= MAX_PLY - 1 { return if in_check { DRAW_SCORE.clamp(alpha, beta) } else { self.evaluate().clamp(alpha, beta) }; }
            // Mate distance pruning.
            alpha = alpha.max(mated_in(ply));
            beta = beta.min(mate_in(ply + 1));
            if alpha >= beta { return alpha; }
        }

        let hash = self.pos.hash();
        let tt = self.tt.probe(hash, ply);
        let tt_move = tt.and_then(|e| e.best);
        if let Some(e) = tt {
            if !is_pv && e.depth >= depth {
                match e.bound {
                    Bound::Exact => return e.score.clamp(alpha, beta),
                    Bound::Lower if e.score >= beta => return beta,
                    Bound::Upper if e.score <= alpha => return alpha,
                    _ => {}
                }
            }
        }

        let static_eval = if in_check {
            NO_EVAL
        } else {
            match tt {
                Some(e) if e.static_eval != NO_EVAL => e.static_eval,
                _ => self.evaluate(),
            }
        };
        self.stack[ply].static_eval = static_eval;
        let improving = !in_check && {
            let earlier = [2usize, 4]
                .into_iter()
                .filter(|&back| ply >= back)
                .map(|back| self.stack[ply - back].static_eval)
                .find(|&e| e != NO_EVAL);
            earlier.map_or(true, |e| static_eval > e)
        };

        let us = self.pos.side_to_move();
        let p = &self.params;
        if !is_pv && !in_check && !root {
            let margin = p.rfp_margin * depth - if improving { p.rfp_improving } else { 0 };
            if depth <= p.rfp_depth && !is_mate_score(beta) && static_eval - margin >= beta {
                return beta;
            }

            if depth >= p.nmp_min_depth
                && static_eval >= beta
                && !self.stack[ply - 1].mv.is_null()
                && self.pos.non_pawn_material(us)
                && !is_mate_score(beta)
            {
                let r = p.nmp_base + depth / p.nmp_divisor + ((static_eval - beta) / p.nmp_eval_divisor).min(3);
                self.stack[ply].mv = Move::NULL;
                self.stack[ply].cont = None;
                self.pos.make_null_move();
                let score = -self.search(depth - r, ply + 1, -beta, -beta + 1, false);
                self.pos.unmake_null_move();
                if self.stopped { return 0; }
                // A mate found only because we passed is not trusted.
                if score >= beta && !is_mate_score(score) { return beta; }
            }
        }

        if tt_move.is_none() && depth >= self.params.iir_depth { depth -= 1; }

        let killers = self.hist.killers.get(ply);
        let conts = [
            if ply >= 1 { self.stack[ply - 1].cont } else { None },
            if ply >= 2 { self.stack[ply - 2].cont } else { None },
        ];
        let mut picker = MovePicker::new(&self.pos, tt_move, killers, conts);
        let original_alpha = alpha;
        let mut best_move = Move::NULL;
        let mut best_score = -INFINITY;
        let mut played = 0usize;
        let mut quiets_tried = MoveList::new();
        let mut captures_tried = MoveList::new();

        while let Some(mv) = picker.next(&self.pos, &self.hist) {
            let is_quiet = !self.pos.is_tactical(mv);
            let gives_check = movegen::gives_check(&self.pos, mv);
            let p = &self.params;

            if !root && best_score > -MATE_BOUND && self.pos.non_pawn_material(us) {
                if is_quiet && !gives_check && !in_check {
                    let lmp_limit = (p.lmp_base + depth * depth) / if improving { 1 } else { 2 };
                    if depth <= p.lmp_depth && played as i32 >= lmp_limit {
                        picker.skip_quiets();
                        continue;
                    }
                    if depth <= p.fut_depth && static_eval + p.fut_base + p.fut_margin * depth <= alpha {
                        picker.skip_quiets();
                        continue;
                    }
                    if depth <= p.see_quiet_depth && !see_ge(&self.pos, mv, -p.see_quiet_margin * depth) {
                        continue;
                    }
                } else if !is_quiet && depth <= p.see_quiet_depth && !see_ge(&self.pos, mv, -p.see_capture_margin * depth) {
                    continue;
                }
            }

            let extension = if ply >= MAX_PLY / 2 {
                0
            } else if mv.promotion() == Some(Piece::Queen)
                || (gives_check && see_ge(&self.pos, mv, 0))
                || self.enters_pawn_endgame(mv)
            {
                1
            } else {
                0
            };
            let new_depth = depth - 1 + extension;

            let quiet_score = if is_quiet { self.hist.quiet.get(us, mv) } else { 0 };
            let nodes_before = self.nodes;
            self.make(ply, mv);
            played += 1;

            let score = if played == 1 {
                -self.search(new_depth, ply + 1, -beta, -alpha, is_pv)
            } else {
                let p = &self.params;
                let mut r = 0;
                if depth >= p.lmr_min_depth && played > p.lmr_min_moves as usize && is_quiet && !in_check {
                    r = self.lmr.get(depth, played);
                    if is_pv { r -= 1; }
                    if !improving { r += 1; }
                    if gives_check { r -= 1; }
                    r -= quiet_score / 8192;
                    r = r.clamp(0, (new_depth - 1).max(0));
                }
                let mut s = -self.search(new_depth - r, ply + 1, -alpha - 1, -alpha, false);
                if s > alpha && r > 0 {
                    s = -self.search(new_depth, ply + 1, -alpha - 1, -alpha, false);
                }
                if s > alpha && s < beta && is_pv {
                    s = -self.search(new_depth, ply + 1, -beta, -alpha, true);
                }
                s
            };
            self.unmake();

            if root { self.root_nodes[Self::root_index(mv)] += self.nodes - nodes_before; }
            if self.stopped { return 0; }

            if score > best_score { best_score = score; }
            if score > alpha {
                best_move = mv;
                alpha = score;
                if is_pv || root { self.update_pv(ply, mv); }
                if score >= beta {
                    self.update_histories(ply, depth, mv, is_quiet, &quiets_tried, &captures_tried);
                    self.tt.store(hash, Bound::Lower, depth, ply, Some(mv), static_eval, beta);
                    return beta;
                }
            }
            if is_quiet { quiets_tried.push(mv); } else { captures_tried.push(mv); }
        }

        if played == 0 {
            return if in_check { mated_in(ply).max(alpha).min(beta) } else { DRAW_SCORE.clamp(alpha, beta) };
        }

        let bound = if alpha > original_alpha { Bound::Exact } else { Bound::Upper };
        let best = if best_move.is_null() { None } else { Some(best_move) };
        self.tt.store(hash, bound, depth, ply, best, static_eval, alpha);
        alpha
    }

    fn update_histories(&mut self, ply: usize, depth: i32, best: Move, best_is_quiet: bool, quiets: &[Move], captures: &[Move]) {
        let p = &self.params;
        let bonus = stat_bonus(depth, p.hist_bonus_mul, p.hist_bonus_offset, p.hist_bonus_max);
        let us = self.pos.side_to_move();
        let conts = [
            if ply >= 1 { self.stack[ply - 1].cont } else { None },
            if ply >= 2 { self.stack[ply - 2].cont } else { None },
        ];

        if best_is_quiet {
            self.hist.killers.push(ply, best);
            for (mv, b) in std::iter::once((best, bonus)).chain(quiets.iter().map(|&q| (q, -bonus))) {
                self.hist.quiet.update(us, mv, b);
                if let Some(piece) = self.pos.piece_type_on(mv.from()) {
                    let cur = ContIndex::new(us, piece, mv.to());
                    for prev in conts.iter().flatten() {
                        self.hist.continuation.update(*prev, cur, b);
                    }
                }
            }
        }

        let captured_on = |pos: &Position, mv: Move| {
            if mv.flag() == MoveFlag::EnPassant { Some(Piece::Pawn) } else { pos.piece_type_on(mv.to()) }
        };
        let best_capture = if best_is_quiet { None } else { Some(best) };
        for (mv, b) in best_capture.into_iter().map(|m| (m, bonus)).chain(captures.iter().map(|&c| (c, -bonus))) {
            if let (Some(attacker), Some(victim)) = (self.pos.piece_type_on(mv.from()), captured_on(&self.pos, mv)) {
                self.hist.capture.update(us, attacker, mv.to(), victim, b);
            }
        }
    }

    fn qsearch(&mut self, ply: usize, mut alpha: i32, beta: i32, qply: i32) -> i32 {
        self.stack[ply].pv.clear();
        if self.enter_node(ply) { return 0; }
        if self.pos.is_draw() { return DRAW_SCORE.clamp(alpha, beta); }

        let in_check = self.pos.in_check();
        if ply >= MAX_PLY - 1 { return if in_check { DRAW_SCORE.clamp(alpha, beta) } else { self.evaluate().clamp(alpha, beta) }; }

        let hash = self.pos.hash();
        let tt = self.tt.probe(hash, ply);
        if let Some(e) = tt {
            match e.bound {
                Bound::Exact => return e.score.clamp(alpha, beta),
                Bound::Lower if e.score >= beta => return beta,
                Bound::Upper if e.score <= alpha => return alpha,
                _ => {}
            }
        }

        let static_eval = if in_check {
            NO_EVAL
        } else {
            let stand_pat = match tt {
                Some(e) if e.static_eval != NO_EVAL => e.static_eval,
                _ => self.evaluate(),
            };
            if stand_pat >= beta { return beta; }
            if stand_pat > alpha { alpha = stand_pat; }
            stand_pat
        };

        let filter = if in_check {
            Filter::All
        } else if qply == 0 && self.params.qs_checks != 0 {
            Filter::Noisy
        } else {
            Filter::Captures
        };
        let mut picker = MovePicker::new_qsearch(&self.pos, tt.and_then(|e| e.best), filter);
        let original_alpha = alpha;
        let mut best_move = Move::NULL;
        let mut searched = 0;

        while let Some(mv) = picker.next(&self.pos, &self.hist) {
            if !in_check {
                let victim = if mv.flag() == MoveFlag::EnPassant { Some(Piece::Pawn) } else { self.pos.piece_type_on(mv.to()) };
                let promo = mv.promotion().map_or(0, |p| piece_value(p) - piece_value(Piece::Pawn));
                if let Some(victim) = victim {
                    if static_eval + piece_value(victim) + promo + self.params.delta_margin <= alpha { continue; }
                }
                if !see_ge(&self.pos, mv, 0) { continue; }
                if qply >= self.params.qs_see_depth && !see_ge(&self.pos, mv, 1) { continue; }
            }

            self.make(ply, mv);
            searched += 1;
            let score = -self.qsearch(ply + 1, -beta, -alpha, qply + 1);
            self.unmake();
            if self.stopped { return 0; }

            if score > alpha {
                best_move = mv;
                alpha = score;
                self.update_pv(ply, mv);
                if score >= beta {
                    self.tt.store(hash, Bound::Lower, 0, ply, Some(mv), static_eval, beta);
                    return beta;
                }
            }
        }

        if in_check && searched == 0 { return mated_in(ply).clamp(alpha, beta); }

        let bound = if alpha > original_alpha { Bound::Exact } else { Bound::Upper };
        let best = if best_move.is_null() { None } else { Some(best_move) };
        self.tt.store(hash, bound, 0, ply, best, static_eval, alpha);
        alpha
    }

    /// Quiescence value of a position with a full window and no limits.
    pub fn qsearch_eval_cp(&mut self, pos: &Position) -> i32 {
        self.reset(pos, &Limits::default());
        let score = self.qsearch(0, -INFINITY, INFINITY, 0);
        self.flush_nodes();
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::PstEval;

    fn searcher() -> Searcher<PstEval> {
        let tt = Arc::new(TranspositionTable::new(1));
        Searcher::new(0, PstEval::new(), tt, &Tunables::default(), Arc::new(AtomicBool::new(false)), Arc::new(AtomicU64::new(0)))
    }

    #[test]
    fn draw_score_is_clamped_into_the_window() {
        // Lone knight: insufficient material at every non-root node.
        let pos = Position::from_fen("4k3/8/8/8/8/8/8/3NK3 w - - 0 1").unwrap();
        let mut s = searcher();
        s.reset(&pos, &Limits::default());
        assert_eq!(s.search(3, 1, 50, 120, false), 50);
        assert_eq!(s.search(3, 1, -120, -50, false), -50);
        assert_eq!(s.qsearch(1, 50, 120, 0), 50);
    }
}
