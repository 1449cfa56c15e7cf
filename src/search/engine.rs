//! Lazy SMP coordinator: one shared table, N independent workers.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::board::movegen::{self, Filter};
use crate::board::{Move, Position};
use crate::book::OpeningBook;
use crate::config::EngineConfig;
use crate::error::ConfigError;
use crate::eval::Evaluator;
use super::alphabeta::{Iteration, Limits, Searcher};
use super::eval::{DRAW_SCORE, MATE_SCORE, MAX_PLY};
use super::params::Tunables;
use super::time::{TimeControl, TimeManager};
use super::tt::TranspositionTable;

#[derive(Clone, Copy, Debug, Default)]
pub struct SearchParams {
    /// Maximum iteration depth; 0 means no depth limit.
    pub depth: u32,
    pub max_nodes: Option<u64>,
    pub time: TimeControl,
    pub use_book: bool,
}

impl SearchParams {
    pub fn depth(depth: u32) -> Self { Self { depth, ..Self::default() } }

    pub fn movetime(d: Duration) -> Self { Self { time: TimeControl::movetime(d), ..Self::default() } }
}

#[derive(Clone, Debug, Default)]
pub struct SearchResult {
    pub bestmove: Option<Move>,
    pub score_cp: i32,
    pub nodes: u64,
    pub depth: i32,
    pub seldepth: usize,
    pub pv: Vec<Move>,
    pub elapsed: Duration,
    pub from_book: bool,
}

/// Raises the stop flag of a running search from another thread.
#[derive(Clone)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) { self.0.store(true, Ordering::Relaxed); }
}

pub struct Engine<E: Evaluator + Clone> {
    config: EngineConfig,
    tt: Arc<TranspositionTable>,
    pool: ThreadPool,
    workers: Vec<Searcher<E>>,
    stop: Arc<AtomicBool>,
    nodes: Arc<AtomicU64>,
    book: Option<Box<dyn OpeningBook>>,
    prototype: E,
}

fn build_pool(threads: usize) -> Result<ThreadPool, ConfigError> {
    Ok(ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("search-{i}"))
        .build()?)
}

impl<E: Evaluator + Clone> Engine<E> {
    pub fn new(eval: E, config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let tt = Arc::new(TranspositionTable::new(config.hash_mb));
        let stop = Arc::new(AtomicBool::new(false));
        let nodes = Arc::new(AtomicU64::new(0));
        let pool = build_pool(config.threads)?;
        let mut engine = Self { config, tt, pool, workers: Vec::new(), stop, nodes, book: None, prototype: eval };
        engine.spawn_workers();
        Ok(engine)
    }

    fn spawn_workers(&mut self) {
        self.workers = (0..self.config.threads)
            .map(|id| {
                Searcher::new(id, self.prototype.clone(), self.tt.clone(), &self.config.tunables, self.stop.clone(), self.nodes.clone())
            })
            .collect();
    }

    pub fn config(&self) -> &EngineConfig { &self.config }

    pub fn tunables(&self) -> &Tunables { &self.config.tunables }

    pub fn threads(&self) -> usize { self.workers.len() }

    pub fn tt(&self) -> &TranspositionTable { &self.tt }

    pub fn stop_handle(&self) -> StopHandle { StopHandle(self.stop.clone()) }

    /// Forget everything learned from previous games.
    pub fn new_game(&mut self) {
        self.tt.clear();
        for w in &mut self.workers {
            w.hist.clear();
            w.evaluator_mut().clear_history();
        }
    }

    /// Reallocates the table; all cached entries are lost.
    pub fn set_hash_mb(&mut self, mb: usize) -> Result<(), ConfigError> {
        if mb == 0 { return Err(ConfigError::NotPositive("hash_mb")); }
        self.config.hash_mb = mb;
        self.tt = Arc::new(TranspositionTable::new(mb));
        debug!("tt resized to {} MB ({} entries)", mb, self.tt.capacity());
        for w in &mut self.workers { w.set_tt(self.tt.clone()); }
        Ok(())
    }

    pub fn set_threads(&mut self, threads: usize) -> Result<(), ConfigError> {
        if threads == 0 { return Err(ConfigError::NotPositive("threads")); }
        self.pool = build_pool(threads)?;
        self.config.threads = threads;
        self.spawn_workers();
        Ok(())
    }

    /// Sets a tunable by name, range-checked.
    pub fn set_option(&mut self, name: &str, value: i32) -> Result<(), ConfigError> {
        self.config.tunables.set(name, value)?;
        for w in &mut self.workers { w.set_params(&self.config.tunables); }
        Ok(())
    }

    pub fn set_book(&mut self, book: Option<Box<dyn OpeningBook>>) { self.book = book; }

    fn book_move(&self, pos: &Position) -> Option<Move> {
        if pos.game_ply() >= self.config.book_max_ply { return None; }
        let book = self.book.as_ref()?;
        if !book.has_move(pos.hash()) { return None; }
        let mv = book.get_move(pos.hash())?;
        movegen::generate_from(pos, mv.from()).iter().copied().find(|&m| m == mv)
    }

    pub fn search(&mut self, pos: &Position, params: SearchParams) -> SearchResult {
        let start = Instant::now();

        if params.use_book {
            if let Some(mv) = self.book_move(pos) {
                debug!("book move {mv} at ply {}", pos.game_ply());
                return SearchResult { bestmove: Some(mv), pv: vec![mv], elapsed: start.elapsed(), from_book: true, ..SearchResult::default() };
            }
        }

        let legal = movegen::generate(pos, Filter::All);
        let Some(&first_legal) = legal.first() else {
            let score_cp = if pos.in_check() { -MATE_SCORE } else { DRAW_SCORE };
            return SearchResult { bestmove: None, score_cp, elapsed: start.elapsed(), ..SearchResult::default() };
        };

        self.tt.new_search();
        for w in &mut self.workers { w.hist.age(); }
        self.stop.store(false, Ordering::Relaxed);
        self.nodes.store(0, Ordering::Relaxed);

        let mut tc = params.time;
        tc.overhead = tc.overhead.max(self.config.move_overhead());
        let mut time = if tc.is_limited() { TimeManager::new(&tc, &self.config.tunables) } else { TimeManager::infinite() };
        let limits = Limits {
            depth: if params.depth == 0 { MAX_PLY as i32 - 1 } else { params.depth.min(MAX_PLY as u32 - 1) as i32 },
            nodes: params.max_nodes,
            deadline: time.hard_deadline(),
        };

        let stop = &self.stop;
        let (main, helpers) = self.workers.split_at_mut(1);
        self.pool.scope(|s| {
            for helper in helpers.iter_mut() {
                s.spawn(move |_| {
                    helper.iterate(pos, &limits, None);
                });
            }
            main[0].iterate(pos, &limits, Some(&mut time));
            stop.store(true, Ordering::Relaxed);
        });

        // Deepest completed iteration wins; the main worker wins ties.
        let mut best: Option<&Iteration> = None;
        for w in &self.workers {
            if let Some(it) = w.completed() {
                if best.map_or(true, |b| it.depth > b.depth) { best = Some(it); }
            }
        }

        let nodes = self.nodes.load(Ordering::Relaxed);
        let elapsed = start.elapsed();
        let result = match best {
            Some(it) => SearchResult {
                bestmove: Some(it.best),
                score_cp: it.score,
                nodes,
                depth: it.depth,
                seldepth: it.seldepth,
                pv: it.pv.clone(),
                elapsed,
                from_book: false,
            },
            None => {
                warn!("no search iteration completed; playing first legal move {first_legal}");
                SearchResult { bestmove: Some(first_legal), pv: vec![first_legal], nodes, elapsed, ..SearchResult::default() }
            }
        };
        info!(
            "bestmove {} depth {} score {} nodes {} time {}ms",
            result.bestmove.map_or_else(|| "0000".to_string(), |m| m.to_string()),
            result.depth,
            result.score_cp,
            result.nodes,
            elapsed.as_millis()
        );
        result
    }
}
