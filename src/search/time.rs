use std::time::{Duration, Instant};

use super::params::Tunables;

/// What the caller knows about the clock for this move.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TimeControl {
    pub movetime: Option<Duration>,
    /// Time left on our clock.
    pub remaining: Option<Duration>,
    pub increment: Duration,
    pub moves_to_go: Option<u32>,
    pub overhead: Duration,
}

impl TimeControl {
    pub fn movetime(d: Duration) -> Self { Self { movetime: Some(d), ..Self::default() } }

    pub fn clock(remaining: Duration, increment: Duration) -> Self {
        Self { remaining: Some(remaining), increment, ..Self::default() }
    }

    pub fn is_limited(&self) -> bool { self.movetime.is_some() || self.remaining.is_some() }
}

const DEFAULT_MOVES_TO_GO: u32 = 30;
const MIN_BUDGET: Duration = Duration::from_millis(1);
const MIN_SOFT: Duration = Duration::from_micros(100);
// Soft-limit multipliers by number of iterations the best move has stayed the same.
const STABILITY_SCALE: [f64; 5] = [2.2, 1.3, 1.0, 0.85, 0.75];

#[derive(Clone, Debug)]
pub struct TimeManager {
    start: Instant,
    base_soft: Option<Duration>,
    soft: Option<Duration>,
    hard: Option<Duration>,
}

impl TimeManager {
    pub fn new(tc: &TimeControl, params: &Tunables) -> Self {
        let start = Instant::now();
        if let Some(mt) = tc.movetime {
            let budget = mt.saturating_sub(tc.overhead).max(MIN_BUDGET);
            return Self { start, base_soft: Some(budget), soft: Some(budget), hard: Some(budget) };
        }
        let Some(remaining) = tc.remaining else { return Self::infinite(); };

        let avail = remaining.saturating_sub(tc.overhead).max(MIN_BUDGET);
        let mtg = tc.moves_to_go.unwrap_or(DEFAULT_MOVES_TO_GO).clamp(1, 60);
        let base = avail / mtg + tc.increment * 3 / 4;
        let hard = (base * params.tm_hard_pct as u32 / 100).min(avail * 75 / 100).max(MIN_BUDGET);
        // Soft stays strictly below hard even when the clock is nearly empty.
        let soft = (base * params.tm_soft_pct as u32 / 100).min(avail * 40 / 100).max(MIN_SOFT).min(hard * 3 / 4);
        Self { start, base_soft: Some(soft), soft: Some(soft), hard: Some(hard) }
    }

    /// No deadline at all: depth, node or explicit stop ends the search.
    pub fn infinite() -> Self { Self { start: Instant::now(), base_soft: None, soft: None, hard: None } }

    #[inline]
    pub fn elapsed(&self) -> Duration { self.start.elapsed() }

    pub fn soft_limit(&self) -> Option<Duration> { self.soft }

    pub fn hard_limit(&self) -> Option<Duration> { self.hard }

    pub fn hard_deadline(&self) -> Option<Instant> { self.hard.map(|h| self.start + h) }

    /// True once a new iteration is unlikely to finish in the remaining soft budget.
    pub fn soft_expired(&self) -> bool { self.soft.is_some_and(|s| self.elapsed() >= s) }

    /// Rescales the soft limit after an iteration. `stability` counts iterations the
    /// best move has not changed; `best_move_nodes` is the share of root nodes spent
    /// below it.
    pub fn update(&mut self, stability: u32, best_move_nodes: f64) {
        let (Some(base), Some(hard)) = (self.base_soft, self.hard) else { return; };
        if base == hard { return; } // fixed movetime
        let stab = STABILITY_SCALE[(stability as usize).min(STABILITY_SCALE.len() - 1)];
        let nodes = 1.5 - best_move_nodes.clamp(0.0, 1.0);
        self.soft = Some(base.mul_f64(stab * nodes).min(hard));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movetime_is_fixed_and_ignores_updates() {
        let tc = TimeControl { overhead: Duration::from_millis(10), ..TimeControl::movetime(Duration::from_millis(500)) };
        let mut tm = TimeManager::new(&tc, &Tunables::default());
        tm.update(4, 0.9);
        assert_eq!(tm.soft_limit(), Some(Duration::from_millis(490)));
        assert_eq!(tm.hard_limit(), Some(Duration::from_millis(490)));
    }

    #[test]
    fn unstable_root_gets_more_time() {
        let tc = TimeControl::clock(Duration::from_secs(60), Duration::ZERO);
        let mut tm = TimeManager::new(&tc, &Tunables::default());
        tm.update(0, 0.2);
        let unstable = tm.soft_limit().unwrap();
        tm.update(4, 0.9);
        let stable = tm.soft_limit().unwrap();
        assert!(stable < unstable);
        assert!(unstable <= tm.hard_limit().unwrap());
    }
}
