use std::time::{Duration, Instant};

use piecore::search::{TimeControl, TimeManager, Tunables};

#[test]
fn clock_soft_below_hard_below_remaining() {
    let tc = TimeControl::clock(Duration::from_secs(60), Duration::from_secs(1));
    let tm = TimeManager::new(&tc, &Tunables::default());
    let soft = tm.soft_limit().unwrap();
    let hard = tm.hard_limit().unwrap();
    assert!(soft < hard, "{soft:?} vs {hard:?}");
    assert!(hard < Duration::from_secs(60));

    for (ms, overhead) in [(2u64, 0u64), (5, 0), (10, 0), (12, 0), (2, 10), (12, 10), (40, 10)] {
        let tc = TimeControl { overhead: Duration::from_millis(overhead), ..TimeControl::clock(Duration::from_millis(ms), Duration::ZERO) };
        let tm = TimeManager::new(&tc, &Tunables::default());
        let (soft, hard) = (tm.soft_limit().unwrap(), tm.hard_limit().unwrap());
        assert!(soft > Duration::ZERO);
        assert!(soft < hard, "{ms}ms left, {overhead}ms overhead: {soft:?} vs {hard:?}");
        assert!(hard <= Duration::from_millis(ms));
    }
}

#[test]
fn more_time_left_means_more_time_spent() {
    let p = Tunables::default();
    let mut last = (Duration::ZERO, Duration::ZERO);
    for secs in [1u64, 5, 30, 120, 600] {
        let tm = TimeManager::new(&TimeControl::clock(Duration::from_secs(secs), Duration::ZERO), &p);
        let cur = (tm.soft_limit().unwrap(), tm.hard_limit().unwrap());
        assert!(cur.0 >= last.0 && cur.1 >= last.1, "not monotone at {secs}s");
        last = cur;
    }
}

#[test]
fn moves_to_go_shrinks_the_budget() {
    let p = Tunables::default();
    let few = TimeControl { moves_to_go: Some(2), ..TimeControl::clock(Duration::from_secs(10), Duration::ZERO) };
    let many = TimeControl { moves_to_go: Some(40), ..TimeControl::clock(Duration::from_secs(10), Duration::ZERO) };
    assert!(TimeManager::new(&few, &p).soft_limit() > TimeManager::new(&many, &p).soft_limit());
}

#[test]
fn tiny_clock_still_gets_a_budget() {
    let tc = TimeControl { overhead: Duration::from_millis(50), ..TimeControl::clock(Duration::from_millis(20), Duration::ZERO) };
    let tm = TimeManager::new(&tc, &Tunables::default());
    assert!(tm.soft_limit().unwrap() > Duration::ZERO);
}

#[test]
fn stable_best_move_shortens_soft_limit_never_past_hard() {
    let tc = TimeControl::clock(Duration::from_secs(60), Duration::ZERO);
    let mut tm = TimeManager::new(&tc, &Tunables::default());
    let base = tm.soft_limit().unwrap();
    tm.update(10, 1.0);
    assert!(tm.soft_limit().unwrap() < base);
    tm.update(0, 0.0);
    assert!(tm.soft_limit().unwrap() > base);
    assert!(tm.soft_limit().unwrap() <= tm.hard_limit().unwrap());
}

#[test]
fn infinite_has_no_deadline() {
    let tm = TimeManager::infinite();
    assert_eq!(tm.hard_deadline(), None);
    assert!(!tm.soft_expired());
    assert!(!TimeControl::default().is_limited());
}

#[test]
fn deadline_is_start_plus_hard_limit() {
    let before = Instant::now();
    let tm = TimeManager::new(&TimeControl::movetime(Duration::from_millis(200)), &Tunables::default());
    let deadline = tm.hard_deadline().unwrap();
    assert!(deadline >= before + Duration::from_millis(200));
    assert!(deadline <= Instant::now() + Duration::from_millis(200));
}
