use piecore::board::{Move, MoveFlag};
use piecore::search::eval::{mate_in, MATE_SCORE};
use piecore::search::tt::{Bound, TranspositionTable, WAYS};

// Small keys all land in bucket 0.
fn table() -> TranspositionTable { TranspositionTable::new(1) }

fn mv(from: u8, to: u8) -> Move { Move::new(from, to, MoveFlag::Normal) }

#[test]
fn same_key_keeps_the_deeper_result() {
    let tt = table();
    tt.store(7, Bound::Exact, 12, 0, Some(mv(12, 28)), 5, 40);
    tt.store(7, Bound::Lower, 11, 0, Some(mv(6, 21)), 5, 90);
    let e = tt.probe(7, 0).expect("hit");
    assert_eq!(e.depth, 12);
    assert_eq!(e.score, 40);
    assert_eq!(e.bound, Bound::Exact);

    tt.store(7, Bound::Upper, 13, 0, Some(mv(6, 21)), 5, -15);
    let e = tt.probe(7, 0).expect("hit");
    assert_eq!(e.depth, 13);
    assert_eq!(e.score, -15);
    assert_eq!(e.best, Some(mv(6, 21)));
}

#[test]
fn store_without_move_keeps_previous_move() {
    let tt = table();
    tt.store(9, Bound::Lower, 4, 0, Some(mv(1, 18)), 0, 30);
    tt.store(9, Bound::Upper, 6, 0, None, 0, 10);
    let e = tt.probe(9, 0).expect("hit");
    assert_eq!(e.depth, 6);
    assert_eq!(e.best, Some(mv(1, 18)));
    assert_eq!(tt.best_move(9), Some(mv(1, 18)));
}

#[test]
fn mate_scores_are_relative_to_the_probing_ply() {
    let tt = table();
    // Found at ply 5: mate delivered 2 plies below the stored node.
    tt.store(3, Bound::Exact, 8, 5, None, 0, mate_in(7));
    assert_eq!(tt.probe(3, 5).unwrap().score, MATE_SCORE - 7);
    assert_eq!(tt.probe(3, 1).unwrap().score, MATE_SCORE - 3);
    tt.store(4, Bound::Exact, 8, 5, None, 0, -mate_in(7));
    assert_eq!(tt.probe(4, 2).unwrap().score, -(MATE_SCORE - 4));
    // Ordinary scores are untouched.
    tt.store(5, Bound::Exact, 8, 5, None, 0, 123);
    assert_eq!(tt.probe(5, 0).unwrap().score, 123);
}

#[test]
fn full_bucket_evicts_stale_before_current() {
    let tt = table();
    tt.store(1, Bound::Exact, 10, 0, None, 0, 0);
    tt.store(2, Bound::Exact, 10, 0, None, 0, 0);
    tt.new_search();
    tt.store(3, Bound::Exact, 1, 0, None, 0, 0);
    tt.store(4, Bound::Exact, 1, 0, None, 0, 0);
    tt.store(99, Bound::Exact, 1, 0, None, 0, 0);
    assert!(tt.probe(1, 0).is_none(), "deep stale entry should be the victim");
    for key in [2, 3, 4, 99] { assert!(tt.probe(key, 0).is_some(), "key {key} missing"); }
}

#[test]
fn full_bucket_evicts_shallowest_within_generation() {
    let tt = table();
    for (key, depth) in [(1, 8), (2, 3), (3, 6), (4, 7)] {
        tt.store(key, Bound::Lower, depth, 0, None, 0, 0);
    }
    tt.store(100, Bound::Lower, 2, 0, None, 0, 0);
    assert!(tt.probe(2, 0).is_none());
    assert!(tt.probe(100, 0).is_some());
}

#[test]
fn clear_and_resize_drop_all_entries() {
    let mut tt = table();
    tt.store(11, Bound::Exact, 3, 0, None, 0, 0);
    tt.clear();
    assert!(tt.probe(11, 0).is_none());
    tt.store(11, Bound::Exact, 3, 0, None, 0, 0);
    let before = tt.capacity();
    tt.resize(2);
    assert_eq!(tt.capacity(), before * 2);
    assert_eq!(tt.capacity() % WAYS, 0);
    assert!(tt.probe(11, 0).is_none());
}

#[test]
fn hashfull_counts_current_generation_only() {
    let tt = table();
    assert_eq!(tt.hashfull(), 0);
    // Spread keys evenly over the bucket range.
    let step = u64::MAX / 4096;
    for i in 0..4096u64 { tt.store(i * step + 1, Bound::Exact, 1, 0, None, 0, 0); }
    assert!(tt.hashfull() > 0);
    tt.new_search();
    assert_eq!(tt.hashfull(), 0);
}

#[test]
fn generation_wraps_in_six_bits() {
    let tt = table();
    for _ in 0..64 { tt.new_search(); }
    assert_eq!(tt.generation(), 0);
}
