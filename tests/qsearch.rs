use std::sync::atomic::{AtomicBool, AtomicU64};
use std::sync::Arc;

use piecore::board::Position;
use piecore::eval::PstEval;
use piecore::search::alphabeta::Searcher;
use piecore::search::eval::{mated_in, MATE_BOUND};
use piecore::search::{TranspositionTable, Tunables};

fn searcher() -> Searcher<PstEval> {
    Searcher::new(
        0,
        PstEval::new(),
        Arc::new(TranspositionTable::new(4)),
        &Tunables::default(),
        Arc::new(AtomicBool::new(false)),
        Arc::new(AtomicU64::new(0)),
    )
}

#[test]
fn quiet_position_equals_static_eval() {
    let pos = Position::startpos();
    assert_eq!(searcher().qsearch_eval_cp(&pos), PstEval::evaluate_full(&pos));
}

#[test]
fn hanging_queen_is_counted_as_captured() {
    let pos = Position::from_fen("k7/8/8/8/8/8/3qQ3/7K w - - 0 1").unwrap();
    let stand_pat = PstEval::evaluate_full(&pos);
    let q = searcher().qsearch_eval_cp(&pos);
    assert!(q > stand_pat + 700, "qsearch {q} vs stand pat {stand_pat}");
}

#[test]
fn bad_capture_is_not_forced() {
    // Qxe5 loses the queen to dxe5 and no check is available; standing pat is better.
    let pos = Position::from_fen("7k/6pp/3p4/4p3/8/8/4Q3/4K3 w - - 0 1").unwrap();
    let stand_pat = PstEval::evaluate_full(&pos);
    assert_eq!(searcher().qsearch_eval_cp(&pos), stand_pat);
}

#[test]
fn checkmated_in_quiescence_is_a_mate_score() {
    let pos = Position::from_fen("R5k1/5ppp/8/8/8/8/8/6K1 b - - 0 1").unwrap();
    assert_eq!(searcher().qsearch_eval_cp(&pos), mated_in(0));
}

#[test]
fn evasions_are_searched_when_in_check() {
    // In check but with an escape: no mate score.
    let pos = Position::from_fen("k7/8/8/8/8/8/8/R3K3 b - - 0 1").unwrap();
    let v = searcher().qsearch_eval_cp(&pos);
    assert!(v.abs() < MATE_BOUND, "{v}");
}
