use std::thread;
use std::time::{Duration, Instant};

use piecore::board::movegen::{self, Filter};
use piecore::board::Position;
use piecore::config::EngineConfig;
use piecore::eval::PstEval;
use piecore::search::eval::{DRAW_SCORE, MATE_SCORE};
use piecore::search::{Engine, SearchParams};

fn engine() -> Engine<PstEval> { Engine::new(PstEval::new(), EngineConfig::default()).unwrap() }

fn engine_with_threads(threads: usize) -> Engine<PstEval> {
    Engine::new(PstEval::new(), EngineConfig { threads, ..EngineConfig::default() }).unwrap()
}

#[test]
fn search_returns_legal_move_startpos() {
    let pos = Position::startpos();
    let res = engine().search(&pos, SearchParams::depth(1));
    let best = res.bestmove.expect("no move found at depth 1");
    assert!(movegen::generate(&pos, Filter::All).contains(&best));
    assert_eq!(res.depth, 1);
    assert_eq!(res.pv.first(), Some(&best));
}

#[test]
fn search_prefers_winning_queen_capture() {
    let pos = Position::from_fen("k7/8/8/8/8/8/3qQ3/7K w - - 0 1").unwrap();
    let res = engine().search(&pos, SearchParams::depth(3));
    assert_eq!(res.bestmove.map(|m| m.to_string()), Some("e2d2".to_string()));
    assert!(res.score_cp > 500, "{}", res.score_cp);
}

#[test]
fn finds_back_rank_mate_in_one() {
    let pos = Position::from_fen("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1").unwrap();
    let res = engine().search(&pos, SearchParams::depth(4));
    assert_eq!(res.bestmove.map(|m| m.to_string()), Some("a1a8".to_string()));
    assert_eq!(res.score_cp, MATE_SCORE - 1);
}

#[test]
fn finds_rook_ladder_mate_in_two() {
    let pos = Position::from_fen("7k/8/8/8/8/8/R7/1R4K1 w - - 0 1").unwrap();
    let res = engine().search(&pos, SearchParams::depth(6));
    assert_eq!(res.score_cp, MATE_SCORE - 3);
    assert_eq!(res.pv.len(), 3, "pv {:?}", res.pv);
}

#[test]
fn checkmated_root_has_no_move() {
    let pos = Position::from_fen("R5k1/5ppp/8/8/8/8/8/6K1 b - - 0 1").unwrap();
    let res = engine().search(&pos, SearchParams::depth(3));
    assert_eq!(res.bestmove, None);
    assert_eq!(res.score_cp, -MATE_SCORE);
}

#[test]
fn stalemated_root_has_no_move_and_draw_score() {
    let pos = Position::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
    let res = engine().search(&pos, SearchParams::depth(3));
    assert_eq!(res.bestmove, None);
    assert_eq!(res.score_cp, DRAW_SCORE);
}

#[test]
fn avoids_stalemating_when_winning() {
    // Qf7 would stalemate; anything sensible keeps the win.
    let pos = Position::from_fen("7k/8/6K1/8/8/8/8/5Q2 w - - 0 1").unwrap();
    let res = engine().search(&pos, SearchParams::depth(5));
    assert_ne!(res.bestmove.map(|m| m.to_string()), Some("f1f7".to_string()));
    assert!(res.score_cp > 500);
}

#[test]
fn node_limit_is_respected() {
    let pos = Position::startpos();
    let params = SearchParams { max_nodes: Some(5_000), ..SearchParams::default() };
    let res = engine().search(&pos, params);
    assert!(res.bestmove.is_some());
    assert!(res.nodes <= 5_000 + 1_100, "searched {} nodes", res.nodes);
}

#[test]
fn exhausted_budget_before_first_iteration_plays_first_legal_move() {
    let pos = Position::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1").unwrap();
    let params = SearchParams { max_nodes: Some(0), ..SearchParams::depth(6) };
    let res = engine().search(&pos, params);
    let legal = movegen::generate(&pos, Filter::All);
    assert_eq!(res.bestmove, legal.first().copied());
    assert_eq!(res.depth, 0);
    assert_eq!(res.pv, vec![legal[0]]);
}

#[test]
fn movetime_returns_quickly_with_move() {
    let pos = Position::startpos();
    let t0 = Instant::now();
    let res = engine().search(&pos, SearchParams::movetime(Duration::from_millis(50)));
    let elapsed = t0.elapsed();
    assert!(res.bestmove.is_some(), "no bestmove under movetime");
    assert!(elapsed < Duration::from_millis(500), "search exceeded time: {elapsed:?}");
}

#[test]
fn stop_handle_ends_an_unbounded_search() {
    let pos = Position::startpos();
    let mut e = engine();
    let stop = e.stop_handle();
    let stopper = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        stop.stop();
    });
    let res = e.search(&pos, SearchParams::default());
    stopper.join().unwrap();
    assert!(res.bestmove.is_some());
    assert!(res.depth >= 1);
}

#[test]
fn multi_threaded_search_returns_legal_move() {
    let pos = Position::from_fen("r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 2 3").unwrap();
    let mut e = engine_with_threads(4);
    assert_eq!(e.threads(), 4);
    let res = e.search(&pos, SearchParams::depth(6));
    let best = res.bestmove.unwrap();
    assert!(movegen::generate(&pos, Filter::All).contains(&best));
    assert!(res.depth >= 6);
}

#[test]
fn threads_agree_on_forced_mate() {
    let pos = Position::from_fen("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1").unwrap();
    let res = engine_with_threads(3).search(&pos, SearchParams::depth(4));
    assert_eq!(res.score_cp, MATE_SCORE - 1);
}

#[test]
fn warm_table_reduces_work() {
    let pos = Position::from_fen("r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 2 3").unwrap();
    let mut e = engine();
    let cold = e.search(&pos, SearchParams::depth(5));
    let warm = e.search(&pos, SearchParams::depth(5));
    assert!(warm.nodes < cold.nodes, "warm {} vs cold {}", warm.nodes, cold.nodes);
    e.new_game();
    assert!(e.tt().probe(pos.hash(), 0).is_none());
}

#[test]
fn null_move_never_tried_in_check() {
    // Black in check from rook on a1; the search must still find a legal evasion.
    let pos = Position::from_fen("k7/8/8/8/8/8/8/R3K3 b - - 0 1").unwrap();
    let res = engine().search(&pos, SearchParams::depth(5));
    let best = res.bestmove.unwrap();
    assert!(movegen::generate(&pos, Filter::All).contains(&best));
    assert_eq!(best.from(), pos.king_square(piecore::board::Color::Black));
}

#[test]
fn resizing_and_rethreading_keep_searching() {
    let pos = Position::startpos();
    let mut e = engine();
    e.set_hash_mb(4).unwrap();
    e.set_threads(2).unwrap();
    assert!(e.set_threads(0).is_err());
    assert!(e.set_hash_mb(0).is_err());
    assert_eq!(e.config().hash_mb, 4);
    let res = e.search(&pos, SearchParams::depth(3));
    assert!(res.bestmove.is_some());
}

#[test]
fn set_option_rejects_unknown_and_out_of_range() {
    let mut e = engine();
    e.set_option("lmr_base", 100).unwrap();
    assert_eq!(e.tunables().lmr_base, 100);
    assert!(e.set_option("no_such_knob", 1).is_err());
    assert!(e.set_option("rfp_depth", 1000).is_err());
    let res = e.search(&Position::startpos(), SearchParams::depth(3));
    assert!(res.bestmove.is_some());
}
