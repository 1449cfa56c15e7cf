use piecore::board::Position;
use piecore::eval::{Evaluator, PstEval};

#[test]
fn startpos_is_balanced() {
    let pos = Position::startpos();
    assert_eq!(PstEval::evaluate_full(&pos), 0);
    let mut e = PstEval::new();
    e.set_position(&pos);
    assert_eq!(e.evaluate(&pos), 0);
}

#[test]
fn score_is_from_side_to_move() {
    let white = Position::from_fen("4k3/8/8/8/8/8/8/Q3K3 w - - 0 1").unwrap();
    let black = Position::from_fen("4k3/8/8/8/8/8/8/Q3K3 b - - 0 1").unwrap();
    assert!(PstEval::evaluate_full(&white) > 800);
    assert_eq!(PstEval::evaluate_full(&black), -PstEval::evaluate_full(&white));
}

#[test]
fn mirrored_position_scores_the_same() {
    let a = Position::from_fen("r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3").unwrap();
    let b = Position::from_fen("rnbqkb1r/pppp1ppp/5n2/4p3/4P3/2N5/PPPP1PPP/R1BQKBNR b KQkq - 2 3").unwrap();
    assert_eq!(PstEval::evaluate_full(&a), PstEval::evaluate_full(&b));
}

#[test]
fn incremental_tracks_a_game() {
    let mut pos = Position::startpos();
    let mut e = PstEval::new();
    e.set_position(&pos);
    let line = ["e2e4", "d7d5", "e4d5", "d8d5", "b1c3", "d5a5", "g1f3", "g8f6", "f1c4", "c8g4", "e1g1"];
    for text in line {
        let mv = pos.parse_move(text).unwrap();
        e.make_move(&pos, mv);
        pos.make_move(mv);
        assert_eq!(e.evaluate(&pos), PstEval::evaluate_full(&pos), "after {text}");
    }
    for _ in line {
        pos.unmake_move();
        e.unmake_move();
        assert_eq!(e.evaluate(&pos), PstEval::evaluate_full(&pos));
    }
}
