use std::collections::HashSet;

use piecore::board::movegen::{self, Filter};
use piecore::board::{Move, Position};
use piecore::search::history::Histories;
use piecore::search::picker::{MovePicker, Stage};

const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

fn drain(picker: &mut MovePicker, pos: &Position, hist: &Histories) -> Vec<Move> {
    let mut out = Vec::new();
    while let Some(mv) = picker.next(pos, hist) { out.push(mv); }
    out
}

#[test]
fn picker_yields_each_legal_move_exactly_once() {
    let pos = Position::from_fen(KIWIPETE).unwrap();
    let hist = Histories::default();
    let tt_move = pos.parse_move("e1g1").unwrap();
    let killers = [pos.parse_move("a2a3").unwrap(), pos.parse_move("g2g3").unwrap()];
    let mut picker = MovePicker::new(&pos, Some(tt_move), killers, [None; 2]);
    let picked = drain(&mut picker, &pos, &hist);
    assert_eq!(picker.stage(), Stage::Done);

    let legal: HashSet<Move> = movegen::generate(&pos, Filter::All).iter().copied().collect();
    let unique: HashSet<Move> = picked.iter().copied().collect();
    assert_eq!(picked.len(), unique.len(), "duplicates in {picked:?}");
    assert_eq!(unique, legal);
}

#[test]
fn stages_come_in_order() {
    let pos = Position::from_fen(KIWIPETE).unwrap();
    let hist = Histories::default();
    let tt_move = pos.parse_move("e1g1").unwrap();
    let killers = [pos.parse_move("a2a3").unwrap(), pos.parse_move("g2g3").unwrap()];
    let mut picker = MovePicker::new(&pos, Some(tt_move), killers, [None; 2]);
    let picked = drain(&mut picker, &pos, &hist);

    assert_eq!(picked[0], tt_move);
    let first_killer = picked.iter().position(|&m| m == killers[0]).unwrap();
    let second_killer = picked.iter().position(|&m| m == killers[1]).unwrap();
    assert_eq!(second_killer, first_killer + 1);
    // Everything between the hash move and the killers is a capture.
    assert!(picked[1..first_killer].iter().all(|&m| pos.is_tactical(m)));
    // Quiets other than killers only after the killers.
    let first_plain_quiet = picked
        .iter()
        .position(|&m| m != tt_move && !killers.contains(&m) && !pos.is_tactical(m))
        .unwrap();
    assert!(first_plain_quiet > second_killer);
}

#[test]
fn illegal_hash_move_and_killers_are_ignored() {
    let pos = Position::startpos();
    let hist = Histories::default();
    let bogus = Move::new(12, 36, piecore::board::MoveFlag::Normal); // e2e5
    let mut picker = MovePicker::new(&pos, Some(bogus), [bogus, Move::NULL], [None; 2]);
    let picked = drain(&mut picker, &pos, &hist);
    assert_eq!(picked.len(), 20);
    assert!(!picked.contains(&bogus));
}

#[test]
fn skip_quiets_still_returns_captures() {
    let pos = Position::from_fen(KIWIPETE).unwrap();
    let hist = Histories::default();
    let mut picker = MovePicker::new(&pos, None, [Move::NULL; 2], [None; 2]);
    picker.skip_quiets();
    let picked = drain(&mut picker, &pos, &hist);
    let captures = movegen::generate(&pos, Filter::Captures).len();
    assert_eq!(picked.len(), captures);
    assert!(picked.iter().all(|&m| pos.is_tactical(m)));
}

#[test]
fn winning_capture_precedes_even_trade() {
    // Rxd6 trades rooks; Nxa5 wins a pawn outright and goes first despite the smaller victim.
    let pos = Position::from_fen("3r3k/8/3r4/p7/8/1N6/8/3R3K w - - 0 1").unwrap();
    let hist = Histories::default();
    let mut picker = MovePicker::new(&pos, None, [Move::NULL; 2], [None; 2]);
    assert_eq!(picker.next(&pos, &hist).map(|m| m.to_string()), Some("b3a5".to_string()));
    assert_eq!(picker.next(&pos, &hist).map(|m| m.to_string()), Some("d1d6".to_string()));
}

#[test]
fn qsearch_picker_orders_by_victim_value() {
    // Rook can take the queen or a pawn; the queen comes first.
    let pos = Position::from_fen("4k3/8/8/3q1p2/8/8/8/3RKR2 w - - 0 1").unwrap();
    let hist = Histories::default();
    let mut picker = MovePicker::new_qsearch(&pos, None, Filter::Captures);
    let picked = drain(&mut picker, &pos, &hist);
    assert_eq!(picked.len(), 2);
    assert_eq!(picked[0].to_string(), "d1d5");
}

#[test]
fn qsearch_picker_in_check_returns_all_evasions() {
    let pos = Position::from_fen("4k3/8/8/8/8/8/3q4/4K3 w - - 0 1").unwrap();
    let hist = Histories::default();
    let mut picker = MovePicker::new_qsearch(&pos, None, Filter::All);
    let picked: HashSet<Move> = drain(&mut picker, &pos, &hist).into_iter().collect();
    let legal: HashSet<Move> = movegen::generate(&pos, Filter::All).iter().copied().collect();
    assert_eq!(picked, legal);
    // Taking the checker is tried first.
    let mut picker = MovePicker::new_qsearch(&pos, None, Filter::All);
    assert_eq!(picker.next(&pos, &hist).map(|m| m.to_string()), Some("e1d2".to_string()));
}
