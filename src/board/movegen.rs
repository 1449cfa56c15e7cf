//! Legal move generation.
//!
//! Moves are produced legal directly: check evasions restrict targets to the
//! checking piece and the squares between it and the king, pinned pieces stay on
//! their pin line, the king never steps onto an attacked square, and en passant is
//! verified by replaying the occupancy change against the king.

use std::ops::{Deref, DerefMut};

use super::bitboard::*;
use super::position::{castle_rook_squares, Position, BLACK_KING_SIDE, BLACK_QUEEN_SIDE, WHITE_KING_SIDE, WHITE_QUEEN_SIDE};
use super::types::*;

pub const MAX_MOVES: usize = 256;

/// Which part of the legal moves to generate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Filter {
    All,
    /// Captures, en passant and queen promotions.
    Captures,
    /// `Captures` plus quiet moves that give direct check.
    Noisy,
    /// Everything `Captures` leaves out.
    Quiet,
}

#[derive(Clone)]
pub struct MoveList {
    moves: [Move; MAX_MOVES],
    len: usize,
}

impl MoveList {
    pub const fn new() -> Self { Self { moves: [Move::NULL; MAX_MOVES], len: 0 } }

    #[inline]
    pub fn push(&mut self, mv: Move) {
        debug_assert!(self.len < MAX_MOVES);
        self.moves[self.len] = mv;
        self.len += 1;
    }

    #[inline]
    pub fn clear(&mut self) { self.len = 0; }
}

impl Default for MoveList {
    fn default() -> Self { Self::new() }
}

impl Deref for MoveList {
    type Target = [Move];
    fn deref(&self) -> &[Move] { &self.moves[..self.len] }
}

impl DerefMut for MoveList {
    fn deref_mut(&mut self) -> &mut [Move] { &mut self.moves[..self.len] }
}

impl<'a> IntoIterator for &'a MoveList {
    type Item = &'a Move;
    type IntoIter = std::slice::Iter<'a, Move>;
    fn into_iter(self) -> Self::IntoIter { self.iter() }
}

impl std::fmt::Debug for MoveList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter().map(|m| m.to_string())).finish()
    }
}

pub fn generate(pos: &Position, filter: Filter) -> MoveList {
    let mut list = MoveList::new();
    generate_into(pos, filter, &mut list);
    list
}

pub fn generate_into(pos: &Position, filter: Filter, list: &mut MoveList) {
    list.clear();
    generate_masked(pos, filter, !0, list);
}

/// Legal moves of the piece standing on `from`.
pub fn generate_from(pos: &Position, from: Square) -> MoveList {
    let mut list = MoveList::new();
    generate_masked(pos, Filter::All, bit(from), &mut list);
    list
}

/// Exact legality check for a move carrying generator flags (hash and killer moves).
pub fn is_legal(pos: &Position, mv: Move) -> bool {
    if mv.is_null() { return false; }
    generate_from(pos, mv.from()).iter().any(|m| m.raw() == mv.raw())
}

/// All pieces of both colors attacking `sq` given occupancy `occ`.
pub fn attackers_to(pos: &Position, sq: Square, occ: Bitboard) -> Bitboard {
    let rq = pos.pieces(Piece::Rook) | pos.pieces(Piece::Queen);
    let bq = pos.pieces(Piece::Bishop) | pos.pieces(Piece::Queen);
    (pawn_attacks(Color::White, sq) & pos.pieces_of(Color::Black, Piece::Pawn))
        | (pawn_attacks(Color::Black, sq) & pos.pieces_of(Color::White, Piece::Pawn))
        | (knight_attacks(sq) & pos.pieces(Piece::Knight))
        | (king_attacks(sq) & pos.pieces(Piece::King))
        | (rook_attacks(sq, occ) & rq)
        | (bishop_attacks(sq, occ) & bq)
}

pub fn is_check(pos: &Position, color: Color) -> bool {
    let king = pos.pieces_of(color, Piece::King);
    if king == 0 { return false; }
    attackers_to(pos, lsb(king), pos.occupied()) & pos.colors(color.flip()) != 0
}

pub fn checkers(pos: &Position) -> Bitboard {
    let us = pos.side_to_move();
    attackers_to(pos, pos.king_square(us), pos.occupied()) & pos.colors(us.flip())
}

#[inline]
pub fn piece_attacks(color: Color, piece: Piece, sq: Square, occ: Bitboard) -> Bitboard {
    match piece {
        Piece::Pawn => pawn_attacks(color, sq),
        Piece::Knight => knight_attacks(sq),
        Piece::Bishop => bishop_attacks(sq, occ),
        Piece::Rook => rook_attacks(sq, occ),
        Piece::Queen => queen_attacks(sq, occ),
        Piece::King => king_attacks(sq),
    }
}

/// Whether a legal move checks the opponent, directly or by discovery.
pub fn gives_check(pos: &Position, mv: Move) -> bool {
    let us = pos.side_to_move();
    let them = us.flip();
    let their_king = pos.king_square(them);
    let (from, to) = (mv.from(), mv.to());
    let Some(piece) = pos.piece_type_on(from) else { return false; };

    let mut occ = (pos.occupied() & !bit(from)) | bit(to);
    let mut ours = (pos.colors(us) & !bit(from)) | bit(to);
    let mut rooks = (pos.pieces(Piece::Rook) | pos.pieces(Piece::Queen)) & ours;
    match mv.flag() {
        MoveFlag::EnPassant => {
            let cap_sq = if us == Color::White { to - 8 } else { to + 8 };
            occ &= !bit(cap_sq);
        }
        MoveFlag::Castle => {
            let (rook_from, rook_to) = castle_rook_squares(to);
            occ = (occ & !bit(rook_from)) | bit(rook_to);
            ours = (ours & !bit(rook_from)) | bit(rook_to);
            rooks = (rooks & !bit(rook_from)) | bit(rook_to);
        }
        _ => {}
    }

    let moved = mv.promotion().unwrap_or(piece);
    if piece_attacks(us, moved, to, occ) & bit(their_king) != 0 { return true; }
    let bishops = (pos.pieces(Piece::Bishop) | pos.pieces(Piece::Queen)) & ours & !bit(to);
    let rooks = rooks & !bit(to);
    rook_attacks(their_king, occ) & rooks != 0 || bishop_attacks(their_king, occ) & bishops != 0
}

/// Pieces of `us` that alone shield their king from an enemy slider.
fn pinned_pieces(pos: &Position, us: Color, king: Square) -> Bitboard {
    let them = us.flip();
    let occ = pos.occupied();
    let snipers = ((rook_attacks(king, 0) & (pos.pieces(Piece::Rook) | pos.pieces(Piece::Queen)))
        | (bishop_attacks(king, 0) & (pos.pieces(Piece::Bishop) | pos.pieces(Piece::Queen))))
        & pos.colors(them);
    let mut pinned = 0;
    for s in squares(snipers) {
        let blockers = between(king, s) & occ;
        if blockers != 0 && !more_than_one(blockers) && blockers & pos.colors(us) != 0 {
            pinned |= blockers;
        }
    }
    pinned
}

fn generate_masked(pos: &Position, filter: Filter, from_mask: Bitboard, list: &mut MoveList) {
    let us = pos.side_to_move();
    let them = us.flip();
    let occ = pos.occupied();
    let ours = pos.colors(us);
    let theirs = pos.colors(them);
    let king = pos.king_square(us);
    let checkers = attackers_to(pos, king, occ) & theirs;

    if from_mask & bit(king) != 0 {
        let targets = match filter {
            Filter::All => !ours,
            Filter::Captures | Filter::Noisy => theirs,
            Filter::Quiet => !occ,
        };
        let without_king = occ & !bit(king);
        for to in squares(king_attacks(king) & targets) {
            if attackers_to(pos, to, without_king) & theirs == 0 {
                list.push(Move::new(king, to, MoveFlag::Normal));
            }
        }
        if checkers == 0 && matches!(filter, Filter::All | Filter::Quiet) {
            generate_castling(pos, us, list);
        }
    }
    if more_than_one(checkers) { return; }

    let evasion = if checkers == 0 { !0 } else { checkers | between(king, lsb(checkers)) };
    let pinned = pinned_pieces(pos, us, king);
    let capture_targets = theirs & evasion;
    let quiet_targets = !occ & evasion;
    let their_king = pos.king_square(them);

    for piece in [Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen] {
        let targets = match filter {
            Filter::All => capture_targets | quiet_targets,
            Filter::Captures => capture_targets,
            Filter::Quiet => quiet_targets,
            Filter::Noisy => capture_targets | (quiet_targets & piece_attacks(them, piece, their_king, occ)),
        };
        for from in squares(pos.pieces_of(us, piece) & from_mask) {
            let mut attacks = piece_attacks(us, piece, from, occ) & targets;
            if pinned & bit(from) != 0 { attacks &= line(king, from); }
            for to in squares(attacks) {
                list.push(Move::new(from, to, MoveFlag::Normal));
            }
        }
    }

    generate_pawn_moves(pos, filter, from_mask, king, pinned, capture_targets, quiet_targets, list);
}

#[allow(clippy::too_many_arguments)]
fn generate_pawn_moves(
    pos: &Position,
    filter: Filter,
    from_mask: Bitboard,
    king: Square,
    pinned: Bitboard,
    capture_targets: Bitboard,
    quiet_targets: Bitboard,
    list: &mut MoveList,
) {
    let us = pos.side_to_move();
    let them = us.flip();
    let occ = pos.occupied();
    let (promo_rank, start_rank) = match us {
        Color::White => (RANK_8, RANK_2),
        Color::Black => (RANK_1, RANK_7),
    };
    let forward = |sq: Square| if us == Color::White { sq + 8 } else { sq - 8 };
    let their_king = bit(pos.king_square(them));
    let quiet_ok = |to: Square| match filter {
        Filter::All | Filter::Quiet => true,
        Filter::Captures => false,
        Filter::Noisy => pawn_attacks(us, to) & their_king != 0,
    };
    let push_promotions = |list: &mut MoveList, from: Square, to: Square, capture: bool| {
        for piece in [Piece::Queen, Piece::Knight, Piece::Rook, Piece::Bishop] {
            let wanted = match filter {
                Filter::All => true,
                Filter::Captures | Filter::Noisy => capture || piece == Piece::Queen,
                Filter::Quiet => !capture && piece != Piece::Queen,
            };
            if wanted { list.push(Move::new(from, to, MoveFlag::promotion(piece))); }
        }
    };

    for from in squares(pos.pieces_of(us, Piece::Pawn) & from_mask) {
        let pin_line = if pinned & bit(from) != 0 { line(king, from) } else { !0 };

        let one = forward(from);
        if occ & bit(one) == 0 {
            if bit(one) & quiet_targets & pin_line != 0 {
                if bit(one) & promo_rank != 0 {
                    push_promotions(list, from, one, false);
                } else if quiet_ok(one) {
                    list.push(Move::new(from, one, MoveFlag::Normal));
                }
            }
            if bit(from) & start_rank != 0 {
                let two = forward(one);
                if occ & bit(two) == 0 && bit(two) & quiet_targets & pin_line != 0 && quiet_ok(two) {
                    list.push(Move::new(from, two, MoveFlag::DoublePush));
                }
            }
        }

        if filter != Filter::Quiet {
            for to in squares(pawn_attacks(us, from) & capture_targets & pin_line) {
                if bit(to) & promo_rank != 0 {
                    push_promotions(list, from, to, true);
                } else {
                    list.push(Move::new(from, to, MoveFlag::Normal));
                }
            }
        }

        if filter == Filter::Quiet { continue; }
        if let Some(ep) = pos.ep_square() {
            if pawn_attacks(us, from) & bit(ep) != 0 {
                let cap_sq = if us == Color::White { ep - 8 } else { ep + 8 };
                let after = (occ & !bit(from) & !bit(cap_sq)) | bit(ep);
                let attackers = attackers_to(pos, king, after) & pos.colors(them) & !bit(cap_sq);
                if attackers == 0 {
                    list.push(Move::new(from, ep, MoveFlag::EnPassant));
                }
            }
        }
    }
}

fn generate_castling(pos: &Position, us: Color, list: &mut MoveList) {
    let rights = pos.castling_rights();
    let occ = pos.occupied();
    let theirs = pos.colors(us.flip());
    let (king_side, queen_side, king_from) = match us {
        Color::White => (WHITE_KING_SIDE, WHITE_QUEEN_SIDE, E1),
        Color::Black => (BLACK_KING_SIDE, BLACK_QUEEN_SIDE, E8),
    };
    let safe = |sq: Square| attackers_to(pos, sq, occ) & theirs == 0;
    let rooks = pos.pieces_of(us, Piece::Rook);

    if rights & king_side != 0 {
        let rook = king_from + 3;
        if rooks & bit(rook) != 0 && between(king_from, rook) & occ == 0 && safe(king_from + 1) && safe(king_from + 2) {
            list.push(Move::new(king_from, king_from + 2, MoveFlag::Castle));
        }
    }
    if rights & queen_side != 0 {
        let rook = king_from - 4;
        if rooks & bit(rook) != 0 && between(king_from, rook) & occ == 0 && safe(king_from - 1) && safe(king_from - 2) {
            list.push(Move::new(king_from, king_from - 2, MoveFlag::Castle));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(fen: &str, filter: Filter) -> usize {
        generate(&Position::from_fen(fen).unwrap(), filter).len()
    }

    #[test]
    fn startpos_has_twenty_moves_and_no_captures() {
        assert_eq!(count(Position::STARTPOS_FEN, Filter::All), 20);
        assert_eq!(count(Position::STARTPOS_FEN, Filter::Captures), 0);
        assert_eq!(count(Position::STARTPOS_FEN, Filter::Quiet), 20);
    }

    #[test]
    fn double_check_allows_only_king_moves() {
        // Rook on e8 and knight on d3 both check the king on e1.
        let pos = Position::from_fen("4r2k/8/8/8/8/3n4/8/R3K3 w Q - 0 1").unwrap();
        let moves = generate(&pos, Filter::All);
        assert!(!moves.is_empty());
        assert!(moves.iter().all(|m| m.from() == pos.king_square(Color::White)));
    }

    #[test]
    fn en_passant_exposing_king_on_rank_is_rejected() {
        let pos = Position::from_fen("8/8/8/KPp4r/8/8/8/7k w - c6 0 1").unwrap();
        assert!(generate(&pos, Filter::All).iter().all(|m| m.flag() != MoveFlag::EnPassant));
    }

    #[test]
    fn captures_and_quiets_partition_all() {
        let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
        assert_eq!(count(fen, Filter::Captures) + count(fen, Filter::Quiet), count(fen, Filter::All));
    }
}
