use crate::board::bitboard::{bishop_attacks, bit, rook_attacks};
use crate::board::movegen::attackers_to;
use crate::board::{Color, Move, MoveFlag, Piece, Position};
use super::eval::piece_value;

/// Swap-off static exchange evaluation on the destination square.
/// Returns the net material gain in centipawns for the side making `mv`.
pub fn see(pos: &Position, mv: Move) -> i32 {
    if mv.flag() == MoveFlag::Castle { return 0; }
    let (from, to) = (mv.from(), mv.to());
    let Some(mut on_square) = pos.piece_type_on(from) else { return 0; };
    let us = pos.side_to_move();

    let mut occ = pos.occupied() & !bit(from);
    let mut gains = [0i32; 32];
    gains[0] = if mv.flag() == MoveFlag::EnPassant {
        let cap_sq = if us == Color::White { to - 8 } else { to + 8 };
        occ &= !bit(cap_sq);
        piece_value(Piece::Pawn)
    } else {
        pos.piece_type_on(to).map_or(0, piece_value)
    };
    if let Some(promo) = mv.promotion() {
        gains[0] += piece_value(promo) - piece_value(Piece::Pawn);
        on_square = promo;
    }

    let diagonal = pos.pieces(Piece::Bishop) | pos.pieces(Piece::Queen);
    let straight = pos.pieces(Piece::Rook) | pos.pieces(Piece::Queen);
    let mut attackers = attackers_to(pos, to, occ) & occ;
    let mut side = us.flip();
    let mut depth = 0;

    loop {
        let ours = attackers & pos.colors(side);
        if ours == 0 { break; }
        let Some(piece) = Piece::ALL.into_iter().find(|&p| ours & pos.pieces(p) != 0) else { break; };
        // The king may only take last.
        if piece == Piece::King && attackers & pos.colors(side.flip()) != 0 { break; }
        depth += 1;
        gains[depth] = piece_value(on_square) - gains[depth - 1];
        if (-gains[depth - 1]).max(gains[depth]) < 0 { break; }

        let sq = (ours & pos.pieces(piece)).trailing_zeros() as u8;
        occ &= !bit(sq);
        if matches!(piece, Piece::Pawn | Piece::Bishop | Piece::Queen) {
            attackers |= bishop_attacks(to, occ) & diagonal;
        }
        if matches!(piece, Piece::Rook | Piece::Queen) {
            attackers |= rook_attacks(to, occ) & straight;
        }
        attackers &= occ;
        on_square = piece;
        side = side.flip();
        if depth == gains.len() - 1 { break; }
    }

    while depth > 0 {
        gains[depth - 1] = -(-gains[depth - 1]).max(gains[depth]);
        depth -= 1;
    }
    gains[0]
}

#[inline]
pub fn see_ge(pos: &Position, mv: Move, threshold: i32) -> bool { see(pos, mv) >= threshold }
