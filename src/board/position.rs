use std::fmt;

use super::bitboard::{bit, lsb, pawn_attacks, squares, Bitboard, RANK_1, RANK_8};
use super::movegen::{self, Filter};
use super::types::*;
use super::zobrist;
use crate::error::{FenError, MoveError};

pub const WHITE_KING_SIDE: u8 = 1;
pub const WHITE_QUEEN_SIDE: u8 = 2;
pub const BLACK_KING_SIDE: u8 = 4;
pub const BLACK_QUEEN_SIDE: u8 = 8;
pub const ALL_CASTLING: u8 = 15;

const DARK_SQUARES: Bitboard = 0xAA55_AA55_AA55_AA55;

const fn castle_mask_table() -> [u8; 64] {
    let mut t = [ALL_CASTLING; 64];
    t[A1 as usize] = ALL_CASTLING & !WHITE_QUEEN_SIDE;
    t[H1 as usize] = ALL_CASTLING & !WHITE_KING_SIDE;
    t[E1 as usize] = ALL_CASTLING & !(WHITE_KING_SIDE | WHITE_QUEEN_SIDE);
    t[A8 as usize] = ALL_CASTLING & !BLACK_QUEEN_SIDE;
    t[H8 as usize] = ALL_CASTLING & !BLACK_KING_SIDE;
    t[E8 as usize] = ALL_CASTLING & !(BLACK_KING_SIDE | BLACK_QUEEN_SIDE);
    t
}

/// Rights kept after a move touching a square: `rights & CASTLE_MASK[from] & CASTLE_MASK[to]`.
const CASTLE_MASK: [u8; 64] = castle_mask_table();

/// Rook origin and destination for a castling move, keyed by the king's destination.
#[inline]
pub(crate) fn castle_rook_squares(king_to: Square) -> (Square, Square) {
    match king_to {
        G1 => (H1, F1),
        C1 => (A1, D1),
        G8 => (H8, F8),
        _ => (A8, D8),
    }
}

/// Irreversible part of the position, saved before every move and restored by pop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StateInfo {
    pub castling: u8,
    pub ep_file: Option<u8>,
    pub halfmove: u16,
    pub captured: Option<Piece>,
    pub hash: u64,
    pub pawn_hash: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Position {
    pieces: [Bitboard; 6],
    colors: [Bitboard; 2],
    occupied: Bitboard,
    side: Color,
    state: StateInfo,
    history: Vec<StateInfo>,
    moves: Vec<Move>,
    game_ply: u16,
}

impl Position {
    pub const STARTPOS_FEN: &'static str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    fn empty() -> Self {
        Self {
            pieces: [0; 6],
            colors: [0; 2],
            occupied: 0,
            side: Color::White,
            state: StateInfo::default(),
            history: Vec::with_capacity(256),
            moves: Vec::with_capacity(256),
            game_ply: 0,
        }
    }

    pub fn startpos() -> Self {
        Self::from_fen(Self::STARTPOS_FEN).expect("start position FEN is valid")
    }

    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if !(4..=6).contains(&fields.len()) { return Err(FenError::FieldCount(fields.len())); }
        let mut pos = Self::empty();

        let ranks: Vec<&str> = fields[0].split('/').collect();
        if ranks.len() != 8 { return Err(FenError::Placement(fields[0].to_string())); }
        for (i, row) in ranks.iter().enumerate() {
            let rank = 7 - i as u8;
            let mut file = 0u8;
            for c in row.chars() {
                if let Some(d) = c.to_digit(10) {
                    if !(1..=8).contains(&d) { return Err(FenError::Placement(row.to_string())); }
                    file += d as u8;
                } else {
                    let (color, piece) = Piece::from_char(c).ok_or_else(|| FenError::Placement(row.to_string()))?;
                    if file >= 8 { return Err(FenError::Placement(row.to_string())); }
                    pos.put(color, piece, make_square(file, rank));
                    file += 1;
                }
                if file > 8 { return Err(FenError::Placement(row.to_string())); }
            }
            if file != 8 { return Err(FenError::Placement(row.to_string())); }
        }
        for color in Color::BOTH {
            if pos.pieces_of(color, Piece::King).count_ones() != 1 { return Err(FenError::King(color)); }
        }
        if pos.pieces(Piece::Pawn) & (RANK_1 | RANK_8) != 0 {
            return Err(FenError::Placement("pawn on first or last rank".to_string()));
        }

        pos.side = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(FenError::Side(other.to_string())),
        };

        let mut castling = 0u8;
        if fields[2] != "-" {
            for c in fields[2].chars() {
                let right = match c {
                    'K' => WHITE_KING_SIDE,
                    'Q' => WHITE_QUEEN_SIDE,
                    'k' => BLACK_KING_SIDE,
                    'q' => BLACK_QUEEN_SIDE,
                    _ => return Err(FenError::Castling(fields[2].to_string())),
                };
                if castling & right != 0 { return Err(FenError::Castling(fields[2].to_string())); }
                castling |= right;
            }
        }
        // Drop rights whose king or rook is not on its home square.
        let home = |color: Color, piece: Piece, sq: Square| pos.pieces_of(color, piece) & bit(sq) != 0;
        if !home(Color::White, Piece::King, E1) { castling &= !(WHITE_KING_SIDE | WHITE_QUEEN_SIDE); }
        if !home(Color::Black, Piece::King, E8) { castling &= !(BLACK_KING_SIDE | BLACK_QUEEN_SIDE); }
        if !home(Color::White, Piece::Rook, H1) { castling &= !WHITE_KING_SIDE; }
        if !home(Color::White, Piece::Rook, A1) { castling &= !WHITE_QUEEN_SIDE; }
        if !home(Color::Black, Piece::Rook, H8) { castling &= !BLACK_KING_SIDE; }
        if !home(Color::Black, Piece::Rook, A8) { castling &= !BLACK_QUEEN_SIDE; }
        pos.state.castling = castling;

        if fields[3] != "-" {
            let sq = parse_square(fields[3]).ok_or_else(|| FenError::EnPassant(fields[3].to_string()))?;
            let expected_rank = if pos.side == Color::White { 5 } else { 2 };
            if rank_of(sq) != expected_rank { return Err(FenError::EnPassant(fields[3].to_string())); }
            let us = pos.side;
            // The double push must be visible: their pawn beyond the square, and the
            // square and the pawn's origin both empty.
            let (pushed, origin) = if us == Color::White { (sq - 8, sq + 8) } else { (sq + 8, sq - 8) };
            if pos.pieces_of(us.flip(), Piece::Pawn) & bit(pushed) == 0 || pos.occupied & (bit(sq) | bit(origin)) != 0 {
                return Err(FenError::EnPassant(fields[3].to_string()));
            }
            // Keep the file only when a pawn can actually take, so equal positions hash equally.
            if pawn_attacks(us.flip(), sq) & pos.pieces_of(us, Piece::Pawn) != 0 {
                pos.state.ep_file = Some(file_of(sq));
            }
        }

        let halfmove = match fields.get(4) {
            Some(s) => s.parse::<u16>().map_err(|_| FenError::Clock(s.to_string()))?,
            None => 0,
        };
        let fullmove = match fields.get(5) {
            Some(s) => s.parse::<u16>().map_err(|_| FenError::Clock(s.to_string()))?,
            None => 1,
        };
        pos.state.halfmove = halfmove;
        pos.game_ply = (fullmove.max(1) - 1).saturating_mul(2).saturating_add(if pos.side == Color::Black { 1 } else { 0 });

        if movegen::is_check(&pos, pos.side.flip()) { return Err(FenError::OpponentInCheck); }
        pos.state.hash = pos.compute_hash();
        pos.state.pawn_hash = pos.compute_pawn_hash();
        Ok(pos)
    }

    pub fn to_fen(&self) -> String {
        let mut out = String::with_capacity(90);
        for rank in (0..8u8).rev() {
            let mut empty = 0;
            for file in 0..8u8 {
                match self.piece_on(make_square(file, rank)) {
                    Some((color, piece)) => {
                        if empty > 0 { out.push_str(&empty.to_string()); empty = 0; }
                        out.push(piece.to_char(color));
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 { out.push_str(&empty.to_string()); }
            if rank > 0 { out.push('/'); }
        }
        out.push(' ');
        out.push(if self.side == Color::White { 'w' } else { 'b' });
        out.push(' ');
        if self.state.castling == 0 {
            out.push('-');
        } else {
            for (right, c) in [(WHITE_KING_SIDE, 'K'), (WHITE_QUEEN_SIDE, 'Q'), (BLACK_KING_SIDE, 'k'), (BLACK_QUEEN_SIDE, 'q')] {
                if self.state.castling & right != 0 { out.push(c); }
            }
        }
        out.push(' ');
        match self.ep_square() {
            Some(sq) => out.push_str(&square_name(sq)),
            None => out.push('-'),
        }
        out.push_str(&format!(" {} {}", self.state.halfmove, self.game_ply / 2 + 1));
        out
    }

    #[inline]
    fn put(&mut self, color: Color, piece: Piece, sq: Square) {
        let b = bit(sq);
        self.pieces[piece.index()] |= b;
        self.colors[color.index()] |= b;
        self.occupied |= b;
    }

    #[inline]
    fn remove(&mut self, color: Color, piece: Piece, sq: Square) {
        let b = bit(sq);
        self.pieces[piece.index()] &= !b;
        self.colors[color.index()] &= !b;
        self.occupied &= !b;
    }

    #[inline]
    pub fn pieces(&self, piece: Piece) -> Bitboard { self.pieces[piece.index()] }
    #[inline]
    pub fn colors(&self, color: Color) -> Bitboard { self.colors[color.index()] }
    #[inline]
    pub fn pieces_of(&self, color: Color, piece: Piece) -> Bitboard { self.pieces[piece.index()] & self.colors[color.index()] }
    #[inline]
    pub fn occupied(&self) -> Bitboard { self.occupied }
    #[inline]
    pub fn side_to_move(&self) -> Color { self.side }
    #[inline]
    pub fn state(&self) -> &StateInfo { &self.state }
    #[inline]
    pub fn hash(&self) -> u64 { self.state.hash }
    #[inline]
    pub fn pawn_hash(&self) -> u64 { self.state.pawn_hash }
    #[inline]
    pub fn castling_rights(&self) -> u8 { self.state.castling }
    #[inline]
    pub fn halfmove_clock(&self) -> u16 { self.state.halfmove }
    /// Piece captured by the last move, if any.
    #[inline]
    pub fn captured_piece(&self) -> Option<Piece> { self.state.captured }
    #[inline]
    pub fn game_ply(&self) -> u16 { self.game_ply }
    /// Number of moves (including null moves) applied since the position was set up.
    #[inline]
    pub fn history_len(&self) -> usize { self.moves.len() }
    #[inline]
    pub fn last_move(&self) -> Option<Move> { self.moves.last().copied() }

    pub fn ep_square(&self) -> Option<Square> {
        let rank = if self.side == Color::White { 5 } else { 2 };
        self.state.ep_file.map(|f| make_square(f, rank))
    }

    #[inline]
    pub fn king_square(&self, color: Color) -> Square { lsb(self.pieces_of(color, Piece::King)) }

    #[inline]
    pub fn piece_type_on(&self, sq: Square) -> Option<Piece> {
        let b = bit(sq);
        if self.occupied & b == 0 { return None; }
        Piece::ALL.into_iter().find(|p| self.pieces[p.index()] & b != 0)
    }

    pub fn piece_on(&self, sq: Square) -> Option<(Color, Piece)> {
        let piece = self.piece_type_on(sq)?;
        let color = if self.colors[0] & bit(sq) != 0 { Color::White } else { Color::Black };
        Some((color, piece))
    }

    #[inline]
    pub fn in_check(&self) -> bool { movegen::is_check(self, self.side) }

    #[inline]
    pub fn checkers(&self) -> Bitboard { movegen::checkers(self) }

    #[inline]
    pub fn is_capture(&self, mv: Move) -> bool {
        mv.flag() == MoveFlag::EnPassant || self.colors(self.side.flip()) & bit(mv.to()) != 0
    }

    /// Captures and queen promotions; the complement of the quiet generation filter.
    #[inline]
    pub fn is_tactical(&self, mv: Move) -> bool {
        self.is_capture(mv) || mv.promotion() == Some(Piece::Queen)
    }

    pub fn non_pawn_material(&self, color: Color) -> bool {
        let npm = self.pieces(Piece::Knight) | self.pieces(Piece::Bishop) | self.pieces(Piece::Rook) | self.pieces(Piece::Queen);
        npm & self.colors(color) != 0
    }

    /// Applies a pseudo-legal move. Returns false without touching anything if the
    /// from-square does not hold a piece of the side to move.
    pub fn make_move(&mut self, mv: Move) -> bool {
        let from = mv.from();
        let to = mv.to();
        let piece = match self.piece_on(from) {
            Some((color, piece)) if color == self.side => piece,
            _ => return false,
        };
        let us = self.side;
        let them = us.flip();
        self.history.push(self.state);
        self.moves.push(mv);

        let mut st = self.state;
        st.captured = None;
        st.halfmove += 1;
        if let Some(f) = st.ep_file.take() { st.hash ^= zobrist::ep_file(f); }

        match mv.flag() {
            MoveFlag::Castle => {
                let (rook_from, rook_to) = castle_rook_squares(to);
                self.remove(us, Piece::King, from);
                self.put(us, Piece::King, to);
                self.remove(us, Piece::Rook, rook_from);
                self.put(us, Piece::Rook, rook_to);
                st.hash ^= zobrist::piece(us, Piece::King, from)
                    ^ zobrist::piece(us, Piece::King, to)
                    ^ zobrist::piece(us, Piece::Rook, rook_from)
                    ^ zobrist::piece(us, Piece::Rook, rook_to);
            }
            MoveFlag::EnPassant => {
                let cap_sq = if us == Color::White { to - 8 } else { to + 8 };
                self.remove(them, Piece::Pawn, cap_sq);
                self.remove(us, Piece::Pawn, from);
                self.put(us, Piece::Pawn, to);
                let k = zobrist::piece(them, Piece::Pawn, cap_sq)
                    ^ zobrist::piece(us, Piece::Pawn, from)
                    ^ zobrist::piece(us, Piece::Pawn, to);
                st.hash ^= k;
                st.pawn_hash ^= k;
                st.captured = Some(Piece::Pawn);
                st.halfmove = 0;
            }
            flag => {
                if let Some(cap) = self.piece_type_on(to) {
                    self.remove(them, cap, to);
                    let k = zobrist::piece(them, cap, to);
                    st.hash ^= k;
                    if cap == Piece::Pawn { st.pawn_hash ^= k; }
                    st.captured = Some(cap);
                    st.halfmove = 0;
                }
                let placed = mv.promotion().unwrap_or(piece);
                self.remove(us, piece, from);
                self.put(us, placed, to);
                st.hash ^= zobrist::piece(us, piece, from) ^ zobrist::piece(us, placed, to);
                if piece == Piece::Pawn {
                    st.pawn_hash ^= zobrist::piece(us, Piece::Pawn, from);
                    if placed == Piece::Pawn { st.pawn_hash ^= zobrist::piece(us, Piece::Pawn, to); }
                    st.halfmove = 0;
                }
                if flag == MoveFlag::DoublePush {
                    let ep_sq = (from + to) / 2;
                    if pawn_attacks(us, ep_sq) & self.pieces_of(them, Piece::Pawn) != 0 {
                        st.ep_file = Some(file_of(from));
                        st.hash ^= zobrist::ep_file(file_of(from));
                    }
                }
            }
        }

        let castling = st.castling & CASTLE_MASK[from as usize] & CASTLE_MASK[to as usize];
        if castling != st.castling {
            st.hash ^= zobrist::castling(st.castling) ^ zobrist::castling(castling);
            st.castling = castling;
        }
        st.hash ^= zobrist::side();
        self.side = them;
        self.state = st;
        self.game_ply += 1;
        true
    }

    /// Takes back the last `make_move`. Must be paired with it.
    pub fn unmake_move(&mut self) {
        let Some(mv) = self.moves.pop() else {
            debug_assert!(false, "unmake_move without a matching make_move");
            return;
        };
        debug_assert!(!mv.is_null(), "null moves are taken back with unmake_null_move");
        let captured = self.state.captured;
        let Some(prev) = self.history.pop() else { return; };
        self.side = self.side.flip();
        let us = self.side;
        let them = us.flip();
        let (from, to) = (mv.from(), mv.to());

        match mv.flag() {
            MoveFlag::Castle => {
                let (rook_from, rook_to) = castle_rook_squares(to);
                self.remove(us, Piece::King, to);
                self.put(us, Piece::King, from);
                self.remove(us, Piece::Rook, rook_to);
                self.put(us, Piece::Rook, rook_from);
            }
            MoveFlag::EnPassant => {
                let cap_sq = if us == Color::White { to - 8 } else { to + 8 };
                self.remove(us, Piece::Pawn, to);
                self.put(us, Piece::Pawn, from);
                self.put(them, Piece::Pawn, cap_sq);
            }
            _ => {
                if let Some(placed) = self.piece_type_on(to) {
                    self.remove(us, placed, to);
                    let original = if mv.promotion().is_some() { Piece::Pawn } else { placed };
                    self.put(us, original, from);
                }
                if let Some(cap) = captured { self.put(them, cap, to); }
            }
        }
        self.state = prev;
        self.game_ply -= 1;
    }

    /// Passes the turn. Never call while in check.
    pub fn make_null_move(&mut self) {
        debug_assert!(!self.in_check(), "null move while in check");
        self.history.push(self.state);
        self.moves.push(Move::NULL);
        let mut st = self.state;
        st.captured = None;
        st.halfmove += 1;
        if let Some(f) = st.ep_file.take() { st.hash ^= zobrist::ep_file(f); }
        st.hash ^= zobrist::side();
        self.state = st;
        self.side = self.side.flip();
        self.game_ply += 1;
    }

    pub fn unmake_null_move(&mut self) {
        debug_assert!(self.moves.last().is_some_and(|m| m.is_null()), "unmake_null_move without a null move");
        self.moves.pop();
        if let Some(prev) = self.history.pop() {
            self.state = prev;
            self.side = self.side.flip();
            self.game_ply -= 1;
        }
    }

    /// Resolves UCI text (`e2e4`, `e7e8q`) against the legal moves of this position.
    pub fn parse_move(&self, text: &str) -> Result<Move, MoveError> {
        let t = text.trim();
        let malformed = || MoveError::Malformed(t.to_string());
        if !(4..=5).contains(&t.len()) || !t.is_ascii() { return Err(malformed()); }
        let from = parse_square(&t[0..2]).ok_or_else(malformed)?;
        let to = parse_square(&t[2..4]).ok_or_else(malformed)?;
        let promo = match t.as_bytes().get(4) {
            None => None,
            Some(b'n') => Some(Piece::Knight),
            Some(b'b') => Some(Piece::Bishop),
            Some(b'r') => Some(Piece::Rook),
            Some(b'q') => Some(Piece::Queen),
            Some(_) => return Err(malformed()),
        };
        movegen::generate_from(self, from)
            .iter()
            .copied()
            .find(|m| m.to() == to && m.promotion() == promo)
            .ok_or_else(|| MoveError::Illegal(t.to_string()))
    }

    /// Plays a move given in UCI text after checking it is legal.
    pub fn play_uci(&mut self, text: &str) -> Result<Move, MoveError> {
        let mv = self.parse_move(text)?;
        self.make_move(mv);
        Ok(mv)
    }

    /// Checked `make_move`: plays the generator's version of `mv` or leaves the
    /// position untouched and reports the move as illegal.
    pub fn try_make_move(&mut self, mv: Move) -> Result<Move, MoveError> {
        let canonical = movegen::generate_from(self, mv.from())
            .iter()
            .copied()
            .find(|&m| m == mv)
            .ok_or_else(|| MoveError::Illegal(mv.to_string()))?;
        self.make_move(canonical);
        Ok(canonical)
    }

    /// True if the current position occurred before within the reversible window.
    pub fn is_repetition(&self) -> bool {
        let n = self.history.len();
        let window = (self.state.halfmove as usize).min(n);
        let mut back = 2;
        while back <= window {
            if self.moves[n - back + 1].is_null() || self.moves[n - back].is_null() { return false; }
            if self.history[n - back].hash == self.state.hash { return true; }
            back += 2;
        }
        false
    }

    /// Fifty-move rule, unless the side to move is checkmated on the hundredth ply.
    pub fn is_fifty_move_draw(&self) -> bool {
        if self.state.halfmove < 100 { return false; }
        !self.in_check() || !movegen::generate(self, Filter::All).is_empty()
    }

    pub fn is_insufficient_material(&self) -> bool {
        if self.pieces(Piece::Pawn) | self.pieces(Piece::Rook) | self.pieces(Piece::Queen) != 0 { return false; }
        let minors = self.pieces(Piece::Knight) | self.pieces(Piece::Bishop);
        if minors.count_ones() <= 1 { return true; }
        let bishops = self.pieces(Piece::Bishop);
        self.pieces(Piece::Knight) == 0 && (bishops & DARK_SQUARES == 0 || bishops & !DARK_SQUARES == 0)
    }

    pub fn is_draw(&self) -> bool {
        self.is_repetition() || self.is_insufficient_material() || self.is_fifty_move_draw()
    }

    pub fn compute_hash(&self) -> u64 {
        let mut h = 0u64;
        for color in Color::BOTH {
            for piece in Piece::ALL {
                for sq in squares(self.pieces_of(color, piece)) { h ^= zobrist::piece(color, piece, sq); }
            }
        }
        h ^= zobrist::castling(self.state.castling);
        if let Some(f) = self.state.ep_file { h ^= zobrist::ep_file(f); }
        if self.side == Color::Black { h ^= zobrist::side(); }
        h
    }

    pub fn compute_pawn_hash(&self) -> u64 {
        let mut h = 0u64;
        for color in Color::BOTH {
            for sq in squares(self.pieces_of(color, Piece::Pawn)) { h ^= zobrist::piece(color, Piece::Pawn, sq); }
        }
        h
    }

    /// Checks the bitboard partition, king count and both hashes.
    pub fn is_consistent(&self) -> bool {
        let [white, black] = self.colors;
        if white & black != 0 || white | black != self.occupied { return false; }
        let mut union = 0;
        for p in self.pieces {
            if union & p != 0 { return false; }
            union |= p;
        }
        union == self.occupied
            && self.pieces_of(Color::White, Piece::King).count_ones() == 1
            && self.pieces_of(Color::Black, Piece::King).count_ones() == 1
            && self.state.hash == self.compute_hash()
            && self.state.pawn_hash == self.compute_pawn_hash()
    }
}

impl Default for Position {
    fn default() -> Self { Self::startpos() }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..8u8).rev() {
            write!(f, "{} ", rank + 1)?;
            for file in 0..8u8 {
                let c = self.piece_on(make_square(file, rank)).map_or('.', |(color, piece)| piece.to_char(color));
                write!(f, "{c} ")?;
            }
            writeln!(f)?;
        }
        writeln!(f, "  a b c d e f g h")?;
        write!(f, "{}", self.to_fen())
    }
}
