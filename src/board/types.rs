use std::fmt;
use std::hash::{Hash, Hasher};

/// Square index, a1 = 0 .. h8 = 63.
pub type Square = u8;

pub const A1: Square = 0;
pub const C1: Square = 2;
pub const D1: Square = 3;
pub const E1: Square = 4;
pub const F1: Square = 5;
pub const G1: Square = 6;
pub const H1: Square = 7;
pub const A8: Square = 56;
pub const C8: Square = 58;
pub const D8: Square = 59;
pub const E8: Square = 60;
pub const F8: Square = 61;
pub const G8: Square = 62;
pub const H8: Square = 63;

#[inline]
pub const fn make_square(file: u8, rank: u8) -> Square { rank * 8 + file }
#[inline]
pub const fn file_of(sq: Square) -> u8 { sq & 7 }
#[inline]
pub const fn rank_of(sq: Square) -> u8 { sq >> 3 }

pub fn square_name(sq: Square) -> String {
    let f = (b'a' + file_of(sq)) as char;
    let r = (b'1' + rank_of(sq)) as char;
    format!("{f}{r}")
}

pub fn parse_square(s: &str) -> Option<Square> {
    let b = s.as_bytes();
    if b.len() != 2 { return None; }
    if !(b'a'..=b'h').contains(&b[0]) || !(b'1'..=b'8').contains(&b[1]) { return None; }
    Some(make_square(b[0] - b'a', b[1] - b'1'))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub const BOTH: [Color; 2] = [Color::White, Color::Black];

    #[inline]
    pub const fn index(self) -> usize { self as usize }

    #[inline]
    pub const fn flip(self) -> Color {
        match self { Color::White => Color::Black, Color::Black => Color::White }
    }

    /// Rank index relative to this side (rank 1 for white is rank 8 for black).
    #[inline]
    pub const fn relative_rank(self, rank: u8) -> u8 {
        match self { Color::White => rank, Color::Black => 7 - rank }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Piece {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl Piece {
    pub const ALL: [Piece; 6] = [Piece::Pawn, Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen, Piece::King];

    #[inline]
    pub const fn index(self) -> usize { self as usize }

    #[inline]
    pub const fn from_index(i: usize) -> Piece { Self::ALL[i] }

    pub fn to_char(self, color: Color) -> char {
        let c = match self {
            Piece::Pawn => 'p',
            Piece::Knight => 'n',
            Piece::Bishop => 'b',
            Piece::Rook => 'r',
            Piece::Queen => 'q',
            Piece::King => 'k',
        };
        if color == Color::White { c.to_ascii_uppercase() } else { c }
    }

    pub fn from_char(c: char) -> Option<(Color, Piece)> {
        let color = if c.is_ascii_uppercase() { Color::White } else { Color::Black };
        let piece = match c.to_ascii_lowercase() {
            'p' => Piece::Pawn,
            'n' => Piece::Knight,
            'b' => Piece::Bishop,
            'r' => Piece::Rook,
            'q' => Piece::Queen,
            'k' => Piece::King,
            _ => return None,
        };
        Some((color, piece))
    }
}

/// Index of a colored piece in 0..12, used by history and evaluation tables.
#[inline]
pub const fn colored_index(color: Color, piece: Piece) -> usize { color.index() * 6 + piece.index() }

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum MoveFlag {
    Normal = 0,
    DoublePush = 1,
    Castle = 2,
    EnPassant = 3,
    PromoteKnight = 4,
    PromoteBishop = 5,
    PromoteRook = 6,
    PromoteQueen = 7,
}

impl MoveFlag {
    const ALL: [MoveFlag; 8] = [
        MoveFlag::Normal,
        MoveFlag::DoublePush,
        MoveFlag::Castle,
        MoveFlag::EnPassant,
        MoveFlag::PromoteKnight,
        MoveFlag::PromoteBishop,
        MoveFlag::PromoteRook,
        MoveFlag::PromoteQueen,
    ];

    pub const fn promotion(piece: Piece) -> MoveFlag {
        match piece {
            Piece::Knight => MoveFlag::PromoteKnight,
            Piece::Bishop => MoveFlag::PromoteBishop,
            Piece::Rook => MoveFlag::PromoteRook,
            _ => MoveFlag::PromoteQueen,
        }
    }
}

/// Packed move: bits 0-5 from, 6-11 to, 12-15 flag.
///
/// Equality and hashing look at from, to and promotion piece only, so a move decoded
/// from text or from a hash entry matches the generator's move regardless of how its
/// flag bits were filled in.
#[derive(Clone, Copy, Default)]
pub struct Move(u16);

impl Move {
    pub const NULL: Move = Move(0);

    #[inline]
    pub const fn new(from: Square, to: Square, flag: MoveFlag) -> Move {
        Move((from as u16) | ((to as u16) << 6) | ((flag as u16) << 12))
    }

    #[inline]
    pub const fn from_raw(raw: u16) -> Move { Move(raw) }
    #[inline]
    pub const fn raw(self) -> u16 { self.0 }
    #[inline]
    pub const fn from(self) -> Square { (self.0 & 0x3f) as Square }
    #[inline]
    pub const fn to(self) -> Square { ((self.0 >> 6) & 0x3f) as Square }
    #[inline]
    pub const fn flag(self) -> MoveFlag { MoveFlag::ALL[(self.0 >> 12) as usize & 7] }
    #[inline]
    pub const fn is_null(self) -> bool { self.0 & 0x0fff == 0 }

    #[inline]
    pub const fn promotion(self) -> Option<Piece> {
        match self.flag() {
            MoveFlag::PromoteKnight => Some(Piece::Knight),
            MoveFlag::PromoteBishop => Some(Piece::Bishop),
            MoveFlag::PromoteRook => Some(Piece::Rook),
            MoveFlag::PromoteQueen => Some(Piece::Queen),
            _ => None,
        }
    }

    /// from | to | promotion, the part of the encoding that identifies a move.
    #[inline]
    fn identity(self) -> u16 {
        let promo = self.promotion().map_or(0, |p| p.index() as u16);
        (self.0 & 0x0fff) | (promo << 12)
    }
}

impl PartialEq for Move {
    fn eq(&self, other: &Self) -> bool { self.identity() == other.identity() }
}

impl Eq for Move {}

impl Hash for Move {
    fn hash<H: Hasher>(&self, state: &mut H) { self.identity().hash(state) }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() { return write!(f, "0000"); }
        write!(f, "{}{}", square_name(self.from()), square_name(self.to()))?;
        if let Some(p) = self.promotion() { write!(f, "{}", p.to_char(Color::Black))?; }
        Ok(())
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Move({self}, {:?})", self.flag())
    }
}
