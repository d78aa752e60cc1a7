//! The fundamental and simple types of `boardpilot_core`.

use std::convert::TryFrom;
use std::fmt::{self, Display, Write};
use std::str::FromStr;

use crate::error::{self, ErrorKind};

///////////////
// Constants //
///////////////
pub const NUM_FILES: usize = 8; // A, B, C, D, E, F, G, H
pub const NUM_RANKS: usize = 8; // 1, 2, 3, 4, 5, 6, 7, 8
pub const NUM_SQUARES: usize = NUM_FILES * NUM_RANKS;

// The longest principal variation retained from an engine info line.
// Engines may report longer lines, the tail is dropped.
pub const MAX_LINE_LEN: usize = 40;

/////////////////////////
// Data and Structures //
/////////////////////////

/// Type alias for search depth as reported by an engine.
pub type PlyKind = u8;

/// Color can represent the color of a piece, or a player.
/// For a board we only observe, it is also the side drawn at the bottom.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Color {
    White,
    Black,
}

/// Pieces a pawn may promote to. Nothing else about pieces is ever needed
/// because legality is left to the engine.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PieceKind {
    Knight,
    Bishop,
    Rook,
    Queen,
}

/// Enum variant order and discriminant must be contiguous, start from 0,
/// and be in ascending order ABCDEFGH.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[rustfmt::skip]
#[repr(u8)]
pub enum File {
    A, B, C, D, E, F, G, H = 7u8,
}

/// Enum variant order and discriminant must be contiguous, start from 0,
/// and be in ascending order 12345678.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[rustfmt::skip]
#[repr(u8)]
pub enum Rank {
    R1, R2, R3, R4, R5, R6, R7, R8 = 7u8,
}

/// Square
/// Every possible square on a chess board, in little-endian rank-file order.
/// WARNING: `Square::ALL` relies on this ordering.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[rustfmt::skip]
#[repr(u8)]
pub enum Square {
    A1, B1, C1, D1, E1, F1, G1, H1,
    A2, B2, C2, D2, E2, F2, G2, H2,
    A3, B3, C3, D3, E3, F3, G3, H3,
    A4, B4, C4, D4, E4, F4, G4, H4,
    A5, B5, C5, D5, E5, F5, G5, H5,
    A6, B6, C6, D6, E6, F6, G6, H6,
    A7, B7, C7, D7, E7, F7, G7, H7,
    A8, B8, C8, D8, E8, F8, G8, H8 = 63u8,
}

/// Move
/// Pure coordinate form of moving a single chess piece, `e2e4` or `e7e8q`.
/// Equivalent to a chess "half move", or "ply".
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Move {
    pub(crate) from: Square,
    pub(crate) to: Square,
    pub(crate) promotion: Option<PieceKind>,
}

/////////////////////
// Implementations //
/////////////////////

impl Color {
    pub const fn name(&self) -> &'static str {
        match self {
            Color::White => "white",
            Color::Black => "black",
        }
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl PieceKind {
    /// Lowercase promotion suffix used in coordinate notation.
    pub const fn to_char(&self) -> char {
        match self {
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
        }
    }
}

impl TryFrom<char> for PieceKind {
    type Error = error::Error;
    fn try_from(ch: char) -> error::Result<Self> {
        match ch {
            'n' => Ok(Self::Knight),
            'b' => Ok(Self::Bishop),
            'r' => Ok(Self::Rook),
            'q' => Ok(Self::Queen),
            _ => Err((ErrorKind::ParseMoveMalformed, "promotion char not of nbrq").into()),
        }
    }
}

impl File {
    /// File enum variants cover all u8 values from 0-7 inclusive.
    pub const fn from_u8(value: u8) -> Option<Self> {
        use File::*;
        match value {
            0 => Some(A),
            1 => Some(B),
            2 => Some(C),
            3 => Some(D),
            4 => Some(E),
            5 => Some(F),
            6 => Some(G),
            7 => Some(H),
            _ => None,
        }
    }
    /// Get the character representation of File, in lowercase.
    pub const fn to_char(&self) -> char {
        match self {
            Self::A => 'a',
            Self::B => 'b',
            Self::C => 'c',
            Self::D => 'd',
            Self::E => 'e',
            Self::F => 'f',
            Self::G => 'g',
            Self::H => 'h',
        }
    }
    /// Mirrors the file across the center of the board, A <-> H.
    pub const fn flip(&self) -> Self {
        use File::*;
        match self {
            A => H,
            B => G,
            C => F,
            D => E,
            E => D,
            F => C,
            G => B,
            H => A,
        }
    }
}

impl Rank {
    /// Rank enum variants cover all u8 values from 0-7 inclusive.
    pub const fn from_u8(value: u8) -> Option<Self> {
        use Rank::*;
        match value {
            0 => Some(R1),
            1 => Some(R2),
            2 => Some(R3),
            3 => Some(R4),
            4 => Some(R5),
            5 => Some(R6),
            6 => Some(R7),
            7 => Some(R8),
            _ => None,
        }
    }
    pub const fn to_char(&self) -> char {
        match self {
            Self::R1 => '1',
            Self::R2 => '2',
            Self::R3 => '3',
            Self::R4 => '4',
            Self::R5 => '5',
            Self::R6 => '6',
            Self::R7 => '7',
            Self::R8 => '8',
        }
    }
    /// Flips the orientation of the board.
    pub const fn flip(&self) -> Self {
        use Rank::*;
        match self {
            R1 => R8,
            R2 => R7,
            R3 => R6,
            R4 => R5,
            R5 => R4,
            R6 => R3,
            R7 => R2,
            R8 => R1,
        }
    }
}

impl TryFrom<char> for File {
    type Error = error::Error;
    fn try_from(ch: char) -> error::Result<Self> {
        match ch {
            'a' => Ok(Self::A),
            'b' => Ok(Self::B),
            'c' => Ok(Self::C),
            'd' => Ok(Self::D),
            'e' => Ok(Self::E),
            'f' => Ok(Self::F),
            'g' => Ok(Self::G),
            'h' => Ok(Self::H),
            _ => Err((ErrorKind::ParseFileMalformed, "file char not of abcdefgh").into()),
        }
    }
}

impl TryFrom<char> for Rank {
    type Error = error::Error;
    fn try_from(ch: char) -> error::Result<Self> {
        match ch {
            '1' => Ok(Self::R1),
            '2' => Ok(Self::R2),
            '3' => Ok(Self::R3),
            '4' => Ok(Self::R4),
            '5' => Ok(Self::R5),
            '6' => Ok(Self::R6),
            '7' => Ok(Self::R7),
            '8' => Ok(Self::R8),
            _ => Err((ErrorKind::ParseRankMalformed, "rank char not of 12345678").into()),
        }
    }
}

impl Display for File {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_char(self.to_char())
    }
}

impl Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_char(self.to_char())
    }
}

impl Square {
    /// Every square in discriminant order.
    #[rustfmt::skip]
    pub const ALL: [Square; NUM_SQUARES] = {
        use Square::*;
        [
            A1, B1, C1, D1, E1, F1, G1, H1,
            A2, B2, C2, D2, E2, F2, G2, H2,
            A3, B3, C3, D3, E3, F3, G3, H3,
            A4, B4, C4, D4, E4, F4, G4, H4,
            A5, B5, C5, D5, E5, F5, G5, H5,
            A6, B6, C6, D6, E6, F6, G6, H6,
            A7, B7, C7, D7, E7, F7, G7, H7,
            A8, B8, C8, D8, E8, F8, G8, H8,
        ]
    };

    /// Square enum variants cover all u8 values from 0-63 inclusive.
    pub const fn from_u8(value: u8) -> Option<Self> {
        if (value as usize) < NUM_SQUARES {
            Some(Self::ALL[value as usize])
        } else {
            None
        }
    }

    pub fn iter() -> impl Iterator<Item = Square> {
        Self::ALL.into_iter()
    }

    pub fn file(&self) -> File {
        Self::FILES[self.file_u8() as usize]
    }

    pub fn rank(&self) -> Rank {
        Self::RANKS[self.rank_u8() as usize]
    }

    /// Returns 0-based file (0,1,2,3,4,5,6,7), not 1-based chess file.
    pub const fn file_u8(&self) -> u8 {
        *self as u8 % NUM_FILES as u8
    }

    /// Returns 0-based rank (0,1,2,3,4,5,6,7), not 1-based chess rank.
    pub const fn rank_u8(&self) -> u8 {
        *self as u8 / NUM_FILES as u8
    }

    const FILES: [File; NUM_FILES] = [
        File::A,
        File::B,
        File::C,
        File::D,
        File::E,
        File::F,
        File::G,
        File::H,
    ];
    const RANKS: [Rank; NUM_RANKS] = [
        Rank::R1,
        Rank::R2,
        Rank::R3,
        Rank::R4,
        Rank::R5,
        Rank::R6,
        Rank::R7,
        Rank::R8,
    ];
}

impl From<(File, Rank)> for Square {
    fn from((file, rank): (File, Rank)) -> Self {
        Self::ALL[NUM_FILES * rank as usize + file as usize]
    }
}

/// Square::= <fileLetter><rankNumber>
impl FromStr for Square {
    type Err = error::Error;
    fn from_str(s: &str) -> error::Result<Self> {
        let mut chars = s.chars();
        let file = File::try_from(chars.next().ok_or(ErrorKind::ParseSquareMalformed)?)?;
        let rank = Rank::try_from(chars.next().ok_or(ErrorKind::ParseSquareMalformed)?)?;
        if chars.next().is_some() {
            return Err((ErrorKind::ParseSquareMalformed, s).into());
        }
        Ok(Square::from((file, rank)))
    }
}

impl Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.file(), self.rank())
    }
}

impl Move {
    pub const fn new(from: Square, to: Square, promotion: Option<PieceKind>) -> Self {
        Self {
            from,
            to,
            promotion,
        }
    }

    // Immutable Getters
    pub const fn from(&self) -> Square {
        self.from
    }
    pub const fn to(&self) -> Square {
        self.to
    }
    pub const fn promotion(&self) -> Option<PieceKind> {
        self.promotion
    }

    /// True if both moves travel between the same two squares.
    /// A highlighted board only shows squares, never promotion pieces.
    pub fn same_squares(&self, other: &Move) -> bool {
        self.from == other.from && self.to == other.to
    }
}

/// Parses `Pure Algebraic Coordinate Notation`.
impl FromStr for Move {
    type Err = error::Error;
    fn from_str(s: &str) -> error::Result<Self> {
        let s = s.trim();
        if !s.is_ascii() || !(4..=5).contains(&s.len()) {
            return Err((ErrorKind::ParseMoveMalformed, s).into());
        }

        let from: Square = s[0..2].parse()?;
        let to: Square = s[2..4].parse()?;
        let promotion = match s.chars().nth(4) {
            Some(ch) => Some(PieceKind::try_from(ch)?),
            None => None,
        };

        Ok(Self {
            from,
            to,
            promotion,
        })
    }
}

/// # Example
/// Move { from: A7, to: B8, promotion: Some(Queen) } -> `a7b8q`.
impl Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(piece_kind) = self.promotion {
            f.write_char(piece_kind.to_char())?;
        }
        Ok(())
    }
}
