//! Translation between algebraic squares and the pixel grid of a rendered board.
//!
//! The renderer always draws the local player's home rank at the bottom and
//! places pixel (0, 0) at the top left corner of the board:
//!
//! * playing White, (0, 0) is a8 and (7c, 7c) is h1,
//! * playing Black, (0, 0) is h1 and (7c, 7c) is a8,
//!
//! where `c` is the width of one cell in pixels.

use std::fmt::{self, Display};

use crate::coretypes::{Color, File, Move, Rank, Square, NUM_FILES, NUM_RANKS};

/// Cell width used by the board this was first written against.
pub const DEFAULT_CELL_SIZE: u32 = 64;

/// A pixel position on the rendered board, relative to its top left corner.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

impl Point {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}px, {}px)", self.x, self.y)
    }
}

/// Geometry of an 8x8 board made of square cells.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BoardGeometry {
    cell_size: u32,
}

impl Default for BoardGeometry {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_SIZE)
    }
}

impl BoardGeometry {
    /// Panics if `cell_size` is zero, which cannot describe a board.
    pub const fn new(cell_size: u32) -> Self {
        assert!(cell_size > 0, "cell size must be positive");
        Self { cell_size }
    }

    pub const fn cell_size(&self) -> u32 {
        self.cell_size
    }

    /// Width and height of the whole board in pixels.
    pub const fn board_size(&self) -> u32 {
        self.cell_size * NUM_FILES as u32
    }

    /// Top left corner of the cell holding `square`, seen from `orientation`.
    pub fn square_to_point(&self, square: Square, orientation: Color) -> Point {
        let (column, row) = match orientation {
            Color::White => (square.file_u8(), square.rank().flip() as u8),
            Color::Black => (square.file().flip() as u8, square.rank_u8()),
        };
        Point::new(
            u32::from(column) * self.cell_size,
            u32::from(row) * self.cell_size,
        )
    }

    /// Square under the pixel `point`, or None if it lies off the board.
    /// Any pixel inside a cell maps to that cell's square.
    pub fn point_to_square(&self, point: Point, orientation: Color) -> Option<Square> {
        let column = point.x / self.cell_size;
        let row = point.y / self.cell_size;
        if column as usize >= NUM_FILES || row as usize >= NUM_RANKS {
            return None;
        }

        let file = File::from_u8(column as u8)?;
        let rank = Rank::from_u8(row as u8)?;
        let square = match orientation {
            Color::White => Square::from((file, rank.flip())),
            Color::Black => Square::from((file.flip(), rank)),
        };
        Some(square)
    }

    /// Interpret a highlighted source and destination cell as a move.
    pub fn move_from_points(&self, src: Point, dst: Point, orientation: Color) -> Option<Move> {
        let from = self.point_to_square(src, orientation)?;
        let to = self.point_to_square(dst, orientation)?;
        Some(Move::new(from, to, None))
    }

    /// Points to click, source then destination, to play `move_`.
    pub fn move_to_points(&self, move_: &Move, orientation: Color) -> (Point, Point) {
        (
            self.square_to_point(move_.from(), orientation),
            self.square_to_point(move_.to(), orientation),
        )
    }
}
