//! Move history of a single game, in the order moves were played.

use std::fmt::{self, Display};
use std::ops::Deref;

use crate::coretypes::{Color, Move, Square, Square::*};

/// Rook-destination castling encodings and their king-destination equivalents.
const CASTLING: [(Square, Square, Square); 4] = [
    (E1, H1, G1),
    (E1, A1, C1),
    (E8, H8, G8),
    (E8, A8, C8),
];

/// Rewrite a rook-destination castling move (`e1h1`) to the king-destination
/// form (`e1g1`) engines expect. Every other move is returned unchanged.
pub fn canonicalize(move_: Move) -> Move {
    CASTLING
        .iter()
        .find(|(king, rook, _)| move_.from() == *king && move_.to() == *rook)
        .map(|(king, _, target)| Move::new(*king, *target, move_.promotion()))
        .unwrap_or(move_)
}

/// Canonical moves of one game, oldest first.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct MoveHistory(Vec<Move>);

impl MoveHistory {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Append a move in canonical form.
    pub fn push(&mut self, move_: Move) {
        self.0.push(canonicalize(move_));
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Side to move is decided from parity alone:
    /// White moves on even lengths, Black on odd.
    pub fn is_our_turn(&self, ours: Color) -> bool {
        match ours {
            Color::White => self.0.len() % 2 == 0,
            Color::Black => self.0.len() % 2 == 1,
        }
    }

    /// True if an observed move only repeats what is already recorded.
    ///
    /// A board keeps showing the last move until the next one lands, so a
    /// poll may see either of the two newest entries again. Neither can be
    /// legally played a second time that soon, so matching one of them
    /// always means the observation is old news.
    pub fn is_stale(&self, observed: &Move) -> bool {
        let observed = canonicalize(*observed);
        self.0
            .iter()
            .rev()
            .take(2)
            .any(|recorded| recorded.same_squares(&observed))
    }

    /// Copy of the moves as they stand now.
    pub fn snapshot(&self) -> Vec<Move> {
        self.0.clone()
    }
}

impl Deref for MoveHistory {
    type Target = [Move];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromIterator<Move> for MoveHistory {
    fn from_iter<I: IntoIterator<Item = Move>>(iter: I) -> Self {
        let mut history = Self::new();
        iter.into_iter().for_each(|move_| history.push(move_));
        history
    }
}

/// Space separated, the same shape as a uci `moves` list.
impl Display for MoveHistory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut iter = self.0.iter();
        if let Some(first) = iter.next() {
            write!(f, "{first}")?;
            for move_ in iter {
                write!(f, " {move_}")?;
            }
        }
        Ok(())
    }
}
