//! Forsyth-Edwards Notation, accepted only as one already isolated field.
//!
//! Nothing here understands the position; the string is checked for shape
//! and handed to the engine untouched.

use std::fmt::{self, Display};
use std::str::FromStr;

use crate::coretypes::{NUM_FILES, NUM_RANKS};
use crate::error::{self, ErrorKind};

/// A shape-checked FEN string.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Fen(String);

impl Fen {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn check_placement(placement: &str) -> error::Result<()> {
        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != NUM_RANKS {
            return Err((ErrorKind::ParseFenMalformed, "placement needs 8 ranks").into());
        }

        for rank in ranks {
            let mut width = 0usize;
            for ch in rank.chars() {
                match ch {
                    '1'..='8' => width += ch as usize - '0' as usize,
                    'p' | 'n' | 'b' | 'r' | 'q' | 'k' | 'P' | 'N' | 'B' | 'R' | 'Q' | 'K' => {
                        width += 1
                    }
                    _ => return Err((ErrorKind::ParseFenMalformed, rank).into()),
                }
            }
            if width != NUM_FILES {
                return Err((ErrorKind::ParseFenMalformed, rank).into());
            }
        }
        Ok(())
    }
}

/// Requires placement, side to move, castling and en passant fields.
/// The two move counters are optional, as several sites omit them.
impl FromStr for Fen {
    type Err = error::Error;
    fn from_str(s: &str) -> error::Result<Self> {
        let fields: Vec<&str> = s.split_whitespace().collect();
        if !(4..=6).contains(&fields.len()) {
            return Err((ErrorKind::ParseFenMalformed, "expected 4 to 6 fields").into());
        }

        Self::check_placement(fields[0])?;
        if !matches!(fields[1], "w" | "b") {
            return Err((ErrorKind::ParseFenMalformed, "side to move not w|b").into());
        }
        if fields[2] != "-" && !fields[2].chars().all(|ch| "KQkq".contains(ch)) {
            return Err((ErrorKind::ParseFenMalformed, "castling not of KQkq-").into());
        }
        for counter in fields.iter().skip(4) {
            counter
                .parse::<u32>()
                .map_err(|err| (ErrorKind::ParseFenMalformed, err))?;
        }

        Ok(Self(fields.join(" ")))
    }
}

impl Display for Fen {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_full_and_short_fens() {
        let start = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
        assert_eq!(start.parse::<Fen>().unwrap().as_str(), start);

        let short = "rnbqkbnr/pppp1ppp/8/4P3/8/8/PPP1PPPP/RNBQKBNR b KQkq -";
        assert!(short.parse::<Fen>().is_ok());

        let spaced = "  8/8/8/8/8/8/8/K6k   w - -  ";
        assert_eq!(spaced.parse::<Fen>().unwrap().as_str(), "8/8/8/8/8/8/8/K6k w - -");
    }

    #[test]
    fn rejects_malformed() {
        assert!("".parse::<Fen>().is_err());
        assert!("8/8/8/8/8/8/8 w - - 0 1".parse::<Fen>().is_err());
        assert!("8/8/8/8/8/8/8/K6 w - - 0 1".parse::<Fen>().is_err());
        assert!("8/8/8/8/8/8/8/K6k x - - 0 1".parse::<Fen>().is_err());
        assert!("8/8/8/8/8/8/8/K6k w KX - 0 1".parse::<Fen>().is_err());
        assert!("8/8/8/8/8/8/8/K6k w - - zero 1".parse::<Fen>().is_err());
        assert!(r#""fen":"8/8/8/8/8/8/8/K6k w - -""#.parse::<Fen>().is_err());
    }
}
