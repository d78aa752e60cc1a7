//! Universal Chess Interface, seen from the GUI side.
//!
//! `UciCommand` is what we send to an engine and `UciResponse` is what we
//! read back from it.

use std::fmt::{self, Display};
use std::str::{FromStr, SplitWhitespace};

use arrayvec::ArrayVec;

use crate::coretypes::{Move, PlyKind, MAX_LINE_LEN};
use crate::error::{self, ErrorKind};
use crate::fen::Fen;

/// Line is a sequence of moves reported by an engine, usually a principal variation.
pub type Line = ArrayVec<Move, MAX_LINE_LEN>;

/// Position to search, either replayed from the start or from an explicit board.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum PositionSpec {
    StartPos(Vec<Move>),
    Fen(Fen, Vec<Move>),
}

impl PositionSpec {
    /// Moves applied on top of the base position.
    pub fn moves(&self) -> &[Move] {
        match self {
            Self::StartPos(moves) | Self::Fen(_, moves) => moves,
        }
    }
}

/// `startpos moves e2e4 e7e5` or `fen <fen> moves ...`
impl Display for PositionSpec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::StartPos(_) => f.write_str("startpos")?,
            Self::Fen(fen, _) => write!(f, "fen {fen}")?,
        }
        let moves = self.moves();
        if !moves.is_empty() {
            f.write_str(" moves")?;
            for move_ in moves {
                write!(f, " {move_}")?;
            }
        }
        Ok(())
    }
}

/// Limits of one `go`. Searches are only ever bounded by time.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct SearchControls {
    pub move_time: u32,
}

impl SearchControls {
    /// Search for exactly `millis` milliseconds.
    pub fn move_time(millis: u32) -> Self {
        Self { move_time: millis }
    }
}

impl Display for SearchControls {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "go movetime {}", self.move_time)
    }
}

/// Commands from this program to an external chess engine.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum UciCommand {
    Uci,
    IsReady,
    SetOption { name: String, value: Option<String> },
    UciNewGame,
    Pos(PositionSpec),
    Go(SearchControls),
    Quit,
}

/// Exactly one protocol line, without the trailing newline.
impl Display for UciCommand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Uci => f.write_str("uci"),
            Self::IsReady => f.write_str("isready"),
            Self::SetOption { name, value } => {
                write!(f, "setoption name {name}")?;
                if let Some(value) = value {
                    write!(f, " value {value}")?;
                }
                Ok(())
            }
            Self::UciNewGame => f.write_str("ucinewgame"),
            Self::Pos(position) => write!(f, "position {position}"),
            Self::Go(controls) => controls.fmt(f),
            Self::Quit => f.write_str("quit"),
        }
    }
}

/// Engine evaluation attached to an info line.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Score {
    /// Centipawns from the engine's point of view.
    Cp(i32),
    /// Mate in this many moves, negative if the engine is getting mated.
    Mate(i32),
}

/// Parsed `info` line. Every field an engine may leave out is optional.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct UciInfo {
    pub depth: Option<PlyKind>,
    pub seldepth: Option<PlyKind>,
    pub multipv: Option<u32>,
    pub score: Option<Score>,
    pub nodes: Option<u64>,
    pub time: Option<u64>,
    pub pv: Line,
    pub string: Option<String>,
}

impl UciInfo {
    /// First move of the principal variation, if one was reported.
    pub fn first_move(&self) -> Option<Move> {
        self.pv.first().copied()
    }

    /// Parse the tokens following `info`.
    fn parse(mut input: SplitWhitespace) -> error::Result<Self> {
        let mut info = UciInfo::default();

        while let Some(token) = input.next() {
            match token {
                "depth" => info.depth = Some(Self::parse_arg(&mut input)?),
                "seldepth" => info.seldepth = Some(Self::parse_arg(&mut input)?),
                "multipv" => info.multipv = Some(Self::parse_arg(&mut input)?),
                "nodes" => info.nodes = Some(Self::parse_arg(&mut input)?),
                "time" => info.time = Some(Self::parse_arg(&mut input)?),
                "score" => {
                    let kind = input.next().ok_or(ErrorKind::UciNoArgument)?;
                    let value: i32 = Self::parse_arg(&mut input)?;
                    info.score = match kind {
                        "cp" => Some(Score::Cp(value)),
                        "mate" => Some(Score::Mate(value)),
                        _ => return Err((ErrorKind::UciUnknownResponse, kind).into()),
                    };
                }
                // Bound markers carry no argument.
                "lowerbound" | "upperbound" => {}
                // Single argument fields nothing here cares about.
                "nps" | "hashfull" | "tbhits" | "sbhits" | "cpuload" | "currmove"
                | "currmovenumber" => {
                    input.next().ok_or(ErrorKind::UciNoArgument)?;
                }
                // pv and string consume the rest of the line.
                "pv" => {
                    for move_str in input.by_ref() {
                        let move_ = Move::from_str(move_str)?;
                        if info.pv.try_push(move_).is_err() {
                            break;
                        }
                    }
                    break;
                }
                "string" => {
                    info.string = Some(input.by_ref().collect::<Vec<_>>().join(" "));
                    break;
                }
                // Unknown fields (wdl, refutation, currline, ...) and their
                // arguments are skipped one token at a time.
                _ => {}
            }
        }

        Ok(info)
    }

    fn parse_arg<T: FromStr>(input: &mut SplitWhitespace) -> error::Result<T>
    where
        T::Err: ToString,
    {
        let arg = input.next().ok_or(ErrorKind::UciNoArgument)?;
        Ok(arg
            .parse::<T>()
            .map_err(|err| (ErrorKind::UciCannotParseInt, err))?)
    }
}

/// Engine to external program communication.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum UciResponse {
    IdName(String),
    IdAuthor(String),
    UciOk,
    ReadyOk,
    /// An `option` advertisement, kept as the raw text after `option`.
    Opt(String),
    /// `bestmove (none)` is reported as None.
    BestMove(Option<Move>),
    Info(UciInfo),
}

impl UciResponse {
    /// Parse a single engine output line into a UciResponse if possible.
    pub fn parse_response(input_str: &str) -> error::Result<Self> {
        let mut input = input_str.split_whitespace();
        let head = input.next().ok_or(ErrorKind::UciNoResponse)?;

        match head {
            "id" => Self::parse_id(input),
            "uciok" => Ok(Self::UciOk),
            "readyok" => Ok(Self::ReadyOk),
            "option" => Ok(Self::Opt(input.collect::<Vec<_>>().join(" "))),
            "bestmove" => Self::parse_best_move(input),
            "info" => UciInfo::parse(input).map(Self::Info),
            _ => Err((ErrorKind::UciUnknownResponse, head).into()),
        }
    }

    /// command: `id [name | author] text...`
    fn parse_id(mut input: SplitWhitespace) -> error::Result<Self> {
        let key = input.next().ok_or(ErrorKind::UciNoArgument)?;
        let text = input.collect::<Vec<_>>().join(" ");
        match key {
            "name" => Ok(Self::IdName(text)),
            "author" => Ok(Self::IdAuthor(text)),
            _ => Err((ErrorKind::UciUnknownResponse, key).into()),
        }
    }

    /// command: `bestmove move (ponder move)`
    fn parse_best_move(mut input: SplitWhitespace) -> error::Result<Self> {
        let move_str = input.next().ok_or(ErrorKind::UciNoArgument)?;
        match move_str {
            "(none)" | "0000" => Ok(Self::BestMove(None)),
            _ => Move::from_str(move_str).map(|move_| Self::BestMove(Some(move_))),
        }
    }
}

impl FromStr for UciResponse {
    type Err = error::Error;
    fn from_str(s: &str) -> error::Result<Self> {
        Self::parse_response(s)
    }
}

/// Everything an engine said between `go` and `bestmove`.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct SearchReport {
    pub infos: Vec<UciInfo>,
    pub best_move: Option<Move>,
}
