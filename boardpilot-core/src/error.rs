//! Boardpilot error type.

use std::error;
use std::fmt::{self, Display};
use std::io;
use std::result;

/// Boardpilot generic result type.
pub type Result<T> = result::Result<T, Error>;

/// A list specifying general errors for Boardpilot.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[non_exhaustive]
pub enum ErrorKind {
    /// An argument was expected following a string key, but none was provided.
    UciNoArgument,
    /// Uci failed to parse an integer type.
    UciCannotParseInt,
    /// Uci received an unknown response line from the engine.
    UciUnknownResponse,
    /// Uci received an empty line.
    UciNoResponse,

    /// Square parse string malformed.
    ParseSquareMalformed,
    /// File parse string malformed.
    ParseFileMalformed,
    /// Rank parse string malformed.
    ParseRankMalformed,
    /// Move parse string malformed.
    ParseMoveMalformed,
    /// Fen parse string malformed.
    ParseFenMalformed,

    /// The engine process could not be started, closed its pipes, or stopped answering.
    EngineProcess,
    /// The engine answered, but not with what the protocol requires at that point.
    EngineProtocol,

    /// The board refused a click, usually because something else moved the pieces.
    ActionRejected,
    /// The board bridge closed or sent something unreadable.
    Bridge,

    /// A configuration value is out of its legal range.
    ConfigInvalid,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UciNoArgument => "uci no argument",
            ErrorKind::UciCannotParseInt => "uci cannot parse integer",
            ErrorKind::UciUnknownResponse => "uci unknown response",
            ErrorKind::UciNoResponse => "uci no response",

            ErrorKind::ParseSquareMalformed => "parse square malformed",
            ErrorKind::ParseFileMalformed => "parse file malformed",
            ErrorKind::ParseRankMalformed => "parse rank malformed",
            ErrorKind::ParseMoveMalformed => "parse move malformed",
            ErrorKind::ParseFenMalformed => "parse fen malformed",

            ErrorKind::EngineProcess => "engine process",
            ErrorKind::EngineProtocol => "engine protocol",

            ErrorKind::ActionRejected => "board action rejected",
            ErrorKind::Bridge => "board bridge",

            ErrorKind::ConfigInvalid => "config invalid",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The primary and general error type for Boardpilot.
#[derive(Debug)]
pub enum Error {
    Simple(ErrorKind),
    Message(ErrorKind, String),
    Custom(ErrorKind, Box<dyn error::Error + Send + Sync>),
}

impl Error {
    pub fn new<E>(error_kind: ErrorKind, inner_error: E) -> Self
    where
        E: Into<Box<dyn error::Error + Send + Sync>>,
    {
        Self::Custom(error_kind, inner_error.into())
    }

    /// Returns the kind of this error, regardless of how much context it carries.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Simple(error_kind)
            | Error::Message(error_kind, _)
            | Error::Custom(error_kind, _) => *error_kind,
        }
    }

    /// Wrap an io error from the engine's pipes.
    pub fn engine_io(error: io::Error) -> Self {
        Self::new(ErrorKind::EngineProcess, error)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Simple(error_kind) => {
                write!(f, "{error_kind}")
            }
            Error::Message(error_kind, string) => {
                write!(f, "{error_kind}: {string}")
            }
            Error::Custom(error_kind, ref box_error) => {
                write!(f, "{error_kind}, error: {}", *box_error)
            }
        }
    }
}

impl error::Error for Error {}

impl From<ErrorKind> for Error {
    fn from(error_kind: ErrorKind) -> Self {
        Self::Simple(error_kind)
    }
}

impl<S: ToString> From<(ErrorKind, S)> for Error {
    fn from((error_kind, stringable): (ErrorKind, S)) -> Self {
        Self::Message(error_kind, stringable.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_survives_every_variant() {
        let simple: Error = ErrorKind::EngineProcess.into();
        let message: Error = (ErrorKind::ActionRejected, "piece not found").into();
        let custom = Error::engine_io(io::Error::new(io::ErrorKind::BrokenPipe, "gone"));

        assert_eq!(simple.kind(), ErrorKind::EngineProcess);
        assert_eq!(message.kind(), ErrorKind::ActionRejected);
        assert_eq!(custom.kind(), ErrorKind::EngineProcess);
    }

    #[test]
    fn display_includes_context() {
        let message: Error = (ErrorKind::ConfigInvalid, "max games must be positive").into();
        assert_eq!(
            message.to_string(),
            "config invalid: max games must be positive"
        );
    }
}
