pub mod board;
pub mod config;
pub mod coords;
pub mod coretypes;
pub mod engine;
pub mod error;
pub mod fen;
pub mod history;
pub mod match_loop;
pub mod session;
pub mod suggest;
pub mod uci;

pub use board::{BoardActions, BoardObserver, Lobby};
pub use config::{SessionConfig, SessionConfigBuilder};
pub use coords::{BoardGeometry, Point};
pub use coretypes::{Color, Move, Square};
pub use engine::{ProcessEngine, UciEngine};
pub use error::{Error, ErrorKind};
pub use history::MoveHistory;
pub use match_loop::{MatchLoop, MatchSummary};
pub use session::{GameOutcome, GameSession};
pub use suggest::{Candidate, EngineClient};
