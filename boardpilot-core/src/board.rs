//! The board as the bot sees it: something to look at, something to click,
//! and a lobby to find games in.
//!
//! Implementations live outside this crate. Everything here is phrased in
//! moves, pixel points and plain text, never in terms of a page or renderer.

use async_trait::async_trait;

use crate::coords::Point;
use crate::coretypes::{Color, Move};
use crate::error;

/// Read-only view of the rendered board.
#[async_trait]
pub trait BoardObserver: Send {
    /// Our color, which is also the side drawn at the bottom.
    async fn orientation(&mut self) -> error::Result<Color>;

    /// The most recently highlighted move, if one can be read right now.
    /// A board that is mid animation or not yet drawn yields `None`.
    async fn last_move(&mut self) -> error::Result<Option<Move>>;

    /// Result banner text once the game is over, `None` while it is ongoing.
    async fn result_text(&mut self) -> error::Result<Option<String>>;
}

/// Input into the rendered board.
#[async_trait]
pub trait BoardActions: Send {
    /// Press the cell containing `point`.
    /// A refused press fails with `ErrorKind::ActionRejected`.
    async fn click(&mut self, point: Point) -> error::Result<()>;
}

/// Matchmaking.
#[async_trait]
pub trait Lobby: Send {
    /// Ask for a game against a new opponent.
    async fn seek(&mut self) -> error::Result<()>;

    /// Offer the last opponent another game.
    async fn offer_rematch(&mut self) -> error::Result<()>;

    /// Resolves once a game has begun. It may never resolve; callers bound it
    /// with a timeout.
    async fn game_started(&mut self) -> error::Result<()>;
}
