//! One game, from reading the orientation to the result banner.
//!
//! A `GameSession` polls the board, folds opponent moves into its history,
//! and when parity says it is our turn asks the engine for candidates and
//! clicks one of them onto the board.

use std::fmt::{self, Display};

use rand::Rng;
use tokio::time;
use tracing::{debug, info, warn};

use crate::board::{BoardActions, BoardObserver};
use crate::config::SessionConfig;
use crate::coretypes::{Color, Move};
use crate::engine::UciEngine;
use crate::error::{self, ErrorKind};
use crate::history::{canonicalize, MoveHistory};
use crate::suggest::{self, EngineClient};
use crate::uci::PositionSpec;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SessionState {
    Orienting,
    OurTurn,
    OpponentTurn,
    GameOver,
}

/// How a game ended.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum GameOutcome {
    /// The board showed a result, such as `1-0` or `Black wins by resignation`.
    Finished { result: String, plies: usize },
    /// The engine had nothing to play twice in a row.
    Stalled { plies: usize },
}

impl GameOutcome {
    pub fn plies(&self) -> usize {
        match self {
            Self::Finished { plies, .. } | Self::Stalled { plies } => *plies,
        }
    }
}

impl Display for GameOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Finished { result, plies } => write!(f, "{result} after {plies} plies"),
            Self::Stalled { plies } => write!(f, "stalled after {plies} plies"),
        }
    }
}

/// Drives exactly one game. Create a new session for every game.
pub struct GameSession<'a, E, B> {
    config: &'a SessionConfig,
    engine: &'a mut EngineClient<E>,
    board: &'a mut B,
    orientation: Color,
    history: MoveHistory,
    state: SessionState,
}

impl<'a, E, B> GameSession<'a, E, B>
where
    E: UciEngine,
    B: BoardObserver + BoardActions,
{
    pub fn new(config: &'a SessionConfig, engine: &'a mut EngineClient<E>, board: &'a mut B) -> Self {
        Self {
            config,
            engine,
            board,
            orientation: Color::White,
            history: MoveHistory::new(),
            state: SessionState::Orienting,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Our color. Only meaningful once the session has left `Orienting`.
    pub fn orientation(&self) -> Color {
        self.orientation
    }

    pub fn history(&self) -> &MoveHistory {
        &self.history
    }

    /// Play until the board shows a result or the engine runs dry.
    pub async fn play<R: Rng + ?Sized>(&mut self, rng: &mut R) -> error::Result<GameOutcome> {
        self.orientation = self.board.orientation().await?;
        info!(orientation = %self.orientation, "playing the {} pieces", self.orientation);
        self.enter(self.turn_state());

        loop {
            if let Some(result) = self.board.result_text().await? {
                self.enter(SessionState::GameOver);
                let outcome = GameOutcome::Finished {
                    result,
                    plies: self.history.len(),
                };
                info!(%outcome, "game over");
                return Ok(outcome);
            }

            // White moves first. Until it has, any highlight is left over
            // from an earlier game on the same page.
            if !self.opens_game() {
                self.observe().await?;
            }
            self.enter(self.turn_state());

            if self.state == SessionState::OurTurn {
                if let Some(outcome) = self.take_turn(rng).await? {
                    return Ok(outcome);
                }
            }

            time::sleep(self.config.poll_interval().sample(rng)).await;
        }
    }

    fn opens_game(&self) -> bool {
        self.orientation == Color::White && self.history.is_empty()
    }

    fn turn_state(&self) -> SessionState {
        if self.history.is_our_turn(self.orientation) {
            SessionState::OurTurn
        } else {
            SessionState::OpponentTurn
        }
    }

    fn enter(&mut self, state: SessionState) {
        if self.state != state {
            debug!(from = ?self.state, to = ?state, ply = self.history.len(), "session state");
            self.state = state;
        }
    }

    /// Record the highlighted move if it is one we have not seen.
    async fn observe(&mut self) -> error::Result<()> {
        let Some(observed) = self.board.last_move().await? else {
            return Ok(());
        };
        if self.history.is_stale(&observed) {
            return Ok(());
        }

        let move_ = canonicalize(observed);
        self.history.push(move_);
        info!(%move_, ply = self.history.len(), "opponent move observed");
        Ok(())
    }

    /// Search, choose and click one move. Returns an outcome only on a stall.
    async fn take_turn<R: Rng + ?Sized>(&mut self, rng: &mut R) -> error::Result<Option<GameOutcome>> {
        let position = PositionSpec::StartPos(self.history.snapshot());

        let mut candidates = self.engine.suggest(&position, rng).await?;
        if candidates.is_empty() {
            warn!(%position, "engine offered no candidates, searching again");
            candidates = self.engine.suggest(&position, rng).await?;
        }

        let Some(choice) = suggest::select(&candidates, rng) else {
            self.enter(SessionState::GameOver);
            let outcome = GameOutcome::Stalled {
                plies: self.history.len(),
            };
            warn!(%position, "engine stalled, abandoning game");
            return Ok(Some(outcome));
        };

        let move_ = canonicalize(choice.move_);
        let considered: Vec<String> = candidates.iter().map(|c| c.move_.to_string()).collect();
        info!(%move_, depth = choice.depth, candidates = ?considered, "playing move");

        match self.submit(&move_, rng).await {
            Ok(()) => {
                self.history.push(move_);
                self.enter(SessionState::OpponentTurn);
                Ok(None)
            }
            Err(err) if err.kind() == ErrorKind::ActionRejected => {
                warn!(%move_, %err, "board rejected move, will retry");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Click the source square, pause like a person would, click the destination.
    async fn submit<R: Rng + ?Sized>(&mut self, move_: &Move, rng: &mut R) -> error::Result<()> {
        let geometry = self.config.geometry();
        let (src, dst) = geometry.move_to_points(move_, self.orientation);
        debug!(%src, %dst, "clicking move");

        self.board.click(src).await?;
        time::sleep(self.config.click_delay().sample(rng)).await;
        self.board.click(dst).await
    }
}
