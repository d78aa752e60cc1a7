//! A bounded run of games: find an opponent, play, offer a rematch, repeat.

use rand::Rng;
use tokio::time;
use tracing::{info, warn};

use crate::board::{BoardActions, BoardObserver, Lobby};
use crate::config::SessionConfig;
use crate::engine::{EngineId, UciEngine};
use crate::error;
use crate::session::{GameOutcome, GameSession};
use crate::suggest::EngineClient;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MatchState {
    Seeking,
    Playing,
    Rematching,
    Done,
}

/// What a run achieved.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct MatchSummary {
    pub games_played: u32,
    /// Outcome of every game, in the order they were played.
    pub outcomes: Vec<GameOutcome>,
    /// The run ended because matchmaking found nobody in time.
    pub seek_timed_out: bool,
}

/// Owns the engine and the board for the length of a run.
pub struct MatchLoop<E, B> {
    config: SessionConfig,
    engine: EngineClient<E>,
    board: B,
    state: MatchState,
}

impl<E, B> MatchLoop<E, B>
where
    E: UciEngine,
    B: BoardObserver + BoardActions + Lobby,
{
    pub fn new(config: SessionConfig, engine: E, board: B) -> Self {
        let engine = EngineClient::new(engine, config.movetime());
        Self {
            config,
            engine,
            board,
            state: MatchState::Seeking,
        }
    }

    pub fn state(&self) -> MatchState {
        self.state
    }

    /// Handshake with the engine and apply the configured options.
    pub async fn initialize(&mut self) -> error::Result<EngineId> {
        self.engine.initialize(self.config.engine_options()).await
    }

    /// Play games until `max_games` is reached or matchmaking times out.
    /// Timeouts change state; only engine and board failures are errors.
    pub async fn run<R: Rng + ?Sized>(&mut self, rng: &mut R) -> error::Result<MatchSummary> {
        let mut summary = MatchSummary::default();
        self.state = MatchState::Seeking;

        loop {
            self.state = match self.state {
                MatchState::Seeking => {
                    let next = self.seek().await?;
                    summary.seek_timed_out = next == MatchState::Done;
                    next
                }
                MatchState::Playing => {
                    let outcome = self.play_one(rng).await?;
                    summary.games_played += 1;
                    info!(game = summary.games_played, %outcome, "game finished");

                    let stalled = matches!(outcome, GameOutcome::Stalled { .. });
                    summary.outcomes.push(outcome);

                    if summary.games_played >= self.config.max_games() {
                        MatchState::Done
                    } else if stalled || self.config.only_one_game_per_opponent() {
                        MatchState::Seeking
                    } else {
                        MatchState::Rematching
                    }
                }
                MatchState::Rematching => self.rematch().await?,
                MatchState::Done => break,
            };
        }

        info!(
            games_played = summary.games_played,
            seek_timed_out = summary.seek_timed_out,
            "match finished"
        );
        Ok(summary)
    }

    /// Quit the engine and hand back the board.
    pub async fn finish(mut self) -> error::Result<B> {
        self.engine.quit().await?;
        Ok(self.board)
    }

    async fn seek(&mut self) -> error::Result<MatchState> {
        info!("seeking a new opponent");
        self.board.seek().await?;

        let timeout = self.config.seek_timeout();
        match time::timeout(timeout, self.board.game_started()).await {
            Ok(started) => {
                started?;
                Ok(MatchState::Playing)
            }
            Err(_) => {
                warn!(timeout_secs = timeout.as_secs(), "no opponent found, ending run");
                Ok(MatchState::Done)
            }
        }
    }

    async fn rematch(&mut self) -> error::Result<MatchState> {
        time::sleep(self.config.rematch_delay()).await;
        info!("offering a rematch");
        self.board.offer_rematch().await?;

        let timeout = self.config.rematch_timeout();
        match time::timeout(timeout, self.board.game_started()).await {
            Ok(started) => {
                started?;
                Ok(MatchState::Playing)
            }
            Err(_) => {
                info!(timeout_secs = timeout.as_secs(), "rematch not accepted");
                Ok(MatchState::Seeking)
            }
        }
    }

    async fn play_one<R: Rng + ?Sized>(&mut self, rng: &mut R) -> error::Result<GameOutcome> {
        time::sleep(self.config.game_start_delay()).await;
        self.engine.new_game().await?;
        let mut session = GameSession::new(&self.config, &mut self.engine, &mut self.board);
        session.play(rng).await
    }
}
