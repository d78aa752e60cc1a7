//! Run configuration, built once and read everywhere.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rand::Rng;

use crate::coords::{BoardGeometry, DEFAULT_CELL_SIZE};
use crate::error::{self, ErrorKind};

/// An inclusive range of milliseconds from which delays are drawn uniformly.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TimeRange {
    min: u64,
    max: u64,
}

/// Bounds on how long the engine thinks about one move.
pub type MoveTimeRange = TimeRange;

impl TimeRange {
    pub fn from_millis(min: u64, max: u64) -> error::Result<Self> {
        if min > max {
            return Err((ErrorKind::ConfigInvalid, format!("range {min}..={max}ms is empty")).into());
        }
        Ok(Self { min, max })
    }

    /// A range which always yields the same delay.
    pub const fn fixed(millis: u64) -> Self {
        Self {
            min: millis,
            max: millis,
        }
    }

    pub const fn min(&self) -> Duration {
        Duration::from_millis(self.min)
    }

    pub const fn max(&self) -> Duration {
        Duration::from_millis(self.max)
    }

    /// Draw one delay, both bounds included.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        Duration::from_millis(rng.gen_range(self.min..=self.max))
    }
}

/// Immutable configuration of a run. Create one with `SessionConfigBuilder`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SessionConfig {
    engine_path: PathBuf,
    engine_options: Vec<(String, String)>,
    movetime: MoveTimeRange,
    max_games: u32,
    only_one_game_per_opponent: bool,
    geometry: BoardGeometry,
    seek_timeout: Duration,
    rematch_timeout: Duration,
    poll_interval: TimeRange,
    click_delay: TimeRange,
    game_start_delay: Duration,
    rematch_delay: Duration,
}

impl SessionConfig {
    pub fn engine_path(&self) -> &Path {
        &self.engine_path
    }
    /// Options sent with `setoption`, in the order given.
    pub fn engine_options(&self) -> &[(String, String)] {
        &self.engine_options
    }
    pub fn movetime(&self) -> MoveTimeRange {
        self.movetime
    }
    pub fn max_games(&self) -> u32 {
        self.max_games
    }
    pub fn only_one_game_per_opponent(&self) -> bool {
        self.only_one_game_per_opponent
    }
    pub fn geometry(&self) -> BoardGeometry {
        self.geometry
    }
    /// How long to wait for matchmaking before giving up on the run.
    pub fn seek_timeout(&self) -> Duration {
        self.seek_timeout
    }
    /// How long an offered rematch may go unanswered.
    pub fn rematch_timeout(&self) -> Duration {
        self.rematch_timeout
    }
    pub fn poll_interval(&self) -> TimeRange {
        self.poll_interval
    }
    /// Pause between pressing the source and the destination square.
    pub fn click_delay(&self) -> TimeRange {
        self.click_delay
    }
    /// Time given to the board to render before a game is played.
    pub fn game_start_delay(&self) -> Duration {
        self.game_start_delay
    }
    /// Time given to the result dialog before a rematch is offered.
    pub fn rematch_delay(&self) -> Duration {
        self.rematch_delay
    }
}

/// SessionConfigBuilder collects settings and validates them once in `build`.
///
/// Default values:
///
/// * `engine_path`: `stockfish`, looked up on `PATH`
/// * `engine_options`: `Threads = 4`
/// * `movetime`: 100 to 300 milliseconds
/// * `max_games`: 5
/// * `only_one_game_per_opponent`: false
/// * `cell_size`: 64 pixels
/// * `seek_timeout`: 120 seconds
/// * `rematch_timeout`: 22 seconds
/// * `poll_interval`: 40 to 60 milliseconds
/// * `click_delay`: 35 to 60 milliseconds
/// * `game_start_delay`: 250 milliseconds
/// * `rematch_delay`: 1 second
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SessionConfigBuilder {
    engine_path: PathBuf,
    engine_options: Vec<(String, String)>,
    movetime: (u64, u64),
    max_games: u32,
    only_one_game_per_opponent: bool,
    cell_size: u32,
    seek_timeout: Duration,
    rematch_timeout: Duration,
    poll_interval: (u64, u64),
    click_delay: (u64, u64),
    game_start_delay: Duration,
    rematch_delay: Duration,
}

impl Default for SessionConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionConfigBuilder {
    pub fn new() -> Self {
        Self {
            engine_path: PathBuf::from("stockfish"),
            engine_options: vec![("Threads".to_string(), "4".to_string())],
            movetime: (100, 300),
            max_games: 5,
            only_one_game_per_opponent: false,
            cell_size: DEFAULT_CELL_SIZE,
            seek_timeout: Duration::from_secs(120),
            rematch_timeout: Duration::from_secs(22),
            poll_interval: (40, 60),
            click_delay: (35, 60),
            game_start_delay: Duration::from_millis(250),
            rematch_delay: Duration::from_secs(1),
        }
    }

    /// Validate every setting and produce the configuration.
    pub fn build(&self) -> error::Result<SessionConfig> {
        if self.max_games == 0 {
            return Err((ErrorKind::ConfigInvalid, "max games must be positive").into());
        }
        if self.cell_size == 0 {
            return Err((ErrorKind::ConfigInvalid, "cell size must be positive").into());
        }
        if self.engine_options.iter().any(|(name, _)| name.trim().is_empty()) {
            return Err((ErrorKind::ConfigInvalid, "engine option without a name").into());
        }

        Ok(SessionConfig {
            engine_path: self.engine_path.clone(),
            engine_options: self.engine_options.clone(),
            movetime: TimeRange::from_millis(self.movetime.0, self.movetime.1)?,
            max_games: self.max_games,
            only_one_game_per_opponent: self.only_one_game_per_opponent,
            geometry: BoardGeometry::new(self.cell_size),
            seek_timeout: self.seek_timeout,
            rematch_timeout: self.rematch_timeout,
            poll_interval: TimeRange::from_millis(self.poll_interval.0, self.poll_interval.1)?,
            click_delay: TimeRange::from_millis(self.click_delay.0, self.click_delay.1)?,
            game_start_delay: self.game_start_delay,
            rematch_delay: self.rematch_delay,
        })
    }

    pub fn engine_path<P: Into<PathBuf>>(mut self, engine_path: P) -> Self {
        self.engine_path = engine_path.into();
        self
    }

    /// Set an engine option, replacing an earlier value of the same name.
    /// Option names compare case-insensitively, as in uci.
    pub fn engine_option(mut self, name: &str, value: &str) -> Self {
        let name = name.trim();
        match self
            .engine_options
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
        {
            Some(entry) => entry.1 = value.trim().to_string(),
            None => self
                .engine_options
                .push((name.to_string(), value.trim().to_string())),
        }
        self
    }

    pub fn threads(self, threads: u32) -> Self {
        self.engine_option("Threads", &threads.to_string())
    }

    pub fn movetime_millis(mut self, min: u64, max: u64) -> Self {
        self.movetime = (min, max);
        self
    }

    pub fn max_games(mut self, max_games: u32) -> Self {
        self.max_games = max_games;
        self
    }

    pub fn only_one_game_per_opponent(mut self, only_one: bool) -> Self {
        self.only_one_game_per_opponent = only_one;
        self
    }

    pub fn cell_size(mut self, cell_size: u32) -> Self {
        self.cell_size = cell_size;
        self
    }

    pub fn seek_timeout(mut self, seek_timeout: Duration) -> Self {
        self.seek_timeout = seek_timeout;
        self
    }

    pub fn rematch_timeout(mut self, rematch_timeout: Duration) -> Self {
        self.rematch_timeout = rematch_timeout;
        self
    }

    pub fn poll_interval_millis(mut self, min: u64, max: u64) -> Self {
        self.poll_interval = (min, max);
        self
    }

    pub fn click_delay_millis(mut self, min: u64, max: u64) -> Self {
        self.click_delay = (min, max);
        self
    }

    pub fn game_start_delay(mut self, delay: Duration) -> Self {
        self.game_start_delay = delay;
        self
    }

    pub fn rematch_delay(mut self, delay: Duration) -> Self {
        self.rematch_delay = delay;
        self
    }
}
