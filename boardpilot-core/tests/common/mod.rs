//! Scripted stand-ins for the engine and the board.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;

use boardpilot_core::board::{BoardActions, BoardObserver, Lobby};
use boardpilot_core::coords::{BoardGeometry, Point};
use boardpilot_core::coretypes::{Color, Move};
use boardpilot_core::engine::{EngineId, UciEngine};
use boardpilot_core::error::{self, ErrorKind};
use boardpilot_core::uci::{PositionSpec, SearchReport, UciResponse};
use boardpilot_core::{SessionConfig, SessionConfigBuilder};

pub fn mv(s: &str) -> Move {
    s.parse().unwrap()
}

pub fn rng() -> StdRng {
    StdRng::seed_from_u64(0xB0A2D)
}

pub fn config() -> SessionConfig {
    SessionConfigBuilder::new().build().unwrap()
}

/// Search report made of `info` lines.
pub fn report(lines: &[&str]) -> SearchReport {
    let infos = lines
        .iter()
        .map(|line| match line.parse::<UciResponse>().unwrap() {
            UciResponse::Info(info) => info,
            other => panic!("not an info line: {other:?}"),
        })
        .collect();
    SearchReport {
        infos,
        best_move: None,
    }
}

/// Everything the engine was asked, shared with the test after the engine moved away.
#[derive(Debug, Default)]
pub struct EngineLog {
    pub options: Vec<(String, String)>,
    pub positions: Vec<PositionSpec>,
    pub movetimes: Vec<Duration>,
    pub new_games: usize,
    pub quit: bool,
}

/// Answers searches from a queue of reports, then repeats a fallback report.
pub struct ScriptedEngine {
    queued: VecDeque<SearchReport>,
    fallback: SearchReport,
    /// Searches answered before the engine process "dies".
    crash_after: Option<usize>,
    position: Option<PositionSpec>,
    log: Arc<Mutex<EngineLog>>,
}

impl ScriptedEngine {
    pub fn new(fallback: &[&str]) -> Self {
        Self {
            queued: VecDeque::new(),
            fallback: report(fallback),
            crash_after: None,
            position: None,
            log: Arc::default(),
        }
    }

    /// Queue a report to be used before the fallback.
    pub fn then(mut self, lines: &[&str]) -> Self {
        self.queued.push_back(report(lines));
        self
    }

    /// Answer `searches` searches, then fail every later one like a dead process.
    pub fn crash_after(mut self, searches: usize) -> Self {
        self.crash_after = Some(searches);
        self
    }

    pub fn log(&self) -> Arc<Mutex<EngineLog>> {
        Arc::clone(&self.log)
    }
}

#[async_trait]
impl UciEngine for ScriptedEngine {
    async fn initialize(&mut self) -> error::Result<EngineId> {
        Ok(EngineId {
            name: "Scripted".to_string(),
            author: "boardpilot tests".to_string(),
        })
    }

    async fn set_option(&mut self, name: &str, value: &str) -> error::Result<()> {
        let mut log = self.log.lock().unwrap();
        log.options.push((name.to_string(), value.to_string()));
        Ok(())
    }

    async fn wait_until_ready(&mut self) -> error::Result<()> {
        Ok(())
    }

    async fn new_game(&mut self) -> error::Result<()> {
        self.log.lock().unwrap().new_games += 1;
        Ok(())
    }

    async fn set_position(&mut self, position: &PositionSpec) -> error::Result<()> {
        self.position = Some(position.clone());
        Ok(())
    }

    async fn search(&mut self, movetime: Duration) -> error::Result<SearchReport> {
        let position = self
            .position
            .take()
            .ok_or((ErrorKind::EngineProtocol, "go without position"))?;
        match self.crash_after.as_mut() {
            Some(0) => return Err((ErrorKind::EngineProcess, "engine closed its output").into()),
            Some(remaining) => *remaining -= 1,
            None => {}
        }
        let mut log = self.log.lock().unwrap();
        log.positions.push(position);
        log.movetimes.push(movetime);
        Ok(self
            .queued
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone()))
    }

    async fn quit(&mut self) -> error::Result<()> {
        self.log.lock().unwrap().quit = true;
        Ok(())
    }
}

/// How one game on the scripted board unfolds.
#[derive(Debug, Clone)]
pub struct GameScript {
    pub orientation: Color,
    /// Highlight already on the board when the game is first observed.
    pub highlight: Option<(Point, Point)>,
    /// Opponent answers, one per move we play.
    pub replies: VecDeque<Move>,
    /// Banner shown once we play a move nobody answers.
    pub result: String,
    /// Show the banner before anything is played.
    pub already_over: bool,
}

impl GameScript {
    pub fn new(orientation: Color) -> Self {
        Self {
            orientation,
            highlight: None,
            replies: VecDeque::new(),
            result: "1-0".to_string(),
            already_over: false,
        }
    }

    pub fn replies(mut self, replies: &[&str]) -> Self {
        self.replies = replies.iter().map(|s| mv(s)).collect();
        self
    }

    pub fn highlight(mut self, src: Point, dst: Point) -> Self {
        self.highlight = Some((src, dst));
        self
    }

    pub fn result(mut self, result: &str) -> Self {
        self.result = result.to_string();
        self
    }

    pub fn already_over(mut self) -> Self {
        self.already_over = true;
        self
    }
}

/// A board that decodes clicks the way a renderer would and answers from a script.
pub struct ScriptedBoard {
    geometry: BoardGeometry,
    template: GameScript,
    game: GameScript,
    highlight: Option<(Point, Point)>,
    pending_reply: Option<Move>,
    pressed: Option<Point>,
    finished: bool,

    /// Clicks to refuse before accepting any.
    pub reject_clicks: usize,
    /// Answers to `game_started`, in order. `false` or running out waits forever.
    pub starts: VecDeque<bool>,

    pub clicks: Vec<Point>,
    pub played: Vec<Move>,
    pub seeks: usize,
    pub rematches: usize,
    pub games_started: usize,
}

impl ScriptedBoard {
    pub fn new(game: GameScript) -> Self {
        Self {
            geometry: BoardGeometry::default(),
            highlight: game.highlight,
            finished: game.already_over,
            template: game.clone(),
            game,
            pending_reply: None,
            pressed: None,
            reject_clicks: 0,
            starts: VecDeque::new(),
            clicks: Vec::new(),
            played: Vec::new(),
            seeks: 0,
            rematches: 0,
            games_started: 0,
        }
    }

    pub fn starts(mut self, starts: &[bool]) -> Self {
        self.starts = starts.iter().copied().collect();
        self
    }

    fn reset(&mut self) {
        self.game = self.template.clone();
        self.highlight = self.game.highlight;
        self.finished = self.game.already_over;
        self.pending_reply = None;
        self.pressed = None;
    }

    fn moved(&mut self, src: Point, dst: Point) {
        let orientation = self.game.orientation;
        let move_ = self
            .geometry
            .move_from_points(src, dst, orientation)
            .expect("click landed off the board");
        self.played.push(move_);
        self.highlight = Some((src, dst));

        match self.game.replies.pop_front() {
            Some(reply) => self.pending_reply = Some(reply),
            None => self.finished = true,
        }
    }
}

#[async_trait]
impl BoardObserver for ScriptedBoard {
    async fn orientation(&mut self) -> error::Result<Color> {
        Ok(self.game.orientation)
    }

    /// Our own move stays highlighted for one poll before the reply lands.
    async fn last_move(&mut self) -> error::Result<Option<Move>> {
        let shown = self
            .highlight
            .and_then(|(src, dst)| self.geometry.move_from_points(src, dst, self.game.orientation));

        if let Some(reply) = self.pending_reply.take() {
            self.highlight = Some(self.geometry.move_to_points(&reply, self.game.orientation));
        }
        Ok(shown)
    }

    async fn result_text(&mut self) -> error::Result<Option<String>> {
        Ok(self.finished.then(|| self.game.result.clone()))
    }
}

#[async_trait]
impl BoardActions for ScriptedBoard {
    async fn click(&mut self, point: Point) -> error::Result<()> {
        if self.reject_clicks > 0 {
            self.reject_clicks -= 1;
            self.pressed = None;
            return Err((ErrorKind::ActionRejected, "piece is not movable").into());
        }

        self.clicks.push(point);
        match self.pressed.take() {
            None => self.pressed = Some(point),
            Some(src) => self.moved(src, point),
        }
        Ok(())
    }
}

#[async_trait]
impl Lobby for ScriptedBoard {
    async fn seek(&mut self) -> error::Result<()> {
        self.seeks += 1;
        Ok(())
    }

    async fn offer_rematch(&mut self) -> error::Result<()> {
        self.rematches += 1;
        Ok(())
    }

    async fn game_started(&mut self) -> error::Result<()> {
        if self.starts.pop_front() == Some(true) {
            self.games_started += 1;
            self.reset();
            return Ok(());
        }
        std::future::pending().await
    }
}
