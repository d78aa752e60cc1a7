//! Turning engine searches into a set of playable moves, and choosing one.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info};

use crate::config::MoveTimeRange;
use crate::coretypes::{Move, PlyKind};
use crate::engine::{EngineId, UciEngine};
use crate::error;
use crate::uci::{PositionSpec, SearchReport};

/// Info lines must be searched deeper than this to offer a candidate.
pub const MIN_CANDIDATE_DEPTH: PlyKind = 6;

/// A move the engine considered good enough to play.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Candidate {
    pub move_: Move,
    /// Depth of the info line the move was first seen on.
    pub depth: PlyKind,
}

/// First pv move of every sufficiently deep info line, without duplicates,
/// in the order the engine reported them.
pub fn candidates(report: &SearchReport) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = Vec::new();
    for info in &report.infos {
        let Some(depth) = info.depth.filter(|depth| *depth > MIN_CANDIDATE_DEPTH) else {
            continue;
        };
        let Some(move_) = info.first_move() else {
            continue;
        };
        if !candidates.iter().any(|known| known.move_ == move_) {
            candidates.push(Candidate { move_, depth });
        }
    }
    candidates
}

/// Pick one candidate uniformly at random. None only if there are none.
pub fn select<'a, R: Rng + ?Sized>(candidates: &'a [Candidate], rng: &mut R) -> Option<&'a Candidate> {
    candidates.choose(rng)
}

/// Asks an engine for candidate moves, one search at a time.
pub struct EngineClient<E> {
    engine: E,
    movetime: MoveTimeRange,
}

impl<E: UciEngine> EngineClient<E> {
    pub fn new(engine: E, movetime: MoveTimeRange) -> Self {
        Self { engine, movetime }
    }

    /// Handshake, apply `options` in order, then wait until the engine is ready.
    pub async fn initialize(&mut self, options: &[(String, String)]) -> error::Result<EngineId> {
        let id = self.engine.initialize().await?;
        info!(name = %id.name, author = %id.author, "engine initialized");

        for (name, value) in options {
            self.engine.set_option(name, value).await?;
            debug!(%name, %value, "engine option set");
        }
        self.engine.wait_until_ready().await?;
        Ok(id)
    }

    /// Tell the engine a fresh game begins.
    pub async fn new_game(&mut self) -> error::Result<()> {
        self.engine.new_game().await?;
        self.engine.wait_until_ready().await
    }

    /// Search `position` for a randomly drawn movetime and return its candidates.
    /// An empty result is not an error.
    pub async fn suggest<R: Rng + ?Sized>(
        &mut self,
        position: &PositionSpec,
        rng: &mut R,
    ) -> error::Result<Vec<Candidate>> {
        let movetime = self.movetime.sample(rng);
        debug!(%position, movetime_ms = movetime.as_millis() as u64, "searching");

        self.engine.set_position(position).await?;
        let report = self.engine.search(movetime).await?;
        let candidates = candidates(&report);
        debug!(
            infos = report.infos.len(),
            candidates = candidates.len(),
            best_move = ?report.best_move,
            "search finished"
        );
        Ok(candidates)
    }

    pub async fn quit(&mut self) -> error::Result<()> {
        self.engine.quit().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uci::{UciInfo, UciResponse};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn info(line: &str) -> UciInfo {
        let UciResponse::Info(info) = line.parse().unwrap() else {
            panic!("not an info line: {line}");
        };
        info
    }

    fn report(lines: &[&str]) -> SearchReport {
        SearchReport {
            infos: lines.iter().map(|line| info(line)).collect(),
            best_move: None,
        }
    }

    #[test]
    fn only_deep_lines_count() {
        let report = report(&[
            "info depth 5 score cp 20 pv g1f3 d7d5",
            "info depth 6 score cp 22 pv c2c4",
            "info depth 7 score cp 25 pv e2e4 e7e5",
            "info depth 8 seldepth 12 score cp 30 pv d2d4 d7d5",
        ]);
        let moves: Vec<String> = candidates(&report)
            .iter()
            .map(|c| c.move_.to_string())
            .collect();
        assert_eq!(moves, ["e2e4", "d2d4"]);
    }

    #[test]
    fn duplicates_keep_first_depth_and_order() {
        let report = report(&[
            "info depth 9 pv d2d4",
            "info depth 10 pv e2e4",
            "info depth 11 pv d2d4 g8f6",
            "info depth 12 currmove e2e4 currmovenumber 1",
            "info depth 12 string no pv here",
        ]);
        let found = candidates(&report);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].move_.to_string(), "d2d4");
        assert_eq!(found[0].depth, 9);
        assert_eq!(found[1].move_.to_string(), "e2e4");
    }

    #[test]
    fn empty_report_gives_no_candidates() {
        assert!(candidates(&SearchReport::default()).is_empty());
        assert!(candidates(&report(&["info depth 3 pv e2e4"])).is_empty());
    }

    #[test]
    fn select_stays_within_input() {
        let mut rng = StdRng::seed_from_u64(42);
        assert!(select(&[], &mut rng).is_none());

        let single = candidates(&report(&["info depth 7 pv a2a3"]));
        for _ in 0..10 {
            assert_eq!(select(&single, &mut rng), Some(&single[0]));
        }

        let several = candidates(&report(&[
            "info depth 7 pv a2a3",
            "info depth 7 pv b2b3",
            "info depth 7 pv c2c3",
        ]));
        let mut picked = [false; 3];
        for _ in 0..200 {
            let choice = select(&several, &mut rng).unwrap();
            let index = several.iter().position(|c| c == choice).unwrap();
            picked[index] = true;
        }
        assert_eq!(picked, [true; 3]);
    }
}
