//! Talking to a UCI engine.
//!
//! `UciEngine` is the protocol as the rest of the crate consumes it.
//! `ProcessEngine` implements it over the stdin and stdout of a child process.

use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::time;
use tracing::{debug, trace};

use crate::error::{self, Error, ErrorKind};
use crate::uci::{PositionSpec, SearchControls, SearchReport, UciCommand, UciResponse};

/// How long an engine may take to answer anything beyond the time it was given.
pub const RESPONSE_GRACE: Duration = Duration::from_secs(10);

/// Name and author an engine reports during the handshake.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct EngineId {
    pub name: String,
    pub author: String,
}

/// Request/response protocol of a chess engine.
/// Calls are strictly sequential, one outstanding request at a time.
#[async_trait]
pub trait UciEngine: Send {
    /// `uci` handshake, up to and including `uciok`.
    async fn initialize(&mut self) -> error::Result<EngineId>;
    async fn set_option(&mut self, name: &str, value: &str) -> error::Result<()>;
    /// `isready`, waiting for `readyok`.
    async fn wait_until_ready(&mut self) -> error::Result<()>;
    /// `ucinewgame`. Callers follow it with `wait_until_ready`.
    async fn new_game(&mut self) -> error::Result<()>;
    async fn set_position(&mut self, position: &PositionSpec) -> error::Result<()>;
    /// Search for `movetime` and collect everything reported until `bestmove`.
    async fn search(&mut self, movetime: Duration) -> error::Result<SearchReport>;
    async fn quit(&mut self) -> error::Result<()>;
}

/// An engine running as a child process.
pub struct ProcessEngine {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

impl ProcessEngine {
    /// Start the engine binary at `path`. The process is killed when this is dropped.
    pub fn spawn<P: AsRef<Path>>(path: P) -> error::Result<Self> {
        Self::with_args(path, std::iter::empty::<&OsStr>())
    }

    /// Like `spawn`, passing `args` on the command line.
    pub fn with_args<P, I, S>(path: P, args: I) -> error::Result<Self>
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let path = path.as_ref();
        let mut child = Command::new(path)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| (ErrorKind::EngineProcess, format!("{}: {err}", path.display())))?;

        let stdin = child
            .stdin
            .take()
            .ok_or((ErrorKind::EngineProcess, "engine stdin not captured"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or((ErrorKind::EngineProcess, "engine stdout not captured"))?;

        debug!(path = %path.display(), "engine process started");
        Ok(Self {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
        })
    }

    async fn send(&mut self, command: &UciCommand) -> error::Result<()> {
        let line = format!("{command}\n");
        trace!(target: "boardpilot::uci", "> {}", line.trim_end());
        self.stdin
            .write_all(line.as_bytes())
            .await
            .map_err(Error::engine_io)?;
        self.stdin.flush().await.map_err(Error::engine_io)
    }

    /// Next line the engine recognizably said. Banners and other noise are skipped.
    async fn recv(&mut self) -> error::Result<UciResponse> {
        loop {
            let line = self
                .stdout
                .next_line()
                .await
                .map_err(Error::engine_io)?
                .ok_or((ErrorKind::EngineProcess, "engine closed its output"))?;
            trace!(target: "boardpilot::uci", "< {line}");

            match UciResponse::parse_response(&line) {
                Ok(response) => return Ok(response),
                Err(err) => trace!(%err, "ignoring engine line"),
            }
        }
    }

    /// `recv`, but gives up once `limit` has passed.
    async fn recv_within(&mut self, limit: Duration) -> error::Result<UciResponse> {
        time::timeout(limit, self.recv())
            .await
            .map_err(|_| (ErrorKind::EngineProcess, "engine stopped responding"))?
    }
}

#[async_trait]
impl UciEngine for ProcessEngine {
    async fn initialize(&mut self) -> error::Result<EngineId> {
        self.send(&UciCommand::Uci).await?;

        let mut id = EngineId::default();
        loop {
            match self.recv_within(RESPONSE_GRACE).await? {
                UciResponse::IdName(name) => id.name = name,
                UciResponse::IdAuthor(author) => id.author = author,
                UciResponse::UciOk => return Ok(id),
                other => trace!(?other, "ignoring response before uciok"),
            }
        }
    }

    async fn set_option(&mut self, name: &str, value: &str) -> error::Result<()> {
        let command = UciCommand::SetOption {
            name: name.to_string(),
            value: (!value.is_empty()).then(|| value.to_string()),
        };
        self.send(&command).await
    }

    async fn wait_until_ready(&mut self) -> error::Result<()> {
        self.send(&UciCommand::IsReady).await?;
        loop {
            // Late info lines from an earlier search may still be queued.
            if let UciResponse::ReadyOk = self.recv_within(RESPONSE_GRACE).await? {
                return Ok(());
            }
        }
    }

    async fn new_game(&mut self) -> error::Result<()> {
        self.send(&UciCommand::UciNewGame).await
    }

    async fn set_position(&mut self, position: &PositionSpec) -> error::Result<()> {
        self.send(&UciCommand::Pos(position.clone())).await
    }

    async fn search(&mut self, movetime: Duration) -> error::Result<SearchReport> {
        let millis = u32::try_from(movetime.as_millis())
            .map_err(|err| (ErrorKind::EngineProtocol, err))?;
        self.send(&UciCommand::Go(SearchControls::move_time(millis)))
            .await?;

        let limit = movetime + RESPONSE_GRACE;
        let mut report = SearchReport::default();
        loop {
            match self.recv_within(limit).await? {
                UciResponse::Info(info) => report.infos.push(info),
                UciResponse::BestMove(best_move) => {
                    report.best_move = best_move;
                    return Ok(report);
                }
                other => trace!(?other, "unexpected response during search"),
            }
        }
    }

    async fn quit(&mut self) -> error::Result<()> {
        self.send(&UciCommand::Quit).await?;
        let status = time::timeout(RESPONSE_GRACE, self.child.wait())
            .await
            .map_err(|_| (ErrorKind::EngineProcess, "engine did not exit after quit"))?
            .map_err(Error::engine_io)?;
        debug!(%status, "engine process exited");
        Ok(())
    }
}
