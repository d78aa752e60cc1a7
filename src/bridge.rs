//! Board adapter speaking JSON lines with the host process that owns the browser.
//!
//! Every request is one object with an increasing `id` and an `op`. The host
//! answers each with one object echoing the `id`. A reply whose `id` does not
//! match the outstanding request answers a request we stopped waiting for,
//! and is dropped.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tracing::{debug, trace};

use boardpilot_core::coords::{BoardGeometry, Point};
use boardpilot_core::coretypes::{Color, Move};
use boardpilot_core::error::{self, Error, ErrorKind};
use boardpilot_core::{BoardActions, BoardObserver, Lobby};

#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Op {
    Orientation,
    LastMove,
    Result,
    Click { x: u32, y: u32 },
    Seek,
    Rematch,
    AwaitGame,
}

#[derive(Debug, Serialize)]
struct Request {
    id: u64,
    #[serde(flatten)]
    op: Op,
}

/// Union of every reply shape. Fields an op does not use are absent.
#[derive(Debug, Deserialize)]
struct Reply {
    id: u64,
    white: Option<bool>,
    squares: Option<[[u32; 2]; 2]>,
    text: Option<String>,
    ok: Option<bool>,
    error: Option<String>,
}

fn bridge_error<E>(err: E) -> Error
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    Error::new(ErrorKind::Bridge, err)
}

pub struct StdioBridge<R, W> {
    reader: Lines<BufReader<R>>,
    writer: W,
    next_id: u64,
    geometry: BoardGeometry,
    orientation: Option<Color>,
}

impl<R, W> StdioBridge<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W, geometry: BoardGeometry) -> Self {
        Self {
            reader: BufReader::new(reader).lines(),
            writer,
            next_id: 0,
            geometry,
            orientation: None,
        }
    }

    async fn request(&mut self, op: Op) -> error::Result<Reply> {
        self.next_id += 1;
        let id = self.next_id;

        let mut line = serde_json::to_string(&Request { id, op }).map_err(bridge_error)?;
        trace!(target: "boardpilot::bridge", "> {line}");
        line.push('\n');
        self.writer
            .write_all(line.as_bytes())
            .await
            .map_err(bridge_error)?;
        self.writer.flush().await.map_err(bridge_error)?;

        loop {
            let line = self
                .reader
                .next_line()
                .await
                .map_err(bridge_error)?
                .ok_or((ErrorKind::Bridge, "host closed the bridge"))?;
            trace!(target: "boardpilot::bridge", "< {line}");

            let reply: Reply = serde_json::from_str(&line).map_err(bridge_error)?;
            if reply.id == id {
                return Ok(reply);
            }
            debug!(expected = id, received = reply.id, "dropping stale reply");
        }
    }

    async fn expect_ok(&mut self, op: Op) -> error::Result<()> {
        let reply = self.request(op).await?;
        match reply.ok {
            Some(true) => Ok(()),
            _ => Err((
                ErrorKind::Bridge,
                reply.error.unwrap_or_else(|| format!("request {} refused", reply.id)),
            )
                .into()),
        }
    }
}

#[async_trait]
impl<R, W> BoardObserver for StdioBridge<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn orientation(&mut self) -> error::Result<Color> {
        let reply = self.request(Op::Orientation).await?;
        let white = reply
            .white
            .ok_or((ErrorKind::Bridge, "orientation reply without `white`"))?;
        let color = if white { Color::White } else { Color::Black };
        self.orientation = Some(color);
        Ok(color)
    }

    async fn last_move(&mut self) -> error::Result<Option<Move>> {
        let orientation = match self.orientation {
            Some(color) => color,
            None => self.orientation().await?,
        };

        let reply = self.request(Op::LastMove).await?;
        let Some([[src_x, src_y], [dst_x, dst_y]]) = reply.squares else {
            return Ok(None);
        };
        let src = Point::new(src_x, src_y);
        let dst = Point::new(dst_x, dst_y);

        let observed = self.geometry.move_from_points(src, dst, orientation);
        if observed.is_none() {
            debug!(%src, %dst, "highlight outside the board");
        }
        Ok(observed)
    }

    async fn result_text(&mut self) -> error::Result<Option<String>> {
        let reply = self.request(Op::Result).await?;
        Ok(reply.text.filter(|text| !text.trim().is_empty()))
    }
}

#[async_trait]
impl<R, W> BoardActions for StdioBridge<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn click(&mut self, point: Point) -> error::Result<()> {
        let reply = self
            .request(Op::Click {
                x: point.x,
                y: point.y,
            })
            .await?;
        match reply.ok {
            Some(true) => Ok(()),
            Some(false) => Err((
                ErrorKind::ActionRejected,
                reply.error.unwrap_or_else(|| point.to_string()),
            )
                .into()),
            None => Err((ErrorKind::Bridge, "click reply without `ok`").into()),
        }
    }
}

#[async_trait]
impl<R, W> Lobby for StdioBridge<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn seek(&mut self) -> error::Result<()> {
        self.expect_ok(Op::Seek).await
    }

    async fn offer_rematch(&mut self) -> error::Result<()> {
        self.expect_ok(Op::Rematch).await
    }

    async fn game_started(&mut self) -> error::Result<()> {
        self.expect_ok(Op::AwaitGame).await?;
        // The next game may be played with the other color.
        self.orientation = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tokio::io::{duplex, DuplexStream};

    type TestBridge = StdioBridge<DuplexStream, DuplexStream>;

    /// A bridge wired to a host task answering every request with `answer`.
    /// `answer` returns the replies to write, ids included.
    fn bridge_with_host<F>(answer: F) -> TestBridge
    where
        F: Fn(&Value) -> Vec<Value> + Send + 'static,
    {
        let (bot_out, host_in) = duplex(4096);
        let (mut host_out, bot_in) = duplex(4096);

        tokio::spawn(async move {
            let mut requests = BufReader::new(host_in).lines();
            while let Ok(Some(line)) = requests.next_line().await {
                let request: Value = serde_json::from_str(&line).unwrap();
                for reply in answer(&request) {
                    let mut text = reply.to_string();
                    text.push('\n');
                    if host_out.write_all(text.as_bytes()).await.is_err() {
                        return;
                    }
                }
            }
        });

        StdioBridge::new(bot_in, bot_out, BoardGeometry::default())
    }

    fn reply(request: &Value, mut fields: Value) -> Value {
        fields["id"] = request["id"].clone();
        fields
    }

    #[tokio::test]
    async fn decodes_highlight_in_black_orientation() {
        let mut bridge = bridge_with_host(|request| {
            let fields = match request["op"].as_str().unwrap() {
                "orientation" => json!({"white": false}),
                "last_move" => json!({"squares": [[192, 448], [448, 448]]}),
                op => panic!("unexpected op {op}"),
            };
            vec![reply(request, fields)]
        });

        assert_eq!(bridge.orientation().await.unwrap(), Color::Black);
        let observed = bridge.last_move().await.unwrap().unwrap();
        assert_eq!(observed.to_string(), "e8a8");
    }

    #[tokio::test]
    async fn missing_and_off_board_highlights_are_none() {
        let mut bridge = bridge_with_host(|request| {
            let fields = match request["op"].as_str().unwrap() {
                "orientation" => json!({"white": true}),
                "last_move" if request["id"] == 2 => json!({"squares": null}),
                "last_move" => json!({"squares": [[0, 0], [512, 0]]}),
                "result" => json!({"text": ""}),
                op => panic!("unexpected op {op}"),
            };
            vec![reply(request, fields)]
        });

        assert_eq!(bridge.last_move().await.unwrap(), None);
        assert_eq!(bridge.last_move().await.unwrap(), None);
        assert_eq!(bridge.result_text().await.unwrap(), None);
    }

    #[tokio::test]
    async fn click_sends_point_and_maps_refusal() {
        let mut bridge = bridge_with_host(|request| {
            assert_eq!(request["op"], "click");
            let fields = if request["x"] == 256 && request["y"] == 384 {
                json!({"ok": true})
            } else {
                json!({"ok": false, "error": "no piece there"})
            };
            vec![reply(request, fields)]
        });

        bridge.click(Point::new(256, 384)).await.unwrap();
        let err = bridge.click(Point::new(0, 0)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ActionRejected);
        assert!(err.to_string().contains("no piece there"));
    }

    #[tokio::test]
    async fn stale_replies_are_dropped() {
        let mut bridge = bridge_with_host(|request| {
            let id = request["id"].as_u64().unwrap();
            vec![
                json!({"id": id.saturating_sub(1), "ok": true}),
                reply(request, json!({"text": "1/2-1/2"})),
            ]
        });

        assert_eq!(
            bridge.result_text().await.unwrap().as_deref(),
            Some("1/2-1/2")
        );
    }

    #[tokio::test]
    async fn lobby_ops_and_closed_host() {
        let mut bridge = bridge_with_host(|request| match request["op"].as_str().unwrap() {
            "seek" | "await_game" => vec![reply(request, json!({"ok": true}))],
            _ => vec![],
        });

        bridge.seek().await.unwrap();
        bridge.game_started().await.unwrap();

        // A host that hung up before answering.
        let (bot_out, host_in) = duplex(64);
        let (host_out, bot_in) = duplex(64);
        drop(host_out);
        let mut orphan = StdioBridge::new(bot_in, bot_out, BoardGeometry::default());
        let err = orphan.offer_rematch().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Bridge);
        drop(host_in);
    }

    #[test]
    fn request_shape() {
        let click = Request {
            id: 7,
            op: Op::Click { x: 64, y: 128 },
        };
        assert_eq!(
            serde_json::to_value(&click).unwrap(),
            json!({"id": 7, "op": "click", "x": 64, "y": 128})
        );
        let await_game = Request {
            id: 8,
            op: Op::AwaitGame,
        };
        assert_eq!(
            serde_json::to_string(&await_game).unwrap(),
            r#"{"id":8,"op":"await_game"}"#
        );
    }
}
