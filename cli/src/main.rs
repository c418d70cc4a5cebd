use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::time::Duration;

use canvas::shape::{Shape, ShapeError};
use canvas::sync::SyncClient;
use clap::{Args, Parser, Subcommand};
use futures_util::{SinkExt, StreamExt};
use protocol::{ClientMessage, HistoryResponse, ProtocolError, RoomId, ServerMessage};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

#[cfg(test)]
#[path = "main_test.rs"]
mod main_test;

type WsStream = tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

const ECHO_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("missing token; pass --token or set SKETCH_TOKEN")]
    MissingToken,
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("websocket error: {0}")]
    Ws(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("websocket closed")]
    WsClosed,
    #[error("timed out waiting for the server to echo a shape")]
    Timeout,
    #[error("server returned HTTP {status}: {message}")]
    ServerError { status: u16, message: String },
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Shape(#[from] ShapeError),
    #[error("reading input failed: {0}")]
    Io(#[from] io::Error),
    #[error("nothing to draw; pass --shape or --input")]
    NoShapes,
}

impl From<tokio_tungstenite::tungstenite::Error> for CliError {
    fn from(error: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Ws(Box::new(error))
    }
}

#[derive(Parser, Debug)]
#[command(name = "sketch-cli", about = "Sketchroom history and live room CLI")]
struct Cli {
    #[arg(long, env = "SKETCH_BASE_URL", default_value = "http://127.0.0.1:3000")]
    base_url: String,

    #[arg(long, env = "SKETCH_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone)]
struct CliContext {
    base_url: String,
    token: Option<String>,
}

impl CliContext {
    fn token(&self) -> Result<&str, CliError> {
        self.token.as_deref().filter(|t| !t.trim().is_empty()).ok_or(CliError::MissingToken)
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the server is up.
    Ping,
    /// Print a room's stored events, oldest first.
    History(HistoryArgs),
    /// Replay a room, then print every shape drawn into it until the connection closes.
    Watch(WatchArgs),
    /// Draw shapes into a room.
    Draw(DrawArgs),
}

#[derive(Args, Debug)]
struct HistoryArgs {
    #[arg(long, value_parser = room_arg)]
    room: RoomId,

    #[arg(long)]
    limit: Option<usize>,
}

#[derive(Args, Debug)]
struct WatchArgs {
    #[arg(long, value_parser = room_arg)]
    room: RoomId,

    #[arg(long, help = "History page size for the initial replay")]
    limit: Option<usize>,
}

#[derive(Args, Debug)]
struct DrawArgs {
    #[arg(long, value_parser = room_arg)]
    room: RoomId,

    #[arg(long = "shape", help = "Shape JSON, e.g. {\"type\":\"rect\",\"x\":0,\"y\":0,\"width\":10,\"height\":10}")]
    shapes: Vec<String>,

    #[arg(long, help = "JSONL file of shapes, or - for stdin")]
    input: Option<String>,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    wait_for_echo: bool,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let ctx = CliContext { base_url: cli.base_url, token: cli.token };

    match cli.command {
        Command::Ping => run_ping(&ctx).await,
        Command::History(args) => run_history(&ctx, args).await,
        Command::Watch(args) => run_watch(&ctx, args).await,
        Command::Draw(args) => run_draw(&ctx, args).await,
    }
}

async fn run_ping(ctx: &CliContext) -> Result<(), CliError> {
    let url = format!("{}/healthz", ctx.base_url.trim_end_matches('/'));
    let response = reqwest::get(url).await?;
    let status = response.status();
    if !status.is_success() {
        return Err(CliError::ServerError { status: status.as_u16(), message: "health check failed".to_owned() });
    }
    println!("ok");
    Ok(())
}

async fn run_history(ctx: &CliContext, args: HistoryArgs) -> Result<(), CliError> {
    let history = fetch_history(ctx, args.room, args.limit).await?;
    println!("{}", serde_json::to_string_pretty(&history)?);
    Ok(())
}

async fn run_watch(ctx: &CliContext, args: WatchArgs) -> Result<(), CliError> {
    let mut stream = connect(ctx).await?;
    let mut client = SyncClient::new(args.room);

    let ticket = client.connection_opened();
    send(&mut stream, &client.join_message()).await?;
    client.mark_joined(ticket);

    // Events that arrive before the history are buffered by the client.
    let history = fetch_history(ctx, args.room, args.limit);
    tokio::pin!(history);
    let mut replaying = true;

    loop {
        tokio::select! {
            result = &mut history, if replaying => {
                replaying = false;
                let history = result?;
                client.complete_replay(ticket, &history.messages);
                eprintln!(
                    "room {}: replayed {} records, {} shapes; live",
                    args.room,
                    history.messages.len(),
                    client.shapes().len()
                );
                for shape in client.shapes() {
                    print_shape(shape)?;
                }
            }
            message = stream.next() => {
                let Some(message) = message else {
                    client.connection_lost();
                    return Err(CliError::WsClosed);
                };
                match message? {
                    Message::Text(text) => {
                        let server_message = match protocol::parse_server_message(&text) {
                            Ok(server_message) => server_message,
                            Err(error) => {
                                eprintln!("ignoring malformed server message: {error}");
                                continue;
                            }
                        };
                        let before = client.shapes().len();
                        if client.receive(&server_message) {
                            for shape in &client.shapes()[before..] {
                                print_shape(shape)?;
                            }
                        }
                    }
                    Message::Close(_) => {
                        client.connection_lost();
                        return Err(CliError::WsClosed);
                    }
                    _ => {}
                }
            }
        }
    }
}

async fn run_draw(ctx: &CliContext, args: DrawArgs) -> Result<(), CliError> {
    let mut shapes = args.shapes.iter().map(|raw| parse_shape_line(raw)).collect::<Result<Vec<_>, _>>()?;
    if let Some(input) = &args.input {
        shapes.extend(read_shapes(input)?);
    }
    let shapes: Vec<Shape> = shapes.into_iter().flatten().collect();
    if shapes.is_empty() {
        return Err(CliError::NoShapes);
    }

    let mut stream = connect(ctx).await?;
    let client = SyncClient::new(args.room);
    send(&mut stream, &client.join_message()).await?;

    for shape in &shapes {
        let message = client.chat_message(shape)?;
        send(&mut stream, &message).await?;
        if args.wait_for_echo {
            let ClientMessage::Chat { message: payload, .. } = &message else {
                continue;
            };
            wait_for_echo(&mut stream, args.room, payload).await?;
        }
    }

    send(&mut stream, &client.leave_message()).await?;
    stream.close(None).await?;
    eprintln!("room {}: drew {} shapes", args.room, shapes.len());
    Ok(())
}

// =============================================================================
// TRANSPORT
// =============================================================================

async fn connect(ctx: &CliContext) -> Result<WsStream, CliError> {
    let url = ws_url(&ctx.base_url, ctx.token()?)?;
    let (stream, _) = connect_async(url).await?;
    Ok(stream)
}

async fn send(stream: &mut WsStream, message: &ClientMessage) -> Result<(), CliError> {
    let text = protocol::to_text(message)?;
    stream.send(Message::Text(text.into())).await?;
    Ok(())
}

/// Wait until the server relays `payload` back on `room`. The relay happens
/// only after the store append succeeded.
async fn wait_for_echo(stream: &mut WsStream, room: RoomId, payload: &str) -> Result<(), CliError> {
    let fut = async {
        loop {
            let Some(message) = stream.next().await else {
                return Err(CliError::WsClosed);
            };
            match message? {
                Message::Text(text) => {
                    if let Ok(ServerMessage::Chat(event)) = protocol::parse_server_message(&text) {
                        if event.room_id == room && event.message == payload {
                            return Ok(());
                        }
                    }
                }
                Message::Close(_) => return Err(CliError::WsClosed),
                _ => {}
            }
        }
    };

    tokio::time::timeout(ECHO_TIMEOUT, fut).await.map_err(|_| CliError::Timeout)?
}

async fn fetch_history(ctx: &CliContext, room: RoomId, limit: Option<usize>) -> Result<HistoryResponse, CliError> {
    let token = ctx.token()?;
    let url = format!("{}/api/rooms/{room}/events", ctx.base_url.trim_end_matches('/'));

    let request = reqwest::Client::new().get(url).bearer_auth(token);
    let request = match limit {
        Some(limit) => request.query(&[("limit", limit)]),
        None => request,
    };

    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(CliError::ServerError { status: status.as_u16(), message });
    }
    Ok(response.json::<HistoryResponse>().await?)
}

fn ws_url(base_url: &str, token: &str) -> Result<String, CliError> {
    let invalid = || CliError::InvalidBaseUrl(base_url.to_owned());
    let mut url = reqwest::Url::parse(base_url).map_err(|_| invalid())?;
    let scheme = match url.scheme() {
        "http" => "ws",
        "https" => "wss",
        _ => return Err(invalid()),
    };
    url.set_scheme(scheme).map_err(|()| invalid())?;

    let path = format!("{}/api/ws", url.path().trim_end_matches('/'));
    url.set_path(&path);
    url.query_pairs_mut().clear().append_pair("token", token);
    Ok(url.into())
}

// =============================================================================
// INPUT / OUTPUT
// =============================================================================

fn room_arg(raw: &str) -> Result<RoomId, String> {
    protocol::parse_room_id(raw).ok_or_else(|| format!("room id must be a positive integer, got {raw:?}"))
}

fn read_shapes(input: &str) -> Result<Vec<Option<Shape>>, CliError> {
    let reader: Box<dyn BufRead> =
        if input == "-" { Box::new(BufReader::new(io::stdin())) } else { Box::new(BufReader::new(File::open(input)?)) };

    let mut shapes = Vec::new();
    for line in reader.lines() {
        shapes.push(parse_shape_line(&line?)?);
    }
    Ok(shapes)
}

/// Parse one shape from a JSONL line. Blank lines yield `None`. A line may hold
/// a bare shape or a `{"shape": ...}` envelope.
fn parse_shape_line(line: &str) -> Result<Option<Shape>, CliError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if let Ok(shape) = canvas::shape::decode_payload(trimmed) {
        return Ok(Some(shape));
    }
    Ok(Some(serde_json::from_str::<Shape>(trimmed)?))
}

fn print_shape(shape: &Shape) -> Result<(), CliError> {
    println!("{}", serde_json::to_string(shape)?);
    Ok(())
}
