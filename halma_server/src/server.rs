// TCP front end: lobby commands and per-connection plumbing.
//
// Architecture: thread-per-reader, serving many sessions at once.
//
// - **Listener thread** (`TcpListener::accept()` loop, non-blocking so it can
//   notice `keep_running`): spawns one connection thread per accepted socket.
// - **Connection thread**: performs the `Hello` handshake, then reads framed
//   `ClientMessage`s in a loop. Lobby commands (`ListGames`, `CreateGame`,
//   `JoinGame`, `AddBot`, `LeaveGame`) are answered directly through the
//   `SessionRegistry` / `GameHandler`; `Gameplay` requests are handed to the
//   connection's session with `GameHandler::submit`. A frame whose JSON does
//   not decode (unknown request kinds included) is logged and dropped. On
//   `Goodbye`, EOF, a read error or an oversized frame, the client is removed
//   from its session.
// - **Writer thread** (one per connection): drains the connection's outbound
//   channel. `RemoteClient::send` pushes into that channel, so match workers
//   and other connections never block on this socket. When the reader is done
//   the writer flushes what is queued and closes the socket.
//
// Write errors are not reported anywhere: the reader side of the same socket
// sees the failure and runs the normal disconnect path.
//
// Shutdown: `ServerHandle::stop` clears `keep_running`, joins the listener,
// and aborts every live session.

use std::io::{BufReader, BufWriter};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use halma_protocol::framing::read_frame;
use halma_protocol::{
    ClientInfo, ClientMessage, GameType, PROTOCOL_VERSION, ProtocolError, ServerMessage,
    SessionId, recv, send,
};
use log::{debug, info, warn};

use crate::config::{MatchOptions, ServerConfig};
use crate::error::SessionError;
use crate::game_handler::GameHandler;
use crate::participant::RemoteClient;
use crate::registry::SessionRegistry;

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);
const ACCEPT_POLL: Duration = Duration::from_millis(50);
const WRITER_POLL: Duration = Duration::from_millis(100);

/// Handle returned by `start_server` to control the running server.
pub struct ServerHandle {
    keep_running: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
    registry: Arc<SessionRegistry>,
}

impl ServerHandle {
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Stop accepting, wait for the listener and abort every live session.
    pub fn stop(mut self) {
        self.keep_running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
        let live: Vec<Arc<GameHandler>> = self
            .registry
            .list()
            .into_iter()
            .filter_map(|game| self.registry.get(game.id))
            .collect();
        for handler in live {
            handler.abort();
        }
        info!("server stopped");
    }
}

/// Shared by every connection thread.
struct Lobby {
    registry: Arc<SessionRegistry>,
    options: MatchOptions,
    keep_running: Arc<AtomicBool>,
}

/// Bind and start serving on a background thread. Returns the handle and the
/// bound address (useful with port 0).
pub fn start_server(
    config: &ServerConfig,
    options: MatchOptions,
) -> std::io::Result<(ServerHandle, SocketAddr)> {
    let listener = TcpListener::bind((config.bind_address.as_str(), config.port))?;
    let addr = listener.local_addr()?;
    listener.set_nonblocking(true)?;

    let keep_running = Arc::new(AtomicBool::new(true));
    let registry = SessionRegistry::new();
    let lobby = Arc::new(Lobby {
        registry: Arc::clone(&registry),
        options,
        keep_running: Arc::clone(&keep_running),
    });

    let thread = thread::Builder::new()
        .name("halma-listener".into())
        .spawn(move || accept_loop(listener, lobby))?;
    info!("listening on {addr}");

    Ok((
        ServerHandle {
            keep_running,
            thread: Some(thread),
            registry,
        },
        addr,
    ))
}

fn accept_loop(listener: TcpListener, lobby: Arc<Lobby>) {
    while lobby.keep_running.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, peer)) => {
                debug!("connection from {peer}");
                let lobby = Arc::clone(&lobby);
                let spawned = thread::Builder::new()
                    .name(format!("halma-conn-{peer}"))
                    .spawn(move || {
                        if let Err(e) = serve_connection(stream, lobby) {
                            debug!("connection from {peer} closed: {e}");
                        }
                    });
                if let Err(e) = spawned {
                    warn!("cannot serve {peer}: {e}");
                }
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                thread::sleep(ACCEPT_POLL);
            }
            Err(e) => {
                warn!("accept failed: {e}");
                break;
            }
        }
    }
}

fn serve_connection(stream: TcpStream, lobby: Arc<Lobby>) -> Result<(), ProtocolError> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(HANDSHAKE_TIMEOUT))?;
    let mut reader = BufReader::new(stream.try_clone()?);

    let display_name = match recv::<_, ClientMessage>(&mut reader)? {
        ClientMessage::Hello {
            protocol_version,
            display_name,
        } => {
            if protocol_version != PROTOCOL_VERSION {
                reject_handshake(
                    stream,
                    format!("protocol version {protocol_version} not supported"),
                );
                return Ok(());
            }
            let trimmed = display_name.trim();
            if trimmed.is_empty() {
                reject_handshake(stream, "display name is empty".into());
                return Ok(());
            }
            trimmed.to_owned()
        }
        other => {
            return Err(ProtocolError::Unexpected(format!(
                "expected Hello, got {other:?}"
            )));
        }
    };
    stream.set_read_timeout(None)?;

    let info = ClientInfo::new(lobby.registry.next_client_id(), display_name);
    info!("{} connected as {:?}", info.display_name, info.connection_id);

    let (outbox, pending) = mpsc::channel();
    let open = Arc::new(AtomicBool::new(true));
    let writer = BufWriter::new(stream.try_clone()?);
    let writer_open = Arc::clone(&open);
    thread::Builder::new()
        .name(format!("halma-write-{}", info.connection_id.0))
        .spawn(move || writer_loop(writer, pending, writer_open))?;

    let _ = outbox.send(ServerMessage::Welcome {
        client: info.clone(),
    });
    let mut connection = Connection {
        client: Arc::new(RemoteClient::new(info.clone(), outbox.clone())),
        info,
        outbox,
        game: None,
        lobby,
    };

    let result = connection.read_loop(&mut reader);
    connection.leave_game();
    info!("{} disconnected", connection.info.display_name);
    open.store(false, Ordering::SeqCst);
    result
}

fn reject_handshake(stream: TcpStream, reason: String) {
    debug!("rejecting handshake: {reason}");
    let mut writer = BufWriter::new(stream);
    let _ = send(&mut writer, &ServerMessage::Rejected { reason });
}

fn writer_loop(
    mut writer: BufWriter<TcpStream>,
    pending: Receiver<ServerMessage>,
    open: Arc<AtomicBool>,
) {
    loop {
        match pending.recv_timeout(WRITER_POLL) {
            Ok(message) => {
                if send(&mut writer, &message).is_err() {
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                if !open.load(Ordering::SeqCst) {
                    break;
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    let _ = writer.get_ref().shutdown(Shutdown::Both);
}

/// Per-connection lobby state, owned by the connection thread.
struct Connection {
    client: Arc<RemoteClient>,
    info: ClientInfo,
    outbox: Sender<ServerMessage>,
    game: Option<Arc<GameHandler>>,
    lobby: Arc<Lobby>,
}

impl Connection {
    fn read_loop(&mut self, reader: &mut BufReader<TcpStream>) -> Result<(), ProtocolError> {
        while self.lobby.keep_running.load(Ordering::SeqCst) {
            let frame = read_frame(reader)?;
            match serde_json::from_slice::<ClientMessage>(&frame) {
                Ok(ClientMessage::Goodbye) => break,
                Ok(message) => self.handle(message),
                Err(e) => warn!(
                    "{}: dropping undecodable message: {e}",
                    self.info.display_name
                ),
            }
        }
        Ok(())
    }

    fn handle(&mut self, message: ClientMessage) {
        match message {
            ClientMessage::ListGames => {
                self.reply(ServerMessage::GameList {
                    games: self.lobby.registry.list(),
                });
            }
            ClientMessage::CreateGame { game_type } => {
                if let Err(e) = self.create_game(game_type) {
                    self.reject(e);
                }
            }
            ClientMessage::JoinGame { game_id } => {
                if let Err(e) = self.join_game(game_id) {
                    self.reject(e);
                }
            }
            ClientMessage::AddBot => {
                let result = match self.current_game() {
                    Some(game) => game.add_bot().map(|_| ()),
                    None => Err(SessionError::NotAMember),
                };
                if let Err(e) = result {
                    self.reject(e);
                }
            }
            ClientMessage::LeaveGame => match self.current_game() {
                Some(_) => self.leave_game(),
                None => self.reject(SessionError::NotAMember),
            },
            ClientMessage::Gameplay(request) => match self.current_game() {
                Some(game) => game.submit(self.info.connection_id, request),
                None => debug!(
                    "{}: dropping {request:?}, not in a game",
                    self.info.display_name
                ),
            },
            ClientMessage::Hello { .. } | ClientMessage::Goodbye => {
                debug!("{}: ignoring repeated handshake message", self.info.display_name);
            }
        }
    }

    /// The session this connection belongs to, forgetting it once it ended.
    fn current_game(&mut self) -> Option<Arc<GameHandler>> {
        if self.game.as_ref().is_some_and(|g| g.is_ended()) {
            self.game = None;
        }
        self.game.clone()
    }

    fn create_game(&mut self, game_type: GameType) -> Result<(), SessionError> {
        if let Some(game) = self.current_game() {
            return Err(SessionError::InAnotherGame(game.id()));
        }
        let game = self.lobby.registry.create_session(
            game_type,
            self.client.clone(),
            self.lobby.options.clone(),
        )?;
        self.game = Some(game);
        Ok(())
    }

    fn join_game(&mut self, game_id: SessionId) -> Result<(), SessionError> {
        if let Some(game) = self.current_game() {
            return Err(SessionError::InAnotherGame(game.id()));
        }
        let game = self
            .lobby
            .registry
            .get(game_id)
            .ok_or(SessionError::NoSuchGame(game_id))?;
        game.add_client(self.client.clone())?;
        self.game = Some(game);
        Ok(())
    }

    fn leave_game(&mut self) {
        let Some(game) = self.game.take() else {
            return;
        };
        if game.remove_client(self.info.connection_id).is_ok() {
            self.reply(ServerMessage::Left { game_id: game.id() });
        }
    }

    fn reply(&self, message: ServerMessage) {
        let _ = self.outbox.send(message);
    }

    fn reject(&self, error: SessionError) {
        debug!("{}: rejected: {error}", self.info.display_name);
        self.reply(ServerMessage::Rejected {
            reason: error.to_string(),
        });
    }
}
