// TCP client for the session server.
//
// - `connect()` performs the TCP connect and `Hello` handshake on the calling
//   thread, then spawns a background reader thread.
// - The reader thread decodes framed `ServerMessage`s and pushes them into an
//   `mpsc` channel.
// - The caller holds a `BufWriter<TcpStream>` and sends synchronously (frames
//   are tiny).
// - `poll()` drains the inbox without blocking; `recv_timeout()` waits for the
//   next message.
//
// Used by the integration tests and by anything that wants to play against a
// running server without a UI.

use std::io::{BufReader, BufWriter};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use halma_protocol::{
    ClientInfo, ClientMessage, GameType, GameplayRequest, PROTOCOL_VERSION, ProtocolError,
    ServerMessage, SessionId, recv, send,
};

pub struct NetClient {
    writer: BufWriter<TcpStream>,
    inbox: Receiver<ServerMessage>,
    _reader_thread: Option<JoinHandle<()>>,
    info: ClientInfo,
}

impl NetClient {
    /// Connect, perform the handshake and start the reader thread.
    pub fn connect(addr: impl ToSocketAddrs, display_name: &str) -> Result<Self, ProtocolError> {
        let stream = TcpStream::connect(addr)?;
        stream.set_read_timeout(Some(Duration::from_secs(5)))?;
        let mut reader = BufReader::new(stream.try_clone()?);
        let mut writer = BufWriter::new(stream);

        send(
            &mut writer,
            &ClientMessage::Hello {
                protocol_version: PROTOCOL_VERSION,
                display_name: display_name.into(),
            },
        )?;

        let info = match recv::<_, ServerMessage>(&mut reader)? {
            ServerMessage::Welcome { client } => client,
            ServerMessage::Rejected { reason } => return Err(ProtocolError::Rejected(reason)),
            other => return Err(ProtocolError::Unexpected(format!("{other:?}"))),
        };

        reader.get_ref().set_read_timeout(None)?;
        let (tx, rx) = mpsc::channel();
        let reader_thread = thread::spawn(move || {
            while let Ok(message) = recv::<_, ServerMessage>(&mut reader) {
                if tx.send(message).is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            writer,
            inbox: rx,
            _reader_thread: Some(reader_thread),
            info,
        })
    }

    /// Identity assigned by the server.
    pub fn info(&self) -> &ClientInfo {
        &self.info
    }

    pub fn list_games(&mut self) -> Result<(), ProtocolError> {
        self.send(&ClientMessage::ListGames)
    }

    pub fn create_game(&mut self, game_type: GameType) -> Result<(), ProtocolError> {
        self.send(&ClientMessage::CreateGame { game_type })
    }

    pub fn join_game(&mut self, game_id: SessionId) -> Result<(), ProtocolError> {
        self.send(&ClientMessage::JoinGame { game_id })
    }

    pub fn add_bot(&mut self) -> Result<(), ProtocolError> {
        self.send(&ClientMessage::AddBot)
    }

    pub fn leave_game(&mut self) -> Result<(), ProtocolError> {
        self.send(&ClientMessage::LeaveGame)
    }

    pub fn send_gameplay(&mut self, request: GameplayRequest) -> Result<(), ProtocolError> {
        self.send(&ClientMessage::Gameplay(request))
    }

    /// Send Goodbye; the server then closes the connection.
    pub fn disconnect(&mut self) {
        let _ = self.send(&ClientMessage::Goodbye);
    }

    /// Drain all queued server messages (non-blocking).
    pub fn poll(&self) -> Vec<ServerMessage> {
        self.inbox.try_iter().collect()
    }

    /// Wait up to `timeout` for the next server message.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<ServerMessage> {
        self.inbox.recv_timeout(timeout).ok()
    }

    fn send(&mut self, message: &ClientMessage) -> Result<(), ProtocolError> {
        send(&mut self.writer, message)
    }
}
