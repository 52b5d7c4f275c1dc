//! One hosting or joining peer of a two-player game.
//!
//! The session owns the socket and two background tasks: an acceptor
//! (host only, accepts exactly one peer) and a receive loop that decodes
//! frames into [`SessionEvent`]s. Legality of received moves is not
//! checked here; the game thread does that when it drains the events.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use chess_core::{Color, Move};
use rand::Rng;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::error::NetError;
use crate::link::{advertised_link, parse_link};
use crate::tunnel::Tunnel;
use crate::wire::{decode_move, encode_move, MAX_FRAME};

/// Range a host picks its port from when none is configured.
pub const HOST_PORT_RANGE: std::ops::RangeInclusive<u16> = 5000..=6000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Host,
    Joiner,
}

impl Role {
    /// Hosts play White.
    pub fn color(self) -> Color {
        match self {
            Role::Host => Color::White,
            Role::Joiner => Color::Black,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Listening,
    Connecting,
    Connected,
}

#[derive(Debug)]
pub enum SessionEvent {
    PeerConnected(SocketAddr),
    MoveReceived(Move),
    /// The peer closed the connection.
    Disconnected,
    /// The session ended on an error (timeout, I/O).
    Failed(NetError),
}

#[derive(Debug, Clone)]
pub struct NetConfig {
    pub bind_addr: String,
    /// `None` picks a random port from [`HOST_PORT_RANGE`]; `Some(0)` lets
    /// the OS choose.
    pub port: Option<u16>,
    /// Host name put in the advertised link. Defaults to the bound address,
    /// or loopback when bound to all interfaces.
    pub public_host: Option<String>,
    pub accept_timeout: Duration,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
}

impl Default for NetConfig {
    fn default() -> Self {
        NetConfig {
            bind_addr: "0.0.0.0".to_string(),
            port: None,
            public_host: None,
            accept_timeout: Duration::from_secs(120),
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(600),
            write_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HostInfo {
    pub local_addr: SocketAddr,
    pub link: String,
}

struct Shared {
    state: SessionState,
    role: Option<Role>,
    writer: Option<OwnedWriteHalf>,
    acceptor: Option<JoinHandle<()>>,
    receiver: Option<JoinHandle<()>>,
    tunnel: Option<Box<dyn Tunnel>>,
    peer: Option<SocketAddr>,
    /// Bumped whenever a session starts so tasks of a torn-down session
    /// cannot touch its successor.
    generation: u64,
}

impl Shared {
    fn new() -> Self {
        Shared {
            state: SessionState::Idle,
            role: None,
            writer: None,
            acceptor: None,
            receiver: None,
            tunnel: None,
            peer: None,
            generation: 0,
        }
    }

    fn begin(&mut self, state: SessionState, role: Role) -> u64 {
        self.state = state;
        self.role = Some(role);
        self.generation += 1;
        self.generation
    }
}

enum Frame {
    Line,
    Oversized(usize),
    Eof,
}

/// Handle to the session; clones share the same connection.
#[derive(Clone)]
pub struct SyncSession {
    shared: Arc<Mutex<Shared>>,
    events: mpsc::UnboundedSender<SessionEvent>,
    config: Arc<NetConfig>,
}

impl SyncSession {
    pub fn new(config: NetConfig) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let session = SyncSession {
            shared: Arc::new(Mutex::new(Shared::new())),
            events,
            config: Arc::new(config),
        };
        (session, rx)
    }

    pub fn config(&self) -> &NetConfig {
        &self.config
    }

    pub async fn state(&self) -> SessionState {
        self.shared.lock().await.state
    }

    pub async fn role(&self) -> Option<Role> {
        self.shared.lock().await.role
    }

    /// Color this side plays; White while idle.
    pub async fn local_color(&self) -> Color {
        self.shared
            .lock()
            .await
            .role
            .map_or(Color::White, Role::color)
    }

    pub async fn peer(&self) -> Option<SocketAddr> {
        self.shared.lock().await.peer
    }

    pub async fn is_active(&self) -> bool {
        self.state().await != SessionState::Idle
    }

    /// Binds a listener and waits in the background for one peer.
    ///
    /// When a tunnel is given its link is advertised instead of the local
    /// one; a tunnel that fails to open is logged and skipped.
    pub async fn host(&self, tunnel: Option<Box<dyn Tunnel>>) -> Result<HostInfo, NetError> {
        let mut shared = self.shared.lock().await;
        if shared.state != SessionState::Idle {
            return Err(NetError::AlreadyActive);
        }

        let port = self
            .config
            .port
            .unwrap_or_else(|| rand::thread_rng().gen_range(HOST_PORT_RANGE));
        let addr = format!("{}:{}", self.config.bind_addr, port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| NetError::Bind {
                addr: addr.clone(),
                source,
            })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| NetError::Io { op: "bind", source })?;

        let host = match &self.config.public_host {
            Some(host) => host.clone(),
            None if local_addr.ip().is_unspecified() => "127.0.0.1".to_string(),
            None => local_addr.ip().to_string(),
        };
        let mut link = advertised_link(&host, local_addr.port());
        if let Some(mut tunnel) = tunnel {
            match tunnel.open(local_addr.port()) {
                Ok(public) => {
                    link = public;
                    shared.tunnel = Some(tunnel);
                }
                Err(err) => {
                    warn!(error = %err, "tunnel unavailable, advertising local link");
                    tunnel.close();
                }
            }
        }

        let generation = shared.begin(SessionState::Listening, Role::Host);
        let session = self.clone();
        shared.acceptor = Some(tokio::spawn(session.accept_one(listener, generation)));
        info!(addr = %local_addr, link = %link, "hosting game");

        Ok(HostInfo { local_addr, link })
    }

    /// Connects to a host; on success this side plays Black.
    pub async fn join(&self, link: &str) -> Result<SocketAddr, NetError> {
        let (host, port) = parse_link(link)?;
        let generation = {
            let mut shared = self.shared.lock().await;
            if shared.state != SessionState::Idle {
                return Err(NetError::AlreadyActive);
            }
            shared.begin(SessionState::Connecting, Role::Joiner)
        };

        let addr = format!("{host}:{port}");
        info!(addr = %addr, "joining game");
        let connect = TcpStream::connect((host.as_str(), port));
        let stream = match timeout(self.config.connect_timeout, connect).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => {
                self.teardown_generation(generation).await;
                return Err(NetError::Connect { addr, source });
            }
            Err(_) => {
                self.teardown_generation(generation).await;
                return Err(NetError::Timeout {
                    op: "connect",
                    secs: self.config.connect_timeout.as_secs(),
                });
            }
        };
        let peer = match stream.peer_addr() {
            Ok(peer) => peer,
            Err(source) => {
                self.teardown_generation(generation).await;
                return Err(NetError::Io {
                    op: "connect",
                    source,
                });
            }
        };

        if self.attach(stream, peer, generation).await {
            Ok(peer)
        } else {
            Err(NetError::NotConnected)
        }
    }

    /// Sends a locally made move to the peer.
    ///
    /// A failed or timed-out write tears the session down.
    pub async fn send(&self, mv: Move, mover: Color) -> Result<(), NetError> {
        let line = encode_move(mv)?;
        let mut shared = self.shared.lock().await;
        let local = shared.role.map_or(Color::White, Role::color);
        if mover != local {
            return Err(NetError::OutOfTurn { mover, local });
        }
        if shared.state != SessionState::Connected {
            return Err(NetError::NotConnected);
        }
        let Some(writer) = shared.writer.as_mut() else {
            return Err(NetError::NotConnected);
        };

        let write = async {
            writer.write_all(line.as_bytes()).await?;
            writer.flush().await
        };
        let outcome = timeout(self.config.write_timeout, write).await;
        drop(shared);

        let err = match outcome {
            Ok(Ok(())) => {
                debug!(mv = %mv, "move sent");
                return Ok(());
            }
            Ok(Err(source)) => NetError::Io { op: "write", source },
            Err(_) => NetError::Timeout {
                op: "write",
                secs: self.config.write_timeout.as_secs(),
            },
        };
        warn!(error = %err, "send failed, closing session");
        self.teardown().await;
        Err(err)
    }

    /// Closes the connection, releases the tunnel and stops background
    /// tasks. Safe to call repeatedly and from any state.
    pub async fn teardown(&self) {
        self.close(None).await;
    }

    async fn teardown_generation(&self, generation: u64) -> bool {
        self.close(Some(generation)).await
    }

    async fn close(&self, generation: Option<u64>) -> bool {
        let mut shared = self.shared.lock().await;
        if let Some(generation) = generation {
            if shared.generation != generation || shared.state == SessionState::Idle {
                return false;
            }
        }
        let previous = shared.state;

        if let Some(mut writer) = shared.writer.take() {
            let _ = timeout(self.config.write_timeout, writer.shutdown()).await;
        }
        if let Some(mut tunnel) = shared.tunnel.take() {
            tunnel.close();
        }
        let tasks = [shared.acceptor.take(), shared.receiver.take()];
        shared.state = SessionState::Idle;
        shared.role = None;
        shared.peer = None;
        drop(shared);

        // Last, since the caller may be one of these tasks.
        for task in tasks.into_iter().flatten() {
            task.abort();
        }
        if previous != SessionState::Idle {
            info!(from = ?previous, "session closed");
        }
        true
    }

    /// Closes the session a background task belongs to and reports why.
    async fn end_with(&self, generation: u64, event: SessionEvent) {
        if self.teardown_generation(generation).await {
            let _ = self.events.send(event);
        }
    }

    async fn accept_one(self, listener: TcpListener, generation: u64) {
        let accept_timeout = self.config.accept_timeout;
        match timeout(accept_timeout, listener.accept()).await {
            Ok(Ok((stream, peer))) => {
                drop(listener);
                self.attach(stream, peer, generation).await;
            }
            Ok(Err(source)) => {
                warn!(error = %source, "accept failed");
                self.end_with(
                    generation,
                    SessionEvent::Failed(NetError::Io { op: "accept", source }),
                )
                .await;
            }
            Err(_) => {
                warn!(secs = accept_timeout.as_secs(), "no peer joined in time");
                self.end_with(
                    generation,
                    SessionEvent::Failed(NetError::Timeout {
                        op: "accept",
                        secs: accept_timeout.as_secs(),
                    }),
                )
                .await;
            }
        }
    }

    /// Moves a fresh connection into the session and starts receiving.
    async fn attach(&self, stream: TcpStream, peer: SocketAddr, generation: u64) -> bool {
        if let Err(err) = stream.set_nodelay(true) {
            debug!(error = %err, "could not disable Nagle");
        }
        let (reader, writer) = stream.into_split();

        let mut shared = self.shared.lock().await;
        if shared.generation != generation || shared.state == SessionState::Idle {
            return false;
        }
        shared.writer = Some(writer);
        shared.state = SessionState::Connected;
        shared.peer = Some(peer);
        info!(peer = %peer, role = ?shared.role, "peer connected");
        let _ = self.events.send(SessionEvent::PeerConnected(peer));

        let session = self.clone();
        shared.receiver = Some(tokio::spawn(session.receive(reader, generation)));
        true
    }

    async fn receive(self, reader: OwnedReadHalf, generation: u64) {
        let read_timeout = self.config.read_timeout;
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::with_capacity(MAX_FRAME + 1);

        loop {
            buf.clear();
            let frame = match timeout(read_timeout, read_frame(&mut reader, &mut buf)).await {
                Ok(Ok(frame)) => frame,
                Ok(Err(source)) => {
                    warn!(error = %source, "read failed");
                    let err = NetError::Io { op: "read", source };
                    self.end_with(generation, SessionEvent::Failed(err)).await;
                    return;
                }
                Err(_) => {
                    warn!(secs = read_timeout.as_secs(), "peer silent for too long");
                    let err = NetError::Timeout {
                        op: "read",
                        secs: read_timeout.as_secs(),
                    };
                    self.end_with(generation, SessionEvent::Failed(err)).await;
                    return;
                }
            };

            match frame {
                Frame::Eof => {
                    info!("peer disconnected");
                    self.end_with(generation, SessionEvent::Disconnected).await;
                    return;
                }
                Frame::Oversized(len) => {
                    warn!(len, "dropping oversized frame");
                }
                Frame::Line => {
                    let text = String::from_utf8_lossy(&buf);
                    if text.trim().is_empty() {
                        continue;
                    }
                    match decode_move(&text) {
                        Ok(mv) => {
                            debug!(mv = %mv, "move received");
                            if self.events.send(SessionEvent::MoveReceived(mv)).is_err() {
                                return;
                            }
                        }
                        Err(err) => warn!(error = %err, "dropping malformed frame"),
                    }
                }
            }
        }
    }
}

/// Reads one newline-terminated frame into `buf`, discarding the rest of
/// any line longer than [`MAX_FRAME`].
async fn read_frame<R>(reader: &mut R, buf: &mut Vec<u8>) -> std::io::Result<Frame>
where
    R: AsyncBufRead + Unpin,
{
    let limit = MAX_FRAME as u64 + 1;
    let n = (&mut *reader).take(limit).read_until(b'\n', buf).await?;
    if n == 0 {
        return Ok(Frame::Eof);
    }
    if buf.last() == Some(&b'\n') || n <= MAX_FRAME {
        return Ok(Frame::Line);
    }

    let mut skipped = n;
    let mut sink = Vec::new();
    loop {
        sink.clear();
        let m = (&mut *reader).take(4096).read_until(b'\n', &mut sink).await?;
        skipped += m;
        if m == 0 || sink.last() == Some(&b'\n') {
            break;
        }
    }
    Ok(Frame::Oversized(skipped))
}
