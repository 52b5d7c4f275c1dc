//! Loopback tests for the two-peer session.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chess_core::{coord_to_sq, is_legal, Color, Move, Position};
use netplay::{
    encode_move, NetConfig, NetError, Role, SessionEvent, SessionState, SyncSession, Tunnel,
};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc::UnboundedReceiver;

// =============================================================================
// Helpers
// =============================================================================

fn loopback() -> NetConfig {
    NetConfig {
        bind_addr: "127.0.0.1".to_string(),
        port: Some(0),
        ..NetConfig::default()
    }
}

fn mv_of(from: &str, to: &str) -> Move {
    Move::new(coord_to_sq(from).unwrap(), coord_to_sq(to).unwrap())
}

async fn next_event(rx: &mut UnboundedReceiver<SessionEvent>) -> SessionEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("event within 5s")
        .expect("channel open")
}

async fn wait_for_state(session: &SyncSession, want: SessionState) {
    for _ in 0..100 {
        if session.state().await == want {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("session never reached {want:?}");
}

struct Pair {
    host: SyncSession,
    host_rx: UnboundedReceiver<SessionEvent>,
    joiner: SyncSession,
    joiner_rx: UnboundedReceiver<SessionEvent>,
}

async fn connected_pair() -> Pair {
    let (host, mut host_rx) = SyncSession::new(loopback());
    let (joiner, mut joiner_rx) = SyncSession::new(loopback());

    let info = host.host(None).await.unwrap();
    joiner.join(&info.link).await.unwrap();

    assert!(matches!(next_event(&mut host_rx).await, SessionEvent::PeerConnected(_)));
    assert!(matches!(next_event(&mut joiner_rx).await, SessionEvent::PeerConnected(_)));
    wait_for_state(&host, SessionState::Connected).await;

    Pair {
        host,
        host_rx,
        joiner,
        joiner_rx,
    }
}

struct FakeTunnel {
    closed: Arc<AtomicBool>,
    fail: bool,
}

impl Tunnel for FakeTunnel {
    fn open(&mut self, local_port: u16) -> Result<String, NetError> {
        if self.fail {
            return Err(NetError::Tunnel("no provider".to_string()));
        }
        Ok(format!("tcp://127.0.0.1:{local_port}"))
    }

    fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

// =============================================================================
// Move exchange
// =============================================================================

#[tokio::test]
async fn test_host_receives_e2e4_from_joiner() {
    let (host, mut rx) = SyncSession::new(loopback());
    let info = host.host(None).await.unwrap();
    assert_eq!(host.state().await, SessionState::Listening);

    let mut joiner = TcpStream::connect(info.local_addr).await.unwrap();
    assert!(matches!(next_event(&mut rx).await, SessionEvent::PeerConnected(_)));
    assert_eq!(host.state().await, SessionState::Connected);
    joiner
        .write_all(b"{\"v\":1,\"from\":\"e2\",\"to\":\"e4\",\"promotion\":null}\n")
        .await
        .unwrap();

    let SessionEvent::MoveReceived(mv) = next_event(&mut rx).await else {
        panic!("expected a move");
    };
    assert_eq!(mv, mv_of("e2", "e4"));

    // What the game thread does with it
    let mut pos = Position::startpos();
    assert!(is_legal(&pos, mv));
    assert_eq!(pos.captured_piece(mv), None);
    pos.make_move(mv);
    assert_eq!(pos.side_to_move, Color::Black);

    host.teardown().await;
}

#[tokio::test]
async fn test_moves_flow_both_ways() {
    let mut pair = connected_pair().await;
    assert_eq!(pair.host.role().await, Some(Role::Host));
    assert_eq!(pair.host.local_color().await, Color::White);
    assert_eq!(pair.joiner.role().await, Some(Role::Joiner));
    assert_eq!(pair.joiner.local_color().await, Color::Black);

    pair.host.send(mv_of("e2", "e4"), Color::White).await.unwrap();
    let SessionEvent::MoveReceived(first) = next_event(&mut pair.joiner_rx).await else {
        panic!("expected a move");
    };
    assert_eq!(first, mv_of("e2", "e4"));

    pair.joiner.send(mv_of("c7", "c5"), Color::Black).await.unwrap();
    let SessionEvent::MoveReceived(reply) = next_event(&mut pair.host_rx).await else {
        panic!("expected a move");
    };
    assert_eq!(reply, mv_of("c7", "c5"));

    pair.host.teardown().await;
    pair.joiner.teardown().await;
}

#[tokio::test]
async fn test_send_rejects_wrong_color() {
    let pair = connected_pair().await;
    let err = pair.host.send(mv_of("e7", "e5"), Color::Black).await.unwrap_err();
    assert!(matches!(
        err,
        NetError::OutOfTurn {
            mover: Color::Black,
            local: Color::White
        }
    ));
    // Rejection leaves the session usable
    assert_eq!(pair.host.state().await, SessionState::Connected);
    pair.host.teardown().await;
}

#[tokio::test]
async fn test_send_without_peer_is_not_connected() {
    let (session, _rx) = SyncSession::new(loopback());
    let err = session.send(mv_of("e2", "e4"), Color::White).await.unwrap_err();
    assert!(matches!(err, NetError::NotConnected));

    session.host(None).await.unwrap();
    let err = session.send(mv_of("e2", "e4"), Color::White).await.unwrap_err();
    assert!(matches!(err, NetError::NotConnected));
    session.teardown().await;
}

#[tokio::test]
async fn test_malformed_frames_are_dropped() {
    let (host, mut rx) = SyncSession::new(loopback());
    let info = host.host(None).await.unwrap();

    let mut raw = TcpStream::connect(info.local_addr).await.unwrap();
    assert!(matches!(next_event(&mut rx).await, SessionEvent::PeerConnected(_)));

    let oversized = format!("{}\n", "x".repeat(1000));
    raw.write_all(b"not json\n").await.unwrap();
    raw.write_all(oversized.as_bytes()).await.unwrap();
    raw.write_all(b"{\"v\":9,\"from\":\"e2\",\"to\":\"e4\"}\n").await.unwrap();
    raw.write_all(encode_move(mv_of("d7", "d5")).unwrap().as_bytes())
        .await
        .unwrap();
    raw.flush().await.unwrap();

    let SessionEvent::MoveReceived(got) = next_event(&mut rx).await else {
        panic!("expected the valid frame to come through");
    };
    assert_eq!(got, mv_of("d7", "d5"));
    assert_eq!(host.state().await, SessionState::Connected);
    host.teardown().await;
}

// =============================================================================
// Lifecycle
// =============================================================================

#[tokio::test]
async fn test_second_session_is_rejected() {
    let (session, _rx) = SyncSession::new(loopback());
    session.host(None).await.unwrap();
    assert!(matches!(session.host(None).await, Err(NetError::AlreadyActive)));
    assert!(matches!(
        session.join("127.0.0.1:5000").await,
        Err(NetError::AlreadyActive)
    ));
    session.teardown().await;
}

#[tokio::test]
async fn test_teardown_is_idempotent() {
    let mut pair = connected_pair().await;
    pair.host.teardown().await;
    pair.host.teardown().await;
    assert_eq!(pair.host.state().await, SessionState::Idle);
    assert_eq!(pair.host.role().await, None);
    assert_eq!(pair.host.local_color().await, Color::White);
    assert_eq!(pair.host.peer().await, None);

    // The other side sees the close
    assert!(matches!(
        next_event(&mut pair.joiner_rx).await,
        SessionEvent::Disconnected
    ));
    wait_for_state(&pair.joiner, SessionState::Idle).await;

    // A local teardown does not report itself
    assert!(pair.host_rx.try_recv().is_err());

    // The session can host again afterwards
    pair.host.host(None).await.unwrap();
    assert_eq!(pair.host.state().await, SessionState::Listening);
    pair.host.teardown().await;
}

#[tokio::test]
async fn test_accept_timeout_fails_session() {
    let config = NetConfig {
        accept_timeout: Duration::from_millis(100),
        ..loopback()
    };
    let (host, mut rx) = SyncSession::new(config);
    host.host(None).await.unwrap();
    assert_eq!(host.state().await, SessionState::Listening);

    assert!(matches!(
        next_event(&mut rx).await,
        SessionEvent::Failed(NetError::Timeout { op: "accept", .. })
    ));
    assert_eq!(host.state().await, SessionState::Idle);
}

#[tokio::test]
async fn test_read_timeout_fails_session() {
    let config = NetConfig {
        read_timeout: Duration::from_millis(150),
        ..loopback()
    };
    let (host, mut rx) = SyncSession::new(config);
    let info = host.host(None).await.unwrap();
    let _silent = TcpStream::connect(info.local_addr).await.unwrap();

    assert!(matches!(next_event(&mut rx).await, SessionEvent::PeerConnected(_)));
    assert!(matches!(
        next_event(&mut rx).await,
        SessionEvent::Failed(NetError::Timeout { op: "read", .. })
    ));
    assert_eq!(host.state().await, SessionState::Idle);
}

#[tokio::test]
async fn test_join_refused_returns_to_idle() {
    // Grab a free port, then release it
    let port = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };
    let (joiner, _rx) = SyncSession::new(loopback());
    let err = joiner
        .join(&format!("http://127.0.0.1:{port}"))
        .await
        .unwrap_err();
    assert!(matches!(err, NetError::Connect { .. }));
    assert_eq!(joiner.state().await, SessionState::Idle);
}

#[tokio::test]
async fn test_join_rejects_bad_link() {
    let (joiner, _rx) = SyncSession::new(loopback());
    assert!(matches!(
        joiner.join("not a link").await,
        Err(NetError::InvalidLink(_))
    ));
    assert_eq!(joiner.state().await, SessionState::Idle);
}

// =============================================================================
// Tunnel
// =============================================================================

#[tokio::test]
async fn test_tunnel_link_is_advertised_and_released() {
    let closed = Arc::new(AtomicBool::new(false));
    let tunnel = FakeTunnel {
        closed: closed.clone(),
        fail: false,
    };
    let (host, _rx) = SyncSession::new(loopback());
    let info = host.host(Some(Box::new(tunnel))).await.unwrap();
    assert_eq!(info.link, format!("tcp://127.0.0.1:{}", info.local_addr.port()));
    assert!(!closed.load(Ordering::SeqCst));

    host.teardown().await;
    assert!(closed.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_failed_tunnel_falls_back_to_local_link() {
    let closed = Arc::new(AtomicBool::new(false));
    let tunnel = FakeTunnel {
        closed: closed.clone(),
        fail: true,
    };
    let (host, _rx) = SyncSession::new(loopback());
    let info = host.host(Some(Box::new(tunnel))).await.unwrap();
    assert_eq!(info.link, format!("http://127.0.0.1:{}", info.local_addr.port()));
    assert!(closed.load(Ordering::SeqCst));
    host.teardown().await;
}
