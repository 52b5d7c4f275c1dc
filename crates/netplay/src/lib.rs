//! Move synchronization between two peers.
//!
//! A host binds a TCP listener and accepts exactly one joiner; both sides
//! then exchange newline-delimited JSON move frames. The host plays White.

pub mod error;
pub mod link;
pub mod session;
pub mod tunnel;
pub mod wire;

pub use error::{NetError, ProtocolError};
pub use link::{advertised_link, parse_link};
pub use session::{
    HostInfo, NetConfig, Role, SessionEvent, SessionState, SyncSession, HOST_PORT_RANGE,
};
pub use tunnel::Tunnel;
pub use wire::{decode_move, encode_move, MoveFrame, MAX_FRAME, PROTOCOL_VERSION};
