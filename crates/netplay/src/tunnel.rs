use crate::error::NetError;

/// Exposes a locally bound port to peers outside the local network.
///
/// A tunnel is owned by the hosting session: it is opened once the
/// listener is bound and closed on teardown.
pub trait Tunnel: Send {
    /// Returns the public link peers should join with.
    fn open(&mut self, local_port: u16) -> Result<String, NetError>;

    /// Releases the public endpoint. Must tolerate being called after a
    /// failed `open`.
    fn close(&mut self);
}
