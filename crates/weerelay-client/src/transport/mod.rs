//! Transport layer (TCP + the seam the pipeline consumes).
//!
//! The pipeline never touches the socket directly: it reads inbound chunks
//! and writes pre-formed command strings through the [`RelayTransport`]
//! halves, so tests can drive it with an in-memory implementation. The
//! transport splits into independent read/write halves because the
//! connection loop polls inbound bytes while writing commands.

pub mod commands;
pub mod conn;
pub mod tcp;

use async_trait::async_trait;
use bytes::Bytes;

use weerelay_proto::Result;

pub use tcp::TcpTransport;

/// The raw socket seam, split into halves before the loop starts.
pub trait RelayTransport: Send {
    type Rx: TransportRx + 'static;
    type Tx: TransportTx + 'static;

    fn split(self) -> (Self::Rx, Self::Tx);
}

/// Inbound half: supplies bytes as they arrive, with no minimum chunking
/// guaranteed.
#[async_trait]
pub trait TransportRx: Send {
    /// Next chunk of inbound bytes; `None` when the peer closed the stream.
    async fn recv(&mut self) -> Result<Option<Bytes>>;
}

/// Outbound half: accepts newline-terminated command strings.
#[async_trait]
pub trait TransportTx: Send {
    /// Write one pre-formed command.
    async fn send(&mut self, command: &str) -> Result<()>;
}
