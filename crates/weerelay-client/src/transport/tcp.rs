//! Plain TCP transport.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

use weerelay_proto::{RelayError, Result};

use crate::transport::{RelayTransport, TransportRx, TransportTx};

const READ_CHUNK: usize = 8 * 1024;

pub struct TcpTransport {
    stream: TcpStream,
}

impl TcpTransport {
    pub async fn connect(address: &str) -> Result<TcpTransport> {
        let stream = TcpStream::connect(address)
            .await
            .map_err(|e| RelayError::Transport(format!("connect {address}: {e}")))?;
        // Commands are tiny; don't let Nagle sit on them.
        let _ = stream.set_nodelay(true);
        Ok(TcpTransport { stream })
    }
}

impl RelayTransport for TcpTransport {
    type Rx = TcpRx;
    type Tx = TcpTx;

    fn split(self) -> (TcpRx, TcpTx) {
        let (read, write) = self.stream.into_split();
        (TcpRx { read }, TcpTx { write })
    }
}

pub struct TcpRx {
    read: OwnedReadHalf,
}

#[async_trait]
impl TransportRx for TcpRx {
    async fn recv(&mut self) -> Result<Option<Bytes>> {
        let mut buf = BytesMut::with_capacity(READ_CHUNK);
        let n = self
            .read
            .read_buf(&mut buf)
            .await
            .map_err(|e| RelayError::Transport(format!("read: {e}")))?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(buf.freeze()))
    }
}

pub struct TcpTx {
    write: OwnedWriteHalf,
}

#[async_trait]
impl TransportTx for TcpTx {
    async fn send(&mut self, command: &str) -> Result<()> {
        self.write
            .write_all(command.as_bytes())
            .await
            .map_err(|e| RelayError::Transport(format!("write: {e}")))
    }
}
