use crate::bridge::error::{BridgeError, Result};
use log::{debug, info, trace, warn};
use std::future::Future;
use std::net::SocketAddr;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::net::{TcpListener, TcpStream};
use wacore::frame::Frame;
use wacore::types::Snapshot;

/// What went over the wire during one handoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SnapshotStats {
    pub contacts: usize,
    pub groups: usize,
}

/// Writes frames one line at a time, flushing after each so the consumer can
/// start decoding before the whole snapshot is out.
pub struct SnapshotWriter<W> {
    writer: W,
    line: String,
}

impl<W: AsyncWrite + Unpin> SnapshotWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            line: String::new(),
        }
    }

    pub async fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        frame.encode_into(&mut self.line)?;
        self.writer
            .write_all(self.line.as_bytes())
            .await
            .map_err(BridgeError::Write)?;
        self.writer.flush().await.map_err(BridgeError::Write)?;
        trace!("--> {} frame, {} bytes", frame.tag(), self.line.len());
        Ok(())
    }

    /// Contacts first, then groups, then `End`.
    pub async fn write_snapshot(&mut self, snapshot: &Snapshot) -> Result<SnapshotStats> {
        let mut stats = SnapshotStats::default();

        for contact in &snapshot.contacts {
            self.write_frame(&Frame::SetContact(contact.clone())).await?;
            stats.contacts += 1;
        }
        for group in &snapshot.groups {
            self.write_frame(&Frame::SetGroup(group.clone())).await?;
            stats.groups += 1;
        }
        self.write_frame(&Frame::End).await?;

        Ok(stats)
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Listening side of the bridge. It hands out exactly one connection:
/// [`accept`](Self::accept) consumes the listener.
pub struct BridgeServer {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl BridgeServer {
    pub async fn listen(addr: &str) -> Result<Self> {
        let bind_error = |source| BridgeError::Bind {
            addr: addr.to_string(),
            source,
        };
        let listener = TcpListener::bind(addr).await.map_err(bind_error)?;
        let local_addr = listener.local_addr().map_err(bind_error)?;

        info!("Bridge listening on {local_addr}");
        Ok(Self {
            listener,
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Waits for the consumer. There is no timeout.
    pub async fn accept(self) -> Result<BridgeConnection> {
        let (stream, peer) = self.listener.accept().await.map_err(BridgeError::Accept)?;
        info!("Consumer connected from {peer}");
        Ok(BridgeConnection::new(stream, peer))
    }

    /// Like [`accept`](Self::accept), but gives up with `None` once `shutdown`
    /// completes. The listener is closed either way.
    pub async fn accept_until<F>(self, shutdown: F) -> Result<Option<BridgeConnection>>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            accepted = self.accept() => accepted.map(Some),
            _ = shutdown => {
                info!("Shutdown requested before a consumer connected");
                Ok(None)
            }
        }
    }
}

pub struct BridgeConnection {
    writer: SnapshotWriter<BufWriter<TcpStream>>,
    peer: SocketAddr,
}

impl BridgeConnection {
    fn new(stream: TcpStream, peer: SocketAddr) -> Self {
        Self {
            writer: SnapshotWriter::new(BufWriter::new(stream)),
            peer,
        }
    }

    /// Sends the snapshot and closes the connection. The socket is released on
    /// every path out of this function, including errors.
    pub async fn send_snapshot(mut self, snapshot: &Snapshot) -> Result<SnapshotStats> {
        let peer = self.peer;
        let _guard = scopeguard::guard((), move |_| {
            debug!("Closed bridge connection to {peer}");
        });

        let stats = self.writer.write_snapshot(snapshot).await?;
        info!(
            "Sent {} contacts and {} groups to {peer}",
            stats.contacts, stats.groups
        );

        let mut stream = self.writer.into_inner();
        if let Err(e) = stream.shutdown().await {
            warn!("Failed to shut down bridge connection to {peer}: {e}");
        }
        Ok(stats)
    }
}
