use crate::bridge::error::{BridgeError, Result};
use log::{debug, info, warn};
use std::future::Future;
use std::io::ErrorKind;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use wacore::frame::{FRAME_MAX_SIZE, Frame};
use wacore::types::Snapshot;

/// Result of one snapshot handoff as seen by the consumer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReceivedSnapshot {
    pub snapshot: Snapshot,
    /// `true` only if the `End` frame arrived.
    pub complete: bool,
    /// Lines dropped because they could not be decoded.
    pub skipped: usize,
}

fn is_disconnect(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted | ErrorKind::UnexpectedEof
    )
}

enum LineRead {
    Line,
    /// The line exceeded the limit and was discarded up to its newline.
    Oversized(usize),
    Eof,
}

pub struct SnapshotReader<R> {
    reader: R,
    buf: Vec<u8>,
    max_line_len: usize,
}

impl<R: AsyncBufRead + Unpin> SnapshotReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::with_capacity(4096),
            // Room for a `\r\n` terminator after a maximum-size frame.
            max_line_len: FRAME_MAX_SIZE + 2,
        }
    }

    pub fn with_max_line_len(mut self, max_line_len: usize) -> Self {
        self.max_line_len = max_line_len;
        self
    }

    /// Reads one line into `buf`, never buffering more than `max_line_len`
    /// bytes. Longer lines are consumed and dropped.
    async fn read_line(&mut self) -> std::io::Result<LineRead> {
        self.buf.clear();
        let mut discarded = 0;

        loop {
            let available = self.reader.fill_buf().await?;
            if available.is_empty() {
                return Ok(match (discarded, self.buf.is_empty()) {
                    (0, true) => LineRead::Eof,
                    (0, false) => LineRead::Line,
                    (n, _) => LineRead::Oversized(n),
                });
            }

            let (used, done) = match available.iter().position(|b| *b == b'\n') {
                Some(i) => (i + 1, true),
                None => (available.len(), false),
            };
            if discarded > 0 || self.buf.len() + used > self.max_line_len {
                discarded += self.buf.len() + used;
                self.buf.clear();
            } else {
                self.buf.extend_from_slice(&available[..used]);
            }
            self.reader.consume(used);

            if done {
                return Ok(match discarded {
                    0 => LineRead::Line,
                    n => LineRead::Oversized(n),
                });
            }
        }
    }

    /// Reads frames until `End` or until the producer goes away.
    ///
    /// Frames with a bad payload are skipped. An unknown tag aborts the
    /// handoff, since nothing after it can be trusted.
    pub async fn read_snapshot(&mut self) -> Result<ReceivedSnapshot> {
        let mut received = ReceivedSnapshot::default();

        loop {
            match self.read_line().await {
                Ok(LineRead::Line) => {}
                Ok(LineRead::Oversized(len)) => {
                    warn!(
                        "Skipping bridge frame: line of {len} bytes exceeds {} bytes",
                        self.max_line_len
                    );
                    received.skipped += 1;
                    continue;
                }
                Ok(LineRead::Eof) => break,
                Err(e) if is_disconnect(e.kind()) => {
                    warn!("Bridge connection dropped: {e}");
                    break;
                }
                Err(e) => return Err(BridgeError::Read(e)),
            }
            if self.buf.iter().all(|b| b.is_ascii_whitespace()) {
                continue;
            }

            match Frame::decode_bytes(&self.buf) {
                Ok(Frame::SetContact(contact)) => {
                    debug!("<-- SetContact {}", contact.jid);
                    received.snapshot.contacts.push(contact);
                }
                Ok(Frame::SetGroup(group)) => {
                    debug!("<-- SetGroup {}", group.jid);
                    received.snapshot.groups.push(group);
                }
                Ok(Frame::End) => {
                    debug!("<-- End");
                    received.complete = true;
                    return Ok(received);
                }
                Err(e) if e.is_recoverable() => {
                    warn!("Skipping bridge frame: {e}");
                    received.skipped += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }

        warn!(
            "Bridge closed before End; keeping {} contacts and {} groups",
            received.snapshot.contacts.len(),
            received.snapshot.groups.len()
        );
        Ok(received)
    }
}

/// Consumer side of the bridge.
pub struct BridgeClient {
    reader: SnapshotReader<BufReader<TcpStream>>,
}

impl BridgeClient {
    pub async fn connect(addr: &str) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|source| BridgeError::Connect {
                addr: addr.to_string(),
                source,
            })?;
        info!("Connected to bridge at {addr}");
        Ok(Self {
            reader: SnapshotReader::new(BufReader::new(stream)),
        })
    }

    pub async fn receive_snapshot(mut self) -> Result<ReceivedSnapshot> {
        let received = self.reader.read_snapshot().await?;
        info!(
            "Received {} contacts and {} groups (complete: {}, skipped: {})",
            received.snapshot.contacts.len(),
            received.snapshot.groups.len(),
            received.complete,
            received.skipped
        );
        Ok(received)
    }

    /// Returns `None` if `shutdown` completes first.
    pub async fn receive_snapshot_until<F>(self, shutdown: F) -> Result<Option<ReceivedSnapshot>>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            received = self.receive_snapshot() => received.map(Some),
            _ = shutdown => {
                info!("Shutdown requested while receiving the snapshot");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wacore::frame::FrameError;
    use wacore::types::Jid;

    async fn read(wire: &str) -> Result<ReceivedSnapshot> {
        SnapshotReader::new(wire.as_bytes()).read_snapshot().await
    }

    #[tokio::test]
    async fn test_reads_until_end() {
        let wire = concat!(
            "SetContact\\\\{\"jid\":\"1@s.whatsapp.net\",\"push_name\":\"Ana\"}\n",
            "SetGroup\\\\{\"jid\":\"10@g.us\",\"name\":\"Amigos\"}\n",
            "End\\\\\n",
            "SetContact\\\\{\"jid\":\"2@s.whatsapp.net\",\"push_name\":\"Late\"}\n",
        );

        let received = read(wire).await.unwrap();
        assert!(received.complete);
        assert_eq!(received.skipped, 0);
        assert_eq!(received.snapshot.contacts.len(), 1);
        assert_eq!(received.snapshot.contacts[0].jid, Jid::user("1"));
        assert_eq!(received.snapshot.groups[0].name, "Amigos");
    }

    #[tokio::test]
    async fn test_eof_before_end_is_partial() {
        let wire = "SetContact\\\\{\"jid\":\"1@s.whatsapp.net\",\"push_name\":\"Ana\"}\n";

        let received = read(wire).await.unwrap();
        assert!(!received.complete);
        assert_eq!(received.snapshot.contacts.len(), 1);
    }

    #[tokio::test]
    async fn test_bad_payloads_and_blank_lines_are_skipped() {
        let wire = concat!(
            "SetContact\\\\{not json}\n",
            "\n",
            "End\\\\trailing\n",
            "SetGroup\\\\{\"jid\":\"10@g.us\",\"name\":\"Amigos\"}\r\n",
            "END\\\\\n",
        );

        let received = read(wire).await.unwrap();
        assert!(received.complete);
        assert_eq!(received.skipped, 2);
        assert_eq!(received.snapshot.groups.len(), 1);
        assert!(received.snapshot.contacts.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_tag_aborts() {
        let wire = concat!(
            "SetContact\\\\{\"jid\":\"1@s.whatsapp.net\",\"push_name\":\"Ana\"}\n",
            "SetPresence\\\\{}\n",
            "End\\\\\n",
        );

        let err = read(wire).await.unwrap_err();
        assert!(matches!(
            err,
            BridgeError::Frame(FrameError::UnknownTag(ref line)) if line.starts_with("SetPresence")
        ));
    }

    #[tokio::test]
    async fn test_oversized_line_is_skipped_without_buffering() {
        let long_name = "x".repeat(200);
        let wire = format!(
            "SetContact\\\\{{\"jid\":\"1@s.whatsapp.net\",\"push_name\":\"{long_name}\"}}\n\
             SetContact\\\\{{\"jid\":\"2@s.whatsapp.net\",\"push_name\":\"Bia\"}}\n\
             End\\\\\n"
        );
        // A small buffer makes the long line arrive in many chunks.
        let reader = tokio::io::BufReader::with_capacity(16, wire.as_bytes());
        let mut reader = SnapshotReader::new(reader).with_max_line_len(64);

        let received = reader.read_snapshot().await.unwrap();
        assert!(received.complete);
        assert_eq!(received.skipped, 1);
        assert_eq!(received.snapshot.contacts.len(), 1);
        assert_eq!(received.snapshot.contacts[0].push_name, "Bia");
        assert!(reader.buf.capacity() <= 4096);
    }

    #[tokio::test]
    async fn test_oversized_tail_without_newline() {
        let wire = format!("End-ish{}", "y".repeat(100));
        let received = SnapshotReader::new(wire.as_bytes())
            .with_max_line_len(32)
            .read_snapshot()
            .await
            .unwrap();
        assert!(!received.complete);
        assert_eq!(received.skipped, 1);
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_skipped() {
        let mut wire = b"SetContact\\\\\xff\xfe\n".to_vec();
        wire.extend_from_slice(b"End\\\\\n");

        let received = SnapshotReader::new(wire.as_slice())
            .read_snapshot()
            .await
            .unwrap();
        assert!(received.complete);
        assert_eq!(received.skipped, 1);
    }
}
