//! Per-connection read/write primitives.
//!
//! A `Connection` owns one accepted TCP stream, split on construction: the
//! buffered reader half stays with the connection handler, while the writer
//! half lives behind a cloneable [`ConnectionWriter`] so dispatch workers can
//! deliver broadcasts to the same socket concurrently.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

use crate::error::Result;

/// One active stream and its line-oriented I/O
pub struct Connection {
    reader: BufReader<OwnedReadHalf>,
    writer: ConnectionWriter,
    peer: SocketAddr,
}

impl Connection {
    /// Wrap an accepted stream
    pub fn new(stream: TcpStream, peer: SocketAddr) -> Self {
        let (read_half, write_half) = stream.into_split();
        Self {
            reader: BufReader::new(read_half),
            writer: ConnectionWriter::new(write_half),
            peer,
        }
    }

    /// Read the next line, with the trailing newline stripped.
    ///
    /// Returns `Ok(None)` at end-of-stream.
    pub async fn read_line(&mut self) -> Result<Option<String>> {
        read_trimmed_line(&mut self.reader).await
    }

    /// Get a writer handle that can outlive the handler's read loop
    pub fn writer(&self) -> ConnectionWriter {
        self.writer.clone()
    }

    /// Peer address, for logging
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }
}

/// Shared, synchronized write half of a connection.
///
/// The writer is boxed so broadcast delivery and the tests can target any
/// `AsyncWrite` sink, not just a TCP half.
#[derive(Clone)]
pub struct ConnectionWriter {
    inner: Arc<Mutex<Box<dyn AsyncWrite + Send + Unpin>>>,
}

impl ConnectionWriter {
    pub fn new<W>(writer: W) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            inner: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    /// Write one newline-terminated line and flush it
    pub async fn send_line(&self, line: &str) -> Result<()> {
        let mut writer = self.inner.lock().await;
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        Ok(())
    }

    /// Close the underlying transport
    pub async fn shutdown(&self) -> Result<()> {
        let mut writer = self.inner.lock().await;
        writer.shutdown().await?;
        Ok(())
    }
}

async fn read_trimmed_line<R>(reader: &mut R) -> Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = String::new();
    let n = reader.read_line(&mut buf).await?;
    if n == 0 {
        return Ok(None);
    }
    while buf.ends_with('\n') || buf.ends_with('\r') {
        buf.pop();
    }
    Ok(Some(buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_read_trimmed_line_strips_line_endings() {
        let mut reader = BufReader::new(&b"hello\r\nworld\n"[..]);

        let line = read_trimmed_line(&mut reader).await.unwrap();
        assert_eq!(line.as_deref(), Some("hello"));

        let line = read_trimmed_line(&mut reader).await.unwrap();
        assert_eq!(line.as_deref(), Some("world"));

        let line = read_trimmed_line(&mut reader).await.unwrap();
        assert_eq!(line, None);
    }

    #[tokio::test]
    async fn test_send_line_appends_newline() {
        let (client, mut server) = tokio::io::duplex(256);
        let writer = ConnectionWriter::new(client);

        writer.send_line("hello").await.unwrap();
        writer.send_line("world").await.unwrap();
        writer.shutdown().await.unwrap();

        let mut received = String::new();
        server.read_to_string(&mut received).await.unwrap();
        assert_eq!(received, "hello\nworld\n");
    }

    #[tokio::test]
    async fn test_writer_clones_share_the_same_sink() {
        let (client, mut server) = tokio::io::duplex(256);
        let writer = ConnectionWriter::new(client);
        let clone = writer.clone();

        writer.send_line("one").await.unwrap();
        clone.send_line("two").await.unwrap();
        drop(writer);
        drop(clone);

        let mut received = String::new();
        server.read_to_string(&mut received).await.unwrap();
        assert_eq!(received, "one\ntwo\n");
    }
}
