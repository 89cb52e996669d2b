//! # MemoryDB Client
//!
//! Minimal async client for the MemoryDB line protocol.
//!
//! Every server reply ends with `\n-> `, so the client buffers incoming bytes
//! and splits on that marker. Replies are returned without the marker.

use std::io;
use std::net::SocketAddr;

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Bytes that terminate every server reply.
pub const REPLY_TERMINATOR: &[u8] = b"\n-> ";

pub struct Client {
    stream: TcpStream,
    buf: BytesMut,
    welcome: String,
}

impl Client {
    /// Connects and consumes the welcome reply.
    pub async fn connect(addr: SocketAddr) -> io::Result<Client> {
        let stream = TcpStream::connect(addr).await?;
        let mut client = Client {
            stream,
            buf: BytesMut::with_capacity(4096),
            welcome: String::new(),
        };
        client.welcome = client.read_reply().await?.ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "closed before welcome")
        })?;
        Ok(client)
    }

    /// The greeting the server sent on connect.
    pub fn welcome(&self) -> &str {
        &self.welcome
    }

    /// Sends one command line and waits for its reply.
    pub async fn request(&mut self, line: &str) -> io::Result<String> {
        self.send_line(line).await?;
        self.read_reply().await?.ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "connection closed mid-reply")
        })
    }

    /// Sends one command line without waiting for a reply.
    pub async fn send_line(&mut self, line: &str) -> io::Result<()> {
        let mut frame = Vec::with_capacity(line.len() + 1);
        frame.extend_from_slice(line.as_bytes());
        frame.push(b'\n');
        self.stream.write_all(&frame).await?;
        self.stream.flush().await
    }

    /// Reads the next complete reply. Returns `Ok(None)` once the server has
    /// closed the connection and no complete reply remains.
    pub async fn read_reply(&mut self) -> io::Result<Option<String>> {
        loop {
            if let Some(reply) = self.take_reply()? {
                return Ok(Some(reply));
            }
            if self.stream.read_buf(&mut self.buf).await? == 0 {
                return Ok(None);
            }
        }
    }

    fn take_reply(&mut self) -> io::Result<Option<String>> {
        let Some(end) = self
            .buf
            .windows(REPLY_TERMINATOR.len())
            .position(|window| window == REPLY_TERMINATOR)
        else {
            return Ok(None);
        };
        let reply = self.buf.split_to(end);
        self.buf.advance(REPLY_TERMINATOR.len());
        String::from_utf8(reply.to_vec())
            .map(Some)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
    }
}
