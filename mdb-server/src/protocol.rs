//! # Line Protocol
//!
//! Split a streaming TCP buffer into newline-terminated command lines and
//! frame replies with the prompt marker.
//!
//! ## Design Principles
//!
//! 1. **Streaming Friendly**: The parser consumes from a mutable buffer and
//!    returns `None` when more data is needed.
//! 2. **Bounded**: A line longer than the configured maximum is a protocol
//!    error instead of unbounded buffer growth.
//! 3. **Text Framing**: Replies end with `\n-> `; there are no length
//!    prefixes, so clients scan for the prompt to find the end of a reply.
//!
//! ## Frame Example
//!
//! ```text
//! client: get 7f3c\n
//! server: ID: 7f3c\nName: alice\nAge: 30\nHobbies: [chess]\n->
//! ```

use bytes::{Buf, BytesMut};

use mdb_common::ProtocolError;

/// Token written after every reply so clients can detect its end.
pub const PROMPT: &str = "-> ";

/// Greeting sent to every newly accepted connection.
pub const WELCOME: &str = "Welcome to MemoryDB server";

/// Incremental line splitter for one connection.
#[derive(Debug)]
pub struct LineParser {
    max_line_len: usize,
    /// Bytes already scanned for `\n` in the current buffer.
    scanned: usize,
}

impl LineParser {
    pub fn new(max_line_len: usize) -> Self {
        LineParser {
            max_line_len,
            scanned: 0,
        }
    }

    /// Attempts to take one complete line from the buffer.
    ///
    /// Returns `Ok(None)` if more data is required. The terminator and an
    /// optional preceding `\r` are not part of the returned line. An invalid
    /// UTF-8 line is consumed before the error is returned, so the caller can
    /// keep reading.
    pub fn parse(&mut self, buf: &mut BytesMut) -> Result<Option<String>, ProtocolError> {
        match buf[self.scanned..].iter().position(|&b| b == b'\n') {
            Some(offset) => {
                let end = self.scanned + offset;
                self.scanned = 0;
                if end > self.max_line_len {
                    buf.advance(end + 1);
                    return Err(ProtocolError::LineTooLong {
                        max: self.max_line_len,
                    });
                }
                let line = buf.split_to(end);
                buf.advance(1);
                decode(&line).map(Some)
            }
            None => {
                self.scanned = buf.len();
                if buf.len() > self.max_line_len {
                    return Err(ProtocolError::LineTooLong {
                        max: self.max_line_len,
                    });
                }
                Ok(None)
            }
        }
    }

    /// Drains an unterminated trailing line once the peer has closed.
    pub fn finish(&mut self, buf: &mut BytesMut) -> Result<Option<String>, ProtocolError> {
        self.scanned = 0;
        if buf.is_empty() {
            return Ok(None);
        }
        let line = buf.split();
        decode(&line).map(Some)
    }
}

fn decode(line: &[u8]) -> Result<String, ProtocolError> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    std::str::from_utf8(line)
        .map(str::to_owned)
        .map_err(|_| ProtocolError::InvalidUtf8)
}

/// Frames a reply body: the body, a newline, then the prompt marker.
pub fn frame_reply(body: &str) -> String {
    let mut framed = String::with_capacity(body.len() + 1 + PROMPT.len());
    framed.push_str(body);
    framed.push('\n');
    framed.push_str(PROMPT);
    framed
}
