//! # MemoryDB Error Types
//!
//! ## Design Principles
//!
//! 1. **Categorized**: Every error maps to a coarse category (client,
//!    transport, startup) that decides how far it may propagate.
//! 2. **Contained**: Client and transport errors end at most one session;
//!    only startup errors are fatal to the server.
//! 3. **Absence Is Not Failure**: Store lookups return `Option`/`bool`;
//!    `NotFound` exists only so front ends can render it uniformly.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

use crate::validate::ValidationErrors;

/// Result type used across MemoryDB components.
pub type MdbResult<T> = core::result::Result<T, MdbError>;

/// High-level category for grouping errors.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum MdbErrorCategory {
    /// Bad input from a client; reported back, never logged as a fault.
    Client,
    /// Read/write failure on a single connection.
    Transport,
    /// The server could not be brought up.
    Startup,
}

impl MdbErrorCategory {
    /// Returns true if the category aborts the whole server.
    pub const fn is_fatal(self) -> bool {
        matches!(self, Self::Startup)
    }
}

/// Framing failures detected while splitting the input stream into lines.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Error)]
pub enum ProtocolError {
    /// A line exceeded the configured maximum length.
    #[error("line exceeds {max} bytes")]
    LineTooLong { max: usize },
    /// A line was not valid UTF-8.
    #[error("line is not valid utf-8")]
    InvalidUtf8,
}

#[derive(Debug, Error)]
pub enum MdbError {
    #[error("{0}")]
    Validation(ValidationErrors),

    #[error("Person with ID {id} not found")]
    NotFound { id: String },

    #[error("unknown command: {line}")]
    UnknownCommand { line: String },

    #[error("invalid input: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("transport error: {0}")]
    Transport(#[from] io::Error),

    #[error("failed to listen on {addr}: {source}")]
    Startup {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
}

impl MdbError {
    pub fn not_found(id: impl Into<String>) -> Self {
        MdbError::NotFound { id: id.into() }
    }

    pub fn unknown_command(line: impl Into<String>) -> Self {
        MdbError::UnknownCommand { line: line.into() }
    }

    /// Returns the coarse category of the error.
    pub const fn category(&self) -> MdbErrorCategory {
        match self {
            Self::Validation(_)
            | Self::NotFound { .. }
            | Self::UnknownCommand { .. }
            | Self::Protocol(_) => MdbErrorCategory::Client,
            Self::Transport(_) => MdbErrorCategory::Transport,
            Self::Startup { .. } => MdbErrorCategory::Startup,
        }
    }

    /// Returns true if the error must stop the server.
    pub const fn is_fatal(&self) -> bool {
        self.category().is_fatal()
    }
}

impl From<ValidationErrors> for MdbError {
    fn from(errors: ValidationErrors) -> Self {
        MdbError::Validation(errors)
    }
}
