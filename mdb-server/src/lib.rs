//! # MemoryDB Server
//!
//! A line-oriented TCP front end for the person record store.
//!
//! - [`protocol`] splits the byte stream into lines and frames replies with
//!   the prompt marker.
//! - [`command`] parses a line into a typed command.
//! - [`interpreter`] validates input, runs the store operation and renders
//!   the reply.
//! - [`server`] owns the listener, the connection registry and the shutdown
//!   protocol.
//! - [`config`], [`cli`] and [`metrics`] carry the ambient concerns.

pub mod cli;
pub mod command;
pub mod config;
pub mod interpreter;
pub mod metrics;
pub mod protocol;
pub mod server;

pub use config::ServerConfig;
pub use server::{Server, ServerState};
