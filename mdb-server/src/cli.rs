//! Command-line arguments for the server binary.
//!
//! Each flag falls back to an `MDB_*` environment variable where one exists,
//! then to the [`ServerConfig`] defaults.

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;

use crate::config::{DEFAULT_MAX_LINE_LEN, ServerConfig};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "MemoryDB line protocol server", long_about = None)]
pub struct Cli {
    /// Socket address to listen on. Use port 0 for an ephemeral port.
    #[arg(long, env = "MDB_ADDR", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Seconds open connections get between the shutdown warning and
    /// forced closure.
    #[arg(long, env = "MDB_GRACE_PERIOD_SECS", default_value_t = 10)]
    pub grace_period_secs: u64,

    /// Longest accepted command line in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_LINE_LEN)]
    pub max_line_len: usize,
}

impl Cli {
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig::new(self.listen)
            .with_grace_period(Duration::from_secs(self.grace_period_secs))
            .with_max_line_len(self.max_line_len)
    }
}
