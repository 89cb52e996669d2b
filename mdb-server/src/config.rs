//! Server configuration.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Default listening port.
pub const DEFAULT_PORT: u16 = 8080;

/// Time between the shutdown warning and forced closure of open connections.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(10);

/// Upper bound on a single command line, terminator excluded.
pub const DEFAULT_MAX_LINE_LEN: usize = 8 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub grace_period: Duration,
    pub max_line_len: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            grace_period: DEFAULT_GRACE_PERIOD,
            max_line_len: DEFAULT_MAX_LINE_LEN,
        }
    }
}

impl ServerConfig {
    pub fn new(addr: SocketAddr) -> Self {
        ServerConfig {
            addr,
            ..ServerConfig::default()
        }
    }

    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    pub fn with_max_line_len(mut self, max_line_len: usize) -> Self {
        self.max_line_len = max_line_len;
        self
    }
}
