//! # Server Metrics
//!
//! Lightweight counters for connections and commands, plus a command latency
//! histogram.
//!
//! ## Design Principles
//! 1. **Accumulator Pattern**: Atomic counters aggregate events cheaply from
//!    every handler task.
//! 2. **Fixed Buckets**: Histogram buckets live in a contiguous array.
//! 3. **Snapshots**: Readers get plain structs, never references into the
//!    live counters.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::command::CommandKind;

/// Command latency bucket boundaries in microseconds.
///
/// Store operations are in-memory scans, so most samples land in the first
/// few buckets.
pub const COMMAND_LATENCY_BUCKETS_US: [u64; 8] = [5, 10, 25, 50, 100, 250, 1_000, 10_000];

/// Point-in-time view of [`ServerMetrics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub connections_accepted: u64,
    pub connections_open: u64,
    pub connections_force_closed: u64,
    /// Command counts indexed by [`CommandKind::index`].
    pub commands: [u64; CommandKind::COUNT],
    /// Replies that reported a client error.
    pub client_errors: u64,
    /// Bucket counts, with the overflow bucket last.
    pub latency_buckets: [u64; COMMAND_LATENCY_BUCKETS_US.len() + 1],
}

impl MetricsSnapshot {
    pub fn commands_total(&self) -> u64 {
        self.commands.iter().sum()
    }

    pub fn command_count(&self, kind: CommandKind) -> u64 {
        self.commands[kind.index()]
    }
}

impl fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "connections accepted={} force_closed={}; commands total={} errors={}",
            self.connections_accepted,
            self.connections_force_closed,
            self.commands_total(),
            self.client_errors
        )?;
        for kind in CommandKind::ALL {
            let count = self.command_count(kind);
            if count > 0 {
                write!(f, " {kind}={count}")?;
            }
        }
        Ok(())
    }
}

/// Thread-safe metrics shared by the supervisor and every handler.
///
/// `Ordering::Relaxed` is enough; no reader relies on ordering between
/// counters.
#[derive(Debug, Default)]
pub struct ServerMetrics {
    connections_accepted: AtomicU64,
    connections_open: AtomicU64,
    connections_force_closed: AtomicU64,
    commands: [AtomicU64; CommandKind::COUNT],
    client_errors: AtomicU64,
    latency_buckets: [AtomicU64; COMMAND_LATENCY_BUCKETS_US.len() + 1],
}

impl ServerMetrics {
    pub fn new() -> Self {
        ServerMetrics::default()
    }

    pub fn record_connection_opened(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
        self.connections_open.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_connection_closed(&self) {
        self.connections_open.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn record_force_closed(&self, count: u64) {
        self.connections_force_closed
            .fetch_add(count, Ordering::Relaxed);
    }

    /// Records one executed command and how long it took.
    pub fn record_command(&self, kind: CommandKind, is_error: bool, latency: Duration) {
        self.commands[kind.index()].fetch_add(1, Ordering::Relaxed);
        if is_error {
            self.client_errors.fetch_add(1, Ordering::Relaxed);
        }
        let micros = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        let bucket = COMMAND_LATENCY_BUCKETS_US
            .iter()
            .position(|&bound| micros <= bound)
            .unwrap_or(COMMAND_LATENCY_BUCKETS_US.len());
        self.latency_buckets[bucket].fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_accepted: self.connections_accepted.load(Ordering::Relaxed),
            connections_open: self.connections_open.load(Ordering::Relaxed),
            connections_force_closed: self.connections_force_closed.load(Ordering::Relaxed),
            commands: self.commands.each_ref().map(|c| c.load(Ordering::Relaxed)),
            client_errors: self.client_errors.load(Ordering::Relaxed),
            latency_buckets: self
                .latency_buckets
                .each_ref()
                .map(|b| b.load(Ordering::Relaxed)),
        }
    }
}
