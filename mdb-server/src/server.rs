//! # Connection Supervisor
//!
//! Own the listening socket, accept connections, run one handler task per
//! connection and drive graceful shutdown.
//!
//! ## Lifecycle
//!
//! ```text
//! Running --stop()--> Stopping --all connections closed--> Stopped
//! ```
//!
//! - **Running**: the accept loop admits connections, assigns each a
//!   `ConnId`, records it in the registry and spawns a handler.
//! - **Stopping**: the listener is closed, open connections are warned, and
//!   after the grace period any connection still open is force-closed.
//! - **Stopped**: the accept loop has exited and no connection remains.
//!
//! The registry belongs to the accept loop task alone. Handlers report their
//! own exit over a channel instead of touching it.

use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::BytesMut;
use socket2::{Domain, Protocol, Socket, Type};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, mpsc, oneshot, watch};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use mdb_common::{MdbError, MdbResult, ProtocolError};
use mdb_engine::PersonStore;

use crate::config::ServerConfig;
use crate::interpreter::{Interpreter, Outcome, Reply};
use crate::metrics::{MetricsSnapshot, ServerMetrics};
use crate::protocol::{LineParser, WELCOME, frame_reply};

/// Locally assigned connection identifier.
pub type ConnId = u64;

const LISTEN_BACKLOG: i32 = 1024;
const READ_BUFFER_CAPACITY: usize = 4 * 1024;
/// Pause after a failed accept so a persistent error (e.g. fd exhaustion)
/// does not spin the loop.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// Supervisor lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Running,
    Stopping,
    Stopped,
}

/// Handle to a running server.
///
/// Dropping the handle without calling [`Server::stop`] also begins
/// shutdown, but nothing waits for it to finish.
pub struct Server {
    local_addr: SocketAddr,
    stop_tx: Option<oneshot::Sender<()>>,
    state: watch::Receiver<ServerState>,
    supervisor: JoinHandle<()>,
    metrics: Arc<ServerMetrics>,
}

impl Server {
    /// Binds the listening socket and spawns the accept loop.
    ///
    /// A bind failure is returned as `MdbError::Startup`.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn start<S>(config: ServerConfig, store: Arc<S>) -> MdbResult<Server>
    where
        S: PersonStore + ?Sized + 'static,
    {
        let listener = bind_listener(config.addr).map_err(|source| MdbError::Startup {
            addr: config.addr,
            source,
        })?;
        let local_addr = listener.local_addr().map_err(|source| MdbError::Startup {
            addr: config.addr,
            source,
        })?;

        let (stop_tx, stop_rx) = oneshot::channel();
        let (state_tx, state_rx) = watch::channel(ServerState::Running);
        let (closed_tx, closed_rx) = mpsc::unbounded_channel();
        let metrics = Arc::new(ServerMetrics::new());

        let supervisor = Supervisor {
            interpreter: Interpreter::new(store),
            config,
            registry: HashMap::new(),
            next_id: 0,
            closed_tx,
            closed_rx,
            state: state_tx,
            metrics: Arc::clone(&metrics),
        };
        let supervisor = tokio::spawn(supervisor.run(listener, stop_rx));

        info!(addr = %local_addr, "listening for clients");
        Ok(Server {
            local_addr,
            stop_tx: Some(stop_tx),
            state: state_rx,
            supervisor,
            metrics,
        })
    }

    /// Address the listener is bound to; useful when binding port 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn state(&self) -> ServerState {
        *self.state.borrow()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Requests shutdown and waits until every connection is closed.
    pub async fn stop(mut self) {
        info!("stopping the database server");
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Err(err) = (&mut self.supervisor).await {
            warn!(error = %err, "accept loop terminated abnormally");
        }
        info!("database server stopped");
    }

    /// Runs until `shutdown` resolves, then stops gracefully.
    pub async fn run_until<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        shutdown.await;
        self.stop().await;
    }
}

fn bind_listener(addr: SocketAddr) -> io::Result<TcpListener> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(LISTEN_BACKLOG)?;
    TcpListener::from_std(socket.into())
}

type SharedWriter = Arc<Mutex<OwnedWriteHalf>>;

/// Registry entry for one live connection.
struct ConnectionHandle {
    peer: SocketAddr,
    writer: SharedWriter,
    task: JoinHandle<()>,
}

struct Supervisor<S: PersonStore + ?Sized> {
    interpreter: Interpreter<S>,
    config: ServerConfig,
    registry: HashMap<ConnId, ConnectionHandle>,
    next_id: ConnId,
    closed_tx: mpsc::UnboundedSender<ConnId>,
    closed_rx: mpsc::UnboundedReceiver<ConnId>,
    state: watch::Sender<ServerState>,
    metrics: Arc<ServerMetrics>,
}

impl<S: PersonStore + ?Sized + 'static> Supervisor<S> {
    async fn run(mut self, listener: TcpListener, mut stop_rx: oneshot::Receiver<()>) {
        loop {
            tokio::select! {
                _ = &mut stop_rx => break,
                Some(conn_id) = self.closed_rx.recv() => self.deregister(conn_id),
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => self.admit(stream, peer),
                    Err(err) => {
                        warn!(error = %err, "failed to accept connection");
                        tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                    }
                },
            }
        }

        self.state.send_replace(ServerState::Stopping);
        info!("shutting down the server");
        drop(listener);

        self.drain().await;

        self.state.send_replace(ServerState::Stopped);
        info!(summary = %self.metrics.snapshot(), "accept loop exited");
    }

    fn admit(&mut self, stream: TcpStream, peer: SocketAddr) {
        let conn_id = self.next_id;
        self.next_id += 1;

        let (reader, writer) = stream.into_split();
        let writer = Arc::new(Mutex::new(writer));
        let session = Session {
            conn_id,
            reader,
            writer: Arc::clone(&writer),
            interpreter: self.interpreter.clone(),
            parser: LineParser::new(self.config.max_line_len),
            metrics: Arc::clone(&self.metrics),
        };
        let closed_tx = self.closed_tx.clone();
        let task = tokio::spawn(async move {
            if let Err(err) = session.run().await {
                warn!(conn_id, %peer, error = %err, "client session ended with error");
            }
            let _ = closed_tx.send(conn_id);
        });

        self.metrics.record_connection_opened();
        self.registry
            .insert(conn_id, ConnectionHandle { peer, writer, task });
        info!(conn_id, %peer, "client joined");
    }

    fn deregister(&mut self, conn_id: ConnId) {
        if let Some(handle) = self.registry.remove(&conn_id) {
            self.metrics.record_connection_closed();
            info!(conn_id, peer = %handle.peer, "client left");
        }
    }

    /// Warns open connections, waits out the grace period, then force-closes
    /// whatever is still open.
    async fn drain(&mut self) {
        if self.registry.is_empty() {
            return;
        }

        let grace = self.config.grace_period;
        let warning = frame_reply(&format!("server is shutting down in {grace:?}"));
        let mut warnings = JoinSet::new();
        for (&conn_id, handle) in &self.registry {
            let writer = Arc::clone(&handle.writer);
            let warning = warning.clone();
            warnings.spawn(async move {
                if let Err(err) = send_frame(&writer, &warning).await {
                    debug!(conn_id, error = %err, "failed to deliver shutdown warning");
                }
            });
        }
        info!(open = self.registry.len(), ?grace, "warned open connections");

        let deadline = tokio::time::sleep(grace);
        tokio::pin!(deadline);
        while !self.registry.is_empty() {
            tokio::select! {
                _ = &mut deadline => break,
                Some(conn_id) = self.closed_rx.recv() => self.deregister(conn_id),
            }
        }

        warnings.shutdown().await;
        self.force_close().await;
    }

    async fn force_close(&mut self) {
        if self.registry.is_empty() {
            return;
        }
        let handles: Vec<_> = self.registry.drain().collect();
        let count = handles.len();
        info!(count, "closing all connections");

        for (conn_id, ConnectionHandle { peer, writer, task }) in handles {
            task.abort();
            let _ = task.await;
            if let Err(err) = writer.lock().await.shutdown().await {
                debug!(conn_id, error = %err, "could not shut down connection");
            }
            self.metrics.record_connection_closed();
            info!(conn_id, %peer, "connection force-closed");
        }
        self.metrics.record_force_closed(count as u64);
    }
}

/// Writes one framed reply and flushes it.
async fn send_frame(writer: &SharedWriter, frame: &str) -> io::Result<()> {
    let mut writer = writer.lock().await;
    writer.write_all(frame.as_bytes()).await?;
    writer.flush().await
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Close,
}

/// What the framer produced from the buffered bytes.
enum Input {
    Line(String),
    /// No complete line yet; read more.
    Pending,
    /// Framing error the session cannot recover from.
    Rejected,
}

/// Per-connection command loop.
struct Session<S: PersonStore + ?Sized> {
    conn_id: ConnId,
    reader: OwnedReadHalf,
    writer: SharedWriter,
    interpreter: Interpreter<S>,
    parser: LineParser,
    metrics: Arc<ServerMetrics>,
}

impl<S: PersonStore + ?Sized> Session<S> {
    async fn run(mut self) -> MdbResult<()> {
        send_frame(&self.writer, &frame_reply(WELCOME)).await?;

        let mut buf = BytesMut::with_capacity(READ_BUFFER_CAPACITY);
        loop {
            loop {
                match self.next_line(&mut buf).await? {
                    Input::Line(line) => {
                        if self.handle_line(&line).await? == Flow::Close {
                            debug!(conn_id = self.conn_id, "client requested exit");
                            return self.close().await;
                        }
                    }
                    Input::Pending => break,
                    Input::Rejected => return self.close().await,
                }
            }

            if self.reader.read_buf(&mut buf).await? == 0 {
                // Peer closed; an unterminated final line still runs, but its
                // reply has nowhere reliable to go.
                if let Ok(Some(line)) = self.parser.finish(&mut buf) {
                    let _ = self.handle_line(&line).await;
                }
                debug!(conn_id = self.conn_id, "peer closed the connection");
                return Ok(());
            }
        }
    }

    /// Pulls the next complete line, answering framing errors. Invalid UTF-8
    /// is skipped; an overlong line ends the session.
    async fn next_line(&mut self, buf: &mut BytesMut) -> MdbResult<Input> {
        loop {
            match self.parser.parse(buf) {
                Ok(Some(line)) => return Ok(Input::Line(line)),
                Ok(None) => return Ok(Input::Pending),
                Err(err @ ProtocolError::InvalidUtf8) => {
                    self.reply(&Reply::Failed(err.into())).await?;
                }
                Err(err @ ProtocolError::LineTooLong { .. }) => {
                    self.reply(&Reply::Failed(err.into())).await?;
                    debug!(conn_id = self.conn_id, error = %err, "closing session");
                    return Ok(Input::Rejected);
                }
            }
        }
    }

    async fn handle_line(&self, line: &str) -> MdbResult<Flow> {
        let started = Instant::now();
        let Some(response) = self.interpreter.interpret(line) else {
            return Ok(Flow::Continue);
        };

        match response.outcome {
            Outcome::Close => {
                self.metrics
                    .record_command(response.kind, false, started.elapsed());
                Ok(Flow::Close)
            }
            Outcome::Reply(reply) => {
                self.metrics
                    .record_command(response.kind, reply.is_error(), started.elapsed());
                debug!(
                    conn_id = self.conn_id,
                    command = %response.kind,
                    error = reply.is_error(),
                    "handled command"
                );
                self.reply(&reply).await?;
                Ok(Flow::Continue)
            }
        }
    }

    async fn reply(&self, reply: &Reply) -> MdbResult<()> {
        send_frame(&self.writer, &frame_reply(&reply.to_string())).await?;
        Ok(())
    }

    async fn close(self) -> MdbResult<()> {
        self.writer.lock().await.shutdown().await?;
        Ok(())
    }
}
