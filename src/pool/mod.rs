//! The connection pool and query dispatcher.
//!
//! [`Driver`] is a cheap, `Clone`-free handle over an actor task
//! ([`inner::DriverActor`]) that owns every piece of mutable pool state —
//! counters, idle pool, work queue, failure budget, delayed-stop slot —
//! behind a `tokio::sync::mpsc` mailbox, per the design notes' explicit
//! actor-over-locks guidance. Shaped after
//! `sqlx-core/src/pool/mod.rs`'s `Pool<DB>` (a thin handle over
//! `Arc<SharedPool<DB>>`) combined with the dedicated-worker-task pattern in
//! `sqlx-core/src/sqlite/connection/worker.rs`.

pub(crate) mod command;
pub(crate) mod idle;
mod inner;
pub(crate) mod queue;

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use crate::backend::{Backend, QueryResult, Row};
use crate::client::ClientHandle;
use crate::compiler::{Compiler, Query};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logger::AppLogger;
use command::Command;
use inner::DriverActor;

/// The `Driver`'s lifecycle status. `Pending` is the only valid starting
/// point; transitions are otherwise monotonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DriverStatus {
    Pending = 0,
    Starting = 1,
    Running = 2,
    Stopping = 3,
    Stopped = 4,
}

impl DriverStatus {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => DriverStatus::Pending,
            1 => DriverStatus::Starting,
            2 => DriverStatus::Running,
            3 => DriverStatus::Stopping,
            _ => DriverStatus::Stopped,
        }
    }
}

impl std::fmt::Display for DriverStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DriverStatus::Pending => "pending",
            DriverStatus::Starting => "starting",
            DriverStatus::Running => "running",
            DriverStatus::Stopping => "stopping",
            DriverStatus::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// Context shared by every `Client` and `ClientHandle` in a pool: the
/// logging/debug-flag/compiler surface that doesn't belong to any one
/// connection. Mirrors `sqlx-core`'s convention of handing connections a
/// reference back to pool-wide configuration rather than copying it per
/// connection.
pub(crate) struct Shared {
    pub(crate) logger: Arc<dyn AppLogger>,
    pub(crate) compiler: Arc<dyn Compiler>,
    pub(crate) debug_queries: bool,
    pub(crate) debug_results: bool,
}

/// The pool handle applications hold: `start`/`stop`/`status`/`dialect` for
/// lifecycle, `query`/`begin` for work.
pub struct Driver<B: Backend> {
    mailbox: mpsc::UnboundedSender<Command<B>>,
    status: Arc<AtomicU8>,
    dialect: String,
    compiler: Arc<dyn Compiler>,
}

impl<B: Backend> Driver<B> {
    /// Validates and normalizes `config`, then spawns the owning actor task.
    /// The returned handle starts in [`DriverStatus::Pending`] — call
    /// [`start`](Self::start) before issuing any query.
    pub fn new(config: Config<B>) -> Result<Self> {
        let normalized = config.normalize()?;
        let dialect_tag = normalized.dialect.tag().to_owned();
        let compiler = Arc::clone(&normalized.compiler);

        let (tx, rx) = mpsc::unbounded_channel();
        let status = Arc::new(AtomicU8::new(DriverStatus::Pending as u8));

        let actor = DriverActor::new(normalized, tx.clone(), Arc::clone(&status));
        tokio::spawn(actor.run(rx));

        Ok(Self {
            mailbox: tx,
            status,
            dialect: dialect_tag,
            compiler,
        })
    }

    pub fn status(&self) -> DriverStatus {
        DriverStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    pub fn dialect(&self) -> &str {
        &self.dialect
    }

    /// Legal only from [`DriverStatus::Pending`].
    pub async fn start(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Start { reply })?;
        recv(rx).await
    }

    /// Legal only from [`DriverStatus::Running`] with no stop already pending.
    /// Resolves once every active client has drained.
    pub async fn stop(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Stop { reply })?;
        recv(rx).await
    }

    /// Compiles `q` and runs it on a pooled connection, creating or queueing
    /// one as needed. Requires [`DriverStatus::Running`].
    pub async fn query(&self, q: impl Query) -> Result<QueryResult<Row<B>>> {
        let qs = self.compiler.compile(&q);
        let (reply, rx) = oneshot::channel();
        self.send(Command::Query { qs, reply })?;
        recv(rx).await
    }

    /// Runs `q` inside an already-open transaction, bypassing admission
    /// control entirely — the transaction's `Client` is already checked out
    ///.
    pub async fn query_tx(&self, q: impl Query, tx: &mut ClientHandle<B>) -> Result<QueryResult<Row<B>>> {
        let qs = self.compiler.compile(&q);
        tx.query_compiled(qs).await
    }

    /// Opens a transaction on a pooled connection, creating or queueing one
    /// as needed. Requires [`DriverStatus::Running`].
    pub async fn begin(&self) -> Result<ClientHandle<B>> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Begin { reply })?;
        recv(rx).await
    }

    fn send(&self, command: Command<B>) -> Result<()> {
        self.mailbox
            .send(command)
            .map_err(|_| Error::DriverState("the driver's actor task has shut down".into()))
    }
}

async fn recv<T>(rx: oneshot::Receiver<Result<T>>) -> Result<T> {
    rx.await
        .map_err(|_| Error::DriverState("the driver's actor task has shut down".into()))?
}
