//! The actor's mailbox message type.
//!
//! Grounded on `sqlx-core/src/sqlite/connection/worker.rs`'s `Command` enum
//! and dedicated-worker-task pattern for serializing state mutation behind
//! message passing, applied here to the whole `Driver` rather than to a
//! single connection.

use tokio::sync::oneshot;

use crate::backend::{Backend, QueryResult, Row};
use crate::client::{Client, ClientHandle};
use crate::error::{BackendError, Result};

pub(crate) enum Command<B: Backend> {
    Start {
        reply: oneshot::Sender<Result<()>>,
    },
    Stop {
        reply: oneshot::Sender<Result<()>>,
    },
    Query {
        qs: String,
        reply: oneshot::Sender<Result<QueryResult<Row<B>>>>,
    },
    Begin {
        reply: oneshot::Sender<Result<ClientHandle<B>>>,
    },
    /// Delivered by the `connect()` task spawned from `schedule()`'s
    /// client-creation branch; never sent by a `Driver` caller.
    ClientCreated {
        outcome: std::result::Result<B::Connection, BackendError>,
    },
    /// Delivered when a unit of work completes, whether the client is headed
    /// back to the idle pool or about to be destroyed.
    Release {
        client: Client<B>,
        healthy: bool,
    },
}
