//! The actor owning all pool state.
//!
//! Grounded on `sqlx-core/src/pool/inner.rs`'s `SharedPool` (the counters and
//! idle/active bookkeeping) combined with
//! `sqlx-core/src/sqlite/connection/worker.rs`'s mailbox loop for the actual
//! ownership model: every mutation of status, counters, the idle pool, and
//! the work queue happens on this one task, never behind a lock on an
//! individual field.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use crate::backend::{Backend, Connection, TypeFormat, TypeParser};
use crate::client::Client;
use crate::config::Normalized;
use crate::error::{Error, ExhaustedFailureBudget, Result};
use crate::logger::log_error;

use super::command::Command;
use super::idle::IdlePool;
use super::queue::{PendingRequest, WorkQueue};
use super::{DriverStatus, Shared};

pub(crate) struct DriverActor<B: Backend> {
    backend: Arc<B>,
    connection_url: String,
    type_parsers: Arc<Vec<(u32, TypeFormat, TypeParser)>>,
    shared: Arc<Shared>,

    status: DriverStatus,
    status_mirror: Arc<AtomicU8>,

    clients_count: u32,
    clients_active: u32,
    #[allow(dead_code)] // recorded but never enforced here
    clients_minimum: u32,
    clients_maximum: u32,

    failures_count: u32,
    failures_maximum: u32,
    ever_connected: bool,

    idle: IdlePool<B>,
    queue: WorkQueue<B>,
    next_tx_id: i64,
    delayed_stop: Option<oneshot::Sender<Result<()>>>,

    mailbox: mpsc::UnboundedSender<Command<B>>,
}

impl<B: Backend> DriverActor<B> {
    pub(crate) fn new(
        config: Normalized<B>,
        mailbox: mpsc::UnboundedSender<Command<B>>,
        status_mirror: Arc<AtomicU8>,
    ) -> Self {
        let shared = Arc::new(Shared {
            logger: config.logger,
            compiler: config.compiler,
            debug_queries: config.debug_queries,
            debug_results: config.debug_results,
        });

        Self {
            backend: config.backend,
            connection_url: config.connection_url,
            type_parsers: Arc::new(config.type_parsers),
            shared,
            status: DriverStatus::Pending,
            status_mirror,
            clients_count: 0,
            clients_active: 0,
            clients_minimum: config.min_connections,
            clients_maximum: config.max_connections,
            failures_count: 0,
            failures_maximum: config.maximum_failures,
            ever_connected: false,
            idle: IdlePool::new(),
            queue: WorkQueue::new(),
            next_tx_id: 0,
            delayed_stop: None,
            mailbox,
        }
    }

    pub(crate) async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command<B>>) {
        while let Some(command) = rx.recv().await {
            match command {
                Command::Start { reply } => self.handle_start(reply),
                Command::Stop { reply } => self.handle_stop(reply),
                Command::Query { qs, reply } => self.handle_query(qs, reply),
                Command::Begin { reply } => self.handle_begin(reply),
                Command::ClientCreated { outcome } => self.handle_client_created(outcome),
                Command::Release { client, healthy } => self.handle_release(client, healthy),
            }
        }
    }

    fn set_status(&mut self, status: DriverStatus) {
        self.status = status;
        self.status_mirror.store(status as u8, Ordering::Release);
    }

    // -- lifecycle -----------------------------------------------------

    fn handle_start(&mut self, reply: oneshot::Sender<Result<()>>) {
        if self.status != DriverStatus::Pending {
            let _ = reply.send(Err(Error::DriverState(format!(
                "cannot start a driver in status '{}'",
                self.status
            ))));
            return;
        }

        self.set_status(DriverStatus::Running);
        let _ = reply.send(Ok(()));
    }

    fn handle_stop(&mut self, reply: oneshot::Sender<Result<()>>) {
        if self.status != DriverStatus::Running || self.delayed_stop.is_some() {
            let _ = reply.send(Err(Error::DriverState(format!(
                "cannot stop a driver in status '{}'",
                self.status
            ))));
            return;
        }

        self.set_status(DriverStatus::Stopping);

        if self.clients_active == 0 {
            self.finish_stopping();
            let _ = reply.send(Ok(()));
        } else {
            self.delayed_stop = Some(reply);
        }
    }

    /// Drains and destroys the idle pool, fails any request still sitting in
    /// the queue (otherwise a stopped driver could silently drop a callback —
    /// see `DESIGN.md`), and marks the driver stopped.
    fn finish_stopping(&mut self) {
        for client in self.idle.drain() {
            tokio::spawn(client.destroy());
        }

        self.fail_all_queued(|| {
            Error::DriverState("driver stopped while this request was still queued".into())
        });

        self.set_status(DriverStatus::Stopped);

        if let Some(reply) = self.delayed_stop.take() {
            let _ = reply.send(Ok(()));
        }
    }

    fn fail_all_queued<F: Fn() -> Error>(&mut self, make_err: F) {
        for pending in self.queue.drain() {
            match pending {
                PendingRequest::Query { reply, .. } => {
                    let _ = reply.send(Err(make_err()));
                }
                PendingRequest::Begin { reply } => {
                    let _ = reply.send(Err(make_err()));
                }
            }
        }
    }

    // -- admission -------------------------------------------------------

    fn handle_query(
        &mut self,
        qs: String,
        reply: oneshot::Sender<Result<crate::backend::QueryResult<crate::backend::Row<B>>>>,
    ) {
        if self.status != DriverStatus::Running {
            let _ = reply.send(Err(Error::DriverState(format!(
                "cannot query a driver in status '{}'",
                self.status
            ))));
            return;
        }

        match self.idle.pop() {
            Some(client) => self.dispatch_query(client, qs, reply),
            None => {
                self.queue.push_back(PendingRequest::Query { qs, reply });
                self.schedule();
            }
        }
    }

    fn handle_begin(&mut self, reply: oneshot::Sender<Result<crate::client::ClientHandle<B>>>) {
        if self.status != DriverStatus::Running {
            let _ = reply.send(Err(Error::DriverState(format!(
                "cannot begin a transaction on a driver in status '{}'",
                self.status
            ))));
            return;
        }

        match self.idle.pop() {
            Some(client) => self.dispatch_begin(client, reply),
            None => {
                self.queue.push_back(PendingRequest::Begin { reply });
                self.schedule();
            }
        }
    }

    /// Pop an idle client for the
    /// queue head, else start a new connection if under `clients_maximum`,
    /// else wait. Invoked after enqueue, client creation, and client release.
    fn schedule(&mut self) {
        if self.queue.is_empty() {
            return;
        }

        if let Some(client) = self.idle.pop() {
            let pending = self.queue.pop_front().expect("queue was just checked non-empty");
            match pending {
                PendingRequest::Query { qs, reply } => self.dispatch_query(client, qs, reply),
                PendingRequest::Begin { reply } => self.dispatch_begin(client, reply),
            }
        } else if self.clients_count < self.clients_maximum {
            self.clients_count += 1;
            self.spawn_connect();
        }
    }

    fn dispatch_query(
        &mut self,
        mut client: Client<B>,
        qs: String,
        reply: oneshot::Sender<Result<crate::backend::QueryResult<crate::backend::Row<B>>>>,
    ) {
        self.clients_active += 1;
        let mailbox = self.mailbox.clone();

        tokio::spawn(async move {
            let result = client.query(qs).await;
            let healthy = result.is_ok();
            let _ = reply.send(result);
            let _ = mailbox.send(Command::Release { client, healthy });
        });
    }

    fn dispatch_begin(&mut self, mut client: Client<B>, reply: oneshot::Sender<Result<crate::client::ClientHandle<B>>>) {
        self.clients_active += 1;
        self.next_tx_id += 1;
        client.begin_transaction(self.next_tx_id);
        let handle = crate::client::ClientHandle::new(client, self.mailbox.clone());
        let _ = reply.send(Ok(handle));
    }

    // -- client lifecycle --------------------------------------------------

    fn spawn_connect(&mut self) {
        let backend = Arc::clone(&self.backend);
        let url = self.connection_url.clone();
        let type_parsers = Arc::clone(&self.type_parsers);
        let mailbox = self.mailbox.clone();

        tokio::spawn(async move {
            let outcome = backend.connect(&url).await.map(|mut conn| {
                for (oid, format, parser) in type_parsers.iter() {
                    conn.set_type_parser(*oid, *format, Arc::clone(parser));
                }
                conn
            });
            let _ = mailbox.send(Command::ClientCreated { outcome });
        });
    }

    fn handle_client_created(&mut self, outcome: std::result::Result<B::Connection, crate::error::BackendError>) {
        if self.status != DriverStatus::Running {
            // A connect() raced a stop()/terminal failure that already
            // drained the queue; this connection has nothing left to serve.
            if let Ok(conn) = outcome {
                tokio::spawn(Client::new(conn, Arc::clone(&self.shared)).destroy());
            }
            self.clients_count = self.clients_count.saturating_sub(1);
            return;
        }

        match outcome {
            Ok(conn) => {
                self.ever_connected = true;
                let client = Client::new(conn, Arc::clone(&self.shared));
                self.client_became_idle(client);
            }
            Err(err) => {
                self.clients_count -= 1;
                log_error!(self.shared.logger, "connection attempt failed: {err}");

                if self.clients_count > 0 {
                    // Another connection exists or is already being created;
                    // this request's failure is silently absorbed.
                } else if !self.ever_connected {
                    self.failures_count += 1;
                    if self.failures_count >= self.failures_maximum {
                        let message = format!(
                            "connection failure budget exhausted ({} consecutive failures): {err}",
                            self.failures_maximum
                        );
                        self.fail_all_queued(|| Error::backend(ExhaustedFailureBudget(message.clone())));
                        self.set_status(DriverStatus::Stopped);
                    } else {
                        self.schedule();
                    }
                } else {
                    self.schedule();
                }
            }
        }
    }

    /// Hands a client that just became free (fresh from `connect()`, or
    /// released and healthy) to the next queued request, or pools it.
    fn client_became_idle(&mut self, client: Client<B>) {
        match self.queue.pop_front() {
            Some(PendingRequest::Query { qs, reply }) => self.dispatch_query(client, qs, reply),
            Some(PendingRequest::Begin { reply }) => self.dispatch_begin(client, reply),
            None => self.idle.push(client),
        }
    }

    fn handle_release(&mut self, mut client: Client<B>, healthy: bool) {
        self.clients_active -= 1;

        if healthy && !client.is_failed() && self.status == DriverStatus::Running {
            client.reset_for_pool();
            self.client_became_idle(client);
        } else {
            self.clients_count -= 1;
            if client.is_failed() {
                log_error!(
                    self.shared.logger,
                    "destroying failed client; last query was: {}",
                    client.last_query()
                );
            }
            tokio::spawn(client.destroy());
            self.schedule();
        }

        if self.clients_active == 0 && self.status == DriverStatus::Stopping {
            self.finish_stopping();
        }
    }
}
