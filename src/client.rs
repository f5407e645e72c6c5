//! The per-connection transaction state machine.
//!
//! [`Client`] owns one backend connection and is the unit the pool hands
//! around; [`ClientHandle`] is the checked-out form returned by
//! [`Driver::begin`](crate::pool::Driver::begin), exposing `query`/`commit`/
//! `rollback` to the caller for the lifetime of one transaction. Grounded on
//! `sqlx-core/src/pool/inner.rs`'s `Live<DB>` wrapper (a connection handle
//! carrying enough context to release itself), combined with the lazy-BEGIN
//! bookkeeping this port's own [`crate::transaction`] module implements —
//! sqlx's own `Transaction<'c, DB>` issues `BEGIN` eagerly, so there is no
//! direct teacher analogue for the lazy variant.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::backend::{Backend, Connection, QueryResult, Row};
use crate::compiler::Query;
use crate::error::{Error, Result};
use crate::logger::{log_error, log_silly};
use crate::pool::command::Command;
use crate::pool::Shared;
use crate::transaction::{begin_prefixed, commit_sql, TxState, ROLLBACK_SQL};

/// One pooled connection, owned by the `Driver` for its entire life.
pub(crate) struct Client<B: Backend> {
    conn: B::Connection,
    shared: Arc<Shared>,
    failed: bool,
    tx_id: i64,
    tx_state: TxState,
    last_query: String,
}

impl<B: Backend> Client<B> {
    pub(crate) fn new(conn: B::Connection, shared: Arc<Shared>) -> Self {
        Self {
            conn,
            shared,
            failed: false,
            tx_id: -1,
            tx_state: TxState::None,
            last_query: String::new(),
        }
    }

    pub(crate) fn is_failed(&self) -> bool {
        self.failed
    }

    /// The SQL last dispatched on this connection, kept around so a `_failed`
    /// client can be diagnosed by whoever destroys it (the client itself has
    /// already logged the error at the point of failure).
    pub(crate) fn last_query(&self) -> &str {
        &self.last_query
    }

    /// Clears transaction bookkeeping on entry to the idle pool.
    pub(crate) fn reset_for_pool(&mut self) {
        self.tx_id = -1;
        self.tx_state = TxState::None;
        self.last_query.clear();
    }

    pub(crate) fn begin_transaction(&mut self, tx_id: i64) {
        self.tx_id = tx_id;
        self.tx_state = TxState::Empty;
    }

    /// Closes the underlying connection. Errors are not actionable here.
    pub(crate) async fn destroy(self) {
        Box::new(self.conn).end().await;
    }

    async fn dispatch(&mut self, sql: String) -> Result<QueryResult<Row<B>>> {
        let result = match self.conn.query(&sql).await {
            Ok(result) => {
                if self.shared.debug_queries {
                    log_silly!(self.shared.logger, "query: {sql}");
                }
                if self.shared.debug_results {
                    log_silly!(
                        self.shared.logger,
                        "result: {} row(s), count {}",
                        result.rows.len(),
                        result.count
                    );
                }
                Ok(result)
            }
            Err(err) => {
                self.failed = true;
                log_error!(self.shared.logger, "query failed: {sql}: {err}");
                Err(Error::Backend(err))
            }
        };

        self.last_query = sql;
        result
    }

    /// Runs a single, non-transactional statement.
    pub(crate) async fn query(&mut self, qs: String) -> Result<QueryResult<Row<B>>> {
        self.dispatch(qs).await
    }
}

/// A `Client` checked out of the pool for the duration of one transaction.
///
/// Returned by [`Driver::begin`](crate::pool::Driver::begin). Dropping a
/// `ClientHandle` without calling [`commit`](ClientHandle::commit) or
/// [`rollback`](ClientHandle::rollback) leaks the underlying connection back
/// to the pool only once one of those is called — ownership, not a boolean
/// `_returnToPool` flag, is what keeps a mid-transaction `Client` out of the
/// idle pool here (see the open-question note in `DESIGN.md`).
pub struct ClientHandle<B: Backend> {
    client: Option<Client<B>>,
    mailbox: mpsc::UnboundedSender<Command<B>>,
}

impl<B: Backend> ClientHandle<B> {
    pub(crate) fn new(client: Client<B>, mailbox: mpsc::UnboundedSender<Command<B>>) -> Self {
        Self {
            client: Some(client),
            mailbox,
        }
    }

    fn take(&mut self) -> Result<Client<B>> {
        self.client
            .take()
            .ok_or_else(|| Error::TransactionState("transaction has already been finalized".into()))
    }

    /// Runs one statement inside the transaction. Prepends the lazy `BEGIN;`
    /// if this is the first statement.
    pub async fn query(&mut self, q: impl Query) -> Result<QueryResult<Row<B>>> {
        let sql = {
            let client = self
                .client
                .as_ref()
                .ok_or_else(|| Error::TransactionState("transaction has already been finalized".into()))?;
            client.shared.compiler.compile(&q)
        };
        self.query_compiled(sql).await
    }

    /// Like [`query`](Self::query), but `qs` is already-compiled SQL —
    /// used by [`Driver::query_tx`](crate::pool::Driver::query_tx), which
    /// compiles once at the call site rather than delegating compilation
    /// into the handle.
    pub(crate) async fn query_compiled(&mut self, qs: String) -> Result<QueryResult<Row<B>>> {
        let mut client = self.take()?;

        let dispatch_sql = match client.tx_state {
            TxState::Empty => {
                client.tx_state = TxState::Active;
                begin_prefixed(&qs)
            }
            TxState::Active => qs,
            _ => unreachable!("a checked-out ClientHandle only holds a client in Empty or Active state"),
        };

        let result = client.dispatch(dispatch_sql).await;
        self.client = Some(client);
        result
    }

    /// Commits the transaction, optionally running one trailing statement in
    /// the same round-trip as the `COMMIT`.
    pub async fn commit(&mut self) -> Result<Option<QueryResult<Row<B>>>> {
        self.finish_commit(None).await
    }

    /// Commits with a trailing statement.
    pub async fn commit_with(&mut self, q: impl Query) -> Result<Option<QueryResult<Row<B>>>> {
        let sql = {
            let client = self
                .client
                .as_ref()
                .ok_or_else(|| Error::TransactionState("transaction has already been finalized".into()))?;
            client.shared.compiler.compile(&q)
        };
        self.finish_commit(Some(sql)).await
    }

    async fn finish_commit(&mut self, trailing: Option<String>) -> Result<Option<QueryResult<Row<B>>>> {
        let mut client = self.take()?;

        if matches!(client.tx_state, TxState::Empty) && trailing.is_none() {
            client.reset_for_pool();
            self.release(client, true).await;
            return Ok(None);
        }

        let active = matches!(client.tx_state, TxState::Active);
        let sql = commit_sql(active, trailing.as_deref());
        client.tx_state = TxState::Committing;

        let result = client.dispatch(sql).await;
        let healthy = result.is_ok();
        self.release(client, healthy).await;
        result.map(Some)
    }

    /// Rolls back the transaction. A transaction with no statements run
    /// rolls back for free, emitting no SQL.
    pub async fn rollback(&mut self) -> Result<Option<QueryResult<Row<B>>>> {
        let mut client = self.take()?;

        if matches!(client.tx_state, TxState::Empty) {
            client.reset_for_pool();
            self.release(client, true).await;
            return Ok(None);
        }

        client.tx_state = TxState::RollingBack;
        let result = client.dispatch(ROLLBACK_SQL.to_owned()).await;
        let healthy = result.is_ok();
        self.release(client, healthy).await;
        result.map(Some)
    }

    async fn release(&self, client: Client<B>, healthy: bool) {
        let _ = self.mailbox.send(Command::Release { client, healthy });
    }
}
