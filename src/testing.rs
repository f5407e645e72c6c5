//! A scriptable, in-memory fake [`Backend`].
//!
//! Records every SQL string it receives and can be configured to fail the
//! first N `connect()` calls or any query whose text contains a given
//! substring. Used both by the unit tests embedded next to the modules they
//! cover and by the end-to-end scenario tests in `tests/driver.rs`, mirroring
//! the embedded-fake-backend convention in `sqlx-core/src/mock.rs` and the
//! inline `#[cfg(test)]` fixtures in `sqlx-core/src/postgres/options/mod.rs`.
//!
//! Gated behind the `testing` feature so integration tests can depend on this
//! crate with `features = ["testing"]` rather than duplicating the fake.

use std::fmt;
use std::sync::{Arc, Mutex};

use futures_core::future::BoxFuture;

use crate::backend::{Backend, Connection, QueryResult, TypeFormat, TypeParser};
use crate::error::BackendError;

#[derive(Debug)]
struct MockError(String);

impl fmt::Display for MockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for MockError {}

struct State {
    connect_failures_remaining: usize,
    connect_attempts: usize,
    queries: Vec<String>,
    fail_query_containing: Option<String>,
}

/// A `Backend` that never touches a network: every "connection" is an
/// in-memory recorder shared across the whole pool via `Arc<Mutex<_>>`.
#[derive(Clone)]
pub struct MockBackend {
    state: Arc<Mutex<State>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                connect_failures_remaining: 0,
                connect_attempts: 0,
                queries: Vec::new(),
                fail_query_containing: None,
            })),
        }
    }

    /// The first `n` calls to `connect()` fail; the `n + 1`th and later succeed.
    pub fn fail_next_connects(&self, n: usize) {
        self.state.lock().unwrap().connect_failures_remaining = n;
    }

    /// Every query whose SQL contains `needle` fails.
    pub fn fail_queries_containing(&self, needle: impl Into<String>) {
        self.state.lock().unwrap().fail_query_containing = Some(needle.into());
    }

    /// Every SQL string received so far, across every connection, in arrival order.
    pub fn queries(&self) -> Vec<String> {
        self.state.lock().unwrap().queries.clone()
    }

    pub fn connect_attempts(&self) -> usize {
        self.state.lock().unwrap().connect_attempts
    }
}

pub struct MockConnection {
    state: Arc<Mutex<State>>,
}

impl Connection for MockConnection {
    type Row = ();

    fn query<'a>(
        &'a mut self,
        sql: &'a str,
    ) -> BoxFuture<'a, Result<QueryResult<()>, BackendError>> {
        Box::pin(async move {
            let mut state = self.state.lock().unwrap();
            state.queries.push(sql.to_owned());

            if let Some(needle) = state.fail_query_containing.clone() {
                if sql.contains(&needle) {
                    return Err(Box::new(MockError(format!("forced failure for: {sql}"))) as BackendError);
                }
            }

            Ok(QueryResult {
                rows: Vec::new(),
                count: 1,
            })
        })
    }

    fn end(self: Box<Self>) -> BoxFuture<'static, ()> {
        Box::pin(async {})
    }

    fn set_type_parser(&mut self, _oid: u32, _format: TypeFormat, _parser: TypeParser) {}
}

impl Backend for MockBackend {
    type Connection = MockConnection;

    fn connect<'a>(
        &'a self,
        _url: &'a str,
    ) -> BoxFuture<'a, Result<Self::Connection, BackendError>> {
        Box::pin(async move {
            let mut state = self.state.lock().unwrap();
            state.connect_attempts += 1;

            if state.connect_failures_remaining > 0 {
                state.connect_failures_remaining -= 1;
                return Err(Box::new(MockError("forced connect failure".to_owned())) as BackendError);
            }

            Ok(MockConnection {
                state: Arc::clone(&self.state),
            })
        })
    }
}
