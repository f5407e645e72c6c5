//! The pluggable back-end driver.
//!
//! This is the external collaborator that speaks the database's wire
//! protocol; this crate never touches bytes on the wire itself. Modeled as a
//! pair of traits — a [`Backend`] factory that opens [`Connection`]s — using
//! hand-desugared [`BoxFuture`] returns rather than `async-trait`, matching
//! `sqlx-core`'s own connection trait (none of this codebase's dependencies
//! pull in `async-trait`).

use std::fmt;
use std::sync::Arc;

use futures_core::future::BoxFuture;

use crate::error::BackendError;

/// The result of a successful query: the decoded rows and an affected/returned
/// row count. Row decoding itself is out of scope here — `rows` is whatever
/// shape the backend implementation chooses to hand back up.
#[derive(Debug, Clone, Default)]
pub struct QueryResult<R = ()> {
    pub rows: Vec<R>,
    pub count: u64,
}

/// Wire format used when registering a custom type decoder, mirroring
/// PostgreSQL's text/binary result format flag.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum TypeFormat {
    Text,
    Binary,
}

/// A decoder installed for a given OID via [`Connection::set_type_parser`].
pub type TypeParser = Arc<dyn Fn(&[u8]) -> Box<dyn std::any::Any + Send> + Send + Sync>;

/// The row type a given [`Backend`] produces, named for brevity at call sites.
pub type Row<B> = <<B as Backend>::Connection as Connection>::Row;

/// A factory that opens connections for a single backend (PostgreSQL, etc.).
///
/// A `Backend` is shared across every [`Client`](crate::client::Client) in a
/// [`Driver`](crate::pool::Driver); it holds no per-connection state itself.
pub trait Backend: Send + Sync + 'static {
    type Connection: Connection;

    /// Opens one new connection against `url`.
    fn connect<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Self::Connection, BackendError>>;
}

/// A single, exclusively-owned connection to the database.
///
/// At most one [`query`](Connection::query) call is outstanding on a given
/// connection at a time; the [`Client`](crate::client::Client) that owns it
/// guarantees this by construction (see `DESIGN.md`).
pub trait Connection: Send + 'static {
    /// The shape of a decoded row. Left to the backend implementation —
    /// this crate never inspects it.
    type Row: Send + 'static;

    /// Runs one SQL statement (which may itself contain multiple
    /// semicolon-separated statements, e.g. a lazily-prefixed `BEGIN;\n...`)
    /// and returns the result.
    fn query<'a>(
        &'a mut self,
        sql: &'a str,
    ) -> BoxFuture<'a, Result<QueryResult<Self::Row>, BackendError>>;

    /// Closes the connection. Errors are not actionable at this point and are
    /// swallowed by the caller (see `Driver`'s shutdown/destroy paths).
    fn end(self: Box<Self>) -> BoxFuture<'static, ()>;

    /// Installs a decoder for a given OID, if the backend supports custom
    /// type parsers. The default does nothing.
    fn set_type_parser(&mut self, _oid: u32, _format: TypeFormat, _parser: TypeParser) {}
}

impl fmt::Debug for TypeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeFormat::Text => f.write_str("Text"),
            TypeFormat::Binary => f.write_str("Binary"),
        }
    }
}
