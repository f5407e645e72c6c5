//! A connection-pool and query-dispatcher core in front of a pluggable SQL
//! backend.
//!
//! [`pool::Driver`] owns the pool's lifecycle (admission control, a FIFO work
//! queue, failure-budget-bounded connection creation, graceful shutdown);
//! [`client::ClientHandle`] is the per-connection transaction handle it hands
//! back from [`pool::Driver::begin`], implementing lazy `BEGIN`. Everything
//! that actually speaks to a database is external: plug in a [`backend::Backend`]
//! implementation, a [`dialect::Dialect`] is resolved for you from the engine
//! tag, and [`compiler::Compiler`]/[`logger::AppLogger`] are both swappable.

pub mod backend;
pub mod client;
pub mod compiler;
pub mod config;
pub mod dialect;
pub mod error;
pub mod logger;
pub mod pool;
pub mod postgres;
pub(crate) mod transaction;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use backend::{Backend, Connection, QueryResult, Row, TypeFormat, TypeParser};
pub use client::ClientHandle;
pub use compiler::{Compiler, IdentityCompiler, Query};
pub use config::{Config, Oid};
pub use dialect::{ConnectionParams, Dialect};
pub use error::{BackendError, Error, Result};
pub use logger::{AppLogger, LogLogger};
pub use pool::{Driver, DriverStatus};
