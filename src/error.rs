//! Error and Result types.

use std::error::Error as StdError;

use thiserror::Error;

/// Boxed source error returned by a [`Backend`](crate::backend::Backend) implementation.
pub type BackendError = Box<dyn StdError + Send + Sync + 'static>;

/// A specialized `Result` type used throughout this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can go wrong between a caller handing us a query and the
/// database receiving bytes.
#[derive(Debug, Error)]
pub enum Error {
    /// An invalid engine name, unknown compiler, or unknown symbolic OID name.
    /// Raised eagerly during configuration normalization; fatal to construction.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// An operation was attempted in a [`DriverStatus`](crate::pool::DriverStatus)
    /// that forbids it (e.g. `query` before `start`, `stop` twice).
    #[error("driver is not in a state that permits this operation: {0}")]
    DriverState(String),

    /// `begin` while already in a transaction, or `commit`/`rollback` outside one.
    #[error("invalid transaction state: {0}")]
    TransactionState(String),

    /// A failure propagated from the underlying connection: connection
    /// establishment or a query failure.
    #[error("backend error: {0}")]
    Backend(#[source] BackendError),
}

impl Error {
    pub(crate) fn backend<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Error::Backend(Box::new(err))
    }
}

/// Synthetic source error for [`Error::Backend`] when the failure isn't
/// itself a single [`BackendError`] — namely the terminal failure-budget
/// case, where every still-queued callback is failed with
/// the same summary rather than the specific connect error that exhausted
/// the budget (which has already been logged and can't be cloned).
#[derive(Debug)]
pub(crate) struct ExhaustedFailureBudget(pub(crate) String);

impl std::fmt::Display for ExhaustedFailureBudget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl StdError for ExhaustedFailureBudget {}
