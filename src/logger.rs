//! The application logger collaborator.
//!
//! A logger handle exposing `error` and `silly` is consumed as an external
//! collaborator. Modeled as a trait so the pool never hard-codes a logging
//! backend, with a default that forwards to the `log` facade.

use std::fmt;
use std::sync::Arc;

/// A logger handle consumed by the [`Driver`](crate::pool::Driver) and
/// [`Client`](crate::client::Client).
///
/// `error` reports conditions a human should look at (connection failures,
/// query failures). `silly` is the low-volume debug channel used for
/// `debug_queries`/`debug_results` tracing.
pub trait AppLogger: Send + Sync {
    fn error(&self, message: fmt::Arguments<'_>);
    fn silly(&self, message: fmt::Arguments<'_>);
}

/// Forwards to the `log` crate: `error` at [`log::Level::Error`], `silly` at
/// [`log::Level::Trace`].
#[derive(Debug, Default)]
pub struct LogLogger;

impl AppLogger for LogLogger {
    fn error(&self, message: fmt::Arguments<'_>) {
        log::error!("{}", message);
    }

    fn silly(&self, message: fmt::Arguments<'_>) {
        log::trace!("{}", message);
    }
}

pub(crate) fn default_logger() -> Arc<dyn AppLogger> {
    Arc::new(LogLogger)
}

/// Logs at `error` level, forwarding to an [`AppLogger`].
macro_rules! log_error {
    ($logger:expr, $($args:tt)*) => {
        $logger.error(format_args!($($args)*))
    };
}

/// Logs at `silly` level, forwarding to an [`AppLogger`].
macro_rules! log_silly {
    ($logger:expr, $($args:tt)*) => {
        $logger.silly(format_args!($($args)*))
    };
}

pub(crate) use log_error;
pub(crate) use log_silly;
