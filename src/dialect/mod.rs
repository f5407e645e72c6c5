//! The dialect adapter layer and the engine registry that resolves a
//! dialect tag (e.g. `"pgsql"`) to one.
//!
//! A small enumerated match stands in for dynamic module loading — Rust has
//! no `require`-by-convention, and the pluggable-dialect model doesn't need
//! one (see `DESIGN.md`).

pub mod postgres;

use crate::error::{Error, Result};

/// Connection parameters normalized out of a [`crate::config::Config`],
/// handed to a [`Dialect`] to build a connection URL.
#[derive(Debug, Clone, Default)]
pub struct ConnectionParams {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
}

/// A thin adapter over [`crate::pool::Driver`]: knows how to build a
/// connection URL for its dialect. Installing per-OID type parsers on new
/// connections and resolving symbolic OID names are handled generically by
/// [`crate::config`] and [`crate::pool`] once normalized to numeric OIDs, so
/// they are not repeated here per dialect.
pub trait Dialect: Send + Sync {
    /// The tag this dialect is registered under (e.g. `"pgsql"`).
    fn tag(&self) -> &'static str;

    /// Builds the connection URL passed to [`crate::backend::Backend::connect`].
    fn connection_url(&self, params: &ConnectionParams) -> String;
}

/// Resolves an engine tag to its [`Dialect`] adapter. An unrecognized tag
/// fails with [`Error::Configuration`] (the tag's syntax is validated
/// separately, in [`crate::config`]).
pub fn resolve(tag: &str) -> Result<Box<dyn Dialect>> {
    match tag {
        "pgsql" => Ok(Box::new(postgres::PgDialect)),
        other => Err(Error::Configuration(format!(
            "unknown engine '{other}' (no dialect adapter is registered for it)"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_pgsql() {
        assert_eq!(resolve("pgsql").unwrap().tag(), "pgsql");
    }

    #[test]
    fn unknown_engine_is_a_configuration_error() {
        assert!(matches!(resolve("nope"), Err(Error::Configuration(_))));
    }
}
