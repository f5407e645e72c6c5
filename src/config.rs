//! Configuration surface and normalization.
//!
//! A builder plus a `normalize()` step, mirroring the `Options`/`Builder`
//! split `sqlx-core/src/postgres/options.rs` and `sqlx-core/src/pool/options.rs`
//! use for connection and pool configuration respectively. Validation that
//! the distilled spec raises eagerly — the engine tag's syntax, unknown
//! symbolic OID names — happens here, in `normalize()`, never at query time.

use std::sync::Arc;

use crate::backend::{Backend, TypeFormat, TypeParser};
use crate::compiler::{Compiler, IdentityCompiler};
use crate::dialect::{self, ConnectionParams, Dialect};
use crate::error::{Error, Result};
use crate::logger::{default_logger, AppLogger};
use crate::postgres::oid;

const DEFAULT_MAX_CONNECTIONS: u32 = 20;
const DEFAULT_MAXIMUM_FAILURES: u32 = 20;

/// A symbolic or numeric OID, as accepted by [`Config::pg_type_parser`].
#[derive(Debug, Clone)]
pub enum Oid {
    Numeric(u32),
    Symbolic(String),
}

impl From<u32> for Oid {
    fn from(oid: u32) -> Self {
        Oid::Numeric(oid)
    }
}

impl From<&str> for Oid {
    fn from(name: &str) -> Self {
        Oid::Symbolic(name.to_owned())
    }
}

struct PgTypeParserSpec {
    oid: Oid,
    format: TypeFormat,
    parser: TypeParser,
}

/// Builder for the pool's configuration. Construct with [`Config::new`],
/// chain setters, then hand it to [`crate::pool::Driver::new`].
pub struct Config<B: Backend> {
    engine: String,
    backend: Option<Arc<B>>,
    compiler: Arc<dyn Compiler>,
    logger: Arc<dyn AppLogger>,
    params: ConnectionParams,
    min_connections: u32,
    max_connections: u32,
    maximum_failures: u32,
    debug_queries: bool,
    debug_results: bool,
    pg_type_parsers: Vec<PgTypeParserSpec>,
}

impl<B: Backend> Config<B> {
    /// `engine` is the dialect tag (e.g. `"pgsql"`), validated against
    /// `/[a-z_][a-z0-9_]*/` at [`normalize`](Self::normalize) time.
    pub fn new(engine: impl Into<String>) -> Self {
        Self {
            engine: engine.into(),
            backend: None,
            compiler: Arc::new(IdentityCompiler),
            logger: default_logger(),
            params: ConnectionParams::default(),
            min_connections: 0,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            maximum_failures: DEFAULT_MAXIMUM_FAILURES,
            debug_queries: false,
            debug_results: false,
            pg_type_parsers: Vec::new(),
        }
    }

    /// The backend factory. There is no dynamically-loaded default here — a
    /// generic `B` has no single obvious instance in Rust, so it must be
    /// supplied explicitly (see `DESIGN.md`).
    pub fn backend(mut self, backend: B) -> Self {
        self.backend = Some(Arc::new(backend));
        self
    }

    /// Overrides the identity compiler with a custom one (the "xql" case:
    /// the caller constructs that compiler and hands it over directly —
    /// see `DESIGN.md` for why there is no stringly-typed `"xql"` key here).
    pub fn compiler(mut self, compiler: impl Compiler + 'static) -> Self {
        self.compiler = Arc::new(compiler);
        self
    }

    pub fn logger(mut self, logger: impl AppLogger + 'static) -> Self {
        self.logger = Arc::new(logger);
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.params.host = Some(host.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.params.port = Some(port);
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.params.username = Some(username.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.params.password = Some(password.into());
        self
    }

    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.params.database = Some(database.into());
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn maximum_failures(mut self, max: u32) -> Self {
        self.maximum_failures = max;
        self
    }

    pub fn debug_queries(mut self, enabled: bool) -> Self {
        self.debug_queries = enabled;
        self
    }

    pub fn debug_results(mut self, enabled: bool) -> Self {
        self.debug_results = enabled;
        self
    }

    /// Registers a decoder for a PostgreSQL OID.
    /// `oid` may be numeric or a symbolic name (`"INT4"`, `"JSONB"`, ...); an
    /// unrecognized symbolic name fails at [`normalize`](Self::normalize),
    /// never at query time.
    pub fn pg_type_parser(mut self, oid: impl Into<Oid>, format: TypeFormat, parser: TypeParser) -> Self {
        self.pg_type_parsers.push(PgTypeParserSpec {
            oid: oid.into(),
            format,
            parser,
        });
        self
    }

    pub(crate) fn normalize(self) -> Result<Normalized<B>> {
        validate_engine_tag(&self.engine)?;

        let dialect: Arc<dyn Dialect> = Arc::from(dialect::resolve(&self.engine)?);

        let backend = self.backend.ok_or_else(|| {
            Error::Configuration("no backend factory was supplied (Config::backend)".into())
        })?;

        let type_parsers = self
            .pg_type_parsers
            .into_iter()
            .map(|spec| {
                let numeric_oid = match spec.oid {
                    Oid::Numeric(oid) => oid,
                    Oid::Symbolic(name) => oid::lookup(&name).ok_or_else(|| {
                        Error::Configuration(format!("unknown PostgreSQL type name '{name}'"))
                    })?,
                };
                Ok((numeric_oid, spec.format, spec.parser))
            })
            .collect::<Result<Vec<_>>>()?;

        let connection_url = dialect.connection_url(&self.params);

        Ok(Normalized {
            backend,
            dialect,
            connection_url,
            compiler: self.compiler,
            logger: self.logger,
            min_connections: self.min_connections,
            max_connections: self.max_connections,
            maximum_failures: self.maximum_failures,
            debug_queries: self.debug_queries,
            debug_results: self.debug_results,
            type_parsers,
        })
    }
}

/// `/[a-z_][a-z0-9_]*/`, hand-rolled rather than pulling in `regex` for one
/// anchor-to-anchor check over a short identifier.
fn validate_engine_tag(tag: &str) -> Result<()> {
    let mut chars = tag.chars();
    let valid = match chars.next() {
        Some(c) if c == '_' || c.is_ascii_lowercase() => {
            chars.all(|c| c == '_' || c.is_ascii_lowercase() || c.is_ascii_digit())
        }
        _ => false,
    };

    if valid {
        Ok(())
    } else {
        Err(Error::Configuration(format!(
            "invalid engine name '{tag}' (expected /[a-z_][a-z0-9_]*/)"
        )))
    }
}

/// The validated, defaulted configuration handed to the `Driver` actor.
pub(crate) struct Normalized<B: Backend> {
    pub(crate) backend: Arc<B>,
    pub(crate) dialect: Arc<dyn Dialect>,
    pub(crate) connection_url: String,
    pub(crate) compiler: Arc<dyn Compiler>,
    pub(crate) logger: Arc<dyn AppLogger>,
    pub(crate) min_connections: u32,
    pub(crate) max_connections: u32,
    pub(crate) maximum_failures: u32,
    pub(crate) debug_queries: bool,
    pub(crate) debug_results: bool,
    pub(crate) type_parsers: Vec<(u32, TypeFormat, TypeParser)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockBackend;

    #[test]
    fn rejects_invalid_engine_names() {
        assert!(validate_engine_tag("Pgsql").is_err());
        assert!(validate_engine_tag("1gsql").is_err());
        assert!(validate_engine_tag("pg-sql").is_err());
        assert!(validate_engine_tag("pgsql").is_ok());
        assert!(validate_engine_tag("_pgsql2").is_ok());
    }

    #[test]
    fn normalize_requires_a_backend() {
        let config: Config<MockBackend> = Config::new("pgsql");
        assert!(matches!(config.normalize(), Err(Error::Configuration(_))));
    }

    #[test]
    fn normalize_fails_on_unknown_engine() {
        let config = Config::new("nope").backend(MockBackend::new());
        assert!(matches!(config.normalize(), Err(Error::Configuration(_))));
    }

    #[test]
    fn normalize_resolves_symbolic_oids() {
        let config = Config::new("pgsql")
            .backend(MockBackend::new())
            .pg_type_parser("JSONB", TypeFormat::Text, Arc::new(|b: &[u8]| Box::new(b.to_vec()) as Box<dyn std::any::Any + Send>));
        let normalized = config.normalize().unwrap();
        assert_eq!(normalized.type_parsers[0].0, 3802);
    }

    #[test]
    fn normalize_rejects_unknown_symbolic_oid() {
        let config = Config::new("pgsql")
            .backend(MockBackend::new())
            .pg_type_parser("NOT_A_TYPE", TypeFormat::Text, Arc::new(|b: &[u8]| Box::new(b.to_vec()) as Box<dyn std::any::Any + Send>));
        assert!(matches!(config.normalize(), Err(Error::Configuration(_))));
    }

    #[test]
    fn defaults_match_the_documented_values() {
        let config = Config::new("pgsql").backend(MockBackend::new());
        let normalized = config.normalize().unwrap();
        assert_eq!(normalized.min_connections, 0);
        assert_eq!(normalized.max_connections, 20);
        assert_eq!(normalized.maximum_failures, 20);
    }
}
