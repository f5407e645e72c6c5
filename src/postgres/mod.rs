//! PostgreSQL-specific surface referenced by the `pgsql` dialect adapter
//! ([`crate::dialect::postgres`]): the well-known OID table used to resolve
//! symbolic type names (`"INT4"`, `"JSONB"`, ...) at configuration time.

pub mod oid;
