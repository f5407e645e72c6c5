//! The well-known symbolic-name -> OID table.
//!
//! These are PostgreSQL catalog constants (`pg_type.oid` for the built-in
//! scalar and array types), not implementation detail, so the values are
//! reused verbatim from `pg_type.dat` rather than re-derived. Grounded on the
//! builtin-type table shape in `sqlx-core/src/postgres/type_info2.rs` and the
//! `once_cell::sync::Lazy` static-table convention used for similarly
//! hand-maintained lookup tables elsewhere in that crate (e.g.
//! `sqlx-core/src/mssql/connection/describe.rs`).

use std::collections::HashMap;

use once_cell::sync::Lazy;

static BUILTIN_OIDS: Lazy<HashMap<&'static str, u32>> = Lazy::new(|| {
    HashMap::from([
        ("BOOL", 16),
        ("BYTEA", 17),
        ("CHAR", 18),
        ("NAME", 19),
        ("INT8", 20),
        ("INT2", 21),
        ("INT2VECTOR", 22),
        ("INT4", 23),
        ("REGPROC", 24),
        ("TEXT", 25),
        ("OID", 26),
        ("TID", 27),
        ("XID", 28),
        ("CID", 29),
        ("JSON", 114),
        ("XML", 142),
        ("POINT", 600),
        ("FLOAT4", 700),
        ("FLOAT8", 701),
        ("UNKNOWN", 705),
        ("MONEY", 790),
        ("BPCHAR", 1042),
        ("VARCHAR", 1043),
        ("DATE", 1082),
        ("TIME", 1083),
        ("TIMESTAMP", 1114),
        ("TIMESTAMPTZ", 1184),
        ("INTERVAL", 1186),
        ("TIMETZ", 1266),
        ("BIT", 1560),
        ("VARBIT", 1562),
        ("NUMERIC", 1700),
        ("UUID", 2950),
        ("JSONB", 3802),
        ("JSONPATH", 4072),
        ("_BOOL", 1000),
        ("_BYTEA", 1001),
        ("_INT2", 1005),
        ("_INT4", 1007),
        ("_TEXT", 1009),
        ("_VARCHAR", 1015),
        ("_INT8", 1016),
        ("_FLOAT4", 1021),
        ("_FLOAT8", 1022),
        ("_TIMESTAMP", 1115),
        ("_DATE", 1182),
        ("_TIMESTAMPTZ", 1185),
        ("_UUID", 2951),
        ("_JSONB", 3807),
    ])
});

/// Resolves a symbolic type name (case-insensitive, e.g. `"int4"` or
/// `"JSONB"`) to its numeric OID. `None` means the name is not in the
/// well-known table; the caller turns that into a [`crate::error::Error::Configuration`].
pub fn lookup(name: &str) -> Option<u32> {
    BUILTIN_OIDS.get(name.to_ascii_uppercase().as_str()).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_well_known_names() {
        assert_eq!(lookup("JSONB"), Some(3802));
        assert_eq!(lookup("INT4"), Some(23));
        assert_eq!(lookup("int4"), Some(23));
    }

    #[test]
    fn unknown_name_resolves_to_none() {
        assert_eq!(lookup("NOT_A_REAL_TYPE"), None);
    }
}
