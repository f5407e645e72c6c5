//! The lazy-BEGIN transaction state machine and its SQL assembly.
//!
//! Split out from [`crate::client`] the way `sqlx-core` keeps its
//! `begin_ansi_transaction_sql`/`commit_ansi_transaction_sql` helpers next to,
//! but separate from, the `TransactionManager` impl that calls them (see
//! `sqlx-core/src/postgres/transaction.rs`).

/// Where a checked-out [`Client`](crate::client::Client) sits in the
/// transaction state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TxState {
    /// Not in a transaction (`_txId == -1`).
    None,
    /// `begin()` has been called but no statement has run yet
    /// (`_txId >= 0`, `_txState == ""`). No SQL has been sent.
    Empty,
    /// At least one statement has run; the lazy `BEGIN;` has been emitted.
    Active,
    /// `commit()` was called and dispatched.
    Committing,
    /// `rollback()` was called and dispatched.
    RollingBack,
}

/// The lazy `BEGIN;` prefix prepended to the first real statement of a
/// transaction. Spending no round-trip until there is real work is the
/// entire point of this module.
pub(crate) const BEGIN_PREFIX: &str = "BEGIN;\n";

/// Builds the SQL sent for the first statement of a transaction.
pub(crate) fn begin_prefixed(sql: &str) -> String {
    format!("{BEGIN_PREFIX}{sql}")
}

/// Builds the SQL sent for a `commit`, given whether any statement has run
/// (`active`) and an optional trailing statement to run as part of the same
/// round-trip.
pub(crate) fn commit_sql(active: bool, trailing: Option<&str>) -> String {
    match (active, trailing) {
        (false, Some(q)) => format!("{BEGIN_PREFIX}{q}\nCOMMIT;"),
        (true, Some(q)) => format!("{q}\nCOMMIT;"),
        (true, None) => "COMMIT;".to_owned(),
        // (false, None) is the empty-commit case, handled by the caller
        // before any SQL is assembled (no round-trip is made).
        (false, None) => "COMMIT;".to_owned(),
    }
}

/// The SQL sent for a non-empty `rollback`.
pub(crate) const ROLLBACK_SQL: &str = "ROLLBACK;";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_prefix_is_prepended_verbatim() {
        assert_eq!(begin_prefixed("SELECT 1"), "BEGIN;\nSELECT 1");
    }

    #[test]
    fn commit_with_no_activity_and_trailing_statement_folds_begin_and_commit() {
        assert_eq!(
            commit_sql(false, Some("INSERT INTO t VALUES(1)")),
            "BEGIN;\nINSERT INTO t VALUES(1)\nCOMMIT;"
        );
    }

    #[test]
    fn commit_after_activity_with_trailing_statement_appends_commit() {
        assert_eq!(commit_sql(true, Some("UPDATE t SET x=1")), "UPDATE t SET x=1\nCOMMIT;");
    }

    #[test]
    fn bare_commit_after_activity() {
        assert_eq!(commit_sql(true, None), "COMMIT;");
    }
}
