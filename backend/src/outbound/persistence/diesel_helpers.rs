//! Shared helpers for Diesel repository implementations.
//!
//! This module provides the utilities every repository leans on:
//! - generic mapping from pool and Diesel errors into port-error
//!   constructors;
//! - a transaction error wrapper so in-transaction precondition failures
//!   travel out of `conn.transaction(..)` untouched;
//! - unique-violation detection for the commit-time uniqueness backstop;
//! - SQL functions for the referential array push/pull on the users table
//!   and the `array_length` size reads.

use diesel::sql_types::{Array, Integer, Nullable, Uuid as SqlUuid};
use tracing::debug;

use super::pool::PoolError;

diesel::define_sql_function! {
    /// PostgreSQL `array_append`, used for the user-array push paired with
    /// entity inserts.
    fn array_append(arr: Array<SqlUuid>, element: SqlUuid) -> Array<SqlUuid>;
}

diesel::define_sql_function! {
    /// PostgreSQL `array_remove`, used for the user-array pull paired with
    /// entity deletes.
    fn array_remove(arr: Array<SqlUuid>, element: SqlUuid) -> Array<SqlUuid>;
}

diesel::define_sql_function! {
    /// PostgreSQL `array_length`; NULL for empty arrays.
    fn array_length(arr: Array<SqlUuid>, dimension: Integer) -> Nullable<Integer>;
}

/// Map pool errors into a repository-specific connection error constructor.
pub(crate) fn map_basic_pool_error<E, C>(error: PoolError, connection: C) -> E
where
    C: FnOnce(String) -> E,
{
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    connection(message)
}

/// Map common Diesel error variants into query/connection constructors.
///
/// This helper captures the repeated mapping used by repositories where
/// `NotFound` and query-builder failures should map to query errors.
pub(crate) fn map_basic_diesel_error<E, Q, C>(
    error: diesel::result::Error,
    query: Q,
    connection: C,
) -> E
where
    Q: Fn(&'static str) -> E,
    C: Fn(&'static str) -> E,
{
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => query("record not found"),
        DieselError::QueryBuilderError(_) => query("database query error"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            connection("database connection error")
        }
        DieselError::DatabaseError(_, _) => query("database error"),
        _ => query("database error"),
    }
}

/// The constraint name behind a unique violation, when Diesel exposes one.
///
/// Repositories use this as the commit-time backstop behind their
/// in-transaction uniqueness probes: a concurrent creator slipping past the
/// probe still trips the `(owner_id, title)` / `(owner_id, name)` index, and
/// the violation is mapped back to the duplicate-name port error.
pub(crate) fn unique_violation_constraint(error: &diesel::result::Error) -> Option<String> {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            Some(info.constraint_name().unwrap_or("").to_owned())
        }
        _ => None,
    }
}

/// Error wrapper for transactional repository operations.
///
/// `conn.transaction(..)` requires its error type to absorb raw Diesel
/// errors via `From`; this wrapper lets precondition failures (a typed port
/// error) ride alongside them and be separated again after commit/rollback.
#[derive(Debug)]
pub(crate) enum TxError<E> {
    /// A typed precondition failure raised inside the transaction.
    Domain(E),
    /// A raw Diesel failure from a statement or the commit itself.
    Db(diesel::result::Error),
}

impl<E> From<diesel::result::Error> for TxError<E> {
    fn from(error: diesel::result::Error) -> Self {
        Self::Db(error)
    }
}

impl<E> TxError<E> {
    /// Collapse the wrapper, mapping the database side with `map_db`.
    pub(crate) fn unwrap_or_map(self, map_db: impl FnOnce(diesel::result::Error) -> E) -> E {
        match self {
            Self::Domain(error) => error,
            Self::Db(error) => map_db(error),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;

    #[derive(Debug, PartialEq, Eq)]
    enum ProbeError {
        Connection(String),
        Query(String),
    }

    #[test]
    fn pool_errors_map_to_the_connection_constructor() {
        let error = map_basic_pool_error(PoolError::checkout("refused"), ProbeError::Connection);
        assert_eq!(error, ProbeError::Connection("refused".to_owned()));
    }

    #[test]
    fn not_found_maps_to_the_query_constructor() {
        let error = map_basic_diesel_error(
            diesel::result::Error::NotFound,
            |m| ProbeError::Query(m.to_owned()),
            |m| ProbeError::Connection(m.to_owned()),
        );
        assert_eq!(error, ProbeError::Query("record not found".to_owned()));
    }

    #[test]
    fn non_unique_violations_yield_no_constraint() {
        assert_eq!(
            unique_violation_constraint(&diesel::result::Error::NotFound),
            None
        );
    }

    #[test]
    fn tx_error_prefers_the_domain_side() {
        let wrapped: TxError<ProbeError> = TxError::Domain(ProbeError::Query("oops".to_owned()));
        let collapsed = wrapped.unwrap_or_map(|_| ProbeError::Connection("unused".to_owned()));
        assert_eq!(collapsed, ProbeError::Query("oops".to_owned()));
    }

    #[test]
    fn tx_error_maps_the_database_side() {
        let wrapped: TxError<ProbeError> = TxError::from(diesel::result::Error::NotFound);
        let collapsed = wrapped.unwrap_or_map(|_| ProbeError::Connection("down".to_owned()));
        assert_eq!(collapsed, ProbeError::Connection("down".to_owned()));
    }
}
