//! Diesel and pool error mapping shared by the read adapters.

use tracing::debug;

use crate::outbound::PoolError;

/// Map a pool error through a port-specific connection constructor.
pub(super) fn map_pool_error<E>(error: PoolError, connection: impl FnOnce(String) -> E) -> E {
    connection(error.into_message())
}

/// Map a Diesel error to a port-specific query or connection error.
///
/// Database detail is logged at `debug` and kept out of the returned message.
pub(super) fn map_diesel_error<E>(
    error: diesel::result::Error,
    query: impl FnOnce(String) -> E,
    connection: impl FnOnce(String) -> E,
) -> E {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        other => debug!(error = %other, "diesel operation failed"),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            connection("database connection closed".to_owned())
        }
        DieselError::NotFound => query("record not found".to_owned()),
        DieselError::DeserializationError(err) => query(format!("row decode failed: {err}")),
        _ => query("database error".to_owned()),
    }
}
