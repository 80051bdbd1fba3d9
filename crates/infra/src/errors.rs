//! Conversions from external infrastructure errors into domain errors.

use lexbook_domain::LexbookError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can
/// be converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub LexbookError);

impl From<InfraError> for LexbookError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<LexbookError> for InfraError {
    fn from(value: LexbookError) -> Self {
        InfraError(value)
    }
}

impl From<SqlError> for InfraError {
    fn from(err: SqlError) -> Self {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        let domain_err = match err {
            RE::SqliteFailure(inner, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (inner.code, inner.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => {
                        LexbookError::Database("database is busy".into())
                    }
                    (ErrorCode::DatabaseLocked, _) => {
                        LexbookError::Database("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 2067) => {
                        LexbookError::Conflict("unique constraint violation".into())
                    }
                    (ErrorCode::ConstraintViolation, 787) => {
                        LexbookError::Database("foreign key constraint violation".into())
                    }
                    _ => LexbookError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        inner.code, inner.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => {
                LexbookError::NotFound("no rows returned by query".into())
            }
            RE::FromSqlConversionFailure(_, _, cause) => {
                LexbookError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                LexbookError::Database(format!("invalid column type: {ty}"))
            }
            other => LexbookError::Database(other.to_string()),
        };
        InfraError(domain_err)
    }
}

impl From<r2d2::Error> for InfraError {
    fn from(err: r2d2::Error) -> Self {
        InfraError(LexbookError::Database(format!("connection pool error: {err}")))
    }
}

impl From<tokio::task::JoinError> for InfraError {
    fn from(err: tokio::task::JoinError) -> Self {
        InfraError(LexbookError::Internal(format!("blocking task failed: {err}")))
    }
}

/// Map a rusqlite error straight to the domain error. Shorthand used by the
/// repositories.
pub fn map_sql_error(err: SqlError) -> LexbookError {
    InfraError::from(err).into()
}

/// Map a pool error straight to the domain error.
pub fn map_pool_error(err: r2d2::Error) -> LexbookError {
    InfraError::from(err).into()
}

/// Map a join error straight to the domain error.
pub fn map_join_error(err: tokio::task::JoinError) -> LexbookError {
    InfraError::from(err).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_rows_maps_to_not_found() {
        let err = map_sql_error(SqlError::QueryReturnedNoRows);
        assert!(matches!(err, LexbookError::NotFound(_)));
    }

    #[test]
    fn unique_violation_maps_to_conflict() {
        let err = map_sql_error(SqlError::SqliteFailure(
            rusqlite::ffi::Error {
                code: rusqlite::ffi::ErrorCode::ConstraintViolation,
                extended_code: 2067,
            },
            Some("UNIQUE constraint failed: slots.advocate_id, slots.starts_at".into()),
        ));
        assert!(matches!(err, LexbookError::Conflict(_)));
    }
}
