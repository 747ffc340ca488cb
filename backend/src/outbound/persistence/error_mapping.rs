//! Translation of pool and Diesel failures into [`IdentityPersistenceError`].
//!
//! Uniqueness violations must stay distinguishable from every other failure:
//! the registry treats them as the "row already exists" signal.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use crate::domain::ports::IdentityPersistenceError;

use super::pool::PoolError;

pub(super) fn map_pool_error(error: PoolError) -> IdentityPersistenceError {
    IdentityPersistenceError::connection(error.into_message())
}

pub(super) fn map_diesel_error(error: DieselError) -> IdentityPersistenceError {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(
                ?kind,
                message = info.message(),
                constraint = info.constraint_name(),
                "diesel operation failed"
            );
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => IdentityPersistenceError::not_found("record not found"),
        DieselError::QueryBuilderError(_) => {
            IdentityPersistenceError::query("database query error")
        }
        DieselError::DatabaseError(kind, info) => {
            let constraint = info.constraint_name().unwrap_or("unknown constraint").to_owned();
            match kind {
                DatabaseErrorKind::UniqueViolation => {
                    IdentityPersistenceError::conflict(constraint)
                }
                DatabaseErrorKind::ForeignKeyViolation => {
                    IdentityPersistenceError::missing_reference(constraint)
                }
                DatabaseErrorKind::ClosedConnection => {
                    IdentityPersistenceError::connection("database connection error")
                }
                _ => IdentityPersistenceError::query("database error"),
            }
        }
        _ => IdentityPersistenceError::query("database error"),
    }
}
