/// Errors returned by the service layer
///
/// Each variant maps to one HTTP status in the API crate; the message strings
/// are safe to show to clients. `Database` and `Password` wrap internal
/// failures whose details are logged, not returned.

use crate::auth::password::PasswordError;
use crate::models::FieldViolation;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// A unique value (email) is already taken
    #[error("{0}")]
    AlreadyExists(String),

    #[error("{0}")]
    NotFound(String),

    /// The caller's role does not allow the operation
    #[error("{0}")]
    Forbidden(String),

    #[error("Validation failed")]
    Validation(Vec<FieldViolation>),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

impl ServiceError {
    pub fn not_found(message: impl Into<String>) -> Self {
        ServiceError::NotFound(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ServiceError::Forbidden(message.into())
    }

    pub fn invalid(violation: FieldViolation) -> Self {
        ServiceError::Validation(vec![violation])
    }
}

impl From<FieldViolation> for ServiceError {
    fn from(violation: FieldViolation) -> Self {
        ServiceError::invalid(violation)
    }
}

/// Whether a database error is a UNIQUE constraint violation
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

/// Collects violations from several independent checks
///
/// Returns `Ok(())` only if every check passed, so clients see all broken
/// rules at once.
pub(crate) fn collect_violations<I>(checks: I) -> Result<(), ServiceError>
where
    I: IntoIterator<Item = Result<(), FieldViolation>>,
{
    let violations: Vec<FieldViolation> = checks.into_iter().filter_map(Result::err).collect();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::Validation(violations))
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
