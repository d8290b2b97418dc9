//! Domain errors

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("Telephony error: {0}")]
    Telephony(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    /// Machine-readable reason code used by the control surface
    pub fn reason(&self) -> &'static str {
        match self {
            DomainError::InvalidStateTransition(_) => "invalid_state_transition",
            DomainError::NotFound(_) => "not_found",
            DomainError::ValidationError(_) => "validation_error",
            DomainError::Conflict(_) => "conflict",
            DomainError::Repository(_) => "repository_error",
            DomainError::Notification(_) => "notification_error",
            DomainError::Telephony(_) => "telephony_error",
            DomainError::Internal(_) => "internal_error",
        }
    }

    /// Whether the error comes from infrastructure rather than a caller mistake
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            DomainError::Repository(_)
                | DomainError::Notification(_)
                | DomainError::Telephony(_)
                | DomainError::Internal(_)
        )
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for DomainError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => DomainError::NotFound("row not found".to_string()),
            other => DomainError::Repository(other.to_string()),
        }
    }
}
