use thiserror::Error;
use uuid::Uuid;

use crate::domain::error::DomainError;

/// Errors that are safe to expose to callers outside the module.
///
/// `DuplicateEmail` and `InvalidCredentials` carry text meant to be shown
/// to the end user as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BloodDonationError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("User with email '{email}' already exists")]
    DuplicateEmail { email: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Internal error")]
    Internal,
}

impl BloodDonationError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn duplicate_email(email: String) -> Self {
        Self::DuplicateEmail { email }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn internal() -> Self {
        Self::Internal
    }

    /// Whether the caller can fix the input and try again.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Validation { .. })
    }
}

impl From<DomainError> for BloodDonationError {
    fn from(domain_error: DomainError) -> Self {
        use DomainError::*;
        match domain_error {
            UserNotFound { id } => Self::not_found("User", id),
            RequestNotFound { id } => Self::not_found("Request", id),
            InvalidCredentials => Self::InvalidCredentials,
            EmailAlreadyExists { email } => Self::duplicate_email(email),
            Validation { field, message } => Self::validation(format!("{}: {}", field, message)),
            InvalidTransition { from, to } => Self::validation(format!(
                "request cannot move from {} to {}",
                from, to
            )),
            Storage { .. } | Notification { .. } | Credential { .. } => Self::internal(),
        }
    }
}
