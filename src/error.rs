//! Error types for the session and events stores, plus the serializable
//! error handed to the frontend.

use serde::Serialize;

use crate::events::RequiredField;

/// Error returned when a login attempt is rejected.
///
/// Unknown email and wrong password are deliberately indistinguishable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// The email/password pair does not match the accepted credentials.
    #[error("invalid email or password")]
    InvalidCredentials,
}

/// Error returned when an event candidate fails validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A required text field is empty.
    #[error("missing required field: {which}")]
    MissingField {
        /// The first empty field, in form order.
        which: RequiredField,
    },
}

/// Error returned when no event with the given id exists.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("event not found: {id}")]
pub struct NotFoundError {
    /// The id that was looked up.
    pub id: String,
}

/// Rejections produced by the events aggregate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventsError {
    /// The candidate event is missing a required field.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The targeted event does not exist.
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// An event with this id is already in the collection.
    #[error("duplicate event id: {id}")]
    DuplicateId {
        /// The colliding id.
        id: String,
    },

    /// Editing is exposed to callers but has no behavior yet.
    #[error("editing event {id} is not implemented")]
    EditNotImplemented {
        /// The event the caller tried to edit.
        id: String,
    },
}

/// Errors returned by the command layer.
///
/// Each variant maps to a distinct error category that the frontend can
/// inspect via the `kind` field in the JSON representation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
#[serde(tag = "kind", content = "message")]
pub enum AppError {
    /// The operation needs a logged-in user and nobody is logged in.
    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    /// A login attempt was rejected.
    #[error("login failed: {0}")]
    InvalidCredentials(String),

    /// A domain validation failure (empty title, etc.).
    #[error("validation error: {0}")]
    Validation(String),

    /// The requested event does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The id collided with an existing event.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The operation is surfaced but not available yet.
    #[error("not implemented: {0}")]
    NotImplemented(String),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        Self::InvalidCredentials(err.to_string())
    }
}

impl From<NotFoundError> for AppError {
    fn from(err: NotFoundError) -> Self {
        Self::NotFound(err.id)
    }
}

impl From<EventsError> for AppError {
    fn from(err: EventsError) -> Self {
        match err {
            EventsError::Validation(inner) => Self::Validation(inner.to_string()),
            EventsError::NotFound(inner) => inner.into(),
            EventsError::DuplicateId { .. } => Self::Conflict(err.to_string()),
            EventsError::EditNotImplemented { .. } => Self::NotImplemented(err.to_string()),
        }
    }
}
