//! Error types for notegraph.

use thiserror::Error;

/// Result type alias using notegraph's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for notegraph operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Non-database store failure
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Note not found
    #[error("Note not found: {0}")]
    NoteNotFound(uuid::Uuid),

    /// Link not found
    #[error("Link not found: {0}")]
    LinkNotFound(uuid::Uuid),

    /// A link with the same (source, target, link text) already exists
    #[error("Unique constraint violation: {0}")]
    UniqueConstraint(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for every "referenced entity does not exist" variant.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::NotFound(_) | Error::NoteNotFound(_) | Error::LinkNotFound(_)
        )
    }

    /// True when the error is a duplicate (source, target, link text) triple.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Error::UniqueConstraint(_) => true,
            Error::Database(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("test resource".to_string());
        assert_eq!(err.to_string(), "Not found: test resource");
    }

    #[test]
    fn test_error_display_note_not_found() {
        let id = Uuid::nil();
        let err = Error::NoteNotFound(id);
        assert_eq!(err.to_string(), format!("Note not found: {}", id));
    }

    #[test]
    fn test_error_display_link_not_found() {
        let id = Uuid::nil();
        let err = Error::LinkNotFound(id);
        assert_eq!(err.to_string(), format!("Link not found: {}", id));
    }

    #[test]
    fn test_error_display_unique_constraint() {
        let err = Error::UniqueConstraint("a -> b (b)".to_string());
        assert_eq!(err.to_string(), "Unique constraint violation: a -> b (b)");
    }

    #[test]
    fn test_error_display_store_unavailable() {
        let err = Error::StoreUnavailable("connection refused".to_string());
        assert_eq!(err.to_string(), "Store unavailable: connection refused");
    }

    #[test]
    fn test_is_not_found_variants() {
        assert!(Error::NotFound("x".into()).is_not_found());
        assert!(Error::NoteNotFound(Uuid::nil()).is_not_found());
        assert!(Error::LinkNotFound(Uuid::nil()).is_not_found());
        assert!(!Error::Internal("x".into()).is_not_found());
    }

    #[test]
    fn test_is_unique_violation() {
        assert!(Error::UniqueConstraint("dup".into()).is_unique_violation());
        assert!(!Error::StoreUnavailable("down".into()).is_unique_violation());
        assert!(!Error::Database(sqlx::Error::RowNotFound).is_unique_violation());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number");
        assert!(json_err.is_err());

        let err: Error = json_err.unwrap_err().into();
        match err {
            Error::Serialization(msg) => {
                assert!(!msg.is_empty());
            }
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
