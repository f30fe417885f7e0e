//! Authentication error types.

use thiserror::Error;

/// Session store and durable storage errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Underlying storage could not be read or written
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Stored document is not valid JSON
    #[error("Storage document is corrupt: {0}")]
    CorruptStorage(#[from] serde_json::Error),

    /// Operation requires a logged-in session
    #[error("Not logged in")]
    NotAuthenticated,

    /// Token was empty when saving a session
    #[error("Refusing to save an empty token")]
    EmptyToken,
}

impl AuthError {
    /// Get a message safe to show inline next to the action that failed
    pub fn client_message(&self) -> String {
        match self {
            // Paths and OS error codes are not useful to the user
            AuthError::Storage(_) => "Could not access saved session".to_string(),
            AuthError::CorruptStorage(_) => "Saved session is unreadable".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_hides_io_details() {
        let err = AuthError::Storage(std::io::Error::other("/home/x/.skillatics: EACCES"));
        assert_eq!(err.client_message(), "Could not access saved session");
    }

    #[test]
    fn test_client_message_passthrough() {
        assert_eq!(AuthError::NotAuthenticated.client_message(), "Not logged in");
    }
}
