//! Error types for persistence

/// Storage failure
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Email already registered
    #[error("user with email {0} already exists")]
    DuplicateEmail(String),

    /// Referenced parent record does not exist
    #[error("{kind} {id} not found")]
    MissingParent {
        /// Parent record kind
        kind: &'static str,
        /// Parent id
        id: String,
    },

    /// Stored data could not be decoded
    #[error("corrupt record: {0}")]
    Corrupt(String),

    /// Database driver error
    #[cfg(feature = "postgres")]
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed
    #[cfg(feature = "postgres")]
    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    /// Create missing-parent error
    #[inline]
    pub fn missing_parent(kind: &'static str, id: impl ToString) -> Self {
        Self::MissingParent {
            kind,
            id: id.to_string(),
        }
    }

    /// Whether the error is a uniqueness conflict
    #[inline]
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::DuplicateEmail(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_classification() {
        let err = StoreError::DuplicateEmail("a@b.co".into());
        assert!(err.is_conflict());
        assert!(err.to_string().contains("a@b.co"));

        let err = StoreError::missing_parent("client", "abc");
        assert!(!err.is_conflict());
        assert_eq!(err.to_string(), "client abc not found");
    }
}
