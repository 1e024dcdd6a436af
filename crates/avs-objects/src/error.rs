//! Error types for object storage

/// Object storage failure
#[derive(Debug, thiserror::Error)]
pub enum ObjectError {
    /// Path is not a valid object path
    #[error("invalid object path: {0}")]
    InvalidPath(String),

    /// Upload ticket unknown, used or expired
    #[error("upload ticket not found or expired")]
    TicketNotFound,

    /// Filesystem failure
    #[error("object io error: {0}")]
    Io(#[from] std::io::Error),

    /// Sidecar metadata unreadable
    #[error("object metadata error: {0}")]
    Metadata(#[from] serde_json::Error),
}

impl ObjectError {
    /// Whether the error means the object or ticket does not exist
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::TicketNotFound | Self::InvalidPath(_) => true,
            Self::Io(err) => crate::store::is_missing(err),
            Self::Metadata(_) => false,
        }
    }
}

/// Result alias for object operations
pub type ObjectResult<T> = Result<T, ObjectError>;
