//! Error types for the domain layer
//!
//! Validation failures carry a list of [`Issue`]s, each pointing at the
//! offending field, so the HTTP layer can report them as `details`.

use serde::Serialize;
use std::fmt;

/// Single field-level validation problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    /// Field path, outermost first
    pub path: Vec<String>,
    /// Human-readable message
    pub message: String,
}

impl Issue {
    /// Create issue for a dotted field path
    #[inline]
    #[must_use]
    pub fn new(path: &str, message: impl Into<String>) -> Self {
        let path = if path.is_empty() {
            Vec::new()
        } else {
            path.split('.').map(str::to_string).collect()
        };
        Self {
            path,
            message: message.into(),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path.join("."), self.message)
        }
    }
}

/// Input rejected by validation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid input: {}", summarize(.issues))]
pub struct ValidationError {
    /// Every problem found
    pub issues: Vec<Issue>,
}

impl ValidationError {
    /// Single-issue error
    #[inline]
    #[must_use]
    pub fn single(path: &str, message: impl Into<String>) -> Self {
        Self {
            issues: vec![Issue::new(path, message)],
        }
    }

    /// Error for a body that failed to deserialize
    #[must_use]
    pub fn from_json(err: &serde_json::Error) -> Self {
        Self::single("", err.to_string())
    }
}

fn summarize(issues: &[Issue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Accumulates issues while checking an input
#[derive(Debug, Default)]
pub struct Issues {
    issues: Vec<Issue>,
}

impl Issues {
    /// Create empty collector
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an issue unless `ok` holds
    #[inline]
    pub fn check(&mut self, ok: bool, path: &str, message: impl Into<String>) {
        if !ok {
            self.issues.push(Issue::new(path, message));
        }
    }

    /// Record an issue unconditionally
    #[inline]
    pub fn push(&mut self, path: &str, message: impl Into<String>) {
        self.issues.push(Issue::new(path, message));
    }

    /// Finish collecting
    ///
    /// # Errors
    /// Returns [`ValidationError`] when at least one issue was recorded
    pub fn finish(self) -> Result<(), ValidationError> {
        if self.issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                issues: self.issues,
            })
        }
    }
}
