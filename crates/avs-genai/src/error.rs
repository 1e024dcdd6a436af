//! Error types for generation

/// Generation failure
#[derive(Debug, thiserror::Error)]
pub enum GenAiError {
    /// Neither `GEMINI_API_KEY` nor `GOOGLE_AI_API_KEY` is set
    #[error("no generative AI API key configured")]
    MissingApiKey,

    /// Transport failure
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("model returned status {status}: {body}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body, truncated
        body: String,
    },

    /// No usable candidate in the response
    #[error("empty response from model")]
    EmptyResponse,

    /// Response did not match the expected shape
    #[error("malformed model output: {0}")]
    Malformed(String),

    /// Model produced something that is not an SVG template
    #[error("generated template is not an SVG document")]
    InvalidTemplate,

    /// Every image attempt failed or returned no image
    #[error("failed to generate any images ({attempted} attempted)")]
    NoImages {
        /// Number of calls made
        attempted: u32,
    },
}

impl GenAiError {
    /// Whether repeating the call could succeed: transport failures,
    /// rate limiting and server-side errors
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::MissingApiKey
            | Self::EmptyResponse
            | Self::Malformed(_)
            | Self::InvalidTemplate
            | Self::NoImages { .. } => false,
        }
    }
}

/// Result alias for generation
pub type GenAiResult<T> = Result<T, GenAiError>;

impl From<serde_json::Error> for GenAiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_errors_become_malformed() {
        let err: GenAiError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, GenAiError::Malformed(_)));
    }

    #[test]
    fn retryable_classification() {
        let api = |status| GenAiError::Api {
            status,
            body: String::new(),
        };
        assert!(api(503).is_retryable());
        assert!(api(429).is_retryable());
        assert!(!api(400).is_retryable());
        assert!(!GenAiError::MissingApiKey.is_retryable());
        assert!(!GenAiError::Malformed("x".into()).is_retryable());
    }

    #[test]
    fn no_images_mentions_attempts() {
        assert_eq!(
            GenAiError::NoImages { attempted: 3 }.to_string(),
            "failed to generate any images (3 attempted)"
        );
    }
}
