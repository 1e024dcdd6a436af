//! API errors and the failure envelope
//!
//! Every failure leaves the server as
//! `{"ok": false, "error": {"code", "message", "details"?}}`. Handler errors
//! are [`ApiError`]s; rejections produced by warp itself are translated by
//! [`recover`].

use avs_core::{Issue, ValidationError};
use avs_genai::GenAiError;
use avs_objects::ObjectError;
use avs_store::StoreError;
use serde::Serialize;
use std::convert::Infallible;
use tracing::{error, warn};
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Rejection, Reply};

/// Result alias for handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Failure reported to API clients
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    Validation(ValidationError),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{0}")]
    NotFound(String),

    #[error("User with this email already exists")]
    UserExists,

    #[error("Payload too large")]
    PayloadTooLarge,

    #[error("{0}")]
    Generation(String),

    /// Detail is logged, never sent
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a [Issue]>,
}

#[derive(Serialize)]
struct Envelope<'a> {
    ok: bool,
    error: ErrorBody<'a>,
}

impl ApiError {
    /// Not found with a message
    #[inline]
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Internal failure with a loggable cause
    #[inline]
    #[must_use]
    pub fn internal(cause: impl ToString) -> Self {
        Self::Internal(cause.to_string())
    }

    /// Missing or expired session
    #[inline]
    #[must_use]
    pub fn unauthenticated() -> Self {
        Self::Unauthorized("Authentication required")
    }

    /// Machine-readable code
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::UserExists => "USER_EXISTS",
            Self::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            Self::Generation(_) => "GENERATION_FAILED",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP status
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials | Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::UserExists => StatusCode::CONFLICT,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Generation(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to clients
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Validation(_) => "Invalid input".to_string(),
            Self::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    /// Field issues, for validation failures
    #[must_use]
    pub fn details(&self) -> Option<&[Issue]> {
        match self {
            Self::Validation(err) => Some(&err.issues),
            _ => None,
        }
    }

    /// Render the failure envelope
    #[must_use]
    pub fn into_response(self) -> Response {
        match &self {
            Self::Internal(cause) => error!(cause = %cause, "Request failed"),
            Self::Generation(cause) => warn!(cause = %cause, "Generation failed"),
            _ => {}
        }
        let body = Envelope {
            ok: false,
            error: ErrorBody {
                code: self.code(),
                message: self.message(),
                details: self.details(),
            },
        };
        warp::reply::with_status(warp::reply::json(&body), self.status()).into_response()
    }
}

impl warp::reject::Reject for ApiError {}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail(_) => Self::UserExists,
            StoreError::MissingParent { kind, .. } => Self::NotFound(format!("{kind} not found")),
            other => Self::internal(other),
        }
    }
}

impl From<GenAiError> for ApiError {
    fn from(err: GenAiError) -> Self {
        Self::Generation(err.to_string())
    }
}

impl From<ObjectError> for ApiError {
    fn from(err: ObjectError) -> Self {
        if err.is_not_found() {
            Self::not_found("File not found")
        } else {
            Self::internal(err)
        }
    }
}

/// Turn a handler result into a response
#[must_use]
pub fn respond(result: ApiResult<Response>) -> Response {
    result.unwrap_or_else(ApiError::into_response)
}

/// Translate rejections into the failure envelope
///
/// # Errors
/// Never; every rejection becomes a response
pub async fn recover(rejection: Rejection) -> Result<Response, Infallible> {
    let err = if let Some(err) = rejection.find::<ApiError>() {
        clone_for_reply(err)
    } else if rejection.is_not_found()
        || rejection.find::<warp::reject::MethodNotAllowed>().is_some()
    {
        ApiError::not_found("Not found")
    } else if rejection.find::<warp::reject::PayloadTooLarge>().is_some() {
        ApiError::PayloadTooLarge
    } else if rejection.find::<warp::reject::LengthRequired>().is_some() {
        ApiError::InvalidRequest("Content-Length required".to_string())
    } else if rejection.find::<warp::reject::InvalidQuery>().is_some() {
        ApiError::InvalidRequest("Invalid query string".to_string())
    } else if rejection.find::<warp::reject::UnsupportedMediaType>().is_some() {
        ApiError::InvalidRequest("Unsupported media type".to_string())
    } else {
        ApiError::internal(format!("unhandled rejection: {rejection:?}"))
    };
    Ok(err.into_response())
}

// Rejections only hand out references
fn clone_for_reply(err: &ApiError) -> ApiError {
    match err {
        ApiError::Validation(v) => ApiError::Validation(v.clone()),
        ApiError::InvalidRequest(m) => ApiError::InvalidRequest(m.clone()),
        ApiError::InvalidCredentials => ApiError::InvalidCredentials,
        ApiError::Unauthorized(m) => ApiError::Unauthorized(m),
        ApiError::Forbidden(m) => ApiError::Forbidden(m),
        ApiError::NotFound(m) => ApiError::NotFound(m.clone()),
        ApiError::UserExists => ApiError::UserExists,
        ApiError::PayloadTooLarge => ApiError::PayloadTooLarge,
        ApiError::Generation(m) => ApiError::Generation(m.clone()),
        ApiError::Internal(m) => ApiError::Internal(m.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    async fn body_json(response: Response) -> (StatusCode, Value) {
        let status = response.status();
        let bytes = warp::hyper::body::to_bytes(response.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn validation_error_carries_details() {
        let err = ApiError::from(ValidationError::single("name", "Name is required"));
        let (status, body) = body_json(err.into_response()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({
                "ok": false,
                "error": {
                    "code": "VALIDATION_ERROR",
                    "message": "Invalid input",
                    "details": [{"path": ["name"], "message": "Name is required"}]
                }
            })
        );
    }

    #[tokio::test]
    async fn internal_detail_is_not_leaked() {
        let (status, body) = body_json(ApiError::internal("db down").into_response()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["message"], "Internal server error");
        assert!(body["error"].get("details").is_none());
    }

    #[test]
    fn store_errors_map_to_codes() {
        assert_eq!(
            ApiError::from(StoreError::DuplicateEmail("a@b.co".into())).code(),
            "USER_EXISTS"
        );
        let missing = ApiError::from(StoreError::missing_parent("Project", "x"));
        assert_eq!(missing.code(), "NOT_FOUND");
        assert_eq!(missing.message(), "Project not found");
        assert_eq!(
            ApiError::from(StoreError::Corrupt("bad row".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn generation_and_object_errors() {
        let err = ApiError::from(GenAiError::EmptyResponse);
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        let err = ApiError::from(ObjectError::TicketNotFound);
        assert_eq!(err.message(), "File not found");
    }

    #[tokio::test]
    async fn recover_maps_warp_rejections() {
        let response = recover(warp::reject::not_found()).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = recover(ApiError::Forbidden("Admin access required").into())
            .await
            .unwrap();
        let (status, body) = body_json(response).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "FORBIDDEN");
        assert_eq!(body["error"]["message"], "Admin access required");
    }
}
