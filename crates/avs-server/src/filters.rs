//! Reusable warp filters: state injection, sessions, validated JSON bodies
//! and list queries

use crate::error::ApiError;
use crate::state::AppState;
use avs_core::{Actor, AssetId, ClientId, ProjectId, Validate, ValidationError};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::convert::Infallible;
use warp::{Filter, Rejection};

/// Clone the state into each request
pub fn with_state(state: AppState) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

/// Session id from the request cookie, if any
pub fn session_id(
    state: AppState,
) -> impl Filter<Extract = (Option<String>,), Error = Rejection> + Clone {
    warp::header::optional::<String>("cookie").map(move |header: Option<String>| {
        header.and_then(|raw| state.sessions.session_id(&raw).map(str::to_string))
    })
}

/// Require a live session, extracting the caller
pub fn authenticated(state: AppState) -> impl Filter<Extract = (Actor,), Error = Rejection> + Clone {
    session_id(state.clone()).and_then(move |id: Option<String>| {
        let state = state.clone();
        async move {
            let Some(id) = id else {
                return Err(Rejection::from(ApiError::unauthenticated()));
            };
            state
                .sessions
                .actor(&id)
                .await
                .ok_or_else(|| ApiError::unauthenticated().into())
        }
    })
}

/// Require an admin session
pub fn admin(state: AppState) -> impl Filter<Extract = (Actor,), Error = Rejection> + Clone {
    authenticated(state).and_then(|actor: Actor| async move {
        if actor.is_admin() {
            Ok(actor)
        } else {
            Err(Rejection::from(ApiError::Forbidden("Admin access required")))
        }
    })
}

/// Decode and validate a JSON body
pub fn json_body<T>(limit: u64) -> impl Filter<Extract = (T,), Error = Rejection> + Clone
where
    T: DeserializeOwned + Validate + Send,
{
    warp::body::content_length_limit(limit)
        .and(warp::body::bytes())
        .and_then(|bytes: Bytes| async move { parse_body::<T>(&bytes).map_err(Rejection::from) })
}

/// Decode and validate raw JSON bytes; an empty body reads as `{}`
///
/// # Errors
/// [`ApiError::Validation`] on malformed JSON or failed validation
pub fn parse_body<T>(bytes: &[u8]) -> Result<T, ApiError>
where
    T: DeserializeOwned + Validate,
{
    let bytes = if bytes.iter().all(u8::is_ascii_whitespace) {
        b"{}".as_slice()
    } else {
        bytes
    };
    let value: T =
        serde_json::from_slice(bytes).map_err(|err| ValidationError::from_json(&err))?;
    value.validate()?;
    Ok(value)
}

/// `GET /api/projects` query
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectQuery {
    pub client_id: Option<ClientId>,
    pub include_archived: Option<String>,
}

impl ProjectQuery {
    /// Only the literal `true` includes archived projects
    #[must_use]
    pub fn include_archived(&self) -> bool {
        self.include_archived.as_deref() == Some("true")
    }
}

/// `GET /api/assets` query
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetQuery {
    pub project_id: Option<ProjectId>,
}

/// `GET /api/variants` query
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantQuery {
    pub asset_id: Option<AssetId>,
}
