//! `/api/objects`: upload tickets, ticketed uploads, public downloads

use crate::error::{respond, ApiError, ApiResult};
use crate::filters::{authenticated, with_state};
use crate::reply;
use crate::state::AppState;
use avs_core::Actor;
use avs_objects::{ObjectPath, StoredObject, OCTET_STREAM};
use bytes::Bytes;
use serde_json::json;
use tracing::{debug, info};
use warp::filters::BoxedFilter;
use warp::http::header::{HeaderValue, CACHE_CONTROL, CONTENT_TYPE};
use warp::path::Tail;
use warp::reply::Response;
use warp::Filter;

pub(crate) fn routes(state: AppState) -> BoxedFilter<(Response,)> {
    let upload_limit = state.config.server.upload_limit;

    let issue = warp::path!("api" / "objects" / "upload")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(authenticated(state.clone()))
        .then(issue)
        .map(respond);

    let upload = warp::path!("api" / "objects" / "uploads" / String)
        .and(warp::put())
        .and(with_state(state.clone()))
        .and(warp::header::optional::<String>("content-type"))
        .and(warp::body::content_length_limit(upload_limit))
        .and(warp::body::bytes())
        .then(upload)
        .map(respond);

    let serve = warp::path("api")
        .and(warp::path("objects"))
        .and(warp::path::tail())
        .and(warp::get())
        .and(with_state(state))
        .then(serve)
        .map(respond);

    issue.or(upload).unify().or(serve).unify().boxed()
}

async fn issue(state: AppState, actor: Actor) -> ApiResult<Response> {
    let ticket = state.uploads.issue()?;
    debug!(user = %actor.user_id, ticket = %ticket.id, "Upload ticket issued");
    Ok(reply::ok(&json!({ "uploadURL": ticket.upload_url() })))
}

async fn upload(
    ticket: String,
    state: AppState,
    content_type: Option<String>,
    body: Bytes,
) -> ApiResult<Response> {
    let path = state.uploads.redeem(&ticket)?;
    let content_type = content_type
        .filter(|ct| !ct.trim().is_empty())
        .unwrap_or_else(|| OCTET_STREAM.to_string());
    let size = body.len();
    state
        .objects
        .put(&path, StoredObject::new(content_type, body))
        .await?;
    info!(object = %path, bytes = size, "Upload stored");
    Ok(reply::ok(&json!({
        "objectPath": path.to_string(),
        "url": path.public_url(),
    })))
}

async fn serve(tail: Tail, state: AppState) -> ApiResult<Response> {
    let path = ObjectPath::from_segments(tail.as_str().split('/'))?;
    let object = state
        .objects
        .get(&path)
        .await?
        .ok_or_else(|| ApiError::not_found("File not found"))?;

    let content_type = HeaderValue::from_str(&object.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static(OCTET_STREAM));
    let mut response = Response::new(object.data.into());
    response.headers_mut().insert(CONTENT_TYPE, content_type);
    response
        .headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static("public, max-age=3600"));
    Ok(response)
}
