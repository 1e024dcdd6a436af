//! Success envelope: `{"ok": true, "data": ...}`

use serde::Serialize;
use serde_json::json;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::Reply;

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    ok: bool,
    data: &'a T,
}

/// 200 with `data`
#[must_use]
pub fn ok<T: Serialize>(data: &T) -> Response {
    with_status(data, StatusCode::OK)
}

/// 201 with `data`
#[must_use]
pub fn created<T: Serialize>(data: &T) -> Response {
    with_status(data, StatusCode::CREATED)
}

/// 200 with `{"message": ...}`
#[must_use]
pub fn message(text: &str) -> Response {
    ok(&json!({ "message": text }))
}

/// Envelope with an explicit status
#[must_use]
pub fn with_status<T: Serialize>(data: &T, status: StatusCode) -> Response {
    let body = Envelope { ok: true, data };
    warp::reply::with_status(warp::reply::json(&body), status).into_response()
}
