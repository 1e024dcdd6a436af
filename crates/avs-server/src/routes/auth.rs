//! `/api/auth/*` and `/api/me`

use crate::auth;
use crate::error::{respond, ApiError, ApiResult};
use crate::filters::{json_body, session_id, with_state};
use crate::reply;
use crate::state::AppState;
use avs_core::{LoginInput, Permissions, RegisterInput, User};
use serde_json::json;
use warp::filters::BoxedFilter;
use warp::http::header::{HeaderValue, SET_COOKIE};
use warp::reply::Response;
use warp::Filter;

pub(crate) fn routes(state: AppState) -> BoxedFilter<(Response,)> {
    let limit = state.config.server.body_limit;

    let login = warp::path!("api" / "auth" / "login")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(json_body::<LoginInput>(limit))
        .then(login)
        .map(respond);

    let register = warp::path!("api" / "auth" / "register")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(json_body::<RegisterInput>(limit))
        .then(register)
        .map(respond);

    let logout = warp::path!("api" / "auth" / "logout")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(session_id(state.clone()))
        .then(logout)
        .map(respond);

    let me = warp::path!("api" / "me")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and(session_id(state))
        .then(me)
        .map(respond);

    login
        .or(register)
        .unify()
        .or(logout)
        .unify()
        .or(me)
        .unify()
        .boxed()
}

fn with_cookie(mut response: Response, cookie: &str) -> ApiResult<Response> {
    let value = HeaderValue::from_str(cookie).map_err(ApiError::internal)?;
    response.headers_mut().insert(SET_COOKIE, value);
    Ok(response)
}

async fn start_session(state: &AppState, user: &User, response: Response) -> ApiResult<Response> {
    let id = state.sessions.create(user.profile()).await;
    with_cookie(response, &state.sessions.set_cookie(&id))
}

async fn login(state: AppState, input: LoginInput) -> ApiResult<Response> {
    let user = auth::authenticate(state.storage.as_ref(), &input).await?;
    let response = reply::ok(&json!({ "user": user.profile() }));
    start_session(&state, &user, response).await
}

async fn register(state: AppState, input: RegisterInput) -> ApiResult<Response> {
    let user = auth::register(state.storage.as_ref(), input).await?;
    let response = reply::created(&json!({ "user": user.profile() }));
    start_session(&state, &user, response).await
}

async fn logout(state: AppState, session: Option<String>) -> ApiResult<Response> {
    if let Some(id) = session {
        state.sessions.destroy(&id).await;
    }
    with_cookie(
        reply::message("Logged out successfully"),
        &state.sessions.clear_cookie(),
    )
}

async fn me(state: AppState, session: Option<String>) -> ApiResult<Response> {
    let not_signed_in = || ApiError::Unauthorized("Not authenticated");
    let id = session.ok_or_else(not_signed_in)?;
    let profile = state.sessions.get(&id).await.ok_or_else(not_signed_in)?;

    // The account may have been removed since sign-in
    let Some(user) = state.storage.get_user(profile.id).await? else {
        state.sessions.destroy(&id).await;
        return Err(not_signed_in());
    };
    Ok(reply::ok(&json!({
        "user": user.profile(),
        "permissions": Permissions::for_role(user.role),
    })))
}
