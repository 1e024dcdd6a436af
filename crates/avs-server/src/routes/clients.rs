//! `/api/clients`

use crate::error::{respond, ApiError, ApiResult};
use crate::filters::{authenticated, json_body, with_state};
use crate::reply;
use crate::state::AppState;
use avs_core::{Actor, ClientId, ClientPatch, NewClient};
use warp::filters::BoxedFilter;
use warp::reply::Response;
use warp::Filter;

pub(crate) fn routes(state: AppState) -> BoxedFilter<(Response,)> {
    let limit = state.config.server.body_limit;
    let base = with_state(state.clone()).and(authenticated(state));

    let list = warp::path!("api" / "clients")
        .and(warp::get())
        .and(base.clone())
        .then(list)
        .map(respond);

    let create = warp::path!("api" / "clients")
        .and(warp::post())
        .and(base.clone())
        .and(json_body::<NewClient>(limit))
        .then(create)
        .map(respond);

    let get = warp::path!("api" / "clients" / ClientId)
        .and(warp::get())
        .and(base.clone())
        .then(get)
        .map(respond);

    let update = warp::path!("api" / "clients" / ClientId)
        .and(warp::patch())
        .and(base.clone())
        .and(json_body::<ClientPatch>(limit))
        .then(update)
        .map(respond);

    let delete = warp::path!("api" / "clients" / ClientId)
        .and(warp::delete())
        .and(base)
        .then(delete)
        .map(respond);

    list.or(create)
        .unify()
        .or(get)
        .unify()
        .or(update)
        .unify()
        .or(delete)
        .unify()
        .boxed()
}

fn denied() -> ApiError {
    ApiError::not_found("Client not found or access denied")
}

async fn list(state: AppState, actor: Actor) -> ApiResult<Response> {
    let clients = state.storage.list_clients(&actor).await?;
    Ok(reply::ok(&clients))
}

async fn create(state: AppState, actor: Actor, input: NewClient) -> ApiResult<Response> {
    let client = state.storage.create_client(input, actor.user_id).await?;
    Ok(reply::created(&client))
}

async fn get(id: ClientId, state: AppState, actor: Actor) -> ApiResult<Response> {
    let client = state
        .storage
        .get_client(id, &actor)
        .await?
        .ok_or_else(|| ApiError::not_found("Client not found"))?;
    Ok(reply::ok(&client))
}

async fn update(
    id: ClientId,
    state: AppState,
    actor: Actor,
    patch: ClientPatch,
) -> ApiResult<Response> {
    let client = state
        .storage
        .update_client(id, patch, &actor)
        .await?
        .ok_or_else(denied)?;
    Ok(reply::ok(&client))
}

async fn delete(id: ClientId, state: AppState, actor: Actor) -> ApiResult<Response> {
    if !state.storage.delete_client(id, &actor).await? {
        return Err(denied());
    }
    Ok(reply::message("Client deleted successfully"))
}
