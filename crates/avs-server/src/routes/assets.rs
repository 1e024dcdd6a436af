//! `/api/assets`

use crate::error::{respond, ApiError, ApiResult};
use crate::filters::{authenticated, json_body, with_state, AssetQuery};
use crate::reply;
use crate::state::AppState;
use crate::studio;
use avs_core::{Actor, AssetId, AssetPatch, NewAsset};
use warp::filters::BoxedFilter;
use warp::reply::Response;
use warp::Filter;

pub(crate) fn routes(state: AppState) -> BoxedFilter<(Response,)> {
    let limit = state.config.server.body_limit;
    let base = with_state(state.clone()).and(authenticated(state));

    let list = warp::path!("api" / "assets")
        .and(warp::get())
        .and(base.clone())
        .and(warp::query::<AssetQuery>())
        .then(list)
        .map(respond);

    let create = warp::path!("api" / "assets")
        .and(warp::post())
        .and(base.clone())
        .and(json_body::<NewAsset>(limit))
        .then(create)
        .map(respond);

    let get = warp::path!("api" / "assets" / AssetId)
        .and(warp::get())
        .and(base.clone())
        .then(get)
        .map(respond);

    let update = warp::path!("api" / "assets" / AssetId)
        .and(warp::patch())
        .and(base.clone())
        .and(json_body::<AssetPatch>(limit))
        .then(update)
        .map(respond);

    let delete = warp::path!("api" / "assets" / AssetId)
        .and(warp::delete())
        .and(base.clone())
        .then(delete)
        .map(respond);

    let regenerate = warp::path!("api" / "assets" / AssetId / "generate-template")
        .and(warp::post())
        .and(base)
        .then(regenerate)
        .map(respond);

    list.or(create)
        .unify()
        .or(get)
        .unify()
        .or(update)
        .unify()
        .or(delete)
        .unify()
        .or(regenerate)
        .unify()
        .boxed()
}

async fn list(state: AppState, actor: Actor, query: AssetQuery) -> ApiResult<Response> {
    let assets = state.storage.list_assets(query.project_id, &actor).await?;
    Ok(reply::ok(&assets))
}

async fn create(state: AppState, actor: Actor, input: NewAsset) -> ApiResult<Response> {
    let asset = studio::create_asset(&state, &actor, input).await?;
    Ok(reply::created(&asset))
}

async fn get(id: AssetId, state: AppState, actor: Actor) -> ApiResult<Response> {
    let asset = state
        .storage
        .get_asset(id, &actor)
        .await?
        .ok_or_else(|| ApiError::not_found("Asset not found"))?;
    Ok(reply::ok(&asset))
}

async fn update(id: AssetId, state: AppState, actor: Actor, patch: AssetPatch) -> ApiResult<Response> {
    let asset = studio::update_asset(&state, &actor, id, patch).await?;
    Ok(reply::ok(&asset))
}

async fn delete(id: AssetId, state: AppState, actor: Actor) -> ApiResult<Response> {
    if !state.storage.delete_asset(id, &actor).await? {
        return Err(ApiError::not_found("Asset not found or access denied"));
    }
    Ok(reply::message("Asset deleted successfully"))
}

async fn regenerate(id: AssetId, state: AppState, actor: Actor) -> ApiResult<Response> {
    let asset = studio::regenerate_template(&state, &actor, id).await?;
    Ok(reply::ok(&asset))
}
