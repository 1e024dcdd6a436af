//! `/api/variants`

use crate::error::{respond, ApiError, ApiResult};
use crate::filters::{authenticated, json_body, with_state, VariantQuery};
use crate::reply;
use crate::state::AppState;
use crate::studio;
use avs_core::{Actor, BatchGenerationRequest, NewVariant, VariantId, VariantPatch};
use warp::filters::BoxedFilter;
use warp::reply::Response;
use warp::Filter;

pub(crate) fn routes(state: AppState) -> BoxedFilter<(Response,)> {
    let limit = state.config.server.body_limit;
    let base = with_state(state.clone()).and(authenticated(state));

    let list = warp::path!("api" / "variants")
        .and(warp::get())
        .and(base.clone())
        .and(warp::query::<VariantQuery>())
        .then(list)
        .map(respond);

    let create = warp::path!("api" / "variants")
        .and(warp::post())
        .and(base.clone())
        .and(json_body::<NewVariant>(limit))
        .then(create)
        .map(respond);

    let generate = warp::path!("api" / "variants" / "generate")
        .and(warp::post())
        .and(base.clone())
        .and(json_body::<BatchGenerationRequest>(limit))
        .then(generate)
        .map(respond);

    let get = warp::path!("api" / "variants" / VariantId)
        .and(warp::get())
        .and(base.clone())
        .then(get)
        .map(respond);

    let update = warp::path!("api" / "variants" / VariantId)
        .and(warp::patch())
        .and(base.clone())
        .and(json_body::<VariantPatch>(limit))
        .then(update)
        .map(respond);

    let delete = warp::path!("api" / "variants" / VariantId)
        .and(warp::delete())
        .and(base)
        .then(delete)
        .map(respond);

    list.or(create)
        .unify()
        .or(generate)
        .unify()
        .or(get)
        .unify()
        .or(update)
        .unify()
        .or(delete)
        .unify()
        .boxed()
}

async fn list(state: AppState, actor: Actor, query: VariantQuery) -> ApiResult<Response> {
    let variants = state.storage.list_variants(query.asset_id, &actor).await?;
    Ok(reply::ok(&variants))
}

async fn create(state: AppState, actor: Actor, input: NewVariant) -> ApiResult<Response> {
    let variant = studio::create_variant(&state, &actor, input).await?;
    Ok(reply::created(&variant))
}

async fn generate(
    state: AppState,
    actor: Actor,
    request: BatchGenerationRequest,
) -> ApiResult<Response> {
    let outcome = studio::auto_generate(&state, &actor, &request).await?;
    Ok(reply::ok(&outcome))
}

async fn get(id: VariantId, state: AppState, actor: Actor) -> ApiResult<Response> {
    let variant = state
        .storage
        .get_variant(id, &actor)
        .await?
        .ok_or_else(|| ApiError::not_found("Variant not found"))?;
    Ok(reply::ok(&variant))
}

async fn update(
    id: VariantId,
    state: AppState,
    actor: Actor,
    patch: VariantPatch,
) -> ApiResult<Response> {
    let variant = studio::update_variant(&state, &actor, id, patch).await?;
    Ok(reply::ok(&variant))
}

async fn delete(id: VariantId, state: AppState, actor: Actor) -> ApiResult<Response> {
    if !state.storage.delete_variant(id, &actor).await? {
        return Err(ApiError::not_found("Variant not found or access denied"));
    }
    Ok(reply::message("Variant deleted successfully"))
}
