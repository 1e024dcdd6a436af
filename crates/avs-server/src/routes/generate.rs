//! `POST /api/generate/text` and `POST /api/generate/image`

use crate::error::{respond, ApiResult};
use crate::filters::{authenticated, json_body, with_state};
use crate::reply;
use crate::state::AppState;
use crate::studio;
use avs_core::{Actor, ImageGenerationRequest, TextGenerationRequest};
use serde_json::json;
use warp::filters::BoxedFilter;
use warp::reply::Response;
use warp::Filter;

pub(crate) fn routes(state: AppState) -> BoxedFilter<(Response,)> {
    let limit = state.config.server.body_limit;
    let base = with_state(state.clone()).and(authenticated(state));

    let text = warp::path!("api" / "generate" / "text")
        .and(warp::post())
        .and(base.clone())
        .and(json_body::<TextGenerationRequest>(limit))
        .then(text)
        .map(respond);

    let image = warp::path!("api" / "generate" / "image")
        .and(warp::post())
        .and(base)
        .and(json_body::<ImageGenerationRequest>(limit))
        .then(image)
        .map(respond);

    text.or(image).unify().boxed()
}

async fn text(state: AppState, actor: Actor, request: TextGenerationRequest) -> ApiResult<Response> {
    let variants = studio::generate_text(&state, &actor, &request).await?;
    Ok(reply::ok(&json!({ "variants": variants })))
}

async fn image(state: AppState, actor: Actor, request: ImageGenerationRequest) -> ApiResult<Response> {
    let images = studio::generate_image_urls(&state, &actor, &request).await?;
    Ok(reply::ok(&json!({ "images": images })))
}
