//! `GET /api/dashboard/stats`

use crate::error::{respond, ApiResult};
use crate::filters::{authenticated, with_state};
use crate::reply;
use crate::state::AppState;
use avs_core::Actor;
use warp::filters::BoxedFilter;
use warp::reply::Response;
use warp::Filter;

pub(crate) fn routes(state: AppState) -> BoxedFilter<(Response,)> {
    warp::path!("api" / "dashboard" / "stats")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and(authenticated(state))
        .then(stats)
        .map(respond)
        .boxed()
}

async fn stats(state: AppState, actor: Actor) -> ApiResult<Response> {
    let stats = state.storage.dashboard_stats(&actor).await?;
    Ok(reply::ok(&stats))
}
