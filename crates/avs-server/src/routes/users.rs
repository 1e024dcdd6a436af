//! `GET /api/users`, admins only

use crate::error::{respond, ApiResult};
use crate::filters::{admin, with_state};
use crate::reply;
use crate::state::AppState;
use avs_core::{Actor, UserProfile};
use tracing::debug;
use warp::filters::BoxedFilter;
use warp::reply::Response;
use warp::Filter;

pub(crate) fn routes(state: AppState) -> BoxedFilter<(Response,)> {
    warp::path!("api" / "users")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and(admin(state))
        .then(list)
        .map(respond)
        .boxed()
}

async fn list(state: AppState, actor: Actor) -> ApiResult<Response> {
    let users: Vec<UserProfile> = state
        .storage
        .list_users()
        .await?
        .iter()
        .map(avs_core::User::profile)
        .collect();
    debug!(admin = %actor.user_id, count = users.len(), "Listed users");
    Ok(reply::ok(&users))
}
