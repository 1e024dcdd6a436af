//! HTTP routes
//!
//! One module per resource. Each exposes a boxed filter producing a
//! finished [`Response`]; handler failures are rendered in place, so only
//! warp's own rejections reach [`recover`].

mod assets;
mod auth;
mod clients;
mod dashboard;
mod generate;
mod objects;
mod projects;
mod users;
mod variants;

use crate::error::recover;
use crate::state::AppState;
use std::convert::Infallible;
use tracing::info;
use warp::filters::BoxedFilter;
use warp::reply::Response;
use warp::{Filter, Reply};

/// Every API route, without rejection handling
pub fn api(state: &AppState) -> BoxedFilter<(Response,)> {
    auth::routes(state.clone())
        .or(dashboard::routes(state.clone()))
        .unify()
        .or(users::routes(state.clone()))
        .unify()
        .or(clients::routes(state.clone()))
        .unify()
        .or(projects::routes(state.clone()))
        .unify()
        .or(assets::routes(state.clone()))
        .unify()
        .or(variants::routes(state.clone()))
        .unify()
        .or(generate::routes(state.clone()))
        .unify()
        .or(objects::routes(state.clone()))
        .unify()
        .boxed()
}

/// The complete application: routes, error envelope and request log
pub fn app(state: &AppState) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    api(state)
        .recover(recover)
        .with(warp::log::custom(log_request))
}

fn log_request(info: warp::log::Info<'_>) {
    let elapsed_ms = u64::try_from(info.elapsed().as_millis()).unwrap_or(u64::MAX);
    info!(
        method = %info.method(),
        path = info.path(),
        status = info.status().as_u16(),
        elapsed_ms,
        "request"
    );
}
