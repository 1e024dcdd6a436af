//! `/api/projects`

use crate::error::{respond, ApiError, ApiResult};
use crate::filters::{authenticated, json_body, with_state, ProjectQuery};
use crate::reply;
use crate::state::AppState;
use avs_core::{Actor, NewProject, ProjectId, ProjectPatch};
use avs_store::ProjectFilter;
use warp::filters::BoxedFilter;
use warp::reply::Response;
use warp::Filter;

pub(crate) fn routes(state: AppState) -> BoxedFilter<(Response,)> {
    let limit = state.config.server.body_limit;
    let base = with_state(state.clone()).and(authenticated(state));

    let list = warp::path!("api" / "projects")
        .and(warp::get())
        .and(base.clone())
        .and(warp::query::<ProjectQuery>())
        .then(list)
        .map(respond);

    let create = warp::path!("api" / "projects")
        .and(warp::post())
        .and(base.clone())
        .and(json_body::<NewProject>(limit))
        .then(create)
        .map(respond);

    let get = warp::path!("api" / "projects" / ProjectId)
        .and(warp::get())
        .and(base.clone())
        .then(get)
        .map(respond);

    let update = warp::path!("api" / "projects" / ProjectId)
        .and(warp::patch())
        .and(base.clone())
        .and(json_body::<ProjectPatch>(limit))
        .then(update)
        .map(respond);

    let delete = warp::path!("api" / "projects" / ProjectId)
        .and(warp::delete())
        .and(base.clone())
        .then(delete)
        .map(respond);

    let archive = warp::path!("api" / "projects" / ProjectId / "archive")
        .and(warp::post())
        .and(base.clone())
        .then(archive)
        .map(respond);

    let unarchive = warp::path!("api" / "projects" / ProjectId / "unarchive")
        .and(warp::post())
        .and(base)
        .then(unarchive)
        .map(respond);

    list.or(create)
        .unify()
        .or(get)
        .unify()
        .or(update)
        .unify()
        .or(delete)
        .unify()
        .or(archive)
        .unify()
        .or(unarchive)
        .unify()
        .boxed()
}

fn denied() -> ApiError {
    ApiError::not_found("Project not found or access denied")
}

async fn list(state: AppState, actor: Actor, query: ProjectQuery) -> ApiResult<Response> {
    let filter = ProjectFilter {
        client_id: query.client_id,
        include_archived: query.include_archived(),
    };
    let projects = state.storage.list_projects(filter, &actor).await?;
    Ok(reply::ok(&projects))
}

async fn create(state: AppState, actor: Actor, input: NewProject) -> ApiResult<Response> {
    if state.storage.get_client(input.client_id, &actor).await?.is_none() {
        return Err(ApiError::not_found("Client not found"));
    }
    let project = state.storage.create_project(input, actor.user_id).await?;
    Ok(reply::created(&project))
}

async fn get(id: ProjectId, state: AppState, actor: Actor) -> ApiResult<Response> {
    let project = state
        .storage
        .get_project(id, &actor)
        .await?
        .ok_or_else(|| ApiError::not_found("Project not found"))?;
    Ok(reply::ok(&project))
}

async fn update(
    id: ProjectId,
    state: AppState,
    actor: Actor,
    patch: ProjectPatch,
) -> ApiResult<Response> {
    let project = state
        .storage
        .update_project(id, patch, &actor)
        .await?
        .ok_or_else(denied)?;
    Ok(reply::ok(&project))
}

async fn delete(id: ProjectId, state: AppState, actor: Actor) -> ApiResult<Response> {
    if !state.storage.delete_project(id, &actor).await? {
        return Err(denied());
    }
    Ok(reply::message("Project deleted successfully"))
}

async fn archive(id: ProjectId, state: AppState, actor: Actor) -> ApiResult<Response> {
    let project = state
        .storage
        .archive_project(id, &actor)
        .await?
        .ok_or_else(denied)?;
    Ok(reply::ok(&project))
}

async fn unarchive(id: ProjectId, state: AppState, actor: Actor) -> ApiResult<Response> {
    let project = state
        .storage
        .unarchive_project(id, &actor)
        .await?
        .ok_or_else(denied)?;
    Ok(reply::ok(&project))
}
