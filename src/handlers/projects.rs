use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use super::{found, parse_id};
use crate::{
    AppState,
    auth::Principal,
    error::{AppError, AppResult, FieldErrors, JsonBody, UNKNOWN_CLIENT},
    models::{Project, ProjectPatch, ProjectRequest},
    policy::{self, Action, Resource},
};

/// Fast-path check for the project's client reference. The foreign key in the
/// store remains the authoritative guard.
async fn ensure_client_exists(state: &AppState, client_id: Option<Uuid>) -> AppResult<()> {
    let Some(client_id) = client_id else {
        return Ok(());
    };
    if state.repo.get_client(client_id).await?.is_none() {
        return Err(FieldErrors::single("client", UNKNOWN_CLIENT).into());
    }
    Ok(())
}

/// list_projects
///
/// [Public Route] Every project in creation order, each with its client's name.
#[utoipa::path(
    get,
    path = "/projects/",
    responses((status = 200, description = "All projects", body = [Project]))
)]
pub async fn list_projects(
    principal: Principal,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Project>>> {
    policy::enforce(Resource::Project, Action::List, &principal)?;
    Ok(Json(state.repo.list_projects().await?))
}

/// get_project
///
/// [Public Route] A single project by id.
#[utoipa::path(
    get,
    path = "/projects/{id}/",
    params(("id" = Uuid, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Found", body = Project),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_project(
    principal: Principal,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Project>> {
    policy::enforce(Resource::Project, Action::Retrieve, &principal)?;
    let id = parse_id(&id)?;
    Ok(Json(found(state.repo.get_project(id).await?)?))
}

/// create_project
///
/// [Authenticated Route] Adds a project. `image` is a storage key obtained from
/// `POST /uploads/presigned`.
#[utoipa::path(
    post,
    path = "/projects/",
    request_body = ProjectRequest,
    responses(
        (status = 201, description = "Created", body = Project),
        (status = 400, description = "Validation errors"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn create_project(
    principal: Principal,
    State(state): State<AppState>,
    body: Result<JsonBody<ProjectRequest>, AppError>,
) -> AppResult<(StatusCode, Json<Project>)> {
    policy::enforce(Resource::Project, Action::Create, &principal)?;
    let JsonBody(payload) = body?;
    let input = payload.validate()?;
    ensure_client_exists(&state, input.client_id).await?;

    let project = state.repo.create_project(input).await?;
    tracing::info!(project_id = %project.id, "project created");
    Ok((StatusCode::CREATED, Json(project)))
}

/// update_project
///
/// [Authenticated Route] Full replacement: every required field must be present.
/// Omitted `link` and `client` keep their stored values.
#[utoipa::path(
    put,
    path = "/projects/{id}/",
    params(("id" = Uuid, Path, description = "Project ID")),
    request_body = ProjectPatch,
    responses(
        (status = 200, description = "Updated", body = Project),
        (status = 400, description = "Validation errors"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_project(
    principal: Principal,
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<JsonBody<ProjectPatch>, AppError>,
) -> AppResult<Json<Project>> {
    policy::enforce(Resource::Project, Action::Update, &principal)?;
    let id = parse_id(&id)?;
    let current = found(state.repo.get_project(id).await?)?;

    let JsonBody(payload) = body?;
    let input = payload.replace(&current).validate()?;
    ensure_client_exists(&state, input.client_id).await?;

    Ok(Json(found(state.repo.update_project(id, input).await?)?))
}

/// partial_update_project
///
/// [Authenticated Route] Applies only the supplied fields; the merged record is
/// validated with the same rules as a create.
#[utoipa::path(
    patch,
    path = "/projects/{id}/",
    params(("id" = Uuid, Path, description = "Project ID")),
    request_body = ProjectPatch,
    responses(
        (status = 200, description = "Updated", body = Project),
        (status = 400, description = "Validation errors"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn partial_update_project(
    principal: Principal,
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<JsonBody<ProjectPatch>, AppError>,
) -> AppResult<Json<Project>> {
    policy::enforce(Resource::Project, Action::PartialUpdate, &principal)?;
    let id = parse_id(&id)?;
    let current = found(state.repo.get_project(id).await?)?;

    let JsonBody(patch) = body?;
    let input = patch.merge(&current).validate()?;
    ensure_client_exists(&state, input.client_id).await?;

    Ok(Json(found(state.repo.update_project(id, input).await?)?))
}

/// delete_project
///
/// [Authenticated Route] Hard delete.
#[utoipa::path(
    delete,
    path = "/projects/{id}/",
    params(("id" = Uuid, Path, description = "Project ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_project(
    principal: Principal,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    policy::enforce(Resource::Project, Action::Destroy, &principal)?;
    let id = parse_id(&id)?;
    if state.repo.delete_project(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound)
    }
}
