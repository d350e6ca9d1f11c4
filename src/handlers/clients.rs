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
    error::{AppError, AppResult, JsonBody},
    models::{Client, ClientPatch, ClientRequest},
    policy::{self, Action, Resource},
};

/// list_clients
///
/// [Public Route] Clients and testimonials, newest first.
#[utoipa::path(
    get,
    path = "/clients/",
    responses((status = 200, description = "All clients", body = [Client]))
)]
pub async fn list_clients(
    principal: Principal,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Client>>> {
    policy::enforce(Resource::Client, Action::List, &principal)?;
    Ok(Json(state.repo.list_clients().await?))
}

#[utoipa::path(
    get,
    path = "/clients/{id}/",
    params(("id" = Uuid, Path, description = "Client ID")),
    responses(
        (status = 200, description = "Found", body = Client),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_client(
    principal: Principal,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Client>> {
    policy::enforce(Resource::Client, Action::Retrieve, &principal)?;
    let id = parse_id(&id)?;
    Ok(Json(found(state.repo.get_client(id).await?)?))
}

/// create_client
///
/// [Authenticated Route] `designation` defaults to "Client" when omitted.
#[utoipa::path(
    post,
    path = "/clients/",
    request_body = ClientRequest,
    responses(
        (status = 201, description = "Created", body = Client),
        (status = 400, description = "Validation errors"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn create_client(
    principal: Principal,
    State(state): State<AppState>,
    body: Result<JsonBody<ClientRequest>, AppError>,
) -> AppResult<(StatusCode, Json<Client>)> {
    policy::enforce(Resource::Client, Action::Create, &principal)?;
    let JsonBody(payload) = body?;
    let client = state.repo.create_client(payload.validate()?).await?;
    tracing::info!(client_id = %client.id, "client created");
    Ok((StatusCode::CREATED, Json(client)))
}

#[utoipa::path(
    put,
    path = "/clients/{id}/",
    params(("id" = Uuid, Path, description = "Client ID")),
    request_body = ClientPatch,
    responses(
        (status = 200, description = "Updated", body = Client),
        (status = 400, description = "Validation errors"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_client(
    principal: Principal,
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<JsonBody<ClientPatch>, AppError>,
) -> AppResult<Json<Client>> {
    policy::enforce(Resource::Client, Action::Update, &principal)?;
    let id = parse_id(&id)?;
    let current = found(state.repo.get_client(id).await?)?;

    let JsonBody(payload) = body?;
    let input = payload.replace(&current).validate()?;
    Ok(Json(found(state.repo.update_client(id, input).await?)?))
}

#[utoipa::path(
    patch,
    path = "/clients/{id}/",
    params(("id" = Uuid, Path, description = "Client ID")),
    request_body = ClientPatch,
    responses(
        (status = 200, description = "Updated", body = Client),
        (status = 400, description = "Validation errors"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn partial_update_client(
    principal: Principal,
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<JsonBody<ClientPatch>, AppError>,
) -> AppResult<Json<Client>> {
    policy::enforce(Resource::Client, Action::PartialUpdate, &principal)?;
    let id = parse_id(&id)?;
    let current = found(state.repo.get_client(id).await?)?;

    let JsonBody(patch) = body?;
    let input = patch.merge(&current).validate()?;
    Ok(Json(found(state.repo.update_client(id, input).await?)?))
}

/// delete_client
///
/// [Authenticated Route] Hard delete. Every project referencing the client is
/// deleted with it.
#[utoipa::path(
    delete,
    path = "/clients/{id}/",
    params(("id" = Uuid, Path, description = "Client ID")),
    responses(
        (status = 204, description = "Deleted along with its projects"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_client(
    principal: Principal,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    policy::enforce(Resource::Client, Action::Destroy, &principal)?;
    let id = parse_id(&id)?;
    if !state.repo.delete_client(id).await? {
        return Err(AppError::NotFound);
    }
    tracing::info!(client_id = %id, "client deleted with its projects");
    Ok(StatusCode::NO_CONTENT)
}
