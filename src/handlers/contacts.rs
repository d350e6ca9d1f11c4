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
    models::{Contact, ContactPatch, ContactRequest},
    notifier,
    policy::{self, Action, Resource},
};

/// list_contacts
///
/// [Authenticated Route] The inbox, newest submission first.
#[utoipa::path(
    get,
    path = "/contact/",
    responses(
        (status = 200, description = "All contact submissions", body = [Contact]),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_contacts(
    principal: Principal,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Contact>>> {
    policy::enforce(Resource::Contact, Action::List, &principal)?;
    Ok(Json(state.repo.list_contacts().await?))
}

#[utoipa::path(
    get,
    path = "/contact/{id}/",
    params(("id" = Uuid, Path, description = "Contact ID")),
    responses(
        (status = 200, description = "Found", body = Contact),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_contact(
    principal: Principal,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Contact>> {
    policy::enforce(Resource::Contact, Action::Retrieve, &principal)?;
    let id = parse_id(&id)?;
    Ok(Json(found(state.repo.get_contact(id).await?)?))
}

/// create_contact
///
/// [Public Route] Stores a contact-form submission, then hands an email summary
/// to the notifier on a detached task. The response never waits on, or reflects,
/// the mail delivery.
#[utoipa::path(
    post,
    path = "/contact/",
    request_body = ContactRequest,
    responses(
        (status = 201, description = "Submitted", body = Contact),
        (status = 400, description = "Validation errors")
    )
)]
pub async fn create_contact(
    principal: Principal,
    State(state): State<AppState>,
    body: Result<JsonBody<ContactRequest>, AppError>,
) -> AppResult<(StatusCode, Json<Contact>)> {
    policy::enforce(Resource::Contact, Action::Create, &principal)?;
    let JsonBody(payload) = body?;

    let mut input = payload.validate()?;
    // Read state is owned by the dashboard.
    input.is_read = false;

    let contact = state.repo.create_contact(input).await?;
    tracing::info!(contact_id = %contact.id, "contact submission stored");

    notifier::dispatch_contact_notification(state.notifier.clone(), contact.clone());

    Ok((StatusCode::CREATED, Json(contact)))
}

#[utoipa::path(
    put,
    path = "/contact/{id}/",
    params(("id" = Uuid, Path, description = "Contact ID")),
    request_body = ContactPatch,
    responses(
        (status = 200, description = "Updated", body = Contact),
        (status = 400, description = "Validation errors"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_contact(
    principal: Principal,
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<JsonBody<ContactPatch>, AppError>,
) -> AppResult<Json<Contact>> {
    policy::enforce(Resource::Contact, Action::Update, &principal)?;
    let id = parse_id(&id)?;
    let current = found(state.repo.get_contact(id).await?)?;

    let JsonBody(payload) = body?;
    let input = payload.replace(&current).validate()?;
    Ok(Json(found(state.repo.update_contact(id, input).await?)?))
}

/// partial_update_contact
///
/// [Authenticated Route] The dashboard's "mark as read" sends `{ "is_read": true }`.
#[utoipa::path(
    patch,
    path = "/contact/{id}/",
    params(("id" = Uuid, Path, description = "Contact ID")),
    request_body = ContactPatch,
    responses(
        (status = 200, description = "Updated", body = Contact),
        (status = 400, description = "Validation errors"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn partial_update_contact(
    principal: Principal,
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<JsonBody<ContactPatch>, AppError>,
) -> AppResult<Json<Contact>> {
    policy::enforce(Resource::Contact, Action::PartialUpdate, &principal)?;
    let id = parse_id(&id)?;
    let current = found(state.repo.get_contact(id).await?)?;

    let JsonBody(patch) = body?;
    let input = patch.merge(&current).validate()?;
    Ok(Json(found(state.repo.update_contact(id, input).await?)?))
}

#[utoipa::path(
    delete,
    path = "/contact/{id}/",
    params(("id" = Uuid, Path, description = "Contact ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_contact(
    principal: Principal,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    policy::enforce(Resource::Contact, Action::Destroy, &principal)?;
    let id = parse_id(&id)?;
    if state.repo.delete_contact(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound)
    }
}
