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
    error::{AppError, AppResult, FieldErrors, JsonBody},
    models::{
        MessageResponse, NewsletterSubscriber, SubscribeOutcome, SubscribeRequest,
        SubscriberRequest,
    },
    policy::{self, Action, Resource, UNSUBSCRIBE},
};

pub const SUBSCRIBED: &str = "Successfully subscribed to newsletter";
pub const UNSUBSCRIBED: &str = "Successfully unsubscribed";
pub use crate::error::ALREADY_SUBSCRIBED;

/// list_subscribers
///
/// [Authenticated Route] Every subscriber row, active or not, newest first.
#[utoipa::path(
    get,
    path = "/newsletter/",
    responses(
        (status = 200, description = "All subscribers", body = [NewsletterSubscriber]),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_subscribers(
    principal: Principal,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<NewsletterSubscriber>>> {
    policy::enforce(Resource::Newsletter, Action::List, &principal)?;
    Ok(Json(state.repo.list_subscribers().await?))
}

#[utoipa::path(
    get,
    path = "/newsletter/{id}/",
    params(("id" = Uuid, Path, description = "Subscriber ID")),
    responses(
        (status = 200, description = "Found", body = NewsletterSubscriber),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_subscriber(
    principal: Principal,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<NewsletterSubscriber>> {
    policy::enforce(Resource::Newsletter, Action::Retrieve, &principal)?;
    let id = parse_id(&id)?;
    Ok(Json(found(state.repo.get_subscriber(id).await?)?))
}

/// subscribe
///
/// [Public Route] Idempotent by email, in one atomic store operation:
/// - unknown email: a new active row.
/// - inactive row: reactivated, `unsubscribed_at` cleared.
/// - active row: 400.
///
/// A reactivation answers exactly like a new subscription.
#[utoipa::path(
    post,
    path = "/newsletter/",
    request_body = SubscribeRequest,
    responses(
        (status = 201, description = "Subscribed", body = MessageResponse),
        (status = 400, description = "Missing email or already subscribed")
    )
)]
pub async fn subscribe(
    principal: Principal,
    State(state): State<AppState>,
    body: Result<JsonBody<SubscribeRequest>, AppError>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    policy::enforce(Resource::Newsletter, Action::Create, &principal)?;
    let JsonBody(payload) = body?;
    let email = payload.validate()?;

    match state.repo.subscribe(&email).await? {
        SubscribeOutcome::AlreadyActive => {
            Err(FieldErrors::single("email", ALREADY_SUBSCRIBED).into())
        }
        SubscribeOutcome::Created(subscriber) | SubscribeOutcome::Reactivated(subscriber) => {
            tracing::info!(subscriber_id = %subscriber.id, "newsletter subscription active");
            Ok((StatusCode::CREATED, Json(MessageResponse::new(SUBSCRIBED))))
        }
    }
}

#[utoipa::path(
    put,
    path = "/newsletter/{id}/",
    params(("id" = Uuid, Path, description = "Subscriber ID")),
    request_body = SubscriberRequest,
    responses(
        (status = 200, description = "Updated", body = NewsletterSubscriber),
        (status = 400, description = "Validation errors"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_subscriber(
    principal: Principal,
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<JsonBody<SubscriberRequest>, AppError>,
) -> AppResult<Json<NewsletterSubscriber>> {
    policy::enforce(Resource::Newsletter, Action::Update, &principal)?;
    let id = parse_id(&id)?;
    let current = found(state.repo.get_subscriber(id).await?)?;

    let JsonBody(payload) = body?;
    let input = payload.replace(&current).validate()?;
    Ok(Json(found(state.repo.update_subscriber(id, input).await?)?))
}

#[utoipa::path(
    patch,
    path = "/newsletter/{id}/",
    params(("id" = Uuid, Path, description = "Subscriber ID")),
    request_body = SubscriberRequest,
    responses(
        (status = 200, description = "Updated", body = NewsletterSubscriber),
        (status = 400, description = "Validation errors"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn partial_update_subscriber(
    principal: Principal,
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<JsonBody<SubscriberRequest>, AppError>,
) -> AppResult<Json<NewsletterSubscriber>> {
    policy::enforce(Resource::Newsletter, Action::PartialUpdate, &principal)?;
    let id = parse_id(&id)?;
    let current = found(state.repo.get_subscriber(id).await?)?;

    let JsonBody(patch) = body?;
    let input = patch.merge(&current).validate()?;
    Ok(Json(found(state.repo.update_subscriber(id, input).await?)?))
}

#[utoipa::path(
    delete,
    path = "/newsletter/{id}/",
    params(("id" = Uuid, Path, description = "Subscriber ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_subscriber(
    principal: Principal,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    policy::enforce(Resource::Newsletter, Action::Destroy, &principal)?;
    let id = parse_id(&id)?;
    if state.repo.delete_subscriber(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound)
    }
}

/// unsubscribe
///
/// [Public Route] Deactivates a subscriber by id, as linked from outgoing mail.
/// Knowing the id is the only requirement.
#[utoipa::path(
    post,
    path = "/newsletter/{id}/unsubscribe/",
    params(("id" = Uuid, Path, description = "Subscriber ID")),
    responses(
        (status = 200, description = "Unsubscribed", body = MessageResponse),
        (status = 404, description = "Not Found")
    )
)]
pub async fn unsubscribe(
    principal: Principal,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    policy::enforce(Resource::Newsletter, Action::Custom(UNSUBSCRIBE), &principal)?;
    let id: Uuid = parse_id(&id)?;
    let subscriber = found(state.repo.unsubscribe(id).await?)?;
    tracing::info!(subscriber_id = %subscriber.id, "newsletter unsubscribed");
    Ok(Json(MessageResponse::new(UNSUBSCRIBED)))
}
