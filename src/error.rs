use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::json;
use std::collections::BTreeMap;

/// FieldErrors
///
/// Field-scoped validation messages, serialized as `{ "field": ["message", ...] }`.
/// Errors that are not tied to a single field are recorded under `non_field_errors`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub const NON_FIELD: &'static str = "non_field_errors";

    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an error set holding exactly one message.
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    /// Returns `Ok(value)` when no error was recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

/// AppError
///
/// The single error type flowing out of repositories, extractors and handlers.
/// `IntoResponse` maps each variant onto the HTTP taxonomy:
/// validation 400, authentication 401, permission 403, not found 404.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("validation failed: {0:?}")]
    Validation(FieldErrors),

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("resource not found")]
    NotFound,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Convenience alias used by handlers and the repository layer.
pub type AppResult<T> = Result<T, AppError>;

impl From<FieldErrors> for AppError {
    fn from(errors: FieldErrors) -> Self {
        AppError::Validation(errors)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(FieldErrors::single(
            FieldErrors::NON_FIELD,
            rejection.body_text(),
        ))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(errors) => (StatusCode::BAD_REQUEST, Json(errors)).into_response(),
            AppError::Authentication(message) => {
                (StatusCode::UNAUTHORIZED, Json(json!({ "error": message }))).into_response()
            }
            AppError::PermissionDenied(message) => {
                (StatusCode::FORBIDDEN, Json(json!({ "error": message }))).into_response()
            }
            AppError::NotFound => {
                (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not found." }))).into_response()
            }
            AppError::Database(err) => match constraint_violation_field(&err) {
                Some((field, message)) => {
                    AppError::Validation(FieldErrors::single(field, message)).into_response()
                }
                None => {
                    tracing::error!(error = %err, "database error");
                    internal_error_response()
                }
            },
            AppError::Internal(message) => {
                tracing::error!(error = %message, "internal error");
                internal_error_response()
            }
        }
    }
}

fn internal_error_response() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "An internal error occurred" })),
    )
        .into_response()
}

/// constraint_violation_field
///
/// Translates a PostgreSQL unique (23505) or foreign-key (23503) violation on a
/// known constraint into the field error the application-level check would have
/// produced. The store constraint is the authoritative guard, so a request that
/// raced past the fast-path check still receives a 400, not a 500.
pub fn constraint_violation_field(err: &sqlx::Error) -> Option<(&'static str, &'static str)> {
    let sqlx::Error::Database(db_err) = err else {
        return None;
    };
    match (db_err.code().as_deref()?, db_err.constraint()?) {
        ("23505", "users_username_key") => Some(("username", USERNAME_TAKEN)),
        ("23505", "users_email_key") => Some(("email", EMAIL_TAKEN)),
        ("23505", "newsletter_subscribers_email_key") => Some(("email", ALREADY_SUBSCRIBED)),
        ("23503", "projects_client_id_fkey") => Some(("client", UNKNOWN_CLIENT)),
        _ => None,
    }
}

pub const UNKNOWN_CLIENT: &str = "Invalid pk - object does not exist.";
pub const USERNAME_TAKEN: &str = "A user with that username already exists.";
pub const EMAIL_TAKEN: &str = "A user with that email already exists.";
pub const ALREADY_SUBSCRIBED: &str = "This email is already subscribed.";

/// JsonBody
///
/// `Json<T>` whose rejection is reported as a 400 field error instead of axum's
/// default plain-text 415/422 responses.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(JsonBody(value))
    }
}
