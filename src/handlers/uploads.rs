use axum::{Json, extract::State};

use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, AppResult, FieldErrors, JsonBody},
    models::{PresignedUrlRequest, PresignedUrlResponse},
    storage,
};

pub const NOT_AN_IMAGE: &str = "Only image uploads are accepted.";

/// get_presigned_url
///
/// [Authenticated Route] Signs a short-lived PUT URL so the dashboard can upload a
/// project cover or client portrait straight to object storage. The returned
/// `resource_key` is what the Project/Client `image` field stores.
#[utoipa::path(
    post,
    path = "/uploads/presigned",
    request_body = PresignedUrlRequest,
    responses(
        (status = 200, description = "URL", body = PresignedUrlResponse),
        (status = 400, description = "Not an image type"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_presigned_url(
    auth_user: AuthUser,
    State(state): State<AppState>,
    body: Result<JsonBody<PresignedUrlRequest>, AppError>,
) -> AppResult<Json<PresignedUrlResponse>> {
    let JsonBody(payload) = body?;

    if !payload.file_type.starts_with("image/") {
        return Err(FieldErrors::single("file_type", NOT_AN_IMAGE).into());
    }

    let object_key = storage::image_key(payload.folder, &payload.filename);

    let upload_url = state
        .storage
        .get_presigned_upload_url(&object_key, &payload.file_type)
        .await
        .map_err(|e| AppError::Internal(format!("presigning failed: {e}")))?;

    tracing::info!(user_id = %auth_user.id, key = %object_key, "issued upload URL");

    Ok(Json(PresignedUrlResponse {
        upload_url,
        resource_key: object_key,
    }))
}
