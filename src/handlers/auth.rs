use axum::{Json, extract::State, http::StatusCode};

use crate::{
    AppState,
    auth::{AuthUser, Principal, password},
    error::{AppError, AppResult, FieldErrors, JsonBody},
    models::{
        AccessTokenResponse, LoginRequest, LoginResponse, NewAdmin, RefreshRequest,
        RegisterRequest, RegisterResponse, UserProfile, VerifyResponse,
    },
    repository::REGISTRATION_CLOSED,
    validation::{REQUIRED, required_email, required_text},
};

pub use crate::error::{EMAIL_TAKEN, USERNAME_TAKEN};

pub const INVALID_LOGIN: &str = "Invalid credentials or not an admin";
pub const PASSWORD_TOO_SHORT: &str = "Password must be at least 6 characters long.";
pub const PASSWORD_MISMATCH: &str = "Password fields didn't match.";
pub const INVALID_USERNAME: &str =
    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.";

const USERNAME_MAX_LENGTH: usize = 150;

/// A validated registration, password still in clear.
struct Registration {
    username: String,
    email: String,
    password: String,
}

/// validate_registration
///
/// Field checks first; the cross-field checks (password confirmation, then
/// uniqueness) only run once every field is individually valid.
async fn validate_registration(
    state: &AppState,
    payload: RegisterRequest,
) -> Result<Registration, AppError> {
    let mut errors = FieldErrors::new();

    let username = required_text(&mut errors, "username", payload.username, Some(USERNAME_MAX_LENGTH));
    if !username.is_empty()
        && !username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        errors.add("username", INVALID_USERNAME);
    }

    let email = required_email(&mut errors, "email", payload.email);

    // Passwords are taken verbatim: no trimming.
    let password = match payload.password {
        None => {
            errors.add("password", REQUIRED);
            String::new()
        }
        Some(p) if p.chars().count() < password::MIN_PASSWORD_LENGTH => {
            errors.add("password", PASSWORD_TOO_SHORT);
            p
        }
        Some(p) => p,
    };
    let confirm_password = payload.confirm_password.unwrap_or_else(|| {
        errors.add("confirm_password", REQUIRED);
        String::new()
    });

    if !errors.is_empty() {
        return Err(errors.into());
    }

    if password != confirm_password {
        return Err(FieldErrors::single("confirm_password", PASSWORD_MISMATCH).into());
    }
    if state.repo.username_taken(&username).await? {
        return Err(FieldErrors::single("username", USERNAME_TAKEN).into());
    }
    if state.repo.email_taken(&email).await? {
        return Err(FieldErrors::single("email", EMAIL_TAKEN).into());
    }

    Ok(Registration { username, email, password })
}

/// register
///
/// [Open while no admin exists, superuser-only afterwards] Creates an admin account
/// and returns it with a fresh token pair.
///
/// The admin count checked here is only a fast path; the repository repeats the
/// count-and-branch atomically with the insert, so two concurrent "first"
/// registrations cannot both become bootstrap admins.
#[utoipa::path(
    post,
    path = "/auth/register/",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Admin created", body = RegisterResponse),
        (status = 400, description = "Validation errors"),
        (status = 403, description = "Registration closed")
    )
)]
pub async fn register(
    principal: Principal,
    State(state): State<AppState>,
    body: Result<JsonBody<RegisterRequest>, AppError>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    let caller_is_superuser = principal.is_superuser();
    if !caller_is_superuser && state.repo.admin_exists().await? {
        return Err(AppError::PermissionDenied(REGISTRATION_CLOSED.to_string()));
    }

    let JsonBody(payload) = body?;
    let registration = validate_registration(&state, payload).await?;

    let password_hash = password::hash_password_blocking(registration.password).await?;
    let user = state
        .repo
        .create_admin(
            NewAdmin {
                username: registration.username,
                email: registration.email,
                password_hash,
            },
            caller_is_superuser,
        )
        .await?;

    let token = state.tokens.issue(&user)?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: user.id,
            username: user.username,
            email: user.email,
            is_admin: user.is_admin,
            token,
        }),
    ))
}

/// login
///
/// [Public Route] Exchanges admin credentials for a token pair. Unknown user, wrong
/// password, inactive account and non-admin account all get the same 401 body.
#[utoipa::path(
    post,
    path = "/auth/login/",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = LoginResponse),
        (status = 401, description = "Invalid credentials or not an admin")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    body: Result<JsonBody<LoginRequest>, AppError>,
) -> AppResult<Json<LoginResponse>> {
    let invalid = || AppError::Authentication(INVALID_LOGIN.to_string());

    let JsonBody(payload) = body?;
    let (Some(username), Some(password)) = (payload.username, payload.password) else {
        return Err(invalid());
    };

    let Some(user) = state.repo.get_user_by_username(&username).await? else {
        tracing::debug!("login for unknown username");
        password::verify_dummy_blocking(password).await;
        return Err(invalid());
    };

    let password_ok =
        match password::verify_password_blocking(password, user.password_hash.clone()).await {
            Ok(ok) => ok,
            Err(err) => {
                tracing::error!(user_id = %user.id, error = %err, "password verification failed");
                false
            }
        };
    if !password_ok || !user.is_active || !user.is_admin {
        tracing::debug!(user_id = %user.id, "login rejected");
        return Err(invalid());
    }

    let tokens = state.tokens.issue(&user)?;
    tracing::info!(user_id = %user.id, "admin signed in");

    Ok(Json(LoginResponse {
        user: UserProfile::from(&user),
        refresh: tokens.refresh,
        access: tokens.access,
    }))
}

/// refresh_token
///
/// [Public Route] Mints a new access token from a valid refresh token.
#[utoipa::path(
    post,
    path = "/auth/token/refresh/",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New access token", body = AccessTokenResponse),
        (status = 400, description = "Missing refresh token"),
        (status = 401, description = "Invalid or expired refresh token")
    )
)]
pub async fn refresh_token(
    State(state): State<AppState>,
    body: Result<JsonBody<RefreshRequest>, AppError>,
) -> AppResult<Json<AccessTokenResponse>> {
    let JsonBody(payload) = body?;
    let refresh = payload
        .refresh
        .ok_or_else(|| FieldErrors::single("refresh", REQUIRED))?;
    let access = state.tokens.refresh(&refresh)?;
    Ok(Json(AccessTokenResponse { access }))
}

/// verify
///
/// [Authenticated Route] Returns the profile behind the presented access token.
#[utoipa::path(
    get,
    path = "/auth/verify/",
    responses(
        (status = 200, description = "Token valid", body = VerifyResponse),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn verify(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<VerifyResponse>> {
    let user = state
        .repo
        .get_user(auth_user.id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(VerifyResponse { user: UserProfile::from(&user) }))
}
