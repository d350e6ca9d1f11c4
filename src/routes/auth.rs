use crate::{AppState, handlers::auth};
use axum::{
    Router,
    routing::{get, post},
};

/// Auth Router Module
///
/// Token-based session endpoints for the admin dashboard.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        // POST /auth/register/
        // Open while no admin exists; superuser-only afterwards.
        .route("/auth/register/", post(auth::register))
        // POST /auth/login/
        // Admins only. Every failure reads the same.
        .route("/auth/login/", post(auth::login))
        .route("/auth/token/refresh/", post(auth::refresh_token))
        // GET /auth/verify/
        // Lets the dashboard check a stored access token on load.
        .route("/auth/verify/", get(auth::verify))
}
