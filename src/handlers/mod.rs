//! HTTP handlers, grouped by resource.
//!
//! Every resource handler takes the caller's [`Principal`](crate::auth::Principal)
//! and consults [`policy::enforce`](crate::policy::enforce) before reading the
//! request body, so an anonymous write is answered with 401 whatever it carries.
//! Bodies are therefore extracted as `Result<JsonBody<T>, AppError>` and only
//! unwrapped after the policy check.

use uuid::Uuid;

use crate::error::{AppError, AppResult};

pub mod auth;
pub mod clients;
pub mod contacts;
pub mod dashboard;
pub mod newsletter;
pub mod projects;
pub mod uploads;

/// Record ids arrive as raw path segments; anything that is not a UUID names no
/// record and is reported as 404 rather than a routing error.
pub(crate) fn parse_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound)
}

/// Maps a repository lookup onto 404.
pub(crate) fn found<T>(value: Option<T>) -> AppResult<T> {
    value.ok_or(AppError::NotFound)
}
