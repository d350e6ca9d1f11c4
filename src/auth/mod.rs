use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::User;
use crate::policy::NOT_AUTHENTICATED;
use crate::repository::RepositoryState;

pub mod password;
pub mod tokens;

pub use tokens::{Claims, JwtTokenIssuer, TokenIssuer, TokenState};

/// AuthUser
///
/// The resolved identity behind a valid access token. `is_admin` and
/// `is_superuser` are read from the store on every request, so a demotion takes
/// effect without waiting for the token to expire.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
    pub is_admin: bool,
    pub is_superuser: bool,
}

impl From<&User> for AuthUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            is_admin: user.is_admin,
            is_superuser: user.is_superuser,
        }
    }
}

/// Principal
///
/// The caller of a request: either nobody, or a user holding a valid credential.
/// This is what the authorization policy reasons about.
#[derive(Debug, Clone)]
pub enum Principal {
    Anonymous,
    Authenticated(AuthUser),
}

impl Principal {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Principal::Authenticated(_))
    }

    pub fn is_superuser(&self) -> bool {
        matches!(self, Principal::Authenticated(user) if user.is_superuser)
    }

    pub fn user(&self) -> Option<&AuthUser> {
        match self {
            Principal::Authenticated(user) => Some(user),
            Principal::Anonymous => None,
        }
    }
}

/// resolve_principal
///
/// 1. No `Authorization` header: anonymous.
/// 2. A header that is not `Bearer <token>`, a token that fails verification, or a
///    subject that no longer exists or is inactive: 401, even on open endpoints.
/// 3. Otherwise the user row backing the token.
pub async fn resolve_principal(
    parts: &Parts,
    tokens: &TokenState,
    repo: &RepositoryState,
) -> AppResult<Principal> {
    let Some(value) = parts.headers.get(header::AUTHORIZATION) else {
        return Ok(Principal::Anonymous);
    };

    let invalid = || AppError::Authentication(tokens::INVALID_TOKEN.to_string());

    let token = value
        .to_str()
        .ok()
        .and_then(|raw| raw.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(invalid)?;

    let claims = tokens.verify_access(token)?;

    // The token may outlive the account.
    let user = repo
        .get_user(claims.sub)
        .await?
        .filter(|user| user.is_active)
        .ok_or_else(invalid)?;

    Ok(Principal::Authenticated(AuthUser::from(&user)))
}

/// Principal Extractor
///
/// Usable on every handler, open or not; the handler then consults the policy.
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    TokenState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let tokens = TokenState::from_ref(state);
        resolve_principal(parts, &tokens, &repo).await
    }
}

/// AuthUser Extractor
///
/// For endpoints outside the resource policy that always need a signed-in caller
/// (verify, uploads, dashboard stats). Anonymous callers get 401.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    TokenState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Principal::from_request_parts(parts, state).await? {
            Principal::Authenticated(user) => Ok(user),
            Principal::Anonymous => Err(AppError::Authentication(NOT_AUTHENTICATED.to_string())),
        }
    }
}
