use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::models::{TokenPair, User};

/// TokenKind
///
/// Access tokens authenticate requests; refresh tokens only mint new access tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Claims
///
/// Payload signed into every token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's id.
    pub sub: Uuid,
    pub username: String,
    pub token_type: TokenKind,
    pub exp: i64,
    pub iat: i64,
    /// Unique token id.
    pub jti: Uuid,
}

pub const INVALID_TOKEN: &str = "Given token not valid for any token type";

/// TokenIssuer
///
/// Issues and checks credentials bound to a user identity. Handlers and the
/// principal extractor only see this trait, so the signing scheme can change
/// without touching them.
pub trait TokenIssuer: Send + Sync {
    /// Issues a fresh refresh/access pair for `user`.
    fn issue(&self, user: &User) -> AppResult<TokenPair>;

    /// Decodes an access token. Expired, forged or refresh tokens are rejected.
    fn verify_access(&self, token: &str) -> AppResult<Claims>;

    /// Exchanges a valid refresh token for a new access token.
    fn refresh(&self, refresh_token: &str) -> AppResult<String>;
}

pub type TokenState = Arc<dyn TokenIssuer>;

/// JwtTokenIssuer
///
/// HS256 JSON Web Tokens signed with the configured secret.
pub struct JwtTokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl JwtTokenIssuer {
    pub fn new(secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            &config.jwt_secret,
            Duration::minutes(config.access_token_ttl_minutes),
            Duration::days(config.refresh_token_ttl_days),
        )
    }

    fn sign(&self, user_id: Uuid, username: &str, kind: TokenKind) -> AppResult<String> {
        let now = Utc::now();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let claims = Claims {
            sub: user_id,
            username: username.to_string(),
            token_type: kind,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("token signing failed: {e}")))
    }

    fn decode_kind(&self, token: &str, expected: TokenKind) -> AppResult<Claims> {
        let claims = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|e| {
                tracing::debug!(error = %e, "token rejected");
                AppError::Authentication(INVALID_TOKEN.to_string())
            })?
            .claims;
        if claims.token_type != expected {
            return Err(AppError::Authentication(INVALID_TOKEN.to_string()));
        }
        Ok(claims)
    }
}

impl TokenIssuer for JwtTokenIssuer {
    fn issue(&self, user: &User) -> AppResult<TokenPair> {
        Ok(TokenPair {
            refresh: self.sign(user.id, &user.username, TokenKind::Refresh)?,
            access: self.sign(user.id, &user.username, TokenKind::Access)?,
        })
    }

    fn verify_access(&self, token: &str) -> AppResult<Claims> {
        self.decode_kind(token, TokenKind::Access)
    }

    fn refresh(&self, refresh_token: &str) -> AppResult<String> {
        let claims = self.decode_kind(refresh_token, TokenKind::Refresh)?;
        self.sign(claims.sub, &claims.username, TokenKind::Access)
    }
}
