use axum::{extract::FromRequestParts, http::header};
use jsonwebtoken::{DecodingKey, Validation, decode};
use uuid::Uuid;

use crate::{config::jwt_secret, dto::auth::Claims, entity::enums::Role, error::AppError};

/// Identity supplied by the bearer token. Services trust it for every
/// ownership check.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

pub fn ensure_role(user: &AuthUser, role: Role) -> Result<(), AppError> {
    if user.role != role {
        let label = match role {
            Role::Wholesaler => "Wholesaler",
            Role::Retailer => "Retailer",
            Role::Agent => "Agent",
        };
        return Err(AppError::Forbidden(format!("{label} access only")));
    }
    Ok(())
}

pub fn ensure_wholesaler(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, Role::Wholesaler)
}

pub fn ensure_retailer(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, Role::Retailer)
}

pub fn ensure_agent(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, Role::Agent)
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;
    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid Authorization header".into()))?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .map(str::trim)
            .ok_or_else(|| AppError::Unauthorized("Invalid Authorization scheme".into()))?;

        let secret = jwt_secret()?;

        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;

        let user_id = Uuid::parse_str(&decoded.claims.sub)
            .map_err(|_| AppError::Unauthorized("Invalid user id in token".into()))?;
        let role = decoded
            .claims
            .role
            .parse::<Role>()
            .map_err(|_| AppError::Unauthorized("Invalid role in token".into()))?;

        Ok(AuthUser {
            user_id,
            email: decoded.claims.email,
            role,
        })
    }
}
