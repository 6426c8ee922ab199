use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use super::{
    claims::{Capability, Claims},
    jwt::JwtKeys,
};
use crate::{
    error::{AppError, AuthFailure},
    state::AppState,
};

/// `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::Authentication(AuthFailure::MissingToken))?;

    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AppError::Authentication(AuthFailure::MissingToken))
}

fn authenticate(headers: &HeaderMap, keys: &JwtKeys) -> Result<Claims, AppError> {
    let token = bearer_token(headers)?;
    keys.verify(token).map_err(AppError::Authentication)
}

/// Any caller holding a valid token.
pub struct AuthUser(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        authenticate(&parts.headers, &keys).map(AuthUser)
    }
}

/// Gate for the admin router: valid token carrying the `ManageUsers` capability.
/// Puts the decoded claims into the request extensions.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = authenticate(request.headers(), &keys)?;

    if let Err(e) = claims.require(Capability::ManageUsers) {
        warn!(user_id = %claims.sub, role = %claims.role, "admin access denied");
        return Err(e);
    }

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Claims placed by [`require_admin`].
pub struct AdminUser(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(AdminUser)
            .ok_or(AppError::Authentication(AuthFailure::MissingToken))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn bearer_token_is_extracted() {
        assert_eq!(bearer_token(&headers("Bearer abc.def")).unwrap(), "abc.def");
        assert_eq!(bearer_token(&headers("bearer abc.def")).unwrap(), "abc.def");
    }

    #[test]
    fn missing_or_malformed_header_is_rejected() {
        for h in [HeaderMap::new(), headers("Basic abc"), headers("Bearer "), headers("abc")] {
            assert!(matches!(
                bearer_token(&h),
                Err(AppError::Authentication(AuthFailure::MissingToken))
            ));
        }
    }
}
