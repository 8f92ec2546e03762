//! Authorization guard for protected routes
//!
//! The guard resolves a verified identity from the bearer credential and
//! stores it as a typed [`AuthContext`] in the request extensions. A later
//! guard in the same chain finds the context and skips verification while it
//! is still unexpired. The context lives and dies with the request.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use crate::{
    error::{ApiError, ApiResult},
    jwt::{JwtService, TokenType, unix_now},
    state::AppState,
};

const BEARER_PREFIX: &str = "Bearer ";

/// Outcome of verifying the request's credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub authorized: bool,
    /// Verified token subject (the user identifier)
    pub subject: String,
    /// Token expiry, unix seconds
    pub expires_at: u64,
}

impl AuthContext {
    /// Authorized and not yet expired at `now`
    pub fn is_current(&self, now: u64) -> bool {
        self.authorized && self.expires_at > now
    }
}

/// Verify the bearer credential in `headers`
pub fn authorize(jwt_service: &JwtService, headers: &HeaderMap) -> ApiResult<AuthContext> {
    if headers.is_empty() {
        return Err(ApiError::BadRequest("no headers".to_string()));
    }

    let token = headers
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix(BEARER_PREFIX))
        .ok_or_else(|| ApiError::BadRequest("invalid token".to_string()))?;

    let claims = jwt_service.verify(token).map_err(|e| {
        warn!("Rejected bearer token: {}", e);
        ApiError::from(e)
    })?;

    if claims.token_type != TokenType::Access {
        return Err(ApiError::Unauthorized("invalid token".to_string()));
    }

    if claims.sub.is_empty() {
        return Err(ApiError::InternalServerError(
            "failed to get user id from token".to_string(),
        ));
    }

    Ok(AuthContext {
        authorized: true,
        subject: claims.sub,
        expires_at: claims.exp,
    })
}

/// Authentication middleware
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let now = unix_now();

    if req
        .extensions()
        .get::<AuthContext>()
        .is_some_and(|ctx| ctx.is_current(now))
    {
        debug!("Reusing authorization from earlier in the chain");
        return Ok(next.run(req).await);
    }

    let context = authorize(&state.jwt_service, req.headers())?;
    req.extensions_mut().insert(context);

    Ok(next.run(req).await)
}
