//! Registration, login and token refresh

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
};
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    jwt::{TokenPair, TokenType},
    middleware::AuthContext,
    models::{LoginRequest, NewUser, RefreshTokenRequest, RegisterRequest, User},
    password,
    response::ApiResponse,
    state::AppState,
    validation,
};

/// Unwrap a JSON body or answer with a parser error
pub(crate) fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(inner)| inner)
        .map_err(|e| ApiError::BadRequest(format!("[Parser] {}", e.body_text())))
}

/// Resolve the authenticated user id from the verified subject
pub(crate) fn subject_id(ctx: &AuthContext) -> ApiResult<Uuid> {
    Uuid::parse_str(&ctx.subject).map_err(|_| ApiError::Unauthorized("invalid token".to_string()))
}

fn issue_tokens(state: &AppState, subject: &str) -> ApiResult<TokenPair> {
    Ok(state.jwt_service.issue(subject)?)
}

/// User registration endpoint
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<ApiResponse<TokenPair>> {
    let payload = parse_body(payload)?;
    validation::validate_registration(&payload)
        .map_err(|e| ApiError::BadRequest(format!("[Validator] {e}")))?;

    info!("Registering user: {}", payload.username);

    let password = payload.password;
    let password_hash = tokio::task::spawn_blocking(move || password::hash_password(&password))
        .await
        .map_err(|e| ApiError::InternalServerError(format!("hash task failed: {e}")))?
        .map_err(|e| ApiError::InternalServerError(e.to_string()))?;

    let new_user = NewUser {
        username: payload.username,
        email: payload.email,
        name: payload.name,
        password_hash,
    };

    let user = state
        .user_repository
        .create(&new_user)
        .await
        .map_err(|e| {
            if e.is_unique_violation() {
                ApiError::Conflict("user already exists".to_string())
            } else {
                ApiError::from(e)
            }
        })?;

    let tokens = issue_tokens(&state, &user.id.to_string())?;
    Ok(ApiResponse::ok("Register success", tokens))
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<ApiResponse<TokenPair>> {
    let payload = parse_body(payload)?;
    info!("Login attempt for user: {}", payload.username);

    let invalid = || ApiError::Unauthorized("invalid credentials".to_string());

    let user = state
        .user_repository
        .find_by_username(&payload.username)
        .await?
        .ok_or_else(invalid)?;

    let password = payload.password;
    let stored_hash = user.password_hash.clone();
    let matches =
        tokio::task::spawn_blocking(move || password::verify_password(&stored_hash, &password))
            .await
            .map_err(|e| ApiError::InternalServerError(format!("verify task failed: {e}")))?
            .map_err(|e| {
                error!("Stored password hash for {} is unreadable: {}", user.id, e);
                ApiError::InternalServerError(e.to_string())
            })?;

    if !matches {
        return Err(invalid());
    }

    let tokens = issue_tokens(&state, &user.id.to_string())?;
    Ok(ApiResponse::ok("Login success", tokens))
}

/// Refresh token endpoint
pub async fn refresh_token(
    State(state): State<AppState>,
    payload: Result<Json<RefreshTokenRequest>, JsonRejection>,
) -> ApiResult<ApiResponse<TokenPair>> {
    let payload = parse_body(payload)?;

    let claims = state.jwt_service.verify(&payload.refresh_token)?;
    if claims.token_type != TokenType::Refresh {
        return Err(ApiError::Unauthorized("not a refresh token".to_string()));
    }

    let tokens = issue_tokens(&state, &claims.sub)?;
    Ok(ApiResponse::ok("Refresh success", tokens))
}

/// Profile of the authenticated user
pub async fn me(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<ApiResponse<User>> {
    let user_id = subject_id(&ctx)?;

    let user = state
        .user_repository
        .find_by_id(user_id)
        .await?
        .ok_or(ApiError::NotFound("User"))?;

    Ok(ApiResponse::ok("User found", user))
}
