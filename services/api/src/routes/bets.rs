//! Bet endpoints

use axum::{
    Extension, Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
};
use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use super::auth::{parse_body, subject_id};
use crate::{
    error::{ApiError, ApiResult},
    middleware::AuthContext,
    models::{
        Bet, BetListQuery, BetStatus, CreateBetRequest, NewBet, NewWager, PlaceWagerRequest,
        TransitionRequest, UserBet,
    },
    response::ApiResponse,
    state::AppState,
    validation,
};

/// Malformed identifiers look exactly like missing ones
fn bet_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound("Bet"))
}

fn validator_error(message: String) -> ApiError {
    ApiError::BadRequest(format!("[Validator] {message}"))
}

/// Bets filtered by the `type` query parameter
///
/// An unreadable query string lists open bets, like an unknown `type`.
pub async fn list_bets(
    State(state): State<AppState>,
    query: Result<Query<BetListQuery>, QueryRejection>,
) -> ApiResult<ApiResponse<Vec<Bet>>> {
    let query = query.map(|Query(inner)| inner).unwrap_or_else(|e| {
        debug!("Ignoring unreadable bet list query: {}", e.body_text());
        BetListQuery::default()
    });
    let status = BetStatus::from_query(query.kind.as_deref());
    let bets = state.bets.list_by_status(status).await?;

    Ok(ApiResponse::ok("Bets found", bets))
}

/// One bet by identifier
pub async fn get_bet(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<Bet>> {
    let bet = state.bets.get_bet(bet_id(&id)?).await?;

    Ok(ApiResponse::ok("Bet found", bet))
}

/// Create a bet owned by the authenticated user
pub async fn create_bet(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    payload: Result<Json<CreateBetRequest>, JsonRejection>,
) -> ApiResult<ApiResponse<Bet>> {
    let payload = parse_body(payload)?;
    validation::validate_create_bet(&payload, Utc::now()).map_err(validator_error)?;

    let author = subject_id(&ctx)?;
    state
        .user_repository
        .find_by_id(author)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("invalid token".to_string()))?;

    let seed = match (payload.input_option, payload.input_bet) {
        (Some(option), Some(amount)) => Some(NewWager {
            user_id: author,
            option,
            amount,
        }),
        _ => None,
    };

    let bet = NewBet {
        name: payload.name,
        description: payload.description,
        bet_options: payload.bet_options,
        ends_at: payload.ends_at,
        author,
    };

    let created = state.bets.create_bet(bet, seed).await?;
    Ok(ApiResponse::ok("Bet created", created))
}

/// Stake on an open bet
pub async fn place_wager(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
    payload: Result<Json<PlaceWagerRequest>, JsonRejection>,
) -> ApiResult<ApiResponse<UserBet>> {
    let bet_id = bet_id(&id)?;
    let payload = parse_body(payload)?;
    validation::validate_amount(payload.amount, f64::MIN_POSITIVE).map_err(validator_error)?;

    let wager = NewWager {
        user_id: subject_id(&ctx)?,
        option: payload.option,
        amount: payload.amount,
    };

    let placed = state.bets.place_wager(bet_id, wager).await?;
    Ok(ApiResponse::ok("Wager placed", placed))
}

/// Administrative status change by the bet's creator
pub async fn transition_bet(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
    payload: Result<Json<TransitionRequest>, JsonRejection>,
) -> ApiResult<ApiResponse<Bet>> {
    let bet_id = bet_id(&id)?;
    let payload = parse_body(payload)?;

    let bet = state
        .bets
        .transition(bet_id, subject_id(&ctx)?, payload.status)
        .await?;
    Ok(ApiResponse::ok("Bet status updated", bet))
}
