//! API models for request and response payloads

use chrono::{DateTime, Utc};
use serde::Deserialize;

pub mod bet;
pub mod user;

pub use bet::{Bet, BetStatus, NewBet, NewWager, UserBet};
pub use user::{NewUser, User};

/// Request for user registration
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: String,
    pub name: String,
}

/// Request for user login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Request for token refresh
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Request for bet creation
///
/// `input_option` and `input_bet` seed the creator's own wager and must be
/// supplied together or not at all.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBetRequest {
    pub name: String,
    pub description: String,
    pub bet_options: Vec<String>,
    pub input_option: Option<String>,
    pub input_bet: Option<f64>,
    pub ends_at: DateTime<Utc>,
}

/// Request for placing a wager on an open bet
#[derive(Debug, Deserialize)]
pub struct PlaceWagerRequest {
    pub option: String,
    pub amount: f64,
}

/// Request for an administrative status change
#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub status: BetStatus,
}

/// Query parameters for bet listing
#[derive(Debug, Default, Deserialize)]
pub struct BetListQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}
