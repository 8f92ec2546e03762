//! Gambler API service
//!
//! Users register and authenticate with signed session tokens, create bets
//! with multiple options, stake wagers and receive live update frames over a
//! websocket whenever a bet changes.

pub mod broadcaster;
pub mod cache;
pub mod config;
pub mod error;
pub mod jwt;
pub mod lifecycle;
pub mod middleware;
pub mod models;
pub mod password;
pub mod repositories;
pub mod response;
pub mod routes;
pub mod state;
pub mod sweeper;
pub mod validation;
pub mod websocket;

pub use routes::create_router;
pub use state::AppState;
