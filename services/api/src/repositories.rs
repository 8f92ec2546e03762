//! Repositories for database operations
//!
//! The repository is the only writer of durable bet state. Handlers and the
//! bet cache depend on these traits so the PostgreSQL implementations can be
//! swapped for the in-memory doubles in [`memory`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::DatabaseResult;
use uuid::Uuid;

use crate::models::{Bet, BetStatus, NewBet, NewUser, NewWager, User, UserBet};

pub mod bet;
pub mod memory;
pub mod user;

pub use bet::PgBetRepository;
pub use memory::{InMemoryBetRepository, InMemoryUserRepository};
pub use user::PgUserRepository;

/// Durable store of users
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user; duplicate username or email is a unique violation
    async fn create(&self, new_user: &NewUser) -> DatabaseResult<User>;

    async fn find_by_username(&self, username: &str) -> DatabaseResult<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>>;
}

/// Durable store of bets and their wagers
#[async_trait]
pub trait BetRepository: Send + Sync {
    /// Persist a bet with status `Open` and, optionally, its seed wager in
    /// one atomic write
    async fn create(&self, bet: &NewBet, seed: Option<&NewWager>) -> DatabaseResult<Bet>;

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<Bet>>;

    /// All bets currently in `status`, oldest first
    async fn list_by_status(&self, status: BetStatus) -> DatabaseResult<Vec<Bet>>;

    /// Add a wager to a bet that is still `Open`
    ///
    /// Returns `None` when the bet is missing, no longer open or past its end
    /// timestamp. A second wager by the same user on the same bet is a unique
    /// violation.
    async fn place_wager(&self, bet_id: Uuid, wager: &NewWager) -> DatabaseResult<Option<UserBet>>;

    /// Compare-and-set the status of a bet
    ///
    /// Returns `false` without writing when the stored status is not `from`.
    async fn update_status(&self, id: Uuid, from: BetStatus, to: BetStatus)
    -> DatabaseResult<bool>;

    /// Identifiers of open bets whose end timestamp is at or before `now`
    async fn list_expired_open(&self, now: DateTime<Utc>) -> DatabaseResult<Vec<Uuid>>;
}
