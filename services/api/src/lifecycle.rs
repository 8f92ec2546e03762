//! Bet lifecycle: the status state machine and every mutation path
//!
//! ```text
//! Open ──► Pending ──► Closed
//!   │         │
//!   └────┬────┘
//!        ▼
//!    Cancelled
//! ```
//!
//! Each mutation commits to the repository first, then refreshes the affected
//! cache buckets, then emits exactly one broadcast frame. Nothing is refreshed
//! or broadcast when the commit fails.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    broadcaster::Broadcaster,
    cache::BetCache,
    error::{ApiError, ApiResult},
    models::{Bet, BetStatus, NewBet, NewWager, UserBet},
    repositories::BetRepository,
};

/// Rejected status change
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    #[error("bet is already {0:?}")]
    Terminal(BetStatus),
    #[error("cannot move bet from {from:?} to {to:?}")]
    Illegal { from: BetStatus, to: BetStatus },
}

impl BetStatus {
    /// Whether `self -> next` is an edge of the state machine
    pub fn can_transition_to(self, next: BetStatus) -> bool {
        matches!(
            (self, next),
            (BetStatus::Open, BetStatus::Pending)
                | (BetStatus::Pending, BetStatus::Closed)
                | (BetStatus::Open, BetStatus::Cancelled)
                | (BetStatus::Pending, BetStatus::Cancelled)
        )
    }

    pub fn transition(self, next: BetStatus) -> Result<BetStatus, TransitionError> {
        if self.is_terminal() {
            return Err(TransitionError::Terminal(self));
        }
        if !self.can_transition_to(next) {
            return Err(TransitionError::Illegal {
                from: self,
                to: next,
            });
        }
        Ok(next)
    }
}

/// Orchestrates repository writes, cache refreshes and broadcasts
#[derive(Clone)]
pub struct BetLifecycle {
    repository: Arc<dyn BetRepository>,
    cache: Arc<BetCache>,
    broadcaster: Arc<Broadcaster>,
}

impl BetLifecycle {
    pub fn new(
        repository: Arc<dyn BetRepository>,
        cache: Arc<BetCache>,
        broadcaster: Arc<Broadcaster>,
    ) -> Self {
        Self {
            repository,
            cache,
            broadcaster,
        }
    }

    pub fn cache(&self) -> &BetCache {
        &self.cache
    }

    /// Create a bet in status `Open`, optionally seeded with its creator's wager
    pub async fn create_bet(&self, bet: NewBet, seed: Option<NewWager>) -> ApiResult<Bet> {
        if bet.bet_options.len() < 2 {
            return Err(ApiError::BadRequest(
                "a bet needs at least two options".to_string(),
            ));
        }
        if let Some(seed) = &seed {
            if !bet.bet_options.contains(&seed.option) {
                return Err(ApiError::BadRequest(
                    "initial option is not one of the bet options".to_string(),
                ));
            }
            if !seed.amount.is_finite() || seed.amount <= 0.0 {
                return Err(ApiError::BadRequest("amount must be positive".to_string()));
            }
        }

        let created = self.repository.create(&bet, seed.as_ref()).await?;
        info!("Bet {} created by {}", created.id, created.author);

        self.publish(&[BetStatus::Open]).await;
        Ok(created)
    }

    /// Bets in `status`, served from the cache
    pub async fn list_by_status(&self, status: BetStatus) -> ApiResult<Vec<Bet>> {
        let snapshot = self.cache.list(status).await?;
        Ok(Vec::clone(&snapshot))
    }

    /// One bet straight from the repository
    pub async fn get_bet(&self, id: Uuid) -> ApiResult<Bet> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(ApiError::NotFound("Bet"))
    }

    /// Stake `wager` on an open bet
    pub async fn place_wager(&self, bet_id: Uuid, wager: NewWager) -> ApiResult<UserBet> {
        let bet = self.get_bet(bet_id).await?;

        if bet.status != BetStatus::Open {
            return Err(ApiError::Conflict("bet is not open".to_string()));
        }
        if bet.ends_at <= Utc::now() {
            return Err(ApiError::Conflict("bet has ended".to_string()));
        }
        if !bet.has_option(&wager.option) {
            return Err(ApiError::BadRequest(
                "option is not one of the bet options".to_string(),
            ));
        }
        if !wager.amount.is_finite() || wager.amount <= 0.0 {
            return Err(ApiError::BadRequest("amount must be positive".to_string()));
        }

        let placed = match self.repository.place_wager(bet_id, &wager).await {
            Ok(Some(placed)) => placed,
            Ok(None) => return Err(ApiError::Conflict("bet is not open".to_string())),
            Err(e) if e.is_unique_violation() => {
                return Err(ApiError::Conflict(
                    "user already holds a wager on this bet".to_string(),
                ));
            }
            Err(e) => return Err(e.into()),
        };
        info!("Wager {} placed on bet {}", placed.id, bet_id);

        self.publish(&[BetStatus::Open]).await;
        Ok(placed)
    }

    /// Administrative status change, allowed only for the bet's creator
    pub async fn transition(&self, bet_id: Uuid, actor: Uuid, next: BetStatus) -> ApiResult<Bet> {
        let bet = self.get_bet(bet_id).await?;

        if bet.author != actor {
            return Err(ApiError::Unauthorized(
                "only the bet creator may change its status".to_string(),
            ));
        }

        self.apply_transition(bet, next).await
    }

    /// Move every open bet whose end timestamp has passed to `Pending`
    ///
    /// A failed update does not stop the sweep. Whatever was moved is
    /// published before the first failure is returned.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> ApiResult<usize> {
        let expired = self.repository.list_expired_open(now).await?;
        let mut moved = 0;
        let mut first_failure = None;

        for id in expired {
            match self
                .repository
                .update_status(id, BetStatus::Open, BetStatus::Pending)
                .await
            {
                Ok(true) => moved += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!("Failed to move expired bet {} to pending: {}", id, e);
                    if first_failure.is_none() {
                        first_failure = Some(e);
                    }
                }
            }
        }

        if moved > 0 {
            info!("Moved {} expired bets to pending", moved);
            self.publish(&[BetStatus::Open, BetStatus::Pending]).await;
        }

        match first_failure {
            Some(e) => Err(e.into()),
            None => Ok(moved),
        }
    }

    async fn apply_transition(&self, mut bet: Bet, next: BetStatus) -> ApiResult<Bet> {
        let from = bet.status;
        let to = from.transition(next)?;

        if !self.repository.update_status(bet.id, from, to).await? {
            return Err(ApiError::Conflict(
                "bet status changed concurrently".to_string(),
            ));
        }
        info!("Bet {} moved from {:?} to {:?}", bet.id, from, to);

        self.publish(&[from, to]).await;
        bet.status = to;
        Ok(bet)
    }

    /// Post-commit: refresh `statuses`, then emit one frame
    async fn publish(&self, statuses: &[BetStatus]) {
        for status in statuses {
            if let Err(e) = self.cache.refresh(*status).await {
                warn!("Bet cache refresh for {:?} failed: {}", status, e);
            }
        }
        self.broadcaster.notify_bet_update();
    }
}
