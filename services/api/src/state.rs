//! Application state shared across handlers

use std::sync::Arc;

use crate::{
    broadcaster::Broadcaster,
    cache::BetCache,
    jwt::JwtService,
    lifecycle::BetLifecycle,
    repositories::{BetRepository, UserRepository},
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub jwt_service: JwtService,
    pub user_repository: Arc<dyn UserRepository>,
    pub bets: BetLifecycle,
    pub broadcaster: Arc<Broadcaster>,
}

impl AppState {
    /// Wire the services; the bet cache is built over `bet_repository`
    pub fn new(
        jwt_service: JwtService,
        user_repository: Arc<dyn UserRepository>,
        bet_repository: Arc<dyn BetRepository>,
        broadcaster: Arc<Broadcaster>,
    ) -> Self {
        let cache = Arc::new(BetCache::new(bet_repository.clone()));
        let bets = BetLifecycle::new(bet_repository, cache, broadcaster.clone());

        Self {
            jwt_service,
            user_repository,
            bets,
            broadcaster,
        }
    }
}
