//! In-memory repositories
//!
//! They enforce the same constraints as the PostgreSQL schema (unique
//! username and email, one wager per user and bet) so handlers behave the same
//! against either store. Used by the test suites and for local runs without a
//! database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::{DatabaseError, DatabaseResult};
use parking_lot::Mutex;
use uuid::Uuid;

use super::{BetRepository, UserRepository};
use crate::models::{Bet, BetStatus, NewBet, NewUser, NewWager, User, UserBet};

/// In-memory user store
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<Vec<User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, new_user: &NewUser) -> DatabaseResult<User> {
        let mut users = self.users.lock();

        if users.iter().any(|u| u.username == new_user.username) {
            return Err(DatabaseError::UniqueViolation(
                "users_username_key".to_string(),
            ));
        }
        if users.iter().any(|u| u.email == new_user.email) {
            return Err(DatabaseError::UniqueViolation("users_email_key".to_string()));
        }

        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username.clone(),
            email: new_user.email.clone(),
            name: new_user.name.clone(),
            password_hash: new_user.password_hash.clone(),
            created_at: Utc::now(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> DatabaseResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>> {
        Ok(self.users.lock().iter().find(|u| u.id == id).cloned())
    }
}

/// In-memory bet store
#[derive(Default)]
pub struct InMemoryBetRepository {
    bets: Mutex<Vec<Bet>>,
}

impl InMemoryBetRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored bets, regardless of status
    pub fn len(&self) -> usize {
        self.bets.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn wager_for(bet_id: Uuid, wager: &NewWager) -> UserBet {
    UserBet {
        id: Uuid::new_v4(),
        bet_id,
        user_id: wager.user_id,
        option: wager.option.clone(),
        amount: wager.amount,
        created_at: Utc::now(),
    }
}

#[async_trait]
impl BetRepository for InMemoryBetRepository {
    async fn create(&self, bet: &NewBet, seed: Option<&NewWager>) -> DatabaseResult<Bet> {
        let id = Uuid::new_v4();
        let created = Bet {
            id,
            name: bet.name.clone(),
            description: bet.description.clone(),
            bet_options: bet.bet_options.clone(),
            status: BetStatus::Open,
            ends_at: bet.ends_at,
            author: bet.author,
            user_bets: seed.map(|w| wager_for(id, w)).into_iter().collect(),
            created_at: Utc::now(),
        };

        self.bets.lock().push(created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<Bet>> {
        Ok(self.bets.lock().iter().find(|b| b.id == id).cloned())
    }

    async fn list_by_status(&self, status: BetStatus) -> DatabaseResult<Vec<Bet>> {
        Ok(self
            .bets
            .lock()
            .iter()
            .filter(|b| b.status == status)
            .cloned()
            .collect())
    }

    async fn place_wager(
        &self,
        bet_id: Uuid,
        wager: &NewWager,
    ) -> DatabaseResult<Option<UserBet>> {
        let now = Utc::now();
        let mut bets = self.bets.lock();

        let Some(bet) = bets
            .iter_mut()
            .find(|b| b.id == bet_id && b.status == BetStatus::Open && b.ends_at > now)
        else {
            return Ok(None);
        };

        if bet.user_bets.iter().any(|w| w.user_id == wager.user_id) {
            return Err(DatabaseError::UniqueViolation(
                "user_bets_bet_user_key".to_string(),
            ));
        }

        let placed = wager_for(bet_id, wager);
        bet.user_bets.push(placed.clone());
        Ok(Some(placed))
    }

    async fn update_status(
        &self,
        id: Uuid,
        from: BetStatus,
        to: BetStatus,
    ) -> DatabaseResult<bool> {
        let mut bets = self.bets.lock();
        match bets.iter_mut().find(|b| b.id == id && b.status == from) {
            Some(bet) => {
                bet.status = to;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_expired_open(&self, now: DateTime<Utc>) -> DatabaseResult<Vec<Uuid>> {
        Ok(self
            .bets
            .lock()
            .iter()
            .filter(|b| b.status == BetStatus::Open && b.ends_at <= now)
            .map(|b| b.id)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_bet(author: Uuid) -> NewBet {
        NewBet {
            name: "Will it rain".to_string(),
            description: "Tomorrow in Douala".to_string(),
            bet_options: vec!["yes".to_string(), "no!".to_string()],
            ends_at: Utc::now() + Duration::hours(1),
            author,
        }
    }

    fn wager(user_id: Uuid) -> NewWager {
        NewWager {
            user_id,
            option: "yes".to_string(),
            amount: 5.0,
        }
    }

    #[tokio::test]
    async fn duplicate_username_is_a_unique_violation() {
        let repo = InMemoryUserRepository::new();
        let alice = NewUser {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            name: "Alice".to_string(),
            password_hash: "hash".to_string(),
        };
        repo.create(&alice).await.unwrap();

        let again = NewUser {
            email: "other@example.com".to_string(),
            ..alice
        };
        let err = repo.create(&again).await.unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn second_wager_by_same_user_is_rejected() {
        let repo = InMemoryBetRepository::new();
        let author = Uuid::new_v4();
        let bet = repo.create(&new_bet(author), Some(&wager(author))).await.unwrap();

        let err = repo.place_wager(bet.id, &wager(author)).await.unwrap_err();
        assert!(err.is_unique_violation());

        let other = repo.place_wager(bet.id, &wager(Uuid::new_v4())).await.unwrap();
        assert!(other.is_some());
        assert_eq!(repo.find_by_id(bet.id).await.unwrap().unwrap().user_bets.len(), 2);
    }

    #[tokio::test]
    async fn status_update_is_compare_and_set() {
        let repo = InMemoryBetRepository::new();
        let bet = repo.create(&new_bet(Uuid::new_v4()), None).await.unwrap();

        assert!(!repo
            .update_status(bet.id, BetStatus::Pending, BetStatus::Closed)
            .await
            .unwrap());
        assert!(repo
            .update_status(bet.id, BetStatus::Open, BetStatus::Pending)
            .await
            .unwrap());
        assert!(repo.place_wager(bet.id, &wager(Uuid::new_v4())).await.unwrap().is_none());
    }
}
