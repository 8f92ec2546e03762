//! Bet repository backed by PostgreSQL

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::{DatabaseError, DatabaseResult};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::{debug, info};
use uuid::Uuid;

use super::BetRepository;
use crate::models::{Bet, BetStatus, NewBet, NewWager, UserBet};

const BET_COLUMNS: &str =
    "id, name, description, bet_options, status, ends_at, author, created_at";

const WAGER_COLUMNS: &str = "id, bet_id, user_id, chosen_option, amount, created_at";

/// Bet repository
#[derive(Clone)]
pub struct PgBetRepository {
    pool: PgPool,
}

impl PgBetRepository {
    /// Create a new bet repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn wagers_for(&self, bet_ids: &[Uuid]) -> DatabaseResult<HashMap<Uuid, Vec<UserBet>>> {
        if bet_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query(&format!(
            "SELECT {WAGER_COLUMNS} FROM user_bets WHERE bet_id = ANY($1) ORDER BY created_at"
        ))
        .bind(bet_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_query)?;

        let mut grouped: HashMap<Uuid, Vec<UserBet>> = HashMap::new();
        for row in rows {
            let wager = wager_from_row(&row);
            grouped.entry(wager.bet_id).or_default().push(wager);
        }
        Ok(grouped)
    }
}

fn status_from_row(row: &PgRow) -> DatabaseResult<BetStatus> {
    let raw: i16 = row.get("status");
    BetStatus::from_i16(raw).ok_or_else(|| {
        DatabaseError::Query(sqlx::Error::Decode(
            format!("unknown bet status {raw}").into(),
        ))
    })
}

fn bet_from_row(row: &PgRow, user_bets: Vec<UserBet>) -> DatabaseResult<Bet> {
    Ok(Bet {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        bet_options: row.get("bet_options"),
        status: status_from_row(row)?,
        ends_at: row.get("ends_at"),
        author: row.get("author"),
        user_bets,
        created_at: row.get("created_at"),
    })
}

fn wager_from_row(row: &PgRow) -> UserBet {
    UserBet {
        id: row.get("id"),
        bet_id: row.get("bet_id"),
        user_id: row.get("user_id"),
        option: row.get("chosen_option"),
        amount: row.get("amount"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl BetRepository for PgBetRepository {
    async fn create(&self, bet: &NewBet, seed: Option<&NewWager>) -> DatabaseResult<Bet> {
        info!("Creating bet '{}' for author {}", bet.name, bet.author);

        let mut tx = self.pool.begin().await.map_err(DatabaseError::from_query)?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO bets (name, description, bet_options, status, ends_at, author)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {BET_COLUMNS}
            "#
        ))
        .bind(&bet.name)
        .bind(&bet.description)
        .bind(&bet.bet_options)
        .bind(BetStatus::Open.as_i16())
        .bind(bet.ends_at)
        .bind(bet.author)
        .fetch_one(&mut *tx)
        .await
        .map_err(DatabaseError::from_query)?;

        let bet_id: Uuid = row.get("id");
        let mut user_bets = Vec::new();

        if let Some(seed) = seed {
            let wager_row = sqlx::query(&format!(
                r#"
                INSERT INTO user_bets (bet_id, user_id, chosen_option, amount)
                VALUES ($1, $2, $3, $4)
                RETURNING {WAGER_COLUMNS}
                "#
            ))
            .bind(bet_id)
            .bind(seed.user_id)
            .bind(&seed.option)
            .bind(seed.amount)
            .fetch_one(&mut *tx)
            .await
            .map_err(DatabaseError::from_query)?;

            user_bets.push(wager_from_row(&wager_row));
        }

        let created = bet_from_row(&row, user_bets)?;
        tx.commit().await.map_err(DatabaseError::from_query)?;

        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<Bet>> {
        let row = sqlx::query(&format!("SELECT {BET_COLUMNS} FROM bets WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::from_query)?;

        match row {
            Some(row) => {
                let mut wagers = self.wagers_for(&[id]).await?;
                let bet = bet_from_row(&row, wagers.remove(&id).unwrap_or_default())?;
                Ok(Some(bet))
            }
            None => Ok(None),
        }
    }

    async fn list_by_status(&self, status: BetStatus) -> DatabaseResult<Vec<Bet>> {
        let rows = sqlx::query(&format!(
            "SELECT {BET_COLUMNS} FROM bets WHERE status = $1 ORDER BY created_at, id"
        ))
        .bind(status.as_i16())
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_query)?;

        let ids: Vec<Uuid> = rows.iter().map(|row| row.get("id")).collect();
        let mut wagers = self.wagers_for(&ids).await?;

        debug!("Loaded {} bets with status {:?}", rows.len(), status);

        rows.iter()
            .map(|row| {
                let id: Uuid = row.get("id");
                bet_from_row(row, wagers.remove(&id).unwrap_or_default())
            })
            .collect()
    }

    async fn place_wager(
        &self,
        bet_id: Uuid,
        wager: &NewWager,
    ) -> DatabaseResult<Option<UserBet>> {
        info!("Placing wager on bet {} for user {}", bet_id, wager.user_id);

        // Gated on the bet being open and not yet ended in the same statement.
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO user_bets (bet_id, user_id, chosen_option, amount)
            SELECT id, $2, $3, $4 FROM bets
            WHERE id = $1 AND status = $5 AND ends_at > now()
            RETURNING {WAGER_COLUMNS}
            "#
        ))
        .bind(bet_id)
        .bind(wager.user_id)
        .bind(&wager.option)
        .bind(wager.amount)
        .bind(BetStatus::Open.as_i16())
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_query)?;

        Ok(row.as_ref().map(wager_from_row))
    }

    async fn update_status(
        &self,
        id: Uuid,
        from: BetStatus,
        to: BetStatus,
    ) -> DatabaseResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE bets
            SET status = $3, updated_at = now()
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(id)
        .bind(from.as_i16())
        .bind(to.as_i16())
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from_query)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_expired_open(&self, now: DateTime<Utc>) -> DatabaseResult<Vec<Uuid>> {
        let ids: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id FROM bets
            WHERE status = $1 AND ends_at <= $2
            ORDER BY ends_at
            "#,
        )
        .bind(BetStatus::Open.as_i16())
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from_query)?;

        Ok(ids)
    }
}
