//! Bet and wager models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a bet
///
/// Persisted as a `SMALLINT` using the discriminants below, which are also
/// the values accepted by the `type` listing query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetStatus {
    Open = 0,
    Pending = 1,
    Closed = 2,
    Cancelled = 3,
}

impl BetStatus {
    pub const ALL: [BetStatus; 4] = [
        BetStatus::Open,
        BetStatus::Pending,
        BetStatus::Closed,
        BetStatus::Cancelled,
    ];

    /// Column value for this status
    pub fn as_i16(self) -> i16 {
        self as i16
    }

    pub fn from_i16(value: i16) -> Option<Self> {
        match value {
            0 => Some(BetStatus::Open),
            1 => Some(BetStatus::Pending),
            2 => Some(BetStatus::Closed),
            3 => Some(BetStatus::Cancelled),
            _ => None,
        }
    }

    /// Resolve the listing `type` parameter; absent or unrecognized means `Open`
    pub fn from_query(raw: Option<&str>) -> Self {
        raw.and_then(|value| value.trim().parse::<i16>().ok())
            .and_then(Self::from_i16)
            .unwrap_or(BetStatus::Open)
    }

    /// Position of this status in [`BetStatus::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, BetStatus::Closed | BetStatus::Cancelled)
    }
}

/// A single user's stake on one option of a bet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserBet {
    pub id: Uuid,
    pub bet_id: Uuid,
    pub user_id: Uuid,
    pub option: String,
    pub amount: f64,
    pub created_at: DateTime<Utc>,
}

/// Wagering event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bet {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub bet_options: Vec<String>,
    pub status: BetStatus,
    pub ends_at: DateTime<Utc>,
    pub author: Uuid,
    pub user_bets: Vec<UserBet>,
    pub created_at: DateTime<Utc>,
}

impl Bet {
    pub fn has_option(&self, option: &str) -> bool {
        self.bet_options.iter().any(|candidate| candidate == option)
    }
}

/// New bet creation payload; the repository assigns id and status `Open`
#[derive(Debug, Clone)]
pub struct NewBet {
    pub name: String,
    pub description: String,
    pub bet_options: Vec<String>,
    pub ends_at: DateTime<Utc>,
    pub author: Uuid,
}

/// New wager payload for an existing or freshly created bet
#[derive(Debug, Clone)]
pub struct NewWager {
    pub user_id: Uuid,
    pub option: String,
    pub amount: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_type_defaults_to_open() {
        assert_eq!(BetStatus::from_query(None), BetStatus::Open);
        assert_eq!(BetStatus::from_query(Some("7")), BetStatus::Open);
        assert_eq!(BetStatus::from_query(Some("-1")), BetStatus::Open);
        assert_eq!(BetStatus::from_query(Some("pending")), BetStatus::Open);
    }

    #[test]
    fn listing_type_maps_known_values() {
        assert_eq!(BetStatus::from_query(Some("0")), BetStatus::Open);
        assert_eq!(BetStatus::from_query(Some("1")), BetStatus::Pending);
        assert_eq!(BetStatus::from_query(Some("2")), BetStatus::Closed);
        assert_eq!(BetStatus::from_query(Some("3")), BetStatus::Cancelled);
    }

    #[test]
    fn column_values_round_trip_through_all_statuses() {
        for (position, status) in BetStatus::ALL.iter().enumerate() {
            assert_eq!(status.index(), position);
            assert_eq!(BetStatus::from_i16(status.as_i16()), Some(*status));
        }
        assert_eq!(BetStatus::from_i16(4), None);
    }
}
