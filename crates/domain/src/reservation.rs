//! Reservation record and its status lifecycle.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use common::{ItemId, ReservationToken};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Status of a reservation.
///
/// State transitions:
/// ```text
/// Reserved ──► Cancelled
/// ```
/// The transition is one-way; a cancelled token is never reserved again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    /// Units are held against the stock record.
    Reserved,

    /// Units were released back to the stock record (terminal state).
    Cancelled,
}

impl ReservationStatus {
    /// Returns true if the reservation still holds units.
    pub fn is_active(&self) -> bool {
        matches!(self, ReservationStatus::Reserved)
    }

    /// Returns the stored representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Reserved => "RESERVED",
            ReservationStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RESERVED" => Ok(ReservationStatus::Reserved),
            "CANCELLED" => Ok(ReservationStatus::Cancelled),
            other => Err(DomainError::UnknownStatus(other.to_string())),
        }
    }
}

/// A claim of `quantity` units against one stock record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationRecord {
    token: ReservationToken,
    item_id: ItemId,
    quantity: u32,
    status: ReservationStatus,
    /// Caller identity, kept for audit only.
    reserved_by: String,
    created_at: DateTime<Utc>,
    cancelled_at: Option<DateTime<Utc>>,
}

impl ReservationRecord {
    /// Creates an active reservation with a freshly generated token.
    pub fn new(item_id: ItemId, quantity: u32, reserved_by: impl Into<String>) -> Self {
        Self {
            token: ReservationToken::generate(),
            item_id,
            quantity,
            status: ReservationStatus::Reserved,
            reserved_by: reserved_by.into(),
            created_at: Utc::now(),
            cancelled_at: None,
        }
    }

    /// Rebuilds a record from stored fields.
    pub fn restore(
        token: ReservationToken,
        item_id: ItemId,
        quantity: u32,
        status: ReservationStatus,
        reserved_by: impl Into<String>,
        created_at: DateTime<Utc>,
        cancelled_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            token,
            item_id,
            quantity,
            status,
            reserved_by: reserved_by.into(),
            created_at,
            cancelled_at,
        }
    }

    pub fn token(&self) -> &ReservationToken {
        &self.token
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn status(&self) -> ReservationStatus {
        self.status
    }

    pub fn reserved_by(&self) -> &str {
        &self.reserved_by
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn cancelled_at(&self) -> Option<DateTime<Utc>> {
        self.cancelled_at
    }

    /// Returns true if the reservation still holds units.
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Moves the reservation to `Cancelled`.
    ///
    /// Returns false without touching the record if it was already cancelled.
    pub fn cancel(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }
        self.status = ReservationStatus::Cancelled;
        self.cancelled_at = Some(Utc::now());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_reservation_is_active() {
        let reservation = ReservationRecord::new(ItemId::new(1), 5, "user1");
        assert!(reservation.is_active());
        assert_eq!(reservation.status(), ReservationStatus::Reserved);
        assert_eq!(reservation.quantity(), 5);
        assert_eq!(reservation.reserved_by(), "user1");
        assert!(reservation.cancelled_at().is_none());
        assert!(!reservation.token().is_blank());
    }

    #[test]
    fn new_reservations_get_distinct_tokens() {
        let r1 = ReservationRecord::new(ItemId::new(1), 1, "user1");
        let r2 = ReservationRecord::new(ItemId::new(1), 1, "user1");
        assert_ne!(r1.token(), r2.token());
    }

    #[test]
    fn cancel_is_one_way() {
        let mut reservation = ReservationRecord::new(ItemId::new(1), 5, "user1");

        assert!(reservation.cancel());
        assert_eq!(reservation.status(), ReservationStatus::Cancelled);
        let cancelled_at = reservation.cancelled_at();
        assert!(cancelled_at.is_some());

        assert!(!reservation.cancel());
        assert_eq!(reservation.status(), ReservationStatus::Cancelled);
        assert_eq!(reservation.cancelled_at(), cancelled_at);
    }

    #[test]
    fn status_parses_stored_form() {
        assert_eq!(
            "RESERVED".parse::<ReservationStatus>().unwrap(),
            ReservationStatus::Reserved
        );
        assert_eq!(
            "CANCELLED".parse::<ReservationStatus>().unwrap(),
            ReservationStatus::Cancelled
        );
        assert_eq!(
            "EXPIRED".parse::<ReservationStatus>(),
            Err(DomainError::UnknownStatus("EXPIRED".to_string()))
        );
    }

    #[test]
    fn status_serializes_in_screaming_case() {
        let json = serde_json::to_string(&ReservationStatus::Cancelled).unwrap();
        assert_eq!(json, "\"CANCELLED\"");
        assert_eq!(ReservationStatus::Reserved.to_string(), "RESERVED");
    }
}
