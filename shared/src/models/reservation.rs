//! Reservation Model (预订管理)

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Reservation lifecycle status.
///
/// `PENDING → {CONFIRMED, CANCELLED}`, `CONFIRMED → {CANCELLED, COMPLETED}`;
/// `CANCELLED` and `COMPLETED` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "UPPERCASE"))]
pub enum ReservationStatus {
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "CONFIRMED")]
    Confirmed,
    #[serde(rename = "CANCELLED")]
    Cancelled,
    #[serde(rename = "COMPLETED")]
    Completed,
}

impl ReservationStatus {
    /// Terminal states accept no further lifecycle transition.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled | Self::Completed)
    }

    /// Active reservations hold their time slot (count for overlap checks).
    pub fn is_active(self) -> bool {
        !self.is_terminal()
    }

    /// Lifecycle legality check.
    pub fn can_transition_to(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Pending, Self::Confirmed)
                | (Self::Pending, Self::Cancelled)
                | (Self::Confirmed, Self::Cancelled)
                | (Self::Confirmed, Self::Completed)
        )
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReservationStatus::Pending => write!(f, "PENDING"),
            ReservationStatus::Confirmed => write!(f, "CONFIRMED"),
            ReservationStatus::Cancelled => write!(f, "CANCELLED"),
            ReservationStatus::Completed => write!(f, "COMPLETED"),
        }
    }
}

/// Reservation entity
///
/// The booked interval is `[start_minute, start_minute + duration_minutes)`
/// on `date`, in minutes since midnight of the restaurant's business timezone.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Reservation {
    pub id: i64,
    pub table_id: i64,
    /// Owning user (subject of the identity service's token)
    pub user_id: String,
    /// Calendar day of the booking
    pub date: NaiveDate,
    /// Minutes since midnight (0..1440)
    pub start_minute: i64,
    pub duration_minutes: i64,
    pub guest_count: i64,
    pub status: ReservationStatus,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Reservation {
    /// Exclusive end of the booked interval, minutes since midnight.
    pub fn end_minute(&self) -> i64 {
        self.start_minute + self.duration_minutes
    }
}

/// Create reservation payload.
///
/// `date` is `YYYY-MM-DD`, `start_time` is `HH:MM`; parsing happens at the
/// API handler layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationCreate {
    pub table_id: i64,
    pub date: String,
    pub start_time: String,
    pub duration_minutes: i64,
    pub guest_count: i64,
    pub notes: Option<String>,
}

/// Update reservation payload (partial)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReservationUpdate {
    pub table_id: Option<i64>,
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub duration_minutes: Option<i64>,
    pub guest_count: Option<i64>,
    pub notes: Option<String>,
}

/// Explicit status change payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationStatusChange {
    pub status: ReservationStatus,
}

/// Result of an availability check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityResult {
    pub available: bool,
    /// The existing reservation the candidate slot collides with, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflicting: Option<Reservation>,
}

/// Listing scope for `GET /api/reservations`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListScope {
    All,
    Mine,
    Ongoing,
}

impl Default for ListScope {
    fn default() -> Self {
        Self::Mine
    }
}

/// Read-side composed view: reservation plus table info for display.
///
/// Built by the API layer; the scheduling core never joins for presentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationView {
    pub id: i64,
    pub table_id: i64,
    pub table_number: Option<i64>,
    pub user_id: String,
    pub date: NaiveDate,
    /// "HH:MM"
    pub start_time: String,
    /// "HH:MM", exclusive
    pub end_time: String,
    pub duration_minutes: i64,
    pub guest_count: i64,
    pub status: ReservationStatus,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_legality() {
        use ReservationStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Completed));

        assert!(!Pending.can_transition_to(Completed));
        assert!(!Confirmed.can_transition_to(Pending));
        assert!(!Cancelled.can_transition_to(Confirmed));
        assert!(!Completed.can_transition_to(Cancelled));
    }

    #[test]
    fn terminal_states() {
        assert!(ReservationStatus::Cancelled.is_terminal());
        assert!(ReservationStatus::Completed.is_terminal());
        assert!(ReservationStatus::Pending.is_active());
        assert!(ReservationStatus::Confirmed.is_active());
    }
}
