use crate::db::repository::RepoError;
use crate::utils::AppError;
use shared::models::{Reservation, ReservationStatus};
use thiserror::Error;

/// Scheduling domain errors
#[derive(Debug, Error)]
pub enum SchedulingError {
    #[error("Reservation not found: {0}")]
    ReservationNotFound(i64),

    #[error("Table not found: {0}")]
    TableNotFound(i64),

    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition {
        from: ReservationStatus,
        to: ReservationStatus,
    },

    /// Mutation attempt on a reservation already in a terminal state.
    #[error("Reservation is {0} and can no longer be modified")]
    Terminal(ReservationStatus),

    #[error("Guest count {guest_count} exceeds table capacity {capacity}")]
    CapacityExceeded { guest_count: i64, capacity: i64 },

    /// Candidate slot collides with an existing active reservation.
    /// Carries the conflicting reservation for the API response.
    #[error("Time slot conflicts with reservation {}", .0.id)]
    Conflict(Box<Reservation>),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] RepoError),
}

pub type SchedulingResult<T> = Result<T, SchedulingError>;

impl From<SchedulingError> for AppError {
    fn from(err: SchedulingError) -> Self {
        match err {
            SchedulingError::ReservationNotFound(id) => {
                AppError::not_found(format!("Reservation {id} not found"))
            }
            SchedulingError::TableNotFound(id) => {
                AppError::not_found(format!("Table {id} not found"))
            }
            SchedulingError::InvalidTransition { from, to } => {
                AppError::InvalidTransition(format!("Cannot transition {from} -> {to}"))
            }
            SchedulingError::Terminal(status) => AppError::InvalidTransition(format!(
                "Reservation is {status} and can no longer be modified"
            )),
            SchedulingError::CapacityExceeded {
                guest_count,
                capacity,
            } => AppError::CapacityExceeded(format!(
                "Guest count {guest_count} exceeds table capacity {capacity}"
            )),
            SchedulingError::Conflict(reservation) => AppError::ScheduleConflict {
                message: format!(
                    "Time slot conflicts with reservation {} ({} - {})",
                    reservation.id,
                    crate::utils::time::format_minute(reservation.start_minute),
                    crate::utils::time::format_minute(reservation.end_minute())
                ),
                conflicting: serde_json::to_value(&*reservation).ok(),
            },
            SchedulingError::Validation(msg) => AppError::Validation(msg),
            SchedulingError::Storage(e) => e.into(),
        }
    }
}
