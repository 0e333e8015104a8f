//! 预订域核心
//!
//! The scheduling engine behind the HTTP API:
//!
//! - [`overlap`] - pure half-open interval conflict checks
//! - [`derive`] - table status derivation from confirmed reservations
//! - [`service`] - reservation lifecycle (create/confirm/cancel/complete/update)
//! - [`reconciler`] - periodic sweep correcting time-driven drift
//!
//! All core entry points take `now` as an explicit parameter so behavior is
//! deterministic under test; only the reconciler loop reads the wall clock.

pub mod derive;
pub mod error;
mod locks;
pub mod overlap;
pub mod reconciler;
pub mod service;

#[cfg(test)]
mod tests;

pub use derive::{DerivedStatus, PRE_ARRIVAL_BUFFER_MIN};
pub use error::{SchedulingError, SchedulingResult};
pub use reconciler::Reconciler;
pub use service::{
    NewReservation, ReconcileReport, ReservationPatch, ReservationService, TableStatusChange,
    TransitionOutcome,
};
