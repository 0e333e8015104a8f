//! Entity models and payloads

pub mod reservation;
pub mod table;

pub use reservation::{
    AvailabilityResult, ListScope, Reservation, ReservationCreate, ReservationStatus,
    ReservationStatusChange, ReservationUpdate, ReservationView,
};
pub use table::{DiningTable, DiningTableCreate, DiningTableUpdate, TableStatus, TableStatusOverride};
