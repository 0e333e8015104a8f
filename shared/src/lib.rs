//! Shared types for the booking platform
//!
//! Common types used by the booking server and its clients: entity models,
//! request/response payloads, sync notification messages and small utilities.

pub mod message;
pub mod models;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use message::SyncPayload;
