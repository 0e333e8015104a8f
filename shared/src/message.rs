//! Sync notification messages
//!
//! Resource change notifications broadcast to connected clients so that table
//! maps and reservation lists refresh without polling.

use serde::{Deserialize, Serialize};

/// A resource change notification.
///
/// `version` is a per-resource monotonically increasing counter; clients use
/// it to discard out-of-order notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncPayload {
    /// Resource type ("dining_table", "reservation")
    pub resource: String,
    /// Per-resource version, increments on every change
    pub version: u64,
    /// Change kind ("created", "updated", "cancelled", "status_changed", ...)
    pub action: String,
    /// Resource ID
    pub id: String,
    /// Resource data (None for deletions)
    pub data: Option<serde_json::Value>,
}
