//! Dining Table Model (桌台)

use serde::{Deserialize, Serialize};

/// Physical status of a table.
///
/// This is derived state: a cache of the status deriver's output, recomputed
/// from the table's confirmed reservations. Clients never set it directly;
/// the only exception is the explicit admin override endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "UPPERCASE"))]
pub enum TableStatus {
    #[serde(rename = "AVAILABLE")]
    Available,
    #[serde(rename = "RESERVED")]
    Reserved,
    #[serde(rename = "OCCUPIED")]
    Occupied,
}

impl Default for TableStatus {
    fn default() -> Self {
        Self::Available
    }
}

impl std::fmt::Display for TableStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableStatus::Available => write!(f, "AVAILABLE"),
            TableStatus::Reserved => write!(f, "RESERVED"),
            TableStatus::Occupied => write!(f, "OCCUPIED"),
        }
    }
}

/// Dining table entity (桌台)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct DiningTable {
    pub id: i64,
    /// Table number, unique across the restaurant
    pub number: i64,
    /// Seat capacity (positive)
    pub capacity: i64,
    /// Derived status cache, see [`TableStatus`]
    pub status: TableStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create dining table payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiningTableCreate {
    pub number: i64,
    pub capacity: Option<i64>,
}

/// Update dining table payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiningTableUpdate {
    pub number: Option<i64>,
    pub capacity: Option<i64>,
}

/// Admin status override payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableStatusOverride {
    pub status: TableStatus,
}
