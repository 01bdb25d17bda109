//! Database Models - rows of the section table (used by sqlx/serde).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Portfolio section row
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PortfolioSection {
    pub key: String,
    pub content: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}
