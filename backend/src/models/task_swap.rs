use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for task swaps
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TaskSwapRow {
    pub id: String,
    pub house_id: String,
    pub task_id: String,
    pub from_user_id: String,
    pub to_user_id: String,
    pub week_start_date: NaiveDate,
    pub swap_type: String,
    pub swap_date: Option<NaiveDate>,
    pub status: String,
    pub requested_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
}

impl TaskSwapRow {
    pub fn to_shared(&self) -> shared::TaskSwap {
        shared::TaskSwap {
            id: Uuid::parse_str(&self.id).unwrap(),
            house_id: Uuid::parse_str(&self.house_id).unwrap(),
            task_id: Uuid::parse_str(&self.task_id).unwrap(),
            from_user_id: Uuid::parse_str(&self.from_user_id).unwrap(),
            to_user_id: Uuid::parse_str(&self.to_user_id).unwrap(),
            week_start_date: self.week_start_date,
            swap_type: self.swap_type.parse().unwrap_or(shared::SwapType::Temporary),
            swap_date: self.swap_date,
            status: self.status.parse().unwrap_or(shared::SwapStatus::Pending),
            requested_at: self.requested_at,
            responded_at: self.responded_at,
            expires_at: self.expires_at,
        }
    }
}
