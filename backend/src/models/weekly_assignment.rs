use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for weekly assignments.
/// Unique on (house_id, user_id, week_start_date); rows are never deleted,
/// only the group reference is cleared.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct WeeklyAssignmentRow {
    pub id: String,
    pub house_id: String,
    pub user_id: String,
    pub week_start_date: NaiveDate,
    pub task_group_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl WeeklyAssignmentRow {
    pub fn to_shared(&self) -> shared::WeeklyAssignment {
        shared::WeeklyAssignment {
            id: Uuid::parse_str(&self.id).unwrap(),
            house_id: Uuid::parse_str(&self.house_id).unwrap(),
            user_id: Uuid::parse_str(&self.user_id).unwrap(),
            week_start_date: self.week_start_date,
            task_group_id: self
                .task_group_id
                .as_ref()
                .and_then(|id| Uuid::parse_str(id).ok()),
            created_at: self.created_at,
        }
    }
}
