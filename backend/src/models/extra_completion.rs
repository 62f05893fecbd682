use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for ad-hoc extra completions (not tied to any task)
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ExtraCompletionRow {
    pub id: String,
    pub house_id: String,
    pub user_id: String,
    pub week_start_date: NaiveDate,
    pub name: String,
    pub points_earned: i64,
    pub status: String,
    pub validated_by: Option<String>,
    pub validated_at: Option<DateTime<Utc>>,
    pub completed_at: DateTime<Utc>,
}

impl ExtraCompletionRow {
    pub fn to_shared(&self) -> shared::ExtraCompletion {
        shared::ExtraCompletion {
            id: Uuid::parse_str(&self.id).unwrap(),
            house_id: Uuid::parse_str(&self.house_id).unwrap(),
            user_id: Uuid::parse_str(&self.user_id).unwrap(),
            week_start_date: self.week_start_date,
            name: self.name.clone(),
            points_earned: self.points_earned,
            status: self.status.parse().unwrap_or(shared::CompletionStatus::Pending),
            validated_by: self.validated_by.as_ref().and_then(|id| Uuid::parse_str(id).ok()),
            validated_at: self.validated_at,
            completed_at: self.completed_at,
        }
    }
}
