use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for task completions
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TaskCompletionRow {
    pub id: String,
    pub house_id: String,
    pub task_id: String,
    pub user_id: String,
    pub week_start_date: NaiveDate,
    pub completion_date: NaiveDate,
    pub points_earned: i64,
    pub status: String,
    pub validated_by: Option<String>,
    pub validated_at: Option<DateTime<Utc>>,
    pub completed_at: DateTime<Utc>,
}

impl TaskCompletionRow {
    pub fn to_shared(&self) -> shared::TaskCompletion {
        shared::TaskCompletion {
            id: Uuid::parse_str(&self.id).unwrap(),
            house_id: Uuid::parse_str(&self.house_id).unwrap(),
            task_id: Uuid::parse_str(&self.task_id).unwrap(),
            user_id: Uuid::parse_str(&self.user_id).unwrap(),
            week_start_date: self.week_start_date,
            completion_date: self.completion_date,
            points_earned: self.points_earned,
            status: self.status.parse().unwrap_or(shared::CompletionStatus::Pending),
            validated_by: self.validated_by.as_ref().and_then(|id| Uuid::parse_str(id).ok()),
            validated_at: self.validated_at,
            completed_at: self.completed_at,
        }
    }
}

/// A completion joined with its task's scoring fields. The task columns are
/// nullable because the task may have been deleted after the completion.
#[derive(Debug, Clone, FromRow)]
pub struct CompletionWithTaskRow {
    pub task_id: String,
    pub points_earned: i64,
    pub task_frequency: Option<String>,
    pub task_points: Option<i64>,
    pub task_weekly_minimum: Option<i64>,
}
