use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for weekly scores.
/// Unique on (house_id, user_id, week_start_date).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct WeeklyScoreRow {
    pub id: String,
    pub house_id: String,
    pub user_id: String,
    pub week_start_date: NaiveDate,
    pub points_target: i64,
    pub points_earned: i64,
    pub points_carried_over: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WeeklyScoreRow {
    pub fn to_shared(&self) -> shared::WeeklyScore {
        shared::WeeklyScore {
            id: Uuid::parse_str(&self.id).unwrap(),
            house_id: Uuid::parse_str(&self.house_id).unwrap(),
            user_id: Uuid::parse_str(&self.user_id).unwrap(),
            week_start_date: self.week_start_date,
            points_target: self.points_target,
            points_earned: self.points_earned,
            points_carried_over: self.points_carried_over,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
