use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for per-week house configuration.
/// Unique on (house_id, week_start_date).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct WeeklyConfigRow {
    pub id: String,
    pub house_id: String,
    pub week_start_date: NaiveDate,
    pub points_target_per_person: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WeeklyConfigRow {
    pub fn to_shared(&self) -> shared::WeeklyConfig {
        shared::WeeklyConfig {
            id: Uuid::parse_str(&self.id).unwrap(),
            house_id: Uuid::parse_str(&self.house_id).unwrap(),
            week_start_date: self.week_start_date,
            points_target_per_person: self.points_target_per_person,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
