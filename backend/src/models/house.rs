use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for houses
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct HouseRow {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    pub week_start_day: i64,
    pub rotation_weeks: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl HouseRow {
    pub fn to_shared(&self) -> shared::House {
        shared::House {
            id: Uuid::parse_str(&self.id).unwrap(),
            name: self.name.clone(),
            owner_id: Uuid::parse_str(&self.owner_id).unwrap(),
            week_start_day: self.week_start_day as u8,
            rotation_weeks: self.rotation_weeks as u32,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
