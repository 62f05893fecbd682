use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for task groups
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TaskGroupRow {
    pub id: String,
    pub house_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskGroupRow {
    pub fn to_shared(&self) -> shared::TaskGroup {
        shared::TaskGroup {
            id: Uuid::parse_str(&self.id).unwrap(),
            house_id: Uuid::parse_str(&self.house_id).unwrap(),
            name: self.name.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
