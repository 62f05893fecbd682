use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for tasks
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TaskRow {
    pub id: String,
    pub house_id: String,
    pub name: String,
    pub points: i64,
    pub frequency: String,
    pub weekly_minimum: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskRow {
    pub fn to_shared(&self) -> shared::Task {
        shared::Task {
            id: Uuid::parse_str(&self.id).unwrap(),
            house_id: Uuid::parse_str(&self.house_id).unwrap(),
            name: self.name.clone(),
            points: self.points,
            frequency: self.frequency.parse().unwrap_or(shared::TaskFrequency::Weekly),
            weekly_minimum: self.weekly_minimum,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_row_to_shared() {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let house_id = Uuid::new_v4();

        let row = TaskRow {
            id: id.to_string(),
            house_id: house_id.to_string(),
            name: "Dishes".to_string(),
            points: 5,
            frequency: "daily".to_string(),
            weekly_minimum: None,
            created_at: now,
            updated_at: now,
        };

        let shared = row.to_shared();

        assert_eq!(shared.id, id);
        assert_eq!(shared.house_id, house_id);
        assert_eq!(shared.frequency, shared::TaskFrequency::Daily);
        assert_eq!(shared.points, 5);
    }
}
