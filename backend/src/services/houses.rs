use chrono::Utc;
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{HouseRow, UserRow};
use shared::{House, UpdateHouseSettingsRequest, User};

#[derive(Debug, Error)]
pub enum HouseError {
    #[error("House not found")]
    NotFound,
    #[error("week_start_day must be between 0 and 6")]
    InvalidWeekStartDay,
    #[error("rotation_weeks must be at least 1")]
    InvalidRotationWeeks,
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

pub async fn get_house(pool: &SqlitePool, house_id: &Uuid) -> Result<Option<House>, HouseError> {
    let house: Option<HouseRow> = sqlx::query_as("SELECT * FROM houses WHERE id = ?")
        .bind(house_id.to_string())
        .fetch_optional(pool)
        .await?;

    Ok(house.map(|h| h.to_shared()))
}

pub async fn is_member(
    pool: &SqlitePool,
    house_id: &Uuid,
    user_id: &Uuid,
) -> Result<bool, HouseError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM house_members WHERE house_id = ? AND user_id = ?",
    )
    .bind(house_id.to_string())
    .bind(user_id.to_string())
    .fetch_one(pool)
    .await?;

    Ok(count > 0)
}

pub async fn is_owner(
    pool: &SqlitePool,
    house_id: &Uuid,
    user_id: &Uuid,
) -> Result<bool, HouseError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM houses WHERE id = ? AND owner_id = ?")
        .bind(house_id.to_string())
        .bind(user_id.to_string())
        .fetch_one(pool)
        .await?;

    Ok(count > 0)
}

/// Members of a house, ordered by user creation time. Rotation rank depends
/// on this ordering being stable.
pub async fn list_members(pool: &SqlitePool, house_id: &Uuid) -> Result<Vec<User>, HouseError> {
    let users: Vec<UserRow> = sqlx::query_as(
        r#"
        SELECT u.id, u.email, u.name, u.created_at
        FROM house_members hm
        JOIN users u ON u.id = hm.user_id
        WHERE hm.house_id = ?
        ORDER BY u.created_at ASC, u.id ASC
        "#,
    )
    .bind(house_id.to_string())
    .fetch_all(pool)
    .await?;

    Ok(users.into_iter().map(|u| u.to_shared()).collect())
}

/// Update rotation settings. Owner-only; the handler enforces that.
pub async fn update_settings(
    pool: &SqlitePool,
    house_id: &Uuid,
    request: &UpdateHouseSettingsRequest,
) -> Result<House, HouseError> {
    let mut house: HouseRow = sqlx::query_as("SELECT * FROM houses WHERE id = ?")
        .bind(house_id.to_string())
        .fetch_optional(pool)
        .await?
        .ok_or(HouseError::NotFound)?;

    if let Some(day) = request.week_start_day {
        if day > 6 {
            return Err(HouseError::InvalidWeekStartDay);
        }
        house.week_start_day = i64::from(day);
    }
    if let Some(weeks) = request.rotation_weeks {
        if weeks < 1 {
            return Err(HouseError::InvalidRotationWeeks);
        }
        house.rotation_weeks = i64::from(weeks);
    }

    let now = Utc::now();
    house.updated_at = now;

    sqlx::query("UPDATE houses SET week_start_day = ?, rotation_weeks = ?, updated_at = ? WHERE id = ?")
        .bind(house.week_start_day)
        .bind(house.rotation_weeks)
        .bind(now)
        .bind(house_id.to_string())
        .execute(pool)
        .await?;

    Ok(house.to_shared())
}
