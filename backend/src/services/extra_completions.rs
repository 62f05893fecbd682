use chrono::Utc;
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::ExtraCompletionRow;
use crate::services::scores;
use shared::{AddExtraCompletionRequest, CompletionStatus, ExtraCompletion};

#[derive(Debug, Error)]
pub enum ExtraCompletionError {
    #[error("Extra completion not found")]
    NotFound,
    #[error("Extra completion is not pending")]
    NotPending,
    #[error("Members cannot validate their own completions")]
    SelfValidation,
    #[error("Name must not be empty")]
    InvalidName,
    #[error("Points must be positive")]
    InvalidPoints,
    #[error("Score error: {0}")]
    ScoreError(#[from] scores::ScoreError),
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Record an ad-hoc chore outside the task list. Same lifecycle as a task
/// completion: pending until someone else validates it.
pub async fn add_extra_completion(
    pool: &SqlitePool,
    house_id: &Uuid,
    user_id: &Uuid,
    request: &AddExtraCompletionRequest,
) -> Result<ExtraCompletion, ExtraCompletionError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(ExtraCompletionError::InvalidName);
    }
    if request.points < 1 {
        return Err(ExtraCompletionError::InvalidPoints);
    }

    let id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO extra_completions
            (id, house_id, user_id, week_start_date, name, points_earned, status, completed_at)
        VALUES (?, ?, ?, ?, ?, ?, 'pending', ?)
        "#,
    )
    .bind(id.to_string())
    .bind(house_id.to_string())
    .bind(user_id.to_string())
    .bind(request.week_start_date)
    .bind(name)
    .bind(request.points)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(ExtraCompletion {
        id,
        house_id: *house_id,
        user_id: *user_id,
        week_start_date: request.week_start_date,
        name: name.to_string(),
        points_earned: request.points,
        status: CompletionStatus::Pending,
        validated_by: None,
        validated_at: None,
        completed_at: now,
    })
}

pub async fn get_extra_completion(
    pool: &SqlitePool,
    extra_id: &Uuid,
) -> Result<Option<ExtraCompletion>, ExtraCompletionError> {
    let row: Option<ExtraCompletionRow> =
        sqlx::query_as("SELECT * FROM extra_completions WHERE id = ?")
            .bind(extra_id.to_string())
            .fetch_optional(pool)
            .await?;

    Ok(row.map(|r| r.to_shared()))
}

pub async fn validate_extra_completion(
    pool: &SqlitePool,
    extra_id: &Uuid,
    validator_id: &Uuid,
) -> Result<ExtraCompletion, ExtraCompletionError> {
    let row: ExtraCompletionRow = sqlx::query_as("SELECT * FROM extra_completions WHERE id = ?")
        .bind(extra_id.to_string())
        .fetch_optional(pool)
        .await?
        .ok_or(ExtraCompletionError::NotFound)?;

    let extra = row.to_shared();

    if extra.user_id == *validator_id {
        return Err(ExtraCompletionError::SelfValidation);
    }
    if extra.status != CompletionStatus::Pending {
        return Err(ExtraCompletionError::NotPending);
    }

    let now = Utc::now();

    sqlx::query(
        "UPDATE extra_completions SET status = 'validated', validated_by = ?, validated_at = ? WHERE id = ?",
    )
    .bind(validator_id.to_string())
    .bind(now)
    .bind(extra_id.to_string())
    .execute(pool)
    .await?;

    scores::recompute_weekly_score(pool, &extra.house_id, &extra.user_id, extra.week_start_date)
        .await?;

    Ok(ExtraCompletion {
        status: CompletionStatus::Validated,
        validated_by: Some(*validator_id),
        validated_at: Some(now),
        ..extra
    })
}

pub async fn discard_extra_completion(
    pool: &SqlitePool,
    extra_id: &Uuid,
) -> Result<(), ExtraCompletionError> {
    let row: ExtraCompletionRow = sqlx::query_as("SELECT * FROM extra_completions WHERE id = ?")
        .bind(extra_id.to_string())
        .fetch_optional(pool)
        .await?
        .ok_or(ExtraCompletionError::NotFound)?;

    if row.to_shared().status != CompletionStatus::Pending {
        return Err(ExtraCompletionError::NotPending);
    }

    sqlx::query("DELETE FROM extra_completions WHERE id = ?")
        .bind(extra_id.to_string())
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn list_extra_completions(
    pool: &SqlitePool,
    house_id: &Uuid,
    user_id: &Uuid,
    week_start: chrono::NaiveDate,
) -> Result<Vec<ExtraCompletion>, ExtraCompletionError> {
    let rows: Vec<ExtraCompletionRow> = sqlx::query_as(
        r#"
        SELECT * FROM extra_completions
        WHERE house_id = ? AND user_id = ? AND week_start_date = ?
        ORDER BY completed_at DESC
        "#,
    )
    .bind(house_id.to_string())
    .bind(user_id.to_string())
    .bind(week_start)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.to_shared()).collect())
}
