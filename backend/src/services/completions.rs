use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{TaskCompletionRow, TaskRow};
use crate::services::scores;
use shared::{CompletionStatus, TaskCompletion, TaskFrequency};

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("Task not found")]
    TaskNotFound,
    #[error("Completion not found")]
    NotFound,
    #[error("Completion is not pending")]
    NotPending,
    #[error("Members cannot validate their own completions")]
    SelfValidation,
    #[error("Score error: {0}")]
    ScoreError(#[from] scores::ScoreError),
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Record a pending completion. Daily tasks are keyed by `today` so the same
/// task can be completed once per day; weekly tasks reuse the week start as
/// the display key and rely on the calculator's count for their semantics.
///
/// Points are not recomputed here: pending completions never contribute.
pub async fn complete_task(
    pool: &SqlitePool,
    house_id: &Uuid,
    task_id: &Uuid,
    user_id: &Uuid,
    week_start: NaiveDate,
    today: NaiveDate,
) -> Result<TaskCompletion, CompletionError> {
    let task: TaskRow = sqlx::query_as("SELECT * FROM tasks WHERE id = ? AND house_id = ?")
        .bind(task_id.to_string())
        .bind(house_id.to_string())
        .fetch_optional(pool)
        .await?
        .ok_or(CompletionError::TaskNotFound)?;

    let task = task.to_shared();
    let completion_date = match task.frequency {
        TaskFrequency::Daily => today,
        TaskFrequency::Weekly => week_start,
    };

    let id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO task_completions
            (id, house_id, task_id, user_id, week_start_date, completion_date, points_earned, status, completed_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, 'pending', ?)
        "#,
    )
    .bind(id.to_string())
    .bind(house_id.to_string())
    .bind(task_id.to_string())
    .bind(user_id.to_string())
    .bind(week_start)
    .bind(completion_date)
    .bind(task.points)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(TaskCompletion {
        id,
        house_id: *house_id,
        task_id: *task_id,
        user_id: *user_id,
        week_start_date: week_start,
        completion_date,
        points_earned: task.points,
        status: CompletionStatus::Pending,
        validated_by: None,
        validated_at: None,
        completed_at: now,
    })
}

pub async fn get_completion(
    pool: &SqlitePool,
    completion_id: &Uuid,
) -> Result<Option<TaskCompletion>, CompletionError> {
    let row: Option<TaskCompletionRow> =
        sqlx::query_as("SELECT * FROM task_completions WHERE id = ?")
            .bind(completion_id.to_string())
            .fetch_optional(pool)
            .await?;

    Ok(row.map(|r| r.to_shared()))
}

/// Validate a pending completion on behalf of `validator_id`, then recompute
/// and persist the owner's weekly score. Self-validation is forbidden in any
/// state; validating a non-pending completion is a conflict.
pub async fn validate_completion(
    pool: &SqlitePool,
    completion_id: &Uuid,
    validator_id: &Uuid,
) -> Result<TaskCompletion, CompletionError> {
    let row: TaskCompletionRow = sqlx::query_as("SELECT * FROM task_completions WHERE id = ?")
        .bind(completion_id.to_string())
        .fetch_optional(pool)
        .await?
        .ok_or(CompletionError::NotFound)?;

    let completion = row.to_shared();

    if completion.user_id == *validator_id {
        return Err(CompletionError::SelfValidation);
    }
    if completion.status != CompletionStatus::Pending {
        return Err(CompletionError::NotPending);
    }

    let now = Utc::now();

    sqlx::query(
        "UPDATE task_completions SET status = 'validated', validated_by = ?, validated_at = ? WHERE id = ?",
    )
    .bind(validator_id.to_string())
    .bind(now)
    .bind(completion_id.to_string())
    .execute(pool)
    .await?;

    scores::recompute_weekly_score(
        pool,
        &completion.house_id,
        &completion.user_id,
        completion.week_start_date,
    )
    .await?;

    Ok(TaskCompletion {
        status: CompletionStatus::Validated,
        validated_by: Some(*validator_id),
        validated_at: Some(now),
        ..completion
    })
}

/// Remove a pending completion entirely, reopening the slot. A validated
/// completion has already been counted and cannot be discarded.
pub async fn discard_completion(
    pool: &SqlitePool,
    completion_id: &Uuid,
) -> Result<(), CompletionError> {
    let row: TaskCompletionRow = sqlx::query_as("SELECT * FROM task_completions WHERE id = ?")
        .bind(completion_id.to_string())
        .fetch_optional(pool)
        .await?
        .ok_or(CompletionError::NotFound)?;

    if row.to_shared().status != CompletionStatus::Pending {
        return Err(CompletionError::NotPending);
    }

    sqlx::query("DELETE FROM task_completions WHERE id = ?")
        .bind(completion_id.to_string())
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn list_completions(
    pool: &SqlitePool,
    house_id: &Uuid,
    user_id: &Uuid,
    week_start: NaiveDate,
) -> Result<Vec<TaskCompletion>, CompletionError> {
    let rows: Vec<TaskCompletionRow> = sqlx::query_as(
        r#"
        SELECT * FROM task_completions
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

/// Pending completions by other members, for the actor to validate.
pub async fn list_pending_to_validate(
    pool: &SqlitePool,
    house_id: &Uuid,
    actor_id: &Uuid,
    week_start: NaiveDate,
) -> Result<Vec<TaskCompletion>, CompletionError> {
    let rows: Vec<TaskCompletionRow> = sqlx::query_as(
        r#"
        SELECT * FROM task_completions
        WHERE house_id = ? AND week_start_date = ? AND status = 'pending' AND user_id != ?
        ORDER BY completed_at DESC
        "#,
    )
    .bind(house_id.to_string())
    .bind(week_start)
    .bind(actor_id.to_string())
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.to_shared()).collect())
}
