use chrono::Utc;
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::TaskRow;
use shared::{CreateTaskRequest, Task, TaskFrequency, UpdateTaskRequest};

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Task not found")]
    NotFound,
    #[error("Name must not be empty")]
    InvalidName,
    #[error("Points must be positive")]
    InvalidPoints,
    #[error("weekly_minimum must be at least 1")]
    InvalidWeeklyMinimum,
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

fn check_name(name: &str) -> Result<&str, TaskError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(TaskError::InvalidName);
    }
    Ok(name)
}

fn check_weekly_minimum(minimum: Option<i64>) -> Result<(), TaskError> {
    if matches!(minimum, Some(m) if m < 1) {
        return Err(TaskError::InvalidWeeklyMinimum);
    }
    Ok(())
}

pub async fn create_task(
    pool: &SqlitePool,
    house_id: &Uuid,
    request: &CreateTaskRequest,
) -> Result<Task, TaskError> {
    let name = check_name(&request.name)?;
    if request.points < 1 {
        return Err(TaskError::InvalidPoints);
    }
    check_weekly_minimum(request.weekly_minimum)?;

    let id = Uuid::new_v4();
    let now = Utc::now();
    // Daily tasks have no completion threshold.
    let weekly_minimum = match request.frequency {
        TaskFrequency::Daily => None,
        TaskFrequency::Weekly => request.weekly_minimum,
    };

    sqlx::query(
        r#"
        INSERT INTO tasks (id, house_id, name, points, frequency, weekly_minimum, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(house_id.to_string())
    .bind(name)
    .bind(request.points)
    .bind(request.frequency.as_str())
    .bind(weekly_minimum)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(Task {
        id,
        house_id: *house_id,
        name: name.to_string(),
        points: request.points,
        frequency: request.frequency,
        weekly_minimum,
        created_at: now,
        updated_at: now,
    })
}

pub async fn get_task(
    pool: &SqlitePool,
    house_id: &Uuid,
    task_id: &Uuid,
) -> Result<Option<Task>, TaskError> {
    let row: Option<TaskRow> = sqlx::query_as("SELECT * FROM tasks WHERE id = ? AND house_id = ?")
        .bind(task_id.to_string())
        .bind(house_id.to_string())
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|r| r.to_shared()))
}

pub async fn list_tasks(pool: &SqlitePool, house_id: &Uuid) -> Result<Vec<Task>, TaskError> {
    let rows: Vec<TaskRow> =
        sqlx::query_as("SELECT * FROM tasks WHERE house_id = ? ORDER BY created_at ASC, id ASC")
            .bind(house_id.to_string())
            .fetch_all(pool)
            .await?;

    Ok(rows.into_iter().map(|r| r.to_shared()).collect())
}

pub async fn update_task(
    pool: &SqlitePool,
    house_id: &Uuid,
    task_id: &Uuid,
    request: &UpdateTaskRequest,
) -> Result<Task, TaskError> {
    let mut task = get_task(pool, house_id, task_id)
        .await?
        .ok_or(TaskError::NotFound)?;

    if let Some(name) = &request.name {
        task.name = check_name(name)?.to_string();
    }
    if let Some(points) = request.points {
        if points < 1 {
            return Err(TaskError::InvalidPoints);
        }
        task.points = points;
    }
    if let Some(frequency) = request.frequency {
        task.frequency = frequency;
    }
    if let Some(minimum) = request.weekly_minimum {
        check_weekly_minimum(minimum)?;
        task.weekly_minimum = minimum;
    }
    if task.frequency == TaskFrequency::Daily {
        task.weekly_minimum = None;
    }
    task.updated_at = Utc::now();

    sqlx::query(
        r#"
        UPDATE tasks SET name = ?, points = ?, frequency = ?, weekly_minimum = ?, updated_at = ?
        WHERE id = ? AND house_id = ?
        "#,
    )
    .bind(&task.name)
    .bind(task.points)
    .bind(task.frequency.as_str())
    .bind(task.weekly_minimum)
    .bind(task.updated_at)
    .bind(task_id.to_string())
    .bind(house_id.to_string())
    .execute(pool)
    .await?;

    Ok(task)
}

/// Delete a task. Completion rows that reference it are kept; the points
/// calculator treats them as orphaned and skips them.
pub async fn delete_task(
    pool: &SqlitePool,
    house_id: &Uuid,
    task_id: &Uuid,
) -> Result<(), TaskError> {
    let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE id = ? AND house_id = ?")
        .bind(task_id.to_string())
        .bind(house_id.to_string())
        .fetch_one(pool)
        .await?;
    if exists == 0 {
        return Err(TaskError::NotFound);
    }

    // Group links first, they carry the FK on the task.
    sqlx::query("DELETE FROM task_group_items WHERE task_id = ?")
        .bind(task_id.to_string())
        .execute(pool)
        .await?;

    sqlx::query("DELETE FROM tasks WHERE id = ? AND house_id = ?")
        .bind(task_id.to_string())
        .bind(house_id.to_string())
        .execute(pool)
        .await?;

    Ok(())
}
