use chrono::Utc;
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{TaskGroupRow, TaskRow};
use shared::{CreateGroupRequest, TaskGroupWithTasks, UpdateGroupRequest};

#[derive(Debug, Error)]
pub enum GroupError {
    #[error("Task group not found")]
    NotFound,
    #[error("Name must not be empty")]
    InvalidName,
    #[error("Task not found")]
    UnknownTask,
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

async fn check_tasks_in_house(
    pool: &SqlitePool,
    house_id: &Uuid,
    task_ids: &[Uuid],
) -> Result<(), GroupError> {
    for task_id in task_ids {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE id = ? AND house_id = ?")
            .bind(task_id.to_string())
            .bind(house_id.to_string())
            .fetch_one(pool)
            .await?;
        if count == 0 {
            return Err(GroupError::UnknownTask);
        }
    }
    Ok(())
}

async fn replace_group_tasks(
    pool: &SqlitePool,
    group_id: &Uuid,
    task_ids: &[Uuid],
) -> Result<(), GroupError> {
    sqlx::query("DELETE FROM task_group_items WHERE task_group_id = ?")
        .bind(group_id.to_string())
        .execute(pool)
        .await?;

    for task_id in task_ids {
        sqlx::query("INSERT INTO task_group_items (id, task_group_id, task_id, created_at) VALUES (?, ?, ?, ?)")
            .bind(Uuid::new_v4().to_string())
            .bind(group_id.to_string())
            .bind(task_id.to_string())
            .bind(Utc::now())
            .execute(pool)
            .await?;
    }

    Ok(())
}

pub async fn create_group(
    pool: &SqlitePool,
    house_id: &Uuid,
    request: &CreateGroupRequest,
) -> Result<TaskGroupWithTasks, GroupError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(GroupError::InvalidName);
    }
    check_tasks_in_house(pool, house_id, &request.task_ids).await?;

    let id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query(
        "INSERT INTO task_groups (id, house_id, name, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(id.to_string())
    .bind(house_id.to_string())
    .bind(name)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    replace_group_tasks(pool, &id, &request.task_ids).await?;

    get_group_with_tasks(pool, house_id, &id)
        .await?
        .ok_or(GroupError::NotFound)
}

pub async fn get_group_with_tasks(
    pool: &SqlitePool,
    house_id: &Uuid,
    group_id: &Uuid,
) -> Result<Option<TaskGroupWithTasks>, GroupError> {
    let row: Option<TaskGroupRow> =
        sqlx::query_as("SELECT * FROM task_groups WHERE id = ? AND house_id = ?")
            .bind(group_id.to_string())
            .bind(house_id.to_string())
            .fetch_optional(pool)
            .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    Ok(Some(TaskGroupWithTasks {
        group: row.to_shared(),
        tasks: group_tasks(pool, group_id).await?,
    }))
}

async fn group_tasks(pool: &SqlitePool, group_id: &Uuid) -> Result<Vec<shared::Task>, GroupError> {
    let tasks: Vec<TaskRow> = sqlx::query_as(
        r#"
        SELECT t.* FROM task_group_items tgi
        JOIN tasks t ON t.id = tgi.task_id
        WHERE tgi.task_group_id = ?
        ORDER BY t.created_at ASC, t.id ASC
        "#,
    )
    .bind(group_id.to_string())
    .fetch_all(pool)
    .await?;

    Ok(tasks.into_iter().map(|t| t.to_shared()).collect())
}

/// Groups in creation order, each with its current task set. Rotation rank
/// depends on this ordering being stable.
pub async fn list_groups_with_tasks(
    pool: &SqlitePool,
    house_id: &Uuid,
) -> Result<Vec<TaskGroupWithTasks>, GroupError> {
    let rows: Vec<TaskGroupRow> =
        sqlx::query_as("SELECT * FROM task_groups WHERE house_id = ? ORDER BY created_at ASC, id ASC")
            .bind(house_id.to_string())
            .fetch_all(pool)
            .await?;

    let mut groups = Vec::with_capacity(rows.len());
    for row in rows {
        let group = row.to_shared();
        let tasks = group_tasks(pool, &group.id).await?;
        groups.push(TaskGroupWithTasks { group, tasks });
    }

    Ok(groups)
}

/// Rename a group or replace its task set wholesale; a provided task list
/// is never merged with the old one.
pub async fn update_group(
    pool: &SqlitePool,
    house_id: &Uuid,
    group_id: &Uuid,
    request: &UpdateGroupRequest,
) -> Result<TaskGroupWithTasks, GroupError> {
    let existing = get_group_with_tasks(pool, house_id, group_id)
        .await?
        .ok_or(GroupError::NotFound)?;

    let name = match &request.name {
        Some(name) => {
            let name = name.trim();
            if name.is_empty() {
                return Err(GroupError::InvalidName);
            }
            name.to_string()
        }
        None => existing.group.name,
    };

    sqlx::query("UPDATE task_groups SET name = ?, updated_at = ? WHERE id = ?")
        .bind(&name)
        .bind(Utc::now())
        .bind(group_id.to_string())
        .execute(pool)
        .await?;

    if let Some(task_ids) = &request.task_ids {
        check_tasks_in_house(pool, house_id, task_ids).await?;
        replace_group_tasks(pool, group_id, task_ids).await?;
    }

    get_group_with_tasks(pool, house_id, group_id)
        .await?
        .ok_or(GroupError::NotFound)
}

/// Delete a group and its task links. Assignment rows that point at it keep
/// their reference; rotation restarts those members at the first group.
pub async fn delete_group(
    pool: &SqlitePool,
    house_id: &Uuid,
    group_id: &Uuid,
) -> Result<(), GroupError> {
    let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM task_groups WHERE id = ? AND house_id = ?")
        .bind(group_id.to_string())
        .bind(house_id.to_string())
        .fetch_one(pool)
        .await?;
    if exists == 0 {
        return Err(GroupError::NotFound);
    }

    // Links first, they carry the FK on the group.
    sqlx::query("DELETE FROM task_group_items WHERE task_group_id = ?")
        .bind(group_id.to_string())
        .execute(pool)
        .await?;

    sqlx::query("DELETE FROM task_groups WHERE id = ? AND house_id = ?")
        .bind(group_id.to_string())
        .bind(house_id.to_string())
        .execute(pool)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{create_house, create_task, create_user, setup_test_db};
    use shared::TaskFrequency;

    #[tokio::test]
    async fn test_create_group_with_tasks() {
        let pool = setup_test_db().await;
        let owner = create_user(&pool, "a@example.com").await;
        let house = create_house(&pool, &owner, 1, 1).await;
        let t1 = create_task(&pool, &house, "Dishes", 5, TaskFrequency::Daily, None).await;
        let t2 = create_task(&pool, &house, "Trash", 3, TaskFrequency::Daily, None).await;

        let group = create_group(
            &pool,
            &house,
            &CreateGroupRequest {
                name: "Kitchen".to_string(),
                task_ids: vec![t1, t2],
            },
        )
        .await
        .unwrap();

        assert_eq!(group.group.name, "Kitchen");
        assert_eq!(group.tasks.len(), 2);
        assert_eq!(group.tasks[0].id, t1);
    }

    #[tokio::test]
    async fn test_create_group_rejects_foreign_tasks() {
        let pool = setup_test_db().await;
        let owner = create_user(&pool, "a@example.com").await;
        let house = create_house(&pool, &owner, 1, 1).await;

        let result = create_group(
            &pool,
            &house,
            &CreateGroupRequest {
                name: "Kitchen".to_string(),
                task_ids: vec![Uuid::new_v4()],
            },
        )
        .await;
        assert!(matches!(result, Err(GroupError::UnknownTask)));
    }

    #[tokio::test]
    async fn test_update_replaces_task_set_wholesale() {
        let pool = setup_test_db().await;
        let owner = create_user(&pool, "a@example.com").await;
        let house = create_house(&pool, &owner, 1, 1).await;
        let t1 = create_task(&pool, &house, "Dishes", 5, TaskFrequency::Daily, None).await;
        let t2 = create_task(&pool, &house, "Trash", 3, TaskFrequency::Daily, None).await;
        let t3 = create_task(&pool, &house, "Mop", 8, TaskFrequency::Weekly, None).await;

        let group = create_group(
            &pool,
            &house,
            &CreateGroupRequest {
                name: "Kitchen".to_string(),
                task_ids: vec![t1, t2],
            },
        )
        .await
        .unwrap();

        let updated = update_group(
            &pool,
            &house,
            &group.group.id,
            &UpdateGroupRequest {
                name: Some("Floors".to_string()),
                task_ids: Some(vec![t3]),
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.group.name, "Floors");
        assert_eq!(updated.tasks.len(), 1);
        assert_eq!(updated.tasks[0].id, t3);
    }

    #[tokio::test]
    async fn test_delete_group() {
        let pool = setup_test_db().await;
        let owner = create_user(&pool, "a@example.com").await;
        let house = create_house(&pool, &owner, 1, 1).await;

        let group = create_group(
            &pool,
            &house,
            &CreateGroupRequest {
                name: "Kitchen".to_string(),
                task_ids: vec![],
            },
        )
        .await
        .unwrap();

        delete_group(&pool, &house, &group.group.id).await.unwrap();
        assert!(get_group_with_tasks(&pool, &house, &group.group.id)
            .await
            .unwrap()
            .is_none());

        let result = delete_group(&pool, &house, &group.group.id).await;
        assert!(matches!(result, Err(GroupError::NotFound)));
    }
}
