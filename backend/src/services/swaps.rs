use chrono::{DateTime, Duration, NaiveDate, Utc};
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::TaskSwapRow;
use shared::{CreateSwapRequest, SwapStatus, SwapType, TaskSwap};

/// How long the recipient has to answer before a pending request goes stale.
const REQUEST_TTL_HOURS: i64 = 24;

#[derive(Debug, Error)]
pub enum SwapError {
    #[error("Task not found")]
    TaskNotFound,
    #[error("Swap not found")]
    NotFound,
    #[error("Cannot swap a task with yourself")]
    SelfSwap,
    #[error("Temporary swaps need a swap date; permanent swaps must not have one")]
    InvalidSwapDate,
    #[error("Only the recipient can respond to a swap")]
    NotRecipient,
    #[error("Swap is not pending")]
    NotPending,
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Ask another member to take over a task, either for one day or for the
/// rest of the week. The request sits pending until they answer or it ages
/// out after 24 hours.
pub async fn create_swap(
    pool: &SqlitePool,
    house_id: &Uuid,
    from_user_id: &Uuid,
    request: &CreateSwapRequest,
) -> Result<TaskSwap, SwapError> {
    if request.to_user_id == *from_user_id {
        return Err(SwapError::SelfSwap);
    }
    match request.swap_type {
        SwapType::Temporary if request.swap_date.is_none() => {
            return Err(SwapError::InvalidSwapDate)
        }
        SwapType::Permanent if request.swap_date.is_some() => {
            return Err(SwapError::InvalidSwapDate)
        }
        _ => {}
    }

    let task_exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE id = ? AND house_id = ?")
        .bind(request.task_id.to_string())
        .bind(house_id.to_string())
        .fetch_one(pool)
        .await?;
    if task_exists == 0 {
        return Err(SwapError::TaskNotFound);
    }

    let id = Uuid::new_v4();
    let now = Utc::now();
    let expires_at = now + Duration::hours(REQUEST_TTL_HOURS);

    sqlx::query(
        r#"
        INSERT INTO task_swaps
            (id, house_id, task_id, from_user_id, to_user_id, week_start_date,
             swap_type, swap_date, status, requested_at, expires_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, 'pending', ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(house_id.to_string())
    .bind(request.task_id.to_string())
    .bind(from_user_id.to_string())
    .bind(request.to_user_id.to_string())
    .bind(request.week_start_date)
    .bind(request.swap_type.as_str())
    .bind(request.swap_date)
    .bind(now)
    .bind(expires_at)
    .execute(pool)
    .await?;

    Ok(TaskSwap {
        id,
        house_id: *house_id,
        task_id: request.task_id,
        from_user_id: *from_user_id,
        to_user_id: request.to_user_id,
        week_start_date: request.week_start_date,
        swap_type: request.swap_type,
        swap_date: request.swap_date,
        status: SwapStatus::Pending,
        requested_at: now,
        responded_at: None,
        expires_at,
    })
}

pub async fn get_swap(pool: &SqlitePool, swap_id: &Uuid) -> Result<Option<TaskSwap>, SwapError> {
    let row: Option<TaskSwapRow> = sqlx::query_as("SELECT * FROM task_swaps WHERE id = ?")
        .bind(swap_id.to_string())
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|r| r.to_shared()))
}

/// Accept or reject a pending swap. Only the recipient may answer, only
/// while the request is pending, and not after it has aged out.
pub async fn respond_to_swap(
    pool: &SqlitePool,
    swap_id: &Uuid,
    responder_id: &Uuid,
    accept: bool,
) -> Result<TaskSwap, SwapError> {
    respond_to_swap_at(pool, swap_id, responder_id, accept, Utc::now()).await
}

async fn respond_to_swap_at(
    pool: &SqlitePool,
    swap_id: &Uuid,
    responder_id: &Uuid,
    accept: bool,
    now: DateTime<Utc>,
) -> Result<TaskSwap, SwapError> {
    let row: TaskSwapRow = sqlx::query_as("SELECT * FROM task_swaps WHERE id = ?")
        .bind(swap_id.to_string())
        .fetch_optional(pool)
        .await?
        .ok_or(SwapError::NotFound)?;

    let swap = row.to_shared();

    if swap.to_user_id != *responder_id {
        return Err(SwapError::NotRecipient);
    }
    let next = if accept {
        SwapStatus::Accepted
    } else {
        SwapStatus::Rejected
    };
    if !swap.status.can_transition_to(next) || swap.expires_at < now {
        return Err(SwapError::NotPending);
    }

    sqlx::query("UPDATE task_swaps SET status = ?, responded_at = ? WHERE id = ?")
        .bind(next.as_str())
        .bind(now)
        .bind(swap_id.to_string())
        .execute(pool)
        .await?;

    Ok(TaskSwap {
        status: next,
        responded_at: Some(now),
        ..swap
    })
}

/// The accepted swap covering a task on a given day, if any. Permanent swaps
/// cover the whole week; temporary ones only their single day.
pub async fn get_active_swap_for_task(
    pool: &SqlitePool,
    house_id: &Uuid,
    task_id: &Uuid,
    week_start: NaiveDate,
    date: NaiveDate,
) -> Result<Option<TaskSwap>, SwapError> {
    let rows: Vec<TaskSwapRow> = sqlx::query_as(
        r#"
        SELECT * FROM task_swaps
        WHERE house_id = ? AND task_id = ? AND week_start_date = ? AND status = 'accepted'
        ORDER BY requested_at DESC
        "#,
    )
    .bind(house_id.to_string())
    .bind(task_id.to_string())
    .bind(week_start)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| r.to_shared())
        .find(|swap| match swap.swap_type {
            SwapType::Permanent => true,
            SwapType::Temporary => swap.swap_date == Some(date),
        }))
}

/// Pending requests addressed to a member, stale ones filtered out.
pub async fn list_pending_swaps(
    pool: &SqlitePool,
    house_id: &Uuid,
    user_id: &Uuid,
) -> Result<Vec<TaskSwap>, SwapError> {
    let rows: Vec<TaskSwapRow> = sqlx::query_as(
        r#"
        SELECT * FROM task_swaps
        WHERE house_id = ? AND to_user_id = ? AND status = 'pending' AND expires_at > ?
        ORDER BY requested_at ASC
        "#,
    )
    .bind(house_id.to_string())
    .bind(user_id.to_string())
    .bind(Utc::now())
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.to_shared()).collect())
}

/// Expire accepted temporary swaps whose covered day has passed. A swap for
/// yesterday is expired; a swap for today is still active.
pub async fn expire_temporary_swaps(
    pool: &SqlitePool,
    house_id: &Uuid,
    today: NaiveDate,
) -> Result<u64, SwapError> {
    let result = sqlx::query(
        r#"
        UPDATE task_swaps SET status = 'expired'
        WHERE house_id = ? AND status = 'accepted' AND swap_type = 'temporary' AND swap_date < ?
        "#,
    )
    .bind(house_id.to_string())
    .bind(today)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{create_house, create_task, create_user, setup_test_db};
    use shared::TaskFrequency;

    fn week() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    async fn seed(pool: &SqlitePool) -> (Uuid, Uuid, Uuid, Uuid) {
        let a = create_user(pool, "a@example.com").await;
        let b = create_user(pool, "b@example.com").await;
        let house = create_house(pool, &a, 1, 1).await;
        let task = create_task(pool, &house, "Dishes", 5, TaskFrequency::Daily, None).await;
        (a, b, house, task)
    }

    fn temporary(task: Uuid, to: Uuid, date: NaiveDate) -> CreateSwapRequest {
        CreateSwapRequest {
            task_id: task,
            to_user_id: to,
            week_start_date: week(),
            swap_type: SwapType::Temporary,
            swap_date: Some(date),
        }
    }

    #[tokio::test]
    async fn test_create_swap_validates_input() {
        let pool = setup_test_db().await;
        let (a, b, house, task) = seed(&pool).await;

        let result = create_swap(&pool, &house, &a, &temporary(task, a, week())).await;
        assert!(matches!(result, Err(SwapError::SelfSwap)));

        let result = create_swap(
            &pool,
            &house,
            &a,
            &CreateSwapRequest {
                task_id: task,
                to_user_id: b,
                week_start_date: week(),
                swap_type: SwapType::Temporary,
                swap_date: None,
            },
        )
        .await;
        assert!(matches!(result, Err(SwapError::InvalidSwapDate)));

        let result = create_swap(
            &pool,
            &house,
            &a,
            &CreateSwapRequest {
                task_id: task,
                to_user_id: b,
                week_start_date: week(),
                swap_type: SwapType::Permanent,
                swap_date: Some(week()),
            },
        )
        .await;
        assert!(matches!(result, Err(SwapError::InvalidSwapDate)));

        let result = create_swap(&pool, &house, &a, &temporary(Uuid::new_v4(), b, week())).await;
        assert!(matches!(result, Err(SwapError::TaskNotFound)));
    }

    #[tokio::test]
    async fn test_only_recipient_responds_and_only_once() {
        let pool = setup_test_db().await;
        let (a, b, house, task) = seed(&pool).await;

        let swap = create_swap(&pool, &house, &a, &temporary(task, b, week()))
            .await
            .unwrap();

        let result = respond_to_swap(&pool, &swap.id, &a, true).await;
        assert!(matches!(result, Err(SwapError::NotRecipient)));

        let accepted = respond_to_swap(&pool, &swap.id, &b, true).await.unwrap();
        assert_eq!(accepted.status, SwapStatus::Accepted);
        assert!(accepted.responded_at.is_some());

        let result = respond_to_swap(&pool, &swap.id, &b, false).await;
        assert!(matches!(result, Err(SwapError::NotPending)));
    }

    #[tokio::test]
    async fn test_stale_request_cannot_be_answered() {
        let pool = setup_test_db().await;
        let (a, b, house, task) = seed(&pool).await;

        let swap = create_swap(&pool, &house, &a, &temporary(task, b, week()))
            .await
            .unwrap();

        let after_expiry = swap.expires_at + Duration::hours(1);
        let result = respond_to_swap_at(&pool, &swap.id, &b, true, after_expiry).await;
        assert!(matches!(result, Err(SwapError::NotPending)));

        assert!(list_pending_swaps(&pool, &house, &b).await.unwrap().len() == 1);
    }

    #[tokio::test]
    async fn test_active_swap_lookup() {
        let pool = setup_test_db().await;
        let (a, b, house, task) = seed(&pool).await;

        let tuesday = NaiveDate::from_ymd_opt(2024, 1, 16).unwrap();
        let swap = create_swap(&pool, &house, &a, &temporary(task, b, tuesday))
            .await
            .unwrap();

        // Pending swaps are not active.
        assert!(get_active_swap_for_task(&pool, &house, &task, week(), tuesday)
            .await
            .unwrap()
            .is_none());

        respond_to_swap(&pool, &swap.id, &b, true).await.unwrap();

        let active = get_active_swap_for_task(&pool, &house, &task, week(), tuesday)
            .await
            .unwrap();
        assert_eq!(active.unwrap().id, swap.id);

        // A temporary swap covers only its own day.
        let wednesday = NaiveDate::from_ymd_opt(2024, 1, 17).unwrap();
        assert!(get_active_swap_for_task(&pool, &house, &task, week(), wednesday)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_permanent_swap_covers_whole_week() {
        let pool = setup_test_db().await;
        let (a, b, house, task) = seed(&pool).await;

        let swap = create_swap(
            &pool,
            &house,
            &a,
            &CreateSwapRequest {
                task_id: task,
                to_user_id: b,
                week_start_date: week(),
                swap_type: SwapType::Permanent,
                swap_date: None,
            },
        )
        .await
        .unwrap();
        respond_to_swap(&pool, &swap.id, &b, true).await.unwrap();

        for offset in 0..7 {
            let day = week() + Duration::days(offset);
            let active = get_active_swap_for_task(&pool, &house, &task, week(), day)
                .await
                .unwrap();
            assert_eq!(active.unwrap().id, swap.id);
        }
    }

    #[tokio::test]
    async fn test_temporary_swaps_expire_after_their_day() {
        let pool = setup_test_db().await;
        let (a, b, house, task) = seed(&pool).await;

        let yesterday = NaiveDate::from_ymd_opt(2024, 1, 16).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 1, 17).unwrap();

        let past = create_swap(&pool, &house, &a, &temporary(task, b, yesterday))
            .await
            .unwrap();
        respond_to_swap(&pool, &past.id, &b, true).await.unwrap();

        let current = create_swap(&pool, &house, &a, &temporary(task, b, today))
            .await
            .unwrap();
        respond_to_swap(&pool, &current.id, &b, true).await.unwrap();

        let expired = expire_temporary_swaps(&pool, &house, today).await.unwrap();
        assert_eq!(expired, 1);

        assert_eq!(get_swap(&pool, &past.id).await.unwrap().unwrap().status, SwapStatus::Expired);
        assert_eq!(
            get_swap(&pool, &current.id).await.unwrap().unwrap().status,
            SwapStatus::Accepted
        );
    }
}
