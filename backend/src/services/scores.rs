use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

use crate::models::CompletionWithTaskRow;
use shared::TaskFrequency;

#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Effective points for a member in a week, derived from validated
/// completions only. Pure read; the caller decides whether to persist.
///
/// - daily tasks: every validated completion counts its own points
/// - weekly tasks: the task's points are awarded exactly once when the
///   validated count reaches `weekly_minimum` (default 1), no matter how far
///   the count exceeds it
/// - completions whose task has been deleted are skipped
/// - validated extra completions are summed on top
pub async fn effective_points(
    pool: &SqlitePool,
    house_id: &Uuid,
    user_id: &Uuid,
    week_start: NaiveDate,
) -> Result<i64, ScoreError> {
    let completions: Vec<CompletionWithTaskRow> = sqlx::query_as(
        r#"
        SELECT c.task_id, c.points_earned,
               t.frequency AS task_frequency,
               t.points AS task_points,
               t.weekly_minimum AS task_weekly_minimum
        FROM task_completions c
        LEFT JOIN tasks t ON t.id = c.task_id
        WHERE c.house_id = ? AND c.user_id = ? AND c.week_start_date = ? AND c.status = 'validated'
        "#,
    )
    .bind(house_id.to_string())
    .bind(user_id.to_string())
    .bind(week_start)
    .fetch_all(pool)
    .await?;

    let extra: i64 = sqlx::query_scalar(
        r#"
        SELECT COALESCE(SUM(points_earned), 0)
        FROM extra_completions
        WHERE house_id = ? AND user_id = ? AND week_start_date = ? AND status = 'validated'
        "#,
    )
    .bind(house_id.to_string())
    .bind(user_id.to_string())
    .bind(week_start)
    .fetch_one(pool)
    .await?;

    Ok(score_completions(&completions) + extra)
}

/// Per-task awards over a member's validated completions for one week.
pub fn score_completions(completions: &[CompletionWithTaskRow]) -> i64 {
    let mut by_task: HashMap<&str, Vec<&CompletionWithTaskRow>> = HashMap::new();
    for completion in completions {
        by_task
            .entry(completion.task_id.as_str())
            .or_default()
            .push(completion);
    }

    let mut total = 0;

    for group in by_task.values() {
        let first = group[0];
        let frequency = match first.task_frequency.as_deref().and_then(|f| f.parse().ok()) {
            Some(f) => f,
            // Task deleted after completion: skip, never crash or count.
            None => continue,
        };

        match frequency {
            TaskFrequency::Daily => {
                total += group.iter().map(|c| c.points_earned).sum::<i64>();
            }
            TaskFrequency::Weekly => {
                let minimum = first.task_weekly_minimum.unwrap_or(1).max(1);
                if group.len() as i64 >= minimum {
                    total += first.task_points.unwrap_or(0);
                }
            }
        }
    }

    total
}

/// Recompute a member's effective points and store them as the week's
/// earned total. Called after every validation and discard; always derived
/// fresh from the full completion set, never incremented, so concurrent
/// recomputations are last-writer-wins safe.
pub async fn recompute_weekly_score(
    pool: &SqlitePool,
    house_id: &Uuid,
    user_id: &Uuid,
    week_start: NaiveDate,
) -> Result<i64, ScoreError> {
    let earned = effective_points(pool, house_id, user_id, week_start).await?;
    let now = Utc::now();

    let updated = sqlx::query(
        r#"
        UPDATE weekly_scores SET points_earned = ?, updated_at = ?
        WHERE house_id = ? AND user_id = ? AND week_start_date = ?
        "#,
    )
    .bind(earned)
    .bind(now)
    .bind(house_id.to_string())
    .bind(user_id.to_string())
    .bind(week_start)
    .execute(pool)
    .await?;

    if updated.rows_affected() == 0 {
        // First activity this week: seed the row with the configured target.
        let target: Option<i64> = sqlx::query_scalar(
            "SELECT points_target_per_person FROM weekly_config WHERE house_id = ? AND week_start_date = ?",
        )
        .bind(house_id.to_string())
        .bind(week_start)
        .fetch_optional(pool)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO weekly_scores
                (id, house_id, user_id, week_start_date, points_target, points_earned, points_carried_over, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(house_id.to_string())
        .bind(user_id.to_string())
        .bind(week_start)
        .bind(target.unwrap_or(0))
        .bind(earned)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;
    }

    Ok(earned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(
        task_id: &str,
        points_earned: i64,
        frequency: Option<&str>,
        task_points: Option<i64>,
        weekly_minimum: Option<i64>,
    ) -> CompletionWithTaskRow {
        CompletionWithTaskRow {
            task_id: task_id.to_string(),
            points_earned,
            task_frequency: frequency.map(|f| f.to_string()),
            task_points,
            task_weekly_minimum: weekly_minimum,
        }
    }

    #[test]
    fn test_daily_completions_each_count() {
        let completions = vec![
            row("a", 5, Some("daily"), Some(5), None),
            row("a", 5, Some("daily"), Some(5), None),
        ];
        assert_eq!(score_completions(&completions), 10);
    }

    #[test]
    fn test_weekly_threshold_awards_once() {
        let below = vec![
            row("w", 20, Some("weekly"), Some(20), Some(3)),
            row("w", 20, Some("weekly"), Some(20), Some(3)),
        ];
        assert_eq!(score_completions(&below), 0);

        let mut at = below.clone();
        at.push(row("w", 20, Some("weekly"), Some(20), Some(3)));
        assert_eq!(score_completions(&at), 20);

        let mut over = at.clone();
        over.push(row("w", 20, Some("weekly"), Some(20), Some(3)));
        assert_eq!(score_completions(&over), 20);
    }

    #[test]
    fn test_weekly_default_minimum_is_one() {
        let completions = vec![row("w", 15, Some("weekly"), Some(15), None)];
        assert_eq!(score_completions(&completions), 15);
    }

    #[test]
    fn test_deleted_task_completions_are_skipped() {
        let completions = vec![
            row("gone", 50, None, None, None),
            row("a", 5, Some("daily"), Some(5), None),
        ];
        assert_eq!(score_completions(&completions), 5);
    }

    #[test]
    fn test_minimum_below_one_treated_as_one() {
        let completions = vec![row("w", 10, Some("weekly"), Some(10), Some(0))];
        assert_eq!(score_completions(&completions), 10);
    }

    #[test]
    fn test_mixed_tasks_sum_per_task_awards() {
        let completions = vec![
            row("daily", 5, Some("daily"), Some(5), None),
            row("daily", 5, Some("daily"), Some(5), None),
            row("weekly", 20, Some("weekly"), Some(20), Some(2)),
            row("weekly", 20, Some("weekly"), Some(20), Some(2)),
        ];
        assert_eq!(score_completions(&completions), 30);
    }
}
