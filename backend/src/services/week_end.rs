use chrono::{Duration, NaiveDate, Utc};
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{WeeklyConfigRow, WeeklyScoreRow};
use shared::{UpsertWeeklyConfigRequest, WeeklyConfig, WeeklyScore};

#[derive(Debug, Error)]
pub enum WeekEndError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// One member's closing numbers and their opening target for the next week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberOutcome {
    pub user_id: Uuid,
    pub deficit: i64,
    pub surplus: i64,
    pub next_target: i64,
    pub carried_over: i64,
}

/// The target redistribution itself, pure over (user, target, earned) rows.
///
/// Members who missed their target carry the full deficit into next week's
/// target. Members who met it absorb a share of the house's total deficit,
/// 1/(n-1) each, floored. Total surplus flows the other way: each member in
/// deficit gets an equal floored share knocked off. Targets never go below
/// zero. Integer flooring means points can vanish in the split; the totals
/// are not conserved exactly.
pub fn next_week_targets(scores: &[(Uuid, i64, i64)], base: i64) -> Vec<MemberOutcome> {
    let total_members = scores.len() as i64;

    let deficits: Vec<i64> = scores
        .iter()
        .map(|(_, target, earned)| (target - earned).max(0))
        .collect();
    let surpluses: Vec<i64> = scores
        .iter()
        .map(|(_, target, earned)| (earned - target).max(0))
        .collect();

    let total_deficit: i64 = deficits.iter().sum();
    let total_surplus: i64 = surpluses.iter().sum();
    let num_with_deficit = deficits.iter().filter(|d| **d > 0).count() as i64;

    scores
        .iter()
        .zip(deficits.iter().zip(&surpluses))
        .map(|((user_id, _, _), (&deficit, &surplus))| {
            let mut next = base;

            if deficit > 0 {
                next += deficit;
            } else if total_deficit > 0 && total_members > 1 {
                next = (next - total_deficit / (total_members - 1)).max(0);
            }

            if total_surplus > 0 && deficit > 0 {
                next = (next - total_surplus / num_with_deficit).max(0);
            }

            MemberOutcome {
                user_id: *user_id,
                deficit,
                surplus,
                next_target: next,
                carried_over: deficit,
            }
        })
        .collect()
}

/// Close out a week: fold every member's deficit or surplus into their
/// target for the following week and open next week's score rows at zero.
///
/// A week with no score rows closes as a no-op. The base target for next
/// week is next week's config if one was already written, otherwise
/// `base_target`; either way the config row is upserted so later recomputes
/// seed from it. Closing the same week twice compounds the adjustments onto
/// the config written by the first run and zeroes out whatever was already
/// earned in the opened week.
pub async fn process_week_end(
    pool: &SqlitePool,
    house_id: &Uuid,
    week_start: NaiveDate,
    base_target: i64,
) -> Result<Vec<MemberOutcome>, WeekEndError> {
    let scores = get_week_scores(pool, house_id, week_start).await?;
    if scores.is_empty() {
        return Ok(Vec::new());
    }

    let next_week = week_start + Duration::days(7);

    let base = match get_config(pool, house_id, next_week).await? {
        Some(config) => config.points_target_per_person,
        None => base_target,
    };

    let inputs: Vec<(Uuid, i64, i64)> = scores
        .iter()
        .map(|s| (s.user_id, s.points_target, s.points_earned))
        .collect();
    let outcomes = next_week_targets(&inputs, base);

    upsert_config(
        pool,
        house_id,
        &UpsertWeeklyConfigRequest {
            week_start_date: next_week,
            points_target_per_person: base,
        },
    )
    .await?;

    let now = Utc::now();
    for outcome in &outcomes {
        sqlx::query(
            r#"
            INSERT INTO weekly_scores
                (id, house_id, user_id, week_start_date, points_target, points_earned, points_carried_over, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, 0, ?, ?, ?)
            ON CONFLICT (house_id, user_id, week_start_date)
            DO UPDATE SET points_target = excluded.points_target,
                          points_earned = excluded.points_earned,
                          points_carried_over = excluded.points_carried_over,
                          updated_at = excluded.updated_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(house_id.to_string())
        .bind(outcome.user_id.to_string())
        .bind(next_week)
        .bind(outcome.next_target)
        .bind(outcome.carried_over)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;
    }

    Ok(outcomes)
}

pub async fn get_week_scores(
    pool: &SqlitePool,
    house_id: &Uuid,
    week_start: NaiveDate,
) -> Result<Vec<WeeklyScore>, WeekEndError> {
    let rows: Vec<WeeklyScoreRow> = sqlx::query_as(
        r#"
        SELECT ws.* FROM weekly_scores ws
        JOIN users u ON u.id = ws.user_id
        WHERE ws.house_id = ? AND ws.week_start_date = ?
        ORDER BY u.created_at ASC, u.id ASC
        "#,
    )
    .bind(house_id.to_string())
    .bind(week_start)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.to_shared()).collect())
}

pub async fn get_config(
    pool: &SqlitePool,
    house_id: &Uuid,
    week_start: NaiveDate,
) -> Result<Option<WeeklyConfig>, WeekEndError> {
    let row: Option<WeeklyConfigRow> =
        sqlx::query_as("SELECT * FROM weekly_config WHERE house_id = ? AND week_start_date = ?")
            .bind(house_id.to_string())
            .bind(week_start)
            .fetch_optional(pool)
            .await?;

    Ok(row.map(|r| r.to_shared()))
}

pub async fn upsert_config(
    pool: &SqlitePool,
    house_id: &Uuid,
    request: &UpsertWeeklyConfigRequest,
) -> Result<WeeklyConfig, WeekEndError> {
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO weekly_config (id, house_id, week_start_date, points_target_per_person, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT (house_id, week_start_date)
        DO UPDATE SET points_target_per_person = excluded.points_target_per_person,
                      updated_at = excluded.updated_at
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(house_id.to_string())
    .bind(request.week_start_date)
    .bind(request.points_target_per_person)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    let row: WeeklyConfigRow =
        sqlx::query_as("SELECT * FROM weekly_config WHERE house_id = ? AND week_start_date = ?")
            .bind(house_id.to_string())
            .bind(request.week_start_date)
            .fetch_one(pool)
            .await?;

    Ok(row.to_shared())
}
