use std::collections::{HashMap, HashSet};

use chrono::{Duration, NaiveDate, Utc};
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{HouseRow, TaskGroupRow, WeeklyAssignmentRow};
use crate::services::{houses, weeks};
use shared::{SaveAssignmentsRequest, SuggestedAssignment, WeeklyAssignment};

#[derive(Debug, Error)]
pub enum RotationError {
    #[error("House not found")]
    HouseNotFound,
    #[error("House error: {0}")]
    HouseError(#[from] houses::HouseError),
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// The rotation step itself, over ids only so it can be tested without a
/// database. `members` and `groups` must be in creation order; that ordering
/// is the whole contract.
///
/// Members already assigned this week are skipped, even if their assignment
/// row carries no group. For the rest:
/// - previous week had group g: advance to the group after g, wrapping
/// - previous row exists but its group is gone or was cleared: restart at
///   the first group
/// - no previous row: seed by member rank, rank modulo group count
pub fn compute_rotation(
    members: &[Uuid],
    groups: &[Uuid],
    existing: &HashSet<Uuid>,
    previous: &HashMap<Uuid, Option<Uuid>>,
) -> Vec<SuggestedAssignment> {
    if groups.is_empty() {
        return Vec::new();
    }

    let mut suggestions = Vec::new();

    for (rank, member) in members.iter().enumerate() {
        if existing.contains(member) {
            continue;
        }

        let group = match previous.get(member) {
            Some(Some(prev_group)) => match groups.iter().position(|g| g == prev_group) {
                Some(idx) => groups[(idx + 1) % groups.len()],
                None => groups[0],
            },
            Some(None) => groups[0],
            None => groups[rank % groups.len()],
        };

        suggestions.push(SuggestedAssignment {
            user_id: *member,
            task_group_id: group,
        });
    }

    suggestions
}

struct RotationInputs {
    members: Vec<Uuid>,
    groups: Vec<Uuid>,
    existing: HashSet<Uuid>,
    previous: HashMap<Uuid, Option<Uuid>>,
    /// The requested date snapped to the house's week start.
    week_start: NaiveDate,
}

async fn load_rotation_inputs(
    pool: &SqlitePool,
    house_id: &Uuid,
    date: NaiveDate,
) -> Result<RotationInputs, RotationError> {
    let house: HouseRow = sqlx::query_as("SELECT * FROM houses WHERE id = ?")
        .bind(house_id.to_string())
        .fetch_optional(pool)
        .await?
        .ok_or(RotationError::HouseNotFound)?;
    let house = house.to_shared();

    let week_start = weeks::week_start(date, house.week_start_day);

    let members: Vec<Uuid> = houses::list_members(pool, house_id)
        .await?
        .into_iter()
        .map(|u| u.id)
        .collect();

    let groups: Vec<TaskGroupRow> =
        sqlx::query_as("SELECT * FROM task_groups WHERE house_id = ? ORDER BY created_at ASC, id ASC")
            .bind(house_id.to_string())
            .fetch_all(pool)
            .await?;
    let groups: Vec<Uuid> = groups.into_iter().map(|g| g.to_shared().id).collect();

    let current = assignment_rows(pool, house_id, week_start).await?;
    let existing: HashSet<Uuid> = current.iter().map(|a| a.user_id).collect();

    // One rotation period back, in whole weeks, so the lookup always lands on
    // a week start.
    let previous_week = week_start - Duration::days(7 * i64::from(house.rotation_weeks));
    let previous: HashMap<Uuid, Option<Uuid>> = assignment_rows(pool, house_id, previous_week)
        .await?
        .into_iter()
        .map(|a| (a.user_id, a.task_group_id))
        .collect();

    Ok(RotationInputs {
        members,
        groups,
        existing,
        previous,
        week_start,
    })
}

async fn assignment_rows(
    pool: &SqlitePool,
    house_id: &Uuid,
    week_start: NaiveDate,
) -> Result<Vec<WeeklyAssignment>, RotationError> {
    let rows: Vec<WeeklyAssignmentRow> = sqlx::query_as(
        "SELECT * FROM weekly_assignments WHERE house_id = ? AND week_start_date = ?",
    )
    .bind(house_id.to_string())
    .bind(week_start)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.to_shared()).collect())
}

/// Rotate and persist assignments for the week. Running it again for the
/// same week changes nothing: every member it assigned the first time now
/// has a row and is skipped.
pub async fn assign_groups_for_week(
    pool: &SqlitePool,
    house_id: &Uuid,
    date: NaiveDate,
) -> Result<Vec<WeeklyAssignment>, RotationError> {
    let inputs = load_rotation_inputs(pool, house_id, date).await?;

    let suggestions =
        compute_rotation(&inputs.members, &inputs.groups, &inputs.existing, &inputs.previous);

    for suggestion in &suggestions {
        sqlx::query(
            r#"
            INSERT INTO weekly_assignments (id, house_id, user_id, week_start_date, task_group_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(house_id.to_string())
        .bind(suggestion.user_id.to_string())
        .bind(inputs.week_start)
        .bind(suggestion.task_group_id.to_string())
        .bind(Utc::now())
        .execute(pool)
        .await?;
    }

    get_assignments(pool, house_id, inputs.week_start).await
}

/// The choices `assign_groups_for_week` would make, without persisting them.
pub async fn suggest_assignments(
    pool: &SqlitePool,
    house_id: &Uuid,
    date: NaiveDate,
) -> Result<Vec<SuggestedAssignment>, RotationError> {
    let inputs = load_rotation_inputs(pool, house_id, date).await?;

    Ok(compute_rotation(&inputs.members, &inputs.groups, &inputs.existing, &inputs.previous))
}

pub async fn get_assignments(
    pool: &SqlitePool,
    house_id: &Uuid,
    week_start: NaiveDate,
) -> Result<Vec<WeeklyAssignment>, RotationError> {
    let rows: Vec<WeeklyAssignmentRow> = sqlx::query_as(
        r#"
        SELECT wa.* FROM weekly_assignments wa
        JOIN users u ON u.id = wa.user_id
        WHERE wa.house_id = ? AND wa.week_start_date = ?
        ORDER BY u.created_at ASC, u.id ASC
        "#,
    )
    .bind(house_id.to_string())
    .bind(week_start)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.to_shared()).collect())
}

/// Explicit manual overwrite. Unlike rotation this replaces existing rows;
/// an entry with no group clears the member's group but keeps the row, which
/// also keeps rotation from re-assigning them this week.
pub async fn save_assignments(
    pool: &SqlitePool,
    house_id: &Uuid,
    request: &SaveAssignmentsRequest,
) -> Result<Vec<WeeklyAssignment>, RotationError> {
    for entry in &request.assignments {
        sqlx::query(
            r#"
            INSERT INTO weekly_assignments (id, house_id, user_id, week_start_date, task_group_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (house_id, user_id, week_start_date)
            DO UPDATE SET task_group_id = excluded.task_group_id
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(house_id.to_string())
        .bind(entry.user_id.to_string())
        .bind(request.week_start_date)
        .bind(entry.task_group_id.map(|id| id.to_string()))
        .bind(Utc::now())
        .execute(pool)
        .await?;
    }

    get_assignments(pool, house_id, request.week_start_date).await
}

/// Drop the group from a member's assignment for the week. The row stays.
pub async fn clear_assignment(
    pool: &SqlitePool,
    house_id: &Uuid,
    user_id: &Uuid,
    week_start: NaiveDate,
) -> Result<(), RotationError> {
    sqlx::query(
        r#"
        UPDATE weekly_assignments SET task_group_id = NULL
        WHERE house_id = ? AND user_id = ? AND week_start_date = ?
        "#,
    )
    .bind(house_id.to_string())
    .bind(user_id.to_string())
    .bind(week_start)
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{
        add_member, create_group, create_house, create_user, setup_test_db,
    };
    use shared::AssignmentEntry;

    fn week() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    fn prev_week() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 8).unwrap()
    }

    #[test]
    fn test_compute_rotation_advances_and_seeds_by_rank() {
        let members = vec![Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
        let groups = vec![Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];

        // A held groups[0], B held groups[1], C is new.
        let mut previous = HashMap::new();
        previous.insert(members[0], Some(groups[0]));
        previous.insert(members[1], Some(groups[1]));

        let result = compute_rotation(&members, &groups, &HashSet::new(), &previous);

        assert_eq!(result.len(), 3);
        assert_eq!(result[0].task_group_id, groups[1]);
        assert_eq!(result[1].task_group_id, groups[2]);
        assert_eq!(result[2].task_group_id, groups[2 % 3]);
    }

    #[test]
    fn test_compute_rotation_wraps_and_restarts() {
        let members = vec![Uuid::new_v4(), Uuid::new_v4()];
        let groups = vec![Uuid::new_v4(), Uuid::new_v4()];

        let mut previous = HashMap::new();
        // Last group wraps to the first.
        previous.insert(members[0], Some(groups[1]));
        // Held a group that no longer exists.
        previous.insert(members[1], Some(Uuid::new_v4()));

        let result = compute_rotation(&members, &groups, &HashSet::new(), &previous);
        assert_eq!(result[0].task_group_id, groups[0]);
        assert_eq!(result[1].task_group_id, groups[0]);
    }

    #[test]
    fn test_compute_rotation_cleared_previous_restarts() {
        let members = vec![Uuid::new_v4()];
        let groups = vec![Uuid::new_v4(), Uuid::new_v4()];

        let mut previous = HashMap::new();
        previous.insert(members[0], None);

        let result = compute_rotation(&members, &groups, &HashSet::new(), &previous);
        assert_eq!(result[0].task_group_id, groups[0]);
    }

    #[test]
    fn test_compute_rotation_skips_assigned_and_empty_groups() {
        let members = vec![Uuid::new_v4(), Uuid::new_v4()];
        let groups = vec![Uuid::new_v4()];

        let mut existing = HashSet::new();
        existing.insert(members[0]);

        let result = compute_rotation(&members, &groups, &existing, &HashMap::new());
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].user_id, members[1]);

        assert!(compute_rotation(&members, &[], &HashSet::new(), &HashMap::new()).is_empty());
    }

    #[tokio::test]
    async fn test_assign_is_idempotent() {
        let pool = setup_test_db().await;
        let a = create_user(&pool, "a@example.com").await;
        let b = create_user(&pool, "b@example.com").await;
        let house = create_house(&pool, &a, 1, 1).await;
        add_member(&pool, &house, &a).await;
        add_member(&pool, &house, &b).await;
        let g1 = create_group(&pool, &house, "Kitchen").await;
        let g2 = create_group(&pool, &house, "Bathroom").await;

        let first = assign_groups_for_week(&pool, &house, week()).await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].task_group_id, Some(g1));
        assert_eq!(first[1].task_group_id, Some(g2));

        let second = assign_groups_for_week(&pool, &house, week()).await.unwrap();
        assert_eq!(second.len(), 2);
        assert_eq!(second[0].id, first[0].id);
        assert_eq!(second[1].id, first[1].id);
    }

    #[tokio::test]
    async fn test_assign_advances_from_previous_week() {
        let pool = setup_test_db().await;
        let a = create_user(&pool, "a@example.com").await;
        let b = create_user(&pool, "b@example.com").await;
        let house = create_house(&pool, &a, 1, 1).await;
        add_member(&pool, &house, &a).await;
        add_member(&pool, &house, &b).await;
        let g1 = create_group(&pool, &house, "Kitchen").await;
        let g2 = create_group(&pool, &house, "Bathroom").await;

        assign_groups_for_week(&pool, &house, prev_week()).await.unwrap();
        let this_week = assign_groups_for_week(&pool, &house, week()).await.unwrap();

        assert_eq!(this_week[0].task_group_id, Some(g2));
        assert_eq!(this_week[1].task_group_id, Some(g1));
    }

    #[tokio::test]
    async fn test_rotation_period_respects_rotation_weeks() {
        let pool = setup_test_db().await;
        let a = create_user(&pool, "a@example.com").await;
        let house = create_house(&pool, &a, 1, 2).await;
        add_member(&pool, &house, &a).await;
        let g1 = create_group(&pool, &house, "Kitchen").await;
        let g2 = create_group(&pool, &house, "Bathroom").await;

        // Two weeks back is the previous period; one week back is not.
        let two_weeks_back = week() - Duration::days(14);
        let before = assign_groups_for_week(&pool, &house, two_weeks_back).await.unwrap();
        assert_eq!(before[0].task_group_id, Some(g1));

        let this_week = assign_groups_for_week(&pool, &house, week()).await.unwrap();
        assert_eq!(this_week[0].task_group_id, Some(g2));
    }

    #[tokio::test]
    async fn test_suggest_matches_assign() {
        let pool = setup_test_db().await;
        let a = create_user(&pool, "a@example.com").await;
        let b = create_user(&pool, "b@example.com").await;
        let c = create_user(&pool, "c@example.com").await;
        let house = create_house(&pool, &a, 1, 1).await;
        for user in [&a, &b, &c] {
            add_member(&pool, &house, user).await;
        }
        create_group(&pool, &house, "Kitchen").await;
        create_group(&pool, &house, "Bathroom").await;
        create_group(&pool, &house, "Floors").await;
        assign_groups_for_week(&pool, &house, prev_week()).await.unwrap();

        let suggested = suggest_assignments(&pool, &house, week()).await.unwrap();
        let assigned = assign_groups_for_week(&pool, &house, week()).await.unwrap();

        assert_eq!(suggested.len(), assigned.len());
        for (s, a) in suggested.iter().zip(&assigned) {
            assert_eq!(s.user_id, a.user_id);
            assert_eq!(Some(s.task_group_id), a.task_group_id);
        }

        // Suggesting never persists.
        let still_suggested = suggest_assignments(&pool, &house, prev_week()).await.unwrap();
        assert!(still_suggested.is_empty());
    }

    #[tokio::test]
    async fn test_mid_week_date_snaps_to_week_start() {
        let pool = setup_test_db().await;
        let a = create_user(&pool, "a@example.com").await;
        let house = create_house(&pool, &a, 1, 1).await;
        add_member(&pool, &house, &a).await;
        create_group(&pool, &house, "Kitchen").await;

        // Wednesday resolves to the Monday week; re-running on Monday is a no-op.
        let wednesday = NaiveDate::from_ymd_opt(2024, 1, 17).unwrap();
        let assigned = assign_groups_for_week(&pool, &house, wednesday).await.unwrap();
        assert_eq!(assigned[0].week_start_date, week());

        let again = assign_groups_for_week(&pool, &house, week()).await.unwrap();
        assert_eq!(again[0].id, assigned[0].id);
    }

    #[tokio::test]
    async fn test_no_groups_is_a_no_op() {
        let pool = setup_test_db().await;
        let a = create_user(&pool, "a@example.com").await;
        let house = create_house(&pool, &a, 1, 1).await;
        add_member(&pool, &house, &a).await;

        let assigned = assign_groups_for_week(&pool, &house, week()).await.unwrap();
        assert!(assigned.is_empty());
    }

    #[tokio::test]
    async fn test_save_overwrites_and_clear_keeps_row() {
        let pool = setup_test_db().await;
        let a = create_user(&pool, "a@example.com").await;
        let house = create_house(&pool, &a, 1, 1).await;
        add_member(&pool, &house, &a).await;
        let g1 = create_group(&pool, &house, "Kitchen").await;
        let g2 = create_group(&pool, &house, "Bathroom").await;

        let rotated = assign_groups_for_week(&pool, &house, week()).await.unwrap();
        assert_eq!(rotated[0].task_group_id, Some(g1));

        let saved = save_assignments(
            &pool,
            &house,
            &SaveAssignmentsRequest {
                week_start_date: week(),
                assignments: vec![AssignmentEntry {
                    user_id: a,
                    task_group_id: Some(g2),
                }],
            },
        )
        .await
        .unwrap();
        assert_eq!(saved[0].task_group_id, Some(g2));

        clear_assignment(&pool, &house, &a, week()).await.unwrap();
        let after = get_assignments(&pool, &house, week()).await.unwrap();
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].task_group_id, None);

        // The cleared row still blocks rotation from re-assigning.
        let again = assign_groups_for_week(&pool, &house, week()).await.unwrap();
        assert_eq!(again[0].task_group_id, None);
    }
}
