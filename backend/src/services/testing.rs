//! Shared fixtures for service and handler tests: an in-memory database with
//! the full schema, helpers to seed houses, members, tasks and groups, and a
//! token mint for authenticated requests.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::config::Config;
use crate::services::auth::Claims;
use shared::TaskFrequency;

pub const TEST_JWT_SECRET: &str = "test-secret";

pub fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: String::new(),
        jwt_secret: TEST_JWT_SECRET.to_string(),
        cors_origins: Vec::new(),
    }
}

/// A valid `Authorization` header value for the given user.
pub fn bearer(user_id: &Uuid) -> String {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (now + Duration::hours(1)).timestamp(),
        iat: now.timestamp(),
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .unwrap();
    format!("Bearer {token}")
}

// Creation-order rank matters to rotation, so seeded rows get strictly
// increasing timestamps instead of relying on clock resolution.
static TICK: AtomicI64 = AtomicI64::new(0);

fn next_timestamp() -> chrono::DateTime<Utc> {
    let n = TICK.fetch_add(1, Ordering::SeqCst);
    Utc::now() + Duration::milliseconds(n)
}

pub async fn setup_test_db() -> SqlitePool {
    let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();

    sqlx::raw_sql(include_str!("../../migrations/0001_initial.sql"))
        .execute(&pool)
        .await
        .unwrap();

    pool
}

pub async fn create_user(pool: &SqlitePool, email: &str) -> Uuid {
    let id = Uuid::new_v4();

    sqlx::query("INSERT INTO users (id, email, name, created_at) VALUES (?, ?, ?, ?)")
        .bind(id.to_string())
        .bind(email)
        .bind(Option::<String>::None)
        .bind(next_timestamp())
        .execute(pool)
        .await
        .unwrap();

    id
}

pub async fn create_house(
    pool: &SqlitePool,
    owner_id: &Uuid,
    week_start_day: u8,
    rotation_weeks: u32,
) -> Uuid {
    let id = Uuid::new_v4();
    let now = next_timestamp();

    sqlx::query(
        r#"
        INSERT INTO houses (id, name, owner_id, week_start_day, rotation_weeks, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind("Test house")
    .bind(owner_id.to_string())
    .bind(i64::from(week_start_day))
    .bind(i64::from(rotation_weeks))
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .unwrap();

    id
}

pub async fn add_member(pool: &SqlitePool, house_id: &Uuid, user_id: &Uuid) {
    sqlx::query("INSERT INTO house_members (id, house_id, user_id, joined_at) VALUES (?, ?, ?, ?)")
        .bind(Uuid::new_v4().to_string())
        .bind(house_id.to_string())
        .bind(user_id.to_string())
        .bind(next_timestamp())
        .execute(pool)
        .await
        .unwrap();
}

pub async fn create_task(
    pool: &SqlitePool,
    house_id: &Uuid,
    name: &str,
    points: i64,
    frequency: TaskFrequency,
    weekly_minimum: Option<i64>,
) -> Uuid {
    let id = Uuid::new_v4();
    let now = next_timestamp();

    sqlx::query(
        r#"
        INSERT INTO tasks (id, house_id, name, points, frequency, weekly_minimum, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(house_id.to_string())
    .bind(name)
    .bind(points)
    .bind(frequency.as_str())
    .bind(weekly_minimum)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .unwrap();

    id
}

pub async fn create_group(pool: &SqlitePool, house_id: &Uuid, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    let now = next_timestamp();

    sqlx::query(
        "INSERT INTO task_groups (id, house_id, name, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(id.to_string())
    .bind(house_id.to_string())
    .bind(name)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .unwrap();

    id
}
