use std::str::FromStr;

use anyhow::Result;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

pub type DB = SqlitePool;

/// Idempotent schema. Session rows fan out into per-exercise and per-set
/// child rows, cascade-deleted with their session.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS workouts (
        id          TEXT PRIMARY KEY,
        title       TEXT NOT NULL UNIQUE,
        description TEXT,
        created_at  TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS workout_exercises (
        id          TEXT PRIMARY KEY,
        workout_id  TEXT NOT NULL REFERENCES workouts(id) ON DELETE CASCADE,
        order_index INTEGER NOT NULL,
        name        TEXT NOT NULL,
        sets        INTEGER NOT NULL,
        reps        TEXT,
        rest        TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sessions (
        id               TEXT PRIMARY KEY,
        owner            TEXT NOT NULL,
        workout_id       TEXT NOT NULL,
        workout_title    TEXT NOT NULL,
        state            TEXT NOT NULL,
        start_time       TEXT NOT NULL,
        end_time         TEXT,
        current_exercise INTEGER NOT NULL DEFAULT 0,
        current_set      INTEGER NOT NULL DEFAULT 0,
        elapsed_seconds  INTEGER NOT NULL DEFAULT 0,
        rest_remaining   INTEGER NOT NULL DEFAULT 0,
        total_duration   INTEGER NOT NULL DEFAULT 0,
        calories_burned  INTEGER NOT NULL DEFAULT 0,
        notes            TEXT,
        rating           INTEGER,
        difficulty       TEXT
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_sessions_owner_state ON sessions(owner, state)",
    r#"
    CREATE TABLE IF NOT EXISTS session_exercises (
        id             TEXT PRIMARY KEY,
        session_id     TEXT NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
        exercise_index INTEGER NOT NULL,
        name           TEXT NOT NULL,
        rest           TEXT NOT NULL,
        completed      INTEGER NOT NULL DEFAULT 0,
        completed_at   TEXT,
        notes          TEXT,
        UNIQUE(session_id, exercise_index)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS session_sets (
        id                  TEXT PRIMARY KEY,
        session_exercise_id TEXT NOT NULL REFERENCES session_exercises(id) ON DELETE CASCADE,
        set_number          INTEGER NOT NULL,
        reps                INTEGER NOT NULL DEFAULT 0,
        weight              REAL NOT NULL DEFAULT 0,
        duration            INTEGER NOT NULL DEFAULT 0,
        rest_time           INTEGER NOT NULL DEFAULT 0,
        completed           INTEGER NOT NULL DEFAULT 0,
        completed_at        TEXT,
        UNIQUE(session_exercise_id, set_number)
    )
    "#,
];

pub async fn open(path: &str) -> Result<DB> {
    let opts = SqliteConnectOptions::from_str(path)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(opts)
        .await?;

    init(&pool).await?;
    Ok(pool)
}

/// Create any missing tables. Safe to run on every open.
pub async fn init(pool: &DB) -> Result<()> {
    for stmt in SCHEMA {
        sqlx::query(stmt).execute(pool).await?;
    }

    Ok(())
}
