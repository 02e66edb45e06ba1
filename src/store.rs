//! Session and workout persistence.
//!
//! Plain sqlx queries over the sqlite schema in `db.rs`. Sessions load and
//! persist as a whole: the tracker mutates the in-memory `Session`, and a
//! successful transition is written back in one transaction. A rejected
//! operation never touches the database.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Local};
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::models::{ExerciseProgress, Session, SessionState, SetRecord, WorkoutDef, WorkoutExercise};
use crate::tracker::{SessionError, SessionTracker};

fn ts(t: DateTime<Local>) -> String {
    t.to_rfc3339()
}

fn parse_ts(raw: &str) -> Result<DateTime<Local>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("bad timestamp in database: `{}`", raw))?
        .with_timezone(&Local))
}

/// Start a session for `owner`, enforcing the one-in-progress-session rule,
/// and write the full skeleton in one transaction. The conflict and any
/// validation failure surface as [`SessionError`] inside the error chain.
pub async fn start_session(
    pool: &SqlitePool,
    owner: &str,
    workout: &WorkoutDef,
) -> Result<Session> {
    if let Some(active) = find_active(pool, owner).await? {
        return Err(SessionError::Conflict(active.id).into());
    }

    let session = SessionTracker::start(owner, workout)?.into_session();

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO sessions
        (id, owner, workout_id, workout_title, state, start_time, end_time,
         current_exercise, current_set, elapsed_seconds, rest_remaining,
         total_duration, calories_burned, notes, rating, difficulty)
        VALUES (?, ?, ?, ?, ?, ?, NULL, 0, 0, 0, 0, 0, 0, NULL, NULL, NULL)
        "#,
    )
    .bind(&session.id)
    .bind(&session.owner)
    .bind(&session.workout_id)
    .bind(&session.workout_title)
    .bind(session.state.to_string())
    .bind(ts(session.start_time))
    .execute(&mut *tx)
    .await?;

    for exercise in &session.exercises {
        let exercise_row_id = Uuid::new_v4().to_string();
        sqlx::query(
            r#"
            INSERT INTO session_exercises (id, session_id, exercise_index, name, rest)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&exercise_row_id)
        .bind(&session.id)
        .bind(exercise.exercise_index as i64)
        .bind(&exercise.name)
        .bind(&exercise.rest)
        .execute(&mut *tx)
        .await?;

        for set in &exercise.sets {
            sqlx::query(
                "INSERT INTO session_sets (id, session_exercise_id, set_number) VALUES (?, ?, ?)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&exercise_row_id)
            .bind(set.set_number)
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;
    Ok(session)
}

/// The owner's in-progress session (`active`, `resting` or `paused`), if any.
pub async fn find_active(pool: &SqlitePool, owner: &str) -> Result<Option<Session>> {
    let id: Option<String> = sqlx::query_scalar(
        r#"
        SELECT id FROM sessions
        WHERE owner = ? AND state IN ('active', 'resting', 'paused')
        ORDER BY start_time DESC
        LIMIT 1
        "#,
    )
    .bind(owner)
    .fetch_optional(pool)
    .await?;

    match id {
        Some(id) => load_session(pool, &id).await,
        None => Ok(None),
    }
}

/// The session `finish` should target: the in-progress one, or a session
/// whose progression has ended but whose summary was never recorded.
pub async fn find_finishable(pool: &SqlitePool, owner: &str) -> Result<Option<Session>> {
    let id: Option<String> = sqlx::query_scalar(
        r#"
        SELECT id FROM sessions
        WHERE owner = ?
          AND (state IN ('active', 'resting', 'paused')
               OR (state = 'completed' AND end_time IS NULL))
        ORDER BY start_time DESC
        LIMIT 1
        "#,
    )
    .bind(owner)
    .fetch_optional(pool)
    .await?;

    match id {
        Some(id) => load_session(pool, &id).await,
        None => Ok(None),
    }
}

/// Load a full session (exercises and sets included) by id.
pub async fn load_session(pool: &SqlitePool, id: &str) -> Result<Option<Session>> {
    let Some(row) = sqlx::query(
        r#"
        SELECT owner, workout_id, workout_title, state, start_time, end_time,
               current_exercise, current_set, elapsed_seconds, rest_remaining,
               total_duration, calories_burned, notes, rating, difficulty
        FROM sessions
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    else {
        return Ok(None);
    };

    let state: String = row.try_get("state")?;
    let start_time: String = row.try_get("start_time")?;
    let end_time: Option<String> = row.try_get("end_time")?;

    let mut session = Session {
        id: id.to_string(),
        owner: row.try_get("owner")?,
        workout_id: row.try_get("workout_id")?,
        workout_title: row.try_get("workout_title")?,
        state: state.parse::<SessionState>().map_err(|e| anyhow!(e))?,
        start_time: parse_ts(&start_time)?,
        end_time: end_time.as_deref().map(parse_ts).transpose()?,
        current_exercise: row.try_get::<i64, _>("current_exercise")? as usize,
        current_set: row.try_get::<i64, _>("current_set")? as usize,
        elapsed_seconds: row.try_get("elapsed_seconds")?,
        rest_remaining: row.try_get("rest_remaining")?,
        exercises: Vec::new(),
        total_duration: row.try_get("total_duration")?,
        calories_burned: row.try_get("calories_burned")?,
        notes: row.try_get("notes")?,
        rating: row.try_get("rating")?,
        difficulty: row
            .try_get::<Option<String>, _>("difficulty")?
            .as_deref()
            .map(|d| d.parse().map_err(|e: String| anyhow!(e)))
            .transpose()?,
    };

    let exercise_rows = sqlx::query_as::<_, (i64, String, String, bool, Option<String>, Option<String>)>(
        r#"
        SELECT exercise_index, name, rest, completed, completed_at, notes
        FROM session_exercises
        WHERE session_id = ?
        ORDER BY exercise_index
        "#,
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    for (exercise_index, name, rest, completed, completed_at, notes) in exercise_rows {
        session.exercises.push(ExerciseProgress {
            exercise_index: exercise_index as usize,
            name,
            rest,
            sets: Vec::new(),
            completed,
            completed_at: completed_at.as_deref().map(parse_ts).transpose()?,
            notes,
        });
    }

    let set_rows = sqlx::query_as::<_, (i64, i64, i64, f64, i64, i64, bool, Option<String>)>(
        r#"
        SELECT se.exercise_index, ss.set_number, ss.reps, ss.weight,
               ss.duration, ss.rest_time, ss.completed, ss.completed_at
        FROM session_sets ss
        JOIN session_exercises se ON se.id = ss.session_exercise_id
        WHERE se.session_id = ?
        ORDER BY se.exercise_index, ss.set_number
        "#,
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    for (exercise_index, set_number, reps, weight, duration, rest_time, completed, completed_at) in
        set_rows
    {
        let exercise = session
            .exercises
            .get_mut(exercise_index as usize)
            .ok_or_else(|| anyhow!("orphaned set row for session {}", id))?;

        exercise.sets.push(SetRecord {
            set_number,
            reps,
            weight,
            duration,
            rest_time,
            completed,
            completed_at: completed_at.as_deref().map(parse_ts).transpose()?,
        });
    }

    Ok(Some(session))
}

/// Write the session back in one transaction: scalar fields plus every
/// exercise and set row.
pub async fn persist(pool: &SqlitePool, session: &Session) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        UPDATE sessions
        SET state = ?, end_time = ?, current_exercise = ?, current_set = ?,
            elapsed_seconds = ?, rest_remaining = ?, total_duration = ?,
            calories_burned = ?, notes = ?, rating = ?, difficulty = ?
        WHERE id = ?
        "#,
    )
    .bind(session.state.to_string())
    .bind(session.end_time.map(ts))
    .bind(session.current_exercise as i64)
    .bind(session.current_set as i64)
    .bind(session.elapsed_seconds)
    .bind(session.rest_remaining)
    .bind(session.total_duration)
    .bind(session.calories_burned)
    .bind(&session.notes)
    .bind(session.rating)
    .bind(session.difficulty.map(|d| d.to_string()))
    .bind(&session.id)
    .execute(&mut *tx)
    .await?;

    for exercise in &session.exercises {
        sqlx::query(
            r#"
            UPDATE session_exercises
            SET completed = ?, completed_at = ?, notes = ?
            WHERE session_id = ? AND exercise_index = ?
            "#,
        )
        .bind(exercise.completed)
        .bind(exercise.completed_at.map(ts))
        .bind(&exercise.notes)
        .bind(&session.id)
        .bind(exercise.exercise_index as i64)
        .execute(&mut *tx)
        .await?;

        for set in &exercise.sets {
            sqlx::query(
                r#"
                UPDATE session_sets
                SET reps = ?, weight = ?, duration = ?, rest_time = ?,
                    completed = ?, completed_at = ?
                WHERE session_exercise_id = (
                    SELECT id FROM session_exercises
                    WHERE session_id = ? AND exercise_index = ?
                )
                AND set_number = ?
                "#,
            )
            .bind(set.reps)
            .bind(set.weight)
            .bind(set.duration)
            .bind(set.rest_time)
            .bind(set.completed)
            .bind(set.completed_at.map(ts))
            .bind(&session.id)
            .bind(exercise.exercise_index as i64)
            .bind(set.set_number)
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;
    Ok(())
}

/// One row of `session history`.
#[derive(Debug, Serialize)]
pub struct SessionSummary {
    pub id: String,
    pub workout_title: String,
    pub state: SessionState,
    pub start_time: DateTime<Local>,
    pub total_duration: i64,
    pub completed_sets: i64,
    pub total_sets: i64,
}

/// A page of past sessions plus pagination bookkeeping.
#[derive(Debug, Serialize)]
pub struct HistoryPage {
    pub sessions: Vec<SessionSummary>,
    pub page: i64,
    pub pages: i64,
    pub total: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

/// Page through the owner's sessions, newest first, optionally filtered by
/// state.
pub async fn history(
    pool: &SqlitePool,
    owner: &str,
    page: i64,
    page_size: i64,
    status: Option<SessionState>,
) -> Result<HistoryPage> {
    let page = page.max(1);
    let page_size = page_size.max(1);
    let status = status.map(|s| s.to_string());

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sessions WHERE owner = ? AND (? IS NULL OR state = ?)",
    )
    .bind(owner)
    .bind(&status)
    .bind(&status)
    .fetch_one(pool)
    .await?;

    let rows = sqlx::query_as::<_, (String, String, String, String, i64, i64, i64)>(
        r#"
        SELECT s.id, s.workout_title, s.state, s.start_time, s.total_duration,
               (SELECT COUNT(*) FROM session_sets ss
                JOIN session_exercises se ON se.id = ss.session_exercise_id
                WHERE se.session_id = s.id AND ss.completed = 1),
               (SELECT COUNT(*) FROM session_sets ss
                JOIN session_exercises se ON se.id = ss.session_exercise_id
                WHERE se.session_id = s.id)
        FROM sessions s
        WHERE s.owner = ? AND (? IS NULL OR s.state = ?)
        ORDER BY s.start_time DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(owner)
    .bind(&status)
    .bind(&status)
    .bind(page_size)
    .bind((page - 1) * page_size)
    .fetch_all(pool)
    .await?;

    let sessions = rows
        .into_iter()
        .map(
            |(id, workout_title, state, start_time, total_duration, completed_sets, total_sets)| {
                Ok(SessionSummary {
                    id,
                    workout_title,
                    state: state.parse().map_err(|e: String| anyhow!(e))?,
                    start_time: parse_ts(&start_time)?,
                    total_duration,
                    completed_sets,
                    total_sets,
                })
            },
        )
        .collect::<Result<Vec<_>>>()?;

    let pages = (total + page_size - 1) / page_size;

    Ok(HistoryPage {
        sessions,
        page,
        pages,
        total,
        has_next: page * page_size < total,
        has_prev: page > 1,
    })
}

/// Resolve a workout by 1-based list position or exact title.
pub async fn resolve_workout(pool: &SqlitePool, key: &str) -> Result<Option<String>> {
    if let Ok(idx) = key.parse::<i64>() {
        let id = sqlx::query_scalar(
            r#"
            SELECT id
            FROM (
              SELECT id, ROW_NUMBER() OVER (ORDER BY title) AS rn
              FROM workouts
            ) t
            WHERE t.rn = ?
            "#,
        )
        .bind(idx)
        .fetch_optional(pool)
        .await?;

        Ok(id)
    } else {
        Ok(
            sqlx::query_scalar("SELECT id FROM workouts WHERE title = ?")
                .bind(key)
                .fetch_optional(pool)
                .await?,
        )
    }
}

/// Load a workout definition with its exercises in plan order.
pub async fn load_workout(pool: &SqlitePool, id: &str) -> Result<Option<WorkoutDef>> {
    let Some((title, description)) = sqlx::query_as::<_, (String, Option<String>)>(
        "SELECT title, description FROM workouts WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    else {
        return Ok(None);
    };

    let exercises = sqlx::query_as::<_, (String, i64, Option<String>, Option<String>)>(
        r#"
        SELECT name, sets, reps, rest
        FROM workout_exercises
        WHERE workout_id = ?
        ORDER BY order_index
        "#,
    )
    .bind(id)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(|(name, sets, reps, rest)| WorkoutExercise {
        name,
        sets,
        reps,
        rest,
    })
    .collect();

    Ok(Some(WorkoutDef {
        id: id.to_string(),
        title,
        description,
        exercises,
    }))
}

/// All workout titles, for "did you mean" suggestions.
pub async fn workout_titles(pool: &SqlitePool) -> Result<Vec<String>> {
    Ok(
        sqlx::query_scalar("SELECT title FROM workouts ORDER BY title")
            .fetch_all(pool)
            .await?,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WorkoutExercise;
    use crate::tracker::{FinishInput, SetInput};
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        // One connection keeps every query on the same in-memory database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        crate::db::init(&pool).await.unwrap();
        pool
    }

    fn def() -> WorkoutDef {
        WorkoutDef {
            id: "w-1".to_string(),
            title: "Push Day".to_string(),
            description: None,
            exercises: vec![
                WorkoutExercise {
                    name: "Bench Press".to_string(),
                    sets: 2,
                    reps: Some("8-10".to_string()),
                    rest: Some("30 sec".to_string()),
                },
                WorkoutExercise {
                    name: "Overhead Press".to_string(),
                    sets: 1,
                    reps: None,
                    rest: Some("90 sec".to_string()),
                },
            ],
        }
    }

    #[tokio::test]
    async fn start_and_reload_round_trip() {
        let pool = test_pool().await;
        let session = start_session(&pool, "default", &def()).await.unwrap();

        let loaded = load_session(&pool, &session.id).await.unwrap().unwrap();
        assert_eq!(loaded.state, SessionState::Active);
        assert_eq!(loaded.owner, "default");
        assert_eq!(loaded.workout_title, "Push Day");
        assert_eq!(loaded.exercises.len(), 2);
        assert_eq!(loaded.exercises[0].sets.len(), 2);
        assert_eq!(loaded.exercises[0].rest, "30 sec");
        assert_eq!(loaded.exercises[1].sets[0].set_number, 1);
        assert!(loaded.end_time.is_none());
        assert_eq!(loaded.start_time, session.start_time);
    }

    #[tokio::test]
    async fn second_start_conflicts_and_leaves_the_first_alone() {
        let pool = test_pool().await;
        let first = start_session(&pool, "default", &def()).await.unwrap();

        let err = start_session(&pool, "default", &def()).await.unwrap_err();
        match err.downcast_ref::<SessionError>() {
            Some(SessionError::Conflict(id)) => assert_eq!(id, &first.id),
            other => panic!("expected a conflict, got {:?}", other),
        }

        let reloaded = load_session(&pool, &first.id).await.unwrap().unwrap();
        assert_eq!(reloaded.state, SessionState::Active);

        // A different owner is not blocked.
        start_session(&pool, "guest", &def()).await.unwrap();
    }

    #[tokio::test]
    async fn start_is_allowed_again_after_cancel() {
        let pool = test_pool().await;
        let session = start_session(&pool, "default", &def()).await.unwrap();

        let mut tracker = SessionTracker::resume_from(session);
        tracker.cancel().unwrap();
        persist(&pool, tracker.session()).await.unwrap();

        assert!(find_active(&pool, "default").await.unwrap().is_none());
        start_session(&pool, "default", &def()).await.unwrap();
    }

    #[tokio::test]
    async fn persist_round_trips_mutations() {
        let pool = test_pool().await;
        let session = start_session(&pool, "default", &def()).await.unwrap();
        let id = session.id.clone();

        let mut tracker = SessionTracker::resume_from(session);
        tracker
            .complete_set(
                0,
                0,
                SetInput {
                    reps: 10,
                    weight: 52.5,
                    duration: 45,
                    rest_time: 0,
                },
            )
            .unwrap();
        persist(&pool, tracker.session()).await.unwrap();

        let loaded = load_session(&pool, &id).await.unwrap().unwrap();
        assert_eq!(loaded.state, SessionState::Resting);
        assert_eq!(loaded.rest_remaining, 30);
        assert_eq!((loaded.current_exercise, loaded.current_set), (0, 1));
        let set = &loaded.exercises[0].sets[0];
        assert!(set.completed);
        assert_eq!(set.reps, 10);
        assert_eq!(set.weight, 52.5);
        assert!(set.completed_at.is_some());
        assert!(!loaded.exercises[0].sets[1].completed);

        let active = find_active(&pool, "default").await.unwrap().unwrap();
        assert_eq!(active.id, id);
    }

    #[tokio::test]
    async fn terminal_advance_is_still_reachable_for_finish() {
        let pool = test_pool().await;
        let session = start_session(&pool, "default", &def()).await.unwrap();
        let id = session.id.clone();

        // Log every planned set; the progression ends without a summary.
        let mut tracker = SessionTracker::resume_from(session);
        for (ex, set) in [(0, 0), (0, 1), (1, 0)] {
            if tracker.session().state == SessionState::Resting {
                tracker.skip_rest().unwrap();
            }
            tracker.complete_set(ex, set, SetInput::default()).unwrap();
        }
        assert_eq!(tracker.session().state, SessionState::Completed);
        persist(&pool, tracker.session()).await.unwrap();

        // Not active any more, but finish can still find it.
        assert!(find_active(&pool, "default").await.unwrap().is_none());
        let finishable = find_finishable(&pool, "default").await.unwrap().unwrap();
        assert_eq!(finishable.id, id);

        let mut tracker = SessionTracker::resume_from(finishable);
        tracker.complete(FinishInput::default()).unwrap();
        persist(&pool, tracker.session()).await.unwrap();

        assert!(find_finishable(&pool, "default").await.unwrap().is_none());
        let reloaded = load_session(&pool, &id).await.unwrap().unwrap();
        assert!(reloaded.end_time.is_some());
    }

    #[tokio::test]
    async fn history_paginates_and_filters() {
        let pool = test_pool().await;

        // Three finished sessions: cancelled, completed, completed.
        for finish in [false, true, true] {
            let session = start_session(&pool, "default", &def()).await.unwrap();
            let mut tracker = SessionTracker::resume_from(session);
            if finish {
                tracker.complete(FinishInput::default()).unwrap();
            } else {
                tracker.cancel().unwrap();
            }
            persist(&pool, tracker.session()).await.unwrap();
        }

        let page = history(&pool, "default", 1, 2, None).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.pages, 2);
        assert_eq!(page.sessions.len(), 2);
        assert!(page.has_next);
        assert!(!page.has_prev);

        let page = history(&pool, "default", 2, 2, None).await.unwrap();
        assert_eq!(page.sessions.len(), 1);
        assert!(!page.has_next);
        assert!(page.has_prev);

        let completed = history(&pool, "default", 1, 10, Some(SessionState::Completed))
            .await
            .unwrap();
        assert_eq!(completed.total, 2);
        assert!(
            completed
                .sessions
                .iter()
                .all(|s| s.state == SessionState::Completed)
        );

        // Other owners see nothing.
        let empty = history(&pool, "guest", 1, 10, None).await.unwrap();
        assert_eq!(empty.total, 0);
        assert_eq!(empty.pages, 0);
    }
}
