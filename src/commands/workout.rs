use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    OutputFmt,
    cli::WorkoutCmd,
    store,
    types::{WorkoutImport, best_title_suggestion, emit},
};

pub async fn handle(cmd: WorkoutCmd, pool: &SqlitePool, fmt: OutputFmt) -> Result<()> {
    match cmd {
        WorkoutCmd::Import { files } => {
            for file in files {
                import_file(pool, &file).await?;
            }

            Ok(())
        }
        WorkoutCmd::List => list(pool, fmt).await,
        WorkoutCmd::Show { workout } => show(pool, fmt, &workout).await,
        WorkoutCmd::Delete { workout } => delete(pool, &workout).await,
    }
}

async fn import_file(pool: &SqlitePool, file: &str) -> Result<()> {
    let path = Path::new(file);
    let toml_str = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Could not read file: `{}`", file))?;

    let import: WorkoutImport =
        toml::from_str(&toml_str).context("Failed to parse TOML: Expected `[[workout]]` entries")?;

    if import.workout.is_empty() {
        println!("{}", "warning: no [[workout]] entries found".yellow().bold());
        return Ok(());
    }

    let mut inserted = 0;
    let mut skipped = 0;

    for def in import.workout {
        if def.title.trim().is_empty() {
            println!(
                "{} skipped a workout with an empty title",
                "warning:".yellow().bold()
            );
            skipped += 1;
            continue;
        }

        if def.exercise.is_empty() {
            println!(
                "{} `{}` skipped - it has no [[workout.exercise]] entries",
                "warning:".yellow().bold(),
                def.title
            );
            skipped += 1;
            continue;
        }

        let workout_id = Uuid::new_v4().to_string();
        let res = sqlx::query(
            r#"
            INSERT INTO workouts (id, title, description, created_at)
            VALUES (?, ?, ?, datetime('now'))
            "#,
        )
        .bind(&workout_id)
        .bind(&def.title)
        .bind(def.description.as_deref().unwrap_or_default())
        .execute(pool)
        .await;

        match res {
            Ok(_) => {}
            Err(sqlx::Error::Database(db_err)) if db_err.code() == Some("2067".into()) => {
                // 2067 = SQLITE_CONSTRAINT_UNIQUE
                println!(
                    "{} `{}` already exists — use `workout list` to view all workouts",
                    "warning:".yellow().bold(),
                    def.title
                );
                skipped += 1;
                continue;
            }
            Err(e) => {
                println!("{} {}", "error:".red().bold(), e.to_string().red());
                return Err(e.into());
            }
        }

        for (order, ex) in def.exercise.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO workout_exercises (id, workout_id, order_index, name, sets, reps, rest)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&workout_id)
            .bind(order as i64)
            .bind(&ex.name)
            .bind(ex.sets)
            .bind(&ex.reps)
            .bind(&ex.rest)
            .execute(pool)
            .await?;
        }

        inserted += 1;
    }

    println!(
        "{} imported {} workout(s), skipped {}",
        "ok:".green().bold(),
        inserted,
        skipped
    );

    Ok(())
}

async fn list(pool: &SqlitePool, fmt: OutputFmt) -> Result<()> {
    let rows = sqlx::query_as::<_, (String, String, Option<String>, i64)>(
        r#"
        SELECT w.id, w.title, w.description,
               (SELECT COUNT(*) FROM workout_exercises we WHERE we.workout_id = w.id)
        FROM workouts w
        ORDER BY w.title
        "#,
    )
    .fetch_all(pool)
    .await?;

    if emit(fmt, &rows) {
        return Ok(());
    }

    if rows.is_empty() {
        println!("{}", "(no workouts - try `workout import`)".dimmed());
        return Ok(());
    }

    println!("{}", "Workouts:".cyan().bold());
    for (i, (_id, title, description, exercise_count)) in rows.iter().enumerate() {
        let desc = description
            .as_deref()
            .filter(|d| !d.is_empty())
            .map(|d| format!(" — {}", d))
            .unwrap_or_default();
        println!(
            "{} • {} — {} exercises{}",
            format!("{}", i + 1).yellow(),
            title.bold(),
            exercise_count,
            desc.dimmed()
        );
    }

    Ok(())
}

async fn show(pool: &SqlitePool, fmt: OutputFmt, key: &str) -> Result<()> {
    let Some(id) = resolve_or_suggest(pool, key).await? else {
        return Ok(());
    };

    let workout = store::load_workout(pool, &id)
        .await?
        .context("workout row disappeared")?;

    if emit(fmt, &workout) {
        return Ok(());
    }

    println!("{} {}", "Workout:".cyan().bold(), workout.title.bold());
    if let Some(desc) = workout.description.as_deref().filter(|d| !d.is_empty()) {
        println!("{}", desc.dimmed());
    }

    for (i, ex) in workout.exercises.iter().enumerate() {
        let reps = ex
            .reps
            .as_deref()
            .map(|r| format!(" ({})", r))
            .unwrap_or_default();
        println!(
            "{} • {} — {} sets{} | rest {}",
            format!("{}", i + 1).yellow(),
            ex.name.bold(),
            ex.sets.max(1),
            reps.dimmed(),
            ex.rest.as_deref().unwrap_or("60 sec").dimmed()
        );
    }

    Ok(())
}

async fn delete(pool: &SqlitePool, key: &str) -> Result<()> {
    let Some(id) = resolve_or_suggest(pool, key).await? else {
        return Ok(());
    };

    // Exercises go with the workout (cascade). Past sessions keep their
    // denormalized copies.
    sqlx::query("DELETE FROM workouts WHERE id = ?")
        .bind(&id)
        .execute(pool)
        .await?;

    println!("{} workout deleted", "ok:".green().bold());
    Ok(())
}

async fn resolve_or_suggest(pool: &SqlitePool, key: &str) -> Result<Option<String>> {
    let id = store::resolve_workout(pool, key).await?;
    if id.is_none() {
        let titles = store::workout_titles(pool).await?;
        match best_title_suggestion(key, &titles) {
            Some(sug) => println!(
                "{} no workout named `{}` -- did you mean `{}`?",
                "error:".red().bold(),
                key,
                sug.green()
            ),
            None => println!("{} no workout named `{}`", "error:".red().bold(), key),
        }
    }

    Ok(id)
}
