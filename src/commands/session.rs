use std::io::Write as _;
use std::time::Duration;

use anyhow::{Context, Result};
use colored::{ColoredString, Colorize};
use itertools::Itertools;
use sqlx::SqlitePool;

use crate::{
    OutputFmt,
    cli::SessionCmd,
    models::{Difficulty, Session, SessionState},
    store,
    tracker::{FinishInput, SessionTracker, SetInput},
    types::{Config, best_title_suggestion, emit},
    utils::{format_clock, format_duration},
};

pub async fn handle(cmd: SessionCmd, pool: &SqlitePool, fmt: OutputFmt) -> Result<()> {
    let owner = Config::load()?.owner().to_string();

    match cmd {
        SessionCmd::Start(args) => start(pool, fmt, &owner, &args.workout).await,
        SessionCmd::Set {
            reps,
            weight,
            duration,
            rest,
            exercise,
            set,
        } => log_set(pool, fmt, &owner, reps, weight, duration, rest, exercise, set).await,
        SessionCmd::Done { exercise, note } => done(pool, fmt, &owner, exercise, note).await,
        SessionCmd::Pause => pause(pool, fmt, &owner).await,
        SessionCmd::Resume => resume(pool, fmt, &owner).await,
        SessionCmd::Skip => skip(pool, fmt, &owner).await,
        SessionCmd::Finish {
            notes,
            rating,
            difficulty,
            calories,
        } => finish(pool, fmt, &owner, notes, rating, difficulty, calories).await,
        SessionCmd::Cancel => cancel(pool, fmt, &owner).await,
        SessionCmd::Show => show(pool, fmt, &owner).await,
        SessionCmd::History {
            page,
            page_size,
            status,
        } => history(pool, fmt, &owner, page, page_size, status).await,
        SessionCmd::Watch => watch(pool, &owner).await,
    }
}

/// The owner's in-progress session, reporting when there is none.
async fn active_session(pool: &SqlitePool, owner: &str) -> Result<Option<Session>> {
    let session = store::find_active(pool, owner).await?;
    if session.is_none() {
        println!("{} no active session", "error:".red().bold());
    }

    Ok(session)
}

/// Convert a 1-based CLI position, falling back to `default`.
fn one_based(arg: Option<usize>, default: usize, what: &str) -> Option<usize> {
    match arg {
        Some(0) => {
            println!("{} {} position must be ≥ 1", "error:".red().bold(), what);
            None
        }
        Some(n) => Some(n - 1),
        None => Some(default),
    }
}

fn state_label(state: SessionState) -> ColoredString {
    match state {
        SessionState::Ready => "ready".normal(),
        SessionState::Active => "active".green().bold(),
        SessionState::Resting => "resting".blue().bold(),
        SessionState::Paused => "paused".yellow().bold(),
        SessionState::Completed => "completed".green(),
        SessionState::Cancelled => "cancelled".red(),
    }
}

async fn start(pool: &SqlitePool, fmt: OutputFmt, owner: &str, key: &str) -> Result<()> {
    let Some(workout_id) = store::resolve_workout(pool, key).await? else {
        let titles = store::workout_titles(pool).await?;
        match best_title_suggestion(key, &titles) {
            Some(sug) => println!(
                "{} no workout named `{}` -- did you mean `{}`?",
                "error:".red().bold(),
                key,
                sug.green()
            ),
            None => println!(
                "{} no workout named `{}` (see `workout list`)",
                "error:".red().bold(),
                key
            ),
        }
        return Ok(());
    };

    let workout = store::load_workout(pool, &workout_id)
        .await?
        .context("workout row disappeared while starting")?;

    match store::start_session(pool, owner, &workout).await {
        Ok(session) => {
            if !emit(fmt, &session) {
                println!("{}", "Exercises:".cyan().bold());
                for (i, ex) in workout.exercises.iter().enumerate() {
                    let idx = format!("{}", i + 1).yellow();
                    let reps = ex
                        .reps
                        .as_deref()
                        .map(|r| format!(" ({})", r))
                        .unwrap_or_default();
                    println!(
                        "{} • {} — {} sets{} | rest {}",
                        idx,
                        ex.name.bold(),
                        ex.sets.max(1),
                        reps.dimmed(),
                        ex.rest.as_deref().unwrap_or("60 sec").dimmed()
                    );
                }

                println!(
                    "\n{} session started (id: {})",
                    "ok:".green().bold(),
                    session.id
                );
            }
        }
        Err(e) => println!("{} {}", "error:".red().bold(), e),
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn log_set(
    pool: &SqlitePool,
    fmt: OutputFmt,
    owner: &str,
    reps: Option<i64>,
    weight: Option<f64>,
    duration: Option<i64>,
    rest: Option<i64>,
    exercise: Option<usize>,
    set: Option<usize>,
) -> Result<()> {
    let Some(session) = active_session(pool, owner).await? else {
        return Ok(());
    };
    let mut tracker = SessionTracker::resume_from(session);

    let Some(exercise_idx) = one_based(exercise, tracker.session().current_exercise, "exercise")
    else {
        return Ok(());
    };
    let Some(set_idx) = one_based(set, tracker.session().current_set, "set") else {
        return Ok(());
    };

    // Missing measurements become zero: logging beats validation mid-workout.
    let input = SetInput {
        reps: reps.unwrap_or(0),
        weight: weight.unwrap_or(0.0),
        duration: duration.unwrap_or(0),
        rest_time: rest.unwrap_or(0),
    };

    match tracker.complete_set(exercise_idx, set_idx, input) {
        Ok(()) => {
            store::persist(pool, tracker.session()).await?;
            let s = tracker.session();
            if !emit(fmt, s) {
                match s.state {
                    SessionState::Resting => println!(
                        "{} set {} logged — rest {} (skip with `session skip`)",
                        "ok:".green().bold(),
                        set_idx + 1,
                        format_clock(s.rest_remaining)
                    ),
                    SessionState::Completed => println!(
                        "{} all sets done — `session finish` to wrap up",
                        "ok:".green().bold()
                    ),
                    _ => println!("{} set {} logged", "ok:".green().bold(), set_idx + 1),
                }
            }
        }
        Err(e) => println!("{} {}", "error:".red().bold(), e),
    }

    Ok(())
}

async fn done(
    pool: &SqlitePool,
    fmt: OutputFmt,
    owner: &str,
    exercise: usize,
    note: Option<String>,
) -> Result<()> {
    let Some(session) = active_session(pool, owner).await? else {
        return Ok(());
    };
    let mut tracker = SessionTracker::resume_from(session);

    let Some(exercise_idx) = one_based(Some(exercise), 0, "exercise") else {
        return Ok(());
    };

    match tracker.complete_exercise(exercise_idx, note) {
        Ok(()) => {
            store::persist(pool, tracker.session()).await?;
            let s = tracker.session();
            if !emit(fmt, s) {
                match s.state {
                    SessionState::Completed => println!(
                        "{} last exercise closed out — `session finish` to wrap up",
                        "ok:".green().bold()
                    ),
                    _ => println!(
                        "{} exercise {} closed out — on to `{}`",
                        "ok:".green().bold(),
                        exercise_idx + 1,
                        s.exercises[s.current_exercise].name.bold()
                    ),
                }
            }
        }
        Err(e) => println!("{} {}", "error:".red().bold(), e),
    }

    Ok(())
}

async fn pause(pool: &SqlitePool, fmt: OutputFmt, owner: &str) -> Result<()> {
    let Some(session) = active_session(pool, owner).await? else {
        return Ok(());
    };
    let mut tracker = SessionTracker::resume_from(session);

    match tracker.pause() {
        Ok(()) => {
            store::persist(pool, tracker.session()).await?;
            if !emit(fmt, tracker.session()) {
                println!(
                    "{} paused at {}",
                    "ok:".green().bold(),
                    format_clock(tracker.session().elapsed_seconds)
                );
            }
        }
        Err(e) => println!("{} {}", "error:".red().bold(), e),
    }

    Ok(())
}

async fn resume(pool: &SqlitePool, fmt: OutputFmt, owner: &str) -> Result<()> {
    let Some(session) = active_session(pool, owner).await? else {
        return Ok(());
    };
    let mut tracker = SessionTracker::resume_from(session);

    match tracker.resume() {
        Ok(()) => {
            store::persist(pool, tracker.session()).await?;
            if !emit(fmt, tracker.session()) {
                println!("{} back to it", "ok:".green().bold());
            }
        }
        Err(e) => println!("{} {}", "error:".red().bold(), e),
    }

    Ok(())
}

async fn skip(pool: &SqlitePool, fmt: OutputFmt, owner: &str) -> Result<()> {
    let Some(session) = active_session(pool, owner).await? else {
        return Ok(());
    };
    let mut tracker = SessionTracker::resume_from(session);

    match tracker.skip_rest() {
        Ok(()) => {
            store::persist(pool, tracker.session()).await?;
            let s = tracker.session();
            if !emit(fmt, s) {
                println!(
                    "{} rest skipped — exercise {} set {}",
                    "ok:".green().bold(),
                    s.current_exercise + 1,
                    s.current_set + 1
                );
            }
        }
        Err(e) => println!("{} {}", "error:".red().bold(), e),
    }

    Ok(())
}

async fn finish(
    pool: &SqlitePool,
    fmt: OutputFmt,
    owner: &str,
    notes: Option<String>,
    rating: Option<i64>,
    difficulty: Option<Difficulty>,
    calories: Option<i64>,
) -> Result<()> {
    let Some(session) = store::find_finishable(pool, owner).await? else {
        println!("{} no session to finish", "error:".red().bold());
        return Ok(());
    };
    let mut tracker = SessionTracker::resume_from(session);

    match tracker.complete(FinishInput {
        notes,
        rating,
        difficulty,
        calories_burned: calories,
    }) {
        Ok(()) => {
            store::persist(pool, tracker.session()).await?;
            let s = tracker.session();
            if !emit(fmt, s) {
                println!("{} workout complete!", "ok:".green().bold());
                println!(
                    "  {} {}",
                    "duration:".cyan(),
                    format_duration(chrono::Duration::seconds(s.total_duration))
                );
                println!(
                    "  {} {}/{}",
                    "sets:".cyan(),
                    s.completed_sets(),
                    s.total_sets()
                );
                if let Some(r) = s.rating {
                    println!("  {} {}/5", "rating:".cyan(), r);
                }
                if let Some(d) = s.difficulty {
                    println!("  {} {}", "felt:".cyan(), d);
                }
                if s.calories_burned > 0 {
                    println!("  {} {} kcal", "calories:".cyan(), s.calories_burned);
                }
            }
        }
        Err(e) => println!("{} {}", "error:".red().bold(), e),
    }

    Ok(())
}

async fn cancel(pool: &SqlitePool, fmt: OutputFmt, owner: &str) -> Result<()> {
    let Some(session) = active_session(pool, owner).await? else {
        return Ok(());
    };
    let mut tracker = SessionTracker::resume_from(session);

    match tracker.cancel() {
        Ok(()) => {
            store::persist(pool, tracker.session()).await?;
            let s = tracker.session();
            if !emit(fmt, s) {
                println!(
                    "{} session cancelled (id: {}) — {} of {} sets kept",
                    "ok:".green().bold(),
                    s.id,
                    s.completed_sets(),
                    s.total_sets()
                );
            }
        }
        Err(e) => println!("{} {}", "error:".red().bold(), e),
    }

    Ok(())
}

async fn show(pool: &SqlitePool, fmt: OutputFmt, owner: &str) -> Result<()> {
    let Some(session) = store::find_finishable(pool, owner).await? else {
        println!("{} no active session", "error:".red().bold());
        return Ok(());
    };

    if !emit(fmt, &session) {
        render_session(&session);
    }

    Ok(())
}

fn render_session(s: &Session) {
    println!(
        "{} {} — started {} ({})",
        "Session:".cyan().bold(),
        s.workout_title.bold(),
        s.start_time.format("%Y-%m-%d %H:%M"),
        state_label(s.state)
    );
    println!(
        "  elapsed {} | sets {}/{}",
        format_clock(s.elapsed_seconds),
        s.completed_sets(),
        s.total_sets()
    );
    if s.state == SessionState::Resting {
        println!("  resting: {} left", format_clock(s.rest_remaining));
    }

    println!("\n{}", "Exercises:".cyan().bold());
    for (i, ex) in s.exercises.iter().enumerate() {
        let marker = if ex.completed {
            "✓".green()
        } else if i == s.current_exercise && s.state.is_in_progress() {
            "▶".cyan()
        } else {
            " ".normal()
        };

        println!(
            "{} {} {} {}",
            format!("{}", i + 1).yellow(),
            marker,
            ex.name.bold(),
            format!("(rest {})", ex.rest).dimmed()
        );

        for set in &ex.sets {
            if set.completed {
                let duration = if set.duration > 0 {
                    format!(" in {}", format_clock(set.duration))
                } else {
                    String::new()
                };
                println!(
                    "    Set {}: {} reps × {}kg{}",
                    set.set_number, set.reps, set.weight, duration
                );
            } else {
                println!("    Set {}: {}", set.set_number, "pending".dimmed());
            }
        }

        if let Some(n) = &ex.notes {
            println!("    note: {}", n.dimmed());
        }
    }
}

async fn history(
    pool: &SqlitePool,
    fmt: OutputFmt,
    owner: &str,
    page: i64,
    page_size: i64,
    status: Option<SessionState>,
) -> Result<()> {
    let page = store::history(pool, owner, page, page_size, status).await?;

    if emit(fmt, &page) {
        return Ok(());
    }

    if page.sessions.is_empty() {
        println!("{}", "(no sessions)".dimmed());
        return Ok(());
    }

    println!("{}", "History:".cyan().bold());
    for s in &page.sessions {
        println!(
            "{}  {}  {} | sets {}/{} | {}",
            s.start_time.format("%Y-%m-%d %H:%M"),
            state_label(s.state),
            s.workout_title.bold(),
            s.completed_sets,
            s.total_sets,
            format_duration(chrono::Duration::seconds(s.total_duration)).dimmed()
        );
    }

    let counts = page.sessions.iter().counts_by(|s| s.state);
    let summary = counts
        .iter()
        .sorted_by_key(|(state, _)| state.to_string())
        .map(|(state, n)| format!("{} {}", n, state))
        .join(", ");

    println!(
        "\npage {}/{} ({} total — {})",
        page.page,
        page.pages.max(1),
        page.total,
        summary
    );
    if page.has_next {
        println!(
            "{}",
            format!("next: session history --page {}", page.page + 1).dimmed()
        );
    }

    Ok(())
}

/// Drive both clocks at 1 Hz until interrupted. This loop is the only thing
/// that calls `tick`; every transition it causes is persisted immediately.
async fn watch(pool: &SqlitePool, owner: &str) -> Result<()> {
    let Some(session) = active_session(pool, owner).await? else {
        return Ok(());
    };
    let mut tracker = SessionTracker::resume_from(session);

    println!(
        "{} watching `{}` (ctrl-c to stop)",
        "info:".blue().bold(),
        tracker.session().workout_title.bold()
    );

    let mut interval = tokio::time::interval(Duration::from_secs(1));
    // The first tick fires immediately; swallow it so a real second passes
    // before the clocks move.
    interval.tick().await;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
            _ = interval.tick() => {
                let was_resting = tracker.session().state == SessionState::Resting;
                tracker.tick();
                store::persist(pool, tracker.session()).await?;

                let s = tracker.session();
                if was_resting && s.state == SessionState::Active {
                    println!("\r\x1b[2K{} rest over — back to work", "ok:".green().bold());
                }

                let line = match s.state {
                    SessionState::Active => format!(
                        "{} {} | exercise {}/{} set {}/{}",
                        state_label(s.state),
                        format_clock(s.elapsed_seconds),
                        s.current_exercise + 1,
                        s.exercises.len(),
                        s.current_set + 1,
                        s.exercises[s.current_exercise].sets.len()
                    ),
                    SessionState::Resting => format!(
                        "{} {} left | next up: set {}",
                        state_label(s.state),
                        format_clock(s.rest_remaining),
                        s.current_set + 1
                    ),
                    SessionState::Paused => format!(
                        "{} {} | resume with `session resume`",
                        state_label(s.state),
                        format_clock(s.elapsed_seconds)
                    ),
                    state => {
                        println!("session is {}", state);
                        break;
                    }
                };

                print!("\r\x1b[2K{}", line);
                std::io::stdout().flush()?;
            }
        }
    }

    Ok(())
}
