use chrono::{DateTime, Local};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Lifecycle state of a workout session.
/// `Completed` and `Cancelled` are terminal; `Active`, `Resting` and `Paused`
/// all count as in-progress for the one-session-per-owner rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SessionState {
    Ready,
    Active,
    Resting,
    Paused,
    Completed,
    Cancelled,
}

impl SessionState {
    pub fn is_in_progress(self) -> bool {
        matches!(self, Self::Active | Self::Resting | Self::Paused)
    }
}

impl Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Ready => "ready",
            Self::Active => "active",
            Self::Resting => "resting",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        };

        write!(f, "{}", s)
    }
}

impl FromStr for SessionState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ready" => Ok(Self::Ready),
            "active" => Ok(Self::Active),
            "resting" => Ok(Self::Resting),
            "paused" => Ok(Self::Paused),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("unknown session state: `{}`", other)),
        }
    }
}

/// Perceived difficulty reported when a session is finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Difficulty {
    TooEasy,
    JustRight,
    TooHard,
}

impl Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::TooEasy => "too-easy",
            Self::JustRight => "just-right",
            Self::TooHard => "too-hard",
        };

        write!(f, "{}", s)
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "too-easy" => Ok(Self::TooEasy),
            "just-right" => Ok(Self::JustRight),
            "too-hard" => Ok(Self::TooHard),
            other => Err(format!("unknown difficulty: `{}`", other)),
        }
    }
}

/// One user's attempt at a workout, tracked from start to completion or
/// cancellation. Both clocks live here as plain fields; `tracker::SessionTracker`
/// is the only thing that advances them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub owner: String,
    pub workout_id: String,
    pub workout_title: String,
    pub state: SessionState,
    pub start_time: DateTime<Local>,
    pub end_time: Option<DateTime<Local>>,
    pub current_exercise: usize,
    pub current_set: usize,
    /// Workout clock: seconds spent in the `active` state.
    pub elapsed_seconds: i64,
    /// Rest clock: seconds left in the countdown, meaningful only while `resting`.
    pub rest_remaining: i64,
    pub exercises: Vec<ExerciseProgress>,
    /// Wall-clock span from start to end in seconds, set when the session ends.
    pub total_duration: i64,
    pub calories_burned: i64,
    pub notes: Option<String>,
    pub rating: Option<i64>,
    pub difficulty: Option<Difficulty>,
}

impl Session {
    pub fn total_sets(&self) -> usize {
        self.exercises.iter().map(|e| e.sets.len()).sum()
    }

    pub fn completed_sets(&self) -> usize {
        self.exercises
            .iter()
            .flat_map(|e| &e.sets)
            .filter(|s| s.completed)
            .count()
    }
}

/// Per-exercise subtree of a session: denormalized name and rest string plus
/// the planned sets, in workout order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseProgress {
    pub exercise_index: usize,
    pub name: String,
    /// Human rest string from the workout definition, e.g. "90 sec".
    pub rest: String,
    pub sets: Vec<SetRecord>,
    pub completed: bool,
    pub completed_at: Option<DateTime<Local>>,
    pub notes: Option<String>,
}

/// One logged set within an exercise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetRecord {
    /// 1-based position within the exercise.
    pub set_number: i64,
    pub reps: i64,
    pub weight: f64,
    pub duration: i64,
    pub rest_time: i64,
    pub completed: bool,
    pub completed_at: Option<DateTime<Local>>,
}

/// A stored workout definition that sessions start from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutDef {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub exercises: Vec<WorkoutExercise>,
}

/// One planned exercise within a workout definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutExercise {
    pub name: String,
    pub sets: i64,
    pub reps: Option<String>,
    pub rest: Option<String>,
}
