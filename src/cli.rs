use clap::{Args, Parser, Subcommand};

use crate::models::{Difficulty, SessionState};

#[derive(Parser)]
#[command(name = "ferrum", version, about = "CLI workout session tracker")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Emit machine-readable JSON instead of colorful text.
    #[arg(global = true, long)]
    pub json: bool,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Session-scoped commands
    #[command(subcommand, visible_alias = "s")]
    Session(SessionCmd),

    /// Workout definition management
    #[command(subcommand, visible_alias = "w")]
    Workout(WorkoutCmd),

    /// View or edit ferrum config
    #[command(subcommand)]
    Config(ConfigCmd),
}

//
// Commands
//

#[derive(Subcommand)]
pub enum SessionCmd {
    /// Start a session from a stored workout
    #[command(visible_alias = "s")]
    Start(StartArgs),

    /// Log the current set and advance - Usage: session set [REPS] [WEIGHT] [DURATION]
    #[command(override_usage = "session set [REPS] [WEIGHT] [DURATION]")]
    Set {
        /// Reps performed (defaults to 0)
        #[arg(value_name = "REPS")]
        reps: Option<i64>,

        /// Weight in kg (defaults to 0)
        #[arg(value_name = "WEIGHT")]
        weight: Option<f64>,

        /// Set duration in seconds (defaults to 0)
        #[arg(value_name = "DURATION")]
        duration: Option<i64>,

        /// Rest actually taken before this set, in seconds
        #[arg(long, short = 'r')]
        rest: Option<i64>,

        /// Exercise position (1-based; defaults to the current one)
        #[arg(long, short = 'e')]
        exercise: Option<usize>,

        /// Set position (1-based; defaults to the current one)
        #[arg(long, short = 's')]
        set: Option<usize>,
    },

    /// Close out an exercise without logging its remaining sets
    #[command(visible_alias = "d")]
    Done {
        /// 1-based exercise position (same order shown in `session show`)
        #[arg(value_name = "EX_IDX")]
        exercise: usize,

        /// Free-form note on the exercise
        #[arg(long, short = 'n')]
        note: Option<String>,
    },

    /// Pause the workout clock
    Pause,

    /// Resume a paused session
    Resume,

    /// Skip the current rest countdown
    #[command(visible_alias = "sk")]
    Skip,

    /// Finish the session and record summary data
    #[command(visible_alias = "f")]
    Finish {
        /// Free-form session notes
        #[arg(long, short = 'n')]
        notes: Option<String>,

        /// Satisfaction rating, 1-5
        #[arg(long, short = 'r')]
        rating: Option<i64>,

        /// How the workout felt
        #[arg(long, short = 'd', value_enum)]
        difficulty: Option<Difficulty>,

        /// Estimated calories burned
        #[arg(long, short = 'c')]
        calories: Option<i64>,
    },

    /// Cancel the current session, keeping partial progress in history
    #[command(visible_alias = "c")]
    Cancel,

    /// Show the active session
    #[command(visible_alias = "i")]
    Show,

    /// List past sessions
    #[command(visible_alias = "h")]
    History {
        /// Page to show (1-based)
        #[arg(long, default_value = "1")]
        page: i64,

        /// Sessions per page
        #[arg(long, default_value = "10")]
        page_size: i64,

        /// Filter by state
        #[arg(long, value_enum)]
        status: Option<SessionState>,
    },

    /// Run the live workout/rest clocks until interrupted
    #[command(visible_alias = "t")]
    Watch,
}

#[derive(Args)]
pub struct StartArgs {
    /// Workout index (from `workout list`) or exact title
    pub workout: String,
}

#[derive(Subcommand)]
pub enum WorkoutCmd {
    /// Import one or more workout TOML files
    #[command(visible_alias = "i")]
    Import {
        /// Paths to TOML files with [[workout]] entries
        files: Vec<String>,
    },

    /// List workouts
    #[command(visible_alias = "l")]
    List,

    /// Show a single workout in detail
    #[command(visible_alias = "s")]
    Show {
        /// Workout index (from `workout list`) or exact title
        workout: String,
    },

    /// Delete a workout
    #[command(visible_alias = "d")]
    Delete {
        /// Workout index (from `workout list`) or exact title
        workout: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Show all config keys
    List,

    /// Get the value of a key
    Get { key: String },

    /// Set or override a key
    Set { key: String, val: String },

    /// Remove a key
    Unset { key: String },
}
