use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use strsim::jaro_winkler;

use crate::OutputFmt;

/// Resolved config file path: `<config dir>/ferrum/config.toml`.
pub static CONFIG_PATH: Lazy<Option<PathBuf>> =
    Lazy::new(|| dirs::config_dir().map(|d| d.join("ferrum").join("config.toml")));

pub const CONFIG_KEYS: [&str; 2] = ["owner", "database"];

/// Persistent CLI settings. `owner` names the profile sessions belong to;
/// `database` overrides the sqlite path.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    pub owner: Option<String>,
    pub database: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let Some(path) = CONFIG_PATH.as_ref() else {
            return Ok(Self::default());
        };

        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        toml::from_str(&raw).with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn save(&self) -> Result<()> {
        let path = CONFIG_PATH
            .as_ref()
            .context("Could not determine config directory")?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        std::fs::write(path, toml::to_string_pretty(self)?)
            .with_context(|| format!("Failed to write config: {}", path.display()))
    }

    /// Profile that owns sessions started from this machine.
    pub fn owner(&self) -> &str {
        self.owner.as_deref().unwrap_or("default")
    }

    pub fn database(&self) -> &str {
        self.database.as_deref().unwrap_or("./ferrum.db")
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            "owner" => self.owner.as_deref(),
            "database" => self.database.as_deref(),
            _ => None,
        }
    }

    pub fn set(&mut self, key: &str, val: &str) -> Result<()> {
        match key {
            "owner" => self.owner = Some(val.to_string()),
            "database" => self.database = Some(val.to_string()),
            _ => bail!("unknown config key `{}`", key),
        }

        Ok(())
    }

    /// Returns true when the key was set before.
    pub fn unset(&mut self, key: &str) -> Result<bool> {
        let prev = match key {
            "owner" => self.owner.take(),
            "database" => self.database.take(),
            _ => bail!("unknown config key `{}`", key),
        };

        Ok(prev.is_some())
    }
}

/// TOML import format: one or more `[[workout]]` tables, each with nested
/// `[[workout.exercise]]` entries.
#[derive(Deserialize)]
pub struct WorkoutImport {
    pub workout: Vec<WorkoutDefToml>,
}

#[derive(Deserialize)]
pub struct WorkoutDefToml {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub exercise: Vec<ExerciseDefToml>,
}

#[derive(Deserialize)]
pub struct ExerciseDefToml {
    pub name: String,
    pub sets: i64,
    pub reps: Option<String>,
    pub rest: Option<String>,
}

/// Return the closest known workout title for `input`
/// if similarity ≥ 0.80 *and* clearly better than the runner-up.
/// Otherwise return `None` (no suggestion shown).
pub fn best_title_suggestion<'a>(input: &str, titles: &'a [String]) -> Option<&'a str> {
    if titles.is_empty() {
        return None;
    }

    let inp = input.to_ascii_lowercase();

    // Collect (title, score) pairs.
    let mut scores: Vec<(&'a str, f64)> = titles
        .iter()
        .map(|t| (t.as_str(), jaro_winkler(&inp, &t.to_ascii_lowercase())))
        .collect();

    // Highest score first.
    scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());

    let (best_title, best_score) = scores[0];
    let second_score = scores.get(1).map(|(_, s)| *s).unwrap_or(0.0);

    const MIN_SCORE: f64 = 0.80;
    const GAP: f64 = 0.02;

    if best_score >= MIN_SCORE && best_score - second_score >= GAP {
        Some(best_title)
    } else {
        None
    }
}

/// Print `value` as pretty JSON when the global `--json` flag is set.
/// Returns true when JSON was emitted, so callers skip the plain rendering.
pub fn emit<T: Serialize>(fmt: OutputFmt, value: &T) -> bool {
    if fmt != OutputFmt::Json {
        return false;
    }

    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("failed to serialize output: {}", e),
    }

    true
}
