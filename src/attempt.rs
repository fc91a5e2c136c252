use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How an exercise ends: after a number of seconds, or after a number of words.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ExerciseMode {
    Time,
    WordCount,
}

impl ExerciseMode {
    /// Parse the stored/display form (`time`, `word-count`)
    pub fn parse(s: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(s, true).ok()
    }
}

/// What the user asked to type. Immutable once a session starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseSpec {
    pub mode: ExerciseMode,
    /// Seconds for [`ExerciseMode::Time`], words for [`ExerciseMode::WordCount`].
    pub magnitude: u32,
    pub language: String,
}

impl ExerciseSpec {
    pub fn timed(seconds: u32, language: impl Into<String>) -> Self {
        Self {
            mode: ExerciseMode::Time,
            magnitude: seconds,
            language: language.into(),
        }
    }

    pub fn words(count: u32, language: impl Into<String>) -> Self {
        Self {
            mode: ExerciseMode::WordCount,
            magnitude: count,
            language: language.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.magnitude == 0 {
            return Err(Error::InvalidSpec(format!(
                "{} exercise needs a positive magnitude",
                self.mode
            )));
        }
        Ok(())
    }

    /// Word target handed to the text provider; timed exercises have none.
    pub fn word_target(&self) -> Option<usize> {
        match self.mode {
            ExerciseMode::Time => None,
            ExerciseMode::WordCount => Some(self.magnitude as usize),
        }
    }
}

/// One finished typing attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub wpm: u32,
    pub accuracy: u32,
    pub error_count: usize,
    pub correct_char_count: usize,
    /// Never zero; an empty session is recorded as one character.
    pub total_typed_char_count: usize,
    /// Never below one second.
    pub elapsed_seconds: f64,
    pub exercise_mode: ExerciseMode,
    pub exercise_magnitude: u32,
    pub language: String,
    pub completed_at: DateTime<Utc>,
    pub user_id: Option<String>,
}
