//! Ranks a population of attempt histories.
//!
//! Every query recomputes from the snapshot it is given: window, then
//! mode/language filter, drop users with nothing left, score, stable sort,
//! dense ranks, badges.

use chrono::{DateTime, Duration, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::attempt::{AttemptRecord, ExerciseMode};
use crate::clock::{Clock, SystemClock};
use crate::scoring::{consistency_score, rounded_mean};
use crate::store::Participant;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ScoreCategory {
    #[default]
    BestWpm,
    AverageAccuracy,
    Consistency,
    AttemptCount,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Window {
    Day,
    Week,
    Month,
    #[default]
    AllTime,
}

impl Window {
    /// How far back the window reaches; `None` keeps everything.
    pub fn duration(self) -> Option<Duration> {
        match self {
            Window::Day => Some(Duration::hours(24)),
            Window::Week => Some(Duration::days(7)),
            Window::Month => Some(Duration::days(30)),
            Window::AllTime => None,
        }
    }

    pub fn contains(self, completed_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.duration()
            .map_or(true, |span| completed_at >= now - span)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ModeFilter {
    #[default]
    Any,
    Time,
    WordCount,
}

impl ModeFilter {
    pub fn matches(self, mode: ExerciseMode) -> bool {
        match self {
            ModeFilter::Any => true,
            ModeFilter::Time => mode == ExerciseMode::Time,
            ModeFilter::WordCount => mode == ExerciseMode::WordCount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LanguageFilter {
    #[default]
    Any,
    Only(String),
}

impl LanguageFilter {
    /// `all`/`any` (any case) mean no filter; anything else names a language.
    pub fn from_arg(arg: &str) -> Self {
        match arg.to_ascii_lowercase().as_str() {
            "all" | "any" => LanguageFilter::Any,
            _ => LanguageFilter::Only(arg.to_string()),
        }
    }

    pub fn matches(&self, language: &str) -> bool {
        match self {
            LanguageFilter::Any => true,
            LanguageFilter::Only(wanted) => wanted == language,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LeaderboardFilter {
    pub category: ScoreCategory,
    pub window: Window,
    pub mode: ModeFilter,
    pub language: LanguageFilter,
}

impl LeaderboardFilter {
    pub fn accepts(&self, attempt: &AttemptRecord, now: DateTime<Utc>) -> bool {
        self.window.contains(attempt.completed_at, now)
            && self.mode.matches(attempt.exercise_mode)
            && self.language.matches(&attempt.language)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Badge {
    Gold,
    Silver,
    Bronze,
    Trophy,
    Star,
}

impl Badge {
    pub fn for_rank(rank: usize) -> Option<Self> {
        match rank {
            1 => Some(Badge::Gold),
            2 => Some(Badge::Silver),
            3 => Some(Badge::Bronze),
            4..=10 => Some(Badge::Trophy),
            11..=25 => Some(Badge::Star),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Badge::Gold => "🥇",
            Badge::Silver => "🥈",
            Badge::Bronze => "🥉",
            Badge::Trophy => "🏆",
            Badge::Star => "⭐",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub display_name: String,
    pub score: u32,
    /// 1-based sorted position; ties never share a rank.
    pub rank: usize,
    pub attempt_count: usize,
    pub best_wpm: u32,
    pub average_wpm: u32,
    pub average_accuracy: u32,
    pub consistency_score: u32,
    pub last_active_at: DateTime<Utc>,
    pub badge: Option<Badge>,
}

/// Score for one user's qualifying attempts under `category`.
pub fn category_score(category: ScoreCategory, attempts: &[&AttemptRecord]) -> u32 {
    match category {
        ScoreCategory::BestWpm => attempts.iter().map(|a| a.wpm).max().unwrap_or(0),
        ScoreCategory::AverageAccuracy => rounded_mean(&accuracies(attempts)),
        ScoreCategory::Consistency => consistency_score(&wpms(attempts)),
        ScoreCategory::AttemptCount => u32::try_from(attempts.len()).unwrap_or(u32::MAX),
    }
}

fn wpms(attempts: &[&AttemptRecord]) -> Vec<u32> {
    attempts.iter().map(|a| a.wpm).collect()
}

fn accuracies(attempts: &[&AttemptRecord]) -> Vec<u32> {
    attempts.iter().map(|a| a.accuracy).collect()
}

/// Unranked entry for one participant, or `None` when no attempt qualifies.
fn score_participant(
    participant: &Participant,
    filter: &LeaderboardFilter,
    now: DateTime<Utc>,
) -> Option<LeaderboardEntry> {
    let qualifying: Vec<&AttemptRecord> = participant
        .attempts
        .iter()
        .filter(|a| filter.accepts(a, now))
        .collect();
    if qualifying.is_empty() {
        return None;
    }

    let wpm_series = wpms(&qualifying);
    Some(LeaderboardEntry {
        user_id: participant.profile.user_id.clone(),
        display_name: participant.profile.display_name.clone(),
        score: category_score(filter.category, &qualifying),
        rank: 0,
        attempt_count: qualifying.len(),
        best_wpm: wpm_series.iter().copied().max().unwrap_or(0),
        average_wpm: rounded_mean(&wpm_series),
        average_accuracy: rounded_mean(&accuracies(&qualifying)),
        consistency_score: consistency_score(&wpm_series),
        last_active_at: qualifying
            .iter()
            .map(|a| a.completed_at)
            .max()
            .unwrap_or(participant.profile.created_at),
        badge: None,
    })
}

/// Full leaderboard as seen at `now`.
pub fn build_leaderboard_at(
    filter: &LeaderboardFilter,
    population: &[Participant],
    now: DateTime<Utc>,
) -> Vec<LeaderboardEntry> {
    let mut entries: Vec<LeaderboardEntry> = population
        .iter()
        .filter_map(|p| score_participant(p, filter, now))
        .collect();

    // stable: equal scores keep population order
    entries.sort_by(|a, b| b.score.cmp(&a.score));

    for (index, entry) in entries.iter_mut().enumerate() {
        entry.rank = index + 1;
        entry.badge = Badge::for_rank(entry.rank);
    }

    debug!(
        category = %filter.category,
        window = %filter.window,
        population = population.len(),
        ranked = entries.len(),
        "built leaderboard"
    );
    entries
}

/// Leaderboard queries against a clock.
#[derive(Debug, Clone, Default)]
pub struct LeaderboardEngine<C = SystemClock> {
    clock: C,
}

impl<C: Clock> LeaderboardEngine<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    pub fn build_leaderboard(
        &self,
        filter: &LeaderboardFilter,
        population: &[Participant],
    ) -> Vec<LeaderboardEntry> {
        build_leaderboard_at(filter, population, self.clock.now())
    }

    /// The user's entry, or `None` when they have no qualifying attempts.
    pub fn lookup_user_rank(
        &self,
        user_id: &str,
        filter: &LeaderboardFilter,
        population: &[Participant],
    ) -> Option<LeaderboardEntry> {
        self.build_leaderboard(filter, population)
            .into_iter()
            .find(|entry| entry.user_id == user_id)
    }

    pub fn top_entries(
        &self,
        filter: &LeaderboardFilter,
        population: &[Participant],
        limit: usize,
    ) -> Vec<LeaderboardEntry> {
        let mut entries = self.build_leaderboard(filter, population);
        entries.truncate(limit);
        entries
    }
}
