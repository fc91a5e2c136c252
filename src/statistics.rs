//! Personal and global summaries over stored attempts.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use itertools::Itertools;
use serde::Serialize;

use crate::attempt::{AttemptRecord, ExerciseMode};
use crate::scoring::{consistency_score, rounded_mean};
use crate::store::Participant;

/// How many attempts [`UserStatistics::recent`] keeps.
pub const RECENT_ATTEMPTS: usize = 10;

/// Rounded daily means for one UTC calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressPoint {
    pub date: NaiveDate,
    pub wpm: u32,
    pub accuracy: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct UserStatistics {
    pub total_attempts: usize,
    pub total_typing_seconds: f64,
    pub best_wpm: u32,
    pub average_wpm: u32,
    pub average_accuracy: u32,
    pub total_errors: usize,
    pub total_characters: usize,
    /// Newest first.
    pub recent: Vec<AttemptRecord>,
    /// Date ascending.
    pub progression: Vec<ProgressPoint>,
    pub by_language: BTreeMap<String, usize>,
    pub by_mode: BTreeMap<ExerciseMode, usize>,
    /// Change in daily wpm per recorded day, two decimals.
    pub improvement_rate: f64,
    pub consistency_score: u32,
}

impl UserStatistics {
    pub fn from_attempts(attempts: &[AttemptRecord]) -> Self {
        if attempts.is_empty() {
            return Self::default();
        }

        let chronological: Vec<&AttemptRecord> = attempts
            .iter()
            .sorted_by_key(|a| a.completed_at)
            .collect();
        let wpms: Vec<u32> = chronological.iter().map(|a| a.wpm).collect();
        let accuracies: Vec<u32> = chronological.iter().map(|a| a.accuracy).collect();
        let progression = daily_progression(&chronological);

        Self {
            total_attempts: attempts.len(),
            total_typing_seconds: attempts.iter().map(|a| a.elapsed_seconds).sum(),
            best_wpm: wpms.iter().copied().max().unwrap_or(0),
            average_wpm: rounded_mean(&wpms),
            average_accuracy: rounded_mean(&accuracies),
            total_errors: attempts.iter().map(|a| a.error_count).sum(),
            total_characters: attempts.iter().map(|a| a.total_typed_char_count).sum(),
            recent: chronological
                .iter()
                .rev()
                .take(RECENT_ATTEMPTS)
                .map(|a| (*a).clone())
                .collect(),
            improvement_rate: improvement_rate(&progression),
            progression,
            by_language: attempts
                .iter()
                .map(|a| a.language.clone())
                .counts()
                .into_iter()
                .collect(),
            by_mode: attempts
                .iter()
                .map(|a| a.exercise_mode)
                .counts()
                .into_iter()
                .collect(),
            consistency_score: consistency_score(&wpms),
        }
    }

    /// The same summary over every attempt of every participant.
    pub fn global(population: &[Participant]) -> Self {
        let everything: Vec<AttemptRecord> = population
            .iter()
            .flat_map(|p| p.attempts.iter().cloned())
            .collect();
        Self::from_attempts(&everything)
    }
}

fn daily_progression(chronological: &[&AttemptRecord]) -> Vec<ProgressPoint> {
    let days = chronological
        .iter()
        .chunk_by(|a| a.completed_at.date_naive());
    days.into_iter()
        .map(|(date, day)| {
            let (wpms, accuracies): (Vec<u32>, Vec<u32>) =
                day.map(|a| (a.wpm, a.accuracy)).unzip();
            ProgressPoint {
                date,
                wpm: rounded_mean(&wpms),
                accuracy: rounded_mean(&accuracies),
            }
        })
        .collect()
}

fn improvement_rate(progression: &[ProgressPoint]) -> f64 {
    let [first, .., last] = progression else {
        return 0.0;
    };
    let delta = f64::from(last.wpm) - f64::from(first.wpm);
    round_half_up(delta / progression.len() as f64 * 100.0) / 100.0
}

/// Halves round toward positive infinity, so -12.5 becomes -12.
fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::UserProfile;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
    }

    fn attempt(wpm: u32, accuracy: u32, completed_at: DateTime<Utc>) -> AttemptRecord {
        AttemptRecord {
            wpm,
            accuracy,
            error_count: 2,
            correct_char_count: 98,
            total_typed_char_count: 100,
            elapsed_seconds: 30.0,
            exercise_mode: ExerciseMode::Time,
            exercise_magnitude: 30,
            language: "uzbek".into(),
            completed_at,
            user_id: Some("u".into()),
        }
    }

    #[test]
    fn test_empty_is_all_zero() {
        let stats = UserStatistics::from_attempts(&[]);
        assert_eq!(stats, UserStatistics::default());
        assert_eq!(stats.total_attempts, 0);
        assert!(stats.recent.is_empty());
        assert_eq!(stats.improvement_rate, 0.0);
        assert_eq!(UserStatistics::global(&[]), UserStatistics::default());
    }

    #[test]
    fn test_totals_and_averages() {
        let mut words = attempt(60, 90, at(2, 10));
        words.exercise_mode = ExerciseMode::WordCount;
        words.language = "english".into();
        words.elapsed_seconds = 12.5;
        let attempts = vec![attempt(40, 100, at(1, 10)), words, attempt(51, 95, at(1, 11))];

        let stats = UserStatistics::from_attempts(&attempts);

        assert_eq!(stats.total_attempts, 3);
        assert_eq!(stats.total_typing_seconds, 72.5);
        assert_eq!(stats.best_wpm, 60);
        // 151 / 3 = 50.33
        assert_eq!(stats.average_wpm, 50);
        assert_eq!(stats.average_accuracy, 95);
        assert_eq!(stats.total_errors, 6);
        assert_eq!(stats.total_characters, 300);
        assert_eq!(stats.by_language.get("uzbek"), Some(&2));
        assert_eq!(stats.by_language.get("english"), Some(&1));
        assert_eq!(stats.by_mode.get(&ExerciseMode::Time), Some(&2));
        assert_eq!(stats.by_mode.get(&ExerciseMode::WordCount), Some(&1));
    }

    #[test]
    fn test_recent_is_newest_first_and_capped() {
        let attempts: Vec<AttemptRecord> = (0..15u32)
            .map(|i| attempt(i, 100, at(1, 0) + chrono::Duration::minutes(i64::from(i))))
            .rev()
            .collect();

        let stats = UserStatistics::from_attempts(&attempts);

        assert_eq!(stats.recent.len(), RECENT_ATTEMPTS);
        assert_eq!(
            stats.recent.iter().map(|a| a.wpm).collect::<Vec<_>>(),
            (5..15u32).rev().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_daily_progression_and_improvement() {
        let attempts = vec![
            attempt(40, 90, at(1, 9)),
            attempt(45, 97, at(1, 18)),
            attempt(50, 100, at(3, 12)),
            attempt(61, 92, at(2, 8)),
        ];

        let stats = UserStatistics::from_attempts(&attempts);

        let dates: Vec<u32> = stats
            .progression
            .iter()
            .map(|p| chrono::Datelike::day(&p.date))
            .collect();
        assert_eq!(dates, vec![1, 2, 3]);
        // 42.5 and 93.5 round half away from zero
        assert_eq!((stats.progression[0].wpm, stats.progression[0].accuracy), (43, 94));
        assert_eq!(stats.progression[1].wpm, 61);
        assert_eq!(stats.progression[2].wpm, 50);
        // (50 - 43) / 3 days
        assert_eq!(stats.improvement_rate, 2.33);
    }

    #[test]
    fn test_negative_half_rate_rounds_up() {
        let mut attempts: Vec<AttemptRecord> = (1..=7).map(|day| attempt(50, 90, at(day, 12))).collect();
        attempts.push(attempt(49, 90, at(8, 12)));

        let stats = UserStatistics::from_attempts(&attempts);

        assert_eq!(stats.progression.len(), 8);
        // -1 over 8 days is -0.125
        assert_eq!(stats.improvement_rate, -0.12);
        assert_eq!(round_half_up(12.5), 13.0);
        assert_eq!(round_half_up(-12.5), -12.0);
        assert_eq!(round_half_up(-12.51), -13.0);
    }

    #[test]
    fn test_single_day_has_no_improvement() {
        let attempts = vec![attempt(30, 90, at(4, 1)), attempt(90, 90, at(4, 23))];
        let stats = UserStatistics::from_attempts(&attempts);
        assert_eq!(stats.progression.len(), 1);
        assert_eq!(stats.improvement_rate, 0.0);
    }

    #[test]
    fn test_consistency_matches_leaderboard_formula() {
        let attempts = vec![attempt(40, 90, at(1, 1)), attempt(60, 90, at(2, 1))];
        assert_eq!(UserStatistics::from_attempts(&attempts).consistency_score, 80);

        let idle = vec![attempt(0, 0, at(1, 1))];
        assert_eq!(UserStatistics::from_attempts(&idle).consistency_score, 0);
    }

    #[test]
    fn test_global_spans_participants() {
        let profile = |id: &str| UserProfile {
            user_id: id.into(),
            display_name: id.into(),
            created_at: at(1, 0),
        };
        let population = vec![
            Participant::new(profile("a"), vec![attempt(40, 90, at(1, 1))]),
            Participant::new(profile("b"), vec![attempt(80, 100, at(2, 1)), attempt(60, 80, at(2, 2))]),
            Participant::new(profile("c"), vec![]),
        ];

        let stats = UserStatistics::global(&population);

        assert_eq!(stats.total_attempts, 3);
        assert_eq!(stats.best_wpm, 80);
        assert_eq!(stats.average_wpm, 60);
        assert_eq!(stats.recent[0].wpm, 60);
    }
}
