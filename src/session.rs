use std::cmp::Ordering;
use std::ops::Range;

use tracing::{debug, info};

use crate::attempt::{AttemptRecord, ExerciseMode, ExerciseSpec};
use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use crate::language::ExerciseTextProvider;
use crate::scoring::{accuracy_percent, words_per_minute};

/// A timed exercise asks for more text once fewer untyped characters than this remain.
pub const EXTENSION_THRESHOLD_CHARS: usize = 50;
/// Minimum amount of text appended per extension.
pub const EXTENSION_CHARS: usize = 200;
/// Countdown decrement per tick.
pub const TICK_SECONDS: u32 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Active,
    Complete,
}

/// One typing attempt, from the first keystroke to its [`AttemptRecord`].
///
/// Input arrives as full snapshots of the text field rather than key deltas.
/// Calls must be serialized by the owner; nothing here is synchronized.
#[derive(Debug)]
pub struct Session<P, C = SystemClock> {
    spec: ExerciseSpec,
    reference: Vec<char>,
    typed: Vec<char>,
    error_count: usize,
    phase: Phase,
    started_at_ms: Option<i64>,
    seconds_remaining: u32,
    user_id: Option<String>,
    record: Option<AttemptRecord>,
    provider: P,
    clock: C,
}

impl<P: ExerciseTextProvider, C: Clock> Session<P, C> {
    /// Idle session over `reference_text`. Rejects a non-positive magnitude.
    pub fn start(spec: ExerciseSpec, reference_text: &str, provider: P, clock: C) -> Result<Self> {
        spec.validate()?;
        Ok(Self {
            seconds_remaining: spec.magnitude,
            spec,
            reference: reference_text.chars().collect(),
            typed: Vec::new(),
            error_count: 0,
            phase: Phase::Idle,
            started_at_ms: None,
            user_id: None,
            record: None,
            provider,
            clock,
        })
    }

    /// Idle session over text drawn from `provider`.
    pub fn new_exercise(spec: ExerciseSpec, mut provider: P, clock: C) -> Result<Self> {
        spec.validate()?;
        let text = provider.exercise_text(&spec.language, spec.word_target());
        Self::start(spec, &text, provider, clock)
    }

    pub fn with_user(mut self, user_id: Option<String>) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn spec(&self) -> &ExerciseSpec {
        &self.spec
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_complete(&self) -> bool {
        self.phase == Phase::Complete
    }

    pub fn reference_text(&self) -> String {
        self.reference.iter().collect()
    }

    pub fn typed_text(&self) -> String {
        self.typed.iter().collect()
    }

    pub fn typed_len(&self) -> usize {
        self.typed.len()
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn started_at_millis(&self) -> Option<i64> {
        self.started_at_ms
    }

    /// Countdown for timed exercises; `None` for word-count exercises.
    pub fn seconds_remaining(&self) -> Option<u32> {
        match self.spec.mode {
            ExerciseMode::Time => Some(self.seconds_remaining),
            ExerciseMode::WordCount => None,
        }
    }

    pub fn record(&self) -> Option<&AttemptRecord> {
        self.record.as_ref()
    }

    /// Whitespace-delimited words in the current input.
    pub fn words_typed(&self) -> usize {
        self.typed_text().split_whitespace().count()
    }

    /// Feed the current contents of the input field.
    ///
    /// Returns the finished record when this change completed a word-count exercise.
    pub fn on_input_changed(&mut self, new_typed_text: &str) -> Option<AttemptRecord> {
        if self.phase == Phase::Complete {
            return None;
        }

        let new_typed: Vec<char> = new_typed_text.chars().collect();
        if self.phase == Phase::Idle && !new_typed.is_empty() {
            let now = self.clock.now_millis();
            self.phase = Phase::Active;
            self.started_at_ms = Some(now);
            debug!(mode = %self.spec.mode, magnitude = self.spec.magnitude, "session started");
        }

        if self.spec.mode == ExerciseMode::Time {
            self.extend_if_running_low(new_typed.len());
        }

        self.update_error_count(&new_typed);
        self.typed = new_typed;

        if self.spec.mode == ExerciseMode::WordCount
            && self.phase == Phase::Active
            && self.word_target_reached()
        {
            return Some(self.complete());
        }
        None
    }

    /// Advance the countdown by one tick.
    ///
    /// Only timed exercises that have started count down. Returns the record on
    /// the tick that reaches zero.
    pub fn on_tick(&mut self) -> Option<AttemptRecord> {
        if self.spec.mode != ExerciseMode::Time || self.phase != Phase::Active {
            return None;
        }
        self.seconds_remaining = self.seconds_remaining.saturating_sub(TICK_SECONDS);
        if self.seconds_remaining == 0 {
            return Some(self.complete());
        }
        None
    }

    /// Finish the session. Repeated calls return the same record.
    pub fn complete(&mut self) -> AttemptRecord {
        if let Some(record) = &self.record {
            return record.clone();
        }

        let now = self.clock.now();
        let elapsed_seconds = match self.spec.mode {
            ExerciseMode::Time => f64::from(self.spec.magnitude),
            ExerciseMode::WordCount => self.started_at_ms.map_or(1.0, |started| {
                ((now.timestamp_millis() - started) as f64 / 1000.0).max(1.0)
            }),
        };

        let correct_char_count = self
            .typed
            .iter()
            .zip(&self.reference)
            .filter(|(typed, expected)| typed == expected)
            .count();
        let total_typed_char_count = self.typed.len().max(1);

        let record = AttemptRecord {
            wpm: words_per_minute(correct_char_count, elapsed_seconds),
            accuracy: accuracy_percent(correct_char_count, total_typed_char_count),
            error_count: self.error_count,
            correct_char_count,
            total_typed_char_count,
            elapsed_seconds,
            exercise_mode: self.spec.mode,
            exercise_magnitude: self.spec.magnitude,
            language: self.spec.language.clone(),
            completed_at: now,
            user_id: self.user_id.clone(),
        };

        info!(
            wpm = record.wpm,
            accuracy = record.accuracy,
            errors = record.error_count,
            elapsed = record.elapsed_seconds,
            "session complete"
        );

        self.phase = Phase::Complete;
        self.record = Some(record.clone());
        record
    }

    /// Discard everything and return to Idle over `reference_text`.
    pub fn reset(&mut self, spec: ExerciseSpec, reference_text: &str) -> Result<()> {
        spec.validate()?;
        self.seconds_remaining = spec.magnitude;
        self.spec = spec;
        self.reference = reference_text.chars().collect();
        self.typed.clear();
        self.error_count = 0;
        self.phase = Phase::Idle;
        self.started_at_ms = None;
        self.record = None;
        Ok(())
    }

    /// Reset onto freshly generated text for `spec`.
    pub fn next_exercise(&mut self, spec: ExerciseSpec) -> Result<()> {
        spec.validate()?;
        let text = self
            .provider
            .exercise_text(&spec.language, spec.word_target());
        self.reset(spec, &text)
    }

    fn extend_if_running_low(&mut self, typed_len: usize) {
        if self.reference.len().saturating_sub(typed_len) >= EXTENSION_THRESHOLD_CHARS {
            return;
        }
        let extra = self
            .provider
            .continuation(&self.spec.language, EXTENSION_CHARS);
        let before = self.reference.len();
        self.reference.extend(extra.chars());
        debug!(
            before,
            after = self.reference.len(),
            "extended reference text"
        );
    }

    /// Forward typing only diffs the appended suffix; any shrink or same-length
    /// edit re-diffs the whole input.
    fn update_error_count(&mut self, new_typed: &[char]) {
        let old_len = self.typed.len();
        match new_typed.len().cmp(&old_len) {
            Ordering::Greater => {
                self.error_count += self.mismatches(new_typed, old_len..new_typed.len());
            }
            Ordering::Less => {
                self.error_count = self.mismatches(new_typed, 0..new_typed.len());
            }
            Ordering::Equal if new_typed != self.typed.as_slice() => {
                self.error_count = self.mismatches(new_typed, 0..new_typed.len());
            }
            Ordering::Equal => {}
        }
    }

    /// Positions in `range` where the input differs from the reference, or runs past it.
    fn mismatches(&self, typed: &[char], range: Range<usize>) -> usize {
        range
            .filter(|&i| self.reference.get(i) != Some(&typed[i]))
            .count()
    }

    fn word_target_reached(&self) -> bool {
        self.typed.len() >= self.reference.len()
            || self.words_typed() >= self.spec.magnitude as usize
    }
}
