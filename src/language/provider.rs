use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

use super::core::{Corpus, FALLBACK_LANGUAGE};
use crate::error::{Error, Result};

/// Supplies text to type, and more of it when a timed exercise runs low.
pub trait ExerciseTextProvider {
    /// Fresh exercise text. With a word target the text holds exactly that many
    /// words; without one (timed exercises) it is a few paragraphs long.
    fn exercise_text(&mut self, language: &str, word_count: Option<usize>) -> String;

    /// Text to append to an existing exercise, at least `min_chars` characters
    /// long and starting with a separating space.
    fn continuation(&mut self, language: &str, min_chars: usize) -> String;
}

/// Random paragraphs from the bundled corpora.
#[derive(Debug)]
pub struct SampleTextProvider<R = StdRng> {
    corpora: HashMap<String, Corpus>,
    rng: R,
}

impl SampleTextProvider<StdRng> {
    pub fn new() -> Result<Self> {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Result<Self> {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> SampleTextProvider<R> {
    pub fn with_rng(rng: R) -> Result<Self> {
        let mut corpora = HashMap::new();
        for name in Corpus::available() {
            if let Some(corpus) = Corpus::load(&name)? {
                corpora.insert(name, corpus);
            }
        }
        if !corpora.contains_key(FALLBACK_LANGUAGE) {
            return Err(Error::MissingCorpus(FALLBACK_LANGUAGE.to_string()));
        }
        Ok(Self { corpora, rng })
    }

    pub fn languages(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.corpora.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn pick_sample(&mut self, language: &str) -> Option<String> {
        let corpus = self
            .corpora
            .get(language)
            .or_else(|| self.corpora.get(FALLBACK_LANGUAGE))?;
        corpus.samples.choose(&mut self.rng).cloned()
    }
}

impl<R: Rng> ExerciseTextProvider for SampleTextProvider<R> {
    fn exercise_text(&mut self, language: &str, word_count: Option<usize>) -> String {
        let Some(target) = word_count else {
            let paragraphs = self.rng.gen_range(2..=4);
            return (0..paragraphs)
                .filter_map(|_| self.pick_sample(language))
                .collect::<Vec<_>>()
                .join(" ");
        };

        let mut words: Vec<String> = Vec::with_capacity(target);
        while words.len() < target {
            let Some(sample) = self.pick_sample(language) else {
                break;
            };
            let remaining = target - words.len();
            words.extend(sample.split(' ').take(remaining).map(str::to_string));
        }
        words.join(" ")
    }

    fn continuation(&mut self, language: &str, min_chars: usize) -> String {
        let mut extra = String::new();
        let mut len = 0;
        while len < min_chars {
            let Some(sample) = self.pick_sample(language) else {
                break;
            };
            len += 1 + sample.chars().count();
            extra.push(' ');
            extra.push_str(&sample);
        }
        extra
    }
}
