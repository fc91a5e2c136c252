pub mod core;
pub mod provider;

pub use self::core::{Corpus, FALLBACK_LANGUAGE};
pub use self::provider::{ExerciseTextProvider, SampleTextProvider};
