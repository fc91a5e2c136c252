// Library surface for the binary, headless drivers and integration tests.
pub mod app_dirs;
pub mod attempt;
pub mod clock;
pub mod config;
pub mod error;
pub mod language;
pub mod leaderboard;
pub mod practice;
pub mod runtime;
pub mod scoring;
pub mod session;
pub mod statistics;
pub mod store;
pub mod telemetry;

pub use attempt::{AttemptRecord, ExerciseMode, ExerciseSpec};
pub use error::{Error, Result};
pub use leaderboard::{LeaderboardEngine, LeaderboardEntry, LeaderboardFilter};
pub use session::{Phase, Session};
pub use statistics::UserStatistics;
