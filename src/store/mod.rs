//! Where finished attempts live between sessions.
//!
//! The engines never talk to storage directly: a session hands its record to
//! [`AttemptRepository::append`], and the leaderboard reads a
//! [`Participant`] snapshot from [`AttemptRepository::population`].

pub mod memory;
pub mod sqlite;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::attempt::AttemptRecord;
use crate::error::Result;

pub use memory::InMemoryAttemptRepository;
pub use sqlite::SqliteAttemptRepository;

/// Newest attempts kept per user id; older ones are dropped on append.
pub const MAX_ATTEMPTS_PER_USER: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

/// One user's slice of a population snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    pub profile: UserProfile,
    /// Oldest first.
    pub attempts: Vec<AttemptRecord>,
}

impl Participant {
    pub fn new(profile: UserProfile, attempts: Vec<AttemptRecord>) -> Self {
        Self { profile, attempts }
    }

    pub fn user_id(&self) -> &str {
        &self.profile.user_id
    }
}

pub trait AttemptRepository {
    /// Add a user; registering an existing id leaves the stored profile untouched.
    fn register_user(&mut self, profile: UserProfile) -> Result<()>;

    /// Store a finished attempt under its `user_id` (anonymous when `None`).
    fn append(&mut self, record: AttemptRecord) -> Result<()>;

    /// Attempts for one user id, oldest first.
    fn attempts_for(&self, user_id: Option<&str>) -> Result<Vec<AttemptRecord>>;

    /// Every registered user in registration order, with their attempts.
    fn population(&self) -> Result<Vec<Participant>>;
}
