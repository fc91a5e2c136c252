use tracing::debug;

use super::{AttemptRepository, Participant, UserProfile, MAX_ATTEMPTS_PER_USER};
use crate::attempt::AttemptRecord;
use crate::error::Result;

/// Process-local repository, mostly for tests and embedding.
#[derive(Debug, Default, Clone)]
pub struct InMemoryAttemptRepository {
    users: Vec<UserProfile>,
    attempts: Vec<AttemptRecord>,
}

impl InMemoryAttemptRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }
}

impl AttemptRepository for InMemoryAttemptRepository {
    fn register_user(&mut self, profile: UserProfile) -> Result<()> {
        if !self.users.iter().any(|u| u.user_id == profile.user_id) {
            self.users.push(profile);
        }
        Ok(())
    }

    fn append(&mut self, record: AttemptRecord) -> Result<()> {
        let owner = record.user_id.clone();
        self.attempts.push(record);

        let owned = self.attempts.iter().filter(|r| r.user_id == owner).count();
        if owned > MAX_ATTEMPTS_PER_USER {
            let mut excess = owned - MAX_ATTEMPTS_PER_USER;
            self.attempts.retain(|r| {
                if excess > 0 && r.user_id == owner {
                    excess -= 1;
                    false
                } else {
                    true
                }
            });
            debug!(user = ?owner, "trimmed attempts to retention limit");
        }
        Ok(())
    }

    fn attempts_for(&self, user_id: Option<&str>) -> Result<Vec<AttemptRecord>> {
        Ok(self
            .attempts
            .iter()
            .filter(|r| r.user_id.as_deref() == user_id)
            .cloned()
            .collect())
    }

    fn population(&self) -> Result<Vec<Participant>> {
        self.users
            .iter()
            .map(|profile| {
                let attempts = self.attempts_for(Some(&profile.user_id))?;
                Ok(Participant::new(profile.clone(), attempts))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attempt::ExerciseMode;
    use chrono::{Duration, TimeZone, Utc};

    fn profile(id: &str) -> UserProfile {
        UserProfile {
            user_id: id.to_string(),
            display_name: id.to_uppercase(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn attempt(user: Option<&str>, wpm: u32) -> AttemptRecord {
        AttemptRecord {
            wpm,
            accuracy: 100,
            error_count: 0,
            correct_char_count: 50,
            total_typed_char_count: 50,
            elapsed_seconds: 30.0,
            exercise_mode: ExerciseMode::Time,
            exercise_magnitude: 30,
            language: "english".into(),
            completed_at: Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()
                + Duration::minutes(i64::from(wpm)),
            user_id: user.map(str::to_string),
        }
    }

    #[test]
    fn register_is_idempotent_and_ordered() {
        let mut repo = InMemoryAttemptRepository::new();
        repo.register_user(profile("b")).unwrap();
        repo.register_user(profile("a")).unwrap();
        let mut renamed = profile("b");
        renamed.display_name = "changed".into();
        repo.register_user(renamed).unwrap();

        let ids: Vec<String> = repo
            .population()
            .unwrap()
            .iter()
            .map(|p| p.user_id().to_string())
            .collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(repo.population().unwrap()[0].profile.display_name, "B");
    }

    #[test]
    fn attempts_are_grouped_by_user() {
        let mut repo = InMemoryAttemptRepository::new();
        assert!(repo.is_empty());
        repo.register_user(profile("a")).unwrap();
        assert!(repo.is_empty());
        repo.append(attempt(Some("a"), 40)).unwrap();
        assert!(!repo.is_empty());
        repo.append(attempt(None, 10)).unwrap();
        repo.append(attempt(Some("a"), 60)).unwrap();

        let a = repo.attempts_for(Some("a")).unwrap();
        assert_eq!(a.iter().map(|r| r.wpm).collect::<Vec<_>>(), vec![40, 60]);
        assert_eq!(repo.attempts_for(None).unwrap().len(), 1);

        let population = repo.population().unwrap();
        assert_eq!(population.len(), 1);
        assert_eq!(population[0].attempts.len(), 2);
    }

    #[test]
    fn retention_keeps_newest_per_user() {
        let mut repo = InMemoryAttemptRepository::new();
        repo.append(attempt(Some("other"), 1)).unwrap();
        for wpm in 0..(MAX_ATTEMPTS_PER_USER as u32 + 5) {
            repo.append(attempt(Some("a"), wpm)).unwrap();
        }

        let kept = repo.attempts_for(Some("a")).unwrap();
        assert_eq!(kept.len(), MAX_ATTEMPTS_PER_USER);
        assert_eq!(kept[0].wpm, 5);
        assert_eq!(repo.attempts_for(Some("other")).unwrap().len(), 1);
        assert_eq!(repo.len(), MAX_ATTEMPTS_PER_USER + 1);
    }
}
