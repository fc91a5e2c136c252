// Session -> repository -> leaderboard, with a manual clock so windows and
// timestamps are deterministic.

use chrono::{Duration, TimeZone, Utc};

use typerank::attempt::{AttemptRecord, ExerciseSpec};
use typerank::clock::{Clock, ManualClock};
use typerank::language::SampleTextProvider;
use typerank::leaderboard::{
    Badge, LeaderboardEngine, LeaderboardFilter, ScoreCategory, Window,
};
use typerank::session::Session;
use typerank::statistics::UserStatistics;
use typerank::store::{
    AttemptRepository, InMemoryAttemptRepository, SqliteAttemptRepository, UserProfile,
};

fn profile(id: &str, name: &str, clock: &ManualClock) -> UserProfile {
    UserProfile {
        user_id: id.into(),
        display_name: name.into(),
        created_at: clock.now(),
    }
}

/// Type `typed` against `prompt` as a word-count exercise taking `secs` seconds.
fn play(user: &str, prompt: &str, typed: &str, secs: i64, clock: &ManualClock) -> AttemptRecord {
    let spec = ExerciseSpec::words(50, "english");
    let provider = SampleTextProvider::seeded(5).unwrap();
    let mut session = Session::start(spec, prompt, provider, clock.clone())
        .unwrap()
        .with_user(Some(user.to_string()));

    let chars: Vec<char> = typed.chars().collect();
    let mut finished = None;
    for end in 1..=chars.len() {
        if end == chars.len() {
            clock.advance(Duration::seconds(secs));
        }
        let snapshot: String = chars[..end].iter().collect();
        finished = session.on_input_changed(&snapshot);
    }
    finished.unwrap_or_else(|| session.complete())
}

fn run_flow<R: AttemptRepository>(repo: &mut R) {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 4, 1, 9, 0, 0).unwrap());
    repo.register_user(profile("a", "Aziz", &clock)).unwrap();
    repo.register_user(profile("b", "Bekzod", &clock)).unwrap();
    repo.register_user(profile("c", "Charos", &clock)).unwrap();

    // 25 correct chars in 6s = 50 wpm
    let prompt = "the quick brown fox jumps";
    repo.append(play("a", prompt, prompt, 6, &clock)).unwrap();

    clock.advance(Duration::days(10));
    // 25 chars in 5s = 60 wpm
    repo.append(play("b", prompt, prompt, 5, &clock)).unwrap();

    clock.advance(Duration::hours(1));
    // four typos: 21 correct of 25 in 6s = 42 wpm
    repo.append(play("a", prompt, "thx quick brxwn fox jxmpx", 6, &clock))
        .unwrap();

    let engine = LeaderboardEngine::new(clock.clone());
    let population = repo.population().unwrap();

    let board = engine.build_leaderboard(&LeaderboardFilter::default(), &population);
    let ranked: Vec<(&str, u32, Option<Badge>)> = board
        .iter()
        .map(|e| (e.user_id.as_str(), e.score, e.badge))
        .collect();
    assert_eq!(
        ranked,
        vec![("b", 60, Some(Badge::Gold)), ("a", 50, Some(Badge::Silver))]
    );
    let a = &board[1];
    assert_eq!(a.display_name, "Aziz");
    assert_eq!(a.attempt_count, 2);
    assert_eq!(a.average_wpm, 46);
    assert_eq!(a.average_accuracy, 92);
    assert_eq!(a.last_active_at, clock.now());

    // only a's second attempt falls inside the last day
    let today = LeaderboardFilter {
        window: Window::Day,
        ..LeaderboardFilter::default()
    };
    let board = engine.build_leaderboard(&today, &population);
    assert_eq!(board.len(), 2);
    assert_eq!(board[0].user_id, "b");
    assert_eq!(board[1].score, 42);

    let by_count = LeaderboardFilter {
        category: ScoreCategory::AttemptCount,
        ..LeaderboardFilter::default()
    };
    let top = engine.top_entries(&by_count, &population, 1);
    assert_eq!(top.len(), 1);
    assert_eq!((top[0].user_id.as_str(), top[0].score), ("a", 2));

    assert!(engine
        .lookup_user_rank("c", &LeaderboardFilter::default(), &population)
        .is_none());

    let stats = UserStatistics::from_attempts(&repo.attempts_for(Some("a")).unwrap());
    assert_eq!(stats.total_attempts, 2);
    assert_eq!(stats.best_wpm, 50);
    assert_eq!(stats.progression.len(), 2);
    assert_eq!(stats.recent[0].wpm, 42);
}

#[test]
fn flow_through_in_memory_repository() {
    run_flow(&mut InMemoryAttemptRepository::new());
}

#[test]
fn flow_through_sqlite_repository() {
    let dir = tempfile::tempdir().unwrap();
    let mut repo = SqliteAttemptRepository::open(dir.path().join("attempts.db")).unwrap();
    run_flow(&mut repo);

    // reopening sees the same history
    drop(repo);
    let reopened = SqliteAttemptRepository::open(dir.path().join("attempts.db")).unwrap();
    assert_eq!(reopened.attempts_for(Some("a")).unwrap().len(), 2);
    assert_eq!(reopened.population().unwrap().len(), 3);
}
