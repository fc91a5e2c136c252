use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use typerank::attempt::ExerciseSpec;
use typerank::clock::SystemClock;
use typerank::language::SampleTextProvider;
use typerank::practice::{self, Practice, Step};
use typerank::runtime::{FixedTicker, PracticeEvent, Runner, TestEventSource};
use typerank::session::{Phase, Session};

fn key(c: char) -> PracticeEvent {
    PracticeEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
}

fn session(spec: ExerciseSpec, prompt: &str) -> Session<SampleTextProvider> {
    let provider = SampleTextProvider::seeded(11).unwrap();
    Session::start(spec, prompt, provider, SystemClock).unwrap()
}

// Headless integration using the runtime + practice loop without a TTY.
#[test]
fn headless_word_exercise_completes() {
    let mut exercise = Practice::new(session(ExerciseSpec::words(5, "english"), "hi"));

    let (tx, rx) = mpsc::channel();
    let mut runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(5)),
    );
    tx.send(key('h')).unwrap();
    tx.send(key('i')).unwrap();

    let step = practice::run(&mut exercise, &mut runner, |_| Ok(())).unwrap();

    let Step::Finished(record) = step else {
        panic!("expected a finished attempt, got {step:?}");
    };
    assert_eq!(record.correct_char_count, 2);
    assert_eq!(record.accuracy, 100);
    // sub-second attempts are scored over one second
    assert_eq!(record.elapsed_seconds, 1.0);
    assert_eq!(record.wpm, 24);
    assert_eq!(exercise.session().phase(), Phase::Complete);
}

#[test]
fn headless_typo_then_backspace_is_still_an_error() {
    let mut exercise = Practice::new(session(ExerciseSpec::words(10, "english"), "abc"));

    let (tx, rx) = mpsc::channel();
    let mut runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_secs(30)),
    );
    for event in [
        key('a'),
        key('x'),
        PracticeEvent::Key(KeyEvent::new(KeyCode::Backspace, KeyModifiers::NONE)),
        key('b'),
        key('c'),
    ] {
        tx.send(event).unwrap();
    }

    let step = practice::run(&mut exercise, &mut runner, |_| Ok(())).unwrap();

    let Step::Finished(record) = step else {
        panic!("expected a finished attempt, got {step:?}");
    };
    // the backspace re-diffs the snapshot, so only the live text counts
    assert_eq!(record.error_count, 0);
    assert_eq!(record.correct_char_count, 3);
}

#[test]
fn headless_timed_exercise_finishes_by_ticks() {
    let mut exercise = Practice::new(session(ExerciseSpec::timed(2, "uzbek"), "salom"));

    let (tx, rx) = mpsc::channel();
    let mut runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(10)),
    );
    tx.send(key('s')).unwrap();
    tx.send(key('a')).unwrap();

    let step = practice::run(&mut exercise, &mut runner, |p| {
        assert!(p.session().seconds_remaining().is_some());
        Ok(())
    })
    .unwrap();

    let Step::Finished(record) = step else {
        panic!("expected a finished attempt, got {step:?}");
    };
    assert_eq!(record.elapsed_seconds, 2.0);
    assert_eq!(record.correct_char_count, 2);
    // 2 chars over 2 seconds
    assert_eq!(record.wpm, 12);
    // running low on text pulled in more
    assert!(exercise.session().reference_text().len() > 200);
}

#[test]
fn headless_escape_aborts_without_a_record() {
    let mut exercise = Practice::new(session(ExerciseSpec::timed(30, "english"), "hello"));

    let (tx, rx) = mpsc::channel();
    let mut runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_secs(5)),
    );
    tx.send(key('h')).unwrap();
    tx.send(PracticeEvent::Key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)))
        .unwrap();

    let step = practice::run(&mut exercise, &mut runner, |_| Ok(())).unwrap();

    assert_eq!(step, Step::Aborted);
    assert!(exercise.session().record().is_none());
}
