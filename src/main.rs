use std::{
    error::Error,
    io::{self, stdin, Write},
    path::PathBuf,
};

use chrono::{DateTime, Utc};
use clap::{error::ErrorKind, Args, CommandFactory, Parser, Subcommand};
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute, queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
    terminal::{
        self, disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
    tty::IsTty,
};
use time_humanize::{Accuracy, HumanTime, Tense};
use tracing::info;

use typerank::{
    app_dirs::AppDirs,
    attempt::{AttemptRecord, ExerciseMode, ExerciseSpec},
    clock::SystemClock,
    config::{Config, ConfigStore, FileConfigStore},
    language::{ExerciseTextProvider, SampleTextProvider},
    leaderboard::{
        LanguageFilter, LeaderboardEngine, LeaderboardEntry, LeaderboardFilter, ModeFilter,
        ScoreCategory, Window,
    },
    practice::{self, Practice, Step},
    runtime::{CrosstermEventSource, FixedTicker, Runner},
    session::Session,
    statistics::UserStatistics,
    store::{AttemptRepository, SqliteAttemptRepository, UserProfile},
    telemetry,
};

/// typing practice with per-user history and leaderboards
#[derive(Parser, Debug)]
#[clap(version, about)]
pub struct Cli {
    /// attempt database to use instead of the default location
    #[clap(long, global = true)]
    db: Option<PathBuf>,

    /// config file to use instead of the default location
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// type an exercise in the terminal
    Practice(PracticeArgs),

    /// register a user and make it the current one
    Register {
        #[clap(long)]
        id: String,
        #[clap(long)]
        name: String,
    },

    /// show the top of the leaderboard
    Leaderboard {
        #[clap(flatten)]
        filter: FilterArgs,

        #[clap(long, default_value_t = 10)]
        limit: usize,
    },

    /// show where a user ranks
    Rank {
        /// defaults to the configured user
        #[clap(long)]
        user: Option<String>,

        #[clap(flatten)]
        filter: FilterArgs,
    },

    /// summarize attempt history
    Stats {
        /// defaults to the configured user
        #[clap(long, conflicts_with = "global")]
        user: Option<String>,

        /// summarize every user's attempts
        #[clap(long)]
        global: bool,
    },

    /// write attempt history as CSV
    Export {
        #[clap(short, long)]
        output: PathBuf,

        /// defaults to the configured user
        #[clap(long)]
        user: Option<String>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct PracticeArgs {
    /// end the exercise after a time limit or a word count
    #[clap(short = 'm', long, value_enum)]
    mode: Option<ExerciseMode>,

    /// seconds for time mode, words for word-count mode
    #[clap(short = 'n', long)]
    value: Option<u32>,

    /// language to pull text from
    #[clap(short = 'l', long)]
    language: Option<String>,

    /// custom text to type instead of a generated exercise
    #[clap(short = 'p', long)]
    prompt: Option<String>,
}

impl PracticeArgs {
    /// Config defaults with any flags layered on top.
    fn exercise_spec(&self, config: &Config) -> ExerciseSpec {
        let mut spec = config.exercise_spec();
        if let Some(mode) = self.mode {
            spec.mode = mode;
        }
        if let Some(value) = self.value {
            spec.magnitude = value;
        }
        if let Some(language) = &self.language {
            spec.language = language.to_lowercase();
        }
        spec
    }
}

#[derive(Args, Debug, Clone)]
pub struct FilterArgs {
    /// what to rank by
    #[clap(long, value_enum, default_value_t = ScoreCategory::BestWpm)]
    category: ScoreCategory,

    /// only count attempts from this period
    #[clap(long, value_enum, default_value_t = Window::AllTime)]
    window: Window,

    /// only count attempts of this mode
    #[clap(long, value_enum, default_value_t = ModeFilter::Any)]
    mode: ModeFilter,

    /// only count attempts in this language ("all" for any)
    #[clap(long, default_value = "all")]
    language: String,
}

impl From<&FilterArgs> for LeaderboardFilter {
    fn from(args: &FilterArgs) -> Self {
        Self {
            category: args.category,
            window: args.window,
            mode: args.mode,
            language: LanguageFilter::from_arg(&args.language),
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    telemetry::init_tracing();
    let cli = Cli::parse();

    let config_store = match &cli.config {
        Some(path) => FileConfigStore::with_path(path),
        None => FileConfigStore::new(),
    };
    let mut config = config_store.load();

    let Some(db_path) = cli
        .db
        .clone()
        .or_else(|| config.db_path.clone())
        .or_else(AppDirs::db_path)
    else {
        exit_with(ErrorKind::Io, "could not determine where to keep the attempt database");
    };
    let mut repo = SqliteAttemptRepository::open(&db_path)?;

    match &cli.command {
        Command::Practice(args) => practice_command(args, &config, &mut repo)?,
        Command::Register { id, name } => {
            repo.register_user(UserProfile {
                user_id: id.clone(),
                display_name: name.clone(),
                created_at: Utc::now(),
            })?;
            config.user_id = Some(id.clone());
            config.display_name = Some(name.clone());
            config_store.save(&config)?;
            println!("registered {name} ({id})");
        }
        Command::Leaderboard { filter, limit } => {
            let engine = LeaderboardEngine::new(SystemClock);
            let entries = engine.top_entries(&filter.into(), &repo.population()?, *limit);
            if entries.is_empty() {
                println!("no ranked attempts yet");
            } else {
                print_entries(&entries, Utc::now());
            }
        }
        Command::Rank { user, filter } => {
            let user_id = resolve_user(user.as_deref(), &config);
            let engine = LeaderboardEngine::new(SystemClock);
            match engine.lookup_user_rank(&user_id, &filter.into(), &repo.population()?) {
                Some(entry) => print_entries(&[entry], Utc::now()),
                None => println!("{user_id} is not ranked for this filter"),
            }
        }
        Command::Stats { user, global } => {
            let stats = if *global {
                UserStatistics::global(&repo.population()?)
            } else {
                let user_id = user.clone().or_else(|| config.user_id.clone());
                UserStatistics::from_attempts(&repo.attempts_for(user_id.as_deref())?)
            };
            print_statistics(&stats);
        }
        Command::Export { output, user } => {
            let user_id = user.clone().or_else(|| config.user_id.clone());
            let attempts = repo.attempts_for(user_id.as_deref())?;
            let mut writer = csv::Writer::from_path(output)?;
            for attempt in &attempts {
                writer.serialize(attempt)?;
            }
            writer.flush()?;
            println!("wrote {} attempts to {}", attempts.len(), output.display());
        }
    }

    Ok(())
}

fn exit_with(kind: ErrorKind, message: &str) -> ! {
    let mut cmd = Cli::command();
    cmd.error(kind, message).exit()
}

fn resolve_user(user: Option<&str>, config: &Config) -> String {
    match user.map(str::to_string).or_else(|| config.user_id.clone()) {
        Some(id) => id,
        None => exit_with(
            ErrorKind::MissingRequiredArgument,
            "no user given and none registered; pass --user or run `typerank register`",
        ),
    }
}

fn practice_command(
    args: &PracticeArgs,
    config: &Config,
    repo: &mut SqliteAttemptRepository,
) -> Result<(), Box<dyn Error>> {
    if !stdin().is_tty() {
        exit_with(ErrorKind::Io, "stdin must be a tty");
    }

    let spec = args.exercise_spec(config);
    if let Err(err) = spec.validate() {
        exit_with(ErrorKind::InvalidValue, &err.to_string());
    }

    let provider = SampleTextProvider::new()?;
    let session = match &args.prompt {
        Some(prompt) => Session::start(spec, prompt, provider, SystemClock)?,
        None => Session::new_exercise(spec, provider, SystemClock)?,
    }
    .with_user(config.user_id.clone());
    let mut exercise = Practice::new(session);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, Hide)?;

    let mut runner = Runner::new(CrosstermEventSource::new(), FixedTicker::seconds());
    let outcome = practice::run(&mut exercise, &mut runner, |p| draw(&mut stdout, p));

    execute!(stdout, Show, LeaveAlternateScreen)?;
    disable_raw_mode()?;

    match outcome? {
        Step::Finished(record) => {
            repo.append(record.clone())?;
            info!(user = ?record.user_id, wpm = record.wpm, "attempt saved");
            print_record(&record);
        }
        Step::Aborted | Step::Continue => println!("exercise abandoned"),
    }
    Ok(())
}

fn draw<P: ExerciseTextProvider>(
    out: &mut impl Write,
    practice: &Practice<P, SystemClock>,
) -> io::Result<()> {
    let session = practice.session();
    let (width, height) = terminal::size()?;
    let width = usize::from(width.max(1));

    let status = match session.seconds_remaining() {
        Some(secs) => format!("{secs}s left"),
        None => format!("{}/{} words", session.words_typed(), session.spec().magnitude),
    };
    queue!(
        out,
        Clear(ClearType::All),
        MoveTo(0, 0),
        SetForegroundColor(Color::Cyan),
        Print(status),
        Print(format!("   errors: {}", session.error_count())),
        ResetColor,
    )?;

    let typed: Vec<char> = session.typed_text().chars().collect();
    let max_rows = usize::from(height.saturating_sub(3)).max(1);
    for (i, expected) in session.reference_text().chars().enumerate() {
        let row = i / width;
        if row >= max_rows {
            break;
        }
        let (color, shown) = match typed.get(i) {
            Some(&c) if c == expected => (Color::Green, expected),
            Some(_) if expected == ' ' => (Color::Red, '_'),
            Some(_) => (Color::Red, expected),
            None => (Color::DarkGrey, expected),
        };
        // row and col are bounded by the terminal size
        queue!(out, MoveTo((i % width) as u16, (row + 2) as u16))?;
        if i == typed.len() {
            queue!(out, SetAttribute(Attribute::Underlined))?;
        }
        queue!(
            out,
            SetForegroundColor(color),
            Print(shown),
            SetAttribute(Attribute::Reset),
            ResetColor
        )?;
    }
    out.flush()
}

fn print_record(record: &AttemptRecord) {
    println!("{} wpm, {}% accuracy", record.wpm, record.accuracy);
    println!(
        "{} errors, {}/{} correct characters in {:.1}s",
        record.error_count,
        record.correct_char_count,
        record.total_typed_char_count,
        record.elapsed_seconds
    );
}

fn humanize_since(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds().max(0);
    if secs < 10 {
        return "now".to_string();
    }
    HumanTime::from_seconds(secs).to_text_en(Accuracy::Rough, Tense::Past)
}

fn print_entries(entries: &[LeaderboardEntry], now: DateTime<Utc>) {
    println!(
        "{:>4}  {:2} {:<24} {:>6} {:>8}  last active",
        "rank", "", "name", "score", "attempts"
    );
    for entry in entries {
        println!(
            "{:>4}  {:2} {:<24} {:>6} {:>8}  {}",
            entry.rank,
            entry.badge.map_or("", |b| b.symbol()),
            entry.display_name,
            entry.score,
            entry.attempt_count,
            humanize_since(entry.last_active_at, now)
        );
    }
}

fn print_statistics(stats: &UserStatistics) {
    if stats.total_attempts == 0 {
        println!("no attempts recorded");
        return;
    }
    println!("attempts:         {}", stats.total_attempts);
    println!("time typing:      {:.0}s", stats.total_typing_seconds);
    println!("best wpm:         {}", stats.best_wpm);
    println!("average wpm:      {}", stats.average_wpm);
    println!("average accuracy: {}%", stats.average_accuracy);
    println!("consistency:      {}", stats.consistency_score);
    println!("improvement:      {:+.2} wpm/day", stats.improvement_rate);
    println!("errors:           {}", stats.total_errors);
    println!("characters:       {}", stats.total_characters);

    let languages: Vec<String> = stats
        .by_language
        .iter()
        .map(|(lang, n)| format!("{lang} {n}"))
        .collect();
    println!("languages:        {}", languages.join(", "));
    let modes: Vec<String> = stats
        .by_mode
        .iter()
        .map(|(mode, n)| format!("{mode} {n}"))
        .collect();
    println!("modes:            {}", modes.join(", "));

    println!("recent:");
    for attempt in &stats.recent {
        println!(
            "  {}  {:>3} wpm {:>3}%  {} {} {}",
            attempt.completed_at.format("%Y-%m-%d %H:%M"),
            attempt.wpm,
            attempt.accuracy,
            attempt.exercise_mode,
            attempt.exercise_magnitude,
            attempt.language
        );
    }
}
