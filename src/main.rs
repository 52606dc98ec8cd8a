use chatterbox::{
    app::{App, ExitType},
    app_dirs::AppDirs,
    clock::SystemClock,
    config::{ConfigStore, FileConfigStore},
    host::{AssignmentContext, GameHost},
    runtime::{CrosstermEventSource, FixedTicker, PlayEvent, Runner},
    store::{MemoryStore, PersistenceService, SqliteStore},
    variant::GameVariant,
};
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::KeyEventKind,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use serde_json::Value;
use std::{
    error::Error,
    fs,
    io::{self, stdin},
    path::PathBuf,
    sync::Mutex,
    time::Duration,
};
use tracing::warn;
use tracing_subscriber::{
    fmt::{self, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

const TICK_RATE_MS: u64 = 100;

/// speech practice games for kids, right in the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Speech-therapy practice games: listening, reading, matching and speaking exercises with star rewards and progress tracking."
)]
pub struct Cli {
    /// game to play
    #[clap(short = 'g', long, value_enum, default_value_t = GameVariant::WordRecognition)]
    game: GameVariant,

    /// assignment config: inline JSON or a path to a JSON file
    #[clap(short = 'c', long)]
    config: Option<String>,

    /// difficulty level, clamped to 1..=3
    #[clap(short = 'd', long, allow_negative_numbers = true)]
    difficulty: Option<i64>,

    /// patient id results are saved under
    #[clap(short = 'p', long, env = "CHATTERBOX_PATIENT")]
    patient: Option<String>,

    /// name shown on screen
    #[clap(short = 'n', long)]
    name: Option<String>,

    /// assignment id to attach to saved results
    #[clap(short = 'a', long)]
    assignment: Option<String>,

    /// database file (defaults to the user state dir)
    #[clap(long)]
    db: Option<PathBuf>,

    /// play without saving results
    #[clap(long)]
    no_save: bool,

    /// list the available games and exit
    #[clap(long)]
    list_games: bool,

    /// print the patient's progress and exit
    #[clap(long)]
    stats: bool,
}

/// One-shot commands log to stderr. The TUI logs to a file instead, since
/// anything on stderr would be drawn over the frame; with no usable log file
/// it stays silent.
fn init_tracing(tui: bool) {
    let filter = EnvFilter::try_from_env("CHATTERBOX_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (writer, filter) = if !tui {
        (BoxMakeWriter::new(io::stderr), filter)
    } else {
        match AppDirs::log_path().map(open_log_file) {
            Some(Ok(file)) => (BoxMakeWriter::new(Mutex::new(file)), filter),
            _ => (BoxMakeWriter::new(io::sink), EnvFilter::new("off")),
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(!tui)
                .with_target(false),
        )
        .init();
}

fn open_log_file(path: PathBuf) -> io::Result<fs::File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::OpenOptions::new().create(true).append(true).open(path)
}

/// Inline JSON wins; anything else is read as a file. Unusable input means
/// the game's built-in content.
fn load_assignment_config(raw: Option<&str>) -> Value {
    let Some(raw) = raw else {
        return Value::Null;
    };
    let text = if raw.trim_start().starts_with(['{', '[']) {
        raw.to_string()
    } else {
        match fs::read_to_string(raw) {
            Ok(text) => text,
            Err(e) => {
                warn!(path = raw, error = %e, "cannot read config; using built-in content");
                return Value::Null;
            }
        }
    };
    serde_json::from_str(&text).unwrap_or_else(|e| {
        warn!(error = %e, "config is not valid JSON; using built-in content");
        Value::Null
    })
}

fn open_store(path: PathBuf) -> Box<dyn PersistenceService> {
    match SqliteStore::open(&path) {
        Ok(store) => Box::new(store),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "results will not be kept");
            Box::new(MemoryStore::new())
        }
    }
}

fn print_stats(path: PathBuf, patient: &str) -> Result<(), Box<dyn Error>> {
    let store = SqliteStore::open(path)?;
    match store.patient_stats(patient)? {
        Some(stats) => {
            let last = stats
                .last_played_at
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".into());
            println!(
                "{patient}: {} stars over {} sessions, last played {last}",
                stats.total_stars, stats.sessions_played
            );
        }
        None => {
            println!("{patient}: no sessions yet");
            return Ok(());
        }
    }
    for game in store.game_summary(patient)? {
        println!(
            "  {:<20} {:>3} sessions  {:>5.1}% avg  best {}",
            game.game_id, game.sessions, game.average_accuracy, game.best_stars
        );
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(!cli.list_games && !cli.stats);

    if cli.list_games {
        for variant in GameVariant::ALL {
            println!("{:<20} {}", variant.game_id(), variant.title());
        }
        return Ok(());
    }

    let settings = FileConfigStore::new().load();
    let patient = cli.patient.clone().unwrap_or(settings.patient_id.clone());
    let db_path = cli.db.clone().unwrap_or_else(SqliteStore::default_path);

    if cli.stats {
        return print_stats(db_path, &patient);
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let mut context = AssignmentContext::new(
        patient,
        cli.name.clone().unwrap_or(settings.patient_name.clone()),
        cli.game,
    )
    .with_config(load_assignment_config(cli.config.as_deref()))
    .with_difficulty(cli.difficulty.unwrap_or(settings.default_difficulty));
    if let Some(assignment) = &cli.assignment {
        context = context.with_assignment(assignment.clone());
    }

    let mut host = GameHost::new(context, open_store(db_path), SystemClock::new());
    if cli.no_save || !settings.save_results {
        host = host.without_saving();
    }
    let mut app = App::new(host);
    app.start();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let outcome = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    outcome
}

fn start_tui<B: Backend, S: PersistenceService>(
    terminal: &mut Terminal<B>,
    app: &mut App<S, SystemClock>,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    loop {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        match runner.step() {
            PlayEvent::Tick => {
                app.on_tick();
            }
            PlayEvent::Resize => {}
            PlayEvent::Key(key) => {
                if key.kind == KeyEventKind::Press && app.on_key(key) == ExitType::Quit {
                    break;
                }
                // A steady key stream never times out into a Tick.
                app.on_tick();
            }
        }
    }

    Ok(())
}
