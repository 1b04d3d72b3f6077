use glance::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    engine::MIN_WPM,
    passage::Passage,
    clock::{Clock, SystemClock},
    runtime::{CrosstermEventSource, FixedTicker, ReaderEvent, ReaderEventSource, Runner, Ticker},
    session::ReadingSession,
    words::{self, TextError},
};

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    path::PathBuf,
    sync::Mutex,
    time::Duration,
};
use tracing_subscriber::EnvFilter;

const TICK_RATE_MS: u64 = 100;

/// speed reading trainer: one word at a time, a little faster every step
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal speed reading trainer. Words are flashed one at a time with their focus letter pinned in place, and the pace ramps up on a fixed schedule."
)]
pub struct Cli {
    /// words per minute to start at
    #[clap(short = 'w', long, value_parser = clap::value_parser!(u32).range(i64::from(MIN_WPM)..))]
    start_wpm: Option<u32>,

    /// words per minute added at every ramp step
    #[clap(short = 'i', long)]
    increment: Option<u32>,

    /// seconds between ramp steps
    #[clap(short = 's', long, value_parser = clap::value_parser!(u32).range(1..))]
    interval: Option<u32>,

    /// words per minute changed by the up/down keys
    #[clap(long)]
    wpm_step: Option<u32>,

    /// bundled passage to read (see --list-passages)
    #[clap(short = 'p', long, conflicts_with = "text")]
    passage: Option<String>,

    /// read a text file instead of a bundled passage
    #[clap(short = 't', long)]
    text: Option<PathBuf>,

    /// list the bundled passages and exit
    #[clap(long)]
    list_passages: bool,

    /// print the session result as json on exit
    #[clap(long)]
    json: bool,

    /// remember these settings for the next run
    #[clap(long)]
    save: bool,

    /// write logs to the default log file
    #[clap(long)]
    log: bool,

    /// write logs to this file
    #[clap(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

impl Cli {
    /// Overlay command line flags on the stored settings
    fn apply(&self, config: &mut Config) {
        if let Some(wpm) = self.start_wpm {
            config.start_wpm = wpm;
        }
        if let Some(increment) = self.increment {
            config.increment = increment;
        }
        if let Some(interval) = self.interval {
            config.interval_secs = interval;
        }
        if let Some(step) = self.wpm_step {
            config.wpm_step = step;
        }
    }

    /// Resolve what to read: a text file, a named passage, or a random one
    fn material(&self, config: &mut Config) -> Result<(String, Vec<String>), TextError> {
        if let Some(path) = &self.text {
            let title = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            return Ok((title, words::words_from_file(path)?));
        }

        let passage = match self.passage.as_ref().or(config.passage.as_ref()) {
            Some(id) => Passage::find(id)?,
            None => Passage::random()?,
        };
        config.passage = Some(passage.id.clone());
        Ok((passage.title.clone(), passage.words()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Flow {
    Continue,
    Quit,
}

#[derive(Debug)]
pub struct App<C: Clock + Clone + 'static = SystemClock> {
    pub session: ReadingSession<C>,
}

impl<C: Clock + Clone + 'static> App<C> {
    pub fn new(session: ReadingSession<C>) -> Self {
        Self { session }
    }

    /// Wait for the next event or word deadline, handle it, then advance
    /// the engine. Polling after every event keeps words moving while a key
    /// is held down.
    fn step<E: ReaderEventSource, T: Ticker>(&mut self, runner: &Runner<E, T>) -> Flow {
        let flow = match runner.step_until(self.session.next_deadline()) {
            ReaderEvent::Key(key) => self.on_key(key),
            ReaderEvent::Tick | ReaderEvent::Resize => Flow::Continue,
        };
        self.session.tick();
        flow
    }

    fn on_key(&mut self, key: KeyEvent) -> Flow {
        if key.kind == KeyEventKind::Release {
            return Flow::Continue;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Flow::Quit;
        }

        if self.session.is_running() {
            match key.code {
                KeyCode::Char(' ') => self.session.toggle_pause(),
                KeyCode::Esc => self.session.stop(),
                KeyCode::Up => self.session.speed_up(),
                KeyCode::Down => self.session.slow_down(),
                _ => {}
            }
            return Flow::Continue;
        }

        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => Flow::Quit,
            KeyCode::Char('r') if self.session.has_finished() => {
                self.session.start();
                Flow::Continue
            }
            KeyCode::Char(' ') if !self.session.has_finished() => {
                self.session.start();
                Flow::Continue
            }
            _ => Flow::Continue,
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if cli.list_passages {
        for p in Passage::all() {
            println!(
                "{:<20} {:<12} {:>4} words  {}",
                p.id,
                p.category,
                p.word_count(),
                p.title
            );
        }
        return Ok(());
    }

    init_logging(&cli)?;

    let store = FileConfigStore::new();
    let mut config = store.load();
    cli.apply(&mut config);

    let (title, words) = match cli.material(&mut config) {
        Ok(material) => material,
        Err(e) => Cli::command().error(ErrorKind::InvalidValue, e).exit(),
    };
    let session = match ReadingSession::new(title, words, &config) {
        Ok(session) => session,
        Err(e) => Cli::command().error(ErrorKind::InvalidValue, e).exit(),
    };

    if cli.save {
        store.save(&config)?;
        log::info!("saved settings to {}", store.path().display());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(session);
    let outcome = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    outcome?;

    if cli.json {
        if let Some(summary) = app.session.summary() {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}

fn init_logging(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let path = match (&cli.log_file, cli.log) {
        (Some(path), _) => path.clone(),
        (None, true) => AppDirs::log_path().ok_or("no directory available for the log file")?,
        (None, false) => return Ok(()),
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    // the terminal belongs to the UI, so logs only ever go to a file
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("glance=info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    app.session.start();

    loop {
        terminal.draw(|f| ui(app, f))?;

        if app.step(&runner) == Flow::Quit {
            break;
        }
    }

    Ok(())
}

fn ui(app: &mut App, f: &mut Frame) {
    f.render_widget(&app.session, f.area());
}
