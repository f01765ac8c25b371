mod ui;

use codetime::{
    clock::SystemClock,
    config::{Config, ConfigStore, FileConfigStore},
    display::{LineSink, MemorySink, NoticeLevel},
    language_stats::{EditEvent, TextChange},
    logging,
    runtime::{CrosstermEventSource, FixedTicker, LineEventSource, Runner, TrackerEvent},
    store::FileStatsStore,
    Command, Tracker,
};
use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use crossterm::{
    event::{
        DisableBracketedPaste, DisableFocusChange, EnableBracketedPaste, EnableFocusChange,
        KeyCode, KeyEvent, KeyModifiers,
    },
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
    io::{self, stdin, BufReader},
    path::PathBuf,
    time::Duration,
};

use crate::ui::StatusBar;

const TICK_RATE_MS: u64 = 100;

/// track editing time, per-language counts and live typing speed
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Tracks active editing time with idle detection, counts characters and words per language, and reports average and live typing rates."
)]
pub struct Cli {
    /// config file to use instead of the default location
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// stats record to use instead of the configured one
    #[clap(long, global = true)]
    data_file: Option<PathBuf>,

    #[clap(subcommand)]
    command: Option<Mode>,
}

#[derive(Subcommand, Debug, Clone)]
enum Mode {
    /// type in a scratch buffer with a live status line (default)
    Track {
        /// language id the typed text is counted under
        #[clap(short = 'l', long, default_value = "plaintext")]
        language: String,
    },
    /// read JSON-line edit/focus/command events from stdin
    Feed,
    /// show total time and average rate
    Show,
    /// show the per-language breakdown
    Languages,
    /// reset all statistics
    Reset,
}

impl Cli {
    fn load_config(&self) -> Config {
        let store = match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        };
        let mut config = store.load();
        if let Some(data_file) = &self.data_file {
            config.data_file = Some(data_file.clone());
        }
        config
    }
}

pub struct App {
    pub tracker: Tracker<SystemClock, FileStatsStore, StatusBar>,
    pub language: String,
    pub buffer: String,
    /// Shows the rate breakdown under the editor
    pub show_details: bool,
}

impl App {
    pub fn new(config: Config, language: String) -> Self {
        let store = FileStatsStore::with_path(config.stats_path());
        Self {
            tracker: Tracker::init(config, SystemClock, store, StatusBar::default()),
            language,
            buffer: String::new(),
            show_details: false,
        }
    }

    fn insert(&mut self, text: &str) {
        self.buffer.push_str(text);
        self.tracker
            .record_edit(&EditEvent::typed(self.language.as_str(), text));
    }

    fn delete_back(&mut self) {
        self.buffer.pop();
        // deletions count as activity but add nothing
        self.tracker.record_edit(&EditEvent::new(
            self.language.as_str(),
            vec![TextChange::new("")],
        ));
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = cli.load_config();
    let _log_guard = logging::init(&config.log_level).ok();

    match cli.command.clone().unwrap_or(Mode::Track {
        language: "plaintext".to_string(),
    }) {
        Mode::Track { language } => run_tui(config, language),
        Mode::Feed => run_feed(config),
        Mode::Show => run_command(config, Command::ShowTime),
        Mode::Languages => run_command(config, Command::ShowLanguageStats),
        Mode::Reset => run_command(config, Command::ResetStats),
    }
}

fn run_command(config: Config, command: Command) -> Result<(), Box<dyn Error>> {
    let store = FileStatsStore::with_path(config.stats_path());
    let mut tracker = Tracker::init(config, SystemClock, store, MemorySink::new());
    tracker.execute(command);

    let mut failed = false;
    for notice in &tracker.sink().notices {
        match notice.level {
            NoticeLevel::Info => println!("{}", notice.text),
            NoticeLevel::Error => {
                eprintln!("{}", notice.text);
                failed = true;
            }
        }
    }

    if failed {
        std::process::exit(1);
    }
    Ok(())
}

fn run_feed(config: Config) -> Result<(), Box<dyn Error>> {
    let store = FileStatsStore::with_path(config.stats_path());
    let mut tracker = Tracker::init(config, SystemClock, store, LineSink::new(io::stdout()));
    let runner = Runner::new(
        LineEventSource::new(BufReader::new(stdin())),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    loop {
        match runner.step() {
            TrackerEvent::Edit(edit) => tracker.record_edit(&edit),
            TrackerEvent::Focus(focused) => tracker.focus_changed(focused),
            TrackerEvent::Command(command) => tracker.execute(command),
            TrackerEvent::Closed => break,
            TrackerEvent::Key(_)
            | TrackerEvent::Paste(_)
            | TrackerEvent::Resize
            | TrackerEvent::Tick => {}
        }
        tracker.poll_timers();
    }

    tracker.shutdown();
    Ok(())
}

fn run_tui(config: Config, language: String) -> Result<(), Box<dyn Error>> {
    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableFocusChange,
        EnableBracketedPaste
    )?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config, language);
    let result = start_tui(&mut terminal, &mut app);
    app.tracker.shutdown();

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        DisableFocusChange,
        LeaveAlternateScreen,
    )?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    loop {
        terminal.draw(|f| draw(app, f))?;

        match runner.step() {
            TrackerEvent::Key(key) => {
                if !handle_key(app, key) {
                    break;
                }
            }
            TrackerEvent::Paste(text) => app.insert(&text),
            TrackerEvent::Focus(focused) => app.tracker.focus_changed(focused),
            TrackerEvent::Edit(edit) => app.tracker.record_edit(&edit),
            TrackerEvent::Command(command) => app.tracker.execute(command),
            TrackerEvent::Closed => break,
            TrackerEvent::Resize | TrackerEvent::Tick => {}
        }

        app.tracker.poll_timers();
    }

    Ok(())
}

/// Returns false when the app should quit.
fn handle_key(app: &mut App, key: KeyEvent) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') => return false,
            KeyCode::Char('t') => app.tracker.execute(Command::ShowTime),
            KeyCode::Char('l') => app.tracker.execute(Command::ShowLanguageStats),
            KeyCode::Char('d') => app.show_details = !app.show_details,
            KeyCode::Char('r') => {
                app.tracker.execute(Command::ResetStats);
                app.buffer.clear();
            }
            _ => {}
        }
        return true;
    }

    match key.code {
        KeyCode::Esc => return false,
        KeyCode::Char(c) => app.insert(&c.to_string()),
        KeyCode::Enter => app.insert("\n"),
        KeyCode::Tab => app.insert("\t"),
        KeyCode::Backspace => app.delete_back(),
        _ => {}
    }
    // any typing dismisses the last notice
    if app.tracker.sink().notice.is_some() && matches!(key.code, KeyCode::Char(_) | KeyCode::Enter)
    {
        app.tracker.sink_mut().notice = None;
    }
    true
}

fn draw(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}
