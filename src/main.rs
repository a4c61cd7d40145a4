use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::Rect,
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    time::{Duration, Instant},
};
use whack::{
    audio::{AudioSink, TerminalBell},
    best_score::FileBestScoreStore,
    config::{Config, ConfigStore, FileConfigStore},
    runtime::{CrosstermEventSource, FixedTicker, GameEvent, Runner},
    share,
    spawn::RngSource,
    ui, Command, Phase, Session, SessionConfig,
};

const MAX_SLOTS: usize = 9;

/// festive whack-a-mole: tap the grinch, spare santa, beat your best
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A 60 second reaction game. Characters pop up in the houses; hit the Grinch for a point, leave Santa alone or lose one. The pace picks up at 20 and 40 seconds."
)]
pub struct Cli {
    /// number of houses on the board (1-9)
    #[clap(short = 'n', long, value_parser = parse_slots)]
    slots: Option<usize>,

    /// start with sound muted
    #[clap(short = 'm', long)]
    mute: bool,

    /// seed the spawn randomness for a repeatable game
    #[clap(long)]
    seed: Option<u64>,

    /// redraw interval in milliseconds
    #[clap(long)]
    tick_rate_ms: Option<u64>,

    /// store the effective settings as the new defaults
    #[clap(long)]
    save_config: bool,
}

fn parse_slots(s: &str) -> Result<usize, String> {
    let n: usize = s.parse().map_err(|_| format!("`{s}` is not a number"))?;
    if (1..=MAX_SLOTS).contains(&n) {
        Ok(n)
    } else {
        Err(format!("slots must be between 1 and {MAX_SLOTS}"))
    }
}

impl Cli {
    /// CLI flags win over the stored config
    fn merge(&self, stored: Config) -> Config {
        Config {
            slot_count: self.slots.unwrap_or(stored.slot_count).clamp(1, MAX_SLOTS),
            muted: self.mute || stored.muted,
            tick_rate_ms: self.tick_rate_ms.unwrap_or(stored.tick_rate_ms).max(1),
        }
    }
}

pub struct App {
    pub session: Session,
    pub config: Config,
    pub area: Rect,
}

impl App {
    pub fn new(cli: &Cli, config: Config) -> Self {
        let rng = match cli.seed {
            Some(seed) => RngSource::seeded(seed),
            None => RngSource::from_entropy(),
        };
        let session = Session::new(
            SessionConfig::from(&config),
            FileBestScoreStore::new(),
            audio_sink(),
            rng,
        );
        Self {
            session,
            config,
            area: Rect::default(),
        }
    }
}

#[cfg(feature = "sound")]
fn audio_sink() -> Box<dyn AudioSink> {
    match whack::speaker::Speaker::try_default() {
        Ok(speaker) => Box::new(speaker),
        Err(err) => {
            log::warn!("no sound device ({}), falling back to the terminal bell", err);
            Box::new(TerminalBell::stdout())
        }
    }
}

#[cfg(not(feature = "sound"))]
fn audio_sink() -> Box<dyn AudioSink> {
    Box::new(TerminalBell::stdout())
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let config_store = FileConfigStore::new();
    let config = cli.merge(config_store.load());
    let mut app = App::new(&cli, config);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if cli.save_config {
        app.config.muted = app.session.is_muted();
        config_store.save(&app.config)?;
    }

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(app.config.tick_rate_ms)),
    );
    let mut last_step = Instant::now();

    loop {
        terminal.draw(|f| {
            app.area = f.area();
            f.render_widget(&app.session.snapshot(), f.area());
        })?;

        let event = runner.step();

        // Catch the game clock up before handling input so taps see the current board
        let now = Instant::now();
        app.session.submit(Command::Advance(now - last_step));
        last_step = now;

        match event {
            GameEvent::Tick | GameEvent::Resize => {}
            GameEvent::Key(key) => {
                if !on_key(app, key) {
                    break;
                }
            }
            GameEvent::Click { column, row } => {
                let slot_count = app.session.slots().len();
                if let Some(slot) = ui::slot_at(app.area, slot_count, column, row) {
                    app.session.submit(Command::Tap(slot));
                }
            }
        }

        app.session.pump();
    }

    Ok(())
}

/// Returns false when the player wants out
fn on_key(app: &mut App, key: KeyEvent) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return false;
    }

    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => return false,
        KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('s') => {
            app.session.submit(Command::Start);
        }
        KeyCode::Char('r') => app.session.submit(Command::Restart),
        KeyCode::Char('m') => app.session.submit(Command::ToggleMute),
        KeyCode::Char('w') => {
            if app.session.phase() == Phase::Finished {
                share::open_share(app.session.best_score());
            }
        }
        KeyCode::Char(c) => {
            if let Some(slot) = tap_slot(c) {
                app.session.submit(Command::Tap(slot));
            }
        }
        _ => {}
    }
    true
}

/// '1' taps slot 0, '9' taps slot 8
fn tap_slot(c: char) -> Option<usize> {
    match c.to_digit(10)? {
        0 => None,
        d => Some(d as usize - 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use whack::{audio::NullSink, best_score::MemoryBestScoreStore, spawn::ScriptedRandom};

    fn test_app() -> App {
        App {
            session: Session::new(
                SessionConfig::default(),
                MemoryBestScoreStore::new(0),
                NullSink,
                ScriptedRandom::new(),
            ),
            config: Config::default(),
            area: Rect::new(0, 0, 100, 20),
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["whack"]);
        assert_eq!(cli.slots, None);
        assert!(!cli.mute);
        assert_eq!(cli.seed, None);
        assert!(!cli.save_config);
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::parse_from(["whack", "-n", "7", "--mute", "--seed", "42"]);
        assert_eq!(cli.slots, Some(7));
        assert!(cli.mute);
        assert_eq!(cli.seed, Some(42));
    }

    #[test]
    fn test_cli_rejects_bad_slot_counts() {
        assert!(Cli::try_parse_from(["whack", "-n", "0"]).is_err());
        assert!(Cli::try_parse_from(["whack", "-n", "10"]).is_err());
        assert!(Cli::try_parse_from(["whack", "-n", "many"]).is_err());
    }

    #[test]
    fn test_cli_overrides_stored_config() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("config.json"));
        store
            .save(&Config {
                slot_count: 3,
                muted: false,
                tick_rate_ms: 30,
            })
            .unwrap();

        let cli = Cli::parse_from(["whack", "--slots", "6", "-m"]);
        let merged = cli.merge(store.load());
        assert_eq!(merged.slot_count, 6);
        assert!(merged.muted);
        assert_eq!(merged.tick_rate_ms, 30);
    }

    #[test]
    fn test_tap_slot_mapping() {
        assert_eq!(tap_slot('1'), Some(0));
        assert_eq!(tap_slot('9'), Some(8));
        assert_eq!(tap_slot('0'), None);
        assert_eq!(tap_slot('x'), None);
    }

    #[test]
    fn test_keys_drive_session() {
        let mut app = test_app();
        assert!(on_key(&mut app, key(KeyCode::Enter)));
        app.session.pump();
        assert_eq!(app.session.phase(), Phase::Active);

        app.session.submit(Command::Advance(Duration::from_millis(800)));
        assert!(on_key(&mut app, key(KeyCode::Char('1'))));
        assert!(on_key(&mut app, key(KeyCode::Char('m'))));
        app.session.pump();
        assert_eq!(app.session.score(), 1);
        assert!(app.session.is_muted());
    }

    #[test]
    fn test_quit_keys() {
        let mut app = test_app();
        assert!(!on_key(&mut app, key(KeyCode::Esc)));
        assert!(!on_key(
            &mut app,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)
        ));
    }
}
