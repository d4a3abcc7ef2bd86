mod audio;
mod audio_api;
mod catalog;
mod config;
mod loader;
mod middle;
mod pipeline;
mod sequencer;
mod shared;
mod tui;

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crossterm::terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use audio_api::{dispatch_triggers, SoundPlayer};
use catalog::client::{load_catalog, CatalogClient};
use catalog::server::CatalogServer;
use config::Config;
use loader::SamplePlayer;
use middle::Middle;
use pipeline::persistence::{self, Preferences};
use shared::{InputEvent, UiAction};
use tui::mode::TuiState;

const LOG_FILE: &str = "steppad.log";
const FRAME_TIME: Duration = Duration::from_millis(16); // ~60fps

enum Mode {
    Sequencer, // catalog service in the background + the terminal sequencer
    Serve,     // just the catalog service
}

fn main() {
    if let Err(e) = run() {
        log::error!("{e:#}");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

// steppad [serve] [project_dir]
fn parse_args() -> (Mode, PathBuf) {
    let mut args = std::env::args().skip(1).peekable();
    let mode = if args.peek().map(String::as_str) == Some("serve") {
        args.next();
        Mode::Serve
    } else {
        Mode::Sequencer
    };
    let project_dir = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());
    (mode, project_dir)
}

fn init_logging(mode: &Mode, project_dir: &Path) -> anyhow::Result<()> {
    let env = env_logger::Env::default().default_filter_or("info");
    let mut builder = env_logger::Builder::from_env(env);
    if matches!(mode, Mode::Sequencer) {
        // the terminal belongs to the ui, so logs go to <project_dir>/.steppad/steppad.log
        let dir = persistence::state_dir(project_dir);
        std::fs::create_dir_all(&dir)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(LOG_FILE))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.try_init()?;
    Ok(())
}

fn run() -> anyhow::Result<()> {
    let (mode, project_dir) = parse_args();
    init_logging(&mode, &project_dir)?;

    let config = Config::load(&project_dir)?;
    let server = CatalogServer::bind(config.listen_addr()?, config.sounds_dir(&project_dir))?;

    match mode {
        Mode::Serve => {
            println!("Server running on http://{}", server.local_addr()?);
            server.serve()
        }
        Mode::Sequencer => run_sequencer(server, &config, &project_dir),
    }
}

fn run_sequencer(server: CatalogServer, config: &Config, project_dir: &Path) -> anyhow::Result<()> {
    let client = CatalogClient::new(server.local_addr()?);
    let _server_thread = server.spawn()?;
    let catalog = load_catalog(&client);

    let mut prefs = Preferences::open(project_dir);
    let audio = audio::start_audio(config.sample_rate)?;
    // decode at the rate the stream actually runs at
    let mut player = SamplePlayer::new(client.clone(), audio.sender(), audio.sample_rate());
    let tempo = config.tempo.default_tempo()?;
    let mut middle = Middle::new(config.tempo, tempo, catalog, prefs.theme());

    terminal::enable_raw_mode()?;
    let _guard = RawModeGuard; // auto drops when out of scope
    crossterm::execute!(std::io::stdout(), terminal::EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(std::io::stdout());
    let mut term = Terminal::new(backend)?;
    term.clear()?;

    let mut tui_state = TuiState::default();
    let mut last_tick = Instant::now();

    loop {
        let ds = middle.display_state();
        term.draw(|frame| {
            tui::view::render(frame, frame.area(), &ds, &tui_state);
        })?;

        // wake up early when the next step is due before the next frame
        let timeout = middle
            .sequencer
            .time_until_tick()
            .map_or(FRAME_TIME, |t| t.min(FRAME_TIME));
        let events = tui::input::poll_input(timeout, &mut tui_state)?;
        for event in events {
            if event == InputEvent::Quit {
                drop(term);
                drop(audio);
                return Ok(());
            }
            for action in middle.handle_input(event) {
                perform(action, &mut middle, &mut player, &mut prefs, &client);
            }
        }

        let now = Instant::now();
        let triggers = middle.tick(now - last_tick);
        last_tick = now;
        dispatch_triggers(&mut player, &triggers);
    }
}

// side effects the middle layer can't do itself; all of them are non-fatal
fn perform(
    action: UiAction,
    middle: &mut Middle,
    player: &mut SamplePlayer,
    prefs: &mut Preferences,
    client: &CatalogClient,
) {
    match action {
        UiAction::PreloadSound(sound) => {
            if let Err(e) = player.prepare(&sound) {
                log::warn!("could not load {sound}: {e:#}");
                middle.set_status(format!("Could not load {}: {e}", sound.file_name()));
            }
        }
        UiAction::PersistTheme(theme) => {
            if let Err(e) = prefs.change_theme(&theme) {
                log::warn!("could not save theme: {e:#}");
            }
        }
        UiAction::ReloadCatalog => {
            // files may have been fixed or replaced on disk
            player.forget_failures();
            middle.set_catalog(load_catalog(client));
        }
    }
}

struct RawModeGuard;
impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = crossterm::execute!(std::io::stdout(), terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}
