mod tui;

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use crossterm::terminal;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use miniacid::audio::{MiniAcid, OutputDevice};
use miniacid::audio_api::AudioGuard;
use miniacid::pipeline::DirSceneStore;
use tui::input::{self, InputEvent};
use tui::view::StatusSnapshot;

const TEMPO_STEP: f32 = 1.0;

/// Two acid leads and an 8-voice drum machine in the terminal.
#[derive(Parser, Debug)]
#[command(name = "miniacid", version)]
struct Cli {
    /// Project directory; scenes live in <dir>/.miniacid/
    project_dir: Option<PathBuf>,

    /// Scene to load at startup
    #[arg(long, default_value = "default")]
    scene: String,

    /// Override the scene's tempo
    #[arg(long)]
    bpm: Option<f32>,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

// the terminal is in raw mode, so logs go to a file next to the scenes
fn init_logging(project_dir: &Path) -> anyhow::Result<()> {
    let dir = project_dir.join(".miniacid");
    std::fs::create_dir_all(&dir).with_context(|| format!("cannot create {}", dir.display()))?;
    let file = std::fs::File::create(dir.join("miniacid.log")).context("cannot create log file")?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let project_dir = match cli.project_dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("no current directory")?,
    };
    init_logging(&project_dir)?;

    let output = OutputDevice::open_default()?;
    let mut store = DirSceneStore::new(&project_dir);
    let mut engine = MiniAcid::new(output.sample_rate() as f32, Box::new(store.clone()));
    engine.load_or_default(&cli.scene);
    if let Some(bpm) = cli.bpm {
        engine.set_bpm(bpm);
    }
    info!(project = %project_dir.display(), scene = %cli.scene, "miniacid starting");

    let guard = AudioGuard::new(engine);
    let audio = output.start(guard.clone())?;

    terminal::enable_raw_mode()?;
    let _raw = RawModeGuard; // auto drops when out of scope
    let backend = CrosstermBackend::new(std::io::stdout());
    let mut term = Terminal::new(backend)?;
    term.clear()?;

    let tick_rate = Duration::from_millis(33); // ~30fps
    let mut message: Option<String> = None;

    loop {
        if let Some(err) = audio.poll_error() {
            warn!("{err}");
            message = Some(err);
        }

        let mut snapshot = guard.with(|e| StatusSnapshot::capture(e));
        snapshot.message = message.clone();
        term.draw(|frame| tui::view::render(frame, frame.area(), &snapshot))?;

        let Some(event) = input::poll_input(tick_rate)? else {
            continue;
        };
        match event {
            InputEvent::Quit => {
                // save before quitting
                if let Err(e) = guard.save_scene(&mut store) {
                    warn!("could not save scene on quit: {e}");
                }
                drop(term);
                drop(audio);
                info!("miniacid exiting");
                return Ok(());
            }
            InputEvent::Save => {
                message = match guard.save_scene(&mut store) {
                    Ok(name) => Some(format!("saved {name}")),
                    Err(e) => Some(format!("save failed: {e}")),
                };
            }
            other => guard.with(|e| apply(e, other)),
        }
    }
}

fn apply(engine: &mut MiniAcid, event: InputEvent) {
    match event {
        InputEvent::TogglePlay => {
            if engine.is_playing() {
                engine.stop();
            } else {
                engine.start();
            }
        }
        InputEvent::ToggleLeadMute(v) => engine.toggle_synth_mute(v),
        InputEvent::ToggleDrumMute(voice) => engine.toggle_drum_mute(voice),
        InputEvent::ToggleLeadDelay(v) => engine.toggle_synth_delay(v),
        InputEvent::TempoUp => engine.set_bpm(engine.bpm() + TEMPO_STEP),
        InputEvent::TempoDown => engine.set_bpm(engine.bpm() - TEMPO_STEP),
        InputEvent::RandomizeLead(v) => engine.randomize_synth_pattern(v),
        InputEvent::RandomizeDrums => engine.randomize_drum_pattern(),
        InputEvent::ToggleSongMode => engine.toggle_song_mode(),
        InputEvent::Save | InputEvent::Quit => {}
    }
}

struct RawModeGuard;
impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}
