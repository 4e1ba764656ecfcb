mod display;

use std::collections::HashMap;
use std::fs::File;
use std::io::{stdout, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use crossterm::{
    cursor,
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    style::Print,
    terminal, ExecutableCommand, QueueableCommand,
};
use tracing::{info, trace, warn};
use tracing_subscriber::filter::EnvFilter;

use knotz_brigade::audio::{Audio, Sound};
use knotz_brigade::input::{InputEvent, InputSnapshot, Movement};
use knotz_brigade::{Game, GameConfig};

use display::TerminalCanvas;

#[derive(Parser)]
#[command(name = "knotz-brigade")]
#[command(about = "Side-scrolling arcade shooter for the terminal")]
struct Args {
    /// TOML file overriding the default tuning
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seed for the game RNG; random when omitted
    #[arg(long)]
    seed: Option<u64>,
    /// Write tracing output to this file (filtered by RUST_LOG)
    #[arg(long)]
    log_file: Option<PathBuf>,
    /// Target frames per second
    #[arg(long, default_value_t = 60)]
    fps: u32,
}

// ── Held-key tracking ─────────────────────────────────────────────────────────

/// A key is considered "held" if its last press/repeat event arrived within
/// this many frames. Covers terminals that don't emit key-release events:
/// at 60 FPS, 8 frames (≈133 ms) outlasts the OS key-repeat interval.
const HOLD_WINDOW: u64 = 8;

/// Returns true if `key` was seen within the last `HOLD_WINDOW` frames.
fn is_held(key_frame: &HashMap<KeyCode, u64>, key: &KeyCode, frame: u64) -> bool {
    key_frame
        .get(key)
        .map(|&last| frame.saturating_sub(last) <= HOLD_WINDOW)
        .unwrap_or(false)
}

fn held_movement(key_frame: &HashMap<KeyCode, u64>, frame: u64) -> Movement {
    let any = |keys: &[KeyCode]| keys.iter().any(|k| is_held(key_frame, k, frame));
    if any(&[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')]) {
        Movement::Up
    } else if any(&[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')]) {
        Movement::Down
    } else {
        Movement::None
    }
}

// ── Audio ─────────────────────────────────────────────────────────────────────

/// Traces every cue; explosions also ring the terminal bell.
#[derive(Default)]
struct LoggingAudio {
    bell: bool,
}

impl Audio for LoggingAudio {
    fn play(&mut self, sound: Sound) {
        trace!(?sound, "sound");
        if sound == Sound::Explosion {
            self.bell = true;
        }
    }
}

impl LoggingAudio {
    fn ring<W: Write>(&mut self, out: &mut W) -> std::io::Result<()> {
        if std::mem::take(&mut self.bell) {
            out.queue(Print('\x07'))?;
            out.flush()?;
        }
        Ok(())
    }
}

// ── Game loop ─────────────────────────────────────────────────────────────────

enum Flow {
    Continue,
    Quit,
}

/// Drain pending terminal events into one-shot game events, updating the
/// held-key map on the way.
///
/// Works on two classes of terminal:
/// * **Keyboard-enhancement capable** (Ghostty, kitty, etc.): proper
///   `Press` / `Repeat` / `Release` events → keys are removed on release.
/// * **Classic terminals**: only `Press` events; keys expire after
///   `HOLD_WINDOW` frames of silence.
fn drain_input(
    rx: &mpsc::Receiver<Event>,
    key_frame: &mut HashMap<KeyCode, u64>,
    frame: u64,
    canvas: &mut TerminalCanvas,
    events: &mut Vec<InputEvent>,
) -> Flow {
    while let Ok(ev) = rx.try_recv() {
        match ev {
            Event::Key(KeyEvent {
                code,
                kind,
                modifiers,
                ..
            }) => match kind {
                KeyEventKind::Press => {
                    key_frame.insert(code, frame);
                    match code {
                        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                            return Flow::Quit
                        }
                        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                            return Flow::Quit
                        }
                        KeyCode::Char(' ') => events.push(InputEvent::Fire),
                        KeyCode::Char('d') | KeyCode::Char('D') => {
                            events.push(InputEvent::ToggleDebug)
                        }
                        KeyCode::Enter => events.push(InputEvent::Confirm),
                        _ => {}
                    }
                }
                KeyEventKind::Repeat => {
                    key_frame.insert(code, frame);
                }
                KeyEventKind::Release => {
                    key_frame.remove(&code);
                }
            },
            Event::Resize(cols, rows) => canvas.resize(cols, rows),
            _ => {}
        }
    }
    Flow::Continue
}

fn game_loop<W: Write>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    config: &GameConfig,
    seed: u64,
    fps: u32,
) -> anyhow::Result<()> {
    let frame_budget = Duration::from_secs_f64(1.0 / f64::from(fps.max(1)));
    let (cols, rows) = terminal::size().context("querying terminal size")?;
    let mut canvas = TerminalCanvas::new(cols, rows, config.width, config.height);
    let mut game = Game::new(config, seed);
    let mut audio = LoggingAudio::default();

    // Maps each held key → the frame it was last seen (press or repeat).
    let mut key_frame: HashMap<KeyCode, u64> = HashMap::new();
    let mut frame: u64 = 0;
    let mut last = Instant::now();

    loop {
        let frame_start = Instant::now();
        frame += 1;

        let mut events = Vec::new();
        if let Flow::Quit = drain_input(rx, &mut key_frame, frame, &mut canvas, &mut events) {
            info!(frame, score = game.session.score, "quit");
            return Ok(());
        }
        let input = InputSnapshot {
            movement: held_movement(&key_frame, frame),
            events,
        };

        // Deltas are unclamped unless the config asks otherwise; a long
        // stall then catches up spawn and ammo timers in one go.
        let mut dt = frame_start.duration_since(last).as_secs_f32() * 1000.0;
        last = frame_start;
        if let Some(max) = config.max_frame_delta_ms {
            dt = dt.min(max);
        }

        // Draw the previous update, then advance.
        canvas.clear();
        game.draw(&mut canvas);
        canvas.present(out)?;
        game.update(dt, &input, &mut audio);
        audio.ring(out)?;

        let elapsed = frame_start.elapsed();
        if elapsed < frame_budget {
            thread::sleep(frame_budget - elapsed);
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn init_logging(path: &Path) -> anyhow::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("creating log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<GameConfig> {
    let config = match path {
        Some(path) => GameConfig::load_from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => GameConfig::default(),
    };
    for warning in config.validate() {
        warn!("config: {warning}");
    }
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    if let Some(path) = &args.log_file {
        init_logging(path)?;
    }
    let config = load_config(args.config.as_deref())?;
    let seed = args.seed.unwrap_or_else(rand::random);
    info!(seed, fps = args.fps, "starting");

    let raw_out = stdout();
    let mut out = BufWriter::new(raw_out);

    terminal::enable_raw_mode()?;
    out.execute(terminal::EnterAlternateScreen)?;
    out.execute(cursor::Hide)?;

    // Request key-release (and key-repeat) events from the terminal.
    // Ghostty / kitty-protocol terminals support this; others fall back gracefully.
    let keyboard_enhanced = out
        .execute(PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
        ))
        .is_ok();

    // Dedicate a thread exclusively to blocking event reads, sending them
    // through a channel so the game loop never has to block on I/O.
    let (tx, rx) = mpsc::channel::<Event>();
    thread::spawn(move || loop {
        match event::read() {
            Ok(ev) => {
                if tx.send(ev).is_err() {
                    break; // receiver dropped → program exiting
                }
            }
            Err(_) => break,
        }
    });

    let result = game_loop(&mut out, &rx, &config, seed, args.fps);

    // Always restore the terminal
    if keyboard_enhanced {
        let _ = out.execute(PopKeyboardEnhancementFlags);
    }
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    result
}
