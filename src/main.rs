//! Armdeck CLI
//!
//! Gesture-driven presentation control for armband devices.

use armdeck::{
    config::Config,
    driver::scripted::{ScriptStep, ScriptedDriver, SharedCommands},
    driver::source::GestureSource,
    driver::types::{Arm, DriverEvent, GestureEvent, GestureKind, LifecycleEvent, TelemetryEvent},
    notify::ConsoleNotifier,
    session::ControlSession,
    viewer::{PresentationController, StubViewer},
    GESTURE_GUIDE, VERSION,
};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::debug;

#[derive(Parser)]
#[command(name = "armdeck")]
#[command(version = VERSION)]
#[command(about = "Gesture-driven presentation control for armband devices", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive control session (events typed on stdin)
    Run {
        /// Number of pages in the stub presentation
        #[arg(long, default_value = "12")]
        pages: usize,

        /// Start with the onboarding tutorial
        #[arg(long)]
        tutorial: bool,

        /// Inactivity window before gestures re-lock (milliseconds)
        #[arg(long)]
        unlock_window_ms: Option<u64>,

        /// Allow a gesture to fire repeatedly within one unlock cycle
        #[arg(long)]
        repeatable: bool,

        /// Disable haptic feedback pulses
        #[arg(long)]
        no_haptics: bool,
    },

    /// Replay a recorded event script against a stub presentation
    Replay {
        /// Path to a JSON script (array of {delay_ms, event} steps)
        script: PathBuf,

        /// Number of pages in the stub presentation
        #[arg(long, default_value = "12")]
        pages: usize,

        /// Run the script through the onboarding tutorial
        #[arg(long)]
        tutorial: bool,
    },

    /// Display the gesture cheat sheet
    Gestures,

    /// Show configuration
    Config,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            pages,
            tutorial,
            unlock_window_ms,
            repeatable,
            no_haptics,
        } => {
            cmd_run(pages, tutorial, unlock_window_ms, repeatable, no_haptics);
        }
        Commands::Replay {
            script,
            pages,
            tutorial,
        } => {
            cmd_replay(&script, pages, tutorial);
        }
        Commands::Gestures => {
            println!("{GESTURE_GUIDE}");
        }
        Commands::Config => {
            cmd_config();
        }
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("armdeck=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(
    unlock_window_ms: Option<u64>,
    repeatable: bool,
    no_haptics: bool,
) -> Config {
    let mut config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: could not load config: {e}");
            Config::default()
        }
    };
    if let Some(window) = unlock_window_ms {
        config.unlock_window_ms = window;
    }
    if repeatable {
        config.repeat_policy = armdeck::RepeatPolicy::Repeatable;
    }
    if no_haptics {
        config.haptics = false;
    }
    if let Err(e) = config.validate() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
    config
}

fn cmd_run(
    pages: usize,
    tutorial: bool,
    unlock_window_ms: Option<u64>,
    repeatable: bool,
    no_haptics: bool,
) {
    let config = load_config(unlock_window_ms, repeatable, no_haptics);

    println!("Armdeck v{VERSION}");
    println!();
    println!("Stub presentation: {pages} pages");
    println!("Unlock window: {}ms", config.unlock_window_ms);
    println!();
    println!("Type events, one per line:");
    println!("  gestures:  double_tap, wave_out, wave_in, fist, fingers_spread, rest");
    println!("  lifecycle: connect, disconnect, sync, unsync, hw_lock, hw_unlock");
    println!("  telemetry: battery <0-100>, rssi <dbm>");
    println!("  tutorial:  skip");
    println!();
    println!("Press Ctrl+C (or Ctrl+D) to stop");
    println!();

    let mut session = ControlSession::new(
        &config,
        StubViewer::with_document(pages),
        ConsoleNotifier,
        SharedCommands::ready(),
    );
    if tutorial {
        session = session.with_tutorial();
    }

    let mut source = GestureSource::new();
    session.attach(&mut source);

    // Set up Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");

    // Stdin reader thread; the channel closing ends the main loop.
    let (input_tx, input_rx) = crossbeam_channel::bounded::<Input>(64);
    let device_id = config.device_id.clone();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut line = String::new();
        loop {
            line.clear();
            match std::io::BufRead::read_line(&mut stdin.lock(), &mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            match parse_line(line.trim(), &device_id) {
                Ok(Some(input)) => {
                    if input_tx.send(input).is_err() {
                        break;
                    }
                }
                Ok(None) => {}
                Err(msg) => eprintln!("{msg}"),
            }
        }
    });

    // Main event loop
    while running.load(Ordering::SeqCst) {
        match input_rx.recv_timeout(Duration::from_millis(50)) {
            Ok(Input::Event(event)) => {
                source.dispatch(&event);
                for command in session.pump(Utc::now()) {
                    debug!(?command, "applied");
                }
                print_page(&session);
            }
            Ok(Input::SkipTutorial) => {
                session.skip_tutorial();
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                session.tick(Utc::now());
            }
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
        }
    }

    println!();
    println!("Stopping session...");
    session.detach(&mut source);
}

fn cmd_replay(script_path: &PathBuf, pages: usize, tutorial: bool) {
    let config = load_config(None, false, false);

    let content = match std::fs::read_to_string(script_path) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading script {script_path:?}: {e}");
            std::process::exit(1);
        }
    };
    let steps: Vec<ScriptStep> = match serde_json::from_str(&content) {
        Ok(steps) => steps,
        Err(e) => {
            eprintln!("Error parsing script: {e}");
            std::process::exit(1);
        }
    };

    println!("Armdeck v{VERSION} - replaying {} steps", steps.len());
    println!();

    let mut driver = ScriptedDriver::new(config.device_id.clone(), steps);
    let mut session = ControlSession::new(
        &config,
        StubViewer::with_document(pages),
        ConsoleNotifier,
        driver.commander(),
    );
    if tutorial {
        session = session.with_tutorial();
    }

    let mut source = GestureSource::new();
    session.attach(&mut source);

    if let Err(e) = driver.start() {
        eprintln!("Error starting replay: {e}");
        std::process::exit(1);
    }

    loop {
        match driver.receiver().recv_timeout(Duration::from_millis(50)) {
            Ok(event) => {
                source.dispatch(&event);
                for command in session.pump(Utc::now()) {
                    println!("  -> {command:?}");
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                session.tick(Utc::now());
                if !driver.is_running() {
                    break;
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
        }
    }
    // Let trailing timers (auto re-lock, confirmation vibration) fire.
    session.tick(Utc::now());

    session.detach(&mut source);
    driver.stop();

    println!();
    println!(
        "Replay finished on page {} of {}",
        session.viewer().current_page() + 1,
        pages
    );
}

fn cmd_config() {
    let config = Config::load().unwrap_or_default();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}

fn print_page<V, N, C>(session: &ControlSession<V, N, C>)
where
    V: armdeck::PresentationController,
    N: armdeck::NotificationSink,
    C: armdeck::DeviceCommands,
{
    println!(
        "  [page {}/{}{}{}]",
        session.viewer().current_page() + 1,
        session.viewer().total_pages(),
        if session.viewer().is_fullscreen() {
            ", fullscreen"
        } else {
            ""
        },
        if session.presenter().is_locked() {
            ", locked"
        } else {
            ", unlocked"
        },
    );
}

/// One parsed stdin line.
enum Input {
    Event(DriverEvent),
    SkipTutorial,
}

/// Parse one stdin line. Empty lines are skipped.
fn parse_line(line: &str, device_id: &str) -> Result<Option<Input>, String> {
    if line.is_empty() {
        return Ok(None);
    }
    let id = device_id.to_string();
    let mut parts = line.split_whitespace();
    let word = parts.next().unwrap_or_default();

    let event = match word {
        "skip" => return Ok(Some(Input::SkipTutorial)),
        "connect" => DriverEvent::Lifecycle(LifecycleEvent::Connected {
            device_id: id,
            hardware_locked: false,
        }),
        "disconnect" => DriverEvent::Lifecycle(LifecycleEvent::Disconnected { device_id: id }),
        "sync" => DriverEvent::Lifecycle(LifecycleEvent::ArmSynced {
            device_id: id,
            arm: Arm::Left,
        }),
        "unsync" => DriverEvent::Lifecycle(LifecycleEvent::ArmUnsynced { device_id: id }),
        "hw_lock" => DriverEvent::Lifecycle(LifecycleEvent::HardwareLocked { device_id: id }),
        "hw_unlock" => DriverEvent::Lifecycle(LifecycleEvent::HardwareUnlocked { device_id: id }),
        "battery" => {
            let percent: u8 = parts
                .next()
                .and_then(|v| v.parse().ok())
                .ok_or("Usage: battery <0-100>")?;
            DriverEvent::Telemetry(TelemetryEvent::BatteryLevel(percent.min(100)))
        }
        "rssi" => {
            let rssi: i32 = parts
                .next()
                .and_then(|v| v.parse().ok())
                .ok_or("Usage: rssi <dbm>")?;
            DriverEvent::Telemetry(TelemetryEvent::BluetoothStrength(rssi))
        }
        gesture => {
            let kind = GestureKind::from_str(gesture).map_err(|e| e.to_string())?;
            DriverEvent::Gesture(GestureEvent::new(kind, id))
        }
    };
    Ok(Some(Input::Event(event)))
}
