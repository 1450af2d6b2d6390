//! Demonstration of a scripted presentation-control session.
//!
//! This example shows how to:
//! 1. Build a replay script of driver events
//! 2. Wire a control session to a gesture source
//! 3. Drive the session from a scripted armband
//! 4. Inspect the commands and notifications it produced
//!
//! Run with: cargo run --example replay_demo

use std::time::Duration;

use armdeck::{
    config::Config,
    driver::scripted::{ScriptEvent, ScriptStep, ScriptedDriver},
    driver::source::GestureSource,
    driver::types::GestureKind,
    notify::ConsoleNotifier,
    session::ControlSession,
    viewer::{PresentationController, StubViewer},
    GESTURE_GUIDE,
};
use chrono::Utc;

fn gesture(delay_ms: u64, kind: GestureKind) -> ScriptStep {
    ScriptStep::new(delay_ms, ScriptEvent::Gesture { kind })
}

fn main() {
    println!("Armdeck - Replay Demo");
    println!("=====================");
    println!("{GESTURE_GUIDE}");

    // A short presenting session: connect, unlock, flip two slides, go
    // fullscreen, then try to navigate after the gate has re-locked.
    let steps = vec![
        ScriptStep::new(0, ScriptEvent::Connecting),
        ScriptStep::new(
            100,
            ScriptEvent::Connected {
                hardware_locked: true,
            },
        ),
        ScriptStep::new(100, ScriptEvent::BatteryLevel { percent: 64 }),
        gesture(300, GestureKind::DoubleTap),
        gesture(400, GestureKind::WaveOut),
        gesture(400, GestureKind::DoubleTap),
        gesture(400, GestureKind::WaveOut),
        gesture(400, GestureKind::Fist),
        // Past the three-second unlock window; this wave must be rejected.
        ScriptStep::new(3200, ScriptEvent::Gesture {
            kind: GestureKind::WaveIn,
        }),
        ScriptStep::new(200, ScriptEvent::Disconnected),
    ];

    let config = Config::default();
    let mut driver = ScriptedDriver::new(config.device_id.clone(), steps);
    let mut session = ControlSession::new(
        &config,
        StubViewer::with_document(8),
        ConsoleNotifier,
        driver.commander(),
    );

    let mut source = GestureSource::new();
    session.attach(&mut source);

    driver.start().expect("Error starting scripted driver");
    println!("Replaying scripted session...");
    println!();

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
    session.tick(Utc::now());

    session.detach(&mut source);
    let issued = driver.commander().take_issued();
    driver.stop();

    println!();
    println!("=== Session Summary ===");
    println!(
        "  Final page: {}/{}",
        session.viewer().current_page() + 1,
        session.viewer().total_pages()
    );
    println!("  Fullscreen: {}", session.viewer().is_fullscreen());
    println!("  Gate locked: {}", session.presenter().is_locked());
    println!("  Device commands issued: {}", issued.len());
    for command in issued {
        println!("    {command:?}");
    }
    println!();
    println!("Demo complete!");
}
