//! Integration tests for the full gesture-to-presentation pipeline

use armdeck::config::Config;
use armdeck::core::lock::RepeatPolicy;
use armdeck::driver::scripted::{IssuedCommand, SharedCommands};
use armdeck::driver::types::{
    DriverEvent, GestureEvent, GestureKind, LifecycleEvent, VibrationIntensity,
};
use armdeck::notify::{MemoryNotifier, Severity};
use armdeck::session::ControlSession;
use armdeck::viewer::{PresentationController, StubViewer};
use armdeck::PresentationCommand;
use chrono::{DateTime, Duration, Utc};

fn session(pages: usize) -> ControlSession<StubViewer, MemoryNotifier, SharedCommands> {
    ControlSession::new(
        &Config::default(),
        StubViewer::with_document(pages),
        MemoryNotifier::new(),
        SharedCommands::ready(),
    )
}

fn connected() -> DriverEvent {
    DriverEvent::Lifecycle(LifecycleEvent::Connected {
        device_id: "armband-1".to_string(),
        hardware_locked: false,
    })
}

fn disconnected() -> DriverEvent {
    DriverEvent::Lifecycle(LifecycleEvent::Disconnected {
        device_id: "armband-1".to_string(),
    })
}

fn gesture(kind: GestureKind, at: DateTime<Utc>) -> DriverEvent {
    DriverEvent::Gesture(GestureEvent::at(kind, at, "armband-1"))
}

#[test]
fn test_presenting_scenario_end_to_end() {
    let mut session = session(10);
    let t0 = Utc::now();

    session.handle_event(&connected(), t0);
    assert!(session.connection().is_connected());

    // Unlock, advance a slide, enter fullscreen.
    let cmd = session.handle_event(&gesture(GestureKind::DoubleTap, t0), t0);
    assert!(cmd.is_none());
    assert!(!session.presenter().is_locked());

    let t1 = t0 + Duration::milliseconds(500);
    let cmd = session.handle_event(&gesture(GestureKind::WaveOut, t1), t1);
    assert_eq!(cmd, Some(PresentationCommand::NavigateTo { page: 1 }));
    assert_eq!(session.viewer().current_page(), 1);

    let t2 = t0 + Duration::milliseconds(1000);
    let cmd = session.handle_event(&gesture(GestureKind::Fist, t2), t2);
    assert_eq!(
        cmd,
        Some(PresentationCommand::ToggleFullscreen { enter: true })
    );
    assert!(session.viewer().is_fullscreen());

    // Three seconds idle: the gate re-locks itself.
    let t3 = t2 + Duration::milliseconds(3000);
    session.tick(t3);
    assert!(session.presenter().is_locked());
    assert!(session.presenter().gate().state().invariant_holds());

    // A wave while locked produces a warning and no command.
    let before = session.viewer().current_page();
    let t4 = t3 + Duration::milliseconds(500);
    let cmd = session.handle_event(&gesture(GestureKind::WaveIn, t4), t4);
    assert!(cmd.is_none());
    assert_eq!(session.viewer().current_page(), before);
    assert_eq!(session.notifier_mut().count_severity(Severity::Warning), 1);
}

#[test]
fn test_stale_unlock_never_fires_navigation() {
    let mut session = session(10);
    let t0 = Utc::now();

    session.handle_event(&connected(), t0);
    session.handle_event(&gesture(GestureKind::DoubleTap, t0), t0);
    assert!(!session.presenter().is_locked());

    // A steady event stream can keep the loop from ever reaching tick();
    // a wave past the unlock window must still be rejected.
    let t1 = t0 + Duration::milliseconds(5000);
    let cmd = session.handle_event(&gesture(GestureKind::WaveOut, t1), t1);
    assert!(cmd.is_none());
    assert_eq!(session.viewer().current_page(), 0);
    assert!(session.presenter().is_locked());
    assert!(session.presenter().gate().state().invariant_holds());
}

#[test]
fn test_disconnect_locks_immediately_and_kills_timer() {
    let mut session = session(10);
    let t0 = Utc::now();

    session.handle_event(&connected(), t0);
    session.handle_event(&gesture(GestureKind::DoubleTap, t0), t0);
    assert!(!session.presenter().is_locked());

    session.handle_event(&disconnected(), t0 + Duration::milliseconds(100));
    assert!(session.presenter().is_locked());
    assert!(session.presenter().gate().state().invariant_holds());

    // The pre-disconnect unlock deadline must not produce a second "locked"
    // notification when it would have expired.
    session.notifier_mut().take();
    session.tick(t0 + Duration::milliseconds(3000));
    assert!(session.notifier_mut().take().is_empty());
}

#[test]
fn test_one_shot_per_unlock_cycle() {
    let mut session = session(10);
    let t0 = Utc::now();

    session.handle_event(&connected(), t0);
    session.handle_event(&gesture(GestureKind::DoubleTap, t0), t0);

    let t1 = t0 + Duration::milliseconds(500);
    assert!(session
        .handle_event(&gesture(GestureKind::WaveOut, t1), t1)
        .is_some());

    // Same gesture again within the cycle: debounce has passed, but the
    // one-shot rule suppresses it.
    let t2 = t0 + Duration::milliseconds(1200);
    assert!(session
        .handle_event(&gesture(GestureKind::WaveOut, t2), t2)
        .is_none());
    assert_eq!(session.viewer().current_page(), 1);

    // Re-arm and it fires again.
    let t3 = t0 + Duration::milliseconds(1500);
    session.handle_event(&gesture(GestureKind::DoubleTap, t3), t3);
    let t4 = t0 + Duration::milliseconds(2000);
    assert!(session
        .handle_event(&gesture(GestureKind::WaveOut, t4), t4)
        .is_some());
    assert_eq!(session.viewer().current_page(), 2);
}

#[test]
fn test_repeatable_policy_allows_held_navigation() {
    let config = Config {
        repeat_policy: RepeatPolicy::Repeatable,
        ..Config::default()
    };
    let mut session = ControlSession::new(
        &config,
        StubViewer::with_document(10),
        MemoryNotifier::new(),
        SharedCommands::ready(),
    );
    let t0 = Utc::now();

    session.handle_event(&connected(), t0);
    session.handle_event(&gesture(GestureKind::DoubleTap, t0), t0);

    for i in 1..=3 {
        let t = t0 + Duration::milliseconds(i * 500);
        assert!(session
            .handle_event(&gesture(GestureKind::WaveOut, t), t)
            .is_some());
    }
    assert_eq!(session.viewer().current_page(), 3);
}

#[test]
fn test_locked_rejections_are_throttled() {
    let mut session = session(10);
    let t0 = Utc::now();

    session.handle_event(&connected(), t0);

    // Five rejected fists inside two seconds: one warning.
    for i in 0..5 {
        let t = t0 + Duration::milliseconds(i * 300);
        session.handle_event(&gesture(GestureKind::Fist, t), t);
    }
    assert_eq!(session.notifier_mut().count_severity(Severity::Warning), 1);

    // After the throttle interval the warning may fire again.
    let t = t0 + Duration::milliseconds(2500);
    session.handle_event(&gesture(GestureKind::Fist, t), t);
    assert_eq!(session.notifier_mut().count_severity(Severity::Warning), 2);
}

#[test]
fn test_connect_requests_unlock_and_confirmation_pulse() {
    let config = Config::default();
    let commands = SharedCommands::ready();
    let mut session = ControlSession::new(
        &config,
        StubViewer::with_document(10),
        MemoryNotifier::new(),
        commands.clone(),
    );
    let t0 = Utc::now();

    session.handle_event(&connected(), t0);
    assert_eq!(
        commands.take_issued(),
        vec![IssuedCommand::RequestUnlock {
            device_id: "armband-1".to_string(),
            hold: true,
        }]
    );

    session.tick(t0 + Duration::milliseconds(1000));
    assert_eq!(
        commands.take_issued(),
        vec![IssuedCommand::Vibrate {
            device_id: "armband-1".to_string(),
            intensity: VibrationIntensity::Short,
        }]
    );
}

#[test]
fn test_tutorial_full_walkthrough() {
    let mut session = session(10).with_tutorial();
    let t0 = Utc::now();
    session.handle_event(&connected(), t0);

    let sequence = [
        GestureKind::DoubleTap,
        GestureKind::WaveOut,
        GestureKind::WaveIn,
        GestureKind::FingersSpread,
        GestureKind::FingersSpread,
        GestureKind::Fist,
    ];
    for (i, kind) in sequence.iter().enumerate() {
        // Spaced out so the debounce filter and unlock window stay out of
        // the way; the tutorial ignores both anyway.
        let t = t0 + Duration::milliseconds((i as i64 + 1) * 700);
        session.handle_event(&gesture(*kind, t), t);
    }

    let onboarding = session.onboarding().expect("tutorial enabled");
    assert!(onboarding.is_terminal());
    assert!(session
        .notifier_mut()
        .notifications()
        .iter()
        .any(|n| n.severity == Severity::Success
            && n.message.contains("learned all the gestures")));
}

#[test]
fn test_tutorial_hint_after_fullscreen_step() {
    let mut session = session(10).with_tutorial();
    let t0 = Utc::now();
    session.handle_event(&connected(), t0);

    let sequence = [
        GestureKind::DoubleTap,
        GestureKind::WaveOut,
        GestureKind::WaveIn,
        GestureKind::FingersSpread,
        GestureKind::FingersSpread,
        GestureKind::Fist,
    ];
    let mut t = t0;
    for kind in sequence {
        t = t + Duration::milliseconds(700);
        session.handle_event(&gesture(kind, t), t);
    }

    session.notifier_mut().take();
    session.tick(t + Duration::milliseconds(1500));
    let notes = session.notifier_mut().take();
    assert!(notes.iter().any(|n| n.message.contains("hints")));
}

#[test]
fn test_battery_warning_from_telemetry() {
    let mut session = session(10);
    let t0 = Utc::now();

    session.handle_event(&connected(), t0);
    session.handle_event(
        &DriverEvent::Telemetry(armdeck::driver::types::TelemetryEvent::BatteryLevel(12)),
        t0,
    );

    assert_eq!(session.connection().battery_level(), Some(12));
    assert!(session
        .notifier_mut()
        .notifications()
        .iter()
        .any(|n| n.severity == Severity::Warning && n.message.contains("battery")));
}
