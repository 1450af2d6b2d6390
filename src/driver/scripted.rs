//! Scripted driver for replay sessions, demos, and tests.
//!
//! Plays back a timed list of driver events over a channel, standing in for
//! the real armband transport. Also provides [`SharedCommands`], a recording
//! implementation of [`DeviceCommands`] used wherever no physical device is
//! attached.

use crate::driver::types::{
    Arm, DeviceCommands, DriverError, DriverEvent, GestureEvent, GestureKind, LifecycleEvent,
    TelemetryEvent, VibrationIntensity,
};
use chrono::Utc;
use crossbeam_channel::{bounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// One entry in a replay script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptStep {
    /// Delay before emitting this event, relative to the previous step
    #[serde(default)]
    pub delay_ms: u64,
    /// The event to emit
    pub event: ScriptEvent,
}

impl ScriptStep {
    pub fn new(delay_ms: u64, event: ScriptEvent) -> Self {
        Self { delay_ms, event }
    }
}

/// Script-level event description, expanded to a [`DriverEvent`] at replay
/// time so timestamps reflect actual delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptEvent {
    Gesture { kind: GestureKind },
    Connecting,
    Connected { hardware_locked: bool },
    Disconnected,
    ArmSynced { arm: Arm },
    ArmUnsynced,
    HardwareLocked,
    HardwareUnlocked,
    BatteryLevel { percent: u8 },
    BluetoothStrength { rssi: i32 },
}

impl ScriptEvent {
    /// Expand to a concrete driver event for `device_id` at the current time.
    pub fn to_driver_event(&self, device_id: &str) -> DriverEvent {
        let id = device_id.to_string();
        match self {
            ScriptEvent::Gesture { kind } => {
                DriverEvent::Gesture(GestureEvent::at(*kind, Utc::now(), id))
            }
            ScriptEvent::Connecting => DriverEvent::Lifecycle(LifecycleEvent::Connecting),
            ScriptEvent::Connected { hardware_locked } => {
                DriverEvent::Lifecycle(LifecycleEvent::Connected {
                    device_id: id,
                    hardware_locked: *hardware_locked,
                })
            }
            ScriptEvent::Disconnected => {
                DriverEvent::Lifecycle(LifecycleEvent::Disconnected { device_id: id })
            }
            ScriptEvent::ArmSynced { arm } => DriverEvent::Lifecycle(LifecycleEvent::ArmSynced {
                device_id: id,
                arm: *arm,
            }),
            ScriptEvent::ArmUnsynced => {
                DriverEvent::Lifecycle(LifecycleEvent::ArmUnsynced { device_id: id })
            }
            ScriptEvent::HardwareLocked => {
                DriverEvent::Lifecycle(LifecycleEvent::HardwareLocked { device_id: id })
            }
            ScriptEvent::HardwareUnlocked => {
                DriverEvent::Lifecycle(LifecycleEvent::HardwareUnlocked { device_id: id })
            }
            ScriptEvent::BatteryLevel { percent } => {
                DriverEvent::Telemetry(TelemetryEvent::BatteryLevel(*percent))
            }
            ScriptEvent::BluetoothStrength { rssi } => {
                DriverEvent::Telemetry(TelemetryEvent::BluetoothStrength(*rssi))
            }
        }
    }
}

/// A driver that replays a fixed script of events on a background thread.
pub struct ScriptedDriver {
    device_id: String,
    steps: Vec<ScriptStep>,
    sender: Sender<DriverEvent>,
    receiver: Receiver<DriverEvent>,
    running: Arc<AtomicBool>,
    commands: SharedCommands,
    handle: Option<thread::JoinHandle<()>>,
}

impl ScriptedDriver {
    /// Create a driver for `device_id` that will replay `steps`.
    pub fn new(device_id: impl Into<String>, steps: Vec<ScriptStep>) -> Self {
        let (sender, receiver) = bounded(1024);
        Self {
            device_id: device_id.into(),
            steps,
            sender,
            receiver,
            running: Arc::new(AtomicBool::new(false)),
            commands: SharedCommands::new(),
            handle: None,
        }
    }

    /// Start replaying the script.
    pub fn start(&mut self) -> Result<(), DriverError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(DriverError::AlreadyRunning);
        }
        self.running.store(true, Ordering::SeqCst);
        self.commands.set_ready(true);

        let steps = self.steps.clone();
        let device_id = self.device_id.clone();
        let sender = self.sender.clone();
        let running = self.running.clone();

        self.handle = Some(thread::spawn(move || {
            for step in steps {
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                if step.delay_ms > 0 {
                    thread::sleep(Duration::from_millis(step.delay_ms));
                }
                if sender.send(step.event.to_driver_event(&device_id)).is_err() {
                    break;
                }
            }
            running.store(false, Ordering::SeqCst);
        }));

        Ok(())
    }

    /// Stop the replay and close the command channel.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        self.commands.set_ready(false);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    /// Whether the script is still playing.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Receiver end of the event stream.
    pub fn receiver(&self) -> &Receiver<DriverEvent> {
        &self.receiver
    }

    /// Command endpoint for haptics and hardware unlock requests.
    pub fn commander(&self) -> SharedCommands {
        self.commands.clone()
    }
}

/// A command the core issued back to the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssuedCommand {
    Vibrate {
        device_id: String,
        intensity: VibrationIntensity,
    },
    RequestUnlock {
        device_id: String,
        hold: bool,
    },
}

/// Recording [`DeviceCommands`] endpoint shared between the session and the
/// driver it belongs to. Cloning shares the underlying log.
#[derive(Clone, Default)]
pub struct SharedCommands {
    issued: Arc<Mutex<Vec<IssuedCommand>>>,
    ready: Arc<AtomicBool>,
}

impl SharedCommands {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an endpoint that already reports a ready channel.
    pub fn ready() -> Self {
        let commands = Self::default();
        commands.set_ready(true);
        commands
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Drain the commands issued so far.
    pub fn take_issued(&self) -> Vec<IssuedCommand> {
        let mut issued = self.issued.lock().expect("command log poisoned");
        std::mem::take(&mut *issued)
    }

    /// Number of commands issued so far.
    pub fn issued_count(&self) -> usize {
        self.issued.lock().expect("command log poisoned").len()
    }
}

impl DeviceCommands for SharedCommands {
    fn vibrate(&self, device_id: &str, intensity: VibrationIntensity) {
        let mut issued = self.issued.lock().expect("command log poisoned");
        issued.push(IssuedCommand::Vibrate {
            device_id: device_id.to_string(),
            intensity,
        });
    }

    fn request_unlock(&self, device_id: &str, hold: bool) {
        let mut issued = self.issued.lock().expect("command log poisoned");
        issued.push(IssuedCommand::RequestUnlock {
            device_id: device_id.to_string(),
            hold,
        });
    }

    fn channel_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_replays_in_order() {
        let steps = vec![
            ScriptStep::new(0, ScriptEvent::Connecting),
            ScriptStep::new(
                0,
                ScriptEvent::Connected {
                    hardware_locked: true,
                },
            ),
            ScriptStep::new(
                0,
                ScriptEvent::Gesture {
                    kind: GestureKind::DoubleTap,
                },
            ),
        ];
        let mut driver = ScriptedDriver::new("armband-1", steps);
        driver.start().expect("start scripted driver");

        let first = driver
            .receiver()
            .recv_timeout(Duration::from_secs(1))
            .expect("first event");
        assert!(matches!(
            first,
            DriverEvent::Lifecycle(LifecycleEvent::Connecting)
        ));

        let second = driver
            .receiver()
            .recv_timeout(Duration::from_secs(1))
            .expect("second event");
        assert!(matches!(
            second,
            DriverEvent::Lifecycle(LifecycleEvent::Connected { .. })
        ));

        let third = driver
            .receiver()
            .recv_timeout(Duration::from_secs(1))
            .expect("third event");
        match third {
            DriverEvent::Gesture(e) => assert_eq!(e.kind, GestureKind::DoubleTap),
            other => panic!("expected gesture, got {other:?}"),
        }

        driver.stop();
    }

    #[test]
    fn test_double_start_rejected() {
        let mut driver = ScriptedDriver::new(
            "armband-1",
            vec![ScriptStep::new(200, ScriptEvent::Disconnected)],
        );
        driver.start().expect("first start");
        assert!(matches!(driver.start(), Err(DriverError::AlreadyRunning)));
        driver.stop();
    }

    #[test]
    fn test_shared_commands_record() {
        let commands = SharedCommands::ready();
        commands.vibrate("armband-1", VibrationIntensity::Short);
        commands.request_unlock("armband-1", true);

        assert!(commands.channel_ready());
        let issued = commands.take_issued();
        assert_eq!(issued.len(), 2);
        assert_eq!(
            issued[1],
            IssuedCommand::RequestUnlock {
                device_id: "armband-1".to_string(),
                hold: true,
            }
        );
        assert_eq!(commands.issued_count(), 0);
    }
}
