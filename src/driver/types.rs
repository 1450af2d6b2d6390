//! Event and command types for the armband device driver boundary.
//!
//! The driver classifies raw muscle/orientation signals into discrete poses
//! and connection-lifecycle events; everything upstream of these types is
//! owned by the driver and out of scope for this crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A discrete hand pose recognized by the armband driver.
///
/// `Rest` is a quiescent signal and never triggers a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureKind {
    Fist,
    WaveIn,
    WaveOut,
    FingersSpread,
    DoubleTap,
    Rest,
}

impl GestureKind {
    /// All poses the driver can report.
    pub const ALL: [GestureKind; 6] = [
        GestureKind::Fist,
        GestureKind::WaveIn,
        GestureKind::WaveOut,
        GestureKind::FingersSpread,
        GestureKind::DoubleTap,
        GestureKind::Rest,
    ];

    /// Wire name used by the driver protocol.
    pub fn as_str(&self) -> &'static str {
        match self {
            GestureKind::Fist => "fist",
            GestureKind::WaveIn => "wave_in",
            GestureKind::WaveOut => "wave_out",
            GestureKind::FingersSpread => "fingers_spread",
            GestureKind::DoubleTap => "double_tap",
            GestureKind::Rest => "rest",
        }
    }

    /// Whether this pose is the quiescent rest signal.
    pub fn is_rest(&self) -> bool {
        matches!(self, GestureKind::Rest)
    }
}

impl std::fmt::Display for GestureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for GestureKind {
    type Err = UnknownGesture;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fist" => Ok(GestureKind::Fist),
            "wave_in" => Ok(GestureKind::WaveIn),
            "wave_out" => Ok(GestureKind::WaveOut),
            "fingers_spread" => Ok(GestureKind::FingersSpread),
            "double_tap" => Ok(GestureKind::DoubleTap),
            "rest" => Ok(GestureKind::Rest),
            other => Err(UnknownGesture(other.to_string())),
        }
    }
}

/// Error for gesture names the driver protocol does not define.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownGesture(pub String);

impl std::fmt::Display for UnknownGesture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown gesture '{}'", self.0)
    }
}

impl std::error::Error for UnknownGesture {}

/// A single classified pose notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GestureEvent {
    /// The recognized pose
    pub kind: GestureKind,
    /// When the driver reported the pose
    pub timestamp: DateTime<Utc>,
    /// Which device reported it
    pub device_id: String,
}

impl GestureEvent {
    pub fn new(kind: GestureKind, device_id: impl Into<String>) -> Self {
        Self::at(kind, Utc::now(), device_id)
    }

    pub fn at(kind: GestureKind, timestamp: DateTime<Utc>, device_id: impl Into<String>) -> Self {
        Self {
            kind,
            timestamp,
            device_id: device_id.into(),
        }
    }
}

/// Which arm the device is worn on, as reported by arm sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arm {
    Left,
    Right,
}

impl std::fmt::Display for Arm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Arm::Left => f.write_str("left"),
            Arm::Right => f.write_str("right"),
        }
    }
}

/// Connection-lifecycle events from the driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// Transport handshake started
    Connecting,
    /// Device paired and reporting
    Connected {
        device_id: String,
        /// Whether the hardware lock is engaged at connect time
        hardware_locked: bool,
    },
    /// Device dropped from any state
    Disconnected { device_id: String },
    /// Device calibrated against the wearer's arm
    ArmSynced { device_id: String, arm: Arm },
    /// Calibration lost (device slipped or was removed)
    ArmUnsynced { device_id: String },
    /// Hardware lock engaged
    HardwareLocked { device_id: String },
    /// Hardware lock released
    HardwareUnlocked { device_id: String },
    /// Driver library or transport failure; surfaced, never swallowed
    Fault { message: String },
}

/// Telemetry readings from the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TelemetryEvent {
    /// Battery charge, 0-100
    BatteryLevel(u8),
    /// Bluetooth signal strength in dBm
    BluetoothStrength(i32),
}

/// Unified event stream produced by the driver adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverEvent {
    Gesture(GestureEvent),
    Lifecycle(LifecycleEvent),
    Telemetry(TelemetryEvent),
}

/// Haptic feedback strength supported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VibrationIntensity {
    Short,
    Medium,
    Long,
}

impl VibrationIntensity {
    pub fn as_str(&self) -> &'static str {
        match self {
            VibrationIntensity::Short => "short",
            VibrationIntensity::Medium => "medium",
            VibrationIntensity::Long => "long",
        }
    }
}

/// Commands the core may issue back to the device driver.
///
/// All of these are fire-and-forget: implementations must not block and must
/// tolerate being called while the transport is down.
pub trait DeviceCommands {
    /// Trigger a haptic pulse on the device.
    fn vibrate(&self, device_id: &str, intensity: VibrationIntensity);

    /// Ask the hardware to release its lock; `hold` keeps it released.
    fn request_unlock(&self, device_id: &str, hold: bool);

    /// Whether the underlying transport channel is open and ready.
    fn channel_ready(&self) -> bool;
}

/// Errors surfaced by the driver boundary.
#[derive(Debug)]
pub enum DriverError {
    /// The driver library could not be loaded
    LibraryUnavailable(String),
    /// The transport closed or refused the connection
    TransportClosed(String),
    /// The driver is already delivering events
    AlreadyRunning,
}

impl std::fmt::Display for DriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DriverError::LibraryUnavailable(e) => write!(f, "driver library unavailable: {e}"),
            DriverError::TransportClosed(e) => write!(f, "driver transport closed: {e}"),
            DriverError::AlreadyRunning => write!(f, "driver is already running"),
        }
    }
}

impl std::error::Error for DriverError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_gesture_round_trip_names() {
        for kind in GestureKind::ALL {
            assert_eq!(GestureKind::from_str(kind.as_str()).unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_gesture_rejected() {
        let err = GestureKind::from_str("thumbs_up").unwrap_err();
        assert!(err.to_string().contains("thumbs_up"));
    }

    #[test]
    fn test_rest_is_quiescent() {
        assert!(GestureKind::Rest.is_rest());
        assert!(!GestureKind::DoubleTap.is_rest());
    }

    #[test]
    fn test_gesture_event_carries_device() {
        let event = GestureEvent::new(GestureKind::Fist, "armband-1");
        assert_eq!(event.kind, GestureKind::Fist);
        assert_eq!(event.device_id, "armband-1");
    }
}
