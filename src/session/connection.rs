//! Device connection lifecycle tracking.
//!
//! Owns the connection state machine, hardware-lock state, and battery/signal
//! telemetry. Transitions happen only on events from the external driver; the
//! manager itself never opens or closes the transport more than once: a
//! second connect request while already connecting or connected is a no-op.

use crate::driver::types::{DeviceCommands, LifecycleEvent, TelemetryEvent, VibrationIntensity};
use crate::notify::{Notification, NotificationSink, NotificationThrottle};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

/// Delay between connect and the confirmation vibration. The pulse is only
/// sent if the transport channel is still ready when the timer fires.
pub const CONFIRM_VIBRATION_DELAY_MS: u64 = 1000;

/// Battery percentage at or below which a warning is raised.
pub const DEFAULT_LOW_BATTERY_PCT: u8 = 15;

/// Minimum spacing between repeated low-battery warnings.
const LOW_BATTERY_THROTTLE_MS: u64 = 60_000;

/// Connection status of the armband device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    ArmSynced,
    ArmUnsynced,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::ArmSynced => "arm_synced",
            ConnectionState::ArmUnsynced => "arm_unsynced",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the session must do in response to a lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkUpdate {
    /// Nothing beyond what the manager already did
    None,
    /// Device became available
    Established,
    /// Device dropped; the lock gate must be forced locked and onboarding
    /// paused
    Lost,
    /// Hardware lock engaged; wins over the software timer
    HardwareLocked,
    /// Hardware lock released
    HardwareUnlocked,
}

/// Tracks device connect/disconnect/arm-sync lifecycle and telemetry.
pub struct ConnectionManager {
    state: ConnectionState,
    device_id: Option<String>,
    hardware_locked: bool,
    battery_level: Option<u8>,
    bluetooth_rssi: Option<i32>,
    low_battery_pct: u8,
    vibration_deadline: Option<DateTime<Utc>>,
    battery_throttle: NotificationThrottle,
}

impl ConnectionManager {
    pub fn new(low_battery_pct: u8) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            device_id: None,
            hardware_locked: false,
            battery_level: None,
            bluetooth_rssi: None,
            low_battery_pct,
            vibration_deadline: None,
            battery_throttle: NotificationThrottle::new(LOW_BATTERY_THROTTLE_MS),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Whether a device is currently available (connected, synced or not).
    pub fn is_connected(&self) -> bool {
        matches!(
            self.state,
            ConnectionState::Connected | ConnectionState::ArmSynced | ConnectionState::ArmUnsynced
        )
    }

    pub fn device_id(&self) -> Option<&str> {
        self.device_id.as_deref()
    }

    /// Whether the hardware reported itself locked.
    pub fn hardware_locked(&self) -> bool {
        self.hardware_locked
    }

    pub fn battery_level(&self) -> Option<u8> {
        self.battery_level
    }

    pub fn bluetooth_rssi(&self) -> Option<i32> {
        self.bluetooth_rssi
    }

    /// Begin connecting. Idempotent: returns `false` without side effects
    /// when already connecting or connected.
    pub fn request_connect(&mut self) -> bool {
        if self.state != ConnectionState::Disconnected {
            trace!(state = %self.state, "connect requested while not disconnected; no-op");
            return false;
        }
        self.state = ConnectionState::Connecting;
        true
    }

    /// Ask the hardware to release its lock and hold it released.
    pub fn request_hardware_unlock(&self, commands: &dyn DeviceCommands) {
        if let Some(device_id) = self.device_id.as_deref() {
            if self.is_connected() {
                commands.request_unlock(device_id, true);
            }
        }
    }

    /// Apply one lifecycle event from the driver.
    pub fn handle_lifecycle(
        &mut self,
        event: &LifecycleEvent,
        now: DateTime<Utc>,
        notifier: &mut dyn NotificationSink,
        commands: &dyn DeviceCommands,
    ) -> LinkUpdate {
        match event {
            LifecycleEvent::Connecting => {
                if self.state == ConnectionState::Disconnected {
                    self.state = ConnectionState::Connecting;
                }
                LinkUpdate::None
            }
            LifecycleEvent::Connected {
                device_id,
                hardware_locked,
            } => {
                debug!(%device_id, hardware_locked, "armband connected");
                self.state = ConnectionState::Connected;
                self.device_id = Some(device_id.clone());
                self.hardware_locked = *hardware_locked;
                self.vibration_deadline =
                    Some(now + Duration::milliseconds(CONFIRM_VIBRATION_DELAY_MS as i64));

                // Release the hardware lock and hold it; the software gate
                // owns locking from here on.
                commands.request_unlock(device_id, true);

                notifier.notify(
                    Notification::success("Armband connected").with_dedupe_key("connection"),
                );
                LinkUpdate::Established
            }
            LifecycleEvent::Disconnected { device_id } => {
                if self.state == ConnectionState::Disconnected {
                    return LinkUpdate::None;
                }
                debug!(%device_id, "armband disconnected");
                self.drop_link();
                notifier.notify(
                    Notification::warning("Armband disconnected").with_dedupe_key("connection"),
                );
                LinkUpdate::Lost
            }
            LifecycleEvent::ArmSynced { arm, .. } => {
                if !self.is_connected() {
                    return LinkUpdate::None;
                }
                self.state = ConnectionState::ArmSynced;
                // Sync can re-engage the hardware lock; release it again.
                self.request_hardware_unlock(commands);
                notifier.notify(
                    Notification::success(format!("Armband synced on {arm} arm"))
                        .with_dedupe_key("sync"),
                );
                LinkUpdate::None
            }
            LifecycleEvent::ArmUnsynced { .. } => {
                if !self.is_connected() {
                    return LinkUpdate::None;
                }
                self.state = ConnectionState::ArmUnsynced;
                notifier.notify(
                    Notification::warning("Armband unsynced. Re-sync to continue")
                        .with_dedupe_key("sync"),
                );
                LinkUpdate::None
            }
            LifecycleEvent::HardwareLocked { .. } => {
                self.hardware_locked = true;
                LinkUpdate::HardwareLocked
            }
            LifecycleEvent::HardwareUnlocked { .. } => {
                self.hardware_locked = false;
                LinkUpdate::HardwareUnlocked
            }
            LifecycleEvent::Fault { message } => {
                warn!(%message, "device fault");
                notifier.notify(Notification::error(format!("Device error: {message}")));
                if self.state == ConnectionState::Disconnected {
                    LinkUpdate::None
                } else {
                    self.drop_link();
                    LinkUpdate::Lost
                }
            }
        }
    }

    /// Apply one telemetry reading.
    pub fn handle_telemetry(
        &mut self,
        event: &TelemetryEvent,
        now: DateTime<Utc>,
        notifier: &mut dyn NotificationSink,
    ) {
        match event {
            TelemetryEvent::BatteryLevel(percent) => {
                self.battery_level = Some(*percent);
                if *percent <= self.low_battery_pct && self.battery_throttle.allow("battery", now)
                {
                    notifier.notify(
                        Notification::warning(format!("Armband battery low ({percent}%)"))
                            .with_dedupe_key("battery"),
                    );
                }
            }
            TelemetryEvent::BluetoothStrength(rssi) => {
                trace!(rssi, "bluetooth strength");
                self.bluetooth_rssi = Some(*rssi);
            }
        }
    }

    /// Fire the confirmation-vibration timer if due. The pulse is skipped
    /// (not deferred) when the channel is no longer ready.
    pub fn tick(&mut self, now: DateTime<Utc>, commands: &dyn DeviceCommands) {
        let due = matches!(self.vibration_deadline, Some(deadline) if now >= deadline);
        if !due {
            return;
        }
        self.vibration_deadline = None;

        if let Some(device_id) = self.device_id.as_deref() {
            if self.is_connected() && commands.channel_ready() {
                commands.vibrate(device_id, VibrationIntensity::Short);
            }
        }
    }

    fn drop_link(&mut self) {
        self.state = ConnectionState::Disconnected;
        self.device_id = None;
        self.hardware_locked = false;
        self.vibration_deadline = None;
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new(DEFAULT_LOW_BATTERY_PCT)
    }
}
