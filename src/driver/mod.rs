//! Armband device driver boundary.
//!
//! The real driver does the sensor processing; this module only defines the
//! event vocabulary it delivers, the subscription adapter over it, and a
//! scripted stand-in used by tests and replay sessions.

pub mod scripted;
pub mod source;
pub mod types;

pub use scripted::{IssuedCommand, ScriptEvent, ScriptStep, ScriptedDriver, SharedCommands};
pub use source::{GestureSource, Slot, SubscriptionToken};
pub use types::{
    Arm, DeviceCommands, DriverError, DriverEvent, GestureEvent, GestureKind, LifecycleEvent,
    TelemetryEvent, UnknownGesture, VibrationIntensity,
};
