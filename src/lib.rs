//! Armdeck - gesture-driven presentation control for a Myo-style armband.
//!
//! This library interprets discrete hand poses reported by an armband driver
//! and turns them into slide-presentation commands, guarded by a software
//! lock so incidental arm movement never flips slides mid-talk.
//!
//! # Safety model
//!
//! - **Locked by default**: navigation gestures are rejected until the wearer
//!   double taps to unlock
//! - **Auto re-lock**: the gate locks itself again after a short window of
//!   inactivity, and immediately on disconnect or hardware lock
//! - **One-shot**: each gesture fires at most once per unlock cycle, so a
//!   held pose cannot skip through the deck
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Armdeck                             │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌──────────┐   ┌──────────┐   ┌──────────┐   ┌──────────┐  │
//! │  │  Driver  │──▶│ Debounce │──▶│ LockGate │──▶│  Mapper  │  │
//! │  │ (events) │   │ (200ms)  │   │ (3s win) │   │ (pure)   │  │
//! │  └──────────┘   └──────────┘   └──────────┘   └──────────┘  │
//! │       │                                            │        │
//! │       ▼                                            ▼        │
//! │  ┌──────────┐                                ┌──────────┐   │
//! │  │Connection│                                │  Viewer  │   │
//! │  │ Manager  │                                │ Commands │   │
//! │  └──────────┘                                └──────────┘   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use armdeck::config::Config;
//! use armdeck::driver::scripted::SharedCommands;
//! use armdeck::notify::ConsoleNotifier;
//! use armdeck::session::ControlSession;
//! use armdeck::viewer::StubViewer;
//!
//! let config = Config::default();
//! let viewer = StubViewer::with_document(12);
//! let session = ControlSession::new(
//!     &config,
//!     viewer,
//!     ConsoleNotifier,
//!     SharedCommands::ready(),
//! );
//! ```

pub mod config;
pub mod core;
pub mod driver;
pub mod notify;
pub mod session;
pub mod viewer;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError};
pub use crate::core::{GateDecision, LockGate, PresentationCommand, RepeatPolicy};
pub use driver::source::{GestureSource, Slot, SubscriptionToken};
pub use driver::types::{DeviceCommands, DriverEvent, GestureEvent, GestureKind};
pub use notify::{Notification, NotificationSink, Severity};
pub use session::{ConnectionState, ControlSession};
pub use viewer::{PresentationController, StubViewer, ViewerSnapshot};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Gesture cheat sheet that can be displayed to users.
pub const GESTURE_GUIDE: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║                  ARMDECK - GESTURE CHEAT SHEET                   ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  DOUBLE TAP        Unlock gestures (works while locked)          ║
║  WAVE LEFT         Next slide                                    ║
║  WAVE RIGHT        Previous slide                                ║
║  FIST              Toggle fullscreen                             ║
║  FINGERS SPREAD    Toggle the sidebar                            ║
║                                                                  ║
║  Gestures lock automatically after 3 seconds of inactivity,     ║
║  and each gesture fires once per unlock. Double tap again to    ║
║  re-arm.                                                         ║
║                                                                  ║
║  Run the tutorial anytime with:                                  ║
║    armdeck run --tutorial                                        ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gesture_guide_contents() {
        assert!(GESTURE_GUIDE.contains("DOUBLE TAP"));
        assert!(GESTURE_GUIDE.contains("Next slide"));
        assert!(GESTURE_GUIDE.contains("tutorial"));
    }
}
