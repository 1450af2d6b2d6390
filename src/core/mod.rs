//! Gesture interpretation state machines.
//!
//! This module contains:
//! - Debounce filtering of the raw pose stream
//! - The lock gate guarding against accidental triggering
//! - Pure gesture-to-command mapping
//! - The onboarding tutorial sequencer

pub mod debounce;
pub mod lock;
pub mod mapper;
pub mod onboarding;

// Re-export commonly used types
pub use debounce::{DebounceFilter, DEFAULT_REFRACTORY_MS};
pub use lock::{GateDecision, LockGate, LockState, RepeatPolicy, DEFAULT_UNLOCK_WINDOW_MS};
pub use mapper::{map, Feedback, Mapped, PresentationCommand};
pub use onboarding::{OnboardingOutcome, OnboardingSequencer, StepKey, TutorialStep};
