//! Linear tutorial sequencer teaching the gesture vocabulary.
//!
//! A fixed ordered list of steps, each bound to the one gesture it teaches.
//! Only the bound gesture advances a step; everything else is ignored, since
//! the learner is expected to be experimenting. The sequencer intentionally
//! bypasses the lock gate's one-shot restriction: during the tutorial every
//! correctly matched gesture advances immediately, including repeats of the
//! same physical motion across steps.

use crate::driver::types::GestureKind;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, trace};

/// Delay after the fullscreen step before overlay hints are shown.
pub const HINT_DELAY_MS: u64 = 1500;

/// Identity of a tutorial step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKey {
    Unlock,
    Next,
    Prev,
    ActivatePointer,
    DeactivatePointer,
    Fullscreen,
    End,
}

impl StepKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepKey::Unlock => "unlock",
            StepKey::Next => "next",
            StepKey::Prev => "prev",
            StepKey::ActivatePointer => "activate_pointer",
            StepKey::DeactivatePointer => "deactivate_pointer",
            StepKey::Fullscreen => "fullscreen",
            StepKey::End => "end",
        }
    }

    /// Overlay copy shown while this step is active.
    pub fn instruction(&self) -> &'static str {
        match self {
            StepKey::Unlock => "Double tap to unlock gestures",
            StepKey::Next => "Double tap to unlock, then wave left to go to the next slide",
            StepKey::Prev => "Double tap to unlock, then wave right to go to the previous slide",
            StepKey::ActivatePointer => {
                "Double tap to unlock, then spread your fingers to activate the pointer"
            }
            StepKey::DeactivatePointer => {
                "Double tap to unlock, then spread your fingers to deactivate the pointer"
            }
            StepKey::Fullscreen => "Double tap to unlock, then clench your fist to exit fullscreen",
            StepKey::End => "You've learned all the gestures. Now you can present with the armband",
        }
    }
}

impl std::fmt::Display for StepKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One tutorial step, bound to the gesture it teaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TutorialStep {
    pub key: StepKey,
    /// Gesture that advances this step; `None` only for the terminal step
    pub gesture: Option<GestureKind>,
}

/// Outcome of feeding one gesture to the sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnboardingOutcome {
    /// Advanced to the named step
    Advanced(StepKey),
    /// Advanced onto the terminal step; tutorial finished
    Completed,
    /// Gesture did not match the current step (or the sequencer is paused or
    /// terminal); not an error
    Ignored,
}

/// Linear finite state machine over the fixed tutorial sequence.
#[derive(Debug)]
pub struct OnboardingSequencer {
    steps: Vec<TutorialStep>,
    current_index: usize,
    terminal: bool,
    paused: bool,
    hint_deadline: Option<DateTime<Utc>>,
}

impl OnboardingSequencer {
    /// The standard teaching order.
    pub fn standard_steps() -> Vec<TutorialStep> {
        vec![
            TutorialStep {
                key: StepKey::Unlock,
                gesture: Some(GestureKind::DoubleTap),
            },
            TutorialStep {
                key: StepKey::Next,
                gesture: Some(GestureKind::WaveOut),
            },
            TutorialStep {
                key: StepKey::Prev,
                gesture: Some(GestureKind::WaveIn),
            },
            TutorialStep {
                key: StepKey::ActivatePointer,
                gesture: Some(GestureKind::FingersSpread),
            },
            TutorialStep {
                key: StepKey::DeactivatePointer,
                gesture: Some(GestureKind::FingersSpread),
            },
            TutorialStep {
                key: StepKey::Fullscreen,
                gesture: Some(GestureKind::Fist),
            },
            TutorialStep {
                key: StepKey::End,
                gesture: None,
            },
        ]
    }

    pub fn new() -> Self {
        Self {
            steps: Self::standard_steps(),
            current_index: 0,
            terminal: false,
            paused: false,
            hint_deadline: None,
        }
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_step(&self) -> &TutorialStep {
        &self.steps[self.current_index]
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Feed one gesture; advances iff it matches the current step's bound
    /// gesture. Double tap on a non-unlock step is tolerated and ignored;
    /// every step's instructions begin with the unlock preamble.
    pub fn handle_gesture(&mut self, kind: GestureKind, now: DateTime<Utc>) -> OnboardingOutcome {
        if self.paused || self.terminal {
            return OnboardingOutcome::Ignored;
        }

        let Some(required) = self.current_step().gesture else {
            // Terminal step reached without the flag set; defensive no-op.
            return OnboardingOutcome::Ignored;
        };

        if kind != required {
            trace!(%kind, step = %self.current_step().key, "gesture does not match tutorial step");
            return OnboardingOutcome::Ignored;
        }

        let finished_step = self.current_step().key;
        self.current_index += 1;

        if finished_step == StepKey::Fullscreen {
            // Give the viewer time to settle before overlay hints appear.
            self.hint_deadline = Some(now + Duration::milliseconds(HINT_DELAY_MS as i64));
        }

        let entered = self.current_step().key;
        debug!(from = %finished_step, to = %entered, "tutorial step advanced");

        if entered == StepKey::End {
            self.terminal = true;
            OnboardingOutcome::Completed
        } else {
            OnboardingOutcome::Advanced(entered)
        }
    }

    /// Fire the overlay-hint timer if due. Returns `true` once when the hint
    /// should be shown.
    pub fn tick(&mut self, now: DateTime<Utc>) -> bool {
        match self.hint_deadline {
            Some(deadline) if now >= deadline => {
                self.hint_deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Pause on disconnect; a dead input source must not silently keep
    /// teaching.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume after reconnect.
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Skip the remaining steps, jumping straight to the terminal step and
    /// cancelling the pending hint timer.
    pub fn skip(&mut self) {
        self.current_index = self.steps.len() - 1;
        self.terminal = true;
        self.hint_deadline = None;
    }

    /// Tear the session down: cancel the pending hint timer and reset to the
    /// first step.
    pub fn reset(&mut self) {
        self.current_index = 0;
        self.terminal = false;
        self.paused = false;
        self.hint_deadline = None;
    }
}

impl Default for OnboardingSequencer {
    fn default() -> Self {
        Self::new()
    }
}
