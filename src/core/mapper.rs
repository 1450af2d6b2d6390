//! Pure mapping from gestures to presentation commands.
//!
//! Given a gesture and the current viewer state, produce the command to issue
//! plus user feedback (message + haptic intensity). Page navigation clamps
//! saturating to the document bounds; out-of-range requests become no-ops,
//! never errors.

use crate::driver::types::{GestureKind, VibrationIntensity};
use crate::viewer::{NavKey, ViewerSnapshot};
use serde::{Deserialize, Serialize};

/// Command issued to the external viewer. Each variant carries the resulting
/// target state so the viewer can apply it idempotently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresentationCommand {
    NavigateTo { page: usize },
    ToggleFullscreen { enter: bool },
    ToggleSidebar { visible: bool },
}

/// User-visible feedback accompanying a mapped gesture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub message: String,
    pub haptic: VibrationIntensity,
}

impl Feedback {
    fn new(message: impl Into<String>, haptic: VibrationIntensity) -> Self {
        Self {
            message: message.into(),
            haptic,
        }
    }
}

/// Result of mapping one gesture against the viewer state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapped {
    /// Command for the viewer; `None` when the gesture is feedback-only
    pub command: Option<PresentationCommand>,
    pub feedback: Feedback,
    /// Key simulation issued alongside navigation while fullscreen, for
    /// viewers that only respond to keyboard input in that mode
    pub key_fallback: Option<NavKey>,
}

/// Map a gesture to a presentation command.
///
/// Returns `None` for the quiescent rest pose. Double tap maps to feedback
/// only; the lock gate owns its unlock semantics.
pub fn map(gesture: GestureKind, view: &ViewerSnapshot) -> Option<Mapped> {
    match gesture {
        GestureKind::Rest => None,
        GestureKind::WaveOut => Some(navigate(view, Direction::Next)),
        GestureKind::WaveIn => Some(navigate(view, Direction::Prev)),
        GestureKind::Fist => {
            let enter = !view.fullscreen;
            let message = if enter {
                "Entering fullscreen"
            } else {
                "Exiting fullscreen"
            };
            Some(Mapped {
                command: Some(PresentationCommand::ToggleFullscreen { enter }),
                feedback: Feedback::new(message, VibrationIntensity::Medium),
                key_fallback: None,
            })
        }
        GestureKind::FingersSpread => {
            let visible = !view.sidebar_visible;
            let message = if visible {
                "Sidebar shown"
            } else {
                "Sidebar hidden"
            };
            Some(Mapped {
                command: Some(PresentationCommand::ToggleSidebar { visible }),
                feedback: Feedback::new(message, VibrationIntensity::Short),
                key_fallback: None,
            })
        }
        GestureKind::DoubleTap => Some(Mapped {
            command: None,
            feedback: Feedback::new("View reset", VibrationIntensity::Short),
            key_fallback: None,
        }),
    }
}

enum Direction {
    Next,
    Prev,
}

fn navigate(view: &ViewerSnapshot, direction: Direction) -> Mapped {
    let last_page = view.total_pages.saturating_sub(1);
    let (page, message, key) = match direction {
        Direction::Next => (
            view.current_page.saturating_add(1).min(last_page),
            "Next slide",
            NavKey::Right,
        ),
        Direction::Prev => (
            view.current_page.saturating_sub(1),
            "Previous slide",
            NavKey::Left,
        ),
    };

    Mapped {
        command: Some(PresentationCommand::NavigateTo { page }),
        feedback: Feedback::new(message, VibrationIntensity::Short),
        key_fallback: view.fullscreen.then_some(key),
    }
}
