//! Presentation viewer boundary.
//!
//! Document rendering, pagination, and fullscreen chrome are owned by an
//! external viewer component; the core only issues narrow commands against
//! this trait and reads back a snapshot of the viewer state. Every call is
//! best-effort: while no document is loaded the viewer treats commands as
//! no-ops, never as errors.

use serde::{Deserialize, Serialize};

/// Navigation key simulated as a fullscreen compatibility fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavKey {
    Left,
    Right,
}

impl NavKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            NavKey::Left => "ArrowLeft",
            NavKey::Right => "ArrowRight",
        }
    }
}

/// Read-only view of the viewer state used for command mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewerSnapshot {
    pub document_loaded: bool,
    pub current_page: usize,
    pub total_pages: usize,
    pub fullscreen: bool,
    pub sidebar_visible: bool,
}

impl ViewerSnapshot {
    /// Snapshot of a viewer with no document.
    pub fn empty() -> Self {
        Self {
            document_loaded: false,
            current_page: 0,
            total_pages: 0,
            fullscreen: false,
            sidebar_visible: false,
        }
    }
}

/// External document viewer the core issues commands to.
pub trait PresentationController {
    fn set_current_page(&mut self, index: usize);
    fn current_page(&self) -> usize;
    fn total_pages(&self) -> usize;
    fn document_loaded(&self) -> bool;
    fn request_fullscreen(&mut self);
    fn exit_fullscreen(&mut self);
    fn is_fullscreen(&self) -> bool;
    fn set_sidebar_visible(&mut self, visible: bool);
    fn is_sidebar_visible(&self) -> bool;

    /// Simulate a navigation keypress; fullscreen fallback for viewers that
    /// only respond to keyboard input in that mode.
    fn simulate_nav_key(&mut self, key: NavKey);

    fn snapshot(&self) -> ViewerSnapshot {
        ViewerSnapshot {
            document_loaded: self.document_loaded(),
            current_page: self.current_page(),
            total_pages: self.total_pages(),
            fullscreen: self.is_fullscreen(),
            sidebar_visible: self.is_sidebar_visible(),
        }
    }
}

/// In-memory viewer used by the CLI, replays, and tests.
#[derive(Debug, Default)]
pub struct StubViewer {
    document: Option<usize>,
    current_page: usize,
    fullscreen: bool,
    sidebar_visible: bool,
    simulated_keys: Vec<NavKey>,
}

impl StubViewer {
    /// Viewer with no document loaded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Viewer with a document of `total_pages` pages open at page 0.
    pub fn with_document(total_pages: usize) -> Self {
        Self {
            document: Some(total_pages),
            ..Self::default()
        }
    }

    /// Load a document, resetting to page 0.
    pub fn load_document(&mut self, total_pages: usize) {
        self.document = Some(total_pages);
        self.current_page = 0;
    }

    /// Keys simulated via the fullscreen fallback, in order.
    pub fn simulated_keys(&self) -> &[NavKey] {
        &self.simulated_keys
    }
}

impl PresentationController for StubViewer {
    fn set_current_page(&mut self, index: usize) {
        let Some(total) = self.document else {
            return;
        };
        if total == 0 {
            return;
        }
        self.current_page = index.min(total - 1);
    }

    fn current_page(&self) -> usize {
        self.current_page
    }

    fn total_pages(&self) -> usize {
        self.document.unwrap_or(0)
    }

    fn document_loaded(&self) -> bool {
        self.document.is_some()
    }

    fn request_fullscreen(&mut self) {
        if self.document.is_some() {
            self.fullscreen = true;
        }
    }

    fn exit_fullscreen(&mut self) {
        self.fullscreen = false;
    }

    fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    fn set_sidebar_visible(&mut self, visible: bool) {
        if self.document.is_some() {
            self.sidebar_visible = visible;
        }
    }

    fn is_sidebar_visible(&self) -> bool {
        self.sidebar_visible
    }

    fn simulate_nav_key(&mut self, key: NavKey) {
        self.simulated_keys.push(key);
    }
}
