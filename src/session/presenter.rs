//! Presenter-mode gesture pipeline.
//!
//! Chains debounce filtering, the lock gate, and the command mapper, then
//! applies the mapped command to the viewer and emits feedback. Commands are
//! applied synchronously; by the time `handle_gesture` returns the viewer
//! already reflects the gesture.

use crate::core::debounce::DebounceFilter;
use crate::core::lock::{GateDecision, LockGate, RepeatPolicy};
use crate::core::mapper::{self, PresentationCommand};
use crate::driver::types::{DeviceCommands, GestureEvent, VibrationIntensity};
use crate::notify::{Notification, NotificationSink, NotificationThrottle, DEFAULT_THROTTLE_MS};
use crate::viewer::PresentationController;
use chrono::{DateTime, Utc};
use tracing::{debug, trace};

/// Debounce -> lock gate -> mapper -> viewer, as a single stateful pipeline.
pub struct PresenterControl {
    debounce: DebounceFilter,
    gate: LockGate,
    locked_warnings: NotificationThrottle,
    haptics: bool,
}

impl PresenterControl {
    pub fn new(
        refractory_ms: u64,
        unlock_window_ms: u64,
        repeat_policy: RepeatPolicy,
        haptics: bool,
    ) -> Self {
        Self {
            debounce: DebounceFilter::new(refractory_ms),
            gate: LockGate::new(unlock_window_ms, repeat_policy),
            locked_warnings: NotificationThrottle::new(DEFAULT_THROTTLE_MS),
            haptics,
        }
    }

    pub fn is_locked(&self) -> bool {
        self.gate.is_locked()
    }

    pub fn gate(&self) -> &LockGate {
        &self.gate
    }

    /// Process one raw gesture event end to end.
    ///
    /// Returns the command applied to the viewer, if any.
    pub fn handle_gesture<V, N, C>(
        &mut self,
        event: &GestureEvent,
        viewer: &mut V,
        notifier: &mut N,
        commands: &C,
        connected: bool,
    ) -> Option<PresentationCommand>
    where
        V: PresentationController,
        N: NotificationSink,
        C: DeviceCommands + ?Sized,
    {
        if event.kind.is_rest() {
            return None;
        }

        if !self.debounce.admit(event.kind, event.timestamp) {
            return None;
        }

        match self.gate.handle_gesture(event.kind, event.timestamp) {
            GateDecision::Unlocked { rearmed } => {
                if !rearmed {
                    notifier.notify(
                        Notification::info("Gestures unlocked").with_dedupe_key("lock-state"),
                    );
                }
                self.pulse(event, commands, connected, VibrationIntensity::Short);
                None
            }
            GateDecision::Forward(kind) => {
                let mapped = mapper::map(kind, &viewer.snapshot())?;
                let applied = mapped.command.map(|command| {
                    self.apply(command, viewer);
                    command
                });

                if let Some(key) = mapped.key_fallback {
                    viewer.simulate_nav_key(key);
                }

                notifier.notify(Notification::info(mapped.feedback.message.clone()));
                self.pulse(event, commands, connected, mapped.feedback.haptic);
                applied
            }
            GateDecision::RejectedLocked { dedupe_key } => {
                if self.locked_warnings.allow(&dedupe_key, event.timestamp) {
                    notifier.notify(
                        Notification::warning("Gestures are locked. Double tap to unlock")
                            .with_dedupe_key(dedupe_key),
                    );
                }
                None
            }
            GateDecision::AlreadyFired => {
                trace!(kind = %event.kind, "suppressed repeat within unlock cycle");
                None
            }
        }
    }

    /// Fire the auto-relock timer if due.
    pub fn tick<N: NotificationSink>(&mut self, now: DateTime<Utc>, notifier: &mut N) {
        if self.gate.tick(now) {
            notifier
                .notify(Notification::info("Gestures locked").with_dedupe_key("lock-state"));
        }
    }

    /// Lock immediately (hardware lock or disconnect). Quiet when the gate
    /// was already locked.
    pub fn force_lock<N: NotificationSink>(&mut self, notifier: &mut N) {
        if self.gate.force_lock() {
            debug!("gesture gate force-locked");
            notifier
                .notify(Notification::info("Gestures locked").with_dedupe_key("lock-state"));
        }
    }

    /// Clear per-session state (debounce history, warnings). Locks the gate.
    pub fn reset(&mut self) {
        self.debounce.reset();
        self.locked_warnings.reset();
        self.gate.force_lock();
    }

    fn apply<V: PresentationController>(&self, command: PresentationCommand, viewer: &mut V) {
        match command {
            PresentationCommand::NavigateTo { page } => viewer.set_current_page(page),
            PresentationCommand::ToggleFullscreen { enter } => {
                if enter {
                    viewer.request_fullscreen();
                } else {
                    viewer.exit_fullscreen();
                }
            }
            PresentationCommand::ToggleSidebar { visible } => viewer.set_sidebar_visible(visible),
        }
    }

    fn pulse<C: DeviceCommands + ?Sized>(
        &self,
        event: &GestureEvent,
        commands: &C,
        connected: bool,
        intensity: VibrationIntensity,
    ) {
        if self.haptics && connected && commands.channel_ready() {
            commands.vibrate(&event.device_id, intensity);
        }
    }
}
