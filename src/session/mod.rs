//! Presentation control session.
//!
//! Wires the connection manager, the presenter gesture pipeline, and the
//! optional onboarding tutorial into one event-driven unit. The session is
//! single-threaded: driver events arrive over a channel, are drained by
//! [`ControlSession::pump`], and timers fire from [`ControlSession::tick`].
//! No handler blocks and no state is shared across threads.

pub mod connection;
pub mod presenter;

pub use connection::{ConnectionManager, ConnectionState, LinkUpdate};
pub use presenter::PresenterControl;

use crate::config::Config;
use crate::core::mapper::PresentationCommand;
use crate::core::onboarding::{OnboardingOutcome, OnboardingSequencer};
use crate::driver::source::{GestureSource, Slot, SubscriptionToken};
use crate::driver::types::{DeviceCommands, DriverEvent};
use crate::notify::{Notification, NotificationSink};
use crate::viewer::PresentationController;
use chrono::{DateTime, Utc};
use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::{debug, info};

/// Consumer name the session registers its subscriptions under.
const CONSUMER: &str = "control-session";

/// One armband-to-viewer control session.
pub struct ControlSession<V, N, C> {
    connection: ConnectionManager,
    presenter: PresenterControl,
    onboarding: Option<OnboardingSequencer>,
    viewer: V,
    notifier: N,
    commands: C,
    inbox_tx: Sender<DriverEvent>,
    inbox_rx: Receiver<DriverEvent>,
    tokens: Vec<SubscriptionToken>,
}

impl<V, N, C> ControlSession<V, N, C>
where
    V: PresentationController,
    N: NotificationSink,
    C: DeviceCommands,
{
    pub fn new(config: &Config, viewer: V, notifier: N, commands: C) -> Self {
        let (inbox_tx, inbox_rx) = unbounded();
        Self {
            connection: ConnectionManager::new(config.low_battery_warn_pct),
            presenter: PresenterControl::new(
                config.refractory_ms,
                config.unlock_window_ms,
                config.repeat_policy,
                config.haptics,
            ),
            onboarding: None,
            viewer,
            notifier,
            commands,
            inbox_tx,
            inbox_rx,
            tokens: Vec::new(),
        }
    }

    /// Enable the onboarding tutorial for this session.
    pub fn with_tutorial(mut self) -> Self {
        let sequencer = OnboardingSequencer::new();
        self.notifier
            .notify(Notification::info(sequencer.current_step().key.instruction()));
        self.onboarding = Some(sequencer);
        self
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    pub fn presenter(&self) -> &PresenterControl {
        &self.presenter
    }

    pub fn onboarding(&self) -> Option<&OnboardingSequencer> {
        self.onboarding.as_ref()
    }

    /// Skip the rest of the onboarding tutorial, if one is running.
    pub fn skip_tutorial(&mut self) {
        if let Some(sequencer) = self.onboarding.as_mut() {
            if !sequencer.is_terminal() {
                sequencer.skip();
                self.notifier
                    .notify(Notification::info("Tutorial skipped"));
            }
        }
    }

    pub fn viewer(&self) -> &V {
        &self.viewer
    }

    pub fn viewer_mut(&mut self) -> &mut V {
        &mut self.viewer
    }

    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }

    /// Register this session on the event source. Idempotent: attaching again
    /// replaces the previous handlers instead of duplicating them.
    pub fn attach(&mut self, source: &mut GestureSource) {
        self.tokens.clear();
        for slot in [Slot::AnyGesture, Slot::Lifecycle, Slot::Telemetry] {
            let tx = self.inbox_tx.clone();
            self.tokens.push(source.subscribe(CONSUMER, slot, move |event| {
                let _ = tx.send(event.clone());
            }));
        }
        debug!(handlers = self.tokens.len(), "session attached to gesture source");
    }

    /// Remove this session's subscriptions from the source.
    pub fn detach(&mut self, source: &mut GestureSource) {
        for token in self.tokens.drain(..) {
            source.unsubscribe(&token);
        }
        debug!("session detached from gesture source");
    }

    /// Drain queued driver events, processing each at `now`.
    ///
    /// Returns the presentation commands applied, in order.
    pub fn pump(&mut self, now: DateTime<Utc>) -> Vec<PresentationCommand> {
        let mut applied = Vec::new();
        while let Ok(event) = self.inbox_rx.try_recv() {
            if let Some(command) = self.handle_event(&event, now) {
                applied.push(command);
            }
        }
        applied
    }

    /// Process one driver event.
    pub fn handle_event(
        &mut self,
        event: &DriverEvent,
        now: DateTime<Utc>,
    ) -> Option<PresentationCommand> {
        match event {
            DriverEvent::Lifecycle(lifecycle) => {
                let update = self.connection.handle_lifecycle(
                    lifecycle,
                    now,
                    &mut self.notifier,
                    &self.commands,
                );
                self.apply_link_update(update);
                None
            }
            DriverEvent::Gesture(gesture) => {
                let command = self.presenter.handle_gesture(
                    gesture,
                    &mut self.viewer,
                    &mut self.notifier,
                    &self.commands,
                    self.connection.is_connected(),
                );

                // The tutorial observes the same stream independently of the
                // lock gate.
                if let Some(sequencer) = self.onboarding.as_mut() {
                    match sequencer.handle_gesture(gesture.kind, now) {
                        OnboardingOutcome::Advanced(step) => {
                            self.notifier
                                .notify(Notification::info(step.instruction()));
                        }
                        OnboardingOutcome::Completed => {
                            info!("onboarding tutorial completed");
                            self.notifier.notify(Notification::success(
                                sequencer.current_step().key.instruction(),
                            ));
                        }
                        OnboardingOutcome::Ignored => {}
                    }
                }

                command
            }
            DriverEvent::Telemetry(telemetry) => {
                self.connection
                    .handle_telemetry(telemetry, now, &mut self.notifier);
                None
            }
        }
    }

    /// Fire all due timers.
    pub fn tick(&mut self, now: DateTime<Utc>) {
        self.presenter.tick(now, &mut self.notifier);
        self.connection.tick(now, &self.commands);
        if let Some(sequencer) = self.onboarding.as_mut() {
            if sequencer.tick(now) {
                self.notifier.notify(
                    Notification::info("Gesture hints are shown at the edge of the screen")
                        .with_dedupe_key("tutorial-hint"),
                );
            }
        }
    }

    fn apply_link_update(&mut self, update: LinkUpdate) {
        match update {
            LinkUpdate::None | LinkUpdate::HardwareUnlocked => {}
            LinkUpdate::Established => {
                if let Some(sequencer) = self.onboarding.as_mut() {
                    sequencer.resume();
                }
            }
            LinkUpdate::Lost => {
                // Synchronous: by the time the disconnect event is handled the
                // gate is locked and the tutorial paused.
                self.presenter.force_lock(&mut self.notifier);
                if let Some(sequencer) = self.onboarding.as_mut() {
                    sequencer.pause();
                }
            }
            LinkUpdate::HardwareLocked => {
                self.presenter.force_lock(&mut self.notifier);
            }
        }
    }
}
