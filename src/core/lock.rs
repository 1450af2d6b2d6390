//! Software lock gate for gesture commands.
//!
//! Navigational gestures are only honored while unlocked; unlocking requires
//! a double tap, and the gate re-locks automatically after a short window of
//! inactivity or immediately on a hardware lock / disconnect. Between unlock
//! events each gesture fires at most once (one-shot-per-cycle), so a held
//! pose the sensor keeps re-reporting cannot fire navigation repeatedly.

use crate::driver::types::GestureKind;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, trace};

/// Default inactivity window before auto re-lock.
pub const DEFAULT_UNLOCK_WINDOW_MS: u64 = 3000;

/// Whether a gesture may fire more than once per unlock cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatPolicy {
    /// Each gesture fires at most once between unlocks (default)
    OneShot,
    /// A gesture may fire repeatedly while unlocked
    Repeatable,
}

/// Lock-gate state. Invariant: `is_locked` implies `fired_since_unlock` is
/// empty and `auto_relock_deadline` is `None`.
#[derive(Debug, Clone)]
pub struct LockState {
    pub is_locked: bool,
    pub unlocked_at: Option<DateTime<Utc>>,
    pub auto_relock_deadline: Option<DateTime<Utc>>,
    pub fired_since_unlock: HashSet<GestureKind>,
}

impl LockState {
    fn locked() -> Self {
        Self {
            is_locked: true,
            unlocked_at: None,
            auto_relock_deadline: None,
            fired_since_unlock: HashSet::new(),
        }
    }

    /// Check the structural invariant; used by tests after every transition.
    pub fn invariant_holds(&self) -> bool {
        !self.is_locked
            || (self.fired_since_unlock.is_empty() && self.auto_relock_deadline.is_none())
    }
}

/// Outcome of feeding one gesture through the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Double tap accepted; `rearmed` when the gate was already unlocked
    Unlocked { rearmed: bool },
    /// Gesture may be forwarded to the command mapper
    Forward(GestureKind),
    /// Rejected because the gate is locked; carries a per-gesture dedupe key
    /// for the rate-limited warning notification
    RejectedLocked { dedupe_key: String },
    /// Rejected because this gesture already fired this unlock cycle
    AlreadyFired,
}

/// The security/attention gate in front of the command mapper.
#[derive(Debug)]
pub struct LockGate {
    unlock_window: Duration,
    repeat_policy: RepeatPolicy,
    state: LockState,
}

impl LockGate {
    pub fn new(unlock_window_ms: u64, repeat_policy: RepeatPolicy) -> Self {
        Self {
            unlock_window: Duration::milliseconds(unlock_window_ms as i64),
            repeat_policy,
            state: LockState::locked(),
        }
    }

    /// Current gate state.
    pub fn state(&self) -> &LockState {
        &self.state
    }

    pub fn is_locked(&self) -> bool {
        self.state.is_locked
    }

    /// Feed one debounced, non-rest gesture through the gate.
    ///
    /// Double tap is the one gesture processed even while locked.
    pub fn handle_gesture(&mut self, kind: GestureKind, now: DateTime<Utc>) -> GateDecision {
        // A lapsed unlock window locks the gate even when the timer has not
        // fired yet; a busy event stream can starve `tick` indefinitely.
        self.tick(now);

        if kind == GestureKind::DoubleTap {
            let rearmed = !self.state.is_locked;
            self.state.is_locked = false;
            self.state.unlocked_at = Some(now);
            self.state.auto_relock_deadline = Some(now + self.unlock_window);
            self.state.fired_since_unlock.clear();
            debug!(rearmed, "gesture gate unlocked");
            return GateDecision::Unlocked { rearmed };
        }

        if self.state.is_locked {
            trace!(%kind, "gesture rejected while locked");
            return GateDecision::RejectedLocked {
                dedupe_key: format!("locked-{kind}"),
            };
        }

        if self.repeat_policy == RepeatPolicy::OneShot
            && self.state.fired_since_unlock.contains(&kind)
        {
            trace!(%kind, "gesture already fired this unlock cycle");
            return GateDecision::AlreadyFired;
        }

        self.state.fired_since_unlock.insert(kind);
        GateDecision::Forward(kind)
    }

    /// Fire the auto-relock timer if its deadline has passed.
    ///
    /// Returns `true` when the gate transitioned to locked.
    pub fn tick(&mut self, now: DateTime<Utc>) -> bool {
        match self.state.auto_relock_deadline {
            Some(deadline) if now >= deadline && !self.state.is_locked => {
                debug!("auto re-lock after inactivity");
                self.state = LockState::locked();
                true
            }
            _ => false,
        }
    }

    /// Immediate lock from hardware or disconnect; always wins over the
    /// software timer. Returns `true` when the gate was unlocked.
    pub fn force_lock(&mut self) -> bool {
        let was_unlocked = !self.state.is_locked;
        self.state = LockState::locked();
        was_unlocked
    }
}

impl Default for LockGate {
    fn default() -> Self {
        Self::new(DEFAULT_UNLOCK_WINDOW_MS, RepeatPolicy::OneShot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unlocked_gate(at: DateTime<Utc>) -> LockGate {
        let mut gate = LockGate::default();
        assert_eq!(
            gate.handle_gesture(GestureKind::DoubleTap, at),
            GateDecision::Unlocked { rearmed: false }
        );
        gate
    }

    #[test]
    fn test_starts_locked() {
        let gate = LockGate::default();
        assert!(gate.is_locked());
        assert!(gate.state().invariant_holds());
    }

    #[test]
    fn test_locked_rejects_navigation() {
        let mut gate = LockGate::default();
        let now = Utc::now();

        for kind in [
            GestureKind::Fist,
            GestureKind::WaveIn,
            GestureKind::WaveOut,
            GestureKind::FingersSpread,
        ] {
            match gate.handle_gesture(kind, now) {
                GateDecision::RejectedLocked { dedupe_key } => {
                    assert_eq!(dedupe_key, format!("locked-{kind}"));
                }
                other => panic!("expected rejection, got {other:?}"),
            }
            assert!(gate.state().invariant_holds());
        }
    }

    #[test]
    fn test_one_shot_per_unlock_cycle() {
        let t0 = Utc::now();
        let mut gate = unlocked_gate(t0);

        assert_eq!(
            gate.handle_gesture(GestureKind::WaveIn, t0),
            GateDecision::Forward(GestureKind::WaveIn)
        );
        assert_eq!(
            gate.handle_gesture(GestureKind::WaveIn, t0),
            GateDecision::AlreadyFired
        );
        // Another kind still passes within the same cycle.
        assert_eq!(
            gate.handle_gesture(GestureKind::Fist, t0),
            GateDecision::Forward(GestureKind::Fist)
        );

        // A fresh double tap re-arms the cycle.
        assert_eq!(
            gate.handle_gesture(GestureKind::DoubleTap, t0),
            GateDecision::Unlocked { rearmed: true }
        );
        assert_eq!(
            gate.handle_gesture(GestureKind::WaveIn, t0),
            GateDecision::Forward(GestureKind::WaveIn)
        );
    }

    #[test]
    fn test_repeatable_policy_allows_repeats() {
        let t0 = Utc::now();
        let mut gate = LockGate::new(DEFAULT_UNLOCK_WINDOW_MS, RepeatPolicy::Repeatable);
        gate.handle_gesture(GestureKind::DoubleTap, t0);

        assert_eq!(
            gate.handle_gesture(GestureKind::WaveIn, t0),
            GateDecision::Forward(GestureKind::WaveIn)
        );
        assert_eq!(
            gate.handle_gesture(GestureKind::WaveIn, t0),
            GateDecision::Forward(GestureKind::WaveIn)
        );
    }

    #[test]
    fn test_auto_relock_at_deadline() {
        let t0 = Utc::now();
        let mut gate = unlocked_gate(t0);
        gate.handle_gesture(GestureKind::WaveOut, t0);

        // One millisecond before the deadline: still unlocked.
        assert!(!gate.tick(t0 + Duration::milliseconds(2999)));
        assert!(!gate.is_locked());

        // At the deadline: locked, fired set cleared.
        assert!(gate.tick(t0 + Duration::milliseconds(3000)));
        assert!(gate.is_locked());
        assert!(gate.state().fired_since_unlock.is_empty());
        assert!(gate.state().invariant_holds());
    }

    #[test]
    fn test_rearm_extends_deadline() {
        let t0 = Utc::now();
        let mut gate = unlocked_gate(t0);

        let t1 = t0 + Duration::milliseconds(2000);
        gate.handle_gesture(GestureKind::DoubleTap, t1);

        // Past the original deadline but within the re-armed one.
        assert!(!gate.tick(t0 + Duration::milliseconds(3500)));
        assert!(!gate.is_locked());
        assert!(gate.tick(t1 + Duration::milliseconds(3000)));
    }

    #[test]
    fn test_force_lock_wins_over_timer() {
        let t0 = Utc::now();
        let mut gate = unlocked_gate(t0);
        gate.handle_gesture(GestureKind::Fist, t0);

        assert!(gate.force_lock());
        assert!(gate.is_locked());
        assert!(gate.state().invariant_holds());

        // The stale deadline must not fire anything later.
        assert!(!gate.tick(t0 + Duration::milliseconds(5000)));
    }

    #[test]
    fn test_expired_window_rejects_gesture_without_tick() {
        let t0 = Utc::now();
        let mut gate = unlocked_gate(t0);

        // No tick() between the unlock and this gesture; the lapsed window
        // must still lock the gate.
        let decision = gate.handle_gesture(GestureKind::WaveOut, t0 + Duration::milliseconds(5000));
        assert!(matches!(decision, GateDecision::RejectedLocked { .. }));
        assert!(gate.is_locked());
        assert!(gate.state().invariant_holds());
    }

    #[test]
    fn test_double_tap_past_expired_window_is_fresh_unlock() {
        let t0 = Utc::now();
        let mut gate = unlocked_gate(t0);
        gate.handle_gesture(GestureKind::WaveOut, t0);

        let decision =
            gate.handle_gesture(GestureKind::DoubleTap, t0 + Duration::milliseconds(5000));
        assert_eq!(decision, GateDecision::Unlocked { rearmed: false });
        assert!(gate.state().fired_since_unlock.is_empty());
    }

    #[test]
    fn test_force_lock_when_already_locked_is_noop() {
        let mut gate = LockGate::default();
        assert!(!gate.force_lock());
        assert!(gate.state().invariant_holds());
    }
}
