//! Semantic notification requests emitted by the core.
//!
//! The core never renders toasts itself; it hands `Notification`s to an
//! external sink. `NotificationThrottle` keeps repeated rejections (for
//! example gestures fired while locked) from turning into notification spam.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default display duration for a notification.
pub const DEFAULT_DURATION_MS: u64 = 3000;

/// Minimum spacing between notifications sharing a dedupe key.
pub const DEFAULT_THROTTLE_MS: u64 = 2000;

/// Notification severity, mapped to visual styling by the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

/// A semantic notification request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
    /// Key the sink may use to collapse duplicates
    pub dedupe_key: Option<String>,
    /// Suggested display duration
    pub duration_ms: u64,
}

impl Notification {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
            dedupe_key: None,
            duration_ms: DEFAULT_DURATION_MS,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Info)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Success)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Warning)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Error)
    }

    pub fn with_dedupe_key(mut self, key: impl Into<String>) -> Self {
        self.dedupe_key = Some(key.into());
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }
}

/// External sink for notification requests.
pub trait NotificationSink {
    fn notify(&mut self, notification: Notification);
}

/// Sink that prints notifications to stdout (CLI sessions).
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl NotificationSink for ConsoleNotifier {
    fn notify(&mut self, notification: Notification) {
        println!(
            "[{}] {}",
            notification.severity.as_str(),
            notification.message
        );
    }
}

/// Sink that records notifications in memory, for tests and replays.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    notifications: Vec<Notification>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// All notifications received so far.
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Drain the recorded notifications.
    pub fn take(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Count notifications at a given severity.
    pub fn count_severity(&self, severity: Severity) -> usize {
        self.notifications
            .iter()
            .filter(|n| n.severity == severity)
            .count()
    }
}

impl NotificationSink for MemoryNotifier {
    fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }
}

/// Per-key rate limiter for repeated notifications.
#[derive(Debug)]
pub struct NotificationThrottle {
    min_interval: Duration,
    last_allowed: HashMap<String, DateTime<Utc>>,
}

impl NotificationThrottle {
    pub fn new(min_interval_ms: u64) -> Self {
        Self {
            min_interval: Duration::milliseconds(min_interval_ms as i64),
            last_allowed: HashMap::new(),
        }
    }

    /// Whether a notification for `key` may fire at `now`; records the firing
    /// when allowed.
    pub fn allow(&mut self, key: &str, now: DateTime<Utc>) -> bool {
        match self.last_allowed.get(key) {
            Some(last) if now - *last < self.min_interval => false,
            _ => {
                self.last_allowed.insert(key.to_string(), now);
                true
            }
        }
    }

    /// Forget all throttling history (session restart).
    pub fn reset(&mut self) {
        self.last_allowed.clear();
    }
}

impl Default for NotificationThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_THROTTLE_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_builder() {
        let n = Notification::warning("please unlock")
            .with_dedupe_key("locked-fist")
            .with_duration_ms(1500);
        assert_eq!(n.severity, Severity::Warning);
        assert_eq!(n.dedupe_key.as_deref(), Some("locked-fist"));
        assert_eq!(n.duration_ms, 1500);
    }

    #[test]
    fn test_throttle_blocks_within_interval() {
        let mut throttle = NotificationThrottle::new(2000);
        let t0 = Utc::now();

        assert!(throttle.allow("locked-fist", t0));
        assert!(!throttle.allow("locked-fist", t0 + Duration::milliseconds(500)));
        assert!(throttle.allow("locked-fist", t0 + Duration::milliseconds(2500)));
    }

    #[test]
    fn test_throttle_keys_are_independent() {
        let mut throttle = NotificationThrottle::new(2000);
        let t0 = Utc::now();

        assert!(throttle.allow("locked-fist", t0));
        assert!(throttle.allow("locked-wave_in", t0));
    }

    #[test]
    fn test_memory_notifier_records() {
        let mut sink = MemoryNotifier::new();
        sink.notify(Notification::info("connected"));
        sink.notify(Notification::warning("unsynced"));

        assert_eq!(sink.notifications().len(), 2);
        assert_eq!(sink.count_severity(Severity::Warning), 1);
        assert_eq!(sink.take().len(), 2);
        assert!(sink.notifications().is_empty());
    }
}
