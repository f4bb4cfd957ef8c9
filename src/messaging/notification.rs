// Status-line messages from the engine threads to the UI

use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    /// Unix time in milliseconds
    pub timestamp: u64,
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self::at_level(NotificationLevel::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::at_level(NotificationLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::at_level(NotificationLevel::Error, message)
    }

    fn at_level(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp: now_ms(),
        }
    }

    /// Younger than `max_age_ms`
    pub fn is_recent(&self, max_age_ms: u64) -> bool {
        now_ms().saturating_sub(self.timestamp) < max_age_ms
    }
}
