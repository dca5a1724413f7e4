//! User-facing notifications
//!
//! At most [`MAX_NOTIFICATIONS`] are retained, newest first; pushing past the
//! limit drops the oldest. Each one expires after its duration.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use console::style;
use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;
use ulid::Ulid;

pub const MAX_NOTIFICATIONS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    Info,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationKind::Success => write!(f, "success"),
            NotificationKind::Error => write!(f, "error"),
            NotificationKind::Warning => write!(f, "warning"),
            NotificationKind::Info => write!(f, "info"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: Ulid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub created: DateTime<Utc>,
    pub duration: Duration,
}

impl Notification {
    pub fn expires_at(&self) -> DateTime<Utc> {
        ChronoDuration::from_std(self.duration)
            .ok()
            .and_then(|duration| self.created.checked_add_signed(duration))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at()
    }

    /// One styled line for the terminal
    pub fn render(&self) -> String {
        let glyph = match self.kind {
            NotificationKind::Success => style("✓").green(),
            NotificationKind::Error => style("✗").red(),
            NotificationKind::Warning => style("!").yellow(),
            NotificationKind::Info => style("→").blue(),
        };
        format!("{} {}: {}", glyph, style(&self.title).bold(), self.message)
    }
}

/// Bounded, newest-first notification queue
#[derive(Debug)]
pub struct NotificationCenter {
    items: VecDeque<Notification>,
    duration: Duration,
}

impl NotificationCenter {
    pub fn new(duration: Duration) -> Self {
        Self {
            items: VecDeque::with_capacity(MAX_NOTIFICATIONS),
            duration,
        }
    }

    /// Add a notification created now
    pub fn push(
        &mut self,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> &Notification {
        self.push_at(kind, title, message, Utc::now())
    }

    pub fn push_at(
        &mut self,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        created: DateTime<Utc>,
    ) -> &Notification {
        self.items.push_front(Notification {
            id: Ulid::new(),
            kind,
            title: title.into(),
            message: message.into(),
            created,
            duration: self.duration,
        });
        self.items.truncate(MAX_NOTIFICATIONS);
        &self.items[0]
    }

    /// Notifications that have not yet expired, newest first
    pub fn active_at(&self, now: DateTime<Utc>) -> Vec<&Notification> {
        self.items.iter().filter(|n| n.is_active_at(now)).collect()
    }

    pub fn dismiss(&mut self, id: Ulid) -> bool {
        let before = self.items.len();
        self.items.retain(|n| n.id != id);
        self.items.len() != before
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}
