//! In-memory notification feed with duplicate suppression and toast lifetimes.
//!
//! Expiry is evaluated against [`tokio::time::Instant`], so the window and the
//! toast lifetime follow the runtime clock (and can be driven by paused time
//! in tests).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

use crate::config::ClientConfig;

const BROADCAST_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Info,
    Warning,
    Error,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NotificationKind::Success => "success",
            NotificationKind::Info => "info",
            NotificationKind::Warning => "warning",
            NotificationKind::Error => "error",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub icon: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// A notification currently shown as a toast.
#[derive(Debug, Clone)]
pub struct Toast {
    pub notification: Notification,
    expires_at: Instant,
}

impl Toast {
    pub fn id(&self) -> Uuid {
        self.notification.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadFilter {
    #[default]
    All,
    Unread,
    Read,
}

impl ReadFilter {
    fn matches(&self, notification: &Notification) -> bool {
        match self {
            ReadFilter::All => true,
            ReadFilter::Unread => !notification.read,
            ReadFilter::Read => notification.read,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationConfig {
    pub dedup_window: Duration,
    pub toast_lifetime: Duration,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            dedup_window: Duration::from_secs(2),
            toast_lifetime: Duration::from_secs(5),
        }
    }
}

impl From<&ClientConfig> for NotificationConfig {
    fn from(config: &ClientConfig) -> Self {
        Self {
            dedup_window: config.dedup_window(),
            toast_lifetime: config.toast_lifetime(),
        }
    }
}

/// Notification list (most recent first) plus the visible toasts (oldest first).
#[derive(Debug)]
pub struct NotificationCenter {
    config: NotificationConfig,
    notifications: Vec<Notification>,
    toasts: Vec<Toast>,
    recent_keys: HashMap<String, Instant>,
    sender: broadcast::Sender<Notification>,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(NotificationConfig::default())
    }
}

impl NotificationCenter {
    pub fn new(config: NotificationConfig) -> Self {
        let (sender, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            config,
            notifications: Vec::new(),
            toasts: Vec::new(),
            recent_keys: HashMap::new(),
            sender,
        }
    }

    fn dedup_key(title: &str, message: &str) -> String {
        format!("{}_{}", title, message)
    }

    /// Records a notification unless an identical one was recorded within the
    /// dedup window. Returns the id of the new notification, or `None` when suppressed.
    pub fn notify(
        &mut self,
        title: impl Into<String>,
        message: impl Into<String>,
        kind: NotificationKind,
        icon: impl Into<String>,
    ) -> Option<Uuid> {
        let title = title.into();
        let message = message.into();
        let now = Instant::now();
        let window = self.config.dedup_window;

        self.recent_keys
            .retain(|_, registered| now.duration_since(*registered) < window);
        self.toasts.retain(|toast| toast.expires_at > now);

        let key = Self::dedup_key(&title, &message);
        if self.recent_keys.contains_key(&key) {
            debug!(%title, "suppressing duplicate notification");
            return None;
        }
        self.recent_keys.insert(key, now);

        let notification = Notification {
            id: Uuid::new_v4(),
            title,
            message,
            kind,
            icon: icon.into(),
            read: false,
            created_at: Utc::now(),
        };
        let id = notification.id;

        self.notifications.insert(0, notification.clone());
        self.toasts.push(Toast {
            notification: notification.clone(),
            expires_at: now + self.config.toast_lifetime,
        });

        // No subscribers is fine
        let _ = self.sender.send(notification);
        Some(id)
    }

    /// Live feed of newly recorded notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn filtered(&self, filter: ReadFilter) -> Vec<&Notification> {
        self.notifications
            .iter()
            .filter(|n| filter.matches(n))
            .collect()
    }

    pub fn unread_count(&self) -> usize {
        self.notifications.iter().filter(|n| !n.read).count()
    }

    /// Marks one notification read. Toasts are unaffected.
    pub fn mark_as_read(&mut self, id: Uuid) -> bool {
        match self.notifications.iter_mut().find(|n| n.id == id) {
            Some(notification) => {
                notification.read = true;
                true
            }
            None => false,
        }
    }

    pub fn mark_all_as_read(&mut self) {
        for notification in &mut self.notifications {
            notification.read = true;
        }
    }

    /// Empties the notification list. Toasts are unaffected.
    pub fn clear_all(&mut self) {
        self.notifications.clear();
    }

    /// Toasts still within their lifetime; expired ones are dropped.
    pub fn active_toasts(&mut self) -> &[Toast] {
        let now = Instant::now();
        self.toasts.retain(|toast| toast.expires_at > now);
        &self.toasts
    }

    pub fn dismiss_toast(&mut self, id: Uuid) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|toast| toast.id() != id);
        self.toasts.len() != before
    }
}
