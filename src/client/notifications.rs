//! Notification queue
//!
//! Holds the toasts/banners a front-end shows: errors from failed
//! requests, success confirmations, sticky warnings with an action
//! button. Adding an entry with an id that is already queued replaces the
//! old entry instead of stacking duplicates.

use serde::{Deserialize, Serialize};

/// Kind of notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// Informational message
    Info,
    /// Success message
    Success,
    /// Warning message
    Warning,
    /// Error message
    Error,
}

impl NotificationKind {
    /// Short title for this kind
    pub fn title(&self) -> &'static str {
        match self {
            Self::Info => "Info",
            Self::Success => "Success",
            Self::Warning => "Warning",
            Self::Error => "Error",
        }
    }
}

/// An action button attached to a notification
///
/// The action is a tag the front-end interprets (e.g. "sign-out").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationButton {
    pub label: String,
    pub action: String,
}

/// One notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Identifier; re-adding the same id replaces the entry
    pub id: String,
    pub kind: NotificationKind,
    /// Optional headline above the message
    pub title: Option<String>,
    pub message: String,
    /// Sticky notifications stay until dismissed explicitly
    pub sticky: bool,
    pub button: Option<NotificationButton>,
}

impl Notification {
    /// Create a notification
    pub fn new(id: impl Into<String>, kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            title: None,
            message: message.into(),
            sticky: false,
            button: None,
        }
    }

    /// Create an error notification
    pub fn error(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(id, NotificationKind::Error, message)
    }

    /// Create a success notification
    pub fn success(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(id, NotificationKind::Success, message)
    }

    /// Set the headline
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Keep the notification until it is dismissed
    pub fn sticky(mut self) -> Self {
        self.sticky = true;
        self
    }

    /// Attach an action button
    pub fn with_button(mut self, label: impl Into<String>, action: impl Into<String>) -> Self {
        self.button = Some(NotificationButton {
            label: label.into(),
            action: action.into(),
        });
        self
    }
}

/// The queue of notifications to show
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationQueue {
    items: Vec<Notification>,
}

impl NotificationQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a notification, replacing any queued entry with the same id
    pub fn add(&mut self, notification: Notification) {
        if let Some(existing) = self.items.iter_mut().find(|n| n.id == notification.id) {
            *existing = notification;
        } else {
            self.items.push(notification);
        }
    }

    /// Remove a notification by id
    pub fn dismiss(&mut self, id: &str) {
        self.items.retain(|n| n.id != id);
    }

    /// Drop all non-sticky notifications (a front-end calls this when
    /// transient toasts age out)
    pub fn clear_transient(&mut self) {
        self.items.retain(|n| n.sticky);
    }

    /// The queued notifications, oldest first
    pub fn items(&self) -> &[Notification] {
        &self.items
    }

    /// True when nothing is queued
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
