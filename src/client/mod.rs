//! Client-session state
//!
//! State machines a front-end drives while talking to the handler
//! surface: the modal stack and the notification queue. Both are plain
//! data with no rendering attached.

pub mod modals;
pub mod notifications;

pub use modals::{Modal, ModalStack};
pub use notifications::{Notification, NotificationKind, NotificationQueue};
