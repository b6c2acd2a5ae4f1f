//! Notifications shown to the user during a session, shared by the
//! composer and its host.

use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

/// A dismissible message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

/// Handle to the notification queue of one composer session.
///
/// Cloning the handle shares the queue, so editors and the composer that
/// owns them post into the same place. Single-threaded by construction.
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    queue: Rc<RefCell<Vec<Notification>>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post(&self, level: NotificationLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            NotificationLevel::Error => log::warn!("{message}"),
            NotificationLevel::Info | NotificationLevel::Success => log::info!("{message}"),
        }
        self.queue.borrow_mut().push(Notification { level, message });
    }

    pub fn info(&self, message: impl Into<String>) {
        self.post(NotificationLevel::Info, message);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.post(NotificationLevel::Success, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.post(NotificationLevel::Error, message);
    }

    /// Notifications not yet dismissed, oldest first.
    pub fn pending(&self) -> Vec<Notification> {
        self.queue.borrow().clone()
    }

    pub fn latest(&self) -> Option<Notification> {
        self.queue.borrow().last().cloned()
    }

    /// Dismiss one notification by its position in [`Notifier::pending`].
    pub fn dismiss(&self, index: usize) -> Option<Notification> {
        let mut queue = self.queue.borrow_mut();
        (index < queue.len()).then(|| queue.remove(index))
    }

    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.queue.borrow_mut())
    }
}
