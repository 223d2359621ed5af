//! Best-effort invitation notifications
//!
//! The delivery layer (push, websocket, mail...) lives outside this service and
//! subscribes per user. Sending never blocks and never fails the caller.

use dashmap::DashMap;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::{debug, info, instrument, warn};

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct InvitationNotice {
    pub event_id: i32,
    pub event_title: String,
    pub score: f64,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("subscriber channel for user {0} is closed")]
    ChannelClosed(i32),
}

/// Port used by the invitation writer for its side-effect
pub trait Notifier: Send + Sync {
    fn notify(&self, user_id: i32, notice: &InvitationNotice) -> Result<(), NotifyError>;
}

/// Concurrent map of subscribed users and their channels
pub struct NotificationHub {
    subscribers: DashMap<i32, UnboundedSender<InvitationNotice>>,
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationHub {
    pub fn new() -> Self {
        NotificationHub {
            subscribers: DashMap::new(),
        }
    }

    /// Registers `user_id`, replacing any previous subscription
    #[instrument(skip(self))]
    pub fn subscribe(&self, user_id: i32) -> UnboundedReceiver<InvitationNotice> {
        let (tx, rx) = unbounded_channel();
        self.subscribers.insert(user_id, tx);
        info!("Total subscribers: {}", self.subscribers.len());
        rx
    }

    #[instrument(skip(self))]
    pub fn unsubscribe(&self, user_id: i32) {
        debug!("Removing subscriber");
        self.subscribers.remove(&user_id);
    }

    pub fn is_subscribed(&self, user_id: i32) -> bool {
        self.subscribers.contains_key(&user_id)
    }
}

impl Notifier for NotificationHub {
    fn notify(&self, user_id: i32, notice: &InvitationNotice) -> Result<(), NotifyError> {
        let closed = match self.subscribers.get(&user_id) {
            Some(entry) => entry.value().send(notice.clone()).is_err(),
            None => {
                debug!("User {} has no subscriber, skipping notice", user_id);
                return Ok(());
            }
        };

        if closed {
            // the map guard above is released, so removing cannot deadlock
            warn!("Dropping closed subscriber for user {}", user_id);
            self.subscribers.remove(&user_id);
            return Err(NotifyError::ChannelClosed(user_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notice() -> InvitationNotice {
        InvitationNotice {
            event_id: 1,
            event_title: "Algorithms study group".to_string(),
            score: 87.5,
        }
    }

    #[tokio::test]
    async fn subscriber_receives_notice() {
        let hub = NotificationHub::new();
        let mut rx = hub.subscribe(7);
        hub.notify(7, &notice()).unwrap();
        assert_eq!(rx.recv().await, Some(notice()));
    }

    #[test]
    fn missing_subscriber_is_not_an_error() {
        let hub = NotificationHub::new();
        assert!(hub.notify(7, &notice()).is_ok());
    }

    #[test]
    fn closed_channel_is_reported_and_dropped() {
        let hub = NotificationHub::new();
        drop(hub.subscribe(7));
        assert!(matches!(hub.notify(7, &notice()), Err(NotifyError::ChannelClosed(7))));
        assert!(!hub.is_subscribed(7));
    }
}
