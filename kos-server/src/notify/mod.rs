//! NotificationHub: per-user realtime fan-out
//!
//! ```text
//! services (payment confirmed, reminder due, ...)
//!       │ send_to_user / broadcast_all
//!       ▼
//! NotificationHub ── users: user_id → broadcast::Sender<Notification>
//!       │
//!       ▼
//! WebSocket handler (subscribe → push JSON frames)
//! ```

use dashmap::DashMap;
use shared::models::Notification;
use std::sync::Arc;
use tokio::sync::broadcast;

const BROADCAST_CAPACITY: usize = 256;

#[derive(Clone, Default)]
pub struct NotificationHub {
    users: Arc<DashMap<i64, broadcast::Sender<Notification>>>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn sender(&self, user_id: i64) -> broadcast::Sender<Notification> {
        self.users
            .entry(user_id)
            .or_insert_with(|| broadcast::channel(BROADCAST_CAPACITY).0)
            .clone()
    }

    pub fn subscribe(&self, user_id: i64) -> broadcast::Receiver<Notification> {
        self.sender(user_id).subscribe()
    }

    /// Deliver to every live connection of a user; returns receiver count
    pub fn send_to_user(&self, user_id: i64, notification: Notification) -> usize {
        match self.users.get(&user_id) {
            // No subscribers: send returns Err, safe to ignore
            Some(tx) => tx.send(notification).unwrap_or(0),
            None => 0,
        }
    }

    pub fn broadcast_all(&self, notification: Notification) -> usize {
        self.users
            .iter()
            .map(|entry| entry.value().send(notification.clone()).unwrap_or(0))
            .sum()
    }

    /// Drop channels nobody listens to any more
    pub fn prune(&self) {
        self.users.retain(|_, tx| tx.receiver_count() > 0);
    }

    pub fn connected_users(&self) -> usize {
        self.users.iter().filter(|e| e.value().receiver_count() > 0).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::NotificationKind;

    fn note(title: &str) -> Notification {
        Notification::new(NotificationKind::System, title, "m")
    }

    #[tokio::test]
    async fn test_send_to_user_is_isolated() {
        let hub = NotificationHub::new();
        let mut alice = hub.subscribe(1);
        let mut bob = hub.subscribe(2);

        assert_eq!(hub.send_to_user(1, note("for alice")), 1);
        assert_eq!(alice.recv().await.unwrap().title, "for alice");
        assert!(bob.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_and_prune() {
        let hub = NotificationHub::new();
        let mut a = hub.subscribe(1);
        let b = hub.subscribe(2);
        assert_eq!(hub.broadcast_all(note("all")), 2);
        assert_eq!(a.recv().await.unwrap().title, "all");

        drop(b);
        hub.prune();
        assert_eq!(hub.connected_users(), 1);
        assert_eq!(hub.send_to_user(3, note("nobody")), 0);
    }
}
