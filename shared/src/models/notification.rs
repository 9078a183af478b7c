//! Realtime notification pushed over the WebSocket channel

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    PaymentConfirmed,
    PaymentRejected,
    PaymentReminder,
    BookingCreated,
    BookingCancelled,
    BookingExtended,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl Notification {
    pub fn new(kind: NotificationKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
            created_at: crate::util::now_millis(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_json_shape() {
        let n = Notification::new(NotificationKind::PaymentConfirmed, "Pembayaran", "OK")
            .with_data(serde_json::json!({ "payment_id": 7 }));
        let value = serde_json::to_value(&n).unwrap();
        assert_eq!(value["kind"], "payment_confirmed");
        assert_eq!(value["data"]["payment_id"], 7);

        let bare = Notification::new(NotificationKind::System, "t", "m");
        let value = serde_json::to_value(&bare).unwrap();
        assert!(value.get("data").is_none());
    }
}
