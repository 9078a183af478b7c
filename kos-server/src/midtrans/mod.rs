//! Midtrans Snap integration via REST API (no SDK dependency)

use serde::Deserialize;
use sha2::{Digest, Sha512};

const SANDBOX_SNAP_URL: &str = "https://app.sandbox.midtrans.com/snap/v1/transactions";
const PRODUCTION_SNAP_URL: &str = "https://app.midtrans.com/snap/v1/transactions";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Clone)]
pub struct MidtransClient {
    client: reqwest::Client,
    server_key: String,
    is_production: bool,
}

#[derive(Debug, Deserialize)]
pub struct SnapResponse {
    pub token: String,
    pub redirect_url: String,
}

/// HTTP notification body (only the fields acted upon)
#[derive(Debug, Clone, Deserialize)]
pub struct MidtransNotification {
    pub order_id: String,
    pub status_code: String,
    pub gross_amount: String,
    pub signature_key: String,
    pub transaction_status: String,
    #[serde(default)]
    pub fraud_status: Option<String>,
    #[serde(default)]
    pub transaction_id: Option<String>,
}

/// What a notification means for the payment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationOutcome {
    Paid,
    Failed,
    Ignored,
}

impl MidtransNotification {
    pub fn outcome(&self) -> NotificationOutcome {
        match self.transaction_status.as_str() {
            "settlement" => NotificationOutcome::Paid,
            "capture" => match self.fraud_status.as_deref() {
                Some("challenge") => NotificationOutcome::Ignored,
                _ => NotificationOutcome::Paid,
            },
            "deny" | "cancel" | "expire" | "failure" => NotificationOutcome::Failed,
            _ => NotificationOutcome::Ignored,
        }
    }
}

impl MidtransClient {
    pub fn new(client: reqwest::Client, server_key: String, is_production: bool) -> Self {
        Self {
            client,
            server_key,
            is_production,
        }
    }

    fn snap_url(&self) -> &'static str {
        if self.is_production {
            PRODUCTION_SNAP_URL
        } else {
            SANDBOX_SNAP_URL
        }
    }

    /// Create a Snap transaction
    pub async fn create_transaction(
        &self,
        order_id: &str,
        gross_amount: i64,
        customer_name: &str,
        customer_email: Option<&str>,
        item_name: &str,
    ) -> Result<SnapResponse, BoxError> {
        let body = serde_json::json!({
            "transaction_details": {
                "order_id": order_id,
                "gross_amount": gross_amount,
            },
            "item_details": [{
                "id": order_id,
                "price": gross_amount,
                "quantity": 1,
                "name": item_name,
            }],
            "customer_details": {
                "first_name": customer_name,
                "email": customer_email,
            },
        });

        let resp = self
            .client
            .post(self.snap_url())
            .basic_auth(&self.server_key, Some(""))
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let value: serde_json::Value = resp.json().await?;
        if !status.is_success() {
            return Err(format!("Midtrans create transaction failed ({status}): {value}").into());
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn verify(&self, notification: &MidtransNotification) -> bool {
        verify_signature(notification, &self.server_key)
    }
}

/// `SHA512(order_id + status_code + gross_amount + server_key)`, hex
pub fn signature(order_id: &str, status_code: &str, gross_amount: &str, server_key: &str) -> String {
    let mut hasher = Sha512::new();
    hasher.update(order_id.as_bytes());
    hasher.update(status_code.as_bytes());
    hasher.update(gross_amount.as_bytes());
    hasher.update(server_key.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn verify_signature(n: &MidtransNotification, server_key: &str) -> bool {
    let expected = signature(&n.order_id, &n.status_code, &n.gross_amount, server_key);
    expected.eq_ignore_ascii_case(n.signature_key.trim())
}

/// `KOS-{payment_id}-{millis}`
pub fn order_id(payment_id: i64, millis: i64) -> String {
    format!("KOS-{payment_id}-{millis}")
}

/// Payment id back out of an order id
pub fn parse_order_id(order_id: &str) -> Option<i64> {
    let rest = order_id.strip_prefix("KOS-")?;
    let (id, _) = rest.split_once('-')?;
    id.parse().ok()
}
