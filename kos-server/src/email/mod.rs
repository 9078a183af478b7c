//! Outgoing email
//!
//! [`HttpMailer`] posts to a Brevo-compatible transactional email API.
//! [`LogMailer`] only logs and keeps an in-memory outbox; it is used when
//! no API key is configured and in tests.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum MailerError {
    #[error("Request failed: {0}")]
    RequestFailed(String),
    #[error("API error ({status}): {body}")]
    ApiError { status: u16, body: String },
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), MailerError>;
}

pub type SharedMailer = Arc<dyn Mailer>;

#[derive(Serialize)]
struct Sender<'a> {
    name: &'a str,
    email: &'a str,
}

#[derive(Serialize)]
struct Recipient<'a> {
    email: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Payload<'a> {
    sender: Sender<'a>,
    to: Vec<Recipient<'a>>,
    subject: &'a str,
    html_content: &'a str,
}

pub struct HttpMailer {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl HttpMailer {
    pub fn new(client: reqwest::Client, api_url: String, api_key: String, from: String) -> Self {
        Self {
            client,
            api_url,
            api_key,
            from,
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), MailerError> {
        let payload = Payload {
            sender: Sender {
                name: "Kos",
                email: &self.from,
            },
            to: vec![Recipient { email: to }],
            subject,
            html_content: html,
        };

        let resp = self
            .client
            .post(&self.api_url)
            .header("api-key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| MailerError::RequestFailed(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(MailerError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        tracing::info!(to, subject, "Email sent");
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Clone, Default)]
pub struct LogMailer {
    outbox: Arc<Mutex<Vec<SentEmail>>>,
}

impl LogMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<SentEmail> {
        self.outbox.lock().await.clone()
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), MailerError> {
        tracing::info!(to, subject, "Email (log only)");
        self.outbox.lock().await.push(SentEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            html: html.to_string(),
        });
        Ok(())
    }
}

/// Send without failing the caller; delivery errors are logged.
pub fn send_in_background(mailer: SharedMailer, to: String, subject: String, html: String) {
    tokio::spawn(async move {
        if let Err(e) = mailer.send(&to, &subject, &html).await {
            tracing::warn!(error = %e, to = %to, "Email delivery failed");
        }
    });
}

/// Email bodies
pub mod templates {
    pub fn payment_confirmed(name: &str, room: &str, amount: f64) -> (String, String) {
        (
            "Pembayaran dikonfirmasi".to_string(),
            format!(
                "<h2>Halo {name},</h2>\
                 <p>Pembayaran sebesar <b>Rp {amount:.0}</b> untuk kamar <b>{room}</b> telah dikonfirmasi.</p>\
                 <p>Terima kasih.</p>"
            ),
        )
    }

    pub fn payment_reminder(name: &str, room: &str, amount: f64, due: &str) -> (String, String) {
        (
            "Pengingat pembayaran".to_string(),
            format!(
                "<h2>Halo {name},</h2>\
                 <p>Tagihan sebesar <b>Rp {amount:.0}</b> untuk kamar <b>{room}</b> jatuh tempo pada <b>{due}</b>.</p>"
            ),
        )
    }

    pub fn password_reset(link: &str) -> (String, String) {
        (
            "Reset password".to_string(),
            format!(
                "<p>Klik tautan berikut untuk mengatur ulang password Anda. Tautan berlaku 1 jam.</p>\
                 <p><a href=\"{link}\">{link}</a></p>\
                 <p>Abaikan email ini jika Anda tidak memintanya.</p>"
            ),
        )
    }

    pub fn contact(name: &str, email: &str, phone: Option<&str>, message: &str) -> (String, String) {
        (
            format!("Pesan baru dari {name}"),
            format!(
                "<p><b>Nama:</b> {name}</p><p><b>Email:</b> {email}</p><p><b>Telepon:</b> {}</p><p>{message}</p>",
                phone.unwrap_or("-")
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_mailer_records() {
        let mailer = LogMailer::new();
        let (subject, html) = templates::password_reset("http://x/reset?token=t");
        mailer.send("a@b.c", &subject, &html).await.unwrap();
        let sent = mailer.sent().await;
        assert_eq!(sent.len(), 1);
        assert!(sent[0].html.contains("token=t"));
    }

    #[test]
    fn test_payment_template_formats_amount() {
        let (_, html) = templates::payment_confirmed("Budi", "A1", 1_500_000.0);
        assert!(html.contains("Rp 1500000"));
    }
}
