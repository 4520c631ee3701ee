use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

use crate::message::{EmailMessage, MailError};

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError>;
}

/// Resend HTTP API transport (`POST {base_url}/emails`).
pub struct ResendTransport {
    client: Client,
    api_key: SecretString,
    endpoint: String,
}

impl ResendTransport {
    pub fn new(base_url: &str, api_key: SecretString) -> Result<Self, MailError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self { client, api_key, endpoint: format!("{}/emails", base_url.trim_end_matches('/')) })
    }
}

#[async_trait]
impl MailTransport for ResendTransport {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(message)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Api { status: status.as_u16(), body });
        }

        debug!(subject = %message.subject, "email accepted by provider");
        Ok(())
    }
}

/// Logs and drops. Default transport when no provider is configured.
#[derive(Default)]
pub struct NoopTransport;

#[async_trait]
impl MailTransport for NoopTransport {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        info!(
            to = %message.to.join(", "),
            bcc_count = message.bcc.len(),
            subject = %message.subject,
            "noop mail transport dropped message"
        );
        Ok(())
    }
}

/// Captures every message for inspection in tests.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<EmailMessage>>,
}

impl RecordingTransport {
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().map(|messages| messages.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        if let Ok(mut messages) = self.sent.lock() {
            messages.push(message.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::message::EmailMessage;

    use super::{MailTransport, RecordingTransport};

    fn message() -> EmailMessage {
        EmailMessage {
            from: "Fleetline <bookings@fleetline.example>".to_string(),
            to: vec!["taro@example.com".to_string()],
            bcc: vec![
                "ops@fleetline.example".to_string(),
                "kenji@fleetline.example".to_string(),
            ],
            subject: "Your Trip is Coming Soon - BK-1001 (24 hours reminder)".to_string(),
            html: "<p>hello</p>".to_string(),
            text: "hello".to_string(),
        }
    }

    #[tokio::test]
    async fn recording_transport_captures_messages_in_order() {
        let transport = RecordingTransport::default();

        transport.send(&message()).await.expect("first send");
        transport.send(&message()).await.expect("second send");

        assert_eq!(transport.sent().len(), 2);
    }

    #[test]
    fn message_serializes_into_the_provider_wire_format() {
        let value = serde_json::to_value(message()).expect("serialize message");

        assert_eq!(value["from"], "Fleetline <bookings@fleetline.example>");
        assert_eq!(value["to"][0], "taro@example.com");
        assert_eq!(value["bcc"].as_array().map(|bcc| bcc.len()), Some(2));
        assert!(value["subject"].as_str().unwrap_or_default().contains("24 hours reminder"));
        assert!(value.get("html").is_some());
        assert!(value.get("text").is_some());
    }
}
