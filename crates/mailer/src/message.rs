use serde::Serialize;
use thiserror::Error;

/// A fully rendered outbound email. Field names follow the provider's wire
/// format so the struct serializes directly into the send request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub bcc: Vec<String>,
    pub subject: String,
    pub html: String,
    pub text: String,
}

#[derive(Debug, Error)]
pub enum MailError {
    /// The booking lacks a deliverable address; the send is skipped, not
    /// failed, and retried on the next scheduler pass.
    #[error("missing {field} email for booking {reference}")]
    MissingContact { field: &'static str, reference: String },
    #[error("template render failed: {0}")]
    Template(#[from] tera::Error),
    #[error("email transport request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("email provider rejected the message: status {status}: {body}")]
    Api { status: u16, body: String },
}

impl MailError {
    /// Skippable errors degrade to a warning; everything else aborts the
    /// current sub-pipeline.
    pub fn is_skippable(&self) -> bool {
        matches!(self, Self::MissingContact { .. })
    }
}
