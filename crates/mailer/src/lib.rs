//! Transactional email for fleetline:
//! - **Message model** (`message`) - provider-agnostic `EmailMessage`
//! - **Transports** (`transport`) - Resend HTTP API, plus noop/recording
//!   doubles for development and tests
//! - **Reminder composer** (`reminder`) - trip reminder HTML + text built
//!   from embedded Tera templates, parameterized by reminder lead
//!
//! One message goes out per reminder: `to` is the customer, `bcc` carries
//! the booking creator, the driver, and the operations address.

pub mod message;
pub mod reminder;
pub mod transport;

pub use message::{EmailMessage, MailError};
pub use reminder::{MailerSettings, ReminderMailer};
pub use transport::{MailTransport, NoopTransport, RecordingTransport, ResendTransport};
