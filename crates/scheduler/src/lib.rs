//! Scheduled Notification & Reminder Pipeline
//!
//! One pass over the datastore per invocation:
//! - **Quotations** (`quotations`) - 24h/2h expiry warnings to admins, plus
//!   the one-shot `sent -> expired` transition for past-due quotations
//! - **Booking reminders** (`bookings`) - in-app 24h/2h reminders to admins
//! - **Reminder emails** (`emails`) - customer-facing trip reminders with
//!   calendar invite links, BCC'd to creator, driver, and operations
//!
//! Each pass is a pure function of (clock, datastore): no state survives
//! between invocations. Dedup is enforced by the notification event ledger,
//! so the pipeline can be re-run arbitrarily often - from cron, from the
//! HTTP trigger, or from `fleetline tick` - without duplicate fan-outs.

pub mod bookings;
pub mod emails;
pub mod pipeline;
pub mod quotations;

pub use pipeline::{NotificationPipeline, PipelineError, RunSummary};
