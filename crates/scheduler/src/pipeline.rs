use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

use fleetline_core::domain::notification::AdminAlert;
use fleetline_db::repositories::{
    AdminDirectory, BookingRepository, FanoutOutcome, NotificationRepository, QuotationRepository,
    RepositoryError, SqlAdminDirectory, SqlBookingRepository, SqlNotificationRepository,
    SqlQuotationRepository,
};
use fleetline_db::DbPool;
use fleetline_mailer::{MailError, ReminderMailer};

use crate::{bookings, emails, quotations};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("repository failure: {0}")]
    Repository(#[from] RepositoryError),
    #[error("mail failure: {0}")]
    Mail(#[from] MailError),
}

/// Counters for one pipeline pass, reported by the HTTP trigger and the CLI.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub quotation_warnings: usize,
    pub quotations_expired: usize,
    pub booking_reminders: usize,
    pub reminder_emails_sent: usize,
    pub reminder_emails_skipped: usize,
}

/// Outcome of one gated fan-out attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FanoutResult {
    Delivered,
    AlreadyTriggered,
    /// No admin recipients exist; nothing is claimed so the event stays
    /// eligible for a later run.
    NoRecipients,
}

pub struct NotificationPipeline {
    pub(crate) quotations: Arc<dyn QuotationRepository>,
    pub(crate) bookings: Arc<dyn BookingRepository>,
    pub(crate) notifications: Arc<dyn NotificationRepository>,
    pub(crate) admins: Arc<dyn AdminDirectory>,
    pub(crate) mailer: ReminderMailer,
}

impl NotificationPipeline {
    pub fn new(
        quotations: Arc<dyn QuotationRepository>,
        bookings: Arc<dyn BookingRepository>,
        notifications: Arc<dyn NotificationRepository>,
        admins: Arc<dyn AdminDirectory>,
        mailer: ReminderMailer,
    ) -> Self {
        Self { quotations, bookings, notifications, admins, mailer }
    }

    /// Standard wiring: SQL repositories over one pool.
    pub fn from_pool(pool: DbPool, mailer: ReminderMailer) -> Self {
        Self::new(
            Arc::new(SqlQuotationRepository::new(pool.clone())),
            Arc::new(SqlBookingRepository::new(pool.clone())),
            Arc::new(SqlNotificationRepository::new(pool.clone())),
            Arc::new(SqlAdminDirectory::new(pool)),
            mailer,
        )
    }

    /// One full pass. Sub-pipelines run sequentially; a failure aborts the
    /// remainder of the run but leaves earlier work persisted.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<RunSummary, PipelineError> {
        info!(event_name = "scheduler.run.start", now = %now, "starting scheduled notification run");

        let mut summary = RunSummary::default();

        if let Err(pass_error) = quotations::process(self, now, &mut summary).await {
            error!(
                event_name = "scheduler.quotations.failed",
                error = %pass_error,
                "quotation expiry pass failed"
            );
            return Err(pass_error);
        }

        if let Err(pass_error) = bookings::process(self, now, &mut summary).await {
            error!(
                event_name = "scheduler.bookings.failed",
                error = %pass_error,
                "booking reminder pass failed"
            );
            return Err(pass_error);
        }

        if let Err(pass_error) = emails::process(self, now, &mut summary).await {
            error!(
                event_name = "scheduler.emails.failed",
                error = %pass_error,
                "reminder email pass failed"
            );
            return Err(pass_error);
        }

        info!(
            event_name = "scheduler.run.complete",
            quotation_warnings = summary.quotation_warnings,
            quotations_expired = summary.quotations_expired,
            booking_reminders = summary.booking_reminders,
            reminder_emails_sent = summary.reminder_emails_sent,
            reminder_emails_skipped = summary.reminder_emails_skipped,
            "scheduled notification run complete"
        );

        Ok(summary)
    }

    /// Claim the alert's event and write one notification row per admin.
    pub(crate) async fn fan_out(
        &self,
        alert: &AdminAlert,
        now: DateTime<Utc>,
    ) -> Result<FanoutResult, PipelineError> {
        if self.notifications.event_triggered(&alert.event()).await? {
            return Ok(FanoutResult::AlreadyTriggered);
        }

        let admins = self.admins.list_admins().await?;
        if admins.is_empty() {
            warn!(
                event_name = "scheduler.fanout.no_recipients",
                kind = %alert.kind,
                related_id = %alert.related_id,
                "no admin users found, skipping notification creation"
            );
            return Ok(FanoutResult::NoRecipients);
        }

        match self.notifications.claim_and_fan_out(alert, &admins, now).await? {
            FanoutOutcome::Delivered { recipients } => {
                info!(
                    event_name = "scheduler.fanout.delivered",
                    kind = %alert.kind,
                    related_id = %alert.related_id,
                    recipients,
                    "created admin notifications"
                );
                Ok(FanoutResult::Delivered)
            }
            FanoutOutcome::AlreadyTriggered => Ok(FanoutResult::AlreadyTriggered),
        }
    }
}
