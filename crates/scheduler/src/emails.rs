//! Customer-facing trip reminder emails.
//!
//! Dedup here is two-layered: the `*_email_sent` event is probed before
//! composing (so a booking skipped for missing contacts stays retryable on
//! every later run) and claimed only after the provider accepts the message.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use fleetline_core::domain::booking::Booking;
use fleetline_core::domain::notification::{AdminAlert, NotificationEvent, NotificationKind};
use fleetline_core::windows::{
    booking_reminder_day_24h, booking_reminder_day_2h, booking_starts_within_2h_window,
    ReminderLead,
};

use crate::pipeline::{NotificationPipeline, PipelineError, RunSummary};

pub(crate) async fn process(
    pipeline: &NotificationPipeline,
    now: DateTime<Utc>,
    summary: &mut RunSummary,
) -> Result<(), PipelineError> {
    let tomorrow = pipeline.bookings.reminderable_on(booking_reminder_day_24h(now)).await?;
    for booking in &tomorrow {
        send_reminder(pipeline, booking, ReminderLead::Hours24, now, summary).await?;
    }

    let today = pipeline.bookings.reminderable_on(booking_reminder_day_2h(now)).await?;
    for booking in &today {
        if !booking_starts_within_2h_window(now, booking.date, booking.time) {
            continue;
        }
        send_reminder(pipeline, booking, ReminderLead::Hours2, now, summary).await?;
    }

    Ok(())
}

async fn send_reminder(
    pipeline: &NotificationPipeline,
    booking: &Booking,
    lead: ReminderLead,
    now: DateTime<Utc>,
    summary: &mut RunSummary,
) -> Result<(), PipelineError> {
    let sent_kind = NotificationKind::booking_reminder_email_sent(lead);
    let event = NotificationEvent { kind: sent_kind, related_id: booking.id.0 };
    if pipeline.notifications.event_triggered(&event).await? {
        debug!(
            event_name = "scheduler.email.already_sent",
            reference = %booking.reference,
            kind = %sent_kind,
            "trip reminder email already sent"
        );
        return Ok(());
    }

    let Some(details) = pipeline.bookings.reminder_details(&booking.id).await? else {
        warn!(
            event_name = "scheduler.email.booking_vanished",
            reference = %booking.reference,
            "booking disappeared between scan and send"
        );
        return Ok(());
    };

    match pipeline.mailer.send_trip_reminder(&details, lead).await {
        Ok(message) => {
            pipeline.fan_out(&sent_marker_alert(pipeline, booking, lead), now).await?;
            summary.reminder_emails_sent += 1;
            info!(
                event_name = "scheduler.email.sent",
                reference = %booking.reference,
                lead = lead.time_text(),
                to = %message.to.join(", "),
                "sent trip reminder email"
            );
            Ok(())
        }
        Err(skip) if skip.is_skippable() => {
            // No marker is written, so the booking is retried on the next
            // run once the missing contact is filled in.
            summary.reminder_emails_skipped += 1;
            warn!(
                event_name = "scheduler.email.skipped",
                reference = %booking.reference,
                reason = %skip,
                "skipping trip reminder email"
            );
            Ok(())
        }
        Err(send_error) => Err(send_error.into()),
    }
}

fn sent_marker_alert(
    pipeline: &NotificationPipeline,
    booking: &Booking,
    lead: ReminderLead,
) -> AdminAlert {
    AdminAlert {
        kind: NotificationKind::booking_reminder_email_sent(lead),
        related_id: booking.id.0,
        title: format!("Trip reminder email sent - {}", booking.reference),
        message: format!(
            "{} trip reminder email sent to customer with BCC to creator, driver, and {} for booking {}",
            lead.time_text(),
            pipeline.mailer.settings().operations_address,
            booking.reference,
        ),
    }
}
