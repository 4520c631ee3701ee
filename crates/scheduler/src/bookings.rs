//! In-app booking reminders for admins.

use chrono::{DateTime, Utc};
use tracing::info;

use fleetline_core::domain::booking::Booking;
use fleetline_core::domain::notification::{AdminAlert, NotificationKind};
use fleetline_core::windows::{
    booking_reminder_day_24h, booking_reminder_day_2h, booking_starts_within_2h_window,
};

use crate::pipeline::{FanoutResult, NotificationPipeline, PipelineError, RunSummary};

const LOCATION_TBD: &str = "Location TBD";

pub(crate) async fn process(
    pipeline: &NotificationPipeline,
    now: DateTime<Utc>,
    summary: &mut RunSummary,
) -> Result<(), PipelineError> {
    let tomorrow = pipeline.bookings.reminderable_on(booking_reminder_day_24h(now)).await?;
    for booking in &tomorrow {
        let outcome = pipeline.fan_out(&reminder_alert_24h(booking), now).await?;
        if outcome == FanoutResult::Delivered {
            summary.booking_reminders += 1;
            info!(
                event_name = "scheduler.booking.reminded_24h",
                reference = %booking.reference,
                "sent 24h booking reminder"
            );
        }
    }

    let today = pipeline.bookings.reminderable_on(booking_reminder_day_2h(now)).await?;
    for booking in &today {
        if !booking_starts_within_2h_window(now, booking.date, booking.time) {
            continue;
        }

        let outcome = pipeline.fan_out(&reminder_alert_2h(booking), now).await?;
        if outcome == FanoutResult::Delivered {
            summary.booking_reminders += 1;
            info!(
                event_name = "scheduler.booking.reminded_2h",
                reference = %booking.reference,
                "sent 2h booking reminder"
            );
        }
    }

    Ok(())
}

fn reminder_alert_24h(booking: &Booking) -> AdminAlert {
    AdminAlert {
        kind: NotificationKind::BookingReminder24h,
        related_id: booking.id.0,
        title: format!("Booking reminder: {} tomorrow", booking.service_name),
        message: format!(
            "Booking for {} ({}) is scheduled for tomorrow at {}. Pickup: {}",
            booking.customer_name,
            booking.service_name,
            booking.time.format("%H:%M"),
            booking.pickup_location.as_deref().unwrap_or(LOCATION_TBD),
        ),
    }
}

fn reminder_alert_2h(booking: &Booking) -> AdminAlert {
    AdminAlert {
        kind: NotificationKind::BookingReminder2h,
        related_id: booking.id.0,
        title: format!("Urgent: Booking starts in 2 hours - {}", booking.service_name),
        message: format!(
            "Booking for {} ({}) starts at {}. Pickup: {}",
            booking.customer_name,
            booking.service_name,
            booking.time.format("%H:%M"),
            booking.pickup_location.as_deref().unwrap_or(LOCATION_TBD),
        ),
    }
}
