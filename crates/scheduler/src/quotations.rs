//! Quotation expiry warnings and the `sent -> expired` transition.

use chrono::{DateTime, Utc};
use tracing::info;

use fleetline_core::domain::notification::{AdminAlert, NotificationKind};
use fleetline_core::domain::quotation::Quotation;
use fleetline_core::windows::{quotation_expiry_window_24h, quotation_expiry_window_2h};

use crate::pipeline::{FanoutResult, NotificationPipeline, PipelineError, RunSummary};

pub(crate) async fn process(
    pipeline: &NotificationPipeline,
    now: DateTime<Utc>,
    summary: &mut RunSummary,
) -> Result<(), PipelineError> {
    let expiring_24h =
        pipeline.quotations.sent_expiring_within(&quotation_expiry_window_24h(now)).await?;
    for quotation in &expiring_24h {
        let outcome = pipeline.fan_out(&warning_alert(quotation, false), now).await?;
        if outcome == FanoutResult::Delivered {
            summary.quotation_warnings += 1;
            info!(
                event_name = "scheduler.quotation.warned_24h",
                quote_number = quotation.quote_number,
                "sent 24h expiry warning"
            );
        }
    }

    let expiring_2h =
        pipeline.quotations.sent_expiring_within(&quotation_expiry_window_2h(now)).await?;
    for quotation in &expiring_2h {
        let outcome = pipeline.fan_out(&warning_alert(quotation, true), now).await?;
        if outcome == FanoutResult::Delivered {
            summary.quotation_warnings += 1;
            info!(
                event_name = "scheduler.quotation.warned_2h",
                quote_number = quotation.quote_number,
                "sent 2h expiry warning"
            );
        }
    }

    let expired = pipeline.quotations.sent_expired_before(now).await?;
    for quotation in &expired {
        // Status first, notification second: if the fan-out fails after the
        // update there is no rollback, and the status guard keeps re-runs
        // from repeating the transition.
        if pipeline.quotations.mark_expired(&quotation.id, now).await? {
            summary.quotations_expired += 1;
            info!(
                event_name = "scheduler.quotation.expired",
                quote_number = quotation.quote_number,
                "marked quotation as expired"
            );
        }
        pipeline.fan_out(&expired_alert(quotation), now).await?;
    }

    Ok(())
}

fn warning_alert(quotation: &Quotation, urgent: bool) -> AdminAlert {
    let expiry = quotation.expiry_date.format("%d/%m/%Y %H:%M");
    if urgent {
        AdminAlert {
            kind: NotificationKind::QuotationExpiring2h,
            related_id: quotation.id.0,
            title: format!(
                "Urgent: Quotation #{} expires in 2 hours",
                quotation.quote_number
            ),
            message: format!(
                "Quotation for {} ({}) expires soon at {expiry}",
                quotation.customer_name, quotation.service_type,
            ),
        }
    } else {
        AdminAlert {
            kind: NotificationKind::QuotationExpiring24h,
            related_id: quotation.id.0,
            title: format!("Quotation #{} expires in 24 hours", quotation.quote_number),
            message: format!(
                "Quotation for {} ({}) expires tomorrow at {expiry}",
                quotation.customer_name, quotation.service_type,
            ),
        }
    }
}

fn expired_alert(quotation: &Quotation) -> AdminAlert {
    AdminAlert {
        kind: NotificationKind::QuotationExpired,
        related_id: quotation.id.0,
        title: format!("Quotation #{} has expired", quotation.quote_number),
        message: format!(
            "Quotation for {} ({}) expired at {}",
            quotation.customer_name,
            quotation.service_type,
            quotation.expiry_date.format("%d/%m/%Y %H:%M"),
        ),
    }
}
