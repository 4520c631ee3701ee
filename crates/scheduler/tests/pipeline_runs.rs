//! End-to-end pipeline runs against an in-memory database and a recording
//! mail transport.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use fleetline_core::domain::booking::{Booking, BookingId, BookingStatus};
use fleetline_core::domain::notification::{NotificationEvent, NotificationKind};
use fleetline_core::domain::quotation::{Quotation, QuotationId, QuotationStatus};
use fleetline_db::fixtures;
use fleetline_db::migrations;
use fleetline_db::repositories::{
    BookingRepository, NotificationRepository, QuotationRepository, SqlBookingRepository,
    SqlNotificationRepository, SqlQuotationRepository,
};
use fleetline_db::{connect_with_settings, DbPool};
use fleetline_mailer::{MailerSettings, RecordingTransport, ReminderMailer};
use fleetline_scheduler::NotificationPipeline;

struct Harness {
    pool: DbPool,
    outbox: Arc<RecordingTransport>,
    pipeline: NotificationPipeline,
}

async fn harness() -> Harness {
    let pool =
        connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect test pool");
    migrations::run_pending(&pool).await.expect("run migrations");

    let outbox = Arc::new(RecordingTransport::default());
    let mailer = ReminderMailer::new(outbox.clone(), settings()).expect("templates load");
    let pipeline = NotificationPipeline::from_pool(pool.clone(), mailer);

    Harness { pool, outbox, pipeline }
}

fn settings() -> MailerSettings {
    MailerSettings {
        from_address: "Fleetline <bookings@fleetline.example>".to_string(),
        operations_address: "bookings@fleetline.example".to_string(),
        company_name: "Fleetline".to_string(),
        website_url: "https://fleetline.example".to_string(),
    }
}

fn run_instant() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-03-10T10:05:00Z")
        .expect("valid rfc3339")
        .with_timezone(&Utc)
}

fn sent_quotation(expiry_date: DateTime<Utc>) -> Quotation {
    Quotation {
        id: QuotationId(Uuid::new_v4()),
        quote_number: 1234,
        customer_name: "Acme Corp".to_string(),
        service_type: "Airport Transfer".to_string(),
        status: QuotationStatus::Sent,
        expiry_date,
        converted_to_booking_id: None,
        created_at: run_instant() - Duration::days(3),
        updated_at: run_instant() - Duration::days(3),
    }
}

fn booking_at(date: NaiveDate, time: NaiveTime, refs: &fixtures::ReferenceRows) -> Booking {
    Booking {
        id: BookingId(Uuid::new_v4()),
        reference: "BK-1001".to_string(),
        customer_name: "Taro Yamada".to_string(),
        service_name: "Airport Transfer".to_string(),
        date,
        time,
        status: BookingStatus::Confirmed,
        pickup_location: Some("Haneda Airport Terminal 3".to_string()),
        dropoff_location: Some("Park Hyatt Tokyo".to_string()),
        notes: None,
        customer_id: Some(refs.customer_id),
        driver_id: Some(refs.driver_id),
        vehicle_id: Some(refs.vehicle_id),
        created_by: Some(refs.admin_id),
        created_at: run_instant() - Duration::days(1),
        updated_at: run_instant() - Duration::days(1),
    }
}

#[tokio::test]
async fn double_run_produces_the_same_notification_rows_as_a_single_run() {
    let harness = harness().await;
    let admins = fixtures::insert_admin_pair(&harness.pool).await.expect("admins");
    let now = run_instant();

    let quotations = SqlQuotationRepository::new(harness.pool.clone());
    let warning = sent_quotation(now + Duration::hours(24));
    quotations.insert(&warning).await.expect("insert quotation");

    let first = harness.pipeline.run(now).await.expect("first run");
    assert_eq!(first.quotation_warnings, 1);

    let second = harness.pipeline.run(now).await.expect("second run");
    assert_eq!(second.quotation_warnings, 0, "re-run must not warn again");

    let notifications = SqlNotificationRepository::new(harness.pool.clone());
    let rows = notifications
        .list_for_event(&NotificationEvent {
            kind: NotificationKind::QuotationExpiring24h,
            related_id: warning.id.0,
        })
        .await
        .expect("list rows");
    assert_eq!(rows.len(), admins.len(), "one row per admin, no duplicates");
}

#[tokio::test]
async fn quotations_outside_the_24h_window_are_not_selected() {
    let harness = harness().await;
    fixtures::insert_admin_pair(&harness.pool).await.expect("admins");
    let now = run_instant();

    let quotations = SqlQuotationRepository::new(harness.pool.clone());
    quotations.insert(&sent_quotation(now + Duration::hours(22))).await.expect("insert");
    quotations.insert(&sent_quotation(now + Duration::hours(26))).await.expect("insert");

    let summary = harness.pipeline.run(now).await.expect("run");

    assert_eq!(summary.quotation_warnings, 0);
}

#[tokio::test]
async fn past_due_quotation_expires_exactly_once_with_one_fanout() {
    let harness = harness().await;
    let admins = fixtures::insert_admin_pair(&harness.pool).await.expect("admins");
    let now = run_instant();

    let quotations = SqlQuotationRepository::new(harness.pool.clone());
    let past_due = sent_quotation(now - Duration::hours(5));
    quotations.insert(&past_due).await.expect("insert quotation");

    let first = harness.pipeline.run(now).await.expect("first run");
    assert_eq!(first.quotations_expired, 1);

    let second = harness.pipeline.run(now).await.expect("second run");
    assert_eq!(second.quotations_expired, 0, "transition must not repeat");

    let reloaded =
        quotations.find_by_id(&past_due.id).await.expect("reload").expect("present");
    assert_eq!(reloaded.status, QuotationStatus::Expired);

    let notifications = SqlNotificationRepository::new(harness.pool.clone());
    let rows = notifications
        .list_for_event(&NotificationEvent {
            kind: NotificationKind::QuotationExpired,
            related_id: past_due.id.0,
        })
        .await
        .expect("list rows");
    assert_eq!(rows.len(), admins.len());
}

#[tokio::test]
async fn booking_tomorrow_gets_a_24h_reminder_email_and_in_app_notification() {
    let harness = harness().await;
    fixtures::insert_admin_pair(&harness.pool).await.expect("admins");
    let refs = fixtures::insert_reference_rows(&harness.pool).await.expect("reference rows");
    let now = run_instant();

    let bookings = SqlBookingRepository::new(harness.pool.clone());
    let tomorrow_ten = booking_at(
        now.date_naive() + Duration::days(1),
        NaiveTime::from_hms_opt(10, 0, 0).expect("valid time"),
        &refs,
    );
    bookings.insert(&tomorrow_ten).await.expect("insert booking");

    let summary = harness.pipeline.run(now).await.expect("run");
    assert_eq!(summary.booking_reminders, 1);
    assert_eq!(summary.reminder_emails_sent, 1);

    let sent = harness.outbox.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent[0].subject,
        "Your Trip is Coming Soon - BK-1001 (24 hours reminder)"
    );
    assert_eq!(sent[0].to, vec!["taro@example.com".to_string()]);
    assert!(sent[0].bcc.contains(&"bookings@fleetline.example".to_string()));

    let notifications = SqlNotificationRepository::new(harness.pool.clone());
    assert!(notifications
        .event_triggered(&NotificationEvent {
            kind: NotificationKind::BookingReminder24h,
            related_id: tomorrow_ten.id.0,
        })
        .await
        .expect("in-app event"));
    assert!(notifications
        .event_triggered(&NotificationEvent {
            kind: NotificationKind::BookingReminder24hEmailSent,
            related_id: tomorrow_ten.id.0,
        })
        .await
        .expect("sent marker"));

    // Second run: the marker suppresses a resend.
    let second = harness.pipeline.run(now).await.expect("second run");
    assert_eq!(second.reminder_emails_sent, 0);
    assert_eq!(harness.outbox.sent().len(), 1);
}

#[tokio::test]
async fn booking_in_under_two_hours_gets_the_urgent_email() {
    let harness = harness().await;
    fixtures::insert_admin_pair(&harness.pool).await.expect("admins");
    let refs = fixtures::insert_reference_rows(&harness.pool).await.expect("reference rows");
    let now = run_instant(); // 10:05

    let bookings = SqlBookingRepository::new(harness.pool.clone());
    let noon_today = booking_at(
        now.date_naive(),
        NaiveTime::from_hms_opt(12, 0, 0).expect("valid time"),
        &refs,
    );
    bookings.insert(&noon_today).await.expect("insert booking");

    let summary = harness.pipeline.run(now).await.expect("run");
    assert_eq!(summary.reminder_emails_sent, 1);

    let sent = harness.outbox.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent[0].subject,
        "URGENT: Your Trip is Coming Soon - BK-1001 (2 hours reminder)"
    );
}

#[tokio::test]
async fn booking_starting_in_three_hours_is_outside_the_2h_window() {
    let harness = harness().await;
    fixtures::insert_admin_pair(&harness.pool).await.expect("admins");
    let refs = fixtures::insert_reference_rows(&harness.pool).await.expect("reference rows");
    let now = run_instant(); // 10:05

    let bookings = SqlBookingRepository::new(harness.pool.clone());
    let afternoon = booking_at(
        now.date_naive(),
        NaiveTime::from_hms_opt(13, 30, 0).expect("valid time"),
        &refs,
    );
    bookings.insert(&afternoon).await.expect("insert booking");

    let summary = harness.pipeline.run(now).await.expect("run");

    assert_eq!(summary.reminder_emails_sent, 0);
    assert_eq!(summary.booking_reminders, 0);
    assert!(harness.outbox.sent().is_empty());
}

#[tokio::test]
async fn missing_driver_email_skips_the_send_and_stays_retryable() {
    let harness = harness().await;
    fixtures::insert_admin_pair(&harness.pool).await.expect("admins");
    let refs = fixtures::insert_reference_rows(&harness.pool).await.expect("reference rows");
    let now = run_instant();

    let bookings = SqlBookingRepository::new(harness.pool.clone());
    let mut unstaffed = booking_at(
        now.date_naive() + Duration::days(1),
        NaiveTime::from_hms_opt(10, 0, 0).expect("valid time"),
        &refs,
    );
    unstaffed.driver_id = None;
    bookings.insert(&unstaffed).await.expect("insert booking");

    let first = harness.pipeline.run(now).await.expect("first run");
    assert_eq!(first.reminder_emails_sent, 0);
    assert_eq!(first.reminder_emails_skipped, 1);
    assert!(harness.outbox.sent().is_empty());

    let notifications = SqlNotificationRepository::new(harness.pool.clone());
    assert!(
        !notifications
            .event_triggered(&NotificationEvent {
                kind: NotificationKind::BookingReminder24hEmailSent,
                related_id: unstaffed.id.0,
            })
            .await
            .expect("sent marker probe"),
        "a skipped send must not write a sent marker"
    );

    // Still skipped (not dedup-blocked) on the next pass.
    let second = harness.pipeline.run(now).await.expect("second run");
    assert_eq!(second.reminder_emails_skipped, 1);
}

#[tokio::test]
async fn run_without_admins_claims_nothing_and_sends_no_reminders() {
    let harness = harness().await;
    let now = run_instant();

    let quotations = SqlQuotationRepository::new(harness.pool.clone());
    let warning = sent_quotation(now + Duration::hours(24));
    quotations.insert(&warning).await.expect("insert quotation");

    let summary = harness.pipeline.run(now).await.expect("run");
    assert_eq!(summary.quotation_warnings, 0);

    // Once admins exist, the event is still eligible.
    fixtures::insert_admin_pair(&harness.pool).await.expect("admins");
    let retry = harness.pipeline.run(now).await.expect("retry run");
    assert_eq!(retry.quotation_warnings, 1);
}
