//! Deterministic seed data for demos, `fleetline seed`, and repository tests.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use fleetline_core::domain::booking::{Booking, BookingId, BookingStatus};
use fleetline_core::domain::notification::AdminUser;
use fleetline_core::domain::quotation::{Quotation, QuotationId, QuotationStatus};

use crate::repositories::{
    AdminDirectory, BookingRepository, QuotationRepository, RepositoryError, SqlAdminDirectory,
    SqlBookingRepository, SqlQuotationRepository,
};
use crate::DbPool;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub admins: usize,
    pub quotations: usize,
    pub bookings: usize,
}

pub struct ReferenceRows {
    pub customer_id: Uuid,
    pub driver_id: Uuid,
    pub vehicle_id: Uuid,
    pub admin_id: Uuid,
}

/// One customer/driver/vehicle/admin row each, with the contact details the
/// reminder email path needs.
pub async fn insert_reference_rows(pool: &DbPool) -> Result<ReferenceRows, RepositoryError> {
    let refs = ReferenceRows {
        customer_id: Uuid::new_v4(),
        driver_id: Uuid::new_v4(),
        vehicle_id: Uuid::new_v4(),
        admin_id: Uuid::new_v4(),
    };

    sqlx::query("INSERT INTO customers (id, name, email) VALUES (?, ?, ?)")
        .bind(refs.customer_id.to_string())
        .bind("Taro Yamada")
        .bind("taro@example.com")
        .execute(pool)
        .await?;

    sqlx::query(
        "INSERT INTO drivers (id, first_name, last_name, phone, email) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(refs.driver_id.to_string())
    .bind("Kenji")
    .bind("Sato")
    .bind("+81 90 1234 5678")
    .bind("kenji@fleetline.example")
    .execute(pool)
    .await?;

    sqlx::query("INSERT INTO vehicles (id, plate_number, brand, model) VALUES (?, ?, ?, ?)")
        .bind(refs.vehicle_id.to_string())
        .bind("品川 300 あ 12-34")
        .bind("Toyota")
        .bind("Alphard")
        .execute(pool)
        .await?;

    sqlx::query(
        "INSERT INTO admin_users (id, email, first_name, last_name, role) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(refs.admin_id.to_string())
    .bind("ops@fleetline.example")
    .bind("Hanako")
    .bind("Suzuki")
    .bind("admin")
    .execute(pool)
    .await?;

    Ok(refs)
}

/// Two admin recipients, one with the legacy upper-case role spelling.
pub async fn insert_admin_pair(pool: &DbPool) -> Result<Vec<AdminUser>, RepositoryError> {
    let directory = SqlAdminDirectory::new(pool.clone());
    let admins = vec![
        AdminUser {
            id: Uuid::new_v4(),
            email: "dispatch@fleetline.example".to_string(),
            first_name: Some("Hanako".to_string()),
            last_name: Some("Suzuki".to_string()),
            role: "admin".to_string(),
        },
        AdminUser {
            id: Uuid::new_v4(),
            email: "manager@fleetline.example".to_string(),
            first_name: Some("Jiro".to_string()),
            last_name: Some("Tanaka".to_string()),
            role: "ADMIN".to_string(),
        },
    ];

    for admin in &admins {
        directory.insert(admin).await?;
    }

    Ok(admins)
}

/// Demo dataset positioned relative to `now` so every pipeline stage has a
/// candidate on the next run: a quotation expiring tomorrow, one expiring in
/// two hours, one already past due, a fully-assigned booking tomorrow, and a
/// booking starting in roughly two hours.
pub async fn seed_demo_data(
    pool: &DbPool,
    now: DateTime<Utc>,
) -> Result<SeedSummary, RepositoryError> {
    let refs = insert_reference_rows(pool).await?;
    let admins = insert_admin_pair(pool).await?;

    let quotations = SqlQuotationRepository::new(pool.clone());
    let demo_quotations = [
        demo_quotation(1001, "Acme Corp", now + Duration::hours(24), now),
        demo_quotation(1002, "Globex Industries", now + Duration::hours(2), now),
        demo_quotation(1003, "Initech", now - Duration::hours(6), now),
    ];
    for quotation in &demo_quotations {
        quotations.insert(quotation).await?;
    }

    let bookings = SqlBookingRepository::new(pool.clone());
    let tomorrow_start = now + Duration::days(1);
    let two_hours_out = now + Duration::minutes(115);
    let demo_bookings = [
        demo_booking("BK-3001", tomorrow_start, BookingStatus::Confirmed, &refs, now),
        demo_booking("BK-3002", two_hours_out, BookingStatus::Assigned, &refs, now),
    ];
    for booking in &demo_bookings {
        bookings.insert(booking).await?;
    }

    Ok(SeedSummary {
        admins: admins.len() + 1,
        quotations: demo_quotations.len(),
        bookings: demo_bookings.len(),
    })
}

fn demo_quotation(
    quote_number: i64,
    customer_name: &str,
    expiry_date: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Quotation {
    Quotation {
        id: QuotationId(Uuid::new_v4()),
        quote_number,
        customer_name: customer_name.to_string(),
        service_type: "Airport Transfer".to_string(),
        status: QuotationStatus::Sent,
        expiry_date,
        converted_to_booking_id: None,
        created_at: now,
        updated_at: now,
    }
}

fn demo_booking(
    reference: &str,
    starts_at: DateTime<Utc>,
    status: BookingStatus,
    refs: &ReferenceRows,
    now: DateTime<Utc>,
) -> Booking {
    Booking {
        id: BookingId(Uuid::new_v4()),
        reference: reference.to_string(),
        customer_name: "Taro Yamada".to_string(),
        service_name: "Airport Transfer".to_string(),
        date: starts_at.date_naive(),
        time: starts_at.time(),
        status,
        pickup_location: Some("Haneda Airport Terminal 3".to_string()),
        dropoff_location: Some("Park Hyatt Tokyo".to_string()),
        notes: Some("Flight NH222, meet at arrivals".to_string()),
        customer_id: Some(refs.customer_id),
        driver_id: Some(refs.driver_id),
        vehicle_id: Some(refs.vehicle_id),
        created_by: Some(refs.admin_id),
        created_at: now,
        updated_at: now,
    }
}
