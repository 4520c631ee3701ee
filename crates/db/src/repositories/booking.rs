use chrono::{NaiveDate, NaiveTime};
use sqlx::{sqlite::SqliteRow, Row};

use fleetline_core::domain::booking::{
    Booking, BookingId, BookingReminderDetails, BookingStatus, CustomerContact, DriverContact,
    VehicleSummary,
};

use super::quotation::{parse_timestamp, parse_uuid};
use super::{BookingRepository, RepositoryError};
use crate::DbPool;

pub struct SqlBookingRepository {
    pool: DbPool,
}

impl SqlBookingRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const BOOKING_COLUMNS: &str = "b.id,
    b.reference,
    b.customer_name,
    b.service_name,
    b.date,
    b.time,
    b.status,
    b.pickup_location,
    b.dropoff_location,
    b.notes,
    b.customer_id,
    b.driver_id,
    b.vehicle_id,
    b.created_by,
    b.created_at,
    b.updated_at";

#[async_trait::async_trait]
impl BookingRepository for SqlBookingRepository {
    async fn insert(&self, booking: &Booking) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO bookings (
                id,
                reference,
                customer_name,
                service_name,
                date,
                time,
                status,
                pickup_location,
                dropoff_location,
                notes,
                customer_id,
                driver_id,
                vehicle_id,
                created_by,
                created_at,
                updated_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(booking.id.0.to_string())
        .bind(&booking.reference)
        .bind(&booking.customer_name)
        .bind(&booking.service_name)
        .bind(booking.date.format("%Y-%m-%d").to_string())
        .bind(booking.time.format("%H:%M").to_string())
        .bind(booking.status.as_str())
        .bind(booking.pickup_location.as_deref())
        .bind(booking.dropoff_location.as_deref())
        .bind(booking.notes.as_deref())
        .bind(booking.customer_id.map(|id| id.to_string()))
        .bind(booking.driver_id.map(|id| id.to_string()))
        .bind(booking.vehicle_id.map(|id| id.to_string()))
        .bind(booking.created_by.map(|id| id.to_string()))
        .bind(booking.created_at.to_rfc3339())
        .bind(booking.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn reminderable_on(&self, date: NaiveDate) -> Result<Vec<Booking>, RepositoryError> {
        let statuses = BookingStatus::REMINDERABLE
            .iter()
            .map(|status| format!("'{}'", status.as_str()))
            .collect::<Vec<_>>()
            .join(", ");
        let rows = sqlx::query(&format!(
            "SELECT {BOOKING_COLUMNS}
             FROM bookings b
             WHERE b.date = ?
               AND b.status IN ({statuses})
             ORDER BY b.time ASC",
        ))
        .bind(date.format("%Y-%m-%d").to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(booking_from_row).collect()
    }

    async fn reminder_details(
        &self,
        id: &BookingId,
    ) -> Result<Option<BookingReminderDetails>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {BOOKING_COLUMNS},
                c.name AS customer_contact_name,
                c.email AS customer_contact_email,
                d.first_name AS driver_first_name,
                d.last_name AS driver_last_name,
                d.phone AS driver_phone,
                d.email AS driver_email,
                v.plate_number AS vehicle_plate_number,
                v.brand AS vehicle_brand,
                v.model AS vehicle_model,
                a.email AS creator_email
             FROM bookings b
             LEFT JOIN customers c ON c.id = b.customer_id
             LEFT JOIN drivers d ON d.id = b.driver_id
             LEFT JOIN vehicles v ON v.id = b.vehicle_id
             LEFT JOIN admin_users a ON a.id = b.created_by
             WHERE b.id = ?",
        ))
        .bind(id.0.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(details_from_row).transpose()
    }
}

fn details_from_row(row: SqliteRow) -> Result<BookingReminderDetails, RepositoryError> {
    let customer = row
        .try_get::<Option<String>, _>("customer_contact_name")?
        .map(|name| -> Result<CustomerContact, RepositoryError> {
            Ok(CustomerContact { name, email: row.try_get("customer_contact_email")? })
        })
        .transpose()?;

    let driver = row
        .try_get::<Option<String>, _>("driver_first_name")?
        .map(|first_name| -> Result<DriverContact, RepositoryError> {
            Ok(DriverContact {
                first_name,
                last_name: row.try_get("driver_last_name")?,
                phone: row.try_get("driver_phone")?,
                email: row.try_get("driver_email")?,
            })
        })
        .transpose()?;

    let vehicle = row
        .try_get::<Option<String>, _>("vehicle_plate_number")?
        .map(|plate_number| -> Result<VehicleSummary, RepositoryError> {
            Ok(VehicleSummary {
                plate_number,
                brand: row.try_get("vehicle_brand")?,
                model: row.try_get("vehicle_model")?,
            })
        })
        .transpose()?;

    Ok(BookingReminderDetails {
        booking: booking_from_row(&row)?,
        customer,
        driver,
        vehicle,
        creator_email: row.try_get("creator_email")?,
    })
}

fn booking_from_row(row: &SqliteRow) -> Result<Booking, RepositoryError> {
    let status_raw = row.try_get::<String, _>("status")?;
    let status = BookingStatus::parse(&status_raw)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown booking status `{status_raw}`")))?;

    Ok(Booking {
        id: BookingId(parse_uuid("id", row.try_get("id")?)?),
        reference: row.try_get("reference")?,
        customer_name: row.try_get("customer_name")?,
        service_name: row.try_get("service_name")?,
        date: parse_date("date", row.try_get("date")?)?,
        time: parse_time("time", row.try_get("time")?)?,
        status,
        pickup_location: row.try_get("pickup_location")?,
        dropoff_location: row.try_get("dropoff_location")?,
        notes: row.try_get("notes")?,
        customer_id: parse_optional_uuid("customer_id", row.try_get("customer_id")?)?,
        driver_id: parse_optional_uuid("driver_id", row.try_get("driver_id")?)?,
        vehicle_id: parse_optional_uuid("vehicle_id", row.try_get("vehicle_id")?)?,
        created_by: parse_optional_uuid("created_by", row.try_get("created_by")?)?,
        created_at: parse_timestamp("created_at", row.try_get("created_at")?)?,
        updated_at: parse_timestamp("updated_at", row.try_get("updated_at")?)?,
    })
}

fn parse_optional_uuid(
    column: &str,
    value: Option<String>,
) -> Result<Option<uuid::Uuid>, RepositoryError> {
    value.map(|raw| parse_uuid(column, raw)).transpose()
}

fn parse_date(column: &str, value: String) -> Result<NaiveDate, RepositoryError> {
    NaiveDate::parse_from_str(&value, "%Y-%m-%d").map_err(|error| {
        RepositoryError::Decode(format!("invalid date in `{column}`: `{value}` ({error})"))
    })
}

fn parse_time(column: &str, value: String) -> Result<NaiveTime, RepositoryError> {
    NaiveTime::parse_from_str(&value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(&value, "%H:%M:%S"))
        .map_err(|error| {
            RepositoryError::Decode(format!("invalid time in `{column}`: `{value}` ({error})"))
        })
}
