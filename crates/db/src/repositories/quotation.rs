use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row};
use uuid::Uuid;

use fleetline_core::domain::quotation::{Quotation, QuotationId, QuotationStatus};
use fleetline_core::windows::TimeWindow;

use super::{QuotationRepository, RepositoryError};
use crate::DbPool;

pub struct SqlQuotationRepository {
    pool: DbPool,
}

impl SqlQuotationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const QUOTATION_COLUMNS: &str = "id,
    quote_number,
    customer_name,
    service_type,
    status,
    expiry_date,
    converted_to_booking_id,
    created_at,
    updated_at";

#[async_trait::async_trait]
impl QuotationRepository for SqlQuotationRepository {
    async fn insert(&self, quotation: &Quotation) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO quotations (
                id,
                quote_number,
                customer_name,
                service_type,
                status,
                expiry_date,
                converted_to_booking_id,
                created_at,
                updated_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(quotation.id.0.to_string())
        .bind(quotation.quote_number)
        .bind(&quotation.customer_name)
        .bind(&quotation.service_type)
        .bind(quotation.status.as_str())
        .bind(quotation.expiry_date.to_rfc3339())
        .bind(quotation.converted_to_booking_id.map(|id| id.to_string()))
        .bind(quotation.created_at.to_rfc3339())
        .bind(quotation.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: &QuotationId) -> Result<Option<Quotation>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {QUOTATION_COLUMNS} FROM quotations WHERE id = ?"
        ))
        .bind(id.0.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(quotation_from_row).transpose()
    }

    async fn sent_expiring_within(
        &self,
        window: &TimeWindow,
    ) -> Result<Vec<Quotation>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {QUOTATION_COLUMNS}
             FROM quotations
             WHERE status = 'sent'
               AND converted_to_booking_id IS NULL
               AND expiry_date >= ?
               AND expiry_date <= ?
             ORDER BY expiry_date ASC",
        ))
        .bind(window.from.to_rfc3339())
        .bind(window.to.to_rfc3339())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(quotation_from_row).collect()
    }

    async fn sent_expired_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Quotation>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {QUOTATION_COLUMNS}
             FROM quotations
             WHERE status = 'sent'
               AND converted_to_booking_id IS NULL
               AND expiry_date < ?
             ORDER BY expiry_date ASC",
        ))
        .bind(cutoff.to_rfc3339())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(quotation_from_row).collect()
    }

    async fn mark_expired(
        &self,
        id: &QuotationId,
        now: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE quotations
             SET status = 'expired', updated_at = ?
             WHERE id = ? AND status = 'sent'",
        )
        .bind(now.to_rfc3339())
        .bind(id.0.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn quotation_from_row(row: SqliteRow) -> Result<Quotation, RepositoryError> {
    let status_raw = row.try_get::<String, _>("status")?;
    let status = QuotationStatus::parse(&status_raw).ok_or_else(|| {
        RepositoryError::Decode(format!("unknown quotation status `{status_raw}`"))
    })?;

    Ok(Quotation {
        id: QuotationId(parse_uuid("id", row.try_get("id")?)?),
        quote_number: row.try_get("quote_number")?,
        customer_name: row.try_get("customer_name")?,
        service_type: row.try_get("service_type")?,
        status,
        expiry_date: parse_timestamp("expiry_date", row.try_get("expiry_date")?)?,
        converted_to_booking_id: row
            .try_get::<Option<String>, _>("converted_to_booking_id")?
            .map(|raw| parse_uuid("converted_to_booking_id", raw))
            .transpose()?,
        created_at: parse_timestamp("created_at", row.try_get("created_at")?)?,
        updated_at: parse_timestamp("updated_at", row.try_get("updated_at")?)?,
    })
}

pub(crate) fn parse_uuid(column: &str, value: String) -> Result<Uuid, RepositoryError> {
    Uuid::parse_str(&value).map_err(|error| {
        RepositoryError::Decode(format!("invalid uuid in `{column}`: `{value}` ({error})"))
    })
}

pub(crate) fn parse_timestamp(column: &str, value: String) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(&value).map(|timestamp| timestamp.with_timezone(&Utc)).map_err(
        |error| {
            RepositoryError::Decode(format!("invalid timestamp in `{column}`: `{value}` ({error})"))
        },
    )
}
