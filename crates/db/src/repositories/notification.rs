use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row};
use uuid::Uuid;

use fleetline_core::domain::notification::{
    AdminAlert, AdminUser, Notification, NotificationEvent, NotificationKind,
};

use super::quotation::{parse_timestamp, parse_uuid};
use super::{FanoutOutcome, NotificationRepository, RepositoryError};
use crate::DbPool;

pub struct SqlNotificationRepository {
    pool: DbPool,
}

impl SqlNotificationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const NOTIFICATION_COLUMNS: &str = "id,
    kind,
    related_id,
    title,
    message,
    user_id,
    is_read,
    created_at";

#[async_trait::async_trait]
impl NotificationRepository for SqlNotificationRepository {
    async fn event_triggered(&self, event: &NotificationEvent) -> Result<bool, RepositoryError> {
        let row = sqlx::query(
            "SELECT 1 AS present FROM notification_events WHERE kind = ? AND related_id = ?",
        )
        .bind(event.kind.as_str())
        .bind(event.related_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.is_some())
    }

    async fn claim_and_fan_out(
        &self,
        alert: &AdminAlert,
        recipients: &[AdminUser],
        now: DateTime<Utc>,
    ) -> Result<FanoutOutcome, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let claim = sqlx::query(
            "INSERT OR IGNORE INTO notification_events (kind, related_id, triggered_at)
             VALUES (?, ?, ?)",
        )
        .bind(alert.kind.as_str())
        .bind(alert.related_id.to_string())
        .bind(now.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        if claim.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(FanoutOutcome::AlreadyTriggered);
        }

        for recipient in recipients {
            sqlx::query(
                "INSERT INTO notifications (
                    id,
                    kind,
                    related_id,
                    title,
                    message,
                    user_id,
                    is_read,
                    created_at
                 ) VALUES (?, ?, ?, ?, ?, ?, 0, ?)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(alert.kind.as_str())
            .bind(alert.related_id.to_string())
            .bind(&alert.title)
            .bind(&alert.message)
            .bind(recipient.id.to_string())
            .bind(now.to_rfc3339())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(FanoutOutcome::Delivered { recipients: recipients.len() })
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Notification>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {NOTIFICATION_COLUMNS}
             FROM notifications
             WHERE user_id = ?
             ORDER BY created_at DESC, id DESC
             LIMIT ?",
        ))
        .bind(user_id.to_string())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(notification_from_row).collect()
    }

    async fn mark_read(
        &self,
        notification_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE notifications
             SET is_read = 1
             WHERE id = ? AND user_id = ? AND is_read = 0",
        )
        .bind(notification_id.to_string())
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_for_event(
        &self,
        event: &NotificationEvent,
    ) -> Result<Vec<Notification>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {NOTIFICATION_COLUMNS}
             FROM notifications
             WHERE kind = ? AND related_id = ?
             ORDER BY created_at ASC, id ASC",
        ))
        .bind(event.kind.as_str())
        .bind(event.related_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(notification_from_row).collect()
    }
}

fn notification_from_row(row: &SqliteRow) -> Result<Notification, RepositoryError> {
    let kind_raw = row.try_get::<String, _>("kind")?;
    let kind = NotificationKind::parse(&kind_raw)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown notification kind `{kind_raw}`")))?;

    Ok(Notification {
        id: parse_uuid("id", row.try_get("id")?)?,
        kind,
        related_id: parse_uuid("related_id", row.try_get("related_id")?)?,
        title: row.try_get("title")?,
        message: row.try_get("message")?,
        user_id: parse_uuid("user_id", row.try_get("user_id")?)?,
        is_read: row.try_get::<i64, _>("is_read")? != 0,
        created_at: parse_timestamp("created_at", row.try_get("created_at")?)?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use uuid::Uuid;

    use fleetline_core::domain::notification::{AdminAlert, NotificationEvent, NotificationKind};

    use super::SqlNotificationRepository;
    use crate::fixtures;
    use crate::migrations;
    use crate::repositories::{FanoutOutcome, NotificationRepository};
    use crate::{connect_with_settings, DbPool};

    async fn setup_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30)
            .await
            .expect("connect test pool");
        migrations::run_pending(&pool).await.expect("run migrations");
        pool
    }

    fn alert(related_id: Uuid) -> AdminAlert {
        AdminAlert {
            kind: NotificationKind::QuotationExpiring24h,
            related_id,
            title: "Quotation #42 expires in 24 hours".to_string(),
            message: "Quotation for Acme Corp expires tomorrow".to_string(),
        }
    }

    fn parse_ts(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value).expect("valid rfc3339").with_timezone(&Utc)
    }

    #[tokio::test]
    async fn fan_out_writes_one_row_per_recipient() {
        let pool = setup_pool().await;
        let repo = SqlNotificationRepository::new(pool.clone());
        let admins = fixtures::insert_admin_pair(&pool).await.expect("admins");
        let related_id = Uuid::new_v4();
        let now = parse_ts("2026-03-10T09:00:00Z");

        let outcome = repo
            .claim_and_fan_out(&alert(related_id), &admins, now)
            .await
            .expect("first fan-out");
        assert_eq!(outcome, FanoutOutcome::Delivered { recipients: 2 });

        let event =
            NotificationEvent { kind: NotificationKind::QuotationExpiring24h, related_id };
        let rows = repo.list_for_event(&event).await.expect("list rows");
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|n| !n.is_read));

        pool.close().await;
    }

    #[tokio::test]
    async fn second_claim_is_rejected_without_writing_rows() {
        let pool = setup_pool().await;
        let repo = SqlNotificationRepository::new(pool.clone());
        let admins = fixtures::insert_admin_pair(&pool).await.expect("admins");
        let related_id = Uuid::new_v4();
        let now = parse_ts("2026-03-10T09:00:00Z");

        repo.claim_and_fan_out(&alert(related_id), &admins, now).await.expect("first fan-out");
        let second = repo
            .claim_and_fan_out(&alert(related_id), &admins, now)
            .await
            .expect("second fan-out");
        assert_eq!(second, FanoutOutcome::AlreadyTriggered);

        let event =
            NotificationEvent { kind: NotificationKind::QuotationExpiring24h, related_id };
        assert!(repo.event_triggered(&event).await.expect("probe"));
        let rows = repo.list_for_event(&event).await.expect("list rows");
        assert_eq!(rows.len(), 2, "duplicate claim must not add rows");

        pool.close().await;
    }

    #[tokio::test]
    async fn distinct_kinds_for_the_same_entity_fire_independently() {
        let pool = setup_pool().await;
        let repo = SqlNotificationRepository::new(pool.clone());
        let admins = fixtures::insert_admin_pair(&pool).await.expect("admins");
        let related_id = Uuid::new_v4();
        let now = parse_ts("2026-03-10T09:00:00Z");

        repo.claim_and_fan_out(&alert(related_id), &admins, now).await.expect("24h fan-out");

        let urgent = AdminAlert {
            kind: NotificationKind::QuotationExpiring2h,
            related_id,
            title: "Urgent: Quotation #42 expires in 2 hours".to_string(),
            message: "Quotation for Acme Corp expires soon".to_string(),
        };
        let outcome =
            repo.claim_and_fan_out(&urgent, &admins, now).await.expect("2h fan-out");
        assert_eq!(outcome, FanoutOutcome::Delivered { recipients: 2 });

        pool.close().await;
    }

    #[tokio::test]
    async fn mark_read_flips_only_the_owners_row_once() {
        let pool = setup_pool().await;
        let repo = SqlNotificationRepository::new(pool.clone());
        let admins = fixtures::insert_admin_pair(&pool).await.expect("admins");
        let related_id = Uuid::new_v4();
        let now = parse_ts("2026-03-10T09:00:00Z");

        repo.claim_and_fan_out(&alert(related_id), &admins, now).await.expect("fan-out");

        let inbox = repo.list_for_user(admins[0].id, 50).await.expect("inbox");
        assert_eq!(inbox.len(), 1);
        let notification_id = inbox[0].id;

        // Another admin cannot mark it.
        assert!(!repo.mark_read(notification_id, admins[1].id).await.expect("foreign mark"));
        assert!(repo.mark_read(notification_id, admins[0].id).await.expect("own mark"));
        assert!(!repo.mark_read(notification_id, admins[0].id).await.expect("repeat mark"));

        pool.close().await;
    }
}
