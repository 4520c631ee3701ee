//! Admin notification feed consumed by the dashboard.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::error;
use uuid::Uuid;

use fleetline_core::domain::notification::Notification;
use fleetline_core::errors::{ApplicationError, InterfaceError};
use fleetline_db::repositories::{NotificationRepository, RepositoryError};

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 200;

#[derive(Clone)]
pub struct ApiState {
    notifications: Arc<dyn NotificationRepository>,
}

pub fn router(notifications: Arc<dyn NotificationRepository>) -> Router {
    Router::new()
        .route("/api/notifications", get(list_notifications))
        .route("/api/notifications/{id}/read", post(mark_notification_read))
        .with_state(ApiState { notifications })
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    user_id: String,
    limit: Option<i64>,
}

async fn list_notifications(
    State(state): State<ApiState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Notification>>, (StatusCode, Json<Value>)> {
    let user_id = parse_user_id(&query.user_id)?;
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);

    state
        .notifications
        .list_for_user(user_id, limit)
        .await
        .map(Json)
        .map_err(|query_error| repository_failure("list notifications", query_error))
}

#[derive(Debug, Deserialize)]
struct MarkReadRequest {
    user_id: String,
}

async fn mark_notification_read(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    Json(request): Json<MarkReadRequest>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    let user_id = parse_user_id(&request.user_id)?;

    let updated = state
        .notifications
        .mark_read(id, user_id)
        .await
        .map_err(|update_error| repository_failure("mark notification read", update_error))?;

    if updated {
        Ok((StatusCode::OK, Json(json!({ "updated": true }))))
    } else {
        Err((StatusCode::NOT_FOUND, Json(json!({ "error": "notification not found" }))))
    }
}

fn parse_user_id(raw: &str) -> Result<Uuid, (StatusCode, Json<Value>)> {
    Uuid::parse_str(raw).map_err(|_| {
        (StatusCode::BAD_REQUEST, Json(json!({ "error": "user_id must be a uuid" })))
    })
}

fn repository_failure(
    operation: &'static str,
    failure: RepositoryError,
) -> (StatusCode, Json<Value>) {
    let correlation_id = Uuid::new_v4().to_string();
    error!(
        event_name = "server.api.repository_failure",
        operation,
        correlation_id = %correlation_id,
        error = %failure,
        "notification api request failed"
    );

    let interface =
        ApplicationError::Persistence(failure.to_string()).into_interface(correlation_id.clone());
    let status = match interface {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (
        status,
        Json(json!({ "error": interface.user_message(), "correlation_id": correlation_id })),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        extract::{Path, Query, State},
        http::StatusCode,
        Json,
    };
    use chrono::Utc;
    use uuid::Uuid;

    use fleetline_core::domain::notification::{AdminAlert, NotificationKind};
    use fleetline_db::repositories::{NotificationRepository, SqlNotificationRepository};
    use fleetline_db::{connect_with_settings, fixtures, migrations, DbPool};

    use super::{list_notifications, mark_notification_read, ApiState, ListQuery, MarkReadRequest};

    async fn setup_pool() -> DbPool {
        let pool =
            connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect test pool");
        migrations::run_pending(&pool).await.expect("run migrations");
        pool
    }

    #[tokio::test]
    async fn feed_returns_rows_for_the_requested_admin_only() {
        let pool = setup_pool().await;
        let admins = fixtures::insert_admin_pair(&pool).await.expect("admins");
        let repo = Arc::new(SqlNotificationRepository::new(pool.clone()));

        repo.claim_and_fan_out(
            &AdminAlert {
                kind: NotificationKind::BookingReminder24h,
                related_id: Uuid::new_v4(),
                title: "Booking reminder: Airport Transfer tomorrow".to_string(),
                message: "Booking for Taro Yamada".to_string(),
            },
            &admins,
            Utc::now(),
        )
        .await
        .expect("fan-out");

        let state = ApiState { notifications: repo };
        let Json(feed) = list_notifications(
            State(state),
            Query(ListQuery { user_id: admins[0].id.to_string(), limit: None }),
        )
        .await
        .expect("list should succeed");

        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].user_id, admins[0].id);

        pool.close().await;
    }

    #[tokio::test]
    async fn invalid_user_id_is_a_bad_request() {
        let pool = setup_pool().await;
        let state = ApiState {
            notifications: Arc::new(SqlNotificationRepository::new(pool.clone())),
        };

        let error = list_notifications(
            State(state),
            Query(ListQuery { user_id: "not-a-uuid".to_string(), limit: None }),
        )
        .await
        .expect_err("list should fail");

        assert_eq!(error.0, StatusCode::BAD_REQUEST);

        pool.close().await;
    }

    #[tokio::test]
    async fn repository_failures_surface_with_a_correlation_id() {
        let pool = setup_pool().await;
        let admins = fixtures::insert_admin_pair(&pool).await.expect("admins");
        let state = ApiState {
            notifications: Arc::new(SqlNotificationRepository::new(pool.clone())),
        };
        pool.close().await;

        let error = list_notifications(
            State(state),
            Query(ListQuery { user_id: admins[0].id.to_string(), limit: None }),
        )
        .await
        .expect_err("list should fail against a closed pool");

        assert_eq!(error.0, StatusCode::SERVICE_UNAVAILABLE);
        assert!(error.1 .0["correlation_id"].is_string());
    }

    #[tokio::test]
    async fn marking_an_unknown_notification_is_not_found() {
        let pool = setup_pool().await;
        let admins = fixtures::insert_admin_pair(&pool).await.expect("admins");
        let state = ApiState {
            notifications: Arc::new(SqlNotificationRepository::new(pool.clone())),
        };

        let error = mark_notification_read(
            State(state),
            Path(Uuid::new_v4()),
            Json(MarkReadRequest { user_id: admins[0].id.to_string() }),
        )
        .await
        .expect_err("mark should fail");

        assert_eq!(error.0, StatusCode::NOT_FOUND);

        pool.close().await;
    }
}
