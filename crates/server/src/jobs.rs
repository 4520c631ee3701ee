//! Cron-facing trigger for the notification pipeline.
//!
//! External schedulers POST here on whatever cadence they run; the endpoint
//! is CORS-enabled so hosted cron services can preflight. Re-triggering is
//! harmless: the pipeline's event ledger makes every pass idempotent.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, Method, StatusCode},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use fleetline_scheduler::NotificationPipeline;

#[derive(Clone)]
pub struct JobsState {
    pipeline: Arc<NotificationPipeline>,
}

pub fn router(pipeline: Arc<NotificationPipeline>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    Router::new()
        .route("/jobs/scheduled-notifications", post(run_scheduled_notifications))
        .layer(cors)
        .with_state(JobsState { pipeline })
}

pub async fn run_scheduled_notifications(
    State(state): State<JobsState>,
) -> (StatusCode, Json<Value>) {
    match state.pipeline.run(Utc::now()).await {
        Ok(summary) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "Scheduled notifications processed successfully",
                "processed_at": Utc::now().to_rfc3339(),
                "summary": summary,
            })),
        ),
        Err(run_error) => {
            error!(
                event_name = "server.jobs.run_failed",
                error = %run_error,
                "scheduled notification run failed"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "error": "Failed to process scheduled notifications",
                    "details": run_error.to_string(),
                })),
            )
        }
    }
}

/// In-process fallback trigger for deployments without an external cron.
pub fn spawn_interval(pipeline: Arc<NotificationPipeline>, interval_secs: u64) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        info!(
            event_name = "server.jobs.interval_started",
            interval_secs,
            "in-process scheduler interval started"
        );

        loop {
            ticker.tick().await;
            if let Err(run_error) = pipeline.run(Utc::now()).await {
                error!(
                    event_name = "server.jobs.interval_run_failed",
                    error = %run_error,
                    "interval-triggered notification run failed"
                );
            }
        }
    });
}
