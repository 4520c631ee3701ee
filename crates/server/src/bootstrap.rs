use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use fleetline_core::config::{AppConfig, ConfigError, EmailProvider, LoadOptions};
use fleetline_db::repositories::SqlNotificationRepository;
use fleetline_db::{connect_with_settings, migrations, DbPool};
use fleetline_mailer::{
    MailError, MailTransport, MailerSettings, NoopTransport, ReminderMailer, ResendTransport,
};
use fleetline_scheduler::NotificationPipeline;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub pipeline: Arc<NotificationPipeline>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("mailer initialization failed: {0}")]
    Mailer(#[source] MailError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(event_name = "system.bootstrap.database_connected", "database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    let mailer = build_mailer(&config)?;
    let pipeline = Arc::new(NotificationPipeline::from_pool(db_pool.clone(), mailer));

    Ok(Application { config, db_pool, pipeline })
}

fn build_mailer(config: &AppConfig) -> Result<ReminderMailer, BootstrapError> {
    let settings = MailerSettings::from(&config.email);

    let transport: Arc<dyn MailTransport> = match config.email.provider {
        EmailProvider::Resend => {
            // Config validation already guarantees the key is present.
            let api_key = config.email.api_key.clone().unwrap_or_else(|| String::new().into());
            Arc::new(
                ResendTransport::new(&config.email.base_url, api_key)
                    .map_err(BootstrapError::Mailer)?,
            )
        }
        EmailProvider::Noop => Arc::new(NoopTransport),
    };

    info!(
        event_name = "system.bootstrap.mail_transport",
        provider = ?config.email.provider,
        "mail transport initialized"
    );

    ReminderMailer::new(transport, settings).map_err(BootstrapError::Mailer)
}

pub fn notification_repository(pool: &DbPool) -> Arc<SqlNotificationRepository> {
    Arc::new(SqlNotificationRepository::new(pool.clone()))
}

#[cfg(test)]
mod tests {
    use fleetline_core::config::{ConfigOverrides, EmailProvider, LoadOptions};

    use crate::bootstrap::bootstrap;

    fn valid_overrides(database_url: &str) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(database_url.to_string()),
                email_provider: Some(EmailProvider::Noop),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_when_resend_has_no_api_key() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:".to_string()),
                email_provider: Some(EmailProvider::Resend),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await;

        assert!(result.is_err());
        let message = result.err().expect("error").to_string();
        assert!(message.contains("email.api_key"));
    }

    #[tokio::test]
    async fn bootstrap_applies_migrations_and_wires_the_pipeline() {
        let app = bootstrap(valid_overrides("sqlite::memory:?cache=shared"))
            .await
            .expect("bootstrap should succeed with valid overrides");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master \
             WHERE type = 'table' AND name IN ('quotations', 'bookings', 'notifications', 'notification_events')",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("expected foundation tables to be available after bootstrap");
        assert_eq!(table_count, 4, "bootstrap should expose the pipeline's tables");

        let summary = app.pipeline.run(chrono::Utc::now()).await.expect("empty run succeeds");
        assert_eq!(summary.reminder_emails_sent, 0);

        app.db_pool.close().await;
    }
}
