use std::sync::Arc;

use chrono::Utc;

use crate::commands::CommandResult;
use fleetline_core::config::{AppConfig, EmailProvider, LoadOptions};
use fleetline_db::{connect_with_settings, migrations};
use fleetline_mailer::{MailTransport, MailerSettings, NoopTransport, ReminderMailer, ResendTransport};
use fleetline_scheduler::NotificationPipeline;

/// One scheduled-notification pass. Wire this into cron:
/// `*/15 * * * * fleetline tick`
pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "tick",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "tick",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let transport: Arc<dyn MailTransport> = match config.email.provider {
            EmailProvider::Resend => {
                let api_key =
                    config.email.api_key.clone().unwrap_or_else(|| String::new().into());
                let resend = ResendTransport::new(&config.email.base_url, api_key)
                    .map_err(|error| ("mailer_init", error.to_string(), 6u8))?;
                Arc::new(resend)
            }
            EmailProvider::Noop => Arc::new(NoopTransport),
        };
        let mailer = ReminderMailer::new(transport, MailerSettings::from(&config.email))
            .map_err(|error| ("mailer_init", error.to_string(), 6u8))?;

        let pipeline = NotificationPipeline::from_pool(pool.clone(), mailer);
        let summary = pipeline
            .run(Utc::now())
            .await
            .map_err(|error| ("pipeline", error.to_string(), 7u8))?;

        pool.close().await;
        Ok::<_, (&'static str, String, u8)>(summary)
    });

    match result {
        Ok(summary) => CommandResult::success(
            "tick",
            serde_json::to_string(&summary)
                .unwrap_or_else(|_| "scheduled notification run complete".to_string()),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("tick", error_class, message, exit_code)
        }
    }
}
