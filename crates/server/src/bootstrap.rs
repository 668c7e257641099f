use std::sync::Arc;

use loadline_core::config::{AppConfig, ConfigError, LoadOptions};
use loadline_core::{InMemorySessionStore, NegotiationEngine};
use loadline_db::repositories::{SqlCallLogRepository, SqlLoadRepository};
use loadline_db::{connect_with_settings, migrations, DbPool};
use thiserror::Error;
use tracing::info;

use crate::routes::AppState;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub state: AppState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let loads = Arc::new(SqlLoadRepository::new(db_pool.clone()));
    let call_logs = Arc::new(SqlCallLogRepository::new(db_pool.clone()));
    let policy = config.negotiation.policy()?;
    let engine = Arc::new(NegotiationEngine::new(
        loads.clone(),
        call_logs.clone(),
        Arc::new(InMemorySessionStore::new()),
        policy,
        config.negotiation.repository_attempts,
    ));

    let state = AppState {
        engine,
        loads,
        call_logs,
        db_pool: db_pool.clone(),
        api_key: config.auth.api_key.clone(),
    };

    Ok(Application { config, db_pool, state })
}

#[cfg(test)]
mod tests {
    use loadline_core::config::{ConfigOverrides, LoadOptions};
    use loadline_core::{LoadId, NegotiationOutcome};
    use loadline_db::seed_demo_loads;
    use rust_decimal::Decimal;

    use crate::bootstrap::bootstrap;

    fn valid_overrides(database_url: &str) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(database_url.to_string()),
                api_key: Some("test-key".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_without_an_api_key() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:".to_string()),
                api_key: Some("   ".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await;

        assert!(result.is_err());
        let message = result.err().expect("error").to_string();
        assert!(message.contains("auth.api_key"));
    }

    #[tokio::test]
    async fn integration_smoke_covers_startup_seed_and_negotiation_path() {
        let app = bootstrap(valid_overrides(
            "sqlite:file:loadline_bootstrap_smoke?mode=memory&cache=shared",
        ))
        .await
        .expect("bootstrap should succeed with valid overrides");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master \
             WHERE type = 'table' AND name IN ('loads', 'call_logs')",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("expected baseline tables to be available after bootstrap");
        assert_eq!(table_count, 2, "bootstrap should expose the loads and call_logs tables");

        seed_demo_loads(&app.db_pool).await.expect("seed demo loads");

        let load_id = LoadId("LD-1001".to_string());
        let countered = app
            .state
            .engine
            .negotiate(&load_id, Decimal::new(700, 0))
            .await
            .expect("first offer");
        assert!(matches!(countered, NegotiationOutcome::Countered { round: 1, .. }));

        let accepted = app
            .state
            .engine
            .negotiate(&load_id, Decimal::new(960, 0))
            .await
            .expect("second offer");
        assert_eq!(
            accepted,
            NegotiationOutcome::Accepted { agreed_rate: Decimal::new(960, 0), round: 2 }
        );

        // The terminal outcome landed in the call log.
        let (log_count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM call_logs")
            .fetch_one(&app.db_pool)
            .await
            .expect("call log count");
        assert_eq!(log_count, 1);

        app.db_pool.close().await;
    }
}
