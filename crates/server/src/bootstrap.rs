use std::sync::Arc;

use ledgerline_agent::{HttpNluEngine, NluError, QueryRuntime, RuntimeSettings};
use ledgerline_core::config::{AppConfig, ConfigError};
use ledgerline_db::{connect_with_settings, ProcedureGateway, SqlProcedureGateway};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub gateway: Arc<dyn ProcedureGateway>,
    pub runtime: Arc<QueryRuntime>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("nlu client setup failed: {0}")]
    Nlu(#[source] NluError),
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );
    config.validate()?;

    let pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        ledger_procedure = %config.database.ledger_procedure,
        product_procedure = %config.database.product_procedure,
        "database connection established"
    );

    let gateway: Arc<dyn ProcedureGateway> = Arc::new(SqlProcedureGateway::new(
        pool,
        &config.database.ledger_procedure,
        &config.database.product_procedure,
    ));
    let nlu = HttpNluEngine::from_config(&config.nlu).map_err(BootstrapError::Nlu)?;
    info!(
        event_name = "system.bootstrap.nlu_configured",
        correlation_id = "bootstrap",
        parse_url = %nlu.parse_url(),
        "nlu client configured"
    );

    let runtime = Arc::new(QueryRuntime::new(
        Arc::new(nlu),
        Arc::clone(&gateway),
        RuntimeSettings::from(&config),
    ));

    Ok(Application { config, gateway, runtime })
}

#[cfg(test)]
mod tests {
    use ledgerline_core::config::AppConfig;

    use crate::bootstrap::{bootstrap_with_config, BootstrapError};

    #[tokio::test]
    async fn bootstrap_fails_fast_on_invalid_database_url() {
        let mut config = AppConfig::default();
        config.database.url = "mysql://ledgerline@localhost/erp".to_string();

        let result = bootstrap_with_config(config).await;

        let message = result.err().map(|error| error.to_string()).unwrap_or_default();
        assert!(message.contains("database.url"), "unexpected message: {message}");
    }

    #[tokio::test]
    async fn bootstrap_rejects_unsafe_procedure_names() {
        let mut config = AppConfig::default();
        config.database.ledger_procedure = "sp_ledger; DROP TABLE ledger".to_string();

        let result = bootstrap_with_config(config).await;
        assert!(matches!(result, Err(BootstrapError::Config(_))));
    }

    #[tokio::test]
    async fn bootstrap_reports_unreachable_database() {
        let mut config = AppConfig::default();
        config.database.url = "postgres://ledgerline@127.0.0.1:1/erp".to_string();
        config.database.timeout_secs = 1;

        let result = bootstrap_with_config(config).await;
        assert!(matches!(result, Err(BootstrapError::DatabaseConnect(_))));
    }
}
