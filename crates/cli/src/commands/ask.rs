use std::sync::Arc;

use ledgerline_agent::{HttpNluEngine, QueryRuntime, RuntimeSettings};
use ledgerline_core::config::{AppConfig, LoadOptions};
use ledgerline_db::{connect_lazy_with_settings, SqlProcedureGateway};

use serde::Serialize;

use crate::commands::{
    CommandResult, EXIT_COLLABORATOR_FAILURE, EXIT_CONFIG_INVALID, EXIT_RUNTIME_INIT,
    EXIT_SERIALIZATION_FAILURE,
};

const COMMAND: &str = "ask";

pub fn run(text: &str) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "config_validation",
                error.to_string(),
                EXIT_CONFIG_INVALID,
            )
        }
    };
    crate::init_logging(&config);

    let async_runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                EXIT_RUNTIME_INIT,
            )
        }
    };

    async_runtime.block_on(async {
        let query_runtime = match build_runtime(&config) {
            Ok(runtime) => runtime,
            Err(message) => {
                return CommandResult::failure(COMMAND, "runtime_init", message, EXIT_RUNTIME_INIT)
            }
        };

        match query_runtime.handle(text).await {
            Ok(response) => {
                tracing::info!(
                    event_name = "cli.ask.answered",
                    response_kind = response.kind(),
                    "ask command answered"
                );
                let message = match response.error_message() {
                    Some(error) => format!("answered with error: {error}"),
                    None => format!("answered {} query", response.kind()),
                };
                answered(message, &response)
            }
            Err(error) => {
                tracing::warn!(event_name = "cli.ask.failed", error = %error, "ask command failed");
                CommandResult::failure(
                    COMMAND,
                    "collaborator_failure",
                    error.to_string(),
                    EXIT_COLLABORATOR_FAILURE,
                )
            }
        }
    })
}

fn answered(message: String, response: &impl Serialize) -> CommandResult {
    match serde_json::to_value(response) {
        Ok(value) => CommandResult::success(COMMAND, message, Some(value)),
        Err(error) => {
            tracing::error!(
                event_name = "cli.ask.serialization_failed",
                error = %error,
                "ask response could not be serialised"
            );
            CommandResult::failure(
                COMMAND,
                "serialization",
                format!("failed to serialise response: {error}"),
                EXIT_SERIALIZATION_FAILURE,
            )
        }
    }
}

fn build_runtime(config: &AppConfig) -> Result<QueryRuntime, String> {
    let pool = connect_lazy_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .map_err(|error| format!("failed to build database pool: {error}"))?;
    let gateway = SqlProcedureGateway::new(
        pool,
        &config.database.ledger_procedure,
        &config.database.product_procedure,
    );
    let nlu = HttpNluEngine::from_config(&config.nlu)
        .map_err(|error| format!("failed to build nlu client: {error}"))?;

    Ok(QueryRuntime::new(Arc::new(nlu), Arc::new(gateway), RuntimeSettings::from(config)))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use ledgerline_core::domain::response::QueryResponse;
    use serde_json::Value;

    use super::answered;

    #[test]
    fn response_is_embedded_in_the_envelope() {
        let result = answered(
            "answered with error: No product data found.".to_string(),
            &QueryResponse::error("No product data found."),
        );

        assert_eq!(result.exit_code, 0);
        let payload: Value = serde_json::from_str(&result.output).expect("json");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["response"]["error"], "No product data found.");
    }

    #[test]
    fn unserialisable_response_is_a_failure() {
        // json object keys must be strings
        let response = BTreeMap::from([((1_u8, 2_u8), "pair")]);

        let result = answered("answered".to_string(), &response);

        assert_eq!(result.exit_code, 5);
        let payload: Value = serde_json::from_str(&result.output).expect("json");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "serialization");
        assert!(payload.get("response").is_none());
    }
}
