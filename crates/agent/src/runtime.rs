use std::sync::Arc;

use tracing::info;

use ledgerline_core::config::AppConfig;
use ledgerline_core::domain::entity::ParsedMessage;
use ledgerline_core::domain::response::QueryResponse;
use ledgerline_core::errors::ApplicationError;
use ledgerline_core::extract::DEFAULT_RANK_COUNT;
use ledgerline_core::resolve::{LedgerNameResolver, DEFAULT_LEDGER_SCORE_CUTOFF};
use ledgerline_db::ProcedureGateway;

use crate::dispatcher::{decide, Route, UNMATCHED_QUERY_MESSAGE};
use crate::handlers::{LedgerHandler, ProductHandler};
use crate::nlu::NluEngine;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RuntimeSettings {
    pub ledger_score_cutoff: f64,
    pub default_rank_count: u32,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            ledger_score_cutoff: DEFAULT_LEDGER_SCORE_CUTOFF,
            default_rank_count: DEFAULT_RANK_COUNT,
        }
    }
}

impl From<&AppConfig> for RuntimeSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            ledger_score_cutoff: config.resolver.ledger_score_cutoff,
            default_rank_count: config.resolver.default_rank_count,
        }
    }
}

/// Parses, routes and answers one message at a time. Holds no per-request state.
pub struct QueryRuntime {
    nlu: Arc<dyn NluEngine>,
    ledger: LedgerHandler,
    product: ProductHandler,
}

impl QueryRuntime {
    pub fn new(
        nlu: Arc<dyn NluEngine>,
        gateway: Arc<dyn ProcedureGateway>,
        settings: RuntimeSettings,
    ) -> Self {
        let ledger = LedgerHandler::new(
            Arc::clone(&gateway),
            LedgerNameResolver::new(settings.ledger_score_cutoff),
            settings.default_rank_count,
        );
        let product = ProductHandler::new(gateway, settings.default_rank_count);
        Self { nlu, ledger, product }
    }

    pub async fn handle(&self, text: &str) -> Result<QueryResponse, ApplicationError> {
        let parsed = self.nlu.parse(text).await?;
        self.dispatch(&parsed).await
    }

    pub async fn dispatch(
        &self,
        message: &ParsedMessage,
    ) -> Result<QueryResponse, ApplicationError> {
        let Some(decision) = decide(&message.intent, &message.entities, &message.text) else {
            info!(
                event_name = "query.unmatched",
                intent = %message.intent,
                entity_count = message.entities.len(),
                "no dispatch rule matched"
            );
            return Ok(QueryResponse::error(UNMATCHED_QUERY_MESSAGE));
        };

        info!(
            event_name = "query.dispatched",
            intent = %message.intent,
            route = decision.route.as_str(),
            matched_by = ?decision.matched_by,
            "query routed"
        );

        let entities = &message.entities;
        let text = message.text.as_str();
        match decision.route {
            Route::LedgerBalance => self.ledger.check_balance(entities).await,
            Route::LedgerStatement => self.ledger.get_statement(entities).await,
            Route::TopCustomers => self.ledger.get_top_customers(entities, text).await,
            Route::BottomCustomers => self.ledger.get_bottom_customers(entities, text).await,
            Route::TopVendors => self.ledger.get_top_vendors(entities, text).await,
            Route::ProductStock => self.product.get_product_stock(entities).await,
            Route::ProductStatement => self.product.get_product_statement(entities).await,
            Route::TopProductsByValue => self.product.get_top_products_value(entities, text).await,
            Route::BottomProducts => self.product.get_bottom_products(entities, text).await,
            Route::TopProductsPurchased => {
                self.product.get_top_products_purchased(entities, text).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use ledgerline_core::domain::entity::{NUMBER, PARTY_NAME, PRODUCT_NAME};
    use ledgerline_core::errors::ApplicationError;
    use ledgerline_db::InMemoryProcedures;

    use super::{QueryRuntime, RuntimeSettings};
    use crate::dispatcher::UNMATCHED_QUERY_MESSAGE;
    use crate::handlers::fixtures;
    use crate::nlu::StaticNluEngine;

    fn runtime(nlu: StaticNluEngine, procedures: &InMemoryProcedures) -> QueryRuntime {
        QueryRuntime::new(Arc::new(nlu), Arc::new(procedures.clone()), RuntimeSettings::default())
    }

    #[tokio::test]
    async fn intent_and_entities_reach_the_ledger_handler() {
        let procedures = InMemoryProcedures::new(fixtures::accounting());
        let nlu = StaticNluEngine::new().with(
            "what is the balance of alpha trader statement",
            "check_balance",
            &[(PARTY_NAME, "alpha trader")],
        );

        let response = runtime(nlu, &procedures)
            .handle("what is the balance of alpha trader statement")
            .await
            .expect("handled");

        assert_eq!(
            serde_json::to_value(&response).expect("serialize"),
            json!({ "ledger": "Alpha Traders", "balance": 15000.5 })
        );
    }

    #[tokio::test]
    async fn keyword_fallback_uses_raw_text_for_counts() {
        let procedures = InMemoryProcedures::new(fixtures::accounting());
        let runtime = runtime(StaticNluEngine::new(), &procedures);

        let response = runtime.handle("Top 1 Customer please").await.expect("handled");
        assert_eq!(
            serde_json::to_value(&response).expect("serialize"),
            json!({ "top": 1, "customers": [{ "ledger": "Beta Corp", "credit": 9100.0 }] })
        );
    }

    #[tokio::test]
    async fn number_entity_overrides_digits_in_text() {
        let procedures = InMemoryProcedures::new(fixtures::accounting());
        let nlu = StaticNluEngine::new().with(
            "top 9 vendors",
            "action_top_party",
            &[(NUMBER, "1")],
        );

        let response = runtime(nlu, &procedures).handle("top 9 vendors").await.expect("handled");
        let body = serde_json::to_value(&response).expect("serialize");
        assert_eq!(body["top"], 1);
        assert_eq!(body["vendors"].as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn unmatched_message_gets_guidance() {
        let procedures = InMemoryProcedures::new(fixtures::accounting());
        let response =
            runtime(StaticNluEngine::new(), &procedures).handle("namaste").await.expect("handled");

        assert_eq!(response.error_message(), Some(UNMATCHED_QUERY_MESSAGE));
        assert_eq!(procedures.sessions_opened(), 0);
    }

    #[tokio::test]
    async fn identical_requests_produce_identical_responses() {
        let procedures = InMemoryProcedures::new(fixtures::accounting());
        let nlu = StaticNluEngine::new().with(
            "stock of blue widget",
            "product_stock",
            &[(PRODUCT_NAME, "stock of blue widget")],
        );
        let runtime = runtime(nlu, &procedures);

        let first = runtime.handle("stock of blue widget").await.expect("first");
        let second = runtime.handle("stock of blue widget").await.expect("second");

        assert_eq!(first, second);
        assert!(!first.is_error());
        assert_eq!(procedures.sessions_opened(), 2);
        assert_eq!(procedures.sessions_live(), 0);
    }

    #[tokio::test]
    async fn collaborator_faults_are_returned_as_errors() {
        let procedures = InMemoryProcedures::new(fixtures::accounting());
        let nlu_down = runtime(StaticNluEngine::failing("connection refused"), &procedures);
        assert!(matches!(
            nlu_down.handle("top customers").await,
            Err(ApplicationError::Integration(_))
        ));

        let db_down =
            runtime(StaticNluEngine::new(), &InMemoryProcedures::unavailable("pool timed out"));
        assert!(matches!(
            db_down.handle("top customers").await,
            Err(ApplicationError::Persistence(_))
        ));
    }
}
