use std::sync::Arc;

use tracing::info;

use ledgerline_core::domain::entity::{EntityMap, PRODUCT_NAME};
use ledgerline_core::domain::product::{or_zero, ProductRecord};
use ledgerline_core::domain::response::{
    ProductRanking, ProductStockReport, QueryResponse, RankWindow, RankedProduct,
};
use ledgerline_core::errors::ApplicationError;
use ledgerline_core::extract::{entity_value, rank_count};
use ledgerline_core::resolve::ProductNameResolver;
use ledgerline_db::{ProcedureGateway, ProductCatalog, ProductRank};

use super::{PRODUCT_STATEMENT_PROMPT, PRODUCT_STOCK_PROMPT};

pub struct ProductHandler {
    gateway: Arc<dyn ProcedureGateway>,
    resolver: ProductNameResolver,
    default_rank_count: u32,
}

impl ProductHandler {
    pub fn new(gateway: Arc<dyn ProcedureGateway>, default_rank_count: u32) -> Self {
        Self { gateway, resolver: ProductNameResolver::new(), default_rank_count }
    }

    pub async fn get_bottom_products(
        &self,
        entities: &EntityMap,
        text: &str,
    ) -> Result<QueryResponse, ApplicationError> {
        self.ranking(
            ProductRank::Bottom,
            entities,
            text,
            "No product data found.",
            |rank, record| RankedProduct {
                bal_qty: Some(or_zero(record.bal_qty)),
                ..RankedProduct::new(rank, record.name)
            },
        )
        .await
    }

    pub async fn get_top_products_purchased(
        &self,
        entities: &EntityMap,
        text: &str,
    ) -> Result<QueryResponse, ApplicationError> {
        self.ranking(
            ProductRank::TopPurchased,
            entities,
            text,
            "No product data found.",
            |rank, record| RankedProduct {
                in_qty: Some(or_zero(record.in_qty)),
                ..RankedProduct::new(rank, record.name)
            },
        )
        .await
    }

    pub async fn get_top_products_value(
        &self,
        entities: &EntityMap,
        text: &str,
    ) -> Result<QueryResponse, ApplicationError> {
        self.ranking(
            ProductRank::TopByValue,
            entities,
            text,
            "No product stock data found.",
            |rank, record| RankedProduct {
                bal_qty: Some(or_zero(record.bal_qty)),
                rate: Some(or_zero(record.out_cost_rate)),
                value: Some(or_zero(record.stock_value)),
                ..RankedProduct::new(rank, record.name)
            },
        )
        .await
    }

    /// Stock figures for the first product whose name contains the cleaned query.
    pub async fn get_product_stock(
        &self,
        entities: &EntityMap,
    ) -> Result<QueryResponse, ApplicationError> {
        let Some(raw) = entity_value(entities, PRODUCT_NAME) else {
            return Ok(QueryResponse::error(PRODUCT_STOCK_PROMPT));
        };
        let clean = self.resolver.normalize_stock_query(raw);

        let mut session = self.gateway.open().await?;
        let catalog = session.list_products(ProductCatalog::ForStock).await?;
        let Some(matched) = self.resolver.resolve(&clean, &catalog) else {
            return Ok(QueryResponse::error(format!(
                "No stock found for product matching '{clean}'."
            )));
        };

        info!(
            event_name = "handler.product.stock",
            product = %matched.name,
            "product stock answered"
        );
        Ok(QueryResponse::Stock(ProductStockReport::from_record(matched.name.clone(), matched)))
    }

    /// Catalog lookup followed by the per-product statement row. The report is
    /// labelled with the cleaned query, not the catalog name it matched.
    pub async fn get_product_statement(
        &self,
        entities: &EntityMap,
    ) -> Result<QueryResponse, ApplicationError> {
        let Some(raw) = entity_value(entities, PRODUCT_NAME) else {
            return Ok(QueryResponse::error(PRODUCT_STATEMENT_PROMPT));
        };
        let clean = self.resolver.normalize_name(raw);

        let mut session = self.gateway.open().await?;
        let catalog = session.list_products(ProductCatalog::ForStatement).await?;
        let Some(matched) = self.resolver.resolve(&clean, &catalog) else {
            return Ok(QueryResponse::error(format!("No product found matching '{clean}'.")));
        };

        let statement = match matched.id {
            Some(id) => session.product_statement(id).await?,
            None => None,
        };
        let Some(row) = statement else {
            return Ok(QueryResponse::error(format!("No stock data found for '{clean}'.")));
        };

        info!(
            event_name = "handler.product.statement",
            product = %matched.name,
            product_id = matched.id.map(|id| id.0),
            "product statement answered"
        );
        Ok(QueryResponse::Stock(ProductStockReport::from_record(clean, &row)))
    }

    async fn ranking<F>(
        &self,
        rank: ProductRank,
        entities: &EntityMap,
        text: &str,
        empty_message: &str,
        shape: F,
    ) -> Result<QueryResponse, ApplicationError>
    where
        F: Fn(u32, ProductRecord) -> RankedProduct,
    {
        let count = rank_count(entities, text, self.default_rank_count);
        let mut session = self.gateway.open().await?;
        let rows = session.ranked_products(rank, count).await?;
        if rows.is_empty() {
            return Ok(QueryResponse::error(empty_message));
        }

        let products = rows
            .into_iter()
            .zip(1..)
            .map(|(record, position)| shape(position, record))
            .collect::<Vec<_>>();

        info!(
            event_name = "handler.product.ranking",
            rank = ?rank,
            count,
            rows = products.len(),
            "product ranking answered"
        );
        let window = match rank {
            ProductRank::Bottom => RankWindow::Bottom(count),
            ProductRank::TopPurchased | ProductRank::TopByValue => RankWindow::Top(count),
        };
        Ok(QueryResponse::Products(ProductRanking { window, products }))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;
    use serde_json::json;

    use ledgerline_core::domain::entity::{Entity, EntityMap, PRODUCT_NAME};
    use ledgerline_core::domain::response::QueryResponse;
    use ledgerline_db::InMemoryProcedures;

    use super::ProductHandler;
    use crate::handlers::fixtures;
    use crate::handlers::{PRODUCT_STATEMENT_PROMPT, PRODUCT_STOCK_PROMPT};

    fn handler(procedures: &InMemoryProcedures) -> ProductHandler {
        ProductHandler::new(Arc::new(procedures.clone()), 10)
    }

    fn product(name: &str) -> EntityMap {
        std::iter::once(Entity::new(PRODUCT_NAME, name)).collect()
    }

    #[tokio::test]
    async fn stock_query_strips_fillers_and_computes_derived_values() -> Result<(), String> {
        let procedures = InMemoryProcedures::new(fixtures::accounting());
        let response = handler(&procedures)
            .get_product_stock(&product("current stock of Blue Widget please"))
            .await
            .map_err(|error| error.to_string())?;

        let QueryResponse::Stock(report) = response else {
            return Err(format!("unexpected response {response:?}"));
        };
        assert_eq!(report.product, "Blue Widget Deluxe");
        assert_eq!(report.running_qty, Decimal::from(120));
        // remote balance of zero falls back to the running quantity
        assert_eq!(report.balance_qty, Decimal::from(120));
        assert_eq!(report.running_amount, Decimal::from(1465));
        assert_eq!(report.out_amount, Decimal::from(999));
        assert_eq!(procedures.sessions_live(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn missing_product_name_returns_bilingual_prompt() {
        let procedures = InMemoryProcedures::new(fixtures::accounting());
        let handler = handler(&procedures);

        let stock = handler.get_product_stock(&EntityMap::new()).await.expect("stock");
        assert_eq!(stock.error_message(), Some(PRODUCT_STOCK_PROMPT));
        let statement = handler.get_product_statement(&product("")).await.expect("statement");
        assert_eq!(statement.error_message(), Some(PRODUCT_STATEMENT_PROMPT));
        assert_eq!(procedures.sessions_opened(), 0);
    }

    #[tokio::test]
    async fn unmatched_products_name_the_cleaned_query() {
        let procedures = InMemoryProcedures::new(fixtures::accounting());
        let handler = handler(&procedures);

        let stock =
            handler.get_product_stock(&product("stock of purple gizmo")).await.expect("stock");
        assert_eq!(
            stock.error_message(),
            Some("No stock found for product matching 'Purple Gizmo'.")
        );

        let only_fillers =
            handler.get_product_stock(&product("show stock please")).await.expect("stock");
        assert_eq!(only_fillers.error_message(), Some("No stock found for product matching ''."));

        let statement =
            handler.get_product_statement(&product("purple gizmo")).await.expect("statement");
        assert_eq!(statement.error_message(), Some("No product found matching 'Purple Gizmo'."));
        assert_eq!(procedures.sessions_live(), 0);
    }

    #[tokio::test]
    async fn statement_fetches_row_by_matched_id() {
        let procedures = InMemoryProcedures::new(fixtures::accounting());
        let handler = handler(&procedures);

        let response =
            handler.get_product_statement(&product("  red  gadget ")).await.expect("statement");
        let body = serde_json::to_value(&response).expect("serialize");
        assert_eq!(body["product"], "Red Gadget");
        assert_eq!(body["balance_qty"], 4.0);
        assert_eq!(body["running_qty"], 80.0);

        let missing =
            handler.get_product_statement(&product("silver nut")).await.expect("statement");
        assert_eq!(missing.error_message(), Some("No stock data found for 'Silver Nut'."));
    }

    #[tokio::test]
    async fn statement_is_labelled_with_the_cleaned_query() {
        let procedures = InMemoryProcedures::new(fixtures::accounting());
        let response =
            handler(&procedures).get_product_statement(&product("red")).await.expect("statement");

        let QueryResponse::Stock(report) = response else {
            panic!("unexpected response {response:?}");
        };
        assert_eq!(report.product, "Red");
        assert_eq!(report.balance_qty, Decimal::from(4));
    }

    #[tokio::test]
    async fn rankings_are_one_indexed_with_per_ranking_fields() {
        let procedures = InMemoryProcedures::new(fixtures::accounting());
        let handler = handler(&procedures);

        let value = handler
            .get_top_products_value(&EntityMap::new(), "top 2 products by value")
            .await
            .expect("value");
        assert_eq!(
            serde_json::to_value(&value).expect("serialize"),
            json!({
                "top": 2,
                "products": [
                    {
                        "rank": 1,
                        "product": "Green Bolt",
                        "bal_qty": 0.0,
                        "rate": 0.0,
                        "value": 900.0
                    },
                    {
                        "rank": 2,
                        "product": "Blue Widget Deluxe",
                        "bal_qty": 0.0,
                        "rate": 2.0,
                        "value": 240.0
                    }
                ]
            })
        );

        let purchased = handler
            .get_top_products_purchased(&EntityMap::new(), "top products purchased")
            .await
            .expect("purchased");
        let body = serde_json::to_value(&purchased).expect("serialize");
        assert_eq!(body["top"], 10);
        assert_eq!(
            body["products"][0],
            json!({ "rank": 1, "product": "Red Gadget", "in_qty": 80.0 })
        );

        let bottom = handler
            .get_bottom_products(&EntityMap::new(), "bottom 1 product")
            .await
            .expect("bottom");
        let body = serde_json::to_value(&bottom).expect("serialize");
        assert_eq!(
            body,
            json!({
                "bottom": 1,
                "products": [{ "rank": 1, "product": "Blue Widget Deluxe", "bal_qty": 0.0 }]
            })
        );
    }

    #[tokio::test]
    async fn empty_product_rankings_are_errors() {
        let procedures = InMemoryProcedures::new(Default::default());
        let handler = handler(&procedures);

        let bottom = handler
            .get_bottom_products(&EntityMap::new(), "bottom products")
            .await
            .expect("bottom");
        assert_eq!(bottom.error_message(), Some("No product data found."));
        let value =
            handler.get_top_products_value(&EntityMap::new(), "top value").await.expect("value");
        assert_eq!(value.error_message(), Some("No product stock data found."));
        assert_eq!(procedures.sessions_live(), 0);
    }
}
