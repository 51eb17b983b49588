use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::pool::PoolConnection;
use sqlx::Postgres;
use tracing::debug;

use ledgerline_core::domain::ledger::{LedgerEntry, LedgerId, LedgerMode, PartyTotal, StatementLine};
use ledgerline_core::domain::product::{ProductId, ProductMode, ProductRecord};

use super::{
    PartyRank, ProcedureError, ProcedureGateway, ProcedureSession, ProductCatalog, ProductRank,
};
use crate::DbPool;

/// Calls the set-returning procedures as `SELECT * FROM proc($1, $2, $3)`
/// with `(mode, id, count)`.
pub struct SqlProcedureGateway {
    pool: DbPool,
    calls: Arc<CallText>,
}

#[derive(Debug)]
struct CallText {
    ledger: String,
    product: String,
}

impl SqlProcedureGateway {
    /// Procedure names must already be validated identifiers; they are
    /// spliced into the statement text.
    pub fn new(pool: DbPool, ledger_procedure: &str, product_procedure: &str) -> Self {
        Self {
            pool,
            calls: Arc::new(CallText {
                ledger: format!("SELECT * FROM {ledger_procedure}($1, $2, $3)"),
                product: format!("SELECT * FROM {product_procedure}($1, $2, $3)"),
            }),
        }
    }
}

#[async_trait]
impl ProcedureGateway for SqlProcedureGateway {
    async fn open(&self) -> Result<Box<dyn ProcedureSession>, ProcedureError> {
        let conn = self.pool.acquire().await?;
        Ok(Box::new(SqlProcedureSession { conn, calls: Arc::clone(&self.calls) }))
    }

    async fn ping(&self) -> Result<(), ProcedureError> {
        sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}

struct SqlProcedureSession {
    conn: PoolConnection<Postgres>,
    calls: Arc<CallText>,
}

fn count_param(count: u32) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}

#[derive(sqlx::FromRow)]
struct LedgerCatalogRow {
    #[sqlx(rename = "LedgerId")]
    ledger_id: i64,
    name: String,
}

#[derive(sqlx::FromRow)]
struct StatementRow {
    #[sqlx(rename = "VoucherDate", default)]
    voucher_date: Option<NaiveDate>,
    #[sqlx(rename = "VoucherName", default)]
    voucher_name: Option<String>,
    #[sqlx(rename = "VoucherNo", default)]
    voucher_no: Option<String>,
    #[sqlx(rename = "DrAmount", default)]
    dr_amount: Option<Decimal>,
    #[sqlx(rename = "CrAmount", default)]
    cr_amount: Option<Decimal>,
    #[sqlx(rename = "Narration", default)]
    narration: Option<String>,
    #[sqlx(rename = "Branch", default)]
    branch: Option<String>,
    #[sqlx(rename = "RunningBalance", default)]
    running_balance: Option<Decimal>,
}

#[derive(sqlx::FromRow)]
struct PartyTotalRow {
    name: String,
    #[sqlx(rename = "Credit", default)]
    credit: Option<Decimal>,
    #[sqlx(rename = "Debit", default)]
    debit: Option<Decimal>,
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    #[sqlx(rename = "ProductId", default)]
    product_id: Option<i64>,
    // the statement row (mode 6) carries figures only
    #[sqlx(rename = "Name", default)]
    name: Option<String>,
    #[sqlx(rename = "OpeningQty", default)]
    opening_qty: Option<Decimal>,
    #[sqlx(rename = "InQty", default)]
    in_qty: Option<Decimal>,
    #[sqlx(rename = "OutQty", default)]
    out_qty: Option<Decimal>,
    #[sqlx(rename = "BalQty", default)]
    bal_qty: Option<Decimal>,
    #[sqlx(rename = "OpeningAmt", default)]
    opening_amt: Option<Decimal>,
    #[sqlx(rename = "InAmt", default)]
    in_amt: Option<Decimal>,
    // column name as published by the ERP schema
    #[sqlx(rename = "InAditionalCost", default)]
    in_additional_cost: Option<Decimal>,
    #[sqlx(rename = "OutAmt", default)]
    out_amt: Option<Decimal>,
    #[sqlx(rename = "InCostRate", default)]
    in_cost_rate: Option<Decimal>,
    #[sqlx(rename = "OutCostRate", default)]
    out_cost_rate: Option<Decimal>,
    #[sqlx(rename = "StockValue", default)]
    stock_value: Option<Decimal>,
}

impl From<LedgerCatalogRow> for LedgerEntry {
    fn from(row: LedgerCatalogRow) -> Self {
        LedgerEntry { id: LedgerId(row.ledger_id), name: row.name }
    }
}

impl From<StatementRow> for StatementLine {
    fn from(row: StatementRow) -> Self {
        StatementLine {
            voucher_date: row.voucher_date,
            voucher_name: row.voucher_name,
            voucher_no: row.voucher_no,
            debit: row.dr_amount,
            credit: row.cr_amount,
            narration: row.narration,
            branch: row.branch,
            running_balance: row.running_balance,
        }
    }
}

impl From<ProductRow> for ProductRecord {
    fn from(row: ProductRow) -> Self {
        ProductRecord {
            id: row.product_id.map(ProductId),
            name: row.name.unwrap_or_default(),
            opening_qty: row.opening_qty,
            in_qty: row.in_qty,
            out_qty: row.out_qty,
            bal_qty: row.bal_qty,
            opening_amt: row.opening_amt,
            in_amt: row.in_amt,
            in_additional_cost: row.in_additional_cost,
            out_amt: row.out_amt,
            in_cost_rate: row.in_cost_rate,
            out_cost_rate: row.out_cost_rate,
            stock_value: row.stock_value,
        }
    }
}

impl SqlProcedureSession {
    async fn product_rows(
        &mut self,
        mode: ProductMode,
        product: Option<i64>,
        count: Option<i32>,
    ) -> Result<Vec<ProductRow>, ProcedureError> {
        debug!(event_name = "db.procedure.call", procedure = "product", mode = mode.code());
        let rows = sqlx::query_as::<_, ProductRow>(&self.calls.product)
            .bind(mode.code())
            .bind(product)
            .bind(count)
            .fetch_all(&mut *self.conn)
            .await?;
        Ok(rows)
    }
}

#[async_trait]
impl ProcedureSession for SqlProcedureSession {
    async fn list_ledgers(&mut self) -> Result<Vec<LedgerEntry>, ProcedureError> {
        let mode = LedgerMode::ListAll;
        debug!(event_name = "db.procedure.call", procedure = "ledger", mode = mode.code());
        let rows = sqlx::query_as::<_, LedgerCatalogRow>(&self.calls.ledger)
            .bind(mode.code())
            .bind(None::<i64>)
            .bind(None::<i32>)
            .fetch_all(&mut *self.conn)
            .await?;
        Ok(rows.into_iter().map(LedgerEntry::from).collect())
    }

    async fn closing_balance(
        &mut self,
        ledger: LedgerId,
    ) -> Result<Option<Decimal>, ProcedureError> {
        let mode = LedgerMode::ClosingBalance;
        debug!(event_name = "db.procedure.call", procedure = "ledger", mode = mode.code());
        let balance = sqlx::query_scalar::<_, Option<Decimal>>(&self.calls.ledger)
            .bind(mode.code())
            .bind(Some(ledger.0))
            .bind(None::<i32>)
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(balance.flatten())
    }

    async fn ledger_statement(
        &mut self,
        ledger: LedgerId,
    ) -> Result<Vec<StatementLine>, ProcedureError> {
        let mode = LedgerMode::Statement;
        debug!(event_name = "db.procedure.call", procedure = "ledger", mode = mode.code());
        let rows = sqlx::query_as::<_, StatementRow>(&self.calls.ledger)
            .bind(mode.code())
            .bind(Some(ledger.0))
            .bind(None::<i32>)
            .fetch_all(&mut *self.conn)
            .await?;
        Ok(rows.into_iter().map(StatementLine::from).collect())
    }

    async fn ranked_parties(
        &mut self,
        rank: PartyRank,
        count: u32,
    ) -> Result<Vec<PartyTotal>, ProcedureError> {
        let mode = rank.mode();
        debug!(event_name = "db.procedure.call", procedure = "ledger", mode = mode.code(), count);
        let rows = sqlx::query_as::<_, PartyTotalRow>(&self.calls.ledger)
            .bind(mode.code())
            .bind(None::<i64>)
            .bind(Some(count_param(count)))
            .fetch_all(&mut *self.conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let amount = match rank {
                    PartyRank::TopCustomers | PartyRank::BottomCustomers => row.credit,
                    PartyRank::TopVendors => row.debit,
                };
                PartyTotal { name: row.name, amount }
            })
            .collect())
    }

    async fn list_products(
        &mut self,
        catalog: ProductCatalog,
    ) -> Result<Vec<ProductRecord>, ProcedureError> {
        let rows = self.product_rows(catalog.mode(), None, None).await?;
        Ok(rows.into_iter().map(ProductRecord::from).collect())
    }

    async fn ranked_products(
        &mut self,
        rank: ProductRank,
        count: u32,
    ) -> Result<Vec<ProductRecord>, ProcedureError> {
        let rows = self.product_rows(rank.mode(), None, Some(count_param(count))).await?;
        Ok(rows.into_iter().map(ProductRecord::from).collect())
    }

    async fn product_statement(
        &mut self,
        product: ProductId,
    ) -> Result<Option<ProductRecord>, ProcedureError> {
        let rows = self.product_rows(ProductMode::StatementRow, Some(product.0), None).await?;
        Ok(rows.into_iter().next().map(ProductRecord::from))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use ledgerline_core::domain::product::{ProductId, ProductRecord};

    use super::{count_param, ProductRow, SqlProcedureGateway};
    use crate::connect_lazy_with_settings;
    use crate::procedures::ProcedureGateway;

    #[test]
    fn count_param_saturates_at_i32_max() {
        assert_eq!(count_param(10), 10);
        assert_eq!(count_param(u32::MAX), i32::MAX);
    }

    fn figures_only_row() -> ProductRow {
        ProductRow {
            product_id: None,
            name: None,
            opening_qty: Some(Decimal::from(100)),
            in_qty: Some(Decimal::from(50)),
            out_qty: Some(Decimal::from(30)),
            bal_qty: None,
            opening_amt: None,
            in_amt: None,
            in_additional_cost: None,
            out_amt: None,
            in_cost_rate: None,
            out_cost_rate: None,
            stock_value: None,
        }
    }

    #[test]
    fn statement_row_without_name_still_converts() {
        let record = ProductRecord::from(figures_only_row());

        assert_eq!(record.name, "");
        assert_eq!(record.id, None);
        assert_eq!(record.running_qty(), Decimal::from(120));
    }

    #[test]
    fn catalog_row_keeps_name_and_id() {
        let row = ProductRow {
            product_id: Some(7),
            name: Some("Blue Widget".to_string()),
            ..figures_only_row()
        };
        let record = ProductRecord::from(row);

        assert_eq!(record.name, "Blue Widget");
        assert_eq!(record.id, Some(ProductId(7)));
    }

    #[tokio::test]
    async fn call_text_splices_configured_procedure_names() {
        let pool = connect_lazy_with_settings("postgres://ledgerline@127.0.0.1:1/erp", 1, 1)
            .expect("lazy pool should build from a valid url");
        let gateway = SqlProcedureGateway::new(pool, "erp.sp_ledger", "erp.sp_product");

        assert_eq!(gateway.calls.ledger, "SELECT * FROM erp.sp_ledger($1, $2, $3)");
        assert_eq!(gateway.calls.product, "SELECT * FROM erp.sp_product($1, $2, $3)");
    }

    #[tokio::test]
    async fn unreachable_database_surfaces_as_error() {
        let pool = connect_lazy_with_settings("postgres://ledgerline@127.0.0.1:1/erp", 1, 1)
            .expect("lazy pool should build from a valid url");
        let gateway =
            SqlProcedureGateway::new(pool, "sp_ledger_operations", "sp_product_operations");

        assert!(gateway.ping().await.is_err());
        assert!(gateway.open().await.is_err());
    }
}
