use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;

use ledgerline_core::domain::ledger::{LedgerEntry, LedgerId, PartyTotal, StatementLine};
use ledgerline_core::domain::product::{or_zero, ProductId, ProductRecord};

use super::{
    PartyRank, ProcedureError, ProcedureGateway, ProcedureSession, ProductCatalog, ProductRank,
};

/// Rows the in-memory procedures serve.
#[derive(Clone, Debug, Default)]
pub struct ProcedureFixtures {
    pub ledgers: Vec<LedgerEntry>,
    pub balances: HashMap<LedgerId, Option<Decimal>>,
    pub statements: HashMap<LedgerId, Vec<StatementLine>>,
    pub customer_credits: Vec<PartyTotal>,
    pub vendor_debits: Vec<PartyTotal>,
    pub products: Vec<ProductRecord>,
}

#[derive(Debug, Default)]
struct SessionCounters {
    opened: AtomicUsize,
    live: AtomicUsize,
}

/// Procedure emulation over seeded rows, used by handler and server tests.
#[derive(Clone, Debug, Default)]
pub struct InMemoryProcedures {
    fixtures: Arc<ProcedureFixtures>,
    counters: Arc<SessionCounters>,
    unavailable: Option<String>,
}

impl InMemoryProcedures {
    pub fn new(fixtures: ProcedureFixtures) -> Self {
        Self { fixtures: Arc::new(fixtures), counters: Arc::default(), unavailable: None }
    }

    /// Every open and ping fails with the given reason.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self { unavailable: Some(reason.into()), ..Self::default() }
    }

    pub fn sessions_opened(&self) -> usize {
        self.counters.opened.load(AtomicOrdering::SeqCst)
    }

    pub fn sessions_live(&self) -> usize {
        self.counters.live.load(AtomicOrdering::SeqCst)
    }

    fn check_available(&self) -> Result<(), ProcedureError> {
        match &self.unavailable {
            Some(reason) => Err(ProcedureError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ProcedureGateway for InMemoryProcedures {
    async fn open(&self) -> Result<Box<dyn ProcedureSession>, ProcedureError> {
        self.check_available()?;
        self.counters.opened.fetch_add(1, AtomicOrdering::SeqCst);
        self.counters.live.fetch_add(1, AtomicOrdering::SeqCst);
        Ok(Box::new(InMemorySession {
            fixtures: Arc::clone(&self.fixtures),
            counters: Arc::clone(&self.counters),
        }))
    }

    async fn ping(&self) -> Result<(), ProcedureError> {
        self.check_available()
    }
}

struct InMemorySession {
    fixtures: Arc<ProcedureFixtures>,
    counters: Arc<SessionCounters>,
}

impl Drop for InMemorySession {
    fn drop(&mut self) {
        self.counters.live.fetch_sub(1, AtomicOrdering::SeqCst);
    }
}

fn amount_order(left: Option<Decimal>, right: Option<Decimal>) -> Ordering {
    or_zero(left).cmp(&or_zero(right))
}

fn take_ranked<T, F>(rows: &[T], count: u32, compare: F) -> Vec<T>
where
    T: Clone,
    F: FnMut(&T, &T) -> Ordering,
{
    let mut ranked = rows.to_vec();
    ranked.sort_by(compare);
    ranked.truncate(count as usize);
    ranked
}

#[async_trait]
impl ProcedureSession for InMemorySession {
    async fn list_ledgers(&mut self) -> Result<Vec<LedgerEntry>, ProcedureError> {
        Ok(self.fixtures.ledgers.clone())
    }

    async fn closing_balance(
        &mut self,
        ledger: LedgerId,
    ) -> Result<Option<Decimal>, ProcedureError> {
        Ok(self.fixtures.balances.get(&ledger).copied().flatten())
    }

    async fn ledger_statement(
        &mut self,
        ledger: LedgerId,
    ) -> Result<Vec<StatementLine>, ProcedureError> {
        Ok(self.fixtures.statements.get(&ledger).cloned().unwrap_or_default())
    }

    async fn ranked_parties(
        &mut self,
        rank: PartyRank,
        count: u32,
    ) -> Result<Vec<PartyTotal>, ProcedureError> {
        let ranked = match rank {
            PartyRank::TopCustomers => {
                take_ranked(&self.fixtures.customer_credits, count, |a, b| {
                    amount_order(b.amount, a.amount)
                })
            }
            PartyRank::BottomCustomers => {
                take_ranked(&self.fixtures.customer_credits, count, |a, b| {
                    amount_order(a.amount, b.amount)
                })
            }
            PartyRank::TopVendors => take_ranked(&self.fixtures.vendor_debits, count, |a, b| {
                amount_order(b.amount, a.amount)
            }),
        };
        Ok(ranked)
    }

    async fn list_products(
        &mut self,
        catalog: ProductCatalog,
    ) -> Result<Vec<ProductRecord>, ProcedureError> {
        let products = match catalog {
            ProductCatalog::ForStatement => self.fixtures.products.clone(),
            // stock listing carries no ids
            ProductCatalog::ForStock => self
                .fixtures
                .products
                .iter()
                .cloned()
                .map(|product| ProductRecord { id: None, ..product })
                .collect(),
        };
        Ok(products)
    }

    async fn ranked_products(
        &mut self,
        rank: ProductRank,
        count: u32,
    ) -> Result<Vec<ProductRecord>, ProcedureError> {
        let products = &self.fixtures.products;
        let ranked = match rank {
            ProductRank::TopPurchased => {
                take_ranked(products, count, |a, b| amount_order(b.in_qty, a.in_qty))
            }
            ProductRank::TopByValue => {
                take_ranked(products, count, |a, b| amount_order(b.stock_value, a.stock_value))
            }
            ProductRank::Bottom => {
                take_ranked(products, count, |a, b| amount_order(a.bal_qty, b.bal_qty))
            }
        };
        Ok(ranked)
    }

    async fn product_statement(
        &mut self,
        product: ProductId,
    ) -> Result<Option<ProductRecord>, ProcedureError> {
        Ok(self.fixtures.products.iter().find(|record| record.id == Some(product)).cloned())
    }
}
