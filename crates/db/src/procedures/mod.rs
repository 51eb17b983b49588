//! Access to the two accounting procedures.
//!
//! A [`ProcedureGateway`] hands out a [`ProcedureSession`] per handler call.
//! The session owns one connection for its lifetime and gives it back when
//! dropped, so early returns and error paths release it too.

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use ledgerline_core::domain::ledger::{LedgerEntry, LedgerId, LedgerMode, PartyTotal, StatementLine};
use ledgerline_core::domain::product::{ProductId, ProductMode, ProductRecord};
use ledgerline_core::errors::ApplicationError;

pub mod memory;
pub mod postgres;

pub use memory::{InMemoryProcedures, ProcedureFixtures};
pub use postgres::SqlProcedureGateway;

#[derive(Debug, Error)]
pub enum ProcedureError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("procedure gateway unavailable: {0}")]
    Unavailable(String),
}

impl From<ProcedureError> for ApplicationError {
    fn from(value: ProcedureError) -> Self {
        ApplicationError::Persistence(value.to_string())
    }
}

/// Party rankings served by the ledger procedure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PartyRank {
    TopCustomers,
    BottomCustomers,
    TopVendors,
}

impl PartyRank {
    pub fn mode(self) -> LedgerMode {
        match self {
            Self::TopCustomers => LedgerMode::TopCustomers,
            Self::BottomCustomers => LedgerMode::BottomCustomers,
            Self::TopVendors => LedgerMode::TopVendors,
        }
    }
}

/// Full product listings; the statement listing carries product ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProductCatalog {
    ForStatement,
    ForStock,
}

impl ProductCatalog {
    pub fn mode(self) -> ProductMode {
        match self {
            Self::ForStatement => ProductMode::StatementCatalog,
            Self::ForStock => ProductMode::StockCatalog,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProductRank {
    TopPurchased,
    TopByValue,
    Bottom,
}

impl ProductRank {
    pub fn mode(self) -> ProductMode {
        match self {
            Self::TopPurchased => ProductMode::TopPurchased,
            Self::TopByValue => ProductMode::TopByValue,
            Self::Bottom => ProductMode::Bottom,
        }
    }
}

#[async_trait]
pub trait ProcedureGateway: Send + Sync {
    /// Acquires a connection scoped to the returned session.
    async fn open(&self) -> Result<Box<dyn ProcedureSession>, ProcedureError>;

    async fn ping(&self) -> Result<(), ProcedureError>;
}

#[async_trait]
pub trait ProcedureSession: Send {
    async fn list_ledgers(&mut self) -> Result<Vec<LedgerEntry>, ProcedureError>;

    async fn closing_balance(&mut self, ledger: LedgerId)
        -> Result<Option<Decimal>, ProcedureError>;

    async fn ledger_statement(
        &mut self,
        ledger: LedgerId,
    ) -> Result<Vec<StatementLine>, ProcedureError>;

    async fn ranked_parties(
        &mut self,
        rank: PartyRank,
        count: u32,
    ) -> Result<Vec<PartyTotal>, ProcedureError>;

    async fn list_products(
        &mut self,
        catalog: ProductCatalog,
    ) -> Result<Vec<ProductRecord>, ProcedureError>;

    async fn ranked_products(
        &mut self,
        rank: ProductRank,
        count: u32,
    ) -> Result<Vec<ProductRecord>, ProcedureError>;

    async fn product_statement(
        &mut self,
        product: ProductId,
    ) -> Result<Option<ProductRecord>, ProcedureError>;
}
