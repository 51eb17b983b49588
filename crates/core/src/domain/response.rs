//! Response objects returned for a query.
//!
//! Every variant serialises to a flat JSON object. Business failures are the
//! `Error` variant and render as `{"error": "..."}`.

use rust_decimal::Decimal;
use serde::Serialize;

use super::ledger::StatementLine;
use super::product::{or_zero, ProductRecord};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryResponse {
    Balance(LedgerBalance),
    Statement(LedgerStatement),
    Customers(CustomerRanking),
    Vendors(VendorRanking),
    Products(ProductRanking),
    Stock(ProductStockReport),
    Error { error: String },
}

impl QueryResponse {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error { error: message.into() }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error { error } => Some(error),
            _ => None,
        }
    }

    /// Short label used in log events.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Balance(_) => "balance",
            Self::Statement(_) => "statement",
            Self::Customers(_) => "customers",
            Self::Vendors(_) => "vendors",
            Self::Products(_) => "products",
            Self::Stock(_) => "stock",
            Self::Error { .. } => "error",
        }
    }
}

/// Which end of a ranking was requested, with its row count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RankWindow {
    Top(u32),
    Bottom(u32),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LedgerBalance {
    pub ledger: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LedgerStatement {
    pub party: String,
    pub statement: Vec<StatementEntry>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StatementEntry {
    pub date: Option<String>,
    pub voucher: Option<String>,
    pub number: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub debit: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub credit: Decimal,
    pub narration: Option<String>,
    pub branch: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub running_balance: Decimal,
}

impl From<StatementLine> for StatementEntry {
    fn from(line: StatementLine) -> Self {
        Self {
            date: line.voucher_date.map(|date| date.to_string()),
            voucher: line.voucher_name,
            number: line.voucher_no,
            debit: or_zero(line.debit),
            credit: or_zero(line.credit),
            narration: line.narration,
            branch: line.branch,
            running_balance: or_zero(line.running_balance),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CustomerRanking {
    #[serde(flatten)]
    pub window: RankWindow,
    pub customers: Vec<CustomerCredit>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CustomerCredit {
    pub ledger: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub credit: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VendorRanking {
    #[serde(flatten)]
    pub window: RankWindow,
    pub vendors: Vec<VendorDebit>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VendorDebit {
    pub vendor: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub debit: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProductRanking {
    #[serde(flatten)]
    pub window: RankWindow,
    pub products: Vec<RankedProduct>,
}

/// A 1-indexed ranking row; which figures are present depends on the ranking.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RankedProduct {
    pub rank: u32,
    pub product: String,
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub in_qty: Option<Decimal>,
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub bal_qty: Option<Decimal>,
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub rate: Option<Decimal>,
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<Decimal>,
}

impl RankedProduct {
    pub fn new(rank: u32, product: impl Into<String>) -> Self {
        Self { rank, product: product.into(), in_qty: None, bal_qty: None, rate: None, value: None }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProductStockReport {
    pub product: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub opening_qty: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub in_qty: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub out_qty: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance_qty: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub running_qty: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub opening_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub in_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub out_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub in_additional_cost: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub running_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub in_cost_rate: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub out_cost_rate: Decimal,
}

impl ProductStockReport {
    pub fn from_record(product: impl Into<String>, record: &ProductRecord) -> Self {
        Self {
            product: product.into(),
            opening_qty: or_zero(record.opening_qty),
            in_qty: or_zero(record.in_qty),
            out_qty: or_zero(record.out_qty),
            balance_qty: record.balance_qty(),
            running_qty: record.running_qty(),
            opening_amount: or_zero(record.opening_amt),
            in_amount: or_zero(record.in_amt),
            out_amount: or_zero(record.out_amt),
            in_additional_cost: or_zero(record.in_additional_cost),
            running_amount: record.running_amount(),
            in_cost_rate: or_zero(record.in_cost_rate),
            out_cost_rate: or_zero(record.out_cost_rate),
        }
    }
}
