use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LedgerId(pub i64);

/// Sub-operation selector of the ledger procedure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerMode {
    ListAll,
    ClosingBalance,
    Statement,
    TopCustomers,
    BottomCustomers,
    TopVendors,
}

impl LedgerMode {
    pub fn code(self) -> i32 {
        match self {
            Self::ListAll => 1,
            Self::ClosingBalance => 2,
            Self::Statement => 3,
            Self::TopCustomers => 4,
            Self::BottomCustomers => 5,
            Self::TopVendors => 6,
        }
    }
}

/// One row of the full ledger catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: LedgerId,
    pub name: String,
}

impl LedgerEntry {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self { id: LedgerId(id), name: name.into() }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementLine {
    pub voucher_date: Option<NaiveDate>,
    pub voucher_name: Option<String>,
    pub voucher_no: Option<String>,
    pub debit: Option<Decimal>,
    pub credit: Option<Decimal>,
    pub narration: Option<String>,
    pub branch: Option<String>,
    pub running_balance: Option<Decimal>,
}

/// A party with its credit (customers) or debit (vendors) total.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyTotal {
    pub name: String,
    pub amount: Option<Decimal>,
}

impl PartyTotal {
    pub fn new(name: impl Into<String>, amount: Option<Decimal>) -> Self {
        Self { name: name.into(), amount }
    }
}
