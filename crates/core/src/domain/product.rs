use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(pub i64);

/// Sub-operation selector of the product procedure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductMode {
    StatementCatalog,
    StockCatalog,
    TopPurchased,
    TopByValue,
    Bottom,
    StatementRow,
}

impl ProductMode {
    pub fn code(self) -> i32 {
        match self {
            Self::StatementCatalog => 1,
            Self::StockCatalog => 2,
            Self::TopPurchased => 3,
            Self::TopByValue => 4,
            Self::Bottom => 5,
            Self::StatementRow => 6,
        }
    }
}

/// A product row as returned by any product procedure mode.
///
/// Modes return different column subsets, so every figure is optional and a
/// missing figure counts as zero.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: Option<ProductId>,
    pub name: String,
    pub opening_qty: Option<Decimal>,
    pub in_qty: Option<Decimal>,
    pub out_qty: Option<Decimal>,
    pub bal_qty: Option<Decimal>,
    pub opening_amt: Option<Decimal>,
    pub in_amt: Option<Decimal>,
    pub in_additional_cost: Option<Decimal>,
    pub out_amt: Option<Decimal>,
    pub in_cost_rate: Option<Decimal>,
    pub out_cost_rate: Option<Decimal>,
    pub stock_value: Option<Decimal>,
}

impl ProductRecord {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    /// `opening + in - out`
    pub fn running_qty(&self) -> Decimal {
        or_zero(self.opening_qty) + or_zero(self.in_qty) - or_zero(self.out_qty)
    }

    /// `opening amount + in amount + additional cost - (out qty * out cost rate)`
    ///
    /// Outgoing stock is valued at the current out cost rate, not at the
    /// recorded out amount.
    pub fn running_amount(&self) -> Decimal {
        or_zero(self.opening_amt) + or_zero(self.in_amt) + or_zero(self.in_additional_cost)
            - (or_zero(self.out_qty) * or_zero(self.out_cost_rate))
    }

    /// Remote balance when it is present and non-zero, else the running quantity.
    pub fn balance_qty(&self) -> Decimal {
        match self.bal_qty {
            Some(balance) if !balance.is_zero() => balance,
            _ => self.running_qty(),
        }
    }
}

pub fn or_zero(value: Option<Decimal>) -> Decimal {
    value.unwrap_or(Decimal::ZERO)
}
