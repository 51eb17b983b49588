//! Route selection for a parsed message.
//!
//! Two ordered rule lists are tried in turn: intent rules (intent label plus a
//! required entity kind), then keyword rules over the lower-cased raw text.
//! The first rule that matches wins, so list order decides ambiguous text.

use ledgerline_core::domain::entity::{EntityMap, PARTY_NAME, PRODUCT_NAME};

pub const UNMATCHED_QUERY_MESSAGE: &str =
    "Could not understand query. Include party_name or product_name for specificity.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    LedgerBalance,
    LedgerStatement,
    ProductStock,
    TopProductsByValue,
    BottomProducts,
    TopProductsPurchased,
    ProductStatement,
    TopCustomers,
    TopVendors,
    BottomCustomers,
}

impl Route {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LedgerBalance => "ledger_balance",
            Self::LedgerStatement => "ledger_statement",
            Self::ProductStock => "product_stock",
            Self::TopProductsByValue => "top_products_by_value",
            Self::BottomProducts => "bottom_products",
            Self::TopProductsPurchased => "top_products_purchased",
            Self::ProductStatement => "product_statement",
            Self::TopCustomers => "top_customers",
            Self::TopVendors => "top_vendors",
            Self::BottomCustomers => "bottom_customers",
        }
    }
}

/// Which pass produced a route.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchedBy {
    Intent(&'static str),
    Keywords(&'static str),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Decision {
    pub route: Route,
    pub matched_by: MatchedBy,
}

struct IntentRule {
    intent: &'static str,
    requires: Option<&'static str>,
    route: Route,
}

struct KeywordRule {
    name: &'static str,
    matches: fn(&str) -> bool,
    route: Route,
}

const INTENT_RULES: [IntentRule; 10] = [
    IntentRule { intent: "check_balance", requires: Some(PARTY_NAME), route: Route::LedgerBalance },
    IntentRule {
        intent: "action_party_statement",
        requires: Some(PARTY_NAME),
        route: Route::LedgerStatement,
    },
    IntentRule {
        intent: "product_stock",
        requires: Some(PRODUCT_NAME),
        route: Route::ProductStock,
    },
    IntentRule { intent: "top_products_value", requires: None, route: Route::TopProductsByValue },
    IntentRule {
        intent: "check_bottom_products",
        requires: Some(PRODUCT_NAME),
        route: Route::BottomProducts,
    },
    IntentRule {
        intent: "top_products_purchased",
        requires: Some(PRODUCT_NAME),
        route: Route::TopProductsPurchased,
    },
    IntentRule {
        intent: "product_statement",
        requires: Some(PRODUCT_NAME),
        route: Route::ProductStatement,
    },
    IntentRule { intent: "list_top_customers", requires: None, route: Route::TopCustomers },
    IntentRule { intent: "action_top_party", requires: None, route: Route::TopVendors },
    IntentRule { intent: "action_bottom_credit", requires: None, route: Route::BottomCustomers },
];

const KEYWORD_RULES: [KeywordRule; 9] = [
    KeywordRule {
        name: "balance_ledger",
        matches: |text| {
            (text.contains("balance") || text.contains("closing")) && text.contains("ledger")
        },
        route: Route::LedgerBalance,
    },
    KeywordRule {
        name: "statement_ledger",
        matches: |text| text.contains("statement") && text.contains("ledger"),
        route: Route::LedgerStatement,
    },
    KeywordRule {
        name: "stock_product",
        matches: |text| text.contains("stock") && text.contains("product"),
        route: Route::ProductStock,
    },
    KeywordRule {
        name: "top_product_value",
        matches: |text| {
            text.contains("top")
                && text.contains("product")
                && (text.contains("value") || text.contains("val"))
        },
        route: Route::TopProductsByValue,
    },
    KeywordRule {
        name: "bottom_product",
        matches: |text| text.contains("bottom") && text.contains("product"),
        route: Route::BottomProducts,
    },
    KeywordRule {
        name: "top_product_purchased",
        matches: |text| {
            text.contains("top")
                && text.contains("product")
                && ["purchased", "received", "inqty"].iter().any(|word| text.contains(word))
        },
        route: Route::TopProductsPurchased,
    },
    KeywordRule {
        name: "top_customer",
        matches: |text| text.contains("top") && text.contains("customer"),
        route: Route::TopCustomers,
    },
    KeywordRule {
        name: "top_vendor",
        matches: |text| text.contains("top") && (text.contains("debit") || text.contains("vendor")),
        route: Route::TopVendors,
    },
    KeywordRule {
        name: "bottom_customer",
        matches: |text| text.contains("bottom") && text.contains("customer"),
        route: Route::BottomCustomers,
    },
];

/// Picks the route for a message, or `None` when no rule applies.
pub fn decide(intent: &str, entities: &EntityMap, text: &str) -> Option<Decision> {
    let by_intent = INTENT_RULES.iter().find(|rule| {
        rule.intent == intent && rule.requires.map_or(true, |kind| entities.contains(kind))
    });
    if let Some(rule) = by_intent {
        return Some(Decision { route: rule.route, matched_by: MatchedBy::Intent(rule.intent) });
    }

    let lowered = text.to_lowercase();
    KEYWORD_RULES
        .iter()
        .find(|rule| (rule.matches)(&lowered))
        .map(|rule| Decision { route: rule.route, matched_by: MatchedBy::Keywords(rule.name) })
}
