//! Ledger and product handlers.
//!
//! Each operation opens one procedure session and drops it before returning,
//! whichever path it takes out.

pub mod ledger;
pub mod product;

pub use ledger::LedgerHandler;
pub use product::ProductHandler;

pub const PARTY_NAME_PROMPT: &str =
    "कृपया पार्टी/लेजर नाम बताउनुहोस् | Please provide the ledger/party name.";
pub const PRODUCT_STOCK_PROMPT: &str =
    "कृपया उत्पादनको नाम बताउनुहोस् | Please mention a product name.";
pub const PRODUCT_STATEMENT_PROMPT: &str =
    "कृपया उत्पादनको नाम बताउनुहोस् | Please provide a product name.";
