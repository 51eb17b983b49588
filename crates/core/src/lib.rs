pub mod config;
pub mod domain;
pub mod errors;
pub mod extract;
pub mod resolve;

pub use domain::entity::{Entity, EntityMap, ParsedMessage};
pub use domain::ledger::{LedgerEntry, LedgerId, LedgerMode, PartyTotal, StatementLine};
pub use domain::product::{ProductId, ProductMode, ProductRecord};
pub use domain::response::{QueryResponse, RankWindow};
pub use errors::{ApplicationError, InterfaceError};
pub use resolve::{LedgerMatch, LedgerNameResolver, ProductNameResolver};
