pub mod entity;
pub mod ledger;
pub mod product;
pub mod response;
