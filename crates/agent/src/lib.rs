//! Query runtime - turns a free-text accounting question into a response object
//!
//! The runtime follows a fixed path per message:
//! 1. **Parsing** (`nlu`) - the NLU engine labels the text with an intent and entities
//! 2. **Dispatch** (`dispatcher`) - ordered intent rules, then keyword rules, pick a route
//! 3. **Handling** (`handlers`) - ledger or product handler resolves names and calls
//!    the accounting procedures
//!
//! Business outcomes (unknown party, empty result, no matching rule) come back as
//! `QueryResponse::Error`. Only collaborator faults are returned as `Err`.

pub mod dispatcher;
pub mod handlers;
pub mod nlu;
pub mod runtime;

pub use dispatcher::{Route, UNMATCHED_QUERY_MESSAGE};
pub use handlers::{LedgerHandler, ProductHandler};
pub use nlu::{HttpNluEngine, NluEngine, NluError, StaticNluEngine};
pub use runtime::{QueryRuntime, RuntimeSettings};
