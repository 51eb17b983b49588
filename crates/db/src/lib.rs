pub mod connection;
pub mod procedures;

pub use connection::{connect, connect_lazy_with_settings, connect_with_settings, DbPool};
pub use procedures::{
    InMemoryProcedures, PartyRank, ProcedureError, ProcedureFixtures, ProcedureGateway,
    ProcedureSession, ProductCatalog, ProductRank, SqlProcedureGateway,
};
