use std::sync::Arc;

use tracing::info;

use ledgerline_core::domain::entity::{EntityMap, PARTY_NAME};
use ledgerline_core::domain::product::or_zero;
use ledgerline_core::domain::response::{
    CustomerCredit, CustomerRanking, LedgerBalance, LedgerStatement, QueryResponse, RankWindow,
    StatementEntry, VendorDebit, VendorRanking,
};
use ledgerline_core::errors::ApplicationError;
use ledgerline_core::extract::{entity_value, rank_count};
use ledgerline_core::resolve::{LedgerMatch, LedgerNameResolver};
use ledgerline_db::{PartyRank, ProcedureGateway, ProcedureSession};

use super::PARTY_NAME_PROMPT;

pub struct LedgerHandler {
    gateway: Arc<dyn ProcedureGateway>,
    resolver: LedgerNameResolver,
    default_rank_count: u32,
}

enum Resolution {
    Found(LedgerMatch),
    Answer(QueryResponse),
}

impl LedgerHandler {
    pub fn new(
        gateway: Arc<dyn ProcedureGateway>,
        resolver: LedgerNameResolver,
        default_rank_count: u32,
    ) -> Self {
        Self { gateway, resolver, default_rank_count }
    }

    pub async fn check_balance(
        &self,
        entities: &EntityMap,
    ) -> Result<QueryResponse, ApplicationError> {
        let Some(party) = entity_value(entities, PARTY_NAME) else {
            return Ok(QueryResponse::error(PARTY_NAME_PROMPT));
        };

        let mut session = self.gateway.open().await?;
        let ledger = match self.resolve_party(session.as_mut(), party).await? {
            Resolution::Found(ledger) => ledger,
            Resolution::Answer(response) => return Ok(response),
        };

        let balance = or_zero(session.closing_balance(ledger.id).await?);
        info!(
            event_name = "handler.ledger.balance",
            ledger_id = ledger.id.0,
            score = ledger.score,
            "closing balance answered"
        );
        Ok(QueryResponse::Balance(LedgerBalance { ledger: ledger.name, balance }))
    }

    pub async fn get_statement(
        &self,
        entities: &EntityMap,
    ) -> Result<QueryResponse, ApplicationError> {
        let Some(party) = entity_value(entities, PARTY_NAME) else {
            return Ok(QueryResponse::error(PARTY_NAME_PROMPT));
        };

        let mut session = self.gateway.open().await?;
        let ledger = match self.resolve_party(session.as_mut(), party).await? {
            Resolution::Found(ledger) => ledger,
            Resolution::Answer(response) => return Ok(response),
        };

        let lines = session.ledger_statement(ledger.id).await?;
        if lines.is_empty() {
            return Ok(QueryResponse::error(format!("No statement found for '{}'", ledger.name)));
        }

        info!(
            event_name = "handler.ledger.statement",
            ledger_id = ledger.id.0,
            rows = lines.len(),
            "ledger statement answered"
        );
        Ok(QueryResponse::Statement(LedgerStatement {
            party: ledger.name,
            statement: lines.into_iter().map(StatementEntry::from).collect(),
        }))
    }

    pub async fn get_top_customers(
        &self,
        entities: &EntityMap,
        text: &str,
    ) -> Result<QueryResponse, ApplicationError> {
        let count = rank_count(entities, text, self.default_rank_count);
        let customers = self.customer_credits(PartyRank::TopCustomers, count).await?;
        Ok(QueryResponse::Customers(CustomerRanking { window: RankWindow::Top(count), customers }))
    }

    pub async fn get_bottom_customers(
        &self,
        entities: &EntityMap,
        text: &str,
    ) -> Result<QueryResponse, ApplicationError> {
        let count = rank_count(entities, text, self.default_rank_count);
        let customers = self.customer_credits(PartyRank::BottomCustomers, count).await?;
        Ok(QueryResponse::Customers(CustomerRanking {
            window: RankWindow::Bottom(count),
            customers,
        }))
    }

    pub async fn get_top_vendors(
        &self,
        entities: &EntityMap,
        text: &str,
    ) -> Result<QueryResponse, ApplicationError> {
        let count = rank_count(entities, text, self.default_rank_count);
        let mut session = self.gateway.open().await?;
        let vendors = session
            .ranked_parties(PartyRank::TopVendors, count)
            .await?
            .into_iter()
            .map(|party| VendorDebit { vendor: party.name, debit: or_zero(party.amount) })
            .collect::<Vec<_>>();

        info!(
            event_name = "handler.ledger.vendors",
            count,
            rows = vendors.len(),
            "top vendors answered"
        );
        Ok(QueryResponse::Vendors(VendorRanking { window: RankWindow::Top(count), vendors }))
    }

    async fn customer_credits(
        &self,
        rank: PartyRank,
        count: u32,
    ) -> Result<Vec<CustomerCredit>, ApplicationError> {
        let mut session = self.gateway.open().await?;
        let customers = session
            .ranked_parties(rank, count)
            .await?
            .into_iter()
            .map(|party| CustomerCredit { ledger: party.name, credit: or_zero(party.amount) })
            .collect::<Vec<_>>();

        info!(
            event_name = "handler.ledger.customers",
            rank = ?rank,
            count,
            rows = customers.len(),
            "customer ranking answered"
        );
        Ok(customers)
    }

    async fn resolve_party(
        &self,
        session: &mut dyn ProcedureSession,
        party: &str,
    ) -> Result<Resolution, ApplicationError> {
        let catalog = session.list_ledgers().await?;
        match self.resolver.resolve(party, &catalog) {
            Some(ledger) => Ok(Resolution::Found(ledger)),
            None => {
                info!(
                    event_name = "handler.ledger.unresolved",
                    party = %party,
                    catalog_size = catalog.len(),
                    "no ledger reached the score cutoff"
                );
                Ok(Resolution::Answer(QueryResponse::error(format!(
                    "No ledger found matching '{party}'"
                ))))
            }
        }
    }
}
