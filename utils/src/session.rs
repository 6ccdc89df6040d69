use std::sync::Arc;

use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Serialize;
use statement_common::{
    aggregate::AssetData,
    asset::AssetInfo,
    combine::{CombinedTransaction, CombinedTransactions},
    lookup::{debit_token_running_balance, DebitBalance},
    normalize::{normalize_all, TrackedAddresses, TransferRecord},
    running_balance::RunningBalances,
};
use tokio_util::sync::CancellationToken;

use crate::{join::fetch_all, source::TransferSource};

/// What a statement is generated for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StatementParams {
    pub addresses: Vec<Address>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl StatementParams {
    pub fn new(
        addresses: Vec<Address>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> crate::Result<Self> {
        if addresses.is_empty() {
            return Err(crate::Error::NoAddresses);
        }
        if start > end {
            return Err(crate::Error::InvalidDateRange {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }
        Ok(Self {
            addresses,
            start,
            end,
        })
    }

    pub fn tracked(&self) -> TrackedAddresses {
        self.addresses.iter().copied().collect()
    }
}

/// Everything derived from one successful fetch. Built wholesale, never patched.
#[derive(Clone, Debug)]
pub struct Statement {
    pub params: StatementParams,
    pub combined: CombinedTransactions,
    pub running_balances: RunningBalances,
    pub start_assets: AssetData,
    pub end_assets: AssetData,
}

/// One statement line, the debit balance resolved.
#[derive(Clone, Debug, Serialize)]
pub struct StatementRow {
    #[serde(flatten)]
    pub entry: CombinedTransaction,
    pub debit: Option<DebitBalance>,
}

#[derive(Clone, Debug, Serialize)]
pub struct StatementReport {
    pub params: StatementParams,
    pub start_assets: AssetData,
    pub end_assets: AssetData,
    pub transactions: Vec<StatementRow>,
}

impl Statement {
    /// Derives the statement from the feeds of every tracked address.
    ///
    /// The running balances cover the full history, so the opening holdings
    /// account for everything before `params.start`.
    pub fn build(
        params: StatementParams,
        feeds: &[(Address, Vec<TransferRecord>)],
        native: &AssetInfo,
    ) -> crate::Result<Self> {
        let tracked = params.tracked();
        let normalized = feeds
            .iter()
            .map(|(address, records)| normalize_all(records, *address, &tracked, native));

        let combined = CombinedTransactions::combine(normalized, native);
        let running_balances = RunningBalances::compute(&combined)?;
        let start_assets = AssetData::as_of(&running_balances, params.start)?;
        let end_assets = AssetData::as_of(&running_balances, params.end)?;

        Ok(Self {
            params,
            combined,
            running_balances,
            start_assets,
            end_assets,
        })
    }

    /// Entries dated inside the statement period.
    pub fn transactions(&self) -> &[CombinedTransaction] {
        self.combined.within_date_range(self.params.start, self.params.end)
    }

    pub fn debit_balance(
        &self,
        entry: &CombinedTransaction,
    ) -> crate::Result<Option<DebitBalance>> {
        Ok(debit_token_running_balance(entry, &self.running_balances)?)
    }

    pub fn rows(&self) -> crate::Result<Vec<StatementRow>> {
        self.transactions()
            .iter()
            .map(|entry| {
                Ok(StatementRow {
                    entry: entry.clone(),
                    debit: self.debit_balance(entry)?,
                })
            })
            .collect()
    }

    pub fn report(&self) -> crate::Result<StatementReport> {
        Ok(StatementReport {
            params: self.params.clone(),
            start_assets: self.start_assets.clone(),
            end_assets: self.end_assets.clone(),
            transactions: self.rows()?,
        })
    }
}

/// A fetch started for a generation of the parameters.
#[derive(Clone, Debug)]
pub struct FetchRequest {
    pub generation: u64,
    pub params: StatementParams,
    pub cancel_token: CancellationToken,
}

/// Holds the current parameters and the statement derived for them.
///
/// Every parameter change or new fetch bumps the generation and cancels the
/// fetch in flight, so a result arriving for an older generation is dropped.
pub struct Session {
    native: AssetInfo,
    params: Option<StatementParams>,
    generation: u64,
    cancel_token: CancellationToken,
    statement: Option<Statement>,
}

impl Session {
    pub fn new(native: AssetInfo) -> Self {
        Self {
            native,
            params: None,
            generation: 0,
            cancel_token: CancellationToken::new(),
            statement: None,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn params(&self) -> Option<&StatementParams> {
        self.params.as_ref()
    }

    pub fn statement(&self) -> Option<&Statement> {
        self.statement.as_ref()
    }

    fn invalidate(&mut self) {
        self.generation += 1;
        self.cancel_token.cancel();
        self.cancel_token = CancellationToken::new();
        self.statement = None;
    }

    /// Replaces the parameters, dropping the current statement.
    pub fn set_params(&mut self, params: StatementParams) {
        self.invalidate();
        self.params = Some(params);
    }

    /// Starts a new generation for the current parameters.
    pub fn begin_fetch(&mut self) -> crate::Result<FetchRequest> {
        let params = self.params.clone().ok_or(crate::Error::NoAddresses)?;
        self.invalidate();

        Ok(FetchRequest {
            generation: self.generation,
            params,
            cancel_token: self.cancel_token.clone(),
        })
    }

    /// Applies the outcome of the fetch started as `generation`.
    ///
    /// Returns `Ok(None)` when the generation is stale, the result is dropped.
    pub fn complete(
        &mut self,
        generation: u64,
        result: crate::Result<Vec<(Address, Vec<TransferRecord>)>>,
    ) -> crate::Result<Option<&Statement>> {
        if generation != self.generation {
            warn!(
                "discarding fetch of generation {generation}, current is {}",
                self.generation
            );
            return Ok(None);
        }

        let params = self.params.clone().ok_or(crate::Error::NoAddresses)?;
        let feeds = result?;
        let statement = Statement::build(params, &feeds, &self.native)?;
        info!(
            "generation {generation}: {} entries, {} in period",
            statement.combined.len(),
            statement.transactions().len()
        );

        Ok(Some(&*self.statement.insert(statement)))
    }

    /// Fetches the current parameters from `source` and derives the statement.
    pub async fn run<S: TransferSource>(
        &mut self,
        source: Arc<S>,
    ) -> crate::Result<Option<&Statement>> {
        let request = self.begin_fetch()?;
        let result = fetch_all(source, &request.params.addresses, &request.cancel_token).await;
        self.complete(request.generation, result)
    }
}
