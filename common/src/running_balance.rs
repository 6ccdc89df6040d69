use std::collections::{BTreeMap, HashMap};

use alloy::primitives::I256;
use serde::{Deserialize, Serialize};

use crate::{
    asset::TokenAddress,
    combine::CombinedTransactions,
    transaction::LedgerKey,
};

/// Balance of one asset immediately after one entry of the combined stream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub value: I256,
    pub decimals: u8,
    pub symbol: String,
    pub name: String,
}

pub type Series = BTreeMap<LedgerKey, Snapshot>;

/// Per asset step function of balances, sampled only at event times.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunningBalances {
    balances: BTreeMap<TokenAddress, Series>,
}

impl RunningBalances {
    /// Folds the combined stream in ledger order.
    ///
    /// Every asset starts at zero before its first tracked entry, so a debit
    /// observed before any credit yields a negative balance which is kept as is.
    pub fn compute(combined: &CombinedTransactions) -> crate::Result<Self> {
        let mut accumulators = HashMap::<TokenAddress, I256>::new();
        let mut balances = BTreeMap::<TokenAddress, Series>::new();

        for entry in combined {
            let token = entry.asset.token;
            let accumulator = accumulators.entry(token).or_insert(I256::ZERO);

            *accumulator = accumulator
                .checked_add(entry.signed_amount()?)
                .ok_or_else(|| crate::Error::BalanceOverflow {
                    symbol: entry.asset.symbol.clone(),
                    millis: entry.key.millis,
                })?;

            balances.entry(token).or_default().insert(
                entry.key,
                Snapshot {
                    value: *accumulator,
                    decimals: entry.asset.decimals,
                    symbol: entry.asset.symbol.clone(),
                    name: entry.asset.name.clone(),
                },
            );
        }

        Ok(Self { balances })
    }

    pub fn series(&self, token: &TokenAddress) -> Option<&Series> {
        self.balances.get(token)
    }

    pub fn get(&self, token: &TokenAddress, key: &LedgerKey) -> Option<&Snapshot> {
        self.series(token).and_then(|series| series.get(key))
    }

    /// Latest snapshot whose time is not after `millis`.
    pub fn latest_at_or_before(
        &self,
        token: &TokenAddress,
        millis: i64,
    ) -> Option<(&LedgerKey, &Snapshot)> {
        self.series(token)
            .and_then(|series| series.range(..=LedgerKey::end_of(millis)).next_back())
    }

    pub fn tokens(&self) -> impl Iterator<Item = &TokenAddress> {
        self.balances.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TokenAddress, &Series)> {
        self.balances.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }
}
