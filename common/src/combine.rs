use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{
    asset::{AssetInfo, TokenAddress},
    transaction::{LedgerKey, Transaction},
};

/// An entry of the combined stream together with its unique ledger position.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedTransaction {
    pub key: LedgerKey,
    pub transaction: Transaction,
}

impl std::ops::Deref for CombinedTransaction {
    type Target = Transaction;

    fn deref(&self) -> &Self::Target {
        &self.transaction
    }
}

/// Chronologically ordered, deduplicated transactions of the whole tracked set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedTransactions {
    entries: Vec<CombinedTransaction>,
}

impl CombinedTransactions {
    /// Merges the normalized feeds of every tracked address.
    ///
    /// Fees become their own entries, zero amount principals are dropped and
    /// the same movement reported by several feeds is kept once. When feeds
    /// disagree on an asset's metadata the later observed one is applied to
    /// every entry of that asset.
    pub fn combine<I>(feeds: I, native: &AssetInfo) -> Self
    where
        I: IntoIterator<Item = Vec<Transaction>>,
    {
        let mut metadata = HashMap::<TokenAddress, AssetInfo>::new();
        let mut seen = HashSet::new();
        let mut transactions = Vec::new();

        for transaction in feeds.into_iter().flatten() {
            let fee = transaction.fee_entry(native);

            for entry in std::iter::once(transaction).chain(fee) {
                if let Some(previous) = metadata.get(&entry.asset.token) {
                    if previous.metadata_differs(&entry.asset) {
                        warn!(
                            "metadata for {} changed from {} {}/{} to {} {}/{}",
                            entry.asset.token,
                            previous.symbol,
                            previous.name,
                            previous.decimals,
                            entry.asset.symbol,
                            entry.asset.name,
                            entry.asset.decimals
                        );
                    }
                }
                metadata.insert(entry.asset.token, entry.asset.clone());

                if entry.amount.is_zero() {
                    continue;
                }

                if seen.insert(entry.content_key()) {
                    transactions.push(entry);
                } else {
                    debug!("dropping duplicate {:?} of {}", entry.kind, entry.hash);
                }
            }
        }

        for transaction in transactions.iter_mut() {
            if let Some(asset) = metadata.get(&transaction.asset.token) {
                transaction.asset = asset.clone();
            }
        }

        transactions.sort_by_key(|t| {
            (
                t.millis(),
                t.hash,
                t.is_fee(),
                t.log_index,
                t.asset.token,
                t.direction,
                t.account,
                t.counterparty,
                t.amount,
            )
        });

        let mut entries = Vec::with_capacity(transactions.len());
        let mut previous: Option<LedgerKey> = None;
        for transaction in transactions {
            let millis = transaction.millis();
            let key = match previous {
                Some(prev) if prev.millis == millis => LedgerKey::new(millis, prev.seq + 1),
                _ => LedgerKey::start_of(millis),
            };
            previous = Some(key);
            entries.push(CombinedTransaction { key, transaction });
        }

        Self { entries }
    }

    pub fn entries(&self) -> &[CombinedTransaction] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CombinedTransaction> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries with `start <= date <= end`, compared at millisecond precision.
    pub fn within_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> &[CombinedTransaction] {
        let (start, end) = (start.timestamp_millis(), end.timestamp_millis());
        let lo = self.entries.partition_point(|e| e.key.millis < start);
        let hi = self.entries.partition_point(|e| e.key.millis <= end);
        if lo >= hi {
            return &[];
        }
        &self.entries[lo..hi]
    }
}

impl<'a> IntoIterator for &'a CombinedTransactions {
    type Item = &'a CombinedTransaction;
    type IntoIter = std::slice::Iter<'a, CombinedTransaction>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
