use std::collections::BTreeSet;

use alloy::primitives::{Address, TxHash, U256};
use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    asset::AssetInfo,
    format::MAX_DECIMALS,
    transaction::{Direction, Fee, Transaction, TransferKind},
};

/// A transfer as reported by an upstream data source, before direction is resolved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub hash: TxHash,
    pub timestamp: DateTime<Utc>,
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub kind: TransferKind,
    /// Token metadata, present for token transfers only.
    pub token: Option<AssetInfo>,
    pub log_index: Option<u64>,
    pub is_error: bool,
    /// Gas paid by `from`, in the native asset.
    pub fee: Option<U256>,
}

/// The addresses a statement is generated for.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrackedAddresses(BTreeSet<Address>);

impl TrackedAddresses {
    pub fn new<I: IntoIterator<Item = Address>>(addresses: I) -> Self {
        Self(addresses.into_iter().collect())
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.0.contains(address)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Address> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Address> for TrackedAddresses {
    fn from_iter<I: IntoIterator<Item = Address>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Converts a source record into a canonical transaction.
///
/// Returns `None` for records that carry nothing trackable: records that do not
/// touch the tracked set, malformed token records, and zero-value records with
/// no fee paid from the tracked set. A transfer between two tracked addresses
/// keeps only its fee, since the principal nets to zero over the set.
pub fn normalize(
    record: &TransferRecord,
    fetched_for: Address,
    tracked: &TrackedAddresses,
    native: &AssetInfo,
) -> Option<Transaction> {
    if record.kind == TransferKind::Fee {
        debug!("skipping {}: fee records are derived, not fetched", record.hash);
        return None;
    }

    if record.from != fetched_for && record.to != fetched_for {
        debug!(
            "skipping {}: does not involve fetched address {fetched_for}",
            record.hash
        );
        return None;
    }

    let from_tracked = tracked.contains(&record.from);
    let to_tracked = tracked.contains(&record.to);
    if !from_tracked && !to_tracked {
        return None;
    }

    let asset = match record.kind {
        TransferKind::Token => match &record.token {
            Some(token) if token.token.is_contract() && token.decimals <= MAX_DECIMALS => {
                token.clone()
            }
            Some(token) if token.token.is_contract() => {
                debug!(
                    "skipping {}: {} has {} decimals",
                    record.hash, token.token, token.decimals
                );
                return None;
            }
            _ => {
                debug!("skipping {}: token transfer without a contract", record.hash);
                return None;
            }
        },
        _ => native.clone(),
    };

    let fee = if from_tracked {
        record
            .fee
            .filter(|fee| !fee.is_zero())
            .map(|amount| Fee { amount })
    } else {
        None
    };

    let moved = !record.is_error && !(from_tracked && to_tracked);
    let amount = if moved { record.value } else { U256::ZERO };

    if amount.is_zero() && fee.is_none() {
        return None;
    }

    let (direction, account, counterparty) = if from_tracked {
        (Direction::Debit, record.from, record.to)
    } else {
        (Direction::Credit, record.to, record.from)
    };

    Some(Transaction {
        hash: record.hash,
        date: record.timestamp,
        asset,
        amount,
        direction,
        account,
        counterparty,
        kind: record.kind,
        log_index: record.log_index,
        fee,
    })
}

/// Normalizes a whole feed fetched for one address.
pub fn normalize_all(
    records: &[TransferRecord],
    fetched_for: Address,
    tracked: &TrackedAddresses,
    native: &AssetInfo,
) -> Vec<Transaction> {
    records
        .iter()
        .filter_map(|record| normalize(record, fetched_for, tracked, native))
        .collect()
}
