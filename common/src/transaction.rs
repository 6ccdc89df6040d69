use alloy::primitives::{Address, TxHash, I256, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::asset::{AssetInfo, TokenAddress};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Asset enters the tracked address set.
    Credit,
    /// Asset leaves the tracked address set.
    Debit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TransferKind {
    Native,
    Token,
    Internal,
    Fee,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fee {
    /// Paid in the native asset, always a debit.
    pub amount: U256,
}

/// Transfer with its direction resolved against the tracked address set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub hash: TxHash,
    pub date: DateTime<Utc>,
    pub asset: AssetInfo,
    pub amount: U256,
    pub direction: Direction,
    /// Tracked end of the movement, the sender of a debit or receiver of a credit.
    pub account: Address,
    pub counterparty: Address,
    pub kind: TransferKind,
    pub log_index: Option<u64>,
    pub fee: Option<Fee>,
}

/// Identifies one on-chain movement no matter which address feed reported it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ContentKey {
    pub hash: TxHash,
    pub kind: TransferKind,
    pub log_index: Option<u64>,
    pub token: TokenAddress,
    pub direction: Direction,
    pub account: Address,
    pub counterparty: Address,
    pub amount: U256,
}

impl Transaction {
    pub fn content_key(&self) -> ContentKey {
        ContentKey {
            hash: self.hash,
            kind: self.kind,
            log_index: self.log_index,
            token: self.asset.token,
            direction: self.direction,
            account: self.account,
            counterparty: self.counterparty,
            amount: self.amount,
        }
    }

    pub fn millis(&self) -> i64 {
        self.date.timestamp_millis()
    }

    pub fn is_credit(&self) -> bool {
        self.direction == Direction::Credit
    }

    pub fn is_debit(&self) -> bool {
        self.direction == Direction::Debit
    }

    pub fn is_fee(&self) -> bool {
        self.kind == TransferKind::Fee
    }

    /// Signed amount as seen from the tracked set.
    pub fn signed_amount(&self) -> crate::Result<I256> {
        let amount =
            I256::try_from(self.amount).map_err(|_| crate::Error::AmountOverflow {
                amount: self.amount,
                symbol: self.asset.symbol.clone(),
            })?;

        Ok(match self.direction {
            Direction::Credit => amount,
            Direction::Debit => -amount,
        })
    }

    /// Splits the attached fee into its own debit entry in the native asset.
    pub fn fee_entry(&self, native: &AssetInfo) -> Option<Transaction> {
        self.fee.as_ref().map(|fee| Transaction {
            hash: self.hash,
            date: self.date,
            asset: native.clone(),
            amount: fee.amount,
            direction: Direction::Debit,
            account: self.account,
            counterparty: self.counterparty,
            kind: TransferKind::Fee,
            log_index: None,
            fee: None,
        })
    }
}

/// Unique position of an entry in the combined stream.
///
/// Block timestamps have second resolution, so several entries can share a
/// millisecond; `seq` orders them within it.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct LedgerKey {
    pub millis: i64,
    pub seq: u32,
}

impl LedgerKey {
    pub fn new(millis: i64, seq: u32) -> Self {
        Self { millis, seq }
    }

    /// Greatest key at the given millisecond.
    pub fn end_of(millis: i64) -> Self {
        Self {
            millis,
            seq: u32::MAX,
        }
    }

    /// Smallest key at the given millisecond.
    pub fn start_of(millis: i64) -> Self {
        Self { millis, seq: 0 }
    }
}
