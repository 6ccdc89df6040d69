use alloy::primitives::{I256, U256};
use serde::{Deserialize, Serialize};

use crate::{
    asset::AssetInfo,
    combine::CombinedTransaction,
    format::format_value,
    running_balance::{RunningBalances, Snapshot},
    transaction::LedgerKey,
};

/// A balance ready for the display layer: raw value plus decimals, never pre-rounded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolData {
    pub value: I256,
    pub value_in_decimals: String,
    pub value_in_rounded_decimals: String,
    pub decimals: u8,
    pub symbol: String,
    pub name: String,
}

impl SymbolData {
    pub fn from_snapshot(snapshot: &Snapshot) -> crate::Result<Self> {
        Ok(Self {
            value: snapshot.value,
            value_in_decimals: format_value(snapshot.value, snapshot.decimals, false)?,
            value_in_rounded_decimals: format_value(snapshot.value, snapshot.decimals, true)?,
            decimals: snapshot.decimals,
            symbol: snapshot.symbol.clone(),
            name: snapshot.name.clone(),
        })
    }
}

/// The debited amount of an entry and the asset's balance right after it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebitBalance {
    pub amount: U256,
    pub amount_in_decimals: String,
    pub balance: SymbolData,
}

/// Asset leaving the tracked set in this entry. Fees are not a debit token.
pub fn debit_token(entry: &CombinedTransaction) -> Option<&AssetInfo> {
    (entry.is_debit() && !entry.is_fee()).then_some(&entry.asset)
}

/// Exact lookup of the snapshot written for `key`.
///
/// Every entry produces a snapshot at its own key during the fold, so a miss
/// means the caller keyed the query differently from the fold and is reported
/// as an integrity error.
pub fn running_balance_at(
    balances: &RunningBalances,
    asset: &AssetInfo,
    key: LedgerKey,
) -> crate::Result<SymbolData> {
    let series = balances
        .series(&asset.token)
        .ok_or_else(|| crate::Error::NoRunningBalanceForAsset {
            token: asset.token,
            symbol: asset.symbol.clone(),
        })?;

    let snapshot = series
        .get(&key)
        .ok_or_else(|| crate::Error::NoRunningBalanceAtKey {
            token: asset.token,
            symbol: asset.symbol.clone(),
            millis: key.millis,
            seq: key.seq,
        })?;

    SymbolData::from_snapshot(snapshot)
}

/// Balance of the debited asset immediately after `entry`.
///
/// `Ok(None)` when the entry debits nothing (credits and fees).
pub fn debit_token_running_balance(
    entry: &CombinedTransaction,
    balances: &RunningBalances,
) -> crate::Result<Option<DebitBalance>> {
    let Some(asset) = debit_token(entry) else {
        return Ok(None);
    };

    let balance = running_balance_at(balances, asset, entry.key)?;

    Ok(Some(DebitBalance {
        amount: entry.amount,
        amount_in_decimals: format_value(
            I256::try_from(entry.amount).map_err(|_| crate::Error::AmountOverflow {
                amount: entry.amount,
                symbol: asset.symbol.clone(),
            })?,
            asset.decimals,
            false,
        )?,
        balance,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        combine::CombinedTransactions,
        transaction::{Direction, Fee, Transaction, TransferKind},
    };
    use alloy::primitives::{Address, TxHash};
    use chrono::{TimeZone, Utc};

    fn tx(hash: u8, secs: i64, amount: u64, direction: Direction) -> Transaction {
        Transaction {
            hash: TxHash::repeat_byte(hash),
            date: Utc.timestamp_opt(secs, 0).unwrap(),
            asset: AssetInfo::default(),
            amount: U256::from(amount),
            direction,
            account: Address::repeat_byte(0xaa),
            counterparty: Address::repeat_byte(0xcc),
            kind: TransferKind::Native,
            log_index: None,
            fee: None,
        }
    }

    fn setup() -> (CombinedTransactions, RunningBalances) {
        let mut spend = tx(2, 200, 30, Direction::Debit);
        spend.fee = Some(Fee {
            amount: U256::from(1u64),
        });
        let combined = CombinedTransactions::combine(
            [vec![tx(1, 100, 100, Direction::Credit), spend]],
            &AssetInfo::default(),
        );
        let balances = RunningBalances::compute(&combined).unwrap();
        (combined, balances)
    }

    #[test]
    fn test_credit_and_fee_have_no_debit_token() {
        let (combined, balances) = setup();
        let credit = &combined.entries()[0];
        let fee = &combined.entries()[2];
        assert!(fee.is_fee());
        assert!(debit_token_running_balance(credit, &balances)
            .unwrap()
            .is_none());
        assert!(debit_token_running_balance(fee, &balances).unwrap().is_none());
    }

    #[test]
    fn test_debit_reports_amount_and_balance_after() {
        let (combined, balances) = setup();
        let debit = debit_token_running_balance(&combined.entries()[1], &balances)
            .unwrap()
            .unwrap();
        assert_eq!(debit.amount, U256::from(30u64));
        assert_eq!(debit.balance.value, I256::try_from(70i64).unwrap());
        assert_eq!(debit.balance.symbol, "ETH");
    }

    #[test]
    fn test_missing_asset_is_integrity_error() {
        let (combined, _) = setup();
        let err = debit_token_running_balance(&combined.entries()[1], &RunningBalances::default())
            .unwrap_err();
        assert!(matches!(err, crate::Error::NoRunningBalanceForAsset { .. }));
    }

    #[test]
    fn test_missing_key_is_integrity_error() {
        let (_, balances) = setup();
        let err = running_balance_at(&balances, &AssetInfo::default(), LedgerKey::new(150_000, 0))
            .unwrap_err();
        assert!(matches!(
            err,
            crate::Error::NoRunningBalanceAtKey {
                millis: 150_000,
                ..
            }
        ));
    }

    #[test]
    fn test_lookup_uses_value_equality_of_keys() {
        let (_, balances) = setup();
        let key = LedgerKey::new(Utc.timestamp_opt(200, 0).unwrap().timestamp_millis(), 0);
        let found = running_balance_at(&balances, &AssetInfo::default(), key).unwrap();
        assert_eq!(found.value, I256::try_from(70i64).unwrap());
    }
}
