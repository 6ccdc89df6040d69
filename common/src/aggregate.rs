use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    asset::TokenAddress, lookup::SymbolData, running_balance::RunningBalances,
    transaction::LedgerKey,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    /// Ledger position of the snapshot the holding was taken from.
    pub as_of: LedgerKey,
    #[serde(flatten)]
    pub data: SymbolData,
}

/// Assets held by the tracked set at a point in time.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetData {
    pub date: DateTime<Utc>,
    pub assets: BTreeMap<TokenAddress, Holding>,
}

impl AssetData {
    /// Projects the most recent snapshot at or before `date` for every asset.
    ///
    /// Assets whose first event comes after `date` are not yet held and are
    /// left out rather than reported as zero.
    pub fn as_of(balances: &RunningBalances, date: DateTime<Utc>) -> crate::Result<Self> {
        let millis = date.timestamp_millis();
        let mut assets = BTreeMap::new();

        for token in balances.tokens() {
            if let Some((key, snapshot)) = balances.latest_at_or_before(token, millis) {
                assets.insert(
                    *token,
                    Holding {
                        as_of: *key,
                        data: SymbolData::from_snapshot(snapshot)?,
                    },
                );
            }
        }

        Ok(Self { date, assets })
    }

    pub fn get(&self, token: &TokenAddress) -> Option<&Holding> {
        self.assets.get(token)
    }

    /// Holdings with a non zero balance, for display.
    pub fn non_zero(&self) -> impl Iterator<Item = (&TokenAddress, &Holding)> {
        self.assets
            .iter()
            .filter(|(_, holding)| !holding.data.value.is_zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        asset::AssetInfo,
        combine::CombinedTransactions,
        transaction::{Direction, Transaction, TransferKind},
    };
    use alloy::primitives::{Address, TxHash, I256, U256};
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn tx(hash: u8, secs: i64, asset: AssetInfo, amount: u64, direction: Direction) -> Transaction {
        Transaction {
            hash: TxHash::repeat_byte(hash),
            date: at(secs),
            kind: if asset.token.is_native() {
                TransferKind::Native
            } else {
                TransferKind::Token
            },
            asset,
            amount: U256::from(amount),
            direction,
            account: Address::repeat_byte(0xaa),
            counterparty: Address::repeat_byte(0xcc),
            log_index: None,
            fee: None,
        }
    }

    fn balances() -> RunningBalances {
        let dai = AssetInfo::contract(Address::repeat_byte(0xda), "DAI", "Dai", 18);
        let combined = CombinedTransactions::combine(
            [vec![
                tx(1, 100, AssetInfo::default(), 10, Direction::Credit),
                tx(2, 200, dai.clone(), 5, Direction::Credit),
                tx(3, 300, AssetInfo::default(), 10, Direction::Debit),
                tx(4, 400, dai, 1, Direction::Debit),
            ]],
            &AssetInfo::default(),
        );
        RunningBalances::compute(&combined).unwrap()
    }

    #[test]
    fn test_asset_not_yet_held_is_omitted() {
        let data = AssetData::as_of(&balances(), at(150)).unwrap();
        assert_eq!(data.assets.len(), 1);
        assert!(data.get(&TokenAddress::Native).is_some());
        assert!(AssetData::as_of(&balances(), at(50))
            .unwrap()
            .assets
            .is_empty());
    }

    #[test]
    fn test_between_events_uses_previous_snapshot() {
        let data = AssetData::as_of(&balances(), at(350)).unwrap();
        let dai = TokenAddress::Contract(Address::repeat_byte(0xda));
        assert_eq!(
            data.get(&dai).unwrap().data.value,
            I256::try_from(5i64).unwrap()
        );
        assert!(data.get(&TokenAddress::Native).unwrap().data.value.is_zero());
        assert_eq!(data.non_zero().count(), 1);
    }

    #[test]
    fn test_later_date_covers_earlier_assets() {
        let earlier = AssetData::as_of(&balances(), at(250)).unwrap();
        let later = AssetData::as_of(&balances(), at(1_000)).unwrap();
        for token in earlier.assets.keys() {
            assert!(later.assets.contains_key(token));
        }
    }

    #[test]
    fn test_serializes_with_string_keys() {
        let data = AssetData::as_of(&balances(), at(1_000)).unwrap();
        let json = serde_json::to_value(&data).unwrap();
        assert!(json["assets"]["native"]["symbol"].is_string());
    }
}
