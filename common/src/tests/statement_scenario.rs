use alloy::primitives::{Address, TxHash, I256, U256};
use chrono::{DateTime, TimeZone, Utc};

use crate::{
    aggregate::AssetData,
    asset::{AssetInfo, TokenAddress},
    combine::CombinedTransactions,
    lookup::{debit_token_running_balance, running_balance_at},
    normalize::{normalize_all, TrackedAddresses, TransferRecord},
    running_balance::RunningBalances,
    transaction::{LedgerKey, TransferKind},
};

const X: Address = Address::repeat_byte(0x01);
const SHOP: Address = Address::repeat_byte(0x02);
const TOKEN: Address = Address::repeat_byte(0x7e);

fn t1() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

fn t2() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 2, 12, 0, 0).unwrap()
}

fn signed(v: i64) -> I256 {
    I256::try_from(v).unwrap()
}

fn token() -> AssetInfo {
    AssetInfo::contract(TOKEN, "T", "Test token", 6)
}

fn token_transfer(
    hash: u8,
    date: DateTime<Utc>,
    from: Address,
    to: Address,
    value: u64,
) -> TransferRecord {
    TransferRecord {
        hash: TxHash::repeat_byte(hash),
        timestamp: date,
        from,
        to,
        value: U256::from(value),
        kind: TransferKind::Token,
        token: Some(token()),
        log_index: Some(0),
        is_error: false,
        fee: None,
    }
}

/// X receives 1000 T at t1, then sends 400 T at t2 paying 10 native units of gas.
fn scenario() -> (CombinedTransactions, RunningBalances) {
    let native = AssetInfo::default();
    let tracked = TrackedAddresses::new([X]);

    let contract_call = TransferRecord {
        hash: TxHash::repeat_byte(2),
        timestamp: t2(),
        from: X,
        to: TOKEN,
        value: U256::ZERO,
        kind: TransferKind::Native,
        token: None,
        log_index: None,
        is_error: false,
        fee: Some(U256::from(10u64)),
    };

    let records = vec![
        token_transfer(1, t1(), SHOP, X, 1000),
        token_transfer(2, t2(), X, SHOP, 400),
        contract_call,
    ];

    let feed = normalize_all(&records, X, &tracked, &native);
    let combined = CombinedTransactions::combine([feed], &native);
    let balances = RunningBalances::compute(&combined).unwrap();
    (combined, balances)
}

#[test]
fn test_running_balances_of_example() {
    let (_, balances) = scenario();
    let t = TokenAddress::Contract(TOKEN);

    let at_t1 = balances
        .latest_at_or_before(&t, t1().timestamp_millis())
        .unwrap()
        .1;
    let at_t2 = balances
        .latest_at_or_before(&t, t2().timestamp_millis())
        .unwrap()
        .1;
    let native_t2 = balances
        .latest_at_or_before(&TokenAddress::Native, t2().timestamp_millis())
        .unwrap()
        .1;

    assert_eq!(at_t1.value, signed(1000));
    assert_eq!(at_t1.decimals, 6);
    assert_eq!(at_t2.value, signed(600));
    assert_eq!(native_t2.value, signed(-10));
}

#[test]
fn test_aggregates_of_example() {
    let (_, balances) = scenario();
    let t = TokenAddress::Contract(TOKEN);

    let end = AssetData::as_of(&balances, t2()).unwrap();
    assert_eq!(end.assets.len(), 2);
    assert_eq!(end.get(&t).unwrap().data.value, signed(600));
    assert_eq!(end.get(&TokenAddress::Native).unwrap().data.value, signed(-10));

    let start = AssetData::as_of(&balances, t1()).unwrap();
    assert_eq!(start.assets.len(), 1);
    assert_eq!(start.get(&t).unwrap().data.value, signed(1000));
    assert_eq!(start.get(&t).unwrap().data.value_in_decimals, "0.001");
}

#[test]
fn test_debit_lookup_of_example() {
    let (combined, balances) = scenario();

    let debit = combined
        .iter()
        .find(|e| e.date == t2() && e.kind == TransferKind::Token)
        .unwrap();
    let found = debit_token_running_balance(debit, &balances)
        .unwrap()
        .unwrap();
    assert_eq!(found.amount, U256::from(400u64));
    assert_eq!(found.balance.value, signed(600));

    let fee = combined.iter().find(|e| e.is_fee()).unwrap();
    assert!(debit_token_running_balance(fee, &balances).unwrap().is_none());

    let credit = combined.iter().find(|e| e.date == t1()).unwrap();
    assert!(debit_token_running_balance(credit, &balances)
        .unwrap()
        .is_none());
}

#[test]
fn test_lookup_exactness() {
    let (combined, balances) = scenario();

    for entry in &combined {
        assert!(running_balance_at(&balances, &entry.asset, entry.key).is_ok());
    }

    let between = LedgerKey::start_of(t1().timestamp_millis() + 1);
    assert!(running_balance_at(&balances, &token(), between).is_err());
}

#[test]
fn test_stream_is_ordered() {
    let (combined, _) = scenario();
    assert!(combined.entries().windows(2).all(|w| w[0].key < w[1].key));
    assert!(combined
        .entries()
        .windows(2)
        .all(|w| w[0].date <= w[1].date));
}

#[test]
fn test_fold_is_prefix_sum_per_asset() {
    let (combined, balances) = scenario();

    for token in balances.tokens() {
        let mut sum = I256::ZERO;
        for entry in combined.iter().filter(|e| e.asset.token == *token) {
            sum += entry.signed_amount().unwrap();
            assert_eq!(balances.get(token, &entry.key).unwrap().value, sum);
        }
    }
}

#[test]
fn test_aggregation_monotonic_in_date() {
    let (combined, balances) = scenario();
    let d1 = t1();
    let d2 = t2();

    let earlier = AssetData::as_of(&balances, d1).unwrap();
    let later = AssetData::as_of(&balances, d2).unwrap();

    for (token, holding) in &earlier.assets {
        let moved: I256 = combined
            .within_date_range(d1, d2)
            .iter()
            .filter(|e| e.asset.token == *token && e.date > d1)
            .map(|e| e.signed_amount().unwrap())
            .fold(I256::ZERO, |acc, v| acc + v);
        assert_eq!(later.get(token).unwrap().data.value, holding.data.value + moved);
    }
}
