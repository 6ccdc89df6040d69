use alloy::primitives::{Address, TxHash, U256};
use chrono::{TimeZone, Utc};

use crate::{
    asset::{AssetInfo, TokenAddress},
    combine::CombinedTransactions,
    normalize::{normalize_all, TrackedAddresses, TransferRecord},
    running_balance::RunningBalances,
    transaction::TransferKind,
};

const A: Address = Address::repeat_byte(0x0a);
const B: Address = Address::repeat_byte(0x0b);
const OUTSIDER: Address = Address::repeat_byte(0x0c);

fn native(hash: u8, secs: i64, from: Address, to: Address, value: u64, fee: u64) -> TransferRecord {
    TransferRecord {
        hash: TxHash::repeat_byte(hash),
        timestamp: Utc.timestamp_opt(secs, 0).unwrap(),
        from,
        to,
        value: U256::from(value),
        kind: TransferKind::Native,
        token: None,
        log_index: None,
        is_error: false,
        fee: (fee > 0).then(|| U256::from(fee)),
    }
}

/// Each address feed sees the shared A -> B transfer.
fn feeds() -> (Vec<TransferRecord>, Vec<TransferRecord>) {
    let funding = native(1, 100, OUTSIDER, A, 1_000, 0);
    let internal = native(2, 200, A, B, 300, 7);
    let spend = native(3, 300, B, OUTSIDER, 100, 5);

    (vec![funding, internal.clone()], vec![internal, spend])
}

fn final_native_balance(feeds_in_order: Vec<(Address, Vec<TransferRecord>)>) -> i64 {
    let tracked = TrackedAddresses::new([A, B]);
    let native_asset = AssetInfo::default();

    let normalized = feeds_in_order
        .iter()
        .map(|(address, records)| normalize_all(records, *address, &tracked, &native_asset));
    let combined = CombinedTransactions::combine(normalized, &native_asset);
    let balances = RunningBalances::compute(&combined).unwrap();

    let (_, snapshot) = balances
        .latest_at_or_before(&TokenAddress::Native, i64::MAX)
        .unwrap();
    i64::try_from(snapshot.value).unwrap()
}

#[test]
fn test_transfer_inside_tracked_set_nets_to_zero() {
    let (a, b) = feeds();
    // 1000 in, 7 fee on the internal move, 100 out plus 5 fee.
    assert_eq!(final_native_balance(vec![(A, a), (B, b)]), 1_000 - 7 - 100 - 5);
}

#[test]
fn test_feed_order_does_not_change_result() {
    let (a, b) = feeds();
    assert_eq!(
        final_native_balance(vec![(A, a.clone()), (B, b.clone())]),
        final_native_balance(vec![(B, b), (A, a)])
    );
}

#[test]
fn test_equal_transfers_to_different_members_both_count() {
    // One transaction pays A and B the same amount, each feed sees its own leg.
    let to_a = native(4, 400, OUTSIDER, A, 50, 0);
    let to_b = native(4, 400, OUTSIDER, B, 50, 0);
    assert_eq!(
        final_native_balance(vec![(A, vec![to_a]), (B, vec![to_b])]),
        100
    );
}
