use std::future::Future;

use alloy::primitives::Address;
use statement_common::normalize::TransferRecord;

/// Upstream provider of the transfer history of a single address.
pub trait TransferSource: Send + Sync + 'static {
    /// Full history of `address`, native, token and internal transfers alike.
    fn fetch(
        &self,
        address: Address,
    ) -> impl Future<Output = crate::Result<Vec<TransferRecord>>> + Send;
}
