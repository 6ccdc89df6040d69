use std::sync::Arc;

use alloy::primitives::Address;
use log::debug;
use statement_common::normalize::TransferRecord;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::source::TransferSource;

type FetchHandle = JoinHandle<Option<crate::Result<Vec<TransferRecord>>>>;

/// Aborts the tasks still running when the join is left early.
struct AbortOnDrop(Vec<(Address, FetchHandle)>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        for (_, handle) in &self.0 {
            handle.abort();
        }
    }
}

/// Fetches every address concurrently, one tokio task each.
///
/// Succeeds only if every address does, otherwise the failures of all
/// addresses are returned together. Results follow the order of `addresses`,
/// not the order tasks finish in. Cancelling `cancel_token` aborts the tasks
/// still in flight.
pub async fn fetch_all<S: TransferSource>(
    source: Arc<S>,
    addresses: &[Address],
    cancel_token: &CancellationToken,
) -> crate::Result<Vec<(Address, Vec<TransferRecord>)>> {
    let mut tasks = AbortOnDrop(Vec::with_capacity(addresses.len()));

    for &address in addresses {
        let source = Arc::clone(&source);
        let cancel_token = cancel_token.clone();

        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = cancel_token.cancelled() => None,
                result = source.fetch(address) => Some(result),
            }
        });
        tasks.0.push((address, handle));
    }

    let mut fetched = Vec::with_capacity(addresses.len());
    let mut failures = Vec::new();

    for (address, handle) in tasks.0.iter_mut() {
        let address = *address;
        let joined = tokio::select! {
            _ = cancel_token.cancelled() => return Err(crate::Error::FetchCancelled),
            joined = handle => joined,
        };

        match joined {
            Ok(Some(Ok(records))) => {
                debug!("fetched {} records for {address}", records.len());
                fetched.push((address, records));
            }
            Ok(Some(Err(err))) => {
                debug!("fetch for {address} failed: {err}");
                failures.push((address, err));
            }
            Ok(None) => return Err(crate::Error::FetchCancelled),
            Err(err) => failures.push((address, crate::Error::FetchTaskFailed(address, err))),
        }
    }

    if failures.is_empty() {
        Ok(fetched)
    } else {
        Err(crate::Error::FetchFailed(failures))
    }
}
