use std::{collections::HashMap, fmt::Debug, future::Future, time::Duration};

use alloy::primitives::{Address, TxHash, U256};
use chrono::{DateTime, TimeZone, Utc};
use log::{debug, warn};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use serde_with::{serde_as, DisplayFromStr};
use statement_common::{
    asset::AssetInfo, format::MAX_DECIMALS, normalize::TransferRecord, transaction::TransferKind,
};

use crate::{serde::SerdeResponseParse, source::TransferSource, Reqwest};

pub const ETHERSCAN_API_URL: &str = "https://api.etherscan.io/v2/api";

/// Largest page Etherscan serves, `page * offset` may not exceed it.
pub const MAX_PAGE_SIZE: usize = 10_000;

const RATE_LIMIT_RETRIES: u32 = 3;

const RATE_LIMIT_DELAY: Duration = Duration::from_secs(1);

type OrdinalKey = (TxHash, Address, String, U256);

#[derive(Debug, Deserialize)]
struct EtherscanResponse {
    status: String,
    message: String,
    result: Value,
}

/// Row shapes of the `account` module list actions.
trait EtherscanRow: DeserializeOwned + Debug {
    const ACTION: &'static str;

    fn block_number(&self) -> u64;

    /// Rows moving the same value between the same ends within a transaction.
    /// Every address feed lists such a group in full, so numbering rows
    /// within it gives the same ordinal whichever feed a row came from.
    fn ordinal_key(&self) -> OrdinalKey;

    /// `ordinal` numbers rows sharing an [`OrdinalKey`], in response order.
    fn into_record(self, ordinal: u64) -> crate::Result<Option<TransferRecord>>;
}

#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NormalTxRow {
    #[serde_as(as = "DisplayFromStr")]
    block_number: u64,
    #[serde_as(as = "DisplayFromStr")]
    time_stamp: i64,
    hash: TxHash,
    from: Address,
    #[serde(default)]
    to: String,
    #[serde_as(as = "DisplayFromStr")]
    value: U256,
    #[serde_as(as = "DisplayFromStr")]
    gas_price: U256,
    #[serde_as(as = "DisplayFromStr")]
    gas_used: U256,
    #[serde(default)]
    is_error: String,
    #[serde(default)]
    contract_address: String,
}

#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenTxRow {
    #[serde_as(as = "DisplayFromStr")]
    block_number: u64,
    #[serde_as(as = "DisplayFromStr")]
    time_stamp: i64,
    hash: TxHash,
    from: Address,
    to: Address,
    #[serde_as(as = "DisplayFromStr")]
    value: U256,
    contract_address: Address,
    #[serde(default)]
    token_name: String,
    #[serde(default)]
    token_symbol: String,
    #[serde(default)]
    token_decimal: String,
    #[serde(default)]
    log_index: Option<String>,
}

#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InternalTxRow {
    #[serde_as(as = "DisplayFromStr")]
    block_number: u64,
    #[serde_as(as = "DisplayFromStr")]
    time_stamp: i64,
    hash: TxHash,
    from: Address,
    #[serde(default)]
    to: String,
    #[serde_as(as = "DisplayFromStr")]
    value: U256,
    #[serde(default)]
    is_error: String,
    #[serde(default)]
    contract_address: String,
}

fn timestamp(action: &'static str, hash: TxHash, secs: i64) -> crate::Result<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or_else(|| crate::Error::EtherscanRow {
            action,
            hash: hash.to_string(),
            reason: format!("timestamp {secs} out of range"),
        })
}

/// `to` is empty for contract creations, the created contract is the receiver.
fn receiver(
    action: &'static str,
    hash: TxHash,
    to: &str,
    contract_address: &str,
) -> crate::Result<Address> {
    let to = if to.is_empty() { contract_address } else { to };
    if to.is_empty() {
        return Ok(Address::ZERO);
    }
    to.parse().map_err(|_| crate::Error::EtherscanRow {
        action,
        hash: hash.to_string(),
        reason: format!("invalid receiver '{to}'"),
    })
}

impl EtherscanRow for NormalTxRow {
    const ACTION: &'static str = "txlist";

    fn block_number(&self) -> u64 {
        self.block_number
    }

    fn ordinal_key(&self) -> OrdinalKey {
        (self.hash, self.from, self.to.to_lowercase(), self.value)
    }

    fn into_record(self, _ordinal: u64) -> crate::Result<Option<TransferRecord>> {
        Ok(Some(TransferRecord {
            hash: self.hash,
            timestamp: timestamp(Self::ACTION, self.hash, self.time_stamp)?,
            from: self.from,
            to: receiver(Self::ACTION, self.hash, &self.to, &self.contract_address)?,
            value: self.value,
            kind: TransferKind::Native,
            token: None,
            log_index: None,
            is_error: self.is_error == "1",
            fee: Some(self.gas_used.saturating_mul(self.gas_price)),
        }))
    }
}

impl EtherscanRow for TokenTxRow {
    const ACTION: &'static str = "tokentx";

    fn block_number(&self) -> u64 {
        self.block_number
    }

    fn ordinal_key(&self) -> OrdinalKey {
        (self.hash, self.from, self.to.to_string(), self.value)
    }

    fn into_record(self, ordinal: u64) -> crate::Result<Option<TransferRecord>> {
        let Some(decimals) = self
            .token_decimal
            .parse::<u8>()
            .ok()
            .filter(|decimals| *decimals <= MAX_DECIMALS)
        else {
            debug!(
                "skipping {} transfer of {} without usable decimals '{}'",
                self.hash, self.contract_address, self.token_decimal
            );
            return Ok(None);
        };

        let log_index = self
            .log_index
            .as_deref()
            .and_then(|index| index.parse::<u64>().ok())
            .unwrap_or(ordinal);

        Ok(Some(TransferRecord {
            hash: self.hash,
            timestamp: timestamp(Self::ACTION, self.hash, self.time_stamp)?,
            from: self.from,
            to: self.to,
            value: self.value,
            kind: TransferKind::Token,
            token: Some(AssetInfo::contract(
                self.contract_address,
                self.token_symbol,
                self.token_name,
                decimals,
            )),
            log_index: Some(log_index),
            is_error: false,
            fee: None,
        }))
    }
}

impl EtherscanRow for InternalTxRow {
    const ACTION: &'static str = "txlistinternal";

    fn block_number(&self) -> u64 {
        self.block_number
    }

    fn ordinal_key(&self) -> OrdinalKey {
        (self.hash, self.from, self.to.to_lowercase(), self.value)
    }

    fn into_record(self, ordinal: u64) -> crate::Result<Option<TransferRecord>> {
        Ok(Some(TransferRecord {
            hash: self.hash,
            timestamp: timestamp(Self::ACTION, self.hash, self.time_stamp)?,
            from: self.from,
            to: receiver(Self::ACTION, self.hash, &self.to, &self.contract_address)?,
            value: self.value,
            kind: TransferKind::Internal,
            token: None,
            log_index: Some(ordinal),
            is_error: self.is_error == "1",
            fee: None,
        }))
    }
}

/// Unwraps the `{status, message, result}` envelope.
fn parse_response<R: EtherscanRow>(response: EtherscanResponse) -> crate::Result<Vec<R>> {
    if response.status == "1" {
        return response
            .result
            .serde_parse_custom()
            .map_err(crate::Error::SerdePathToError);
    }

    if response.message.starts_with("No transactions found")
        || response.message.starts_with("No records found")
    {
        return Ok(Vec::new());
    }

    let result = match &response.result {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    if result.to_lowercase().contains("rate limit") {
        return Err(crate::Error::EtherscanRateLimited(result));
    }

    Err(crate::Error::EtherscanResponse {
        action: R::ACTION,
        message: response.message,
        result,
    })
}

/// Walks the history in block windows, since Etherscan caps a query at
/// [`MAX_PAGE_SIZE`] rows. A full page is cut before its last block, which is
/// then fetched again as the start of the next window.
async fn collect_pages<R, F, Fut>(page_size: usize, mut fetch_page: F) -> crate::Result<Vec<R>>
where
    R: EtherscanRow,
    F: FnMut(u64) -> Fut,
    Fut: Future<Output = crate::Result<Vec<R>>>,
{
    let mut rows = Vec::new();
    let mut start_block = 0;

    loop {
        let mut page = fetch_page(start_block).await?;

        if page.len() < page_size {
            rows.extend(page);
            return Ok(rows);
        }

        let last_block = page.last().map(|row| row.block_number()).unwrap_or_default();
        let before_last = page.iter().filter(|row| row.block_number() < last_block).count();

        if before_last == 0 {
            warn!(
                "{} page is filled by block {last_block} alone, later rows may be missing",
                R::ACTION
            );
            rows.extend(page);
            return Ok(rows);
        }

        page.truncate(before_last);
        rows.extend(page);
        start_block = last_block;
    }
}

/// Repeats `request` while it is rate limited, doubling the pause each time,
/// up to [`RATE_LIMIT_RETRIES`] retries.
async fn retry_rate_limited<T, F, Fut>(delay: Duration, mut request: F) -> crate::Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = crate::Result<T>>,
{
    let mut delay = delay;
    let mut attempt = 0;
    loop {
        match request().await {
            Err(crate::Error::EtherscanRateLimited(reason)) if attempt < RATE_LIMIT_RETRIES => {
                debug!("rate limited ({reason}), retrying in {delay:?}");
                tokio::time::sleep(delay).await;
                delay *= 2;
                attempt += 1;
            }
            result => return result,
        }
    }
}

fn into_records<R: EtherscanRow>(rows: Vec<R>) -> crate::Result<Vec<TransferRecord>> {
    let mut ordinals = HashMap::<OrdinalKey, u64>::new();
    let mut records = Vec::with_capacity(rows.len());

    for row in rows {
        let ordinal = ordinals.entry(row.ordinal_key()).or_default();
        let current = *ordinal;
        *ordinal += 1;

        if let Some(record) = row.into_record(current)? {
            records.push(record);
        }
    }

    Ok(records)
}

/// Etherscan compatible explorer serving native, token and internal transfers.
pub struct Etherscan {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    chain_id: u64,
    page_size: usize,
}

impl Etherscan {
    pub fn new(api_key: String, chain_id: u64) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: ETHERSCAN_API_URL.to_string(),
            api_key,
            chain_id,
            page_size: MAX_PAGE_SIZE,
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    async fn request_page<R: EtherscanRow>(
        &self,
        address: Address,
        start_block: u64,
    ) -> crate::Result<Vec<R>> {
        let query = [
            ("chainid", self.chain_id.to_string()),
            ("module", "account".to_string()),
            ("action", R::ACTION.to_string()),
            ("address", address.to_string()),
            ("startblock", start_block.to_string()),
            ("endblock", "latest".to_string()),
            ("page", "1".to_string()),
            ("offset", self.page_size.to_string()),
            ("sort", "asc".to_string()),
            ("apikey", self.api_key.clone()),
        ];

        let query = &query;
        retry_rate_limited(RATE_LIMIT_DELAY, || async move {
            let response = Reqwest::get(&self.client, &self.api_url)?
                .query(query)
                .receive_json::<EtherscanResponse>()
                .await?;
            parse_response::<R>(response)
        })
        .await
    }

    async fn list<R: EtherscanRow>(&self, address: Address) -> crate::Result<Vec<TransferRecord>> {
        let rows = collect_pages(self.page_size, |start_block| {
            self.request_page::<R>(address, start_block)
        })
        .await?;

        debug!("{} returned {} rows for {address}", R::ACTION, rows.len());
        into_records(rows)
    }
}

impl TransferSource for Etherscan {
    async fn fetch(&self, address: Address) -> crate::Result<Vec<TransferRecord>> {
        let mut records = self.list::<NormalTxRow>(address).await?;
        records.extend(self.list::<TokenTxRow>(address).await?);
        records.extend(self.list::<InternalTxRow>(address).await?);
        Ok(records)
    }
}
