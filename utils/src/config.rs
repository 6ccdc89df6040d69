use serde::{Deserialize, Serialize};
use statement_common::asset::AssetInfo;

use crate::disk_storage::DiskStorageInterface;

#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct Config {
    pub etherscan_api_key: Option<String>,
    pub chain_id: u64,
    pub native_symbol: String,
    pub native_name: String,
    pub native_decimals: u8,
    /// Last address input, comma separated, stored as typed.
    pub addresses: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            etherscan_api_key: None,
            chain_id: 1,
            native_symbol: "ETH".to_string(),
            native_name: "Ether".to_string(),
            native_decimals: 18,
            addresses: String::new(),
        }
    }
}

impl DiskStorageInterface for Config {
    const FILE_NAME: &'static str = "config";
}

impl Config {
    pub fn get_etherscan_api_key(&self) -> crate::Result<String> {
        self.etherscan_api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or(crate::Error::EtherscanApiKeyNotSet)
    }

    pub fn set_etherscan_api_key(etherscan_api_key: String) -> crate::Result<()> {
        let mut config = Config::load()?;
        config.etherscan_api_key = Some(etherscan_api_key);
        config.save()
    }

    pub fn set_addresses(addresses: String) -> crate::Result<()> {
        let mut config = Config::load()?;
        config.addresses = addresses;
        config.save()
    }

    pub fn native_asset(&self) -> AssetInfo {
        AssetInfo::native(
            self.native_symbol.clone(),
            self.native_name.clone(),
            self.native_decimals,
        )
    }
}
