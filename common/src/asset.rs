use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

/// Stable identity of an asset, independent of its display metadata.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TokenAddress {
    Native,
    Contract(Address),
}

impl TokenAddress {
    pub fn is_native(&self) -> bool {
        matches!(self, TokenAddress::Native)
    }

    pub fn is_contract(&self) -> bool {
        matches!(self, TokenAddress::Contract(_))
    }
}

impl Display for TokenAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenAddress::Native => write!(f, "native"),
            TokenAddress::Contract(address) => write!(f, "{address}"),
        }
    }
}

impl FromStr for TokenAddress {
    type Err = alloy::hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("native") {
            Ok(TokenAddress::Native)
        } else {
            s.parse().map(TokenAddress::Contract)
        }
    }
}

// Serialized as a plain string so it can key JSON maps.
impl Serialize for TokenAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TokenAddress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetInfo {
    pub token: TokenAddress,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
}

impl AssetInfo {
    pub fn native(symbol: impl Into<String>, name: impl Into<String>, decimals: u8) -> Self {
        Self {
            token: TokenAddress::Native,
            symbol: symbol.into(),
            name: name.into(),
            decimals,
        }
    }

    pub fn contract(
        address: Address,
        symbol: impl Into<String>,
        name: impl Into<String>,
        decimals: u8,
    ) -> Self {
        Self {
            token: TokenAddress::Contract(address),
            symbol: symbol.into(),
            name: name.into(),
            decimals,
        }
    }

    /// True when both describe the same asset id but disagree on display metadata.
    pub fn metadata_differs(&self, other: &AssetInfo) -> bool {
        self.token == other.token
            && (self.symbol != other.symbol
                || self.name != other.name
                || self.decimals != other.decimals)
    }
}

impl Default for AssetInfo {
    fn default() -> Self {
        AssetInfo::native("ETH", "Ether", 18)
    }
}

impl Display for AssetInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.token {
            TokenAddress::Native => write!(f, "{}", self.symbol),
            TokenAddress::Contract(address) => write!(f, "{} ({address:#})", self.symbol),
        }
    }
}
