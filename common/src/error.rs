use crate::asset::TokenAddress;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("No running balance found for token {symbol} ({token}).")]
    NoRunningBalanceForAsset { token: TokenAddress, symbol: String },

    #[error("No running balance found for token {symbol} ({token}) at {millis} (seq {seq}).")]
    NoRunningBalanceAtKey {
        token: TokenAddress,
        symbol: String,
        millis: i64,
        seq: u32,
    },

    #[error("Amount {amount} of {symbol} does not fit in a signed 256 bit balance.")]
    AmountOverflow { amount: alloy::primitives::U256, symbol: String },

    #[error("Decimals {0} are out of range for formatting.")]
    InvalidDecimals(u8),

    #[error("Running balance of {symbol} overflowed while folding the entry at {millis}.")]
    BalanceOverflow { symbol: String, millis: i64 },
}
