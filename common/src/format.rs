use alloy::primitives::{utils::format_units, I256, U256};

/// Fraction digits kept by the rounded display form.
pub const DISPLAY_DECIMALS: u8 = 4;

/// Largest decimals `format_units` can render, `10^77` is the last power of ten in a `U256`.
pub const MAX_DECIMALS: u8 = 77;

/// Renders a raw amount in whole units, e.g. `1500000` with 6 decimals as `1.5`.
///
/// With `rounded` the fraction is rounded half up to [`DISPLAY_DECIMALS`] digits.
pub fn format_value(value: I256, decimals: u8, rounded: bool) -> crate::Result<String> {
    let negative = value.is_negative();
    let mut magnitude = value.unsigned_abs();
    let mut decimals = decimals;

    if rounded && decimals > DISPLAY_DECIMALS {
        let scale = U256::from(10u64).pow(U256::from(decimals - DISPLAY_DECIMALS));
        magnitude = (magnitude + scale / U256::from(2u64)) / scale;
        decimals = DISPLAY_DECIMALS;
    }

    let formatted = format_units(magnitude, decimals)
        .map_err(|_| crate::Error::InvalidDecimals(decimals))?;
    let formatted = trim_fraction(&formatted);

    if negative && !magnitude.is_zero() {
        Ok(format!("-{formatted}"))
    } else {
        Ok(formatted.to_string())
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}
