use alloy::primitives::Address;

/// Parses the comma or whitespace separated address input.
///
/// Duplicates are dropped keeping the first occurrence, so the returned order
/// follows the input.
pub fn parse_addresses(input: &str) -> crate::Result<Vec<Address>> {
    let mut addresses = Vec::new();

    for part in input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
    {
        let address = part
            .parse::<Address>()
            .map_err(|_| crate::Error::InvalidAddress(part.to_string()))?;
        if !addresses.contains(&address) {
            addresses.push(address);
        }
    }

    if addresses.is_empty() {
        return Err(crate::Error::NoAddresses);
    }

    Ok(addresses)
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: &str = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e";
    const B: &str = "0x0000000000000000000000000000000000000001";

    #[test]
    fn test_parse_mixed_separators() {
        let parsed = parse_addresses(&format!(" {A},{B}\n{}", A.to_lowercase())).unwrap();
        assert_eq!(parsed, vec![A.parse::<Address>().unwrap(), B.parse().unwrap()]);
    }

    #[test]
    fn test_invalid_address() {
        assert!(matches!(
            parse_addresses(&format!("{A}, 0x1234")),
            Err(crate::Error::InvalidAddress(s)) if s == "0x1234"
        ));
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(parse_addresses(" , "), Err(crate::Error::NoAddresses)));
    }
}
