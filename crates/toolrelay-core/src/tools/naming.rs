//! Qualified tool names: `<provider_id>_<local_name>`

use super::error::ToolDispatchError;

/// Separator between provider id and local tool name
pub const SEPARATOR: char = '_';

/// Build the globally unique name of a provider's tool
pub fn qualify(provider_id: &str, local_name: &str) -> String {
    format!("{provider_id}{SEPARATOR}{local_name}")
}

/// Split on the first separator into (provider_id, local_name)
///
/// Provider ids never contain the separator, so local names may.
pub fn split_qualified_name(name: &str) -> Result<(&str, &str), ToolDispatchError> {
    match name.split_once(SEPARATOR) {
        Some((provider_id, local_name)) if !provider_id.is_empty() && !local_name.is_empty() => {
            Ok((provider_id, local_name))
        }
        _ => Err(ToolDispatchError::MalformedToolName(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let qualified = qualify("binance", "query_crypto_price");
        assert_eq!(qualified, "binance_query_crypto_price");
        assert_eq!(
            split_qualified_name(&qualified).unwrap(),
            ("binance", "query_crypto_price")
        );
    }

    #[test]
    fn test_round_trip_many() {
        for (provider, local) in [("market", "price"), ("news", "get_latest_news"), ("s", "a_b_c")] {
            let qualified = qualify(provider, local);
            assert_eq!(split_qualified_name(&qualified).unwrap(), (provider, local));
        }
    }

    #[test]
    fn test_malformed() {
        for name in ["noseparator", "_leading", "trailing_", ""] {
            assert!(matches!(
                split_qualified_name(name),
                Err(ToolDispatchError::MalformedToolName(_))
            ));
        }
    }
}
