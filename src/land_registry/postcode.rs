//! Inbound postcode normalization.

use std::sync::LazyLock;

use regex::Regex;

use crate::query_builder::{Attribute, QueryBuildError};

/// Outward code, then the three-character inward code.
static POSTCODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z]{1,2}[0-9][A-Z0-9]?)([0-9][A-Z]{2})$").unwrap());

static PREFIX_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9][A-Z0-9 ]{0,7}$").unwrap());

/// Upper-case `raw` and put a single space before the inward code:
/// `bn147bh` and `BN14  7BH` both become `BN14 7BH`.
pub fn format_postcode(raw: &str) -> Result<String, QueryBuildError> {
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();

    let captures = POSTCODE_PATTERN.captures(&compact).ok_or_else(|| {
        QueryBuildError::invalid(Attribute::Postcode.name(), raw, "not a UK postcode")
    })?;
    Ok(format!("{} {}", &captures[1], &captures[2]))
}

/// Upper-cased postcode prefix, e.g. `bn23 7` → `BN23 7`.
pub fn normalize_prefix(raw: &str) -> Result<String, QueryBuildError> {
    let prefix = raw.trim().to_uppercase();
    if PREFIX_PATTERN.is_match(&prefix) {
        Ok(prefix)
    } else {
        Err(QueryBuildError::invalid(
            Attribute::Postcode.name(),
            raw,
            "not a postcode prefix",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("bn147bh", "BN14 7BH")]
    #[test_case("BN14 7BH", "BN14 7BH")]
    #[test_case(" bh9  2sl ", "BH9 2SL")]
    #[test_case("e16an", "E1 6AN")]
    #[test_case("SW1A1AA", "SW1A 1AA")]
    fn test_format_postcode(raw: &str, expected: &str) {
        assert_eq!(format_postcode(raw).unwrap(), expected);
    }

    #[test_case("0")]
    #[test_case("")]
    #[test_case("BN14")]
    #[test_case("1234567")]
    fn test_format_postcode_rejects(raw: &str) {
        assert!(format_postcode(raw).is_err());
    }

    #[test]
    fn test_normalize_prefix() {
        assert_eq!(normalize_prefix("bn23 7l").unwrap(), "BN23 7L");
        assert!(normalize_prefix("").is_err());
        assert!(normalize_prefix("BN%").is_err());
    }
}
