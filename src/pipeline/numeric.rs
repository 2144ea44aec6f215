//! Locale number normalisation.
//!
//! Result documents print amounts the Spanish way: `.` groups thousands and
//! `,` marks decimals (`1.234,56`). Normalisation drops every `.`, turns `,`
//! into `.` and parses the result. No rounding beyond `f64` parsing.

use crate::error::DocumentError;

/// Convert a `1.234,56`-style token into an `f64`.
///
/// Fails with [`DocumentError::NumericFormat`] when the rewritten token is not
/// a number, e.g. an empty token or one with two decimal commas.
pub fn normalize_number(token: &str) -> Result<f64, DocumentError> {
    let rewritten = token.replace('.', "").replace(',', ".");
    rewritten
        .parse::<f64>()
        .map_err(|_| DocumentError::NumericFormat {
            token: token.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thousands_and_decimals() {
        assert_eq!(normalize_number("1.234,56").unwrap(), 1234.56);
    }

    #[test]
    fn leading_zero_decimal() {
        assert_eq!(normalize_number("0,50").unwrap(), 0.5);
    }

    #[test]
    fn plain_integer() {
        assert_eq!(normalize_number("728").unwrap(), 728.0);
    }

    #[test]
    fn several_thousand_groups() {
        assert_eq!(normalize_number("12.345.678,9").unwrap(), 12_345_678.9);
    }

    #[test]
    fn empty_token_fails() {
        assert_eq!(
            normalize_number(""),
            Err(DocumentError::NumericFormat { token: String::new() })
        );
    }

    #[test]
    fn lone_separator_fails() {
        assert!(normalize_number(".").is_err());
        assert!(normalize_number(",").is_err());
    }

    #[test]
    fn two_decimal_commas_fail() {
        assert!(normalize_number("1,2,3").is_err());
    }
}
