//! Parsing of scraped balance text.
//!
//! The portal renders each balance as two fragments: the whole part, and the
//! fractional part with the currency symbol appended. Both arrive polluted
//! with whitespace, markup remnants and stray letters.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use thiserror::Error;

/// Everything outside digits, comma, period and minus is scraping noise.
static NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9,.\-]").expect("pattern is valid"));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BalanceError {
    /// The fractional fragment does not end in the expected currency symbol.
    #[error("balance text ends in {found:?}, expected currency suffix {expected:?}")]
    CurrencyMismatch { expected: char, found: Option<char> },

    /// The cleaned fragments do not form a decimal number.
    #[error("could not parse balance from cleaned text {cleaned:?}")]
    Unparseable { cleaned: String },
}

/// Combine the two scraped balance fragments into one exact decimal value.
///
/// The fractional fragment must end in `expected_currency` (ignoring
/// surrounding whitespace). Significant characters are kept in their original
/// relative order; the fractional fragment's comma separator is normalized to
/// a period before the concatenated text is parsed.
pub fn parse_fragments(
    whole: &str,
    fractional: &str,
    expected_currency: char,
) -> Result<Decimal, BalanceError> {
    let found = fractional.trim().chars().last();
    if found != Some(expected_currency) {
        return Err(BalanceError::CurrencyMismatch {
            expected: expected_currency,
            found,
        });
    }

    let whole = NOISE.replace_all(whole, "");
    let fractional = NOISE.replace_all(fractional, "").replace(',', ".");

    let cleaned = format!("{whole}{fractional}");
    Decimal::from_str(&cleaned).map_err(|_| BalanceError::Unparseable { cleaned })
}
