//! Numeric coercion for decorated text fields.
//!
//! Sales exports carry prices like `₹1,099`, discounts like `64%` and review
//! counts like `24,269`. These helpers strip the decoration and parse what is
//! left.

use thiserror::Error;

/// Why a field could not be coerced to a number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NumericError {
    #[error("field is blank")]
    Blank,

    #[error("not a number: {0:?}")]
    Invalid(String),

    #[error("value out of range: {0:?}")]
    OutOfRange(String),
}

/// Characters removed before parsing: whitespace, thousands separators,
/// percent signs and common currency symbols.
fn is_decoration(c: char) -> bool {
    c.is_whitespace() || matches!(c, ',' | '%' | '₹' | '$' | '€' | '£' | '¥')
}

/// Parse a decorated number (`₹1,099.00`, `64%`, ` 4.2 `).
///
/// Non-finite results (`NaN`, `inf`) are rejected as invalid.
pub fn parse_decorated(raw: &str) -> Result<f64, NumericError> {
    let cleaned: String = raw.chars().filter(|c| !is_decoration(*c)).collect();
    if cleaned.is_empty() {
        return Err(NumericError::Blank);
    }
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(NumericError::Invalid(raw.trim().to_string())),
    }
}

/// Parse a non-negative whole count (`24,269`).
///
/// Negative or fractional values are `OutOfRange`.
pub fn parse_count(raw: &str) -> Result<u64, NumericError> {
    let value = parse_decorated(raw)?;
    if value < 0.0 || value.fract() != 0.0 || value > u64::MAX as f64 {
        return Err(NumericError::OutOfRange(raw.trim().to_string()));
    }
    Ok(value as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_currency_and_separators() {
        assert_eq!(parse_decorated("₹1,099"), Ok(1099.0));
        assert_eq!(parse_decorated("$ 12.50"), Ok(12.5));
        assert_eq!(parse_decorated("€3.000,"), Ok(3.0));
        assert_eq!(parse_decorated("64%"), Ok(64.0));
        assert_eq!(parse_decorated(" 4.2 "), Ok(4.2));
    }

    #[test]
    fn blank_and_invalid_are_distinguished() {
        assert_eq!(parse_decorated(""), Err(NumericError::Blank));
        assert_eq!(parse_decorated(" ₹ "), Err(NumericError::Blank));
        assert_eq!(parse_decorated("|"), Err(NumericError::Invalid("|".into())));
        assert!(matches!(parse_decorated("NaN"), Err(NumericError::Invalid(_))));
        assert!(matches!(parse_decorated("inf"), Err(NumericError::Invalid(_))));
    }

    #[test]
    fn counts_must_be_whole_and_non_negative() {
        assert_eq!(parse_count("24,269"), Ok(24_269));
        assert_eq!(parse_count("0"), Ok(0));
        assert_eq!(parse_count("-3"), Err(NumericError::OutOfRange("-3".into())));
        assert_eq!(parse_count("2.5"), Err(NumericError::OutOfRange("2.5".into())));
        assert_eq!(parse_count(""), Err(NumericError::Blank));
    }
}
