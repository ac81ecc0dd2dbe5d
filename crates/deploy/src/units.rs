//! Fixed-point conversion of human-scale amounts into on-chain base units.

use alloy_core::primitives::{
    U256,
    utils::{ParseUnits, parse_units},
};
use thiserror::Error;

/// Errors raised when an amount cannot be converted to base units.
#[derive(Debug, Error, PartialEq)]
pub enum AmountError {
    /// The amount is negative or not a finite number.
    #[error("amount must be a finite, non-negative number, got {0}")]
    InvalidAmount(f64),
    /// The amount does not fit the requested decimal precision.
    #[error("amount {value} cannot be represented with {decimals} decimals")]
    Unrepresentable { value: f64, decimals: u8 },
}

/// Scale `value` by `10^decimals` into an integer amount of base units.
///
/// The conversion goes through the decimal rendering of `value` and exact
/// big-integer arithmetic, so the result carries no floating-point rounding
/// artifacts. Amounts feed on-chain transactions where precision errors are
/// economically significant.
pub fn to_base_units(value: f64, decimals: u8) -> Result<U256, AmountError> {
    if !value.is_finite() || value < 0.0 {
        return Err(AmountError::InvalidAmount(value));
    }

    // f64 Display renders the shortest exact decimal form, never scientific
    // notation, which is what parse_units expects.
    let rendered = format!("{value}");
    match parse_units(&rendered, decimals) {
        Ok(ParseUnits::U256(scaled)) => Ok(scaled),
        Ok(ParseUnits::I256(_)) => Err(AmountError::InvalidAmount(value)),
        Err(_) => Err(AmountError::Unrepresentable { value, decimals }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_amount_at_token_precision() {
        assert_eq!(
            to_base_units(1.0, 18).unwrap().to_string(),
            "1000000000000000000"
        );
    }

    #[test]
    fn test_fractional_amount() {
        assert_eq!(to_base_units(0.5, 6).unwrap().to_string(), "500000");
        assert_eq!(to_base_units(123.456, 6).unwrap().to_string(), "123456000");
    }

    #[test]
    fn test_zero() {
        assert_eq!(to_base_units(0.0, 18).unwrap(), U256::ZERO);
    }

    #[test]
    fn test_negative_amount_is_rejected() {
        assert_eq!(
            to_base_units(-1.0, 18),
            Err(AmountError::InvalidAmount(-1.0))
        );
    }

    #[test]
    fn test_non_finite_amounts_are_rejected() {
        assert!(matches!(
            to_base_units(f64::INFINITY, 18),
            Err(AmountError::InvalidAmount(_))
        ));
        assert!(matches!(
            to_base_units(f64::NAN, 18),
            Err(AmountError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_excess_precision_is_rejected() {
        assert_eq!(
            to_base_units(0.5, 0),
            Err(AmountError::Unrepresentable {
                value: 0.5,
                decimals: 0
            })
        );
    }

    #[test]
    fn test_small_amount_has_no_exponent_artifacts() {
        assert_eq!(to_base_units(0.0000001, 18).unwrap().to_string(), "100000000000");
    }
}
