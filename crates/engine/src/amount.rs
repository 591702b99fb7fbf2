//! Amount formatter — renders integer base-unit values as decimal strings.
//!
//! Values of any magnitude are scaled with `BigDecimal`, so the quotient is
//! exact and never passes through floating point.

use std::str::FromStr;

use bigdecimal::num_bigint::BigInt;
use bigdecimal::BigDecimal;
use thiserror::Error;

/// Decimal precision of the native coin (wei → ETH).
pub const NATIVE_DECIMALS: i64 = 18;

/// ERC-20 `decimals()` returns a `uint8`.
const MAX_DECIMALS: i64 = u8::MAX as i64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
    #[error("invalid base-unit value: {0:?}")]
    InvalidValue(String),

    #[error("unsupported decimal count: {0}")]
    InvalidDecimals(i64),
}

/// Divide `raw` by `10^decimals` and render the quotient without trailing zeros.
///
/// `None`, zero or a negative `decimals` leaves the value unscaled.
pub fn format_amount(raw: &str, decimals: Option<i64>) -> Result<String, AmountError> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AmountError::InvalidValue(raw.to_string()));
    }

    let scale = match decimals {
        Some(d) if d > MAX_DECIMALS => return Err(AmountError::InvalidDecimals(d)),
        Some(d) if d > 0 => d,
        _ => 0,
    };

    let units =
        BigInt::from_str(raw).map_err(|_| AmountError::InvalidValue(raw.to_string()))?;
    let value = BigDecimal::new(units, scale).normalized();

    Ok(plain_string(&value))
}

/// Positional rendering of a normalized value, never in exponent form.
fn plain_string(value: &BigDecimal) -> String {
    let (units, scale) = value.as_bigint_and_exponent();
    let digits = units.to_string();

    if digits == "0" {
        return digits;
    }
    if scale <= 0 {
        return format!("{digits}{}", "0".repeat(scale.unsigned_abs() as usize));
    }

    let scale = scale as usize;
    if digits.len() > scale {
        let (whole, fraction) = digits.split_at(digits.len() - scale);
        format!("{whole}.{fraction}")
    } else {
        format!("0.{}{digits}", "0".repeat(scale - digits.len()))
    }
}

/// Format a wei amount as ETH.
pub fn format_wei(raw: &str) -> Result<String, AmountError> {
    format_amount(raw, Some(NATIVE_DECIMALS))
}
