//! Exact conversion between whole native units and the chain's smallest unit.
//!
//! The chain counts value in 10^-18 of a native unit. Conversion is done on
//! the decimal mantissa so nothing ever passes through floating point.

use alloy::primitives::U256;
use rust_decimal::Decimal;
use thiserror::Error;

/// Decimal places of the smallest chain unit.
pub const CHAIN_DECIMALS: u32 = 18;

/// Why an amount cannot be converted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitError {
    #[error("negative amount")]
    Negative,

    #[error("more than {CHAIN_DECIMALS} decimal places")]
    TooPrecise,
}

/// Convert whole units to the smallest chain unit.
pub fn to_smallest_unit(amount: Decimal) -> Result<U256, UnitError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(UnitError::Negative);
    }

    let normalized = amount.normalize();
    let scale = normalized.scale();
    if scale > CHAIN_DECIMALS {
        return Err(UnitError::TooPrecise);
    }

    let mantissa = normalized.mantissa().unsigned_abs();
    let factor = U256::from(10u64).pow(U256::from(CHAIN_DECIMALS - scale));
    Ok(U256::from(mantissa) * factor)
}

/// Convert a smallest-unit value back to whole units.
///
/// Returns `None` when the value is too large for a `Decimal`.
pub fn from_smallest_unit(value: U256) -> Option<Decimal> {
    let raw = u128::try_from(value).ok()?;
    let raw = i128::try_from(raw).ok()?;
    Decimal::try_from_i128_with_scale(raw, CHAIN_DECIMALS)
        .ok()
        .map(|d| d.normalize())
}
