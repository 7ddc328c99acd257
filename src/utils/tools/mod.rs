use rabe_bn::{Fr, Gt};
use crate::error::{AbeError, Result};

/// Converts a non-negative machine integer to a [`rabe_bn::Fr`].
pub fn u64_to_fr(value: u64) -> Result<Fr> {
    Fr::from_str(&value.to_string())
        .ok_or_else(|| AbeError::Field(format!("{} is not a field element", value)))
}

/// Converts a signed integer to a [`rabe_bn::Fr`]; negative values map to
/// their additive inverse modulo the group order.
pub fn i64_to_fr(value: i64) -> Result<Fr> {
    let magnitude = u64_to_fr(value.unsigned_abs())?;
    if value < 0 {
        Ok(-magnitude)
    } else {
        Ok(magnitude)
    }
}

/// Multiplies `acc` by `base^exponent` for a signed integer exponent.
///
/// A negative exponent divides by the positive power instead of raising to a
/// negative exponent, the pairing library only exposes `pow` over `Fr`.
pub fn mul_signed_pow(acc: Gt, base: Gt, exponent: i64, scale_inverse: Fr) -> Result<Gt> {
    let magnitude = u64_to_fr(exponent.unsigned_abs())? * scale_inverse;
    let factor = base.pow(magnitude);
    if exponent < 0 {
        Ok(acc * factor.inverse())
    } else {
        Ok(acc * factor)
    }
}
