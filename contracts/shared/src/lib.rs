//! Shared basis-point arithmetic for the pixelwar contracts.
#![no_std]
#![allow(unexpected_cfgs)]

use soroban_sdk::contracttype;

/// Failure modes of the basis-point helpers.
#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum MathError {
    Overflow = 1,
    NegativeAmount = 2,
    InvalidBps = 3,
}

/// Constant for basis points divisor (10000 = 1.0x).
pub const BASIS_POINTS_DIVISOR: u32 = 10_000;

/// `amount * bps / 10000`, truncating. `bps` may exceed the divisor, which
/// scales the amount up.
pub fn apply_bps(amount: i128, bps: u32) -> Result<i128, MathError> {
    if amount < 0 {
        return Err(MathError::NegativeAmount);
    }
    amount
        .checked_mul(bps as i128)
        .and_then(|v| v.checked_div(BASIS_POINTS_DIVISOR as i128))
        .ok_or(MathError::Overflow)
}

/// Split `amount` into `(share, remainder)` where `share = amount * share_bps / 10000`.
/// The remainder absorbs the rounding dust so the two parts always sum to `amount`.
pub fn split_bps(amount: i128, share_bps: u32) -> Result<(i128, i128), MathError> {
    if share_bps > BASIS_POINTS_DIVISOR {
        return Err(MathError::InvalidBps);
    }
    let share = apply_bps(amount, share_bps)?;
    let rest = amount.checked_sub(share).ok_or(MathError::Overflow)?;
    Ok((share, rest))
}
