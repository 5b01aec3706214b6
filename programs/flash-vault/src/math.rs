//! Integer helpers for share conversion and the flash loan fee curve.
//!
//! Every division floors. Rounding always lands in the vault's favor, so a
//! caller can never take out more than the exact pro-rata value.

use anchor_lang::prelude::*;

use crate::{constants::*, errors::VaultError};

/// floor(a * b / denominator) with a u128 intermediate
pub fn mul_div_floor(a: u64, b: u64, denominator: u64) -> Result<u64> {
    let result = (a as u128)
        .checked_mul(b as u128)
        .ok_or(error!(VaultError::MathOverflow))?
        .checked_div(denominator as u128)
        .ok_or(error!(VaultError::InvalidPoolState))?;

    u64::try_from(result).map_err(|_| error!(VaultError::MathOverflow))
}

/// Reject curves whose rate at full utilization exceeds MAX_FEE_RATE_BPS
pub fn validate_fee_curve(base_fee_bps: u16, fee_slope_bps: u16) -> Result<()> {
    let max_rate = base_fee_bps as u64 + fee_slope_bps as u64;
    require!(max_rate <= MAX_FEE_RATE_BPS, VaultError::InvalidFeeConfig);
    Ok(())
}

/// Fee rate in basis points at the given utilization
///
/// rate = base + floor(slope * outstanding / total_assets). Utilization is
/// capped at 100% and is zero for an empty pool.
pub fn fee_rate_bps(
    base_fee_bps: u16,
    fee_slope_bps: u16,
    outstanding: u64,
    total_assets: u64,
) -> Result<u64> {
    let utilization_part = if total_assets == 0 {
        0
    } else {
        mul_div_floor(
            fee_slope_bps as u64,
            outstanding.min(total_assets),
            total_assets,
        )?
    };

    let rate = (base_fee_bps as u64)
        .checked_add(utilization_part)
        .ok_or(error!(VaultError::MathOverflow))?;
    require!(rate <= MAX_FEE_RATE_BPS, VaultError::InvalidFeeConfig);
    Ok(rate)
}

/// floor(amount * rate_bps / 10_000)
pub fn fee_for(amount: u64, rate_bps: u64) -> Result<u64> {
    mul_div_floor(amount, rate_bps, BPS_DENOMINATOR)
}
