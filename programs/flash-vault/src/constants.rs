// Constants for the Flash Vault program

/// Seed for vault state PDA
pub const VAULT_SEED: &[u8] = b"vault";

/// Seed for share mint PDA
pub const SHARE_MINT_SEED: &[u8] = b"shares";

/// Seed for vault token account authority PDA
pub const VAULT_AUTHORITY_SEED: &[u8] = b"vault_authority";

/// Shares reserved for the dust holder on every bootstrap from an empty pool
pub const MINIMUM_SHARES: u64 = 1_000_000;

/// A bootstrap deposit must be strictly greater than MINIMUM_SHARES * BOOTSTRAP_MULTIPLIER
pub const BOOTSTRAP_MULTIPLIER: u64 = 100;

/// Fixed-point scale for price_per_share (1.0 == PRICE_SCALE)
pub const PRICE_SCALE: u64 = 1_000_000_000;

/// Basis point denominator for fee rates
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Upper bound for base_fee_bps + fee_slope_bps (10%)
pub const MAX_FEE_RATE_BPS: u64 = 1_000;

/// Default flash loan fee at zero utilization
pub const DEFAULT_BASE_FEE_BPS: u16 = 5;

/// Default additional fee at full utilization
pub const DEFAULT_FEE_SLOPE_BPS: u16 = 45;

/// Instruction discriminator of the borrower callback: sha256("global:on_flash_loan")[..8]
pub const ON_FLASH_LOAN_DISCRIMINATOR: [u8; 8] = [195, 212, 238, 236, 80, 204, 73, 167];

/// Return data a borrower program must set to accept a loan
pub const FLASH_LOAN_CALLBACK_SUCCESS: [u8; 32] = *b"flash-vault:on_flash_loan:accept";

/// Space for VaultState account (8 discriminator + 32 asset_mint + 32 share_mint +
/// 8 total_assets + 8 total_shares + 8 dust_shares + 33 first_depositor +
/// 1 dust_refunded + 8 total_flash_loans_outstanding + 2 base_fee_bps +
/// 2 fee_slope_bps + 1 locked + 1 bump + 1 share_bump + 1 authority_bump +
/// 64 padding)
pub const VAULT_STATE_SIZE: usize =
    8 + 32 + 32 + 8 + 8 + 8 + 33 + 1 + 8 + 2 + 2 + 1 + 1 + 1 + 1 + 64;
