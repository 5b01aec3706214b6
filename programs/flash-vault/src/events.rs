use anchor_lang::prelude::*;

/// Event emitted when a new vault is initialized
#[event]
pub struct VaultInitialized {
    pub vault: Pubkey,
    pub payer: Pubkey,
    pub asset_mint: Pubkey,
    pub share_mint: Pubkey,
    pub base_fee_bps: u16,
    pub fee_slope_bps: u16,
    pub timestamp: i64,
}

/// Event emitted when assets are deposited
#[event]
pub struct Deposited {
    pub vault: Pubkey,
    pub user: Pubkey,
    pub asset_amount: u64,
    pub shares_minted: u64,
    pub total_assets: u64,
    pub total_shares: u64,
    pub timestamp: i64,
}

/// Event emitted when shares are redeemed
#[event]
pub struct Withdrawn {
    pub vault: Pubkey,
    pub user: Pubkey,
    pub asset_amount: u64,
    pub shares_burned: u64,
    pub total_assets: u64,
    pub total_shares: u64,
    pub timestamp: i64,
}

/// Event emitted once per vault when the first depositor reclaims the dust reservation
#[event]
pub struct DustRefunded {
    pub vault: Pubkey,
    pub user: Pubkey,
    pub amount: u64,
    pub timestamp: i64,
}

/// Event emitted when a flash loan settles
#[event]
pub struct LoanExecuted {
    pub vault: Pubkey,
    pub initiator: Pubkey,
    pub borrower: Pubkey,
    pub amount: u64,
    pub fee: u64,
    pub total_assets: u64,
    pub timestamp: i64,
}
