use anchor_lang::prelude::*;

use crate::{constants::*, state::*};

/// Read-only access to vault accounting
#[derive(Accounts)]
pub struct VaultView<'info> {
    #[account(
        seeds = [VAULT_SEED, vault_state.asset_mint.as_ref()],
        bump = vault_state.bump,
    )]
    pub vault_state: Account<'info, VaultState>,
}

pub fn handle_price_per_share(ctx: Context<VaultView>) -> Result<u64> {
    ctx.accounts.vault_state.price_per_share()
}

pub fn handle_quote_flash_loan_fee(ctx: Context<VaultView>, amount: u64) -> Result<u64> {
    ctx.accounts.vault_state.calculate_fee(amount)
}

pub fn handle_max_flash_loan(ctx: Context<VaultView>) -> Result<u64> {
    Ok(ctx.accounts.vault_state.max_flash_loan())
}
