use anchor_lang::prelude::*;
use anchor_spl::{
    associated_token::AssociatedToken,
    token::{Mint, Token, TokenAccount},
};

use crate::{constants::*, events::*, state::*};

/// Initialize a new vault for a given asset token
#[derive(Accounts)]
pub struct Initialize<'info> {
    /// Pays for the vault accounts
    /// Security: Must be signer
    #[account(mut)]
    pub payer: Signer<'info>,

    /// Vault state PDA
    /// Security: Initialized with proper space and padding for upgrades
    #[account(
        init,
        payer = payer,
        space = VAULT_STATE_SIZE,
        seeds = [VAULT_SEED, asset_mint.key().as_ref()],
        bump
    )]
    pub vault_state: Account<'info, VaultState>,

    /// Asset token mint (the underlying token users deposit)
    /// Security: No constraints needed - any valid mint can have a vault
    pub asset_mint: Account<'info, Mint>,

    /// Share token mint PDA (vault shares)
    /// Security: Mint authority is vault_authority PDA
    #[account(
        init,
        payer = payer,
        seeds = [SHARE_MINT_SEED, asset_mint.key().as_ref()],
        bump,
        mint::decimals = asset_mint.decimals,
        mint::authority = vault_authority,
    )]
    pub share_mint: Account<'info, Mint>,

    /// Vault authority PDA - mint authority for shares, owner of the vault token account
    /// CHECK: PDA used as authority, validated by seeds
    #[account(
        seeds = [VAULT_AUTHORITY_SEED, asset_mint.key().as_ref()],
        bump
    )]
    pub vault_authority: UncheckedAccount<'info>,

    /// Vault's token account for holding assets
    /// Security: Owned by vault_authority PDA, correct mint
    #[account(
        init,
        payer = payer,
        associated_token::mint = asset_mint,
        associated_token::authority = vault_authority,
    )]
    pub vault_token_account: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
    pub associated_token_program: Program<'info, AssociatedToken>,
    pub system_program: Program<'info, System>,
}

pub fn handler(ctx: Context<Initialize>, fee_config: FeeConfig) -> Result<()> {
    // CHECKS + EFFECTS: fee curve is validated by the constructor
    let state = VaultState::new(
        ctx.accounts.asset_mint.key(),
        ctx.accounts.share_mint.key(),
        fee_config,
        ctx.bumps.vault_state,
        ctx.bumps.share_mint,
        ctx.bumps.vault_authority,
    )?;

    let vault_state = &mut ctx.accounts.vault_state;
    vault_state.set_inner(state);

    emit!(VaultInitialized {
        vault: vault_state.key(),
        payer: ctx.accounts.payer.key(),
        asset_mint: vault_state.asset_mint,
        share_mint: vault_state.share_mint,
        base_fee_bps: vault_state.base_fee_bps,
        fee_slope_bps: vault_state.fee_slope_bps,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(())
}
