use anchor_lang::prelude::*;
use anchor_spl::token::{self, Burn, Mint, Token, TokenAccount, Transfer};

use crate::{constants::*, errors::*, events::*, state::*};

/// Redeem shares for a pro-rata slice of the vault's assets
///
/// Security checklist:
/// ✅ 1. SIGNER VALIDATION: User must be signer (authorizes the share burn)
/// ✅ 2. ACCOUNT OWNERSHIP: Vault state PDA validated with seeds
/// ✅ 6. MATH SAFETY: Checked u128 math, floor division
/// ✅ 7. TOKEN ACCOUNT VALIDATION: Validates mint and owner
/// ✅ 8. BUSINESS LOGIC: Effects before the payout, reentrancy guard held
/// ✅ 10. EVENTS: Emits Withdrawn (and DustRefunded once)
#[derive(Accounts)]
pub struct Withdraw<'info> {
    /// User redeeming shares
    /// Security: Must be signer
    #[account(mut)]
    pub user: Signer<'info>,

    /// Vault state PDA
    /// Security: Validated by seeds, contains totals
    #[account(
        mut,
        seeds = [VAULT_SEED, vault_state.asset_mint.as_ref()],
        bump = vault_state.bump,
    )]
    pub vault_state: Account<'info, VaultState>,

    /// Share mint
    /// Security: Must match vault_state.share_mint
    #[account(
        mut,
        address = vault_state.share_mint,
    )]
    pub share_mint: Account<'info, Mint>,

    /// Vault authority PDA
    /// CHECK: PDA used as authority, validated by seeds
    #[account(
        seeds = [VAULT_AUTHORITY_SEED, vault_state.asset_mint.as_ref()],
        bump = vault_state.authority_bump,
    )]
    pub vault_authority: UncheckedAccount<'info>,

    /// User's asset token account (destination)
    /// Security: Must be owned by user and correct mint
    #[account(
        mut,
        constraint = user_asset_account.mint == vault_state.asset_mint @ VaultError::InvalidMint,
        constraint = user_asset_account.owner == user.key() @ VaultError::InvalidOwner,
    )]
    pub user_asset_account: Account<'info, TokenAccount>,

    /// User's share token account (source of burned shares)
    /// Security: Must be owned by user and correct mint
    #[account(
        mut,
        constraint = user_share_account.mint == vault_state.share_mint @ VaultError::InvalidMint,
        constraint = user_share_account.owner == user.key() @ VaultError::InvalidOwner,
    )]
    pub user_share_account: Account<'info, TokenAccount>,

    /// Vault's token account
    /// Security: Must be correct mint and owned by vault_authority
    #[account(
        mut,
        constraint = vault_token_account.mint == vault_state.asset_mint @ VaultError::InvalidMint,
        constraint = vault_token_account.owner == vault_authority.key() @ VaultError::InvalidOwner,
    )]
    pub vault_token_account: Account<'info, TokenAccount>,

    pub token_program: Program<'info, Token>,
}

pub fn handler(ctx: Context<Withdraw>, share_amount: u64) -> Result<u64> {
    let holder = ctx.accounts.user.key();
    let holder_balance = ctx.accounts.user_share_account.amount;
    let share_supply = ctx.accounts.share_mint.supply;

    // CHECKS + EFFECTS: all accounting is settled before any token moves
    let vault_state = &mut ctx.accounts.vault_state;
    vault_state.enter()?;
    let burned_outside = vault_state.sync_share_supply(share_supply)?;
    if burned_outside > 0 {
        msg!("Reconciled {} shares burned outside the vault", burned_outside);
    }
    let receipt = vault_state.withdraw(&holder, share_amount, holder_balance)?;

    // INTERACTIONS: burn the redeemed shares
    let burn_ctx = CpiContext::new(
        ctx.accounts.token_program.to_account_info(),
        Burn {
            mint: ctx.accounts.share_mint.to_account_info(),
            from: ctx.accounts.user_share_account.to_account_info(),
            authority: ctx.accounts.user.to_account_info(),
        },
    );
    token::burn(burn_ctx, receipt.shares_burned)?;

    // Pay out from the vault
    let asset_mint_key = vault_state.asset_mint;
    let authority_bump = vault_state.authority_bump;
    let authority_seeds: &[&[u8]] = &[
        VAULT_AUTHORITY_SEED,
        asset_mint_key.as_ref(),
        &[authority_bump],
    ];
    let signer_seeds = &[&authority_seeds[..]];

    for payment in [receipt.dust_refund, receipt.assets_returned] {
        if payment == 0 {
            continue;
        }
        let transfer_ctx = CpiContext::new_with_signer(
            ctx.accounts.token_program.to_account_info(),
            Transfer {
                from: ctx.accounts.vault_token_account.to_account_info(),
                to: ctx.accounts.user_asset_account.to_account_info(),
                authority: ctx.accounts.vault_authority.to_account_info(),
            },
            signer_seeds,
        );
        token::transfer(transfer_ctx, payment)
            .map_err(|_| error!(VaultError::TransferFailed))?;
    }

    vault_state.leave();

    let timestamp = Clock::get()?.unix_timestamp;

    if receipt.dust_refund > 0 {
        msg!("Dust reservation refunded to first depositor");
        emit!(DustRefunded {
            vault: vault_state.key(),
            user: holder,
            amount: receipt.dust_refund,
            timestamp,
        });
    }
    if receipt.swept {
        msg!("Final withdrawal swept {} assets", receipt.assets_returned);
    }

    emit!(Withdrawn {
        vault: vault_state.key(),
        user: holder,
        asset_amount: receipt.assets_returned,
        shares_burned: receipt.shares_burned,
        total_assets: vault_state.total_assets,
        total_shares: vault_state.total_shares,
        timestamp,
    });

    Ok(receipt.assets_returned)
}
