use anchor_lang::prelude::*;
use anchor_lang::AccountsExit;
use anchor_lang::solana_program::{
    instruction::{AccountMeta, Instruction},
    program::{get_return_data, invoke},
};
use anchor_spl::token::{self, Token, TokenAccount, Transfer};

use crate::{constants::*, errors::*, events::*, state::*};

/// Arguments passed to the borrower program's `on_flash_loan` instruction
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct FlashLoanCallback {
    pub initiator: Pubkey,
    pub asset: Pubkey,
    pub amount: u64,
    pub fee: u64,
    pub data: Vec<u8>,
}

impl FlashLoanCallback {
    /// Instruction data: discriminator followed by the Borsh-encoded arguments
    pub fn instruction_data(&self) -> Result<Vec<u8>> {
        let mut data = ON_FLASH_LOAN_DISCRIMINATOR.to_vec();
        self.serialize(&mut data)
            .map_err(|_| error!(VaultError::InvalidCallbackData))?;
        Ok(data)
    }
}

/// Lend vault assets to a borrower program within a single instruction
///
/// Security checklist:
/// ✅ 1. SIGNER VALIDATION: Initiator must be signer
/// ✅ 2. ACCOUNT OWNERSHIP: Vault state PDA validated with seeds
/// ✅ 6. MATH SAFETY: Fee computed with checked math, floor division
/// ✅ 7. TOKEN ACCOUNT VALIDATION: Vault and borrower accounts match the asset
/// ✅ 8. BUSINESS LOGIC: Guard persisted before the untrusted callback,
///        repayment verified against the vault token balance
/// ✅ 10. EVENTS: Emits LoanExecuted
#[derive(Accounts)]
pub struct FlashLoan<'info> {
    /// Caller requesting the loan
    pub initiator: Signer<'info>,

    /// Vault state PDA
    /// Security: Validated by seeds, holds the reentrancy guard
    #[account(
        mut,
        seeds = [VAULT_SEED, vault_state.asset_mint.as_ref()],
        bump = vault_state.bump,
    )]
    pub vault_state: Account<'info, VaultState>,

    /// Vault authority PDA
    /// CHECK: PDA used as authority, validated by seeds
    #[account(
        seeds = [VAULT_AUTHORITY_SEED, vault_state.asset_mint.as_ref()],
        bump = vault_state.authority_bump,
    )]
    pub vault_authority: UncheckedAccount<'info>,

    /// Vault's token account (source of the loan, destination of the repayment)
    /// Security: Must be correct mint and owned by vault_authority
    #[account(
        mut,
        constraint = vault_token_account.mint == vault_state.asset_mint @ VaultError::InvalidMint,
        constraint = vault_token_account.owner == vault_authority.key() @ VaultError::InvalidOwner,
    )]
    pub vault_token_account: Account<'info, TokenAccount>,

    /// Receives the principal
    /// Security: Must be correct mint
    #[account(
        mut,
        constraint = borrower_token_account.mint == vault_state.asset_mint @ VaultError::InvalidMint,
    )]
    pub borrower_token_account: Account<'info, TokenAccount>,

    /// Borrower program implementing `on_flash_loan`
    /// CHECK: Untrusted; its answer is checked through return data and the
    /// vault balance after the call
    #[account(executable)]
    pub borrower_program: UncheckedAccount<'info>,

    pub token_program: Program<'info, Token>,
}

pub fn handler<'info>(
    ctx: Context<'_, '_, '_, 'info, FlashLoan<'info>>,
    amount: u64,
    data: Vec<u8>,
) -> Result<u64> {
    let initiator = ctx.accounts.initiator.key();
    let borrower = ctx.accounts.borrower_program.key();
    let balance_before = ctx.accounts.vault_token_account.amount;

    // Idle -> Funded: take the guard and book the principal as outstanding
    let vault_state = &mut ctx.accounts.vault_state;
    vault_state.enter()?;
    let fee = vault_state.open_loan(amount)?;
    let asset_mint_key = vault_state.asset_mint;
    let authority_bump = vault_state.authority_bump;

    // Untrusted code runs next; it must observe the held guard
    vault_state.exit(&crate::ID)?;

    let authority_seeds: &[&[u8]] = &[
        VAULT_AUTHORITY_SEED,
        asset_mint_key.as_ref(),
        &[authority_bump],
    ];
    let signer_seeds = &[&authority_seeds[..]];

    let transfer_ctx = CpiContext::new_with_signer(
        ctx.accounts.token_program.to_account_info(),
        Transfer {
            from: ctx.accounts.vault_token_account.to_account_info(),
            to: ctx.accounts.borrower_token_account.to_account_info(),
            authority: ctx.accounts.vault_authority.to_account_info(),
        },
        signer_seeds,
    );
    token::transfer(transfer_ctx, amount).map_err(|_| error!(VaultError::TransferFailed))?;

    // AwaitingCallback
    let callback = FlashLoanCallback {
        initiator,
        asset: asset_mint_key,
        amount,
        fee,
        data,
    };
    let accounts = ctx
        .remaining_accounts
        .iter()
        .map(|account| AccountMeta {
            pubkey: *account.key,
            is_signer: account.is_signer,
            is_writable: account.is_writable,
        })
        .collect();
    let instruction = Instruction {
        program_id: borrower,
        accounts,
        data: callback.instruction_data()?,
    };

    let mut account_infos = ctx.remaining_accounts.to_vec();
    account_infos.push(ctx.accounts.borrower_program.to_account_info());
    invoke(&instruction, &account_infos).map_err(|_| error!(VaultError::CallbackRejected))?;

    let accepted = matches!(
        get_return_data(),
        Some((program_id, ret)) if program_id == borrower && ret[..] == FLASH_LOAN_CALLBACK_SUCCESS[..]
    );
    require!(accepted, VaultError::CallbackRejected);

    // Repaid -> Settled
    ctx.accounts.vault_token_account.reload()?;
    let balance_after = ctx.accounts.vault_token_account.amount;

    let vault_state = &mut ctx.accounts.vault_state;
    vault_state.settle_loan(amount, fee, balance_before, balance_after)?;
    vault_state.leave();

    emit!(LoanExecuted {
        vault: vault_state.key(),
        initiator,
        borrower,
        amount,
        fee,
        total_assets: vault_state.total_assets,
        timestamp: Clock::get()?.unix_timestamp,
    });

    Ok(fee)
}
