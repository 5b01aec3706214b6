// Flash Vault - single-asset share vault with flash loans on Solana
// Security: Exchange rate derives only from internally tracked totals, never from token balances
// Architecture: Share ledger + flash loan engine over one VaultState account

use anchor_lang::prelude::*;

pub mod constants;
pub mod errors;
pub mod events;
pub mod instructions;
pub mod math;
pub mod state;

use instructions::*;
use state::FeeConfig;

declare_id!("CD8mE27foEtsBCfvKkNWbVACtCnwYShzwAdzepG44JxQ");

#[program]
pub mod flash_vault {
    use super::*;

    /// Initialize a new vault for a given asset token
    ///
    /// Security considerations:
    /// - Fee curve validated against MAX_FEE_RATE_BPS
    /// - Creates share mint with vault authority PDA as mint authority
    /// - Vault starts empty; the first deposit bootstraps it
    pub fn initialize(ctx: Context<Initialize>, fee_config: FeeConfig) -> Result<()> {
        instructions::initialize::handler(ctx, fee_config)
    }

    /// Deposit assets into the vault and receive shares; returns shares minted
    ///
    /// Security considerations:
    /// - Validates user token accounts (mint, owner)
    /// - Assets are pulled before shares are credited
    /// - Bootstrap reserves MINIMUM_SHARES for the dust holder
    /// - Shares priced from pre-deposit internal totals
    pub fn deposit(ctx: Context<Deposit>, amount: u64) -> Result<u64> {
        instructions::deposit::handler(ctx, amount)
    }

    /// Redeem shares for assets; returns assets paid for the shares
    ///
    /// Security considerations:
    /// - Burns only the signer's own shares
    /// - Pays the one-time dust refund to the first depositor
    /// - Last withdrawal sweeps all remaining assets and dust
    /// - If the signer would be left holding a single share, that share is
    ///   burned too, so `share_amount + 1` shares leave the account
    /// - Shares burned outside the vault are reconciled first
    pub fn withdraw(ctx: Context<Withdraw>, share_amount: u64) -> Result<u64> {
        instructions::withdraw::handler(ctx, share_amount)
    }

    /// Lend vault assets to a borrower program for the duration of this instruction;
    /// returns the fee charged
    ///
    /// Security considerations:
    /// - Reentrancy guard persisted before the borrower callback
    /// - Callback must return FLASH_LOAN_CALLBACK_SUCCESS
    /// - Vault balance must grow by at least the fee
    /// - Fee accrues to shareholders without minting shares
    pub fn flash_loan<'info>(
        ctx: Context<'_, '_, '_, 'info, FlashLoan<'info>>,
        amount: u64,
        data: Vec<u8>,
    ) -> Result<u64> {
        instructions::flash_loan::handler(ctx, amount, data)
    }

    /// Assets per share scaled by PRICE_SCALE
    pub fn price_per_share(ctx: Context<VaultView>) -> Result<u64> {
        instructions::views::handle_price_per_share(ctx)
    }

    /// Fee a flash loan of `amount` would pay right now
    pub fn quote_flash_loan_fee(ctx: Context<VaultView>, amount: u64) -> Result<u64> {
        instructions::views::handle_quote_flash_loan_fee(ctx, amount)
    }

    /// Largest amount a flash loan may borrow
    pub fn max_flash_loan(ctx: Context<VaultView>) -> Result<u64> {
        instructions::views::handle_max_flash_loan(ctx)
    }
}
