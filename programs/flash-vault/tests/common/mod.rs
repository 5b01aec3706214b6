//! Host-side model of a vault and its token accounts.
//!
//! Each operation runs the same VaultState calls the instruction handlers
//! make, inside a transaction wrapper that discards every write on error.

#![allow(dead_code)]

use std::collections::HashMap;

use anchor_lang::error::{Error, ERROR_CODE_OFFSET};
use anchor_lang::prelude::*;
use flash_vault::{
    constants::FLASH_LOAN_CALLBACK_SUCCESS,
    errors::VaultError,
    state::{DepositReceipt, FeeConfig, VaultState, WithdrawReceipt},
};

#[derive(Clone, Debug)]
pub struct Harness {
    pub vault: VaultState,
    /// Share token balances per holder
    pub shares: HashMap<Pubkey, u64>,
    /// Vault token account balance
    pub pool_balance: u64,
    pub transferred_in: u64,
    pub transferred_out: u64,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_fees(FeeConfig::default())
    }

    pub fn with_fees(fee_config: FeeConfig) -> Self {
        let vault = VaultState::new(
            Pubkey::new_unique(),
            Pubkey::new_unique(),
            fee_config,
            255,
            254,
            253,
        )
        .unwrap();

        Self {
            vault,
            shares: HashMap::new(),
            pool_balance: 0,
            transferred_in: 0,
            transferred_out: 0,
        }
    }

    fn transaction<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let snapshot = self.clone();
        let result = f(self);
        if result.is_err() {
            *self = snapshot;
        }
        result
    }

    pub fn share_supply(&self) -> u64 {
        self.shares.values().sum()
    }

    pub fn balance(&self, holder: &Pubkey) -> u64 {
        self.shares.get(holder).copied().unwrap_or(0)
    }

    pub fn deposit(&mut self, holder: Pubkey, amount: u64) -> Result<DepositReceipt> {
        self.transaction(|h| {
            h.vault.enter()?;
            h.vault.sync_share_supply(h.share_supply())?;
            h.vault.preview_deposit(amount)?;

            h.pool_balance += amount;
            h.transferred_in += amount;

            let receipt = h.vault.deposit(holder, amount)?;
            *h.shares.entry(holder).or_default() += receipt.shares_minted;
            h.vault.leave();
            Ok(receipt)
        })
    }

    pub fn withdraw(&mut self, holder: Pubkey, share_amount: u64) -> Result<WithdrawReceipt> {
        self.transaction(|h| {
            h.vault.enter()?;
            h.vault.sync_share_supply(h.share_supply())?;
            let holder_balance = h.balance(&holder);
            let receipt = h.vault.withdraw(&holder, share_amount, holder_balance)?;

            *h.shares.entry(holder).or_default() -= receipt.shares_burned;
            let paid = receipt.total_paid()?;
            h.pool_balance -= paid;
            h.transferred_out += paid;
            h.vault.leave();
            Ok(receipt)
        })
    }

    /// Token-program burn of a holder's own shares, bypassing withdraw
    pub fn burn_outside(&mut self, holder: Pubkey, share_amount: u64) {
        *self.shares.entry(holder).or_default() -= share_amount;
    }

    /// Tokens sent straight to the vault token account, bypassing deposit
    pub fn donate(&mut self, amount: u64) {
        self.pool_balance += amount;
    }

    /// Runs a flash loan; the callback receives the fee, may move tokens
    /// back with `repay`, and returns its sentinel.
    pub fn flash_loan<F>(&mut self, amount: u64, callback: F) -> Result<u64>
    where
        F: FnOnce(&mut Harness, u64) -> Result<[u8; 32]>,
    {
        self.transaction(|h| {
            let balance_before = h.pool_balance;
            h.vault.enter()?;
            let fee = h.vault.open_loan(amount)?;
            h.pool_balance -= amount;

            let sentinel = callback(h, fee).map_err(|_| error!(VaultError::CallbackRejected))?;
            require!(
                sentinel == FLASH_LOAN_CALLBACK_SUCCESS,
                VaultError::CallbackRejected
            );

            let balance_after = h.pool_balance;
            h.vault
                .settle_loan(amount, fee, balance_before, balance_after)?;
            h.vault.leave();
            Ok(fee)
        })
    }

    pub fn repay(&mut self, amount: u64) {
        self.pool_balance += amount;
    }

    pub fn assert_invariants(&self) {
        let vault = &self.vault;
        assert_eq!(
            vault.total_shares,
            self.share_supply() + vault.dust_shares,
            "total_shares must equal holder shares plus dust"
        );
        assert_eq!(
            vault.total_shares == 0,
            vault.total_assets == 0,
            "pool must be fully empty or fully seeded"
        );
        assert_eq!(vault.total_flash_loans_outstanding, 0);
        assert!(!vault.locked, "guard released between operations");
        assert!(
            self.pool_balance >= vault.total_assets,
            "vault must hold every accounted asset"
        );
    }
}

/// Totals that must survive an aborted operation unchanged
pub fn totals(vault: &VaultState) -> (u64, u64, u64) {
    (
        vault.total_assets,
        vault.total_shares,
        vault.total_flash_loans_outstanding,
    )
}

pub fn error_code<T: std::fmt::Debug>(result: Result<T>) -> u32 {
    match result.unwrap_err() {
        Error::AnchorError(err) => err.error_code_number,
        Error::ProgramError(err) => panic!("expected a vault error, got {:?}", err),
    }
}

pub fn assert_vault_error<T: std::fmt::Debug>(result: Result<T>, expected: VaultError) {
    assert_eq!(error_code(result), ERROR_CODE_OFFSET + expected as u32);
}

/// Price comparison without rounding: a_assets / a_shares <= b_assets / b_shares
pub fn price_not_lower(before: (u64, u64), after: (u64, u64)) -> bool {
    let (assets_before, shares_before) = before;
    let (assets_after, shares_after) = after;
    (assets_after as u128) * (shares_before as u128) >= (assets_before as u128) * (shares_after as u128)
}
