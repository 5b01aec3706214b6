use anchor_lang::prelude::*;

use crate::{
    constants::*,
    errors::VaultError,
    math::{fee_for, fee_rate_bps, mul_div_floor, validate_fee_curve},
};

/// Flash loan fee curve, fixed when the vault is initialized
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeeConfig {
    /// Fee rate at zero utilization
    pub base_fee_bps: u16,

    /// Additional rate at full utilization
    pub fee_slope_bps: u16,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            base_fee_bps: DEFAULT_BASE_FEE_BPS,
            fee_slope_bps: DEFAULT_FEE_SLOPE_BPS,
        }
    }
}

impl FeeConfig {
    pub fn validate(&self) -> Result<()> {
        validate_fee_curve(self.base_fee_bps, self.fee_slope_bps)
    }
}

/// Vault state tracking assets, shares and open flash loans
///
/// Security considerations:
/// - total_assets is the only input to the exchange rate; the token account
///   balance is never used for pricing
/// - The dust holder is the dust_shares counter: counted in total_shares,
///   never redeemable through withdraw
/// - locked is the reentrancy guard held across every mutating instruction
/// - 64 bytes padding for future upgrades
#[account]
#[derive(Debug, PartialEq)]
pub struct VaultState {
    /// Mint of the underlying asset token
    pub asset_mint: Pubkey,         // 32 bytes

    /// Mint of the vault share token
    pub share_mint: Pubkey,         // 32 bytes

    /// Assets backing outstanding shares, as accounted by the vault
    pub total_assets: u64,          // 8 bytes

    /// Share mint supply plus dust_shares
    pub total_shares: u64,          // 8 bytes

    /// Balance of the reserved dust holder
    pub dust_shares: u64,           // 8 bytes

    /// Holder who triggered the most recent bootstrap
    pub first_depositor: Option<Pubkey>, // 33 bytes

    /// Set once the dust refund has been paid; never cleared
    pub dust_refunded: bool,        // 1 byte

    /// Principal lent out and not yet repaid
    pub total_flash_loans_outstanding: u64, // 8 bytes

    pub base_fee_bps: u16,          // 2 bytes

    pub fee_slope_bps: u16,         // 2 bytes

    /// Reentrancy guard
    pub locked: bool,               // 1 byte

    /// Bump seed for vault state PDA
    pub bump: u8,                   // 1 byte

    /// Bump seed for share mint PDA
    pub share_bump: u8,             // 1 byte

    /// Bump seed for vault authority PDA
    pub authority_bump: u8,         // 1 byte

    // Padding for future upgrades
    pub _reserved: [u8; 64],        // 64 bytes
}

/// Outcome of a deposit
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DepositReceipt {
    /// Shares credited to the depositor
    pub shares_minted: u64,

    /// Shares credited to the dust holder (non-zero only on bootstrap)
    pub dust_minted: u64,
}

impl DepositReceipt {
    pub fn bootstrapped(&self) -> bool {
        self.dust_minted > 0
    }
}

/// Outcome of a withdrawal
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WithdrawReceipt {
    /// Assets paid for the redeemed shares
    pub assets_returned: u64,

    /// Shares burned from the holder
    pub shares_burned: u64,

    /// One-time side payment to the first depositor
    pub dust_refund: u64,

    /// Dust holder shares burned by the terminal sweep
    pub dust_burned: u64,

    /// True when the withdrawal emptied the pool
    pub swept: bool,
}

impl WithdrawReceipt {
    /// Total assets leaving the vault
    pub fn total_paid(&self) -> Result<u64> {
        self.assets_returned
            .checked_add(self.dust_refund)
            .ok_or(error!(VaultError::MathOverflow))
    }
}

impl VaultState {
    pub fn new(
        asset_mint: Pubkey,
        share_mint: Pubkey,
        fee_config: FeeConfig,
        bump: u8,
        share_bump: u8,
        authority_bump: u8,
    ) -> Result<Self> {
        fee_config.validate()?;

        Ok(Self {
            asset_mint,
            share_mint,
            total_assets: 0,
            total_shares: 0,
            dust_shares: 0,
            first_depositor: None,
            dust_refunded: false,
            total_flash_loans_outstanding: 0,
            base_fee_bps: fee_config.base_fee_bps,
            fee_slope_bps: fee_config.fee_slope_bps,
            locked: false,
            bump,
            share_bump,
            authority_bump,
            _reserved: [0; 64],
        })
    }

    pub fn fee_config(&self) -> FeeConfig {
        FeeConfig {
            base_fee_bps: self.base_fee_bps,
            fee_slope_bps: self.fee_slope_bps,
        }
    }

    /// Take the reentrancy guard
    pub fn enter(&mut self) -> Result<()> {
        require!(!self.locked, VaultError::ReentrantCall);
        self.locked = true;
        Ok(())
    }

    /// Release the reentrancy guard
    pub fn leave(&mut self) {
        self.locked = false;
    }

    pub fn is_empty(&self) -> bool {
        self.total_shares == 0
    }

    /// Shares held by real holders (everything except the dust holder)
    pub fn circulating_shares(&self) -> Result<u64> {
        self.total_shares
            .checked_sub(self.dust_shares)
            .ok_or(error!(VaultError::InvalidPoolState))
    }

    /// Reconcile the accounting with the share mint supply
    ///
    /// Holders can burn share tokens through the token program without
    /// calling the vault. Those shares are dropped from `total_shares`, so
    /// their assets stay behind for the remaining holders. If no shares are
    /// left, the orphaned assets leave the accounting like a donation.
    /// Returns the number of shares burned outside the vault.
    pub fn sync_share_supply(&mut self, share_supply: u64) -> Result<u64> {
        require!(
            (self.total_shares == 0) == (self.total_assets == 0),
            VaultError::InvalidPoolState
        );
        let accounted = share_supply
            .checked_add(self.dust_shares)
            .ok_or(error!(VaultError::MathOverflow))?;
        // Only the vault authority mints, so supply never runs ahead
        require!(accounted <= self.total_shares, VaultError::InvalidPoolState);

        let burned = self.total_shares - accounted;
        self.total_shares = accounted;
        if self.total_shares == 0 {
            self.total_assets = 0;
        }
        Ok(burned)
    }

    /// Shares worth `assets` at the current rate (1:1 for an empty pool)
    pub fn convert_to_shares(&self, assets: u64) -> Result<u64> {
        if self.is_empty() {
            return Ok(assets);
        }
        require!(self.total_assets > 0, VaultError::InvalidPoolState);
        mul_div_floor(assets, self.total_shares, self.total_assets)
    }

    /// Assets redeemable for `shares` at the current rate
    pub fn convert_to_assets(&self, shares: u64) -> Result<u64> {
        if self.is_empty() {
            return Ok(0);
        }
        mul_div_floor(shares, self.total_assets, self.total_shares)
    }

    /// total_assets / total_shares scaled by PRICE_SCALE
    pub fn price_per_share(&self) -> Result<u64> {
        if self.is_empty() {
            return Ok(PRICE_SCALE);
        }
        mul_div_floor(self.total_assets, PRICE_SCALE, self.total_shares)
    }

    /// Compute a deposit without applying it
    pub fn preview_deposit(&self, amount: u64) -> Result<DepositReceipt> {
        require!(amount > 0, VaultError::InvalidAmount);

        if self.is_empty() {
            require!(self.total_assets == 0, VaultError::InvalidPoolState);

            let floor = MINIMUM_SHARES
                .checked_mul(BOOTSTRAP_MULTIPLIER)
                .ok_or(error!(VaultError::MathOverflow))?;
            require!(amount > floor, VaultError::DepositTooSmall);

            return Ok(DepositReceipt {
                shares_minted: amount - MINIMUM_SHARES,
                dust_minted: MINIMUM_SHARES,
            });
        }

        // Pre-deposit totals; the incoming amount is not part of the rate
        require!(self.total_assets > 0, VaultError::InvalidPoolState);
        let shares_minted = mul_div_floor(amount, self.total_shares, self.total_assets)?;
        require!(shares_minted > 0, VaultError::DepositTooSmall);

        Ok(DepositReceipt {
            shares_minted,
            dust_minted: 0,
        })
    }

    /// Account for `amount` assets already received from `holder`
    pub fn deposit(&mut self, holder: Pubkey, amount: u64) -> Result<DepositReceipt> {
        let receipt = self.preview_deposit(amount)?;

        let total_shares = self
            .total_shares
            .checked_add(receipt.shares_minted)
            .and_then(|s| s.checked_add(receipt.dust_minted))
            .ok_or(error!(VaultError::MathOverflow))?;
        let total_assets = self
            .total_assets
            .checked_add(amount)
            .ok_or(error!(VaultError::MathOverflow))?;
        let dust_shares = self
            .dust_shares
            .checked_add(receipt.dust_minted)
            .ok_or(error!(VaultError::MathOverflow))?;

        self.total_shares = total_shares;
        self.total_assets = total_assets;
        self.dust_shares = dust_shares;
        if receipt.bootstrapped() {
            self.first_depositor = Some(holder);
        }

        Ok(receipt)
    }

    fn dust_refund_due(&self, holder: &Pubkey) -> bool {
        !self.dust_refunded && self.first_depositor.as_ref() == Some(holder)
    }

    /// Compute a withdrawal without applying it
    ///
    /// `holder_balance` is the holder's share balance before the call.
    pub fn preview_withdraw(
        &self,
        holder: &Pubkey,
        share_amount: u64,
        holder_balance: u64,
    ) -> Result<WithdrawReceipt> {
        require!(
            share_amount > 0 && holder_balance >= share_amount,
            VaultError::InsufficientShares
        );
        require!(
            self.total_shares > 0 && self.total_assets > 0,
            VaultError::InvalidPoolState
        );

        let mut total_shares = self.total_shares;
        let mut total_assets = self.total_assets;
        let mut dust_shares = self.dust_shares;

        let dust_refund = if self.dust_refund_due(holder) {
            dust_shares = dust_shares
                .checked_sub(MINIMUM_SHARES)
                .ok_or(error!(VaultError::InvalidPoolState))?;
            total_shares = total_shares
                .checked_sub(MINIMUM_SHARES)
                .ok_or(error!(VaultError::InvalidPoolState))?;
            total_assets = total_assets
                .checked_sub(MINIMUM_SHARES)
                .ok_or(error!(VaultError::InvalidPoolState))?;
            MINIMUM_SHARES
        } else {
            0
        };

        let circulating = total_shares
            .checked_sub(dust_shares)
            .ok_or(error!(VaultError::InvalidPoolState))?;
        require!(circulating >= holder_balance, VaultError::InvalidPoolState);

        // One unit of rounding residue is tolerated, but only when the holder
        // owns it and it can be burned alongside the request.
        let residue = circulating - share_amount;
        let holder_residue = holder_balance - share_amount;
        let last = residue == 0 || (residue == 1 && holder_residue == 1);

        if last {
            return Ok(WithdrawReceipt {
                assets_returned: total_assets,
                shares_burned: share_amount + residue,
                dust_refund,
                dust_burned: dust_shares,
                swept: true,
            });
        }

        let assets_returned = mul_div_floor(share_amount, total_assets, total_shares)?;
        require!(assets_returned > 0, VaultError::WithdrawTooSmall);

        Ok(WithdrawReceipt {
            assets_returned,
            shares_burned: share_amount,
            dust_refund,
            dust_burned: 0,
            swept: false,
        })
    }

    /// Redeem `share_amount` of `holder`'s shares
    ///
    /// The caller burns `shares_burned` from the holder and pays
    /// `total_paid()` out of the vault.
    pub fn withdraw(
        &mut self,
        holder: &Pubkey,
        share_amount: u64,
        holder_balance: u64,
    ) -> Result<WithdrawReceipt> {
        let receipt = self.preview_withdraw(holder, share_amount, holder_balance)?;

        let shares_removed = receipt
            .shares_burned
            .checked_add(receipt.dust_burned)
            .and_then(|s| s.checked_add(receipt.dust_refund))
            .ok_or(error!(VaultError::MathOverflow))?;
        let total_shares = self
            .total_shares
            .checked_sub(shares_removed)
            .ok_or(error!(VaultError::InvalidPoolState))?;
        let total_assets = self
            .total_assets
            .checked_sub(receipt.total_paid()?)
            .ok_or(error!(VaultError::InvalidPoolState))?;
        let dust_shares = self
            .dust_shares
            .checked_sub(receipt.dust_refund)
            .and_then(|d| d.checked_sub(receipt.dust_burned))
            .ok_or(error!(VaultError::InvalidPoolState))?;

        self.total_shares = total_shares;
        self.total_assets = total_assets;
        self.dust_shares = dust_shares;
        if receipt.dust_refund > 0 {
            self.dust_refunded = true;
        }

        Ok(receipt)
    }

    /// Largest principal a flash loan may borrow right now
    pub fn max_flash_loan(&self) -> u64 {
        self.total_assets
            .saturating_sub(self.total_flash_loans_outstanding)
    }

    /// Fee for borrowing `amount` at the current utilization
    pub fn calculate_fee(&self, amount: u64) -> Result<u64> {
        let rate = fee_rate_bps(
            self.base_fee_bps,
            self.fee_slope_bps,
            self.total_flash_loans_outstanding,
            self.total_assets,
        )?;
        fee_for(amount, rate)
    }

    /// Record a loan of `amount` as outstanding and return its fee
    pub fn open_loan(&mut self, amount: u64) -> Result<u64> {
        require!(
            amount > 0 && amount <= self.max_flash_loan(),
            VaultError::InvalidAmount
        );

        let fee = self.calculate_fee(amount)?;
        self.total_flash_loans_outstanding = self
            .total_flash_loans_outstanding
            .checked_add(amount)
            .ok_or(error!(VaultError::MathOverflow))?;

        Ok(fee)
    }

    /// Close a loan once the borrower has returned `amount + fee`
    ///
    /// The fee is added to total_assets without minting shares.
    pub fn settle_loan(
        &mut self,
        amount: u64,
        fee: u64,
        balance_before: u64,
        balance_after: u64,
    ) -> Result<()> {
        let required = balance_before
            .checked_add(fee)
            .ok_or(error!(VaultError::MathOverflow))?;
        require!(balance_after >= required, VaultError::LoanNotRepaid);

        let outstanding = self
            .total_flash_loans_outstanding
            .checked_sub(amount)
            .ok_or(error!(VaultError::InvalidPoolState))?;
        let total_assets = self
            .total_assets
            .checked_add(fee)
            .ok_or(error!(VaultError::MathOverflow))?;

        self.total_flash_loans_outstanding = outstanding;
        self.total_assets = total_assets;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_vault(total_assets: u64, total_shares: u64) -> VaultState {
        let mut vault = VaultState::new(
            Pubkey::default(),
            Pubkey::default(),
            FeeConfig::default(),
            0,
            0,
            0,
        )
        .unwrap();
        vault.total_assets = total_assets;
        vault.total_shares = total_shares;
        vault
    }

    #[test]
    fn test_bootstrap_deposit() {
        let mut vault = mock_vault(0, 0);
        let holder = Pubkey::new_unique();

        let receipt = vault.deposit(holder, 200_000_000).unwrap();

        assert_eq!(receipt.shares_minted, 199_000_000);
        assert_eq!(receipt.dust_minted, MINIMUM_SHARES);
        assert_eq!(vault.total_shares, 200_000_000);
        assert_eq!(vault.dust_shares, MINIMUM_SHARES);
        assert_eq!(vault.first_depositor, Some(holder));
    }

    #[test]
    fn test_subsequent_deposit_with_profit() {
        // Vault has 2000 assets but only 1000 shares (fees accrued)
        let vault = mock_vault(2000, 1000);
        assert_eq!(vault.preview_deposit(500).unwrap().shares_minted, 250);
    }

    #[test]
    fn test_precision_loss() {
        let vault = mock_vault(1000, 333);
        // 100 * 333 / 1000 = 33 (integer division)
        assert_eq!(vault.preview_deposit(100).unwrap().shares_minted, 33);
    }

    #[test]
    fn test_deposit_rounding_to_zero_rejected() {
        let vault = mock_vault(2000, 1000);
        assert!(vault.preview_deposit(1).is_err());
    }

    #[test]
    fn test_calculate_assets() {
        let vault = mock_vault(2000, 1000);
        assert_eq!(vault.convert_to_assets(500).unwrap(), 1000);
        assert_eq!(vault.convert_to_shares(1000).unwrap(), 500);
    }

    #[test]
    fn test_price_per_share() {
        assert_eq!(mock_vault(0, 0).price_per_share().unwrap(), PRICE_SCALE);
        assert_eq!(mock_vault(2000, 1000).price_per_share().unwrap(), 2 * PRICE_SCALE);
        assert_eq!(mock_vault(1000, 3000).price_per_share().unwrap(), 333_333_333);
    }

    #[test]
    fn test_sync_matching_supply_is_noop() {
        let mut vault = mock_vault(2000, 1000);
        vault.dust_shares = 100;
        let snapshot = vault.clone();

        assert_eq!(vault.sync_share_supply(900).unwrap(), 0);
        assert_eq!(vault, snapshot);
    }

    #[test]
    fn test_sync_drops_shares_burned_outside() {
        let mut vault = mock_vault(2000, 1000);
        vault.dust_shares = 100;

        assert_eq!(vault.sync_share_supply(800).unwrap(), 100);
        assert_eq!(vault.total_shares, 900);
        assert_eq!(vault.total_assets, 2000);
        assert_eq!(vault.dust_shares, 100);
        assert_eq!(vault.price_per_share().unwrap(), 2_222_222_222);
    }

    #[test]
    fn test_sync_rejects_supply_above_accounting() {
        let mut vault = mock_vault(2000, 1000);
        vault.dust_shares = 100;
        let snapshot = vault.clone();

        assert!(vault.sync_share_supply(901).is_err());
        assert_eq!(vault, snapshot);
    }

    #[test]
    fn test_sync_empties_pool_when_no_shares_remain() {
        let mut vault = mock_vault(700, 500);

        assert_eq!(vault.sync_share_supply(0).unwrap(), 500);
        assert_eq!(vault.total_shares, 0);
        assert_eq!(vault.total_assets, 0);
        assert!(vault.preview_deposit(200_000_000).unwrap().bootstrapped());
    }

    #[test]
    fn test_sync_rejects_half_empty_pool() {
        assert!(mock_vault(0, 10).sync_share_supply(10).is_err());
        assert!(mock_vault(10, 0).sync_share_supply(0).is_err());
    }

    #[test]
    fn test_guard_blocks_nested_entry() {
        let mut vault = mock_vault(0, 0);
        vault.enter().unwrap();
        assert!(vault.enter().is_err());
        vault.leave();
        assert!(vault.enter().is_ok());
    }

    #[test]
    fn test_loan_settlement_accrues_fee() {
        let mut vault = mock_vault(1_000_000_000, 1_000_000_000);

        let fee = vault.open_loan(100_000_000).unwrap();
        assert_eq!(fee, 50_000);
        assert_eq!(vault.total_flash_loans_outstanding, 100_000_000);

        vault
            .settle_loan(100_000_000, fee, 1_000_000_000, 1_000_050_000)
            .unwrap();
        assert_eq!(vault.total_flash_loans_outstanding, 0);
        assert_eq!(vault.total_assets, 1_000_050_000);
        assert_eq!(vault.total_shares, 1_000_000_000);
    }

    #[test]
    fn test_short_repayment_leaves_loan_untouched() {
        let mut vault = mock_vault(1_000_000_000, 1_000_000_000);
        let fee = vault.open_loan(100_000_000).unwrap();
        let snapshot = vault.clone();

        assert!(vault
            .settle_loan(100_000_000, fee, 1_000_000_000, 1_000_049_999)
            .is_err());
        assert_eq!(vault, snapshot);
    }
}
