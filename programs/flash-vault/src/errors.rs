use anchor_lang::prelude::*;

/// Custom error codes for the Flash Vault program
///
/// Every variant aborts the whole transaction; nothing is retried on-chain.
#[error_code]
pub enum VaultError {
    #[msg("Amount must be greater than zero and within the available liquidity")]
    InvalidAmount,

    #[msg("Share amount is zero or exceeds the holder's balance")]
    InsufficientShares,

    #[msg("Deposit is below the bootstrap floor or would mint zero shares")]
    DepositTooSmall,

    #[msg("Vault accounting is inconsistent")]
    InvalidPoolState,

    #[msg("Withdrawal would return zero assets")]
    WithdrawTooSmall,

    #[msg("Asset transfer was declined by the token program")]
    TransferFailed,

    #[msg("Borrower callback failed or returned an unexpected value")]
    CallbackRejected,

    #[msg("Flash loan was not repaid with its fee")]
    LoanNotRepaid,

    #[msg("Math overflow occurred during calculation")]
    MathOverflow,

    #[msg("Vault is already executing an operation")]
    ReentrantCall,

    #[msg("Fee curve exceeds the maximum fee rate")]
    InvalidFeeConfig,

    #[msg("Invalid token mint - does not match vault asset")]
    InvalidMint,

    #[msg("Invalid token account owner")]
    InvalidOwner,

    #[msg("Flash loan callback payload could not be encoded")]
    InvalidCallbackData,
}
