use anchor_lang::prelude::*;

#[error_code]
pub enum RewardsError {
    // Amount Errors
    #[msg("Invalid amount: must be greater than zero")]
    InvalidAmount,

    #[msg("Insufficient staked balance")]
    InsufficientBalance,

    #[msg("Principal token account has nothing the pool can move")]
    NoAllowance,

    #[msg("Nothing to claim")]
    NothingToClaim,

    // Authorization Errors
    #[msg("Unauthorized: only owner can call")]
    NotOwner,

    #[msg("Invalid authority")]
    InvalidAuthority,

    // Reward Token Registry Errors
    #[msg("Reward token not approved")]
    TokenNotApproved,

    #[msg("Reward token already approved")]
    AlreadyApproved,

    #[msg("Reward token and pool token must be different")]
    TokenEqualsPrincipal,

    #[msg("Maximum number of reward tokens reached")]
    RewardTokenLimitReached,

    #[msg("Pool was created with a single reward token")]
    NotMultiRewardPool,

    // Math Errors
    #[msg("Math overflow")]
    MathOverflow,

    #[msg("Math underflow")]
    MathUnderflow,

    #[msg("Division by zero")]
    DivisionByZero,

    // Account Validation Errors
    #[msg("Invalid principal mint")]
    InvalidPrincipalMint,

    #[msg("Invalid reward vault")]
    InvalidRewardVault,

    #[msg("Invalid reward source")]
    InvalidRewardSource,

    #[msg("Reward channel accounts do not match the pool's channels")]
    ChannelAccountsMismatch,

    #[msg("Invalid token account owner")]
    InvalidTokenAccountOwner,
}
