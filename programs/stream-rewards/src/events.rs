use anchor_lang::prelude::*;

use crate::state::PoolKind;

/// Emitted when a pool account is created.
#[event]
pub struct PoolCreated {
    pub pool: Pubkey,
    pub principal_mint: Pubkey,
    pub owner: Pubkey,
    pub kind: PoolKind,
}

/// Emitted when a new reward token gets its own channel.
#[event]
pub struct RewardTokenApproved {
    pub pool: Pubkey,
    pub reward_mint: Pubkey,
    pub reward_vault: Pubkey,
}

#[event]
pub struct Deposit {
    pub pool: Pubkey,
    pub user: Pubkey,
    pub amount: u64,
    /// Staked balance after the deposit
    pub new_balance: u64,
}

#[event]
pub struct Withdraw {
    pub pool: Pubkey,
    pub user: Pubkey,
    pub amount: u64,
    /// Staked balance after the withdrawal
    pub new_balance: u64,
}

/// Emitted once per non-zero reward payout.
#[event]
pub struct Claim {
    pub pool: Pubkey,
    pub user: Pubkey,
    pub reward_mint: Pubkey,
    pub amount: u64,
}
