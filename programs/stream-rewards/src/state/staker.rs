use anchor_lang::prelude::*;

use crate::constants::{MAX_REWARD_TOKENS, MULTIPLIER_PRECISION};
use crate::error::RewardsError;
use crate::state::RewardChannel;

/// Per-channel reward position of one staker
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StakerReward {
    /// Channel multiplier at this staker's last settlement
    pub user_multiplier: u128,

    /// Settled, not yet paid reward (reward token base units)
    pub owed: u64,
}

impl StakerReward {
    pub const SIZE: usize = 16 + // user_multiplier (u128)
        8; // owed

    /// Reward accrued since the last settlement
    /// Formula: pending = balance * (current_multiplier - user_multiplier) / PRECISION
    pub fn accrued(&self, current_multiplier: u128, balance: u64) -> Result<u64> {
        if balance == 0 {
            return Ok(0);
        }

        let multiplier_diff = current_multiplier
            .checked_sub(self.user_multiplier)
            .ok_or(RewardsError::MathUnderflow)?;

        let accrued = (balance as u128)
            .checked_mul(multiplier_diff)
            .ok_or(RewardsError::MathOverflow)?
            .checked_div(MULTIPLIER_PRECISION)
            .ok_or(RewardsError::DivisionByZero)?;

        u64::try_from(accrued).map_err(|_| error!(RewardsError::MathOverflow))
    }

    /// Move accrued reward into `owed` and catch up with the channel
    pub fn settle(&mut self, current_multiplier: u128, balance: u64) -> Result<()> {
        let accrued = self.accrued(current_multiplier, balance)?;

        self.owed = self
            .owed
            .checked_add(accrued)
            .ok_or(RewardsError::MathOverflow)?;
        self.user_multiplier = current_multiplier;

        Ok(())
    }
}

/// Per-user staking position
/// PDA: ["staker", pool, owner]
#[account]
#[derive(Default)]
pub struct Staker {
    /// The pool this position belongs to
    pub pool: Pubkey,

    /// Owner of this position
    pub owner: Pubkey,

    /// Principal tokens staked
    pub balance: u64,

    /// One entry per pool channel, same order as `Pool::channels`
    /// Grows lazily when the pool approves new reward tokens
    pub rewards: Vec<StakerReward>,

    /// PDA bump seed
    pub bump: u8,
}

impl Staker {
    /// Account size for allocation
    pub const SIZE: usize = 8 + // discriminator
        32 + // pool
        32 + // owner
        8 +  // balance
        4 + MAX_REWARD_TOKENS * StakerReward::SIZE + // rewards
        1 +  // bump
        32; // padding for future fields

    pub fn is_initialized(&self) -> bool {
        self.pool != Pubkey::default()
    }

    /// Fill in identity fields of a freshly created position
    pub fn init_if_new(&mut self, pool: Pubkey, owner: Pubkey, bump: u8) {
        if !self.is_initialized() {
            self.pool = pool;
            self.owner = owner;
            self.bump = bump;
        }
    }

    /// Settle every channel against its current multiplier.
    /// Must run before `balance` changes.
    pub fn settle(&mut self, channels: &[RewardChannel]) -> Result<()> {
        if self.rewards.len() < channels.len() {
            self.rewards.resize(channels.len(), StakerReward::default());
        }

        let balance = self.balance;
        for (reward, channel) in self.rewards.iter_mut().zip(channels) {
            reward.settle(channel.current_multiplier, balance)?;
        }

        Ok(())
    }

    /// Settle a single channel, leaving the others untouched.
    /// Entries for channels never settled start at multiplier 0, which is
    /// right because the balance has not changed since they were created.
    pub fn settle_channel(&mut self, index: usize, channel: &RewardChannel) -> Result<()> {
        if self.rewards.len() <= index {
            self.rewards.resize(index + 1, StakerReward::default());
        }

        let balance = self.balance;
        self.rewards[index].settle(channel.current_multiplier, balance)
    }

    /// Reset `owed` for a channel and return what was owed
    pub fn take_owed(&mut self, index: usize) -> u64 {
        match self.rewards.get_mut(index) {
            Some(reward) => std::mem::take(&mut reward.owed),
            None => 0,
        }
    }

    pub fn owed(&self, index: usize) -> u64 {
        self.rewards.get(index).map_or(0, |reward| reward.owed)
    }

    /// Claimable amount for a channel as of the channel's last settlement
    pub fn pending_reward(&self, index: usize, channel: &RewardChannel) -> Result<u64> {
        let reward = self.rewards.get(index).copied().unwrap_or_default();

        reward
            .owed
            .checked_add(reward.accrued(channel.current_multiplier, self.balance)?)
            .ok_or_else(|| error!(RewardsError::MathOverflow))
    }

    /// Record a deposit. Call `settle` first.
    pub fn record_deposit(&mut self, amount: u64) -> Result<()> {
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(RewardsError::MathOverflow)?;
        Ok(())
    }

    /// Record a withdrawal. Call `settle` first.
    pub fn record_withdraw(&mut self, amount: u64) -> Result<()> {
        require!(self.balance >= amount, RewardsError::InsufficientBalance);

        self.balance = self
            .balance
            .checked_sub(amount)
            .ok_or(RewardsError::MathUnderflow)?;
        Ok(())
    }
}
