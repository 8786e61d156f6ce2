use anchor_lang::prelude::*;

use crate::constants::MULTIPLIER_PRECISION;
use crate::error::RewardsError;

/// What a reward source can currently hand over to the pool.
///
/// `allowance` is what the source delegated to the pool PDA, `balance` is
/// what the source actually holds. A source that cannot be read counts as
/// `SourceFunds::default()`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SourceFunds {
    pub allowance: u64,
    pub balance: u64,
}

impl SourceFunds {
    pub fn available(&self) -> u64 {
        self.allowance.min(self.balance)
    }
}

/// Per-reward-token accrual state, stored inline in the pool
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RewardChannel {
    /// Reward token mint
    pub reward_mint: Pubkey,

    /// Pool-owned vault holding this channel's rewards
    /// PDA: ["reward_vault", pool, reward_mint]
    pub reward_vault: Pubkey,

    /// Token account rewards are pulled from (default key = unset)
    /// The pool PDA must be its delegate for pulls to move anything
    pub reward_source: Pubkey,

    /// Reward base units streamed per second
    pub reward_rate_per_second: u128,

    /// Last time the source was pulled (or the rate changed)
    pub last_pull_timestamp: i64,

    /// Vault balance observed at the last settlement
    pub balance_before: u64,

    /// Accumulated reward per staked unit (scaled by MULTIPLIER_PRECISION)
    /// Never decreases
    pub current_multiplier: u128,

    /// Total rewards pulled from sources (lifetime)
    pub total_pulled: u64,

    /// Total rewards paid out to stakers (lifetime)
    pub total_claimed: u64,

    /// Reward vault bump seed
    pub vault_bump: u8,
}

impl RewardChannel {
    pub const SIZE: usize = 32 + // reward_mint
        32 + // reward_vault
        32 + // reward_source
        16 + // reward_rate_per_second (u128)
        8 +  // last_pull_timestamp
        8 +  // balance_before
        16 + // current_multiplier (u128)
        8 +  // total_pulled
        8 +  // total_claimed
        1; // vault_bump

    /// New channel in the approved-but-idle state: no source, rate 0
    pub fn new(reward_mint: Pubkey, reward_vault: Pubkey, vault_bump: u8, now: i64) -> Self {
        Self {
            reward_mint,
            reward_vault,
            reward_source: Pubkey::default(),
            reward_rate_per_second: 0,
            last_pull_timestamp: now,
            balance_before: 0,
            current_multiplier: 0,
            total_pulled: 0,
            total_claimed: 0,
            vault_bump,
        }
    }

    pub fn has_source(&self) -> bool {
        self.reward_source != Pubkey::default()
    }

    /// Rate > 0 and a source to pull from
    pub fn is_active(&self) -> bool {
        self.reward_rate_per_second > 0 && self.has_source()
    }

    /// Reward the rate allows for the window since the last pull:
    /// rate * elapsed, saturating at u64::MAX.
    pub fn reward_due(&self, now: i64) -> u64 {
        let elapsed = now.saturating_sub(self.last_pull_timestamp);
        if elapsed <= 0 || self.reward_rate_per_second == 0 {
            return 0;
        }

        let due = self
            .reward_rate_per_second
            .saturating_mul(elapsed as u128);

        due.min(u64::MAX as u128) as u64
    }

    /// Amount to pull now: min(due, allowance, source balance)
    pub fn pullable_amount(&self, now: i64, funds: SourceFunds) -> u64 {
        if !self.has_source() {
            return 0;
        }
        self.reward_due(now).min(funds.available())
    }

    /// Close the pull window at `now`. Whatever was due but not pulled is forfeited.
    pub fn record_pull(&mut self, now: i64, pulled: u64) -> Result<()> {
        if now > self.last_pull_timestamp {
            self.last_pull_timestamp = now;
        }

        self.total_pulled = self
            .total_pulled
            .checked_add(pulled)
            .ok_or(RewardsError::MathOverflow)?;

        Ok(())
    }

    /// Fold newly arrived funds into the multiplier
    /// Formula: current_multiplier += (actual_balance - balance_before) * PRECISION / pool_size
    ///
    /// With an empty pool the backlog is kept out of balance_before so the
    /// first settlement that sees stake hands it out.
    pub fn ack_funds(&mut self, actual_balance: u64, pool_size: u64) -> Result<()> {
        if actual_balance <= self.balance_before {
            // Funds left the vault without a claim, nothing to distribute
            self.balance_before = actual_balance;
            return Ok(());
        }

        if pool_size == 0 {
            return Ok(());
        }

        let delta = actual_balance - self.balance_before;

        let multiplier_increase = (delta as u128)
            .checked_mul(MULTIPLIER_PRECISION)
            .ok_or(RewardsError::MathOverflow)?
            .checked_div(pool_size as u128)
            .ok_or(RewardsError::DivisionByZero)?;

        self.current_multiplier = self
            .current_multiplier
            .checked_add(multiplier_increase)
            .ok_or(RewardsError::MathOverflow)?;

        self.balance_before = actual_balance;

        Ok(())
    }

    /// Account for a payout leaving the vault so the next ack does not see it
    /// as a negative delta.
    pub fn record_payout(&mut self, amount: u64) -> Result<()> {
        self.balance_before = self
            .balance_before
            .checked_sub(amount)
            .ok_or(RewardsError::MathUnderflow)?;

        self.total_claimed = self
            .total_claimed
            .checked_add(amount)
            .ok_or(RewardsError::MathOverflow)?;

        Ok(())
    }

    /// Switch to a new rate. The caller pulls at the old rate first;
    /// the window restarts here so a paused interval is never backfilled.
    pub fn set_rate(&mut self, reward_rate_per_second: u128, now: i64) {
        self.reward_rate_per_second = reward_rate_per_second;
        if now > self.last_pull_timestamp {
            self.last_pull_timestamp = now;
        }
    }

    /// What the source can still fund after the amount already due is pulled
    pub fn reward_left(&self, now: i64, funds: SourceFunds) -> u64 {
        if !self.has_source() {
            return 0;
        }
        let available = funds.available();
        available.saturating_sub(self.reward_due(now).min(available))
    }
}
