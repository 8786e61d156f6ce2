use anchor_lang::prelude::*;

use crate::constants::MAX_REWARD_TOKENS;
use crate::error::RewardsError;
use crate::state::RewardChannel;

/// Which flavour of pool this is.
///
/// Both run the same accrual math over `Pool::channels`; they differ in how
/// channels come to exist and in how a zero claim is treated.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PoolKind {
    /// Exactly one channel, fixed at initialization
    #[default]
    SingleReward,
    /// Channels are added by the owner via approve_new_reward_token
    MultiReward,
}

impl PoolKind {
    /// Single-reward pools refuse claims that would pay nothing
    pub fn rejects_empty_claim(&self) -> bool {
        matches!(self, PoolKind::SingleReward)
    }
}

/// Pool state
/// PDA: ["pool", principal_mint, creator]
#[account]
#[derive(Default)]
pub struct Pool {
    /// Owner who configures reward sources and rates
    pub owner: Pubkey,

    /// Account that created the pool (part of the PDA seeds, never changes)
    pub creator: Pubkey,

    /// Principal token mint stakers lock
    pub principal_mint: Pubkey,

    /// Vault holding staked principal
    /// PDA: ["stake_vault", pool]
    pub stake_vault: Pubkey,

    pub kind: PoolKind,

    /// Total principal staked, kept equal to the sum of staker balances
    pub pool_size: u64,

    /// Reward channels in approval order
    pub channels: Vec<RewardChannel>,

    /// PDA bump seed
    pub bump: u8,

    /// Stake vault bump seed
    pub stake_vault_bump: u8,
}

impl Pool {
    /// Account size for allocation
    pub const SIZE: usize = 8 + // discriminator
        32 + // owner
        32 + // creator
        32 + // principal_mint
        32 + // stake_vault
        1 +  // kind
        8 +  // pool_size
        4 + MAX_REWARD_TOKENS * RewardChannel::SIZE + // channels
        1 +  // bump
        1 +  // stake_vault_bump
        64; // padding for future fields

    pub fn is_owner(&self, key: &Pubkey) -> bool {
        self.owner == *key
    }

    /// Hand the pool to `new_owner`. The default key and the current owner
    /// are rejected.
    pub fn transfer_ownership(&mut self, new_owner: Pubkey) -> Result<()> {
        require_keys_neq!(new_owner, Pubkey::default(), RewardsError::InvalidAuthority);
        require_keys_neq!(new_owner, self.owner, RewardsError::InvalidAuthority);

        self.owner = new_owner;
        Ok(())
    }

    pub fn num_reward_tokens(&self) -> usize {
        self.channels.len()
    }

    /// Mint of the channel at `index`
    pub fn reward_token(&self, index: usize) -> Option<Pubkey> {
        self.channels.get(index).map(|channel| channel.reward_mint)
    }

    pub fn channel_index(&self, reward_mint: &Pubkey) -> Result<usize> {
        self.channels
            .iter()
            .position(|channel| channel.reward_mint == *reward_mint)
            .ok_or_else(|| error!(RewardsError::TokenNotApproved))
    }

    pub fn channel_mut(&mut self, reward_mint: &Pubkey) -> Result<&mut RewardChannel> {
        let index = self.channel_index(reward_mint)?;
        Ok(&mut self.channels[index])
    }

    /// Open a new reward channel (rate 0, no source)
    pub fn add_reward_channel(
        &mut self,
        reward_mint: Pubkey,
        reward_vault: Pubkey,
        vault_bump: u8,
        now: i64,
    ) -> Result<()> {
        require!(
            reward_mint != self.principal_mint,
            RewardsError::TokenEqualsPrincipal
        );
        require!(
            self.channel_index(&reward_mint).is_err(),
            RewardsError::AlreadyApproved
        );
        require!(
            self.channels.len() < MAX_REWARD_TOKENS,
            RewardsError::RewardTokenLimitReached
        );

        self.channels
            .push(RewardChannel::new(reward_mint, reward_vault, vault_bump, now));

        Ok(())
    }

    /// Owner-only path for adding channels after initialization
    pub fn approve_new_reward_token(
        &mut self,
        reward_mint: Pubkey,
        reward_vault: Pubkey,
        vault_bump: u8,
        now: i64,
    ) -> Result<()> {
        require!(
            self.kind == PoolKind::MultiReward,
            RewardsError::NotMultiRewardPool
        );
        self.add_reward_channel(reward_mint, reward_vault, vault_bump, now)
    }

    pub fn record_deposit(&mut self, amount: u64) -> Result<()> {
        self.pool_size = self
            .pool_size
            .checked_add(amount)
            .ok_or(RewardsError::MathOverflow)?;
        Ok(())
    }

    pub fn record_withdraw(&mut self, amount: u64) -> Result<()> {
        self.pool_size = self
            .pool_size
            .checked_sub(amount)
            .ok_or(RewardsError::MathUnderflow)?;
        Ok(())
    }
}
