use anchor_lang::prelude::*;

pub mod constants;
pub mod error;
pub mod events;
pub mod instructions;
pub mod ledger;
pub mod state;

use instructions::*;

declare_id!("8L4thqasqBdtriDjXnBNJnTwYNixqA9iZoTnbdtbtr16");

#[program]
pub mod stream_rewards {
    use super::*;

    /// Initialize a single-reward pool
    ///
    /// # Arguments
    /// * `ctx` - Context containing all required accounts
    /// * `owner` - Account allowed to configure the pool
    /// * `reward_source` - Token account that funds the reward stream
    /// * `reward_rate_per_second` - Reward base units streamed per second
    ///
    pub fn initialize_pool(
        ctx: Context<InitializePool>,
        owner: Pubkey,
        reward_source: Pubkey,
        reward_rate_per_second: u128,
    ) -> Result<()> {
        instructions::initialize::handler_initialize_pool(ctx, owner, reward_source, reward_rate_per_second)
    }

    /// Initialize a multi-reward pool with no reward tokens yet
    ///
    /// # Arguments
    /// * `ctx` - Context containing all required accounts
    /// * `owner` - Account allowed to configure the pool
    ///
    pub fn initialize_multi_pool(ctx: Context<InitializeMultiPool>, owner: Pubkey) -> Result<()> {
        instructions::initialize::handler_initialize_multi_pool(ctx, owner)
    }

    /// Stake principal tokens
    ///
    /// # Arguments
    /// * `ctx` - Context containing all required accounts, channel accounts as remaining accounts
    /// * `amount` - Amount of principal to stake
    ///
    pub fn deposit<'info>(ctx: Context<'_, '_, 'info, 'info, Deposit<'info>>, amount: u64) -> Result<()> {
        instructions::deposit::handler_deposit(ctx, amount)
    }

    /// Unstake principal tokens
    ///
    /// # Arguments
    /// * `ctx` - Context containing all required accounts, channel accounts as remaining accounts
    /// * `amount` - Amount of principal to unstake
    ///
    pub fn withdraw<'info>(ctx: Context<'_, '_, 'info, 'info, Withdraw<'info>>, amount: u64) -> Result<()> {
        instructions::withdraw::handler_withdraw(ctx, amount)
    }

    /// Claim accrued rewards of one reward token
    ///
    /// # Arguments
    /// * `ctx` - Context containing all required accounts, channel accounts as remaining accounts
    ///
    pub fn claim<'info>(ctx: Context<'_, '_, 'info, 'info, Claim<'info>>) -> Result<()> {
        instructions::claim::handler_claim(ctx)
    }

    /// Claim accrued rewards of every reward token
    ///
    /// # Arguments
    /// * `ctx` - Context containing all required accounts, channel and payout accounts as remaining accounts
    ///
    pub fn claim_all_tokens<'info>(ctx: Context<'_, '_, 'info, 'info, ClaimAllTokens<'info>>) -> Result<()> {
        instructions::claim::handler_claim_all_tokens(ctx)
    }

    /// Unstake and claim every reward token in one settlement
    ///
    /// # Arguments
    /// * `ctx` - Context containing all required accounts, channel and payout accounts as remaining accounts
    /// * `amount` - Amount of principal to unstake
    ///
    pub fn withdraw_and_claim<'info>(
        ctx: Context<'_, '_, 'info, 'info, WithdrawAndClaim<'info>>,
        amount: u64,
    ) -> Result<()> {
        instructions::withdraw::handler_withdraw_and_claim(ctx, amount)
    }

    /// Pull every reward source and fold new funds into the multipliers
    ///
    /// Permissionless.
    pub fn ack_funds<'info>(ctx: Context<'_, '_, 'info, 'info, AckFunds<'info>>) -> Result<()> {
        instructions::pull::handler_ack_funds(ctx)
    }

    /// Pull one reward source into its vault
    ///
    /// Permissionless. The multiplier is not updated until the next ack.
    pub fn pull_reward_from_source(ctx: Context<PullRewardFromSource>, reward_mint: Pubkey) -> Result<()> {
        instructions::pull::handler_pull_reward_from_source(ctx, reward_mint)
    }

    /// Pull every reward source into its vault
    ///
    /// Permissionless. The multipliers are not updated until the next ack.
    pub fn pull_reward_from_source_all_tokens<'info>(
        ctx: Context<'_, '_, 'info, 'info, PullRewardFromSourceAllTokens<'info>>,
    ) -> Result<()> {
        instructions::pull::handler_pull_reward_from_source_all_tokens(ctx)
    }

    /// Change where a reward token is pulled from (owner only)
    ///
    /// # Arguments
    /// * `ctx` - Context containing all required accounts
    /// * `reward_mint` - Approved reward token
    /// * `reward_source` - New source token account
    ///
    pub fn set_reward_source(ctx: Context<SetRewardSource>, reward_mint: Pubkey, reward_source: Pubkey) -> Result<()> {
        instructions::admin::set_reward_source(ctx, reward_mint, reward_source)
    }

    /// Change the streaming rate of a reward token (owner only)
    ///
    /// A rate of zero pauses the stream.
    ///
    /// # Arguments
    /// * `ctx` - Context containing all required accounts
    /// * `reward_mint` - Approved reward token
    /// * `reward_rate_per_second` - Reward base units streamed per second
    ///
    pub fn set_reward_rate_per_second(
        ctx: Context<SetRewardRatePerSecond>,
        reward_mint: Pubkey,
        reward_rate_per_second: u128,
    ) -> Result<()> {
        instructions::admin::set_reward_rate_per_second(ctx, reward_mint, reward_rate_per_second)
    }

    /// Add a reward token to a multi-reward pool (owner only)
    ///
    /// # Arguments
    /// * `ctx` - Context containing all required accounts
    ///
    pub fn approve_new_reward_token(ctx: Context<ApproveNewRewardToken>) -> Result<()> {
        instructions::admin::approve_new_reward_token(ctx)
    }

    /// Transfer pool ownership to a new address (owner only)
    ///
    /// # Arguments
    /// * `ctx` - Context containing all required accounts
    ///
    pub fn transfer_ownership(ctx: Context<TransferOwnership>) -> Result<()> {
        instructions::admin::transfer_ownership(ctx)
    }

    /// Reward due since the last pull that has not reached the vault yet
    ///
    /// # Arguments
    /// * `ctx` - Context containing all required accounts
    /// * `reward_mint` - Approved reward token
    ///
    pub fn reward_not_transferred(ctx: Context<RewardNotTransferred>, reward_mint: Pubkey) -> Result<u64> {
        instructions::pull::handler_reward_not_transferred(ctx, reward_mint)
    }

    /// Amount a reward source can still fund beyond what is already due
    ///
    /// # Arguments
    /// * `ctx` - Context containing all required accounts
    /// * `reward_mint` - Approved reward token
    ///
    pub fn reward_left(ctx: Context<RewardLeft>, reward_mint: Pubkey) -> Result<u64> {
        instructions::pull::handler_reward_left(ctx, reward_mint)
    }
}
