use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::constants::{POOL_SEED, REWARD_VAULT_SEED};
use crate::error::RewardsError;
use crate::events::RewardTokenApproved;
use crate::instructions::pool_tokens::CpiPoolTokens;
use crate::ledger;
use crate::state::Pool;

// =============================================================================
// Approve New Reward Token
// =============================================================================

#[derive(Accounts)]
pub struct ApproveNewRewardToken<'info> {
    #[account(
        mut,
        constraint = pool.is_owner(&owner.key()) @ RewardsError::NotOwner
    )]
    pub owner: Signer<'info>,

    #[account(
        mut,
        seeds = [POOL_SEED, pool.principal_mint.as_ref(), pool.creator.as_ref()],
        bump = pool.bump
    )]
    pub pool: Account<'info, Pool>,

    pub reward_mint: Account<'info, Mint>,

    /// Created on first approval; an existing vault means the token is
    /// already approved and the handler rejects it
    #[account(
        init_if_needed,
        payer = owner,
        seeds = [REWARD_VAULT_SEED, pool.key().as_ref(), reward_mint.key().as_ref()],
        bump,
        token::mint = reward_mint,
        token::authority = pool
    )]
    pub reward_vault: Account<'info, TokenAccount>,

    pub system_program: Program<'info, System>,
    pub token_program: Program<'info, Token>,
}

pub fn approve_new_reward_token(ctx: Context<ApproveNewRewardToken>) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let pool_key = ctx.accounts.pool.key();
    let reward_mint = ctx.accounts.reward_mint.key();
    let reward_vault = ctx.accounts.reward_vault.key();

    let pool = &mut ctx.accounts.pool;
    pool.approve_new_reward_token(reward_mint, reward_vault, ctx.bumps.reward_vault, now)?;

    emit!(RewardTokenApproved {
        pool: pool_key,
        reward_mint,
        reward_vault,
    });

    msg!(
        "Reward token {} approved for pool {} ({} channels)",
        reward_mint,
        pool_key,
        pool.num_reward_tokens()
    );

    Ok(())
}

// =============================================================================
// Set Reward Source
// =============================================================================

#[derive(Accounts)]
pub struct SetRewardSource<'info> {
    #[account(
        constraint = pool.is_owner(&owner.key()) @ RewardsError::NotOwner
    )]
    pub owner: Signer<'info>,

    #[account(
        mut,
        seeds = [POOL_SEED, pool.principal_mint.as_ref(), pool.creator.as_ref()],
        bump = pool.bump
    )]
    pub pool: Account<'info, Pool>,
}

/// Point a channel at a new reservoir. No pull happens here: the new source
/// funds the window since the last pull.
pub fn set_reward_source(
    ctx: Context<SetRewardSource>,
    reward_mint: Pubkey,
    reward_source: Pubkey,
) -> Result<()> {
    let channel = ctx.accounts.pool.channel_mut(&reward_mint)?;
    let old_source = channel.reward_source;
    channel.reward_source = reward_source;

    msg!(
        "Reward source for {} updated from {} to {}",
        reward_mint,
        old_source,
        reward_source
    );

    Ok(())
}

// =============================================================================
// Set Reward Rate Per Second
// =============================================================================

#[derive(Accounts)]
pub struct SetRewardRatePerSecond<'info> {
    #[account(
        constraint = pool.is_owner(&owner.key()) @ RewardsError::NotOwner
    )]
    pub owner: Signer<'info>,

    #[account(
        mut,
        seeds = [POOL_SEED, pool.principal_mint.as_ref(), pool.creator.as_ref()],
        bump = pool.bump
    )]
    pub pool: Account<'info, Pool>,

    /// CHECK: Matched against the channel's vault before use
    #[account(mut)]
    pub reward_vault: UncheckedAccount<'info>,

    /// CHECK: Matched against the channel's source when one is set, ignored otherwise
    #[account(mut)]
    pub reward_source: UncheckedAccount<'info>,

    pub token_program: Program<'info, Token>,
}

/// Pull at the old rate up to now, then switch. Setting the rate to zero
/// pauses the channel without backfill on resume.
pub fn set_reward_rate_per_second(
    ctx: Context<SetRewardRatePerSecond>,
    reward_mint: Pubkey,
    reward_rate_per_second: u128,
) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let index = ctx.accounts.pool.channel_index(&reward_mint)?;
    let channel = ctx.accounts.pool.channels[index];

    let mut tokens = CpiPoolTokens::new(
        ctx.accounts.token_program.to_account_info(),
        ctx.accounts.pool.to_account_info(),
        &ctx.accounts.pool,
    )
    .with_channel(
        index,
        &channel,
        &ctx.accounts.reward_vault.to_account_info(),
        &ctx.accounts.reward_source.to_account_info(),
        None,
    )?;

    let pulled = ledger::set_reward_rate(
        &mut ctx.accounts.pool,
        &mut tokens,
        index,
        reward_rate_per_second,
        now,
    )?;

    msg!(
        "Reward rate for {} set from {} to {} (pulled {} at the old rate)",
        reward_mint,
        channel.reward_rate_per_second,
        reward_rate_per_second,
        pulled
    );
    if !ctx.accounts.pool.channels[index].is_active() {
        msg!("Channel {} is not streaming: rate or source unset", reward_mint);
    }

    Ok(())
}

// =============================================================================
// Transfer Ownership
// =============================================================================

#[derive(Accounts)]
pub struct TransferOwnership<'info> {
    #[account(
        constraint = pool.is_owner(&owner.key()) @ RewardsError::NotOwner
    )]
    pub owner: Signer<'info>,

    #[account(
        mut,
        seeds = [POOL_SEED, pool.principal_mint.as_ref(), pool.creator.as_ref()],
        bump = pool.bump
    )]
    pub pool: Account<'info, Pool>,

    /// CHECK: New owner address, validated by `Pool::transfer_ownership`
    pub new_owner: UncheckedAccount<'info>,
}

pub fn transfer_ownership(ctx: Context<TransferOwnership>) -> Result<()> {
    let old_owner = ctx.accounts.pool.owner;
    ctx.accounts
        .pool
        .transfer_ownership(ctx.accounts.new_owner.key())?;

    msg!(
        "Ownership transferred from {} to {}",
        old_owner,
        ctx.accounts.new_owner.key()
    );

    Ok(())
}
