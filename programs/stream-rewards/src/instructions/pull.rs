use anchor_lang::prelude::*;
use anchor_spl::token::Token;

use crate::constants::POOL_SEED;
use crate::instructions::pool_tokens::CpiPoolTokens;
use crate::ledger;
use crate::state::Pool;

// =============================================================================
// Ack Funds
// =============================================================================
// Permissionless. Pulls every channel and folds whatever reached the vaults
// into the multipliers, so stakers see accrual without touching their stake.

#[derive(Accounts)]
pub struct AckFunds<'info> {
    #[account(
        mut,
        seeds = [POOL_SEED, pool.principal_mint.as_ref(), pool.creator.as_ref()],
        bump = pool.bump
    )]
    pub pool: Account<'info, Pool>,

    pub token_program: Program<'info, Token>,
}

pub fn handler_ack_funds<'info>(ctx: Context<'_, '_, 'info, 'info, AckFunds<'info>>) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;

    let mut tokens = CpiPoolTokens::new(
        ctx.accounts.token_program.to_account_info(),
        ctx.accounts.pool.to_account_info(),
        &ctx.accounts.pool,
    )
    .with_remaining_accounts(&ctx.accounts.pool, ctx.remaining_accounts, None)?;

    ledger::ack_funds(&mut ctx.accounts.pool, &mut tokens, now)?;

    msg!(
        "Funds acknowledged for {} channels, pool size {}",
        ctx.accounts.pool.num_reward_tokens(),
        ctx.accounts.pool.pool_size
    );

    Ok(())
}

// =============================================================================
// Pull Reward From Source
// =============================================================================
// Permissionless. Moves what is due from one source into its vault without
// touching the multiplier; the next ack folds it in.

#[derive(Accounts)]
pub struct PullRewardFromSource<'info> {
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

pub fn handler_pull_reward_from_source(
    ctx: Context<PullRewardFromSource>,
    reward_mint: Pubkey,
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

    let pulled = ledger::pull_channel(
        &mut ctx.accounts.pool.channels[index],
        index,
        &mut tokens,
        now,
    )?;

    msg!("Pulled {} of reward token {}", pulled, reward_mint);

    Ok(())
}

#[derive(Accounts)]
pub struct PullRewardFromSourceAllTokens<'info> {
    #[account(
        mut,
        seeds = [POOL_SEED, pool.principal_mint.as_ref(), pool.creator.as_ref()],
        bump = pool.bump
    )]
    pub pool: Account<'info, Pool>,

    pub token_program: Program<'info, Token>,
}

pub fn handler_pull_reward_from_source_all_tokens<'info>(
    ctx: Context<'_, '_, 'info, 'info, PullRewardFromSourceAllTokens<'info>>,
) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;

    let mut tokens = CpiPoolTokens::new(
        ctx.accounts.token_program.to_account_info(),
        ctx.accounts.pool.to_account_info(),
        &ctx.accounts.pool,
    )
    .with_remaining_accounts(&ctx.accounts.pool, ctx.remaining_accounts, None)?;

    let pulled = ledger::pull_all(&mut ctx.accounts.pool, &mut tokens, now)?;

    msg!(
        "Pulled {} in total across {} channels",
        pulled,
        ctx.accounts.pool.num_reward_tokens()
    );

    Ok(())
}

// =============================================================================
// Reward Not Transferred
// =============================================================================

#[derive(Accounts)]
pub struct RewardNotTransferred<'info> {
    #[account(
        seeds = [POOL_SEED, pool.principal_mint.as_ref(), pool.creator.as_ref()],
        bump = pool.bump
    )]
    pub pool: Account<'info, Pool>,
}

/// Reward due since the last pull, returned as return data.
/// Reads zero right after a pull.
pub fn handler_reward_not_transferred(
    ctx: Context<RewardNotTransferred>,
    reward_mint: Pubkey,
) -> Result<u64> {
    let now = Clock::get()?.unix_timestamp;
    let index = ctx.accounts.pool.channel_index(&reward_mint)?;

    let due = ledger::reward_not_transferred(&ctx.accounts.pool, index, now)?;

    msg!("Reward not transferred for {}: {}", reward_mint, due);

    Ok(due)
}

// =============================================================================
// Reward Left
// =============================================================================

#[derive(Accounts)]
pub struct RewardLeft<'info> {
    #[account(
        seeds = [POOL_SEED, pool.principal_mint.as_ref(), pool.creator.as_ref()],
        bump = pool.bump
    )]
    pub pool: Account<'info, Pool>,

    /// CHECK: Matched against the channel's vault before use
    pub reward_vault: UncheckedAccount<'info>,

    /// CHECK: Matched against the channel's source when one is set, ignored otherwise
    pub reward_source: UncheckedAccount<'info>,

    pub token_program: Program<'info, Token>,
}

/// What the channel's source can still fund after the reward already due.
/// Returned to the caller as return data.
pub fn handler_reward_left(ctx: Context<RewardLeft>, reward_mint: Pubkey) -> Result<u64> {
    let now = Clock::get()?.unix_timestamp;
    let index = ctx.accounts.pool.channel_index(&reward_mint)?;
    let channel = ctx.accounts.pool.channels[index];

    let tokens = CpiPoolTokens::new(
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

    let left = ledger::reward_left(&ctx.accounts.pool, &tokens, index, now)?;

    msg!("Reward left for {}: {}", reward_mint, left);

    Ok(left)
}
