use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::constants::{POOL_SEED, STAKER_SEED};
use crate::events;
use crate::instructions::pool_tokens::CpiPoolTokens;
use crate::ledger;
use crate::state::{Pool, Staker};

/// Claim rewards of one reward token
///
/// # Arguments
/// * `ctx` - The context containing all accounts
///
/// # Remaining accounts
/// `[reward_vault, reward_source]` for every channel, in channel order
///
/// # Flow
/// 1. Pull and fold every channel
/// 2. Settle the claimed channel for this staker
/// 3. Reset owed and lower the channel's expected vault balance
/// 4. Transfer the reward to the user
///
/// A zero payout fails on single-reward pools and is a no-op on
/// multi-reward pools.
#[derive(Accounts)]
pub struct Claim<'info> {
    #[account(mut)]
    pub user: Signer<'info>,

    #[account(
        mut,
        seeds = [POOL_SEED, pool.principal_mint.as_ref(), pool.creator.as_ref()],
        bump = pool.bump
    )]
    pub pool: Account<'info, Pool>,

    /// Created empty when the user never staked, so the claim resolves
    /// through the regular zero-payout rules
    #[account(
        init_if_needed,
        payer = user,
        space = Staker::SIZE,
        seeds = [STAKER_SEED, pool.key().as_ref(), user.key().as_ref()],
        bump
    )]
    pub staker: Account<'info, Staker>,

    pub reward_mint: Account<'info, Mint>,

    #[account(
        mut,
        token::mint = reward_mint,
        token::authority = user
    )]
    pub user_reward_account: Account<'info, TokenAccount>,

    pub system_program: Program<'info, System>,
    pub token_program: Program<'info, Token>,
}

pub fn handler_claim<'info>(ctx: Context<'_, '_, 'info, 'info, Claim<'info>>) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let pool_key = ctx.accounts.pool.key();
    let user_key = ctx.accounts.user.key();
    let reward_mint = ctx.accounts.reward_mint.key();

    ctx.accounts
        .staker
        .init_if_new(pool_key, user_key, ctx.bumps.staker);

    let index = ctx.accounts.pool.channel_index(&reward_mint)?;

    let mut tokens = CpiPoolTokens::new(
        ctx.accounts.token_program.to_account_info(),
        ctx.accounts.pool.to_account_info(),
        &ctx.accounts.pool,
    )
    .with_remaining_accounts(&ctx.accounts.pool, ctx.remaining_accounts, None)?
    .with_recipient(index, ctx.accounts.user_reward_account.to_account_info())?;

    let paid = ledger::claim(
        &mut ctx.accounts.pool,
        &mut ctx.accounts.staker,
        &mut tokens,
        index,
        now,
    )?;

    if paid > 0 {
        emit!(events::Claim {
            pool: pool_key,
            user: user_key,
            reward_mint,
            amount: paid,
        });
    }

    msg!("Claimed {} of reward token {}", paid, reward_mint);

    Ok(())
}

/// Claim rewards of every reward token
///
/// # Remaining accounts
/// `[reward_vault, reward_source, user_reward_account]` for every channel,
/// in channel order
#[derive(Accounts)]
pub struct ClaimAllTokens<'info> {
    #[account(mut)]
    pub user: Signer<'info>,

    #[account(
        mut,
        seeds = [POOL_SEED, pool.principal_mint.as_ref(), pool.creator.as_ref()],
        bump = pool.bump
    )]
    pub pool: Account<'info, Pool>,

    #[account(
        init_if_needed,
        payer = user,
        space = Staker::SIZE,
        seeds = [STAKER_SEED, pool.key().as_ref(), user.key().as_ref()],
        bump
    )]
    pub staker: Account<'info, Staker>,

    pub system_program: Program<'info, System>,
    pub token_program: Program<'info, Token>,
}

pub fn handler_claim_all_tokens<'info>(
    ctx: Context<'_, '_, 'info, 'info, ClaimAllTokens<'info>>,
) -> Result<()> {
    let now = Clock::get()?.unix_timestamp;
    let pool_key = ctx.accounts.pool.key();
    let user_key = ctx.accounts.user.key();

    ctx.accounts
        .staker
        .init_if_new(pool_key, user_key, ctx.bumps.staker);

    let mut tokens = CpiPoolTokens::new(
        ctx.accounts.token_program.to_account_info(),
        ctx.accounts.pool.to_account_info(),
        &ctx.accounts.pool,
    )
    .with_remaining_accounts(&ctx.accounts.pool, ctx.remaining_accounts, Some(user_key))?;

    let payouts = ledger::claim_all(
        &mut ctx.accounts.pool,
        &mut ctx.accounts.staker,
        &mut tokens,
        now,
    )?;

    emit_claims(&ctx.accounts.pool, pool_key, user_key, &payouts);

    msg!(
        "Claimed {} of {} reward tokens",
        payouts.iter().filter(|paid| **paid > 0).count(),
        payouts.len()
    );

    Ok(())
}

/// One `Claim` event per non-zero payout
pub(crate) fn emit_claims(pool: &Pool, pool_key: Pubkey, user: Pubkey, payouts: &[u64]) {
    for (index, paid) in payouts.iter().enumerate() {
        if *paid == 0 {
            continue;
        }
        if let Some(reward_mint) = pool.reward_token(index) {
            emit!(events::Claim {
                pool: pool_key,
                user,
                reward_mint,
                amount: *paid,
            });
        }
    }
}
