use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::constants::{POOL_SEED, REWARD_VAULT_SEED, STAKE_VAULT_SEED};
use crate::error::RewardsError;
use crate::events::PoolCreated;
use crate::state::{Pool, PoolKind};

/// Initialize a single-reward pool
///
/// # Accounts
/// * `creator` - Pays for the accounts, part of the pool PDA seeds
/// * `pool` - The pool PDA to create
/// * `principal_mint` - Token stakers lock
/// * `reward_mint` - The one token this pool streams
/// * `stake_vault` - Vault to hold staked principal
/// * `reward_vault` - Vault the reward source streams into
///
#[derive(Accounts)]
pub struct InitializePool<'info> {
    #[account(mut)]
    pub creator: Signer<'info>,

    #[account(
        init,
        payer = creator,
        space = Pool::SIZE,
        seeds = [POOL_SEED, principal_mint.key().as_ref(), creator.key().as_ref()],
        bump
    )]
    pub pool: Account<'info, Pool>,

    pub principal_mint: Account<'info, Mint>,

    #[account(
        constraint = reward_mint.key() != principal_mint.key() @ RewardsError::TokenEqualsPrincipal
    )]
    pub reward_mint: Account<'info, Mint>,

    #[account(
        init,
        payer = creator,
        seeds = [STAKE_VAULT_SEED, pool.key().as_ref()],
        bump,
        token::mint = principal_mint,
        token::authority = pool
    )]
    pub stake_vault: Account<'info, TokenAccount>,

    #[account(
        init,
        payer = creator,
        seeds = [REWARD_VAULT_SEED, pool.key().as_ref(), reward_mint.key().as_ref()],
        bump,
        token::mint = reward_mint,
        token::authority = pool
    )]
    pub reward_vault: Account<'info, TokenAccount>,

    pub system_program: Program<'info, System>,
    pub token_program: Program<'info, Token>,
}

pub fn handler_initialize_pool(
    ctx: Context<InitializePool>,
    owner: Pubkey,
    reward_source: Pubkey,
    reward_rate_per_second: u128,
) -> Result<()> {
    require_keys_neq!(owner, Pubkey::default(), RewardsError::InvalidAuthority);

    let now = Clock::get()?.unix_timestamp;
    let pool_key = ctx.accounts.pool.key();
    let pool = &mut ctx.accounts.pool;

    init_pool_state(
        pool,
        PoolKind::SingleReward,
        owner,
        ctx.accounts.creator.key(),
        ctx.accounts.principal_mint.key(),
        ctx.accounts.stake_vault.key(),
        ctx.bumps.pool,
        ctx.bumps.stake_vault,
    );

    pool.add_reward_channel(
        ctx.accounts.reward_mint.key(),
        ctx.accounts.reward_vault.key(),
        ctx.bumps.reward_vault,
        now,
    )?;

    let channel = &mut pool.channels[0];
    channel.reward_source = reward_source;
    channel.set_rate(reward_rate_per_second, now);

    emit!(PoolCreated {
        pool: pool_key,
        principal_mint: pool.principal_mint,
        owner,
        kind: PoolKind::SingleReward,
    });

    msg!("Single-reward pool initialized: {}", pool_key);
    msg!("Principal mint: {}", pool.principal_mint);
    msg!("Reward mint: {}", ctx.accounts.reward_mint.key());
    msg!("Rate per second: {}", reward_rate_per_second);

    Ok(())
}

/// Initialize a multi-reward pool with no reward channels
///
/// Reward tokens are added afterwards by the owner through
/// `approve_new_reward_token`.
#[derive(Accounts)]
pub struct InitializeMultiPool<'info> {
    #[account(mut)]
    pub creator: Signer<'info>,

    #[account(
        init,
        payer = creator,
        space = Pool::SIZE,
        seeds = [POOL_SEED, principal_mint.key().as_ref(), creator.key().as_ref()],
        bump
    )]
    pub pool: Account<'info, Pool>,

    pub principal_mint: Account<'info, Mint>,

    #[account(
        init,
        payer = creator,
        seeds = [STAKE_VAULT_SEED, pool.key().as_ref()],
        bump,
        token::mint = principal_mint,
        token::authority = pool
    )]
    pub stake_vault: Account<'info, TokenAccount>,

    pub system_program: Program<'info, System>,
    pub token_program: Program<'info, Token>,
}

pub fn handler_initialize_multi_pool(ctx: Context<InitializeMultiPool>, owner: Pubkey) -> Result<()> {
    require_keys_neq!(owner, Pubkey::default(), RewardsError::InvalidAuthority);

    let pool_key = ctx.accounts.pool.key();
    let pool = &mut ctx.accounts.pool;

    init_pool_state(
        pool,
        PoolKind::MultiReward,
        owner,
        ctx.accounts.creator.key(),
        ctx.accounts.principal_mint.key(),
        ctx.accounts.stake_vault.key(),
        ctx.bumps.pool,
        ctx.bumps.stake_vault,
    );

    emit!(PoolCreated {
        pool: pool_key,
        principal_mint: pool.principal_mint,
        owner,
        kind: PoolKind::MultiReward,
    });

    msg!("Multi-reward pool initialized: {}", pool_key);
    msg!("Principal mint: {}", pool.principal_mint);
    msg!("Owner: {}", owner);

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn init_pool_state(
    pool: &mut Pool,
    kind: PoolKind,
    owner: Pubkey,
    creator: Pubkey,
    principal_mint: Pubkey,
    stake_vault: Pubkey,
    bump: u8,
    stake_vault_bump: u8,
) {
    pool.owner = owner;
    pool.creator = creator;
    pool.principal_mint = principal_mint;
    pool.stake_vault = stake_vault;
    pool.kind = kind;
    pool.pool_size = 0;
    pool.channels = Vec::new();
    pool.bump = bump;
    pool.stake_vault_bump = stake_vault_bump;
}
