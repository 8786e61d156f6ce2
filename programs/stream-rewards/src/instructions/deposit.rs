use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::constants::{POOL_SEED, STAKER_SEED, STAKE_VAULT_SEED};
use crate::error::RewardsError;
use crate::events;
use crate::instructions::pool_tokens::{CpiPoolTokens, PrincipalAccounts};
use crate::ledger;
use crate::state::{Pool, Staker};

/// Stake principal tokens
///
/// # Arguments
/// * `ctx` - The context containing all accounts
/// * `amount` - Amount of principal to stake
///
/// # Remaining accounts
/// `[reward_vault, reward_source]` for every channel, in channel order
///
/// # Flow
/// 1. Validate amount and that the user has principal to give
/// 2. Pull every channel and fold new funds into the multipliers
/// 3. Settle the staker against the fresh multipliers
/// 4. Update staker and pool balances
/// 5. Transfer principal from user to stake vault
///
#[derive(Accounts)]
pub struct Deposit<'info> {
    /// User staking their principal tokens
    #[account(mut)]
    pub user: Signer<'info>,

    #[account(
        mut,
        seeds = [POOL_SEED, pool.principal_mint.as_ref(), pool.creator.as_ref()],
        bump = pool.bump
    )]
    pub pool: Account<'info, Pool>,

    /// User's staker account (created if first time)
    #[account(
        init_if_needed,
        payer = user,
        space = Staker::SIZE,
        seeds = [STAKER_SEED, pool.key().as_ref(), user.key().as_ref()],
        bump
    )]
    pub staker: Account<'info, Staker>,

    #[account(
        constraint = principal_mint.key() == pool.principal_mint @ RewardsError::InvalidPrincipalMint
    )]
    pub principal_mint: Account<'info, Mint>,

    #[account(
        mut,
        token::mint = principal_mint,
        token::authority = user
    )]
    pub user_principal_account: Account<'info, TokenAccount>,

    #[account(
        mut,
        seeds = [STAKE_VAULT_SEED, pool.key().as_ref()],
        bump = pool.stake_vault_bump,
        token::mint = principal_mint,
        token::authority = pool
    )]
    pub stake_vault: Account<'info, TokenAccount>,

    pub system_program: Program<'info, System>,
    pub token_program: Program<'info, Token>,
}

pub fn handler_deposit<'info>(
    ctx: Context<'_, '_, 'info, 'info, Deposit<'info>>,
    amount: u64,
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
    .with_remaining_accounts(&ctx.accounts.pool, ctx.remaining_accounts, None)?
    .with_principal(PrincipalAccounts {
        user: ctx.accounts.user.to_account_info(),
        user_principal_account: ctx.accounts.user_principal_account.to_account_info(),
        user_principal_balance: ctx.accounts.user_principal_account.amount,
        stake_vault: ctx.accounts.stake_vault.to_account_info(),
    });

    let new_balance = ledger::deposit(
        &mut ctx.accounts.pool,
        &mut ctx.accounts.staker,
        &mut tokens,
        amount,
        now,
    )?;

    emit!(events::Deposit {
        pool: pool_key,
        user: user_key,
        amount,
        new_balance,
    });

    msg!(
        "Deposited {}. User balance: {}, Pool size: {}",
        amount,
        new_balance,
        ctx.accounts.pool.pool_size
    );

    Ok(())
}
