// =============================================================================
// Accrual Ledger
// =============================================================================
// Every state-changing entry point goes through here:
//
//   1. pull each channel's source up to `now`
//   2. fold the vault delta of each channel into its multiplier
//   3. settle the staker against the fresh multipliers
//   4. mutate pool / staker / channel state
//   5. move tokens
//
// Steps 4 and 5 never swap: all bookkeeping is final before an outbound
// transfer is issued. Token movement goes through `PoolTokens`, implemented
// with SPL token CPIs by the instruction layer.
// =============================================================================

use anchor_lang::prelude::*;

use crate::error::RewardsError;
use crate::state::{Pool, RewardChannel, SourceFunds, Staker};

#[cfg(test)]
mod tests;

/// Token movements and balance reads the ledger needs. Channels are
/// addressed by their index in `Pool::channels`.
pub trait PoolTokens {
    /// Current balance of the channel's reward vault
    fn reward_balance(&self, channel: usize) -> Result<u64>;

    /// Allowance and balance of the channel's reward source.
    /// Anything unreadable reports zero funds.
    fn source_funds(&self, channel: usize) -> SourceFunds;

    /// Move `amount` from the reward source into the reward vault
    fn pull_reward(&mut self, channel: usize, amount: u64) -> Result<()>;

    /// Move `amount` from the reward vault to the claiming user
    fn pay_reward(&mut self, channel: usize, amount: u64) -> Result<()>;

    /// What the depositor lets the pool take from their principal account
    fn principal_allowance(&self) -> u64;

    /// Move principal from the depositor into the stake vault
    fn deposit_principal(&mut self, amount: u64) -> Result<()>;

    /// Move principal from the stake vault back to the user
    fn withdraw_principal(&mut self, amount: u64) -> Result<()>;
}

/// Pull one channel's source. Returns the amount pulled.
///
/// The window closes whether or not anything moved. On-chain the
/// best-effort part comes from `source_funds`: a source that is unset,
/// unreadable, frozen, of the wrong mint or without a delegation to the pool
/// reports zero, so no transfer is attempted. A token CPI that is attempted
/// and fails aborts the whole transaction; the `Err` branch below only
/// matters for `PoolTokens` implementations that can fail softly.
pub fn pull_channel<T: PoolTokens>(
    channel: &mut RewardChannel,
    index: usize,
    tokens: &mut T,
    now: i64,
) -> Result<u64> {
    let amount = channel.pullable_amount(now, tokens.source_funds(index));

    let pulled = if amount > 0 && tokens.pull_reward(index, amount).is_ok() {
        amount
    } else {
        0
    };

    channel.record_pull(now, pulled)?;

    Ok(pulled)
}

/// Pull every channel without settling
pub fn pull_all<T: PoolTokens>(pool: &mut Pool, tokens: &mut T, now: i64) -> Result<u64> {
    let mut total: u64 = 0;
    for (index, channel) in pool.channels.iter_mut().enumerate() {
        let pulled = pull_channel(channel, index, tokens, now)?;
        total = total.saturating_add(pulled);
    }
    Ok(total)
}

/// Pull every channel and fold what arrived into the multipliers
pub fn ack_funds<T: PoolTokens>(pool: &mut Pool, tokens: &mut T, now: i64) -> Result<()> {
    let pool_size = pool.pool_size;

    for (index, channel) in pool.channels.iter_mut().enumerate() {
        pull_channel(channel, index, tokens, now)?;
        channel.ack_funds(tokens.reward_balance(index)?, pool_size)?;
    }

    Ok(())
}

/// Stake `amount` of principal. Returns the staker's new balance.
pub fn deposit<T: PoolTokens>(
    pool: &mut Pool,
    staker: &mut Staker,
    tokens: &mut T,
    amount: u64,
    now: i64,
) -> Result<u64> {
    require!(amount > 0, RewardsError::InvalidAmount);
    require!(tokens.principal_allowance() > 0, RewardsError::NoAllowance);

    ack_funds(pool, tokens, now)?;
    staker.settle(&pool.channels)?;

    staker.record_deposit(amount)?;
    pool.record_deposit(amount)?;

    tokens.deposit_principal(amount)?;

    Ok(staker.balance)
}

/// Unstake `amount` of principal. Returns the staker's new balance.
pub fn withdraw<T: PoolTokens>(
    pool: &mut Pool,
    staker: &mut Staker,
    tokens: &mut T,
    amount: u64,
    now: i64,
) -> Result<u64> {
    check_withdraw(staker, amount)?;

    ack_funds(pool, tokens, now)?;
    staker.settle(&pool.channels)?;

    record_withdraw(pool, staker, amount)?;

    tokens.withdraw_principal(amount)?;

    Ok(staker.balance)
}

/// Claim one channel. Returns the amount paid.
pub fn claim<T: PoolTokens>(
    pool: &mut Pool,
    staker: &mut Staker,
    tokens: &mut T,
    index: usize,
    now: i64,
) -> Result<u64> {
    require!(
        index < pool.channels.len(),
        RewardsError::TokenNotApproved
    );

    ack_funds(pool, tokens, now)?;
    staker.settle_channel(index, &pool.channels[index])?;

    let payable = record_payout(pool, staker, index)?;
    if payable == 0 {
        require!(
            !pool.kind.rejects_empty_claim(),
            RewardsError::NothingToClaim
        );
        return Ok(0);
    }

    tokens.pay_reward(index, payable)?;

    Ok(payable)
}

/// Claim every channel. Returns the amount paid per channel.
pub fn claim_all<T: PoolTokens>(
    pool: &mut Pool,
    staker: &mut Staker,
    tokens: &mut T,
    now: i64,
) -> Result<Vec<u64>> {
    ack_funds(pool, tokens, now)?;
    staker.settle(&pool.channels)?;

    let payouts = record_all_payouts(pool, staker)?;
    if payouts.iter().all(|payable| *payable == 0) {
        require!(
            !pool.kind.rejects_empty_claim(),
            RewardsError::NothingToClaim
        );
    }

    pay_all(tokens, &payouts)?;

    Ok(payouts)
}

/// Withdraw and claim every channel in one settlement pass.
/// Returns the new balance and the amount paid per channel.
pub fn withdraw_and_claim<T: PoolTokens>(
    pool: &mut Pool,
    staker: &mut Staker,
    tokens: &mut T,
    amount: u64,
    now: i64,
) -> Result<(u64, Vec<u64>)> {
    check_withdraw(staker, amount)?;

    ack_funds(pool, tokens, now)?;
    staker.settle(&pool.channels)?;

    record_withdraw(pool, staker, amount)?;
    let payouts = record_all_payouts(pool, staker)?;

    tokens.withdraw_principal(amount)?;
    pay_all(tokens, &payouts)?;

    Ok((staker.balance, payouts))
}

/// What the channel's source can still fund
pub fn reward_left<T: PoolTokens>(pool: &Pool, tokens: &T, index: usize, now: i64) -> Result<u64> {
    let channel = pool
        .channels
        .get(index)
        .ok_or(RewardsError::TokenNotApproved)?;

    Ok(channel.reward_left(now, tokens.source_funds(index)))
}

/// Reward the rate has made due since the channel's last pull, whether or
/// not the source can cover it
pub fn reward_not_transferred(pool: &Pool, index: usize, now: i64) -> Result<u64> {
    let channel = pool
        .channels
        .get(index)
        .ok_or(RewardsError::TokenNotApproved)?;

    Ok(channel.reward_due(now))
}

/// Pull the channel at the old rate, then switch rates
pub fn set_reward_rate<T: PoolTokens>(
    pool: &mut Pool,
    tokens: &mut T,
    index: usize,
    reward_rate_per_second: u128,
    now: i64,
) -> Result<u64> {
    let channel = pool
        .channels
        .get_mut(index)
        .ok_or(RewardsError::TokenNotApproved)?;

    let pulled = pull_channel(channel, index, tokens, now)?;
    channel.set_rate(reward_rate_per_second, now);

    Ok(pulled)
}

fn check_withdraw(staker: &Staker, amount: u64) -> Result<()> {
    require!(amount > 0, RewardsError::InvalidAmount);
    require!(
        amount <= staker.balance,
        RewardsError::InsufficientBalance
    );
    Ok(())
}

fn record_withdraw(pool: &mut Pool, staker: &mut Staker, amount: u64) -> Result<()> {
    staker.record_withdraw(amount)?;
    pool.record_withdraw(amount)
}

fn record_payout(pool: &mut Pool, staker: &mut Staker, index: usize) -> Result<u64> {
    let payable = staker.take_owed(index);
    if payable > 0 {
        pool.channels[index].record_payout(payable)?;
    }
    Ok(payable)
}

fn record_all_payouts(pool: &mut Pool, staker: &mut Staker) -> Result<Vec<u64>> {
    (0..pool.channels.len())
        .map(|index| record_payout(pool, staker, index))
        .collect()
}

fn pay_all<T: PoolTokens>(tokens: &mut T, payouts: &[u64]) -> Result<()> {
    for (index, payable) in payouts.iter().enumerate() {
        if *payable > 0 {
            tokens.pay_reward(index, *payable)?;
        }
    }
    Ok(())
}
