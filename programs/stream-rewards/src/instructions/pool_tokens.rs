// =============================================================================
// SPL token side of the ledger
// =============================================================================
// Implements `PoolTokens` with token program CPIs. The pool PDA signs for
// both vaults and, as delegate, for pulls from reward sources.
// =============================================================================

use anchor_lang::prelude::*;
use anchor_lang::solana_program::program_option::COption;
use anchor_spl::token::{self, TokenAccount, Transfer};

use crate::constants::{CLAIM_ACCOUNTS_PER_CHANNEL, POOL_SEED, SETTLE_ACCOUNTS_PER_CHANNEL};
use crate::error::RewardsError;
use crate::ledger::PoolTokens;
use crate::state::{Pool, RewardChannel, SourceFunds};

/// Deserialize an SPL token account, checking the owning program
pub fn read_token_account(info: &AccountInfo) -> Result<TokenAccount> {
    require_keys_eq!(*info.owner, token::ID, RewardsError::InvalidTokenAccountOwner);
    let data = info.try_borrow_data()?;
    TokenAccount::try_deserialize(&mut &data[..])
}

/// Owned copy of the pool PDA seeds
struct PoolSigner {
    principal_mint: Pubkey,
    creator: Pubkey,
    bump: [u8; 1],
}

impl PoolSigner {
    fn seeds(&self) -> [&[u8]; 4] {
        [
            POOL_SEED,
            self.principal_mint.as_ref(),
            self.creator.as_ref(),
            &self.bump,
        ]
    }
}

/// Accounts backing one reward channel
pub struct ChannelAccounts<'info> {
    pub reward_mint: Pubkey,
    pub reward_vault: AccountInfo<'info>,
    /// None while the channel has no source
    pub reward_source: Option<AccountInfo<'info>>,
    /// Where payouts go; only claims need it
    pub recipient: Option<AccountInfo<'info>>,
}

/// Depositor side of principal transfers
pub struct PrincipalAccounts<'info> {
    pub user: AccountInfo<'info>,
    pub user_principal_account: AccountInfo<'info>,
    /// Amount the signer can hand over
    pub user_principal_balance: u64,
    pub stake_vault: AccountInfo<'info>,
}

pub struct CpiPoolTokens<'info> {
    token_program: AccountInfo<'info>,
    pool: AccountInfo<'info>,
    signer: PoolSigner,
    channels: Vec<Option<ChannelAccounts<'info>>>,
    principal: Option<PrincipalAccounts<'info>>,
}

impl<'info> CpiPoolTokens<'info> {
    /// Adapter with no channel accounts attached yet
    pub fn new(token_program: AccountInfo<'info>, pool_info: AccountInfo<'info>, pool: &Pool) -> Self {
        Self {
            token_program,
            pool: pool_info,
            signer: PoolSigner {
                principal_mint: pool.principal_mint,
                creator: pool.creator,
                bump: [pool.bump],
            },
            channels: (0..pool.channels.len()).map(|_| None).collect(),
            principal: None,
        }
    }

    /// Attach every channel from `remaining_accounts`:
    /// `[reward_vault, reward_source]` per channel, plus `user_reward_account`
    /// when `recipient_owner` is given.
    pub fn with_remaining_accounts(
        mut self,
        pool: &Pool,
        remaining: &[AccountInfo<'info>],
        recipient_owner: Option<Pubkey>,
    ) -> Result<Self> {
        let stride = if recipient_owner.is_some() {
            CLAIM_ACCOUNTS_PER_CHANNEL
        } else {
            SETTLE_ACCOUNTS_PER_CHANNEL
        };
        require!(
            remaining.len() == pool.channels.len() * stride,
            RewardsError::ChannelAccountsMismatch
        );

        for (index, (channel, accounts)) in pool
            .channels
            .iter()
            .zip(remaining.chunks_exact(stride))
            .enumerate()
        {
            let recipient = match recipient_owner {
                Some(owner) => {
                    let recipient = &accounts[2];
                    check_recipient(channel, recipient, &owner)?;
                    Some(recipient.clone())
                }
                None => None,
            };

            self = self.with_channel(index, channel, &accounts[0], &accounts[1], recipient)?;
        }

        Ok(self)
    }

    /// Attach one channel, validating vault and source against the pool
    pub fn with_channel(
        mut self,
        index: usize,
        channel: &RewardChannel,
        reward_vault: &AccountInfo<'info>,
        reward_source: &AccountInfo<'info>,
        recipient: Option<AccountInfo<'info>>,
    ) -> Result<Self> {
        require_keys_eq!(
            reward_vault.key(),
            channel.reward_vault,
            RewardsError::InvalidRewardVault
        );

        let reward_source = if channel.has_source() {
            require_keys_eq!(
                reward_source.key(),
                channel.reward_source,
                RewardsError::InvalidRewardSource
            );
            Some(reward_source.clone())
        } else {
            None
        };

        let slot = self
            .channels
            .get_mut(index)
            .ok_or(RewardsError::TokenNotApproved)?;
        *slot = Some(ChannelAccounts {
            reward_mint: channel.reward_mint,
            reward_vault: reward_vault.clone(),
            reward_source,
            recipient,
        });

        Ok(self)
    }

    /// Route payouts of one channel to `recipient`
    pub fn with_recipient(mut self, index: usize, recipient: AccountInfo<'info>) -> Result<Self> {
        let accounts = self
            .channels
            .get_mut(index)
            .and_then(Option::as_mut)
            .ok_or(RewardsError::ChannelAccountsMismatch)?;
        accounts.recipient = Some(recipient);
        Ok(self)
    }

    pub fn with_principal(mut self, principal: PrincipalAccounts<'info>) -> Self {
        self.principal = Some(principal);
        self
    }

    fn channel(&self, index: usize) -> Result<&ChannelAccounts<'info>> {
        self.channels
            .get(index)
            .and_then(Option::as_ref)
            .ok_or_else(|| error!(RewardsError::ChannelAccountsMismatch))
    }

    fn principal(&self) -> Result<&PrincipalAccounts<'info>> {
        self.principal
            .as_ref()
            .ok_or_else(|| error!(RewardsError::InvalidPrincipalMint))
    }

    fn transfer_as_pool(&self, from: &AccountInfo<'info>, to: &AccountInfo<'info>, amount: u64) -> Result<()> {
        let seeds = self.signer.seeds();
        let signer_seeds = &[&seeds[..]];

        token::transfer(
            CpiContext::new_with_signer(
                self.token_program.clone(),
                Transfer {
                    from: from.clone(),
                    to: to.clone(),
                    authority: self.pool.clone(),
                },
                signer_seeds,
            ),
            amount,
        )
    }
}

/// Payout accounts must hold the channel's mint and belong to the claimant
pub fn check_recipient(channel: &RewardChannel, recipient: &AccountInfo, owner: &Pubkey) -> Result<()> {
    let account = read_token_account(recipient)?;
    require_keys_eq!(
        account.mint,
        channel.reward_mint,
        RewardsError::ChannelAccountsMismatch
    );
    require_keys_eq!(
        account.owner,
        *owner,
        RewardsError::InvalidTokenAccountOwner
    );
    Ok(())
}

impl<'info> PoolTokens for CpiPoolTokens<'info> {
    fn reward_balance(&self, channel: usize) -> Result<u64> {
        Ok(read_token_account(&self.channel(channel)?.reward_vault)?.amount)
    }

    fn source_funds(&self, channel: usize) -> SourceFunds {
        let Ok(accounts) = self.channel(channel) else {
            return SourceFunds::default();
        };
        let Some(source) = accounts.reward_source.as_ref() else {
            return SourceFunds::default();
        };
        let Ok(source) = read_token_account(source) else {
            return SourceFunds::default();
        };

        if source.mint != accounts.reward_mint || source.is_frozen() {
            return SourceFunds::default();
        }

        let allowance = match source.delegate {
            COption::Some(delegate) if delegate == self.pool.key() => source.delegated_amount,
            _ => 0,
        };

        SourceFunds {
            allowance,
            balance: source.amount,
        }
    }

    fn pull_reward(&mut self, channel: usize, amount: u64) -> Result<()> {
        let accounts = self.channel(channel)?;
        let source = accounts
            .reward_source
            .as_ref()
            .ok_or(RewardsError::InvalidRewardSource)?;

        self.transfer_as_pool(source, &accounts.reward_vault, amount)
    }

    fn pay_reward(&mut self, channel: usize, amount: u64) -> Result<()> {
        let accounts = self.channel(channel)?;
        let recipient = accounts
            .recipient
            .as_ref()
            .ok_or(RewardsError::ChannelAccountsMismatch)?;

        self.transfer_as_pool(&accounts.reward_vault, recipient, amount)
    }

    fn principal_allowance(&self) -> u64 {
        self.principal
            .as_ref()
            .map_or(0, |principal| principal.user_principal_balance)
    }

    fn deposit_principal(&mut self, amount: u64) -> Result<()> {
        let principal = self.principal()?;

        token::transfer(
            CpiContext::new(
                self.token_program.clone(),
                Transfer {
                    from: principal.user_principal_account.clone(),
                    to: principal.stake_vault.clone(),
                    authority: principal.user.clone(),
                },
            ),
            amount,
        )
    }

    fn withdraw_principal(&mut self, amount: u64) -> Result<()> {
        let principal = self.principal()?;
        self.transfer_as_pool(&principal.stake_vault, &principal.user_principal_account, amount)
    }
}
