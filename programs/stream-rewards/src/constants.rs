// =============================================================================
// Stream Rewards Constants
// =============================================================================

// PDA Seeds
pub const POOL_SEED: &[u8] = b"pool";
pub const STAKE_VAULT_SEED: &[u8] = b"stake_vault";
pub const REWARD_VAULT_SEED: &[u8] = b"reward_vault";
pub const STAKER_SEED: &[u8] = b"staker";

// Precision for the reward multiplier (18 decimals)
// Independent of the principal and reward token decimals
pub const MULTIPLIER_PRECISION: u128 = 1_000_000_000_000_000_000; // 10^18

// =============================================================================
// Reward channel limits
// =============================================================================
// Channels live inline in the pool account and every settling instruction
// carries two or three accounts per channel, so the list has to stay small
// enough to fit a transaction.
pub const MAX_REWARD_TOKENS: usize = 8;

// Remaining-account layout per channel
pub const SETTLE_ACCOUNTS_PER_CHANNEL: usize = 2; // reward_vault, reward_source
pub const CLAIM_ACCOUNTS_PER_CHANNEL: usize = 3; // + user_reward_account
