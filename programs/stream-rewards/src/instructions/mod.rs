// =============================================================================
// Instructions Module - Stream Rewards
// =============================================================================

pub mod admin;
pub mod claim;
pub mod deposit;
pub mod initialize;
pub mod pool_tokens;
pub mod pull;
pub mod withdraw;

pub use admin::*;
pub use claim::*;
pub use deposit::*;
pub use initialize::*;
pub use pull::*;
pub use withdraw::*;
