pub mod pool;
pub mod reward_channel;
pub mod staker;

pub use pool::*;
pub use reward_channel::*;
pub use staker::*;
