pub mod block_rules;
pub mod rate_limit;

pub use block_rules::{normalize_nickname, BlockList, BlockRule, BlockRuleKind};
pub use rate_limit::FixedWindowLimiter;
