//! Shared primitive types.
mod erc20;
pub use erc20::*;

mod pool;
pub use pool::*;

mod request;
pub use request::*;

mod snapshot;
pub use snapshot::*;

/// Protocol-specific identifier of a chain for cross-chain messaging.
///
/// Distinct from the numeric EVM chain id.
pub type ChainSelector = u64;
