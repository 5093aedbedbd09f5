//! Reconciler constants.

use alloy::primitives::ChainId;

/// Numeric chain id of Base Mainnet, the home chain of the main network.
pub const BASE_CHAIN_ID: ChainId = 8453;

/// Numeric chain id of Base Sepolia, the home chain of the test network.
pub const BASE_SEPOLIA_CHAIN_ID: ChainId = 84532;

/// Cross-chain selector of Base Mainnet.
pub const BASE_CHAIN_SELECTOR: u64 = 15971525489660198786;

/// Cross-chain selector of Base Sepolia.
pub const BASE_SEPOLIA_CHAIN_SELECTOR: u64 = 10344971235874465080;

/// Gas limit returned for every `eth_estimateGas` call instead of asking the node.
///
/// Node-side simulation is too slow and flaky under the execution host's limits.
pub const FIXED_GAS_ESTIMATE: u64 = 2_000_000;

/// Number of log query rounds the pending transfer tracker performs per run.
pub const TRACKER_ROUNDS: usize = 3;

/// Maximum number of log queries issued per chain in a single tracker round.
pub const TRACKER_BATCH_SIZE: usize = 6;

/// Pause between two tracker rounds, in milliseconds.
pub const TRACKER_ROUND_PAUSE_MS: u64 = 1_000;

/// Default timeout of a single JSON-RPC request, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Decimals of the pooled stablecoin.
pub const STABLECOIN_DECIMALS: u8 = 6;

/// Environment key holding the private key of the pool messenger.
pub const POOL_MESSENGER_KEY_ENV: &str = "POOL_MESSENGER_0_PRIVATE_KEY";
