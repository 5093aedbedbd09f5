//! # Pool Reconciler
//!
//! Off-chain reconciliation engine of a cross-chain liquidity pool protocol. Each run aggregates
//! the liquidity of the child pools, detects which in-flight cross-chain deposits have landed,
//! plans rebalancing towards joining pools and fans out withdrawal instructions.

pub mod chains;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod liquidity;
pub mod pool;
pub mod reconciler;
pub mod secrets;
pub mod serde;
pub mod transport;
pub mod types;
