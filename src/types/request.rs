//! Tagged requests for the three use cases.
//!
//! Runs are triggered with a positional array of hex-encoded byte strings. The layout depends on
//! the use case and the first three positions are reserved. Each request type validates its
//! layout once, so the rest of the crate only sees typed fields.

use crate::{error::ReconcilerError, types::ChainSelector};
use alloy::primitives::{B256, ChainId, U256};
use std::fmt;

/// Reads typed values out of the positional argument array.
#[derive(Debug, Clone, Copy)]
pub struct RawArgs<'a>(&'a [String]);

impl<'a> RawArgs<'a> {
    /// Wraps the positional arguments.
    pub fn new(args: &'a [String]) -> Self {
        Self(args)
    }

    fn get(&self, index: usize, name: &'static str) -> Result<&'a str, ReconcilerError> {
        self.0
            .get(index)
            .map(String::as_str)
            .ok_or(ReconcilerError::MissingArgument { index, name })
    }

    /// Parses a hex quantity of at most 32 bytes.
    pub fn u256(&self, index: usize, name: &'static str) -> Result<U256, ReconcilerError> {
        let raw = self.get(index, name)?;
        let invalid = |reason: &str| ReconcilerError::InvalidArgument {
            index,
            name,
            reason: format!("{reason}: {raw:?}"),
        };
        let digits = raw
            .strip_prefix("0x")
            .or_else(|| raw.strip_prefix("0X"))
            .ok_or_else(|| invalid("expected 0x-prefixed hex"))?;
        if digits.is_empty() {
            return Ok(U256::ZERO);
        }
        U256::from_str_radix(digits, 16).map_err(|_| invalid("not a 256-bit hex quantity"))
    }

    /// Parses a hex quantity that must fit a `u64`.
    pub fn u64(&self, index: usize, name: &'static str) -> Result<u64, ReconcilerError> {
        self.u256(index, name)?.try_into().map_err(|_| ReconcilerError::InvalidArgument {
            index,
            name,
            reason: "does not fit 64 bits".to_string(),
        })
    }

    /// Parses a hex quantity that must fit a single byte.
    pub fn u8(&self, index: usize, name: &'static str) -> Result<u8, ReconcilerError> {
        self.u256(index, name)?.try_into().map_err(|_| ReconcilerError::InvalidArgument {
            index,
            name,
            reason: "does not fit a single byte".to_string(),
        })
    }

    /// Parses a 32-byte word, left-padding shorter values.
    pub fn b256(&self, index: usize, name: &'static str) -> Result<B256, ReconcilerError> {
        self.u256(index, name).map(B256::from)
    }
}

/// Request for a liquidity snapshot.
///
/// Layout: `[reserved, reserved, reserved, chain_id]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotRequest {
    /// Numeric chain id of the home chain the request came from.
    pub chain_id: ChainId,
}

impl SnapshotRequest {
    /// Parses the positional arguments.
    pub fn parse(args: &[String]) -> Result<Self, ReconcilerError> {
        let args = RawArgs::new(args);
        Ok(Self { chain_id: args.u64(3, "chain_id")? })
    }
}

/// How liquidity should be redistributed when the pool set changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistributionMode {
    /// Equalise the balances of all pools including a newly joining one (`0x00`).
    EqualRebalance,
    /// Drain a pool that is being decommissioned (`0x01`).
    Liquidate,
    /// Any other discriminator.
    Unknown(u8),
}

impl From<u8> for DistributionMode {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::EqualRebalance,
            1 => Self::Liquidate,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for DistributionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EqualRebalance => f.write_str("equal rebalance"),
            Self::Liquidate => f.write_str("liquidate"),
            Self::Unknown(mode) => write!(f, "unknown distribution mode {mode:#04x}"),
        }
    }
}

/// Request to redistribute liquidity towards a joining pool.
///
/// Layout: `[reserved, reserved, reserved, new_pool_selector, request_id, mode, chain_id]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedistributionRequest {
    /// Selector of the chain whose pool is joining.
    pub new_pool: ChainSelector,
    /// Idempotency id attached to every write.
    pub request_id: B256,
    /// The requested mode.
    pub mode: DistributionMode,
    /// Numeric chain id of the home chain the request came from.
    pub chain_id: ChainId,
}

impl RedistributionRequest {
    /// Parses the positional arguments.
    pub fn parse(args: &[String]) -> Result<Self, ReconcilerError> {
        let args = RawArgs::new(args);
        Ok(Self {
            new_pool: args.u64(3, "new_pool_selector")?,
            request_id: args.b256(4, "request_id")?,
            mode: args.u8(5, "distribution_mode")?.into(),
            chain_id: args.u64(6, "chain_id")?,
        })
    }
}

/// Request to collect liquidity from every child pool for a withdrawal.
///
/// Layout: `[reserved, reserved, reserved, chain_id, amount_per_pool, withdrawal_id]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithdrawalCollectionRequest {
    /// Numeric chain id of the home chain the request came from.
    pub chain_id: ChainId,
    /// Amount each child pool sends to the home pool.
    pub amount_per_pool: U256,
    /// Withdrawal request id attached to every write.
    pub withdrawal_id: B256,
}

impl WithdrawalCollectionRequest {
    /// Parses the positional arguments.
    pub fn parse(args: &[String]) -> Result<Self, ReconcilerError> {
        let args = RawArgs::new(args);
        Ok(Self {
            chain_id: args.u64(3, "chain_id")?,
            amount_per_pool: args.u256(4, "amount_per_pool")?,
            withdrawal_id: args.b256(5, "withdrawal_id")?,
        })
    }
}
