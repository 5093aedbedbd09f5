//! Liquidity snapshot result and its wire encoding.

use alloy::primitives::{Bytes, U256};

/// Length of the total liquidity word at the start of an encoded snapshot.
const TOTAL_LIQUIDITY_LEN: usize = 32;

/// Outcome of a liquidity snapshot run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregationResult {
    /// Balance plus loans in use summed over every child pool. The home pool is not included.
    pub total_liquidity: U256,
    /// Positions in the home pool's deposits-on-the-way buffer whose transfers have landed, in
    /// the order they were found.
    pub finalized_indices: Vec<usize>,
}

impl AggregationResult {
    /// Encodes the result for the on-chain caller.
    ///
    /// The layout is the big-endian 256-bit total followed by one byte per finalized index. There
    /// is no length prefix: the number of indices is the output length minus 32. Indices are
    /// truncated to a byte.
    pub fn encode(&self) -> Bytes {
        let mut out = Vec::with_capacity(TOTAL_LIQUIDITY_LEN + self.finalized_indices.len());
        out.extend_from_slice(&self.total_liquidity.to_be_bytes::<TOTAL_LIQUIDITY_LEN>());
        out.extend(self.finalized_indices.iter().map(|index| *index as u8));
        out.into()
    }

    /// Decodes an encoded result. Returns `None` if the input is shorter than the total word.
    pub fn decode(data: &[u8]) -> Option<Self> {
        if data.len() < TOTAL_LIQUIDITY_LEN {
            return None;
        }
        let (total, indices) = data.split_at(TOTAL_LIQUIDITY_LEN);
        Some(Self {
            total_liquidity: U256::from_be_slice(total),
            finalized_indices: indices.iter().map(|index| *index as usize).collect(),
        })
    }
}
