use crate::{
    chains::{Chain, Chains},
    error::ReconcilerError,
    types::ChainSelector,
};
use alloy::primitives::U256;
use futures_util::future::{TryJoinAll, try_join};
use tracing::debug;

/// Liquidity position of a single pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolLiquidity {
    /// The chain of the pool.
    pub selector: ChainSelector,
    /// Stablecoin held by the pool.
    pub balance: U256,
    /// Stablecoin lent out by the pool.
    pub loans: U256,
}

impl PoolLiquidity {
    /// Balance plus loans in use.
    pub fn total(&self) -> U256 {
        self.balance.saturating_add(self.loans)
    }
}

/// Reads a pool's balance and loans in use in parallel.
pub async fn pool_liquidity(chain: &Chain) -> Result<PoolLiquidity, ReconcilerError> {
    let (balance, loans) = try_join(chain.pool.stablecoin_balance(), chain.pool.loans_in_use())
        .await
        .map_err(ReconcilerError::pool(chain.selector))?;
    debug!(selector = chain.selector, %balance, %loans, "Read pool liquidity");
    Ok(PoolLiquidity { selector: chain.selector, balance, loans })
}

/// Reads the liquidity of every given chain in parallel, in iteration order.
///
/// The first failed read aborts the whole aggregation.
pub async fn liquidity_of<'a>(
    chains: impl IntoIterator<Item = &'a Chain>,
) -> Result<Vec<PoolLiquidity>, ReconcilerError> {
    chains.into_iter().map(pool_liquidity).collect::<TryJoinAll<_>>().await
}

/// Sums the liquidity of every non-home pool.
///
/// The home pool accounts for its own balance on-chain and is never read here.
pub async fn total_liquidity(chains: &Chains) -> Result<U256, ReconcilerError> {
    let pools = liquidity_of(chains.remote()).await?;
    Ok(pools.iter().fold(U256::ZERO, |total, pool| total.saturating_add(pool.total())))
}
