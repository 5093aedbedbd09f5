use super::{PoolLiquidity, liquidity_of, settle_writes};
use crate::{
    chains::Chains,
    error::ReconcilerError,
    types::{ChainSelector, DistributionMode, RedistributionRequest},
};
use alloy::primitives::{I256, U256};
use tracing::info;

/// How liquidity moves towards a joining pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebalancePlan {
    /// The joining pool.
    pub destination: ChainSelector,
    /// Liquidity of every existing pool.
    pub pools: Vec<PoolLiquidity>,
    /// Liquidity across the existing pools.
    pub total: U256,
    /// Liquidity every pool holds after the rebalance, the joining one included.
    pub target: U256,
    /// Current liquidity minus target, per existing pool.
    pub deltas: Vec<(ChainSelector, I256)>,
}

impl RebalancePlan {
    /// Splits the liquidity of `pools` equally between them and the joining pool.
    ///
    /// The target is floored. The remainder stays with the existing pools.
    pub fn equal_split(destination: ChainSelector, pools: Vec<PoolLiquidity>) -> Self {
        let total = pools.iter().fold(U256::ZERO, |total, pool| total.saturating_add(pool.total()));
        let target = total / U256::from(pools.len() + 1);
        let deltas =
            pools.iter().map(|pool| (pool.selector, signed_delta(pool.total(), target))).collect();
        Self { destination, pools, total, target, deltas }
    }

    /// The amounts each pool above target sends to the joining pool.
    pub fn transfers(&self) -> impl Iterator<Item = (ChainSelector, U256)> + '_ {
        self.pools.iter().filter_map(|pool| {
            pool.total()
                .checked_sub(self.target)
                .filter(|amount| !amount.is_zero())
                .map(|amount| (pool.selector, amount))
        })
    }
}

fn signed_delta(current: U256, target: U256) -> I256 {
    if current >= target {
        I256::try_from(current - target).unwrap_or(I256::MAX)
    } else {
        I256::try_from(target - current).map(|delta| -delta).unwrap_or(I256::MIN)
    }
}

/// Moves liquidity towards the pool joining with `request`.
///
/// Only [`DistributionMode::EqualRebalance`] is supported. Every pool but the joining one is read,
/// and each pool above target submits its surplus in parallel.
pub async fn redistribute(
    chains: &Chains,
    request: &RedistributionRequest,
) -> Result<RebalancePlan, ReconcilerError> {
    if request.mode != DistributionMode::EqualRebalance {
        return Err(ReconcilerError::UnsupportedOperation(request.mode));
    }

    let existing = chains.iter().filter(|chain| chain.selector != request.new_pool);
    let pools = liquidity_of(existing).await?;
    let plan = RebalancePlan::equal_split(request.new_pool, pools);
    info!(
        destination = plan.destination,
        total = %plan.total,
        target = %plan.target,
        pools = plan.pools.len(),
        "Planned equal rebalance"
    );
    for (selector, delta) in plan.deltas.iter().filter(|(_, delta)| !delta.is_positive()) {
        info!(%selector, %delta, "Pool at or below target, nothing to send");
    }

    let writes = plan.transfers().filter_map(|(selector, amount)| {
        let chain = chains.get(selector)?;
        let write = chain.pool.distribute_liquidity(request.new_pool, amount, request.request_id);
        Some((selector, write))
    });
    settle_writes(writes).await?;

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        chains::Chain,
        pool::{InMemoryPool, PoolWrite},
    };
    use alloy::primitives::{Address, B256};
    use std::sync::Arc;

    fn liquidity(selector: ChainSelector, balance: u64, loans: u64) -> PoolLiquidity {
        PoolLiquidity { selector, balance: U256::from(balance), loans: U256::from(loans) }
    }

    fn request(new_pool: ChainSelector, mode: DistributionMode) -> RedistributionRequest {
        RedistributionRequest {
            new_pool,
            request_id: B256::repeat_byte(0x42),
            mode,
            chain_id: 84532,
        }
    }

    #[test]
    fn equal_split_properties() {
        for balances in [
            vec![900u64, 300, 0],
            vec![1_000_000, 1_000_000],
            vec![7],
            vec![u32::MAX as u64, 12_345, 999_999_999, 1],
            vec![],
        ] {
            let pools = balances
                .iter()
                .enumerate()
                .map(|(i, balance)| liquidity(i as u64, *balance, 0))
                .collect::<Vec<_>>();
            let n = pools.len();
            let plan = RebalancePlan::equal_split(99, pools);

            let sum = balances.iter().fold(U256::ZERO, |sum, b| sum + U256::from(*b));
            assert_eq!(plan.total, sum);
            assert_eq!(plan.target, sum / U256::from(n + 1));
            let deltas = plan.deltas.iter().fold(I256::ZERO, |sum, (_, delta)| sum + *delta);
            let expected = I256::try_from(sum).unwrap()
                - I256::try_from(U256::from(n)).unwrap() * I256::try_from(plan.target).unwrap();
            assert_eq!(deltas, expected);
        }
    }

    #[test]
    fn loans_count_as_liquidity() {
        let plan = RebalancePlan::equal_split(9, vec![liquidity(1, 500, 400), liquidity(2, 0, 0)]);
        assert_eq!(plan.total, U256::from(900));
        assert_eq!(plan.target, U256::from(300));
        assert_eq!(
            plan.deltas,
            [(1, I256::try_from(600i64).unwrap()), (2, I256::try_from(-300i64).unwrap())]
        );
        assert_eq!(plan.transfers().collect::<Vec<_>>(), [(1, U256::from(600))]);
    }

    #[tokio::test]
    async fn distributes_surplus_to_joining_pool() {
        let a = Arc::new(InMemoryPool::new(Address::with_last_byte(1)).with_balance(U256::from(900u64)));
        let b = Arc::new(InMemoryPool::new(Address::with_last_byte(2)).with_balance(U256::from(300u64)));
        let joining = Arc::new(InMemoryPool::new(Address::with_last_byte(3)).with_balance(U256::from(5u64)));
        let chains = Chains::new(
            1,
            [
                Chain { selector: 1, chain_id: 10, pool: a.clone() },
                Chain { selector: 2, chain_id: 20, pool: b.clone() },
                Chain { selector: 3, chain_id: 30, pool: joining.clone() },
            ],
        )
        .unwrap();

        let plan =
            redistribute(&chains, &request(3, DistributionMode::EqualRebalance)).await.unwrap();
        assert_eq!(plan.target, U256::from(400));
        assert_eq!(
            a.writes().await,
            [PoolWrite::DistributeLiquidity {
                destination: 3,
                amount: U256::from(500),
                request_id: B256::repeat_byte(0x42),
            }]
        );
        assert!(b.writes().await.is_empty());
        assert!(joining.writes().await.is_empty());
    }

    #[tokio::test]
    async fn unsupported_modes() {
        let pool = Arc::new(InMemoryPool::new(Address::with_last_byte(1)).with_balance(U256::from(900u64)));
        let chains =
            Chains::new(1, [Chain { selector: 1, chain_id: 10, pool: pool.clone() }]).unwrap();

        for mode in [DistributionMode::Liquidate, DistributionMode::Unknown(2)] {
            let err = redistribute(&chains, &request(3, mode)).await.unwrap_err();
            assert!(matches!(err, ReconcilerError::UnsupportedOperation(m) if m == mode));
            assert!(err.is_input_error());
        }
        assert!(pool.writes().await.is_empty());
    }

    #[tokio::test]
    async fn failed_write_fails_the_run() {
        let chains = Chains::new(
            1,
            [
                Chain::new(1, 10, InMemoryPool::new(Address::ZERO).with_balance(U256::from(900u64))),
                Chain::new(
                    2,
                    20,
                    InMemoryPool::new(Address::ZERO)
                        .with_balance(U256::from(900u64))
                        .with_write_error(-32000, "insufficient funds for gas"),
                ),
            ],
        )
        .unwrap();

        let err = redistribute(&chains, &request(3, DistributionMode::EqualRebalance))
            .await
            .unwrap_err();
        let failures = match err {
            ReconcilerError::WriteFailures(failures) => failures,
            err => panic!("unexpected {err:?}"),
        };
        assert_eq!(failures.submitted, 1);
        assert_eq!(failures.failures.len(), 1);
        assert_eq!(failures.failures[0].0, 2);
    }
}
