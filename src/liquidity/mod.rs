//! Liquidity reconciliation across the pools of one network.

mod aggregator;
pub use aggregator::{PoolLiquidity, liquidity_of, pool_liquidity, total_liquidity};

mod rebalance;
pub use rebalance::{RebalancePlan, redistribute};

mod tracker;
pub use tracker::{
    PendingTransfer, PendingTransferTracker, RoundCursor, TransfersByChain, plan_round,
};

mod withdrawal;
pub use withdrawal::collect_withdrawal;

use crate::{error::WriteFailures, pool, types::ChainSelector};
use alloy::primitives::TxHash;
use futures_util::future::join_all;
use tracing::{error, info, warn};

/// Awaits a fan-out of pool writes.
///
/// Every write runs to completion. Benign duplicates count as submitted. Returns the number of
/// submitted writes, or every non-benign failure.
pub(crate) async fn settle_writes<F>(
    writes: impl IntoIterator<Item = (ChainSelector, F)>,
) -> Result<usize, WriteFailures>
where
    F: Future<Output = pool::Result<TxHash>>,
{
    let (selectors, futures): (Vec<_>, Vec<_>) = writes.into_iter().unzip();
    let outcomes = join_all(futures).await;

    let mut submitted = 0;
    let mut failures = Vec::new();
    for (selector, outcome) in selectors.into_iter().zip(outcomes) {
        match outcome {
            Ok(tx_hash) => {
                info!(%selector, %tx_hash, "Pool write submitted");
                submitted += 1;
            }
            Err(err) => {
                let kind = err.submission_kind();
                if kind.is_benign() {
                    warn!(%selector, %kind, %err, "Pool write already in flight");
                    submitted += 1;
                } else {
                    error!(%selector, %err, "Pool write failed");
                    failures.push((selector, err));
                }
            }
        }
    }

    if failures.is_empty() { Ok(submitted) } else { Err(WriteFailures { submitted, failures }) }
}
