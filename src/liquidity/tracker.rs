//! Detection of pending cross-chain deposits that reached their destination pool.
//!
//! The home pool keeps a fixed-capacity buffer of deposits on the way. A deposit is done once the
//! pool on its chain emitted `CCIPReceived` for its message id. The tracker looks for those logs in
//! a bounded number of rounds, querying a bounded number of candidates per chain per round, and
//! reports the buffer slots of every deposit it positively matched.

use crate::{
    chains::Chains,
    config::TrackerConfig,
    error::ReconcilerError,
    pool::is_ccip_received,
    types::{ChainSelector, DepositOnTheWay},
};
use alloy::{
    primitives::{Address, B256, U256},
    rpc::types::Log,
};
use futures_util::future::TryJoinAll;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// A deposit whose receipt has not been observed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTransfer {
    /// Slot of the deposit in the home pool's buffer.
    pub sequence_index: usize,
    /// The chain whose pool receives the deposit.
    pub origin: ChainSelector,
    /// Cross-chain message id.
    pub message_id: B256,
    /// Amount in flight.
    pub amount: U256,
}

impl PendingTransfer {
    /// Collects the occupied slots of a deposits-on-the-way buffer.
    ///
    /// Free slots carry a zero message id. Slot positions are kept as sequence indices.
    pub fn from_deposits(deposits: &[DepositOnTheWay]) -> Vec<Self> {
        deposits
            .iter()
            .enumerate()
            .filter(|(_, deposit)| !deposit.ccipMessageId.is_zero())
            .map(|(sequence_index, deposit)| Self {
                sequence_index,
                origin: deposit.chainSelector,
                message_id: deposit.ccipMessageId,
                amount: deposit.amount,
            })
            .collect()
    }
}

/// Candidates grouped by the chain their receipt is searched on.
pub type TransfersByChain = BTreeMap<ChainSelector, Vec<PendingTransfer>>;

/// Per-chain position of the next candidate to query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundCursor(BTreeMap<ChainSelector, usize>);

impl RoundCursor {
    /// Number of candidates of `selector` already queried.
    pub fn position(&self, selector: ChainSelector) -> usize {
        self.0.get(&selector).copied().unwrap_or_default()
    }
}

/// Picks the candidates of the next round: up to `batch_size` not yet queried candidates per
/// chain.
///
/// Returns the picked candidates, in chain order, and the cursor after this round.
pub fn plan_round<'a>(
    by_chain: &'a TransfersByChain,
    cursor: &RoundCursor,
    batch_size: usize,
) -> (Vec<&'a PendingTransfer>, RoundCursor) {
    let mut batch = Vec::new();
    let mut next = cursor.clone();
    for (&selector, transfers) in by_chain {
        let start = cursor.position(selector).min(transfers.len());
        let end = start.saturating_add(batch_size).min(transfers.len());
        batch.extend(&transfers[start..end]);
        next.0.insert(selector, end);
    }
    (batch, next)
}

/// Outcome of matching the logs fetched for one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Receipt {
    /// No receipt yet.
    Missing,
    /// Exactly one valid receipt.
    Matched,
    /// More than one log was returned.
    Ambiguous,
    /// The returned log is not a receipt of this candidate.
    Foreign,
}

impl Receipt {
    fn of(logs: &[Log], pool: Address, message_id: B256) -> Self {
        match logs {
            [] => Self::Missing,
            [log] if is_ccip_received(log, pool, message_id) => Self::Matched,
            [_] => Self::Foreign,
            _ => Self::Ambiguous,
        }
    }
}

/// Looks up receipts of pending transfers on their chains.
#[derive(Debug)]
pub struct PendingTransferTracker<'a> {
    chains: &'a Chains,
    config: TrackerConfig,
}

impl<'a> PendingTransferTracker<'a> {
    /// Creates a new [`PendingTransferTracker`].
    pub fn new(chains: &'a Chains, config: TrackerConfig) -> Self {
        Self { chains, config }
    }

    /// Returns the sequence indices of every transfer whose receipt was found, in discovery
    /// order.
    ///
    /// Candidates not queried within the configured rounds stay unresolved. A failed log query
    /// aborts the run.
    pub async fn finalized(
        &self,
        transfers: &[PendingTransfer],
    ) -> Result<Vec<usize>, ReconcilerError> {
        let mut by_chain = TransfersByChain::new();
        for transfer in transfers {
            if self.chains.get(transfer.origin).is_none() {
                warn!(
                    sequence_index = transfer.sequence_index,
                    selector = transfer.origin,
                    "Pending transfer to unknown chain"
                );
                continue;
            }
            by_chain.entry(transfer.origin).or_default().push(*transfer);
        }

        let mut cursor = RoundCursor::default();
        let mut finalized = Vec::new();
        // At most `rounds` rounds. Once every candidate was queried the remaining rounds would
        // issue no query, so they and their pauses are skipped.
        for round in 0..self.config.rounds {
            let (batch, next) = plan_round(&by_chain, &cursor, self.config.batch_size);
            if batch.is_empty() {
                break;
            }
            if round > 0 {
                tokio::time::sleep(self.config.round_pause).await;
            }
            cursor = next;
            debug!(round, queries = batch.len(), "Querying receipts");

            let results = batch
                .into_iter()
                .filter_map(|transfer| {
                    self.chains.get(transfer.origin).map(|chain| (chain, transfer))
                })
                .map(async |(chain, transfer)| {
                    let logs = chain
                        .pool
                        .ccip_received_logs(transfer.message_id)
                        .await
                        .map_err(ReconcilerError::pool(chain.selector))?;
                    Ok::<_, ReconcilerError>((
                        transfer,
                        Receipt::of(&logs, chain.pool.address(), transfer.message_id),
                    ))
                })
                .collect::<TryJoinAll<_>>()
                .await?;

            for (transfer, receipt) in results {
                match receipt {
                    Receipt::Missing => {}
                    Receipt::Matched => {
                        info!(
                            sequence_index = transfer.sequence_index,
                            selector = transfer.origin,
                            message_id = %transfer.message_id,
                            "Pending transfer finalized"
                        );
                        finalized.push(transfer.sequence_index);
                    }
                    Receipt::Ambiguous | Receipt::Foreign => {
                        warn!(
                            sequence_index = transfer.sequence_index,
                            selector = transfer.origin,
                            message_id = %transfer.message_id,
                            ?receipt,
                            "Ignoring unexpected receipt logs"
                        );
                    }
                }
            }
        }

        Ok(finalized)
    }
}
